use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::output;
use cli::session::{self, SelectorArgs};
use tagstore_core::config;
use tagstore_core::Operation;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        cfg.discovery.root = root;
    }
    let mut store = session::open_store(&cfg)?;

    match cli.command {
        Commands::Tags { json } => {
            output::emit(&session::tags_json(&store), json, output::render_tags)
        }
        Commands::Select { selector, json } => output::emit(
            &session::select(&store, &selector),
            json,
            output::render_selection,
        ),
        Commands::Apply { op, json, verify } => {
            let (operation, selector) = op.into_parts();
            let value = session::apply(&mut store, &selector, &operation, verify)?;
            output::emit(&value, json, output::render_apply)
        }
    }
}

#[derive(Parser)]
#[command(name = "tagstore")]
#[command(about = "Select files by path-derived tags", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Working root to index (overrides discovery.root)
    #[arg(short, long)]
    root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every tag with its file count
    Tags {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the files and subtags a selector resolves to
    Select {
        #[command(flatten)]
        selector: SelectorArgs,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply an operation to a selection (lasts for this run only)
    Apply {
        #[command(subcommand)]
        op: OpCommand,
        /// Output JSON
        #[arg(long, global = true)]
        json: bool,
        /// Check index consistency after applying
        #[arg(long, global = true)]
        verify: bool,
    },
}

#[derive(Subcommand)]
enum OpCommand {
    /// Add a tag to every selected file
    Add {
        tag: String,
        #[command(flatten)]
        selector: SelectorArgs,
    },
    /// Remove a tag from every selected file
    Remove {
        tag: String,
        #[command(flatten)]
        selector: SelectorArgs,
    },
    /// Delete the selected files (not handled by the index)
    Delete {
        #[command(flatten)]
        selector: SelectorArgs,
    },
}

impl OpCommand {
    fn into_parts(self) -> (Operation, SelectorArgs) {
        match self {
            OpCommand::Add { tag, selector } => (Operation::add_tag(tag), selector),
            OpCommand::Remove { tag, selector } => (Operation::remove_tag(tag), selector),
            OpCommand::Delete { selector } => (Operation::DeleteFiles, selector),
        }
    }
}
