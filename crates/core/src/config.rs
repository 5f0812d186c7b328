use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub discovery: DiscoveryConfig,
    pub tags: TagConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    #[default]
    Walk,
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub root: String,
    pub mode: DiscoveryMode,
    /// Shell command printing one path per line; only used in `command` mode.
    pub command: String,
    pub exclude: Vec<String>,
    pub include_hidden: bool,
    pub follow_links: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            mode: DiscoveryMode::Walk,
            command: "find . -type f".to_string(),
            exclude: Vec::new(),
            include_hidden: false,
            follow_links: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    pub extension: bool,
    pub ignore: Vec<String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            extension: true,
            ignore: Vec::new(),
        }
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(environment());
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

/// `TAGSTORE_DISCOVERY__ROOT=/srv`, `TAGSTORE_TAGS__IGNORE=src,lib`, ...
/// List-valued keys are split on commas.
fn environment() -> config::Environment {
    config::Environment::with_prefix("TAGSTORE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("discovery.exclude")
        .with_list_parse_key("tags.ignore")
}
