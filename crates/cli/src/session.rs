//! One process-lifetime session over a freshly built index.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use tagstore_core::config::AppConfig;
use tagstore_core::scanner;
use tagstore_core::tagger::PathTagger;
use tagstore_core::{FileStore, Operation, Selection, Selector};
use tracing::warn;

/// Selector clauses, one flag per field.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectorArgs {
    /// Tag every selected file must carry (repeatable)
    #[arg(short = 't', long = "tag")]
    pub tags: Vec<String>,
    /// Tag no selected file may carry (repeatable)
    #[arg(short = 'n', long = "not")]
    pub not: Vec<String>,
    /// Relative path to force into the selection (repeatable)
    #[arg(long)]
    pub include: Vec<String>,
    /// Relative path to force out of the selection (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,
}

pub fn open_store(cfg: &AppConfig) -> Result<FileStore> {
    let discovery = scanner::from_config(&cfg.discovery).context("configure file discovery")?;
    let tagger = PathTagger::from_config(&cfg.tags);
    Ok(FileStore::from_discovery(
        &cfg.discovery.root,
        &*discovery,
        &tagger,
    ))
}

pub fn build_selector(store: &FileStore, args: &SelectorArgs) -> Selector {
    let mut selector = Selector::new()
        .require_all(args.tags.iter().cloned())
        .exclude_all(args.not.iter().cloned());
    let overrides = args
        .include
        .iter()
        .map(|p| (p, true))
        .chain(args.exclude.iter().map(|p| (p, false)));
    for (path, include) in overrides {
        match store.file_id(path) {
            Some(id) => selector = selector.with_override(id, include),
            None => warn!(path = %path, "not in the index; override skipped"),
        }
    }
    selector
}

pub fn tags_json(store: &FileStore) -> serde_json::Value {
    let tags: Vec<_> = store
        .tags()
        .map(|t| json!({ "tag": t.name(), "files": t.len() }))
        .collect();
    json!({
        "root": store.root().to_string_lossy(),
        "files": store.len(),
        "tags": tags,
    })
}

pub fn selection_json(store: &FileStore, selection: &Selection) -> serde_json::Value {
    let files: Vec<_> = store
        .resolve(selection)
        .map(|f| {
            json!({
                "id": f.id(),
                "path": f.relative_path(),
                "tags": f.tags().collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({
        "files": files,
        "subtags": selection.subtags().collect::<Vec<_>>(),
    })
}

pub fn select(store: &FileStore, args: &SelectorArgs) -> serde_json::Value {
    let selection = store.select(build_selector(store, args));
    selection_json(store, &selection)
}

/// Applies `op` to the selection, then re-selects with the same arguments
/// so the output reflects the mutated index.
pub fn apply(
    store: &mut FileStore,
    args: &SelectorArgs,
    op: &Operation,
    verify: bool,
) -> Result<serde_json::Value> {
    let selection = store.select(build_selector(store, args));
    let report = store.apply(&selection, op);
    if verify {
        store
            .check_consistency()
            .context("index inconsistent after operation")?;
    }
    let refreshed = store.select(build_selector(store, args));
    Ok(json!({
        "report": serde_json::to_value(&report)?,
        "selection": selection_json(store, &refreshed),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_override_paths_are_skipped() {
        let store = FileStore::build("/", ["a/x", "b/y"], &PathTagger::new());
        let args = SelectorArgs {
            include: vec!["b/y".into(), "missing".into()],
            exclude: vec!["a/x".into()],
            ..SelectorArgs::default()
        };
        let selector = build_selector(&store, &args);
        assert_eq!(selector.overrides().len(), 2);
        assert!(selector.required_tags().is_empty());
    }
}
