//! Derives a file's initial tags from its relative path.

use crate::config::TagConfig;
use std::collections::BTreeSet;
use std::path::Path;

pub trait TagDeriver {
    fn compute_tags(&self, path: &str) -> BTreeSet<String>;
}

impl<F> TagDeriver for F
where
    F: Fn(&str) -> BTreeSet<String>,
{
    fn compute_tags(&self, path: &str) -> BTreeSet<String> {
        self(path)
    }
}

/// Tags a file with every directory it sits under and, unless disabled, its
/// lower-cased extension. `music/live/set.FLAC` becomes `{music, live, flac}`.
#[derive(Debug, Clone)]
pub struct PathTagger {
    extension: bool,
    ignore: BTreeSet<String>,
}

impl Default for PathTagger {
    fn default() -> Self {
        Self::from_config(&TagConfig::default())
    }
}

impl PathTagger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &TagConfig) -> Self {
        Self {
            extension: cfg.extension,
            ignore: cfg.ignore.iter().cloned().collect(),
        }
    }

    pub fn with_extension(mut self, enabled: bool) -> Self {
        self.extension = enabled;
        self
    }

    /// Never turn this directory name into a tag.
    pub fn ignore(mut self, component: impl Into<String>) -> Self {
        self.ignore.insert(component.into());
        self
    }
}

impl TagDeriver for PathTagger {
    fn compute_tags(&self, path: &str) -> BTreeSet<String> {
        let mut components: Vec<&str> = path
            .split('/')
            .filter(|c| !c.is_empty() && *c != "." && *c != "..")
            .collect();
        let file_name = components.pop();

        let mut tags: BTreeSet<String> = components
            .into_iter()
            .filter(|c| !self.ignore.contains(*c))
            .map(str::to_string)
            .collect();

        if self.extension {
            let ext = file_name
                .and_then(|name| Path::new(name).extension())
                .and_then(|e| e.to_str())
                .filter(|e| !e.is_empty());
            if let Some(ext) = ext {
                tags.insert(ext.to_lowercase());
            }
        }
        tags
    }
}
