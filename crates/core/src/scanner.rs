//! File discovery: produces the ordered list of relative paths the index is
//! built from.

use crate::config::{DiscoveryConfig, DiscoveryMode};
use crate::error::ScanError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

pub trait FileDiscovery {
    /// Paths relative to the working root, `/`-separated, in a stable order.
    fn discover(&self) -> anyhow::Result<Vec<String>>;
}

/// Builds the discovery collaborator selected by `cfg.mode`.
pub fn from_config(cfg: &DiscoveryConfig) -> Result<Box<dyn FileDiscovery>, ScanError> {
    Ok(match cfg.mode {
        DiscoveryMode::Walk => Box::new(WalkDiscovery::from_config(cfg)?),
        DiscoveryMode::Command => Box::new(CommandDiscovery::new(&cfg.root, &cfg.command)),
    })
}

pub struct WalkDiscovery {
    root: PathBuf,
    excludes: GlobSet,
    include_hidden: bool,
    follow_links: bool,
}

impl WalkDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excludes: GlobSet::empty(),
            include_hidden: false,
            follow_links: false,
        }
    }

    pub fn from_config(cfg: &DiscoveryConfig) -> Result<Self, ScanError> {
        Ok(Self::new(&cfg.root)
            .with_excludes(&cfg.exclude)?
            .include_hidden(cfg.include_hidden)
            .follow_links(cfg.follow_links))
    }

    /// Glob patterns matched against the relative path.
    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self, ScanError> {
        self.excludes = build_globset(patterns)?;
        Ok(self)
    }

    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.include_hidden = yes;
        self
    }

    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    fn should_descend(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }
        match path.strip_prefix(&self.root) {
            Ok(rel) => !self.excludes.is_match(rel),
            Err(_) => true,
        }
    }
}

impl FileDiscovery for WalkDiscovery {
    fn discover(&self) -> anyhow::Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(ScanError::MissingRoot(self.root.clone()).into());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || self.should_descend(e.path()))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .ok()
                .and_then(normalize);
            if let Some(relative) = relative {
                paths.push(relative);
            }
        }

        info!(root = %self.root.display(), files = paths.len(), "walk discovery complete");
        Ok(paths)
    }
}

/// Runs a shell command that prints one path per line, e.g. `find . -type f`.
/// The command runs inside `root`; absolute output is made relative to it.
pub struct CommandDiscovery {
    root: PathBuf,
    command: String,
}

impl CommandDiscovery {
    pub fn new(root: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            command: command.into(),
        }
    }

    /// Absolute spellings of the root that absolute output lines may start
    /// with: the canonical path first, then the root joined onto the cwd.
    fn absolute_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Ok(canonical) = std::fs::canonicalize(&self.root) {
            roots.push(canonical);
        }
        if let Ok(cwd) = std::env::current_dir() {
            let joined = cwd.join(&self.root);
            if !roots.contains(&joined) {
                roots.push(joined);
            }
        }
        roots
    }
}

impl FileDiscovery for CommandDiscovery {
    fn discover(&self) -> anyhow::Result<Vec<String>> {
        let output = shell(&self.command)
            .current_dir(&self.root)
            .output()
            .map_err(|source| ScanError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ScanError::CommandFailed {
                command: self.command.clone(),
                status: output.status,
            }
            .into());
        }

        let paths = parse_listing(&self.absolute_roots(), &output.stdout);
        info!(command = %self.command, files = paths.len(), "command discovery complete");
        Ok(paths)
    }
}

/// Turns newline-separated command output into relative paths. Lines that
/// are not UTF-8 or lie outside every root are dropped.
fn parse_listing(roots: &[PathBuf], stdout: &[u8]) -> Vec<String> {
    stdout
        .split(|&b| b == b'\n')
        .filter_map(|raw| match std::str::from_utf8(raw) {
            Ok(line) => relativize(roots, line),
            Err(_) => {
                debug!(line = %String::from_utf8_lossy(raw), "skipping non UTF-8 path");
                None
            }
        })
        .collect()
}

fn relativize(roots: &[PathBuf], line: &str) -> Option<String> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }
    let path = Path::new(line);
    if !path.is_absolute() {
        return normalize(path);
    }
    match roots.iter().find_map(|root| path.strip_prefix(root).ok()) {
        Some(rel) => normalize(rel),
        None => {
            debug!(path = %line, "command output outside the root skipped");
            None
        }
    }
}

/// A fixed path list, for tests and embedders that already know their files.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery(pub Vec<String>);

impl FileDiscovery for StaticDiscovery {
    fn discover(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Joins the normal components of a relative path with `/`. Paths that are
/// not valid UTF-8 are skipped; a lossy name would not name the file.
fn normalize(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            match part.to_str() {
                Some(part) => parts.push(part),
                None => {
                    debug!(path = %path.display(), "skipping non UTF-8 path");
                    return None;
                }
            }
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
