use crate::models::FileId;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// A broken link between a file and a tag entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("file {file} carries tag `{tag}` which is not indexed")]
    DanglingTag { file: FileId, tag: String },
    #[error("file {file} carries tag `{tag}` but is not one of its members")]
    MissingMember { file: FileId, tag: String },
    #[error("tag `{tag}` lists file {file} which does not carry it")]
    MissingBackReference { file: FileId, tag: String },
    #[error("tag `{tag}` lists unknown file {file}")]
    UnknownFile { file: FileId, tag: String },
    #[error("tag `{tag}` is indexed with no files")]
    EmptyTag { tag: String },
    #[error("tag entry stored under `{key}` is named `{name}`")]
    KeyMismatch { key: String, name: String },
    #[error("file at position {position} has id {file}")]
    MisplacedFile { position: usize, file: FileId },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("discovery root is not a directory: {0}")]
    MissingRoot(PathBuf),
    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("failed to run discovery command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("discovery command `{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },
}
