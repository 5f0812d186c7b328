//! Core library: file discovery, path tagging, the file↔tag index and its
//! query and mutation operations.

pub mod config;
pub mod error;
pub mod models;
pub mod operation;
pub mod scanner;
pub mod selection;
pub mod selector;
pub mod store;
pub mod tagger;

pub use models::{File, FileId, TagEntry};
pub use operation::{Operation, OperationKind};
pub use selection::Selection;
pub use selector::Selector;
pub use store::{ApplyReport, FileStore};
