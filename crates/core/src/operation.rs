use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    AddTag,
    RemoveTag,
    DeleteFiles,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::AddTag => "add_tag",
            OperationKind::RemoveTag => "remove_tag",
            OperationKind::DeleteFiles => "delete_files",
        })
    }
}

/// A mutation to apply to every file of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    AddTag { tag: String },
    RemoveTag { tag: String },
    /// Deleting files is left to the caller; the index ignores it.
    DeleteFiles,
}

impl Operation {
    pub fn add_tag(tag: impl Into<String>) -> Self {
        Operation::AddTag { tag: tag.into() }
    }

    pub fn remove_tag(tag: impl Into<String>) -> Self {
        Operation::RemoveTag { tag: tag.into() }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::AddTag { .. } => OperationKind::AddTag,
            Operation::RemoveTag { .. } => OperationKind::RemoveTag,
            Operation::DeleteFiles => OperationKind::DeleteFiles,
        }
    }

    /// The tag name, or an empty string for [`Operation::DeleteFiles`].
    pub fn payload(&self) -> &str {
        match self {
            Operation::AddTag { tag } | Operation::RemoveTag { tag } => tag,
            Operation::DeleteFiles => "",
        }
    }
}
