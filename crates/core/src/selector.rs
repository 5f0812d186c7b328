use crate::models::FileId;

/// An unevaluated query: tags a file must carry, tags it must not carry,
/// and per-file overrides that win over both.
///
/// Clauses keep the order they were added in; adding a tag twice is a no-op,
/// and overriding the same file twice keeps the last decision in the slot of
/// the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    required: Vec<String>,
    excluded: Vec<String>,
    overrides: Vec<(FileId, bool)>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, tag: impl Into<String>) -> Self {
        push_unique(&mut self.required, tag.into());
        self
    }

    pub fn require_all<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tags.into_iter().fold(self, Selector::require)
    }

    pub fn exclude(mut self, tag: impl Into<String>) -> Self {
        push_unique(&mut self.excluded, tag.into());
        self
    }

    pub fn exclude_all<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tags.into_iter().fold(self, Selector::exclude)
    }

    /// Force `file` into (`true`) or out of (`false`) the result.
    pub fn with_override(mut self, file: FileId, include: bool) -> Self {
        match self.overrides.iter_mut().find(|(id, _)| *id == file) {
            Some(slot) => slot.1 = include,
            None => self.overrides.push((file, include)),
        }
        self
    }

    pub fn include_file(self, file: FileId) -> Self {
        self.with_override(file, true)
    }

    pub fn exclude_file(self, file: FileId) -> Self {
        self.with_override(file, false)
    }

    pub fn required_tags(&self) -> &[String] {
        &self.required
    }

    pub fn excluded_tags(&self) -> &[String] {
        &self.excluded
    }

    pub fn overrides(&self) -> &[(FileId, bool)] {
        &self.overrides
    }

    /// True when no clause has anything in it. An empty selector selects
    /// nothing.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.excluded.is_empty() && self.overrides.is_empty()
    }
}

fn push_unique(list: &mut Vec<String>, tag: String) {
    if !list.contains(&tag) {
        list.push(tag);
    }
}
