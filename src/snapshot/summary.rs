use serde::Serialize;

use super::filter::is_internal_name;
use super::value::LocalValue;

/// Ordered capture of a frame's locals at a stop point. Kept by the router
/// between stops so value queries answer without resuming execution.
#[derive(Debug, Clone, Default)]
pub struct LocalsSnapshot {
    entries: Vec<(String, LocalValue)>,
}

impl LocalsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: LocalValue) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&LocalValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, LocalValue)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, LocalValue)> for LocalsSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, LocalValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocalSummaryEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub snapshot: Option<String>,
    pub is_tensor: bool,
}

/// Drops interpreter-internal names; the rest become summary entries.
pub fn build_locals_summary(snapshot: &LocalsSnapshot) -> Vec<LocalSummaryEntry> {
    snapshot
        .iter()
        .filter(|(name, _)| !is_internal_name(name))
        .map(|(name, value)| LocalSummaryEntry {
            name: name.clone(),
            type_tag: value.type_tag().to_string(),
            snapshot: value.preview(),
            is_tensor: value.is_tensor(),
        })
        .collect()
}
