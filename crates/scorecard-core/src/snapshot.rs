//! Score snapshots: one complete set of leaf scores for a subject.
//!
//! A snapshot mirrors the schema shape as nested JSON objects with integer
//! leaves. It is kept as a JSON map (key order preserved) so that whatever was
//! written to the history file round-trips unchanged; typed access goes
//! through [`LeafPath`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::{LeafPath, SubjectSchema};

/// Lowest score a leaf item can receive.
pub const MIN_SCORE: u8 = 1;
/// Highest score a leaf item can receive.
pub const MAX_SCORE: u8 = 5;
/// Score assumed for a leaf that is absent from a snapshot (the neutral midpoint).
pub const DEFAULT_SCORE: u8 = 3;

/// Returns `true` if `score` lies within `MIN_SCORE..=MAX_SCORE`.
pub fn is_valid_score(score: u8) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSnapshot(Map<String, Value>);

impl ScoreSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// A snapshot holding `DEFAULT_SCORE` for every leaf of `subject`.
    pub fn with_defaults(subject: &SubjectSchema) -> Self {
        let mut snapshot = Self::new();
        for leaf in subject.leaves() {
            snapshot.set(&leaf, DEFAULT_SCORE);
        }
        snapshot
    }

    /// Start from defaults and take every leaf of `subject` that `partial`
    /// carries. Keys in `partial` that the schema does not declare are dropped.
    pub fn completed_from(subject: &SubjectSchema, partial: &ScoreSnapshot) -> Self {
        let mut snapshot = Self::with_defaults(subject);
        for leaf in subject.leaves() {
            if let Some(score) = partial.score(&leaf) {
                snapshot.set(&leaf, score);
            }
        }
        snapshot
    }

    /// The recorded score for `leaf`, or `None` if the snapshot lacks it or
    /// holds something other than a small non-negative integer there.
    ///
    /// Callers decide what absence means: the formatter substitutes
    /// `DEFAULT_SCORE` for the current snapshot and omits the trend for the
    /// previous one. Use [`ScoreSnapshot::invalid_leaves`] to reject bad input
    /// before it is stored.
    pub fn score(&self, leaf: &LeafPath<'_>) -> Option<u8> {
        self.raw(leaf)?
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
    }

    fn raw(&self, leaf: &LeafPath<'_>) -> Option<&Value> {
        let mut node = self.0.get(leaf.category)?.as_object()?;
        if let Some(sub) = leaf.subcategory {
            node = node.get(sub)?.as_object()?;
        }
        node.get(leaf.item)
    }

    pub fn set(&mut self, leaf: &LeafPath<'_>, score: u8) {
        let mut node = child_object(&mut self.0, leaf.category);
        if let Some(sub) = leaf.subcategory {
            node = child_object(node, sub);
        }
        node.insert(leaf.item.to_string(), Value::from(score));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Leaves of `subject` present in the snapshot whose value is not an
    /// integer in `MIN_SCORE..=MAX_SCORE`, with the offending value.
    ///
    /// Strings, floats, negatives and oversized numbers are all reported;
    /// absent leaves are not.
    pub fn invalid_leaves<'s>(&self, subject: &'s SubjectSchema) -> Vec<(LeafPath<'s>, Value)> {
        subject
            .leaves()
            .into_iter()
            .filter_map(|leaf| {
                let value = self.raw(&leaf)?;
                let valid = value
                    .as_u64()
                    .and_then(|v| u8::try_from(v).ok())
                    .is_some_and(is_valid_score);
                (!valid).then(|| (leaf, value.clone()))
            })
            .collect()
    }
}

fn child_object<'m>(map: &'m mut Map<String, Value>, key: &str) -> &'m mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just replaced with an object"),
    }
}
