//! Score comparison and the per-item text block fed into report prompts.
//!
//! For each leaf of a subject, in schema order, the current score is taken
//! from the snapshot (or [`DEFAULT_SCORE`] when missing) and the previous
//! score only if a prior snapshot exists and holds that exact leaf. Lines look
//! like:
//!
//! ```text
//! 专业模块：
//! 古文：
//! 字词理解：4/5（与上次相比：进步）
//! ```

use std::fmt;

use serde::Serialize;

use crate::schema::{CategoryItems, LeafPath, SubjectSchema};
use crate::snapshot::{ScoreSnapshot, DEFAULT_SCORE, MAX_SCORE};

/// Direction of change between two scores for the same leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improved,
    Declined,
    Unchanged,
}

impl Trend {
    pub fn between(current: u8, previous: u8) -> Self {
        match current.cmp(&previous) {
            std::cmp::Ordering::Greater => Trend::Improved,
            std::cmp::Ordering::Less => Trend::Declined,
            std::cmp::Ordering::Equal => Trend::Unchanged,
        }
    }

    /// The label used in prompts.
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improved => "进步",
            Trend::Declined => "下降",
            Trend::Unchanged => "持平",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The resolved scores for one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemScore<'a> {
    pub leaf: LeafPath<'a>,
    pub current: u8,
    /// `true` when the current snapshot lacked this leaf and `DEFAULT_SCORE` was used.
    pub defaulted: bool,
    pub previous: Option<u8>,
}

impl ItemScore<'_> {
    pub fn trend(&self) -> Option<Trend> {
        self.previous.map(|prev| Trend::between(self.current, prev))
    }
}

/// One line of the score-detail block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreLine<'a> {
    Category(&'a str),
    Subcategory(&'a str),
    Item(ItemScore<'a>),
}

impl fmt::Display for ScoreLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreLine::Category(name) | ScoreLine::Subcategory(name) => write!(f, "{name}："),
            ScoreLine::Item(item) => {
                write!(f, "{}：{}/{}", item.leaf.item, item.current, MAX_SCORE)?;
                if let Some(trend) = item.trend() {
                    write!(f, "（与上次相比：{trend}）")?;
                }
                Ok(())
            }
        }
    }
}

/// Walk `subject` and resolve every leaf against the two snapshots.
pub fn compare<'a>(
    subject: &'a SubjectSchema,
    current: &ScoreSnapshot,
    previous: Option<&ScoreSnapshot>,
) -> Vec<ScoreLine<'a>> {
    let resolve = |leaf: LeafPath<'a>| {
        let recorded = current.score(&leaf);
        ScoreLine::Item(ItemScore {
            leaf,
            current: recorded.unwrap_or(DEFAULT_SCORE),
            defaulted: recorded.is_none(),
            previous: previous.and_then(|p| p.score(&leaf)),
        })
    };

    let mut lines = Vec::new();
    for category in &subject.categories {
        lines.push(ScoreLine::Category(&category.name));
        match &category.items {
            CategoryItems::Flat(items) => {
                lines.extend(items.iter().map(|item| {
                    resolve(LeafPath {
                        category: &category.name,
                        subcategory: None,
                        item,
                    })
                }));
            }
            CategoryItems::Nested(subs) => {
                for sub in subs {
                    lines.push(ScoreLine::Subcategory(&sub.name));
                    lines.extend(sub.items.iter().map(|item| {
                        resolve(LeafPath {
                            category: &category.name,
                            subcategory: Some(&sub.name),
                            item,
                        })
                    }));
                }
            }
        }
    }
    lines
}

/// The newline-joined score-detail block for a prompt.
pub fn format_score_details(
    subject: &SubjectSchema,
    current: &ScoreSnapshot,
    previous: Option<&ScoreSnapshot>,
) -> String {
    compare(subject, current, previous)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
