//! Evaluation schema: subjects, their categories and the leaf items that
//! receive a 1–5 score.
//!
//! The schema is stored as JSON of the form
//! `subject → category → [items] | {subcategory → [items]}`. Each category is
//! parsed once into a [`CategoryItems`] variant so the rest of the crate never
//! inspects JSON shapes again. Declared order is preserved everywhere.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::SchemaError;

/// The full evaluation dimension catalog, one entry per subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSchema {
    subjects: Vec<SubjectSchema>,
}

/// Evaluation dimensions for a single subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSchema {
    pub name: String,
    pub categories: Vec<Category>,
}

/// A named evaluation dimension within a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub items: CategoryItems,
}

/// The two shapes a category can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryItems {
    /// A flat list of leaf items.
    Flat(Vec<String>),
    /// One level of named subcategories, each holding leaf items.
    Nested(Vec<Subcategory>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subcategory {
    pub name: String,
    pub items: Vec<String>,
}

/// Location of one leaf item inside a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafPath<'a> {
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub item: &'a str,
}

impl fmt::Display for LeafPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subcategory {
            Some(sub) => write!(f, "{}/{}/{}", self.category, sub, self.item),
            None => write!(f, "{}/{}", self.category, self.item),
        }
    }
}

impl EvaluationSchema {
    pub fn new(subjects: Vec<SubjectSchema>) -> Self {
        Self { subjects }
    }

    /// The built-in schema covering 语文 and 数学.
    pub fn builtin() -> Self {
        let shared = |modules: &[(&str, [&str; 3])]| {
            vec![
                Category::nested(
                    "专业模块",
                    modules
                        .iter()
                        .map(|(name, items)| Subcategory::new(name, items.as_slice()))
                        .collect(),
                ),
                Category::flat("学习习惯", &["课堂专注度", "作业完成质量", "复习主动性"]),
                Category::flat("学生能力", &["答题速度", "正确率", "细心程度"]),
            ]
        };

        Self::new(vec![
            SubjectSchema {
                name: "语文".into(),
                categories: shared(&[
                    ("古文", ["字词理解", "句式分析", "篇章理解"]),
                    ("现代文", ["记叙文阅读", "说明文阅读", "议论文阅读"]),
                    ("写作", ["素材积累", "结构组织", "语言表达"]),
                    ("诗歌", ["意象理解", "情感分析", "技巧掌握"]),
                ]),
            },
            SubjectSchema {
                name: "数学".into(),
                categories: shared(&[
                    ("代数", ["方程求解", "函数理解", "运算能力"]),
                    ("几何", ["图形分析", "证明能力", "空间想象"]),
                    ("概率统计", ["数据分析", "概率计算", "统计应用"]),
                    ("数论", ["整数性质", "模运算", "应用题"]),
                ]),
            },
        ])
    }

    pub fn subjects(&self) -> &[SubjectSchema] {
        &self.subjects
    }

    pub fn subject(&self, name: &str) -> Option<&SubjectSchema> {
        self.subjects.iter().find(|s| s.name == name)
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(|s| s.name.as_str())
    }

    /// Parse a schema from its JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let root = value
            .as_object()
            .ok_or_else(|| SchemaError::ExpectedObject("$".into()))?;

        let mut subjects = Vec::with_capacity(root.len());
        for (subject, categories) in root {
            let categories = categories
                .as_object()
                .ok_or_else(|| SchemaError::ExpectedObject(subject.clone()))?;

            let mut parsed = Vec::with_capacity(categories.len());
            for (category, body) in categories {
                let path = format!("{subject}/{category}");
                let items = match body {
                    Value::Array(_) => CategoryItems::Flat(item_list(body, &path)?),
                    Value::Object(subs) => CategoryItems::Nested(
                        subs.iter()
                            .map(|(name, items)| -> Result<Subcategory, SchemaError> {
                                Ok(Subcategory {
                                    name: name.clone(),
                                    items: item_list(items, &format!("{path}/{name}"))?,
                                })
                            })
                            .collect::<Result<_, SchemaError>>()?,
                    ),
                    _ => return Err(SchemaError::InvalidCategory(path)),
                };
                parsed.push(Category {
                    name: category.clone(),
                    items,
                });
            }

            subjects.push(SubjectSchema {
                name: subject.clone(),
                categories: parsed,
            });
        }

        Ok(Self { subjects })
    }

    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        for subject in &self.subjects {
            let mut categories = Map::new();
            for category in &subject.categories {
                let body = match &category.items {
                    CategoryItems::Flat(items) => strings(items),
                    CategoryItems::Nested(subs) => Value::Object(
                        subs.iter()
                            .map(|s| (s.name.clone(), strings(&s.items)))
                            .collect(),
                    ),
                };
                categories.insert(category.name.clone(), body);
            }
            root.insert(subject.name.clone(), Value::Object(categories));
        }
        Value::Object(root)
    }

    pub fn to_json_pretty(&self) -> String {
        // Serializing a `Value` built from strings cannot fail.
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_default()
    }

    /// Load the schema from `path`, writing the built-in default there first
    /// if the file does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read schema: {}", path.display()))?;
            let schema = Self::from_json_str(&content)
                .with_context(|| format!("failed to parse schema: {}", path.display()))?;
            debug!(path = %path.display(), subjects = schema.subjects.len(), "loaded schema");
            return Ok(schema);
        }

        let schema = Self::builtin();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, schema.to_json_pretty())
            .with_context(|| format!("failed to write schema: {}", path.display()))?;
        info!(path = %path.display(), "wrote default schema");
        Ok(schema)
    }
}

impl SubjectSchema {
    /// Every leaf item in declared order.
    pub fn leaves(&self) -> Vec<LeafPath<'_>> {
        let mut leaves = Vec::new();
        for category in &self.categories {
            match &category.items {
                CategoryItems::Flat(items) => {
                    leaves.extend(items.iter().map(|item| LeafPath {
                        category: &category.name,
                        subcategory: None,
                        item,
                    }));
                }
                CategoryItems::Nested(subs) => {
                    for sub in subs {
                        leaves.extend(sub.items.iter().map(|item| LeafPath {
                            category: &category.name,
                            subcategory: Some(&sub.name),
                            item,
                        }));
                    }
                }
            }
        }
        leaves
    }

    /// Resolve a `category/item` or `category/subcategory/item` path.
    pub fn resolve(&self, path: &str) -> Option<LeafPath<'_>> {
        let parts: Vec<&str> = path.split('/').map(str::trim).collect();
        let (category, subcategory, item) = match parts.as_slice() {
            [c, i] => (*c, None, *i),
            [c, s, i] => (*c, Some(*s), *i),
            _ => return None,
        };
        self.leaves()
            .into_iter()
            .find(|l| l.category == category && l.subcategory == subcategory && l.item == item)
    }
}

impl Category {
    pub fn flat(name: &str, items: &[&str]) -> Self {
        Self {
            name: name.into(),
            items: CategoryItems::Flat(items.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn nested(name: &str, subcategories: Vec<Subcategory>) -> Self {
        Self {
            name: name.into(),
            items: CategoryItems::Nested(subcategories),
        }
    }
}

impl Subcategory {
    pub fn new(name: &str, items: &[&str]) -> Self {
        Self {
            name: name.into(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn item_list(value: &Value, path: &str) -> Result<Vec<String>, SchemaError> {
    value
        .as_array()
        .ok_or_else(|| SchemaError::ExpectedItemList(path.to_string()))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| SchemaError::ExpectedItemList(path.to_string()))
        })
        .collect()
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}
