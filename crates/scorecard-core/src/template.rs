//! Per-subject prompt templates.
//!
//! Templates are plain strings with two placeholders: `{subject}` and
//! `{score_details}`. They are stored as a JSON object keyed by subject.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::TemplateError;

pub const SUBJECT_PLACEHOLDER: &str = "{subject}";
pub const DETAILS_PLACEHOLDER: &str = "{score_details}";

const CHINESE_TEMPLATE: &str = r#"
你是一位语文老师，根据学生的评价分数生成“近期学习水平及状态反馈”。以下是学生的打分（5分制，5为优秀，1为较差）：

{score_details}

请根据这些分数，为学生生成一段结构化的反馈描述，格式如下：

**语文近期学习水平及状态反馈**

**专业模块**
- 古文：...
- 现代文：...
- 写作：...
- 诗歌：...

**学习习惯**
- ...

**学生能力**
- ...

要求：
1. 反馈语言需简洁、客观、鼓励性，适合学生和家长阅读。
2. 根据分数高低（5-4为优秀，3为中等，2-1为需改进），描述学生的表现，并提出改进建议。
3. 如果有分数变化（与上次相比），突出进步或需要关注的退步。
4. 每项反馈控制在1-2句话。

请严格按照格式输出。
"#;

const MATH_TEMPLATE: &str = r#"
你是一位数学老师，根据学生的评价分数生成“近期学习水平及状态反馈”。以下是学生的打分（5分制，5为优秀，1为较差）：

{score_details}

请根据这些分数，为学生生成一段结构化的反馈描述，格式如下：

**数学近期学习水平及状态反馈**

**专业模块**
- 代数：...
- 几何：...
- 概率统计：...
- 数论：...

**学习习惯**
- ...

**学生能力**
- ...

要求：
1. 反馈语言需简洁、客观、鼓励性，适合学生和家长阅读。
2. 根据分数高低（5-4为优秀，3为中等，2-1为需改进），描述学生的表现，并提出改进建议。
3. 如果有分数变化（与上次相比），突出进步或需要关注的退步。
4. 每项反馈控制在1-2句话。

请严格按照格式输出。
"#;

/// Prompt templates keyed by subject, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    entries: Vec<(String, String)>,
}

impl PromptTemplates {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            ("语文".into(), CHINESE_TEMPLATE.into()),
            ("数学".into(), MATH_TEMPLATE.into()),
        ])
    }

    pub fn get(&self, subject: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == subject)
            .map(|(_, t)| t.as_str())
    }

    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Fill the subject's template with the subject name and score block.
    pub fn render(&self, subject: &str, score_details: &str) -> Result<String, TemplateError> {
        let template = self
            .get(subject)
            .ok_or_else(|| TemplateError::MissingSubject(subject.to_string()))?;
        Ok(template
            .replace(SUBJECT_PLACEHOLDER, subject)
            .replace(DETAILS_PLACEHOLDER, score_details))
    }

    pub fn from_json_str(content: &str) -> Result<Self, TemplateError> {
        let root: Map<String, Value> = serde_json::from_str(content)?;
        let entries = root
            .into_iter()
            .map(|(subject, template)| match template {
                Value::String(t) => Ok((subject, t)),
                _ => Err(TemplateError::NotAString(subject)),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { entries })
    }

    pub fn to_json_pretty(&self) -> String {
        let root: Map<String, Value> = self
            .entries
            .iter()
            .map(|(s, t)| (s.clone(), Value::String(t.clone())))
            .collect();
        serde_json::to_string_pretty(&root).unwrap_or_default()
    }

    /// Load templates from `path`, writing the built-in set there first if
    /// the file does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read templates: {}", path.display()))?;
            let templates = Self::from_json_str(&content)
                .with_context(|| format!("failed to parse templates: {}", path.display()))?;
            debug!(path = %path.display(), subjects = templates.entries.len(), "loaded templates");
            return Ok(templates);
        }

        let templates = Self::builtin();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, templates.to_json_pretty())
            .with_context(|| format!("failed to write templates: {}", path.display()))?;
        info!(path = %path.display(), "wrote default prompt templates");
        Ok(templates)
    }
}
