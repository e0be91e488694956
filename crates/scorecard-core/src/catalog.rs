//! The evaluation catalog: schema plus prompt templates, loaded once at
//! startup and handed to whoever needs them.

use std::path::Path;

use anyhow::Result;
use tracing::warn;

use crate::schema::{EvaluationSchema, SubjectSchema};
use crate::template::PromptTemplates;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationCatalog {
    pub schema: EvaluationSchema,
    pub templates: PromptTemplates,
}

impl EvaluationCatalog {
    pub fn new(schema: EvaluationSchema, templates: PromptTemplates) -> Self {
        Self { schema, templates }
    }

    pub fn builtin() -> Self {
        Self::new(EvaluationSchema::builtin(), PromptTemplates::builtin())
    }

    /// Load both files, writing built-in defaults for whichever is missing.
    pub fn load_or_init(schema_path: &Path, templates_path: &Path) -> Result<Self> {
        let catalog = Self::new(
            EvaluationSchema::load_or_init(schema_path)?,
            PromptTemplates::load_or_init(templates_path)?,
        );
        for subject in catalog.subjects_without_template() {
            warn!(subject, "subject has no prompt template; reports for it will fail");
        }
        Ok(catalog)
    }

    pub fn subject(&self, name: &str) -> Result<&SubjectSchema> {
        self.schema.subject(name).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown subject '{}'. Available: {:?}",
                name,
                self.schema.subject_names().collect::<Vec<_>>()
            )
        })
    }

    /// The first subject in the schema, used when none is chosen.
    pub fn default_subject(&self) -> Option<&str> {
        self.schema.subject_names().next()
    }

    pub fn subjects_without_template(&self) -> Vec<&str> {
        self.schema
            .subject_names()
            .filter(|s| self.templates.get(s).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_complete() {
        let catalog = EvaluationCatalog::builtin();
        assert!(catalog.subjects_without_template().is_empty());
        assert_eq!(catalog.default_subject(), Some("语文"));
        assert!(catalog.subject("数学").is_ok());

        let err = catalog.subject("物理").unwrap_err();
        assert!(err.to_string().contains("unknown subject '物理'"));
    }

    #[test]
    fn load_or_init_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("EVALUATION_SCHEMA.json");
        let templates = dir.path().join("PROMPT_TEMPLATES.json");

        let catalog = EvaluationCatalog::load_or_init(&schema, &templates).unwrap();
        assert_eq!(catalog, EvaluationCatalog::builtin());
        assert!(schema.exists());
        assert!(templates.exists());
    }

    #[test]
    fn reports_subjects_missing_templates() {
        let catalog = EvaluationCatalog::new(
            EvaluationSchema::from_json_str(r#"{"语文": {"A": ["x"]}, "物理": {"A": ["x"]}}"#)
                .unwrap(),
            PromptTemplates::builtin(),
        );
        assert_eq!(catalog.subjects_without_template(), vec!["物理"]);
    }
}
