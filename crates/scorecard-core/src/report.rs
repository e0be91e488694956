//! Report generation: score block → prompt → one chat call → report.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::EvaluationCatalog;
use crate::diff::format_score_details;
use crate::error::StoreError;
use crate::snapshot::ScoreSnapshot;
use crate::store::ScoreStore;
use crate::traits::{ChatProvider, ChatRequest, DEFAULT_SYSTEM_PROMPT};

/// A generated progress report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub subject: String,
    /// The filled template that was sent as the user prompt.
    pub prompt: String,
    pub content: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl FeedbackReport {
    /// Render as a Markdown document headed by the student's name.
    pub fn to_markdown(&self, student_name: &str) -> String {
        format!(
            "# {student_name} 的{subject}反馈报告\n\n\
             _{provider}/{model} · {time}_\n\n{content}\n",
            subject = self.subject,
            provider = self.provider,
            model = self.model,
            time = self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            content = self.content.trim(),
        )
    }

    pub fn save_markdown(&self, student_name: &str, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_markdown(student_name))
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}

/// Builds prompts from the catalog and sends them to a provider.
pub struct ReportGenerator<'a> {
    catalog: &'a EvaluationCatalog,
    system_prompt: String,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(catalog: &'a EvaluationCatalog) -> Self {
        Self {
            catalog,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// The user prompt for `current` compared against `previous`.
    pub fn build_prompt(
        &self,
        subject: &str,
        current: &ScoreSnapshot,
        previous: Option<&ScoreSnapshot>,
    ) -> Result<String> {
        let schema = self.catalog.subject(subject)?;
        let details = format_score_details(schema, current, previous);
        Ok(self.catalog.templates.render(subject, &details)?)
    }

    /// Build the prompt and make the single provider call.
    pub async fn generate(
        &self,
        provider: &dyn ChatProvider,
        subject: &str,
        current: &ScoreSnapshot,
        previous: Option<&ScoreSnapshot>,
    ) -> Result<FeedbackReport> {
        let prompt = self.build_prompt(subject, current, previous)?;
        debug!(subject, prompt_len = prompt.len(), "prompt built");

        let request = ChatRequest::new(self.system_prompt.clone(), prompt);
        let response = provider.complete(&request).await?;
        info!(
            subject,
            provider = provider.name(),
            model = %response.model,
            latency_ms = response.latency_ms,
            "report generated"
        );

        Ok(FeedbackReport {
            subject: subject.to_string(),
            prompt: request.user_prompt,
            content: response.content,
            provider: provider.name().to_string(),
            model: response.model,
            latency_ms: response.latency_ms,
            generated_at: Utc::now(),
        })
    }

    /// Report on the student's latest snapshot, compared with the one before.
    ///
    /// Nothing is written to the store; snapshots are persisted when they
    /// are submitted.
    pub async fn generate_for_student(
        &self,
        provider: &dyn ChatProvider,
        store: &ScoreStore,
        student_id: &str,
        subject: &str,
    ) -> Result<FeedbackReport> {
        if store.student(student_id).is_none() {
            return Err(StoreError::StudentNotFound(student_id.to_string()).into());
        }
        let current = store.latest(student_id, subject).ok_or_else(|| {
            anyhow::anyhow!("no scores recorded for student {student_id} in {subject}")
        })?;
        let previous = store.previous(student_id, subject);
        self.generate(provider, subject, current, previous).await
    }
}
