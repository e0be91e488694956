//! The `scorecard report` command.

use std::path::PathBuf;

use anyhow::Result;

use scorecard_core::error::ProviderError;
use scorecard_core::ReportGenerator;
use scorecard_providers::create_provider;

use super::Session;
use crate::GlobalArgs;

/// Command-line overrides for the provider section of the config.
#[derive(Debug, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

pub async fn execute(
    global: &GlobalArgs,
    student: &str,
    subject: Option<&str>,
    overrides: Overrides,
    output: Option<PathBuf>,
) -> Result<()> {
    let session = Session::open(global)?;
    let student = session.resolve_student(student)?;
    let subject = session.resolve_subject(subject)?;

    let provider_name = overrides
        .provider
        .unwrap_or_else(|| session.config.default_provider.clone());
    let mut provider_config = session.config.provider(&provider_name)?;
    if let Some(key) = overrides.api_key {
        provider_config.api_key = key;
    }
    if let Some(model) = overrides.model {
        provider_config.model = Some(model);
    }
    let provider = create_provider(&provider_config, session.config.timeout())?;

    eprintln!(
        "Generating {subject} report for {} with {}/{}...",
        student.name,
        provider.name(),
        provider.model()
    );

    let generator =
        ReportGenerator::new(&session.catalog).with_system_prompt(session.config.system_prompt.clone());
    let report = match generator
        .generate_for_student(provider.as_ref(), &session.store, &student.student_id, &subject)
        .await
    {
        Ok(report) => report,
        Err(e)
            if e.downcast_ref::<ProviderError>()
                .is_some_and(|pe| matches!(pe, ProviderError::MissingCredential(_))) =>
        {
            return Err(e.context(format!(
                "set api_key for {provider_name} in scorecard.toml, export {}, or pass --api-key",
                provider_config.kind.key_env_var()
            )));
        }
        Err(e) => return Err(e),
    };

    println!("**{} 的反馈报告**\n", student.name);
    println!("{}", report.content.trim());

    if let Some(path) = output {
        report.save_markdown(&student.name, &path)?;
        eprintln!("\nReport saved to: {}", path.display());
    }

    Ok(())
}
