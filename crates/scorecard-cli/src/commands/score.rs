//! The `scorecard score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use scorecard_core::schema::{LeafPath, SubjectSchema};
use scorecard_core::snapshot::{is_valid_score, MAX_SCORE, MIN_SCORE};
use scorecard_core::ScoreSnapshot;

use super::Session;
use crate::GlobalArgs;

pub fn execute(
    global: &GlobalArgs,
    student: &str,
    subject: Option<&str>,
    sets: &[String],
    file: Option<PathBuf>,
) -> Result<()> {
    let mut session = Session::open(global)?;
    let student = session.resolve_student(student)?;
    let subject = session.resolve_subject(subject)?;
    let schema = session.catalog.subject(&subject)?;

    let mut snapshot = match file {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read scores: {}", path.display()))?;
            let partial: ScoreSnapshot = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse scores: {}", path.display()))?;
            let invalid = partial.invalid_leaves(schema);
            if let Some((leaf, value)) = invalid.first() {
                anyhow::bail!(
                    "score {value} for {leaf} is not a whole number in {MIN_SCORE}-{MAX_SCORE}; {} invalid in total",
                    invalid.len()
                );
            }
            ScoreSnapshot::completed_from(schema, &partial)
        }
        None => ScoreSnapshot::with_defaults(schema),
    };

    for assignment in sets {
        let (leaf, score) = parse_assignment(schema, assignment)?;
        snapshot.set(&leaf, score);
    }

    let entries = session
        .store
        .append_scores(&student.student_id, &subject, snapshot)?;
    println!(
        "Saved {subject} scores for {} ({}), entry #{entries}",
        student.name, student.student_id
    );
    Ok(())
}

/// Parse `category[/subcategory]/item=score` against the subject's leaves.
fn parse_assignment<'s>(schema: &'s SubjectSchema, assignment: &str) -> Result<(LeafPath<'s>, u8)> {
    let (path, score) = assignment
        .rsplit_once('=')
        .with_context(|| format!("expected PATH=SCORE, got '{assignment}'"))?;
    let leaf = schema.resolve(path.trim()).with_context(|| {
        format!(
            "'{}' is not an item of {}. Run `scorecard schema --subject {}` to list items",
            path.trim(),
            schema.name,
            schema.name
        )
    })?;
    let score: u8 = score
        .trim()
        .parse()
        .with_context(|| format!("score for {leaf} must be a whole number, got '{score}'"))?;
    anyhow::ensure!(
        is_valid_score(score),
        "score for {leaf} must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
    );
    Ok((leaf, score))
}
