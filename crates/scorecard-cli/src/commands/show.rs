//! The `scorecard show` command.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use scorecard_core::diff::{compare, ScoreLine, Trend};

use super::Session;
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, student: &str, subject: Option<&str>) -> Result<()> {
    let session = Session::open(global)?;
    let student = session.resolve_student(student)?;
    let subject = session.resolve_subject(subject)?;
    let schema = session.catalog.subject(&subject)?;

    let history = session.store.history(&student.student_id, &subject);
    let Some(latest) = history.last() else {
        println!(
            "No {subject} scores recorded for {} ({}) yet.",
            student.name, student.student_id
        );
        return Ok(());
    };
    let previous = history.len().checked_sub(2).and_then(|i| history.get(i));

    println!(
        "{} ({}) {subject}: {} entries",
        student.name,
        student.student_id,
        history.len()
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Category", "Subcategory", "Item", "Score", "Previous", "Trend"]);

    for line in compare(schema, latest, previous) {
        let ScoreLine::Item(item) = line else {
            continue;
        };
        let score = if item.defaulted {
            format!("{} (default)", item.current)
        } else {
            item.current.to_string()
        };
        let trend = match item.trend() {
            Some(Trend::Improved) => Cell::new(Trend::Improved).fg(Color::Green),
            Some(Trend::Declined) => Cell::new(Trend::Declined).fg(Color::Red),
            Some(Trend::Unchanged) => Cell::new(Trend::Unchanged),
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(item.leaf.category),
            Cell::new(item.leaf.subcategory.unwrap_or("")),
            Cell::new(item.leaf.item),
            Cell::new(score),
            Cell::new(
                item.previous
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            trend,
        ]);
    }

    println!("{table}");
    Ok(())
}
