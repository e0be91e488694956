//! The `scorecard students` commands.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Table};

use super::Session;
use crate::GlobalArgs;

pub fn list(global: &GlobalArgs) -> Result<()> {
    let session = Session::open(global)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Subjects scored"]);
    for student in session.store.students() {
        let subjects = session
            .store
            .subjects_for(&student.student_id)
            .iter()
            .map(|subject| {
                format!(
                    "{subject} ({})",
                    session.store.history(&student.student_id, subject).len()
                )
            })
            .collect::<Vec<_>>();
        table.add_row(vec![
            Cell::new(&student.student_id),
            Cell::new(&student.name),
            Cell::new(if subjects.is_empty() {
                "-".to_string()
            } else {
                subjects.join(", ")
            }),
        ]);
    }

    println!("{table}");
    Ok(())
}

pub fn add(global: &GlobalArgs, id: &str, name: &str) -> Result<()> {
    let (id, name) = (id.trim(), name.trim());
    anyhow::ensure!(
        !id.is_empty() && !name.is_empty(),
        "student id and name must both be non-empty"
    );

    let mut session = Session::open(global)?;
    if session.store.add_student(id, name)? {
        println!("Added student {id} ({name})");
    } else {
        let existing = session
            .store
            .student(id)
            .map(|s| s.name.as_str())
            .unwrap_or_default();
        println!("Student {id} already exists ({existing}), skipping.");
    }
    Ok(())
}

pub fn rename(global: &GlobalArgs, student: &str, name: &str) -> Result<()> {
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "new name must be non-empty");

    let mut session = Session::open(global)?;
    let current = session.resolve_student(student)?;
    session.store.rename_student(&current.student_id, name)?;
    println!(
        "Renamed student {}: {} -> {name}",
        current.student_id, current.name
    );
    Ok(())
}
