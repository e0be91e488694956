//! The `scorecard prompt` command.

use anyhow::Result;

use scorecard_core::ReportGenerator;

use super::Session;
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, student: &str, subject: Option<&str>) -> Result<()> {
    let session = Session::open(global)?;
    let student = session.resolve_student(student)?;
    let subject = session.resolve_subject(subject)?;

    let current = session
        .store
        .latest(&student.student_id, &subject)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no scores recorded for student {} in {subject}",
                student.student_id
            )
        })?;
    let previous = session.store.previous(&student.student_id, &subject);

    let prompt = ReportGenerator::new(&session.catalog).build_prompt(&subject, current, previous)?;
    println!("{}", prompt.trim());
    Ok(())
}
