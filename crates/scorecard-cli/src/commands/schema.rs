//! The `scorecard schema` command.

use anyhow::Result;

use scorecard_core::schema::{CategoryItems, SubjectSchema};

use super::Session;
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, subject: Option<&str>) -> Result<()> {
    let session = Session::open(global)?;

    let subjects: Vec<&SubjectSchema> = match subject {
        Some(name) => vec![session.catalog.subject(name)?],
        None => session.catalog.schema.subjects().iter().collect(),
    };

    for (i, subject) in subjects.into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_subject(subject);
        if session.catalog.templates.get(&subject.name).is_none() {
            println!("  (no prompt template)");
        }
    }
    Ok(())
}

fn print_subject(subject: &SubjectSchema) {
    println!("{}", subject.name);
    for category in &subject.categories {
        match &category.items {
            CategoryItems::Flat(items) => println!("  {}: {}", category.name, items.join(", ")),
            CategoryItems::Nested(subs) => {
                println!("  {}", category.name);
                for sub in subs {
                    println!("    {}: {}", sub.name, sub.items.join(", "));
                }
            }
        }
    }
}
