//! Student roster and score history persistence.
//!
//! The store owns two files: a CSV roster (`student_id,name`) and a JSON
//! history (`student_id → subject → [snapshot, ...]`). Every mutation rewrites
//! the affected file in full. There is no write-ahead log; a crash mid-write
//! can leave a file truncated.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::snapshot::ScoreSnapshot;

/// Roster written when no roster file exists yet.
pub const DEFAULT_ROSTER: &[(&str, &str)] = &[
    ("001", "张伟"),
    ("002", "李娜"),
    ("003", "王芳"),
    ("004", "刘洋"),
    ("005", "陈晨"),
    ("006", "杨磊"),
    ("007", "赵静"),
    ("008", "周浩"),
];

const ROSTER_HEADER: [&str; 2] = ["student_id", "name"];

/// A student identity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub name: String,
}

/// Locations of the two persisted files.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub roster: PathBuf,
    pub history: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            roster: dir.join("students.csv"),
            history: dir.join("scores.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SubjectHistory {
    subject: String,
    snapshots: Vec<ScoreSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
struct StudentRecord {
    student: Student,
    subjects: Vec<SubjectHistory>,
}

impl StudentRecord {
    fn new(student: Student) -> Self {
        Self {
            student,
            subjects: Vec::new(),
        }
    }

    fn history(&self, subject: &str) -> Option<&SubjectHistory> {
        self.subjects.iter().find(|h| h.subject == subject)
    }
}

/// In-memory owner of all student and score data, backed by the two files.
#[derive(Debug)]
pub struct ScoreStore {
    paths: StorePaths,
    records: Vec<StudentRecord>,
}

impl ScoreStore {
    /// Load roster and history from disk.
    ///
    /// A missing roster is seeded with [`DEFAULT_ROSTER`] and written
    /// immediately. A missing history file means no scores yet. History
    /// entries for ids that are not on the roster are skipped.
    pub fn load(paths: StorePaths) -> Result<Self, StoreError> {
        let mut store = Self {
            paths,
            records: Vec::new(),
        };

        if store.paths.roster.exists() {
            store.read_roster()?;
        } else {
            store.records = DEFAULT_ROSTER
                .iter()
                .map(|(id, name)| {
                    StudentRecord::new(Student {
                        student_id: id.to_string(),
                        name: name.to_string(),
                    })
                })
                .collect();
            store.save_roster()?;
            info!(path = %store.paths.roster.display(), "seeded default roster");
        }

        if store.paths.history.exists() {
            store.read_history()?;
        }

        debug!(students = store.records.len(), "score store loaded");
        Ok(store)
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Students in roster order.
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.records.iter().map(|r| &r.student)
    }

    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.record(student_id).map(|r| &r.student)
    }

    /// First student on the roster with exactly this name.
    pub fn find_by_name(&self, name: &str) -> Option<&Student> {
        self.students().find(|s| s.name == name)
    }

    /// Register a student. Returns `false` without touching disk if the id is
    /// already known.
    pub fn add_student(&mut self, student_id: &str, name: &str) -> Result<bool, StoreError> {
        if self.record(student_id).is_some() {
            debug!(student_id, "student already registered");
            return Ok(false);
        }
        self.records.push(StudentRecord::new(Student {
            student_id: student_id.to_string(),
            name: name.to_string(),
        }));
        self.save_roster()?;
        info!(student_id, name, "added student");
        Ok(true)
    }

    pub fn rename_student(&mut self, student_id: &str, new_name: &str) -> Result<(), StoreError> {
        let record = self
            .record_mut(student_id)
            .ok_or_else(|| StoreError::StudentNotFound(student_id.to_string()))?;
        record.student.name = new_name.to_string();
        self.save_roster()?;
        info!(student_id, new_name, "renamed student");
        Ok(())
    }

    /// Append `snapshot` to the student's history for `subject` and persist
    /// the whole history file. Returns the new history length.
    pub fn append_scores(
        &mut self,
        student_id: &str,
        subject: &str,
        snapshot: ScoreSnapshot,
    ) -> Result<usize, StoreError> {
        let record = self
            .record_mut(student_id)
            .ok_or_else(|| StoreError::StudentNotFound(student_id.to_string()))?;

        let position = match record.subjects.iter().position(|h| h.subject == subject) {
            Some(i) => i,
            None => {
                record.subjects.push(SubjectHistory {
                    subject: subject.to_string(),
                    snapshots: Vec::new(),
                });
                record.subjects.len() - 1
            }
        };
        let history = &mut record.subjects[position];
        history.snapshots.push(snapshot);
        let len = history.snapshots.len();

        self.save_history()?;
        info!(student_id, subject, entries = len, "appended scores");
        Ok(len)
    }

    /// Full history for one (student, subject) pair, oldest first.
    pub fn history(&self, student_id: &str, subject: &str) -> &[ScoreSnapshot] {
        self.record(student_id)
            .and_then(|r| r.history(subject))
            .map(|h| h.snapshots.as_slice())
            .unwrap_or(&[])
    }

    /// Subjects with at least one entry for this student, in first-recorded order.
    pub fn subjects_for(&self, student_id: &str) -> Vec<&str> {
        self.record(student_id)
            .map(|r| {
                r.subjects
                    .iter()
                    .filter(|h| !h.snapshots.is_empty())
                    .map(|h| h.subject.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The most recently appended snapshot.
    pub fn latest(&self, student_id: &str, subject: &str) -> Option<&ScoreSnapshot> {
        self.history(student_id, subject).last()
    }

    /// The snapshot appended just before the latest one.
    pub fn previous(&self, student_id: &str, subject: &str) -> Option<&ScoreSnapshot> {
        let history = self.history(student_id, subject);
        history.len().checked_sub(2).map(|i| &history[i])
    }

    fn record(&self, student_id: &str) -> Option<&StudentRecord> {
        self.records.iter().find(|r| r.student.student_id == student_id)
    }

    fn record_mut(&mut self, student_id: &str) -> Option<&mut StudentRecord> {
        self.records
            .iter_mut()
            .find(|r| r.student.student_id == student_id)
    }

    fn read_roster(&mut self) -> Result<(), StoreError> {
        let path = self.paths.roster.clone();
        let csv_err = |source| StoreError::Csv {
            path: path.clone(),
            source,
        };

        let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
        for row in reader.deserialize::<Student>() {
            let student = row.map_err(csv_err)?;
            // A repeated id keeps its first position and takes the later name.
            match self.record_mut(&student.student_id) {
                Some(existing) => existing.student.name = student.name,
                None => self.records.push(StudentRecord::new(student)),
            }
        }
        Ok(())
    }

    fn read_history(&mut self) -> Result<(), StoreError> {
        let path = self.paths.history.clone();
        let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let root: Map<String, Value> =
            serde_json::from_str(&content).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?;

        let malformed = |message: String| StoreError::MalformedHistory {
            path: path.clone(),
            message,
        };

        for (student_id, subjects) in root {
            let Some(record) = self.record_mut(&student_id) else {
                warn!(student_id, "ignoring score history for unknown student");
                continue;
            };
            let Value::Object(subjects) = subjects else {
                return Err(malformed(format!("entry for {student_id} is not an object")));
            };

            for (subject, snapshots) in subjects {
                let snapshots: Vec<ScoreSnapshot> = serde_json::from_value(snapshots)
                    .map_err(|e| malformed(format!("{student_id}/{subject}: {e}")))?;
                record.subjects.push(SubjectHistory { subject, snapshots });
            }
        }
        Ok(())
    }

    fn save_roster(&self) -> Result<(), StoreError> {
        let path = &self.paths.roster;
        ensure_parent(path)?;
        let csv_err = |source| StoreError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        writer.write_record(ROSTER_HEADER).map_err(csv_err)?;
        for student in self.students() {
            writer
                .write_record([student.student_id.as_str(), student.name.as_str()])
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), students = self.records.len(), "roster saved");
        Ok(())
    }

    fn save_history(&self) -> Result<(), StoreError> {
        let path = &self.paths.history;
        let json_err = |source| StoreError::Json {
            path: path.clone(),
            source,
        };

        let mut root = Map::new();
        for record in &self.records {
            let mut subjects = Map::new();
            for history in &record.subjects {
                subjects.insert(
                    history.subject.clone(),
                    serde_json::to_value(&history.snapshots).map_err(json_err)?,
                );
            }
            root.insert(record.student.student_id.clone(), Value::Object(subjects));
        }

        let content = serde_json::to_string_pretty(&root).map_err(json_err)?;
        ensure_parent(path)?;
        std::fs::write(path, content).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "score history saved");
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
