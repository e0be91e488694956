pub mod init;
pub mod prompt;
pub mod report;
pub mod schema;
pub mod score;
pub mod show;
pub mod students;

use anyhow::Result;
use tracing::debug;

use scorecard_core::error::StoreError;
use scorecard_core::{EvaluationCatalog, ScoreStore, Student};
use scorecard_providers::config::load_config_from;
use scorecard_providers::ScorecardConfig;

use crate::GlobalArgs;

/// Everything a command needs: config, schema + templates, and the store.
pub struct Session {
    pub config: ScorecardConfig,
    pub catalog: EvaluationCatalog,
    pub store: ScoreStore,
}

impl Session {
    /// Load config, then the data files it points at, seeding any that are missing.
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        Self::from_config(load_config(global)?)
    }

    pub fn from_config(config: ScorecardConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data.dir)?;
        let catalog = EvaluationCatalog::load_or_init(
            &config.data.schema_path(),
            &config.data.templates_path(),
        )?;
        let store = ScoreStore::load(config.data.store_paths())?;
        debug!(
            data_dir = %config.data.dir.display(),
            subjects = catalog.schema.subjects().len(),
            "session opened"
        );

        Ok(Self {
            config,
            catalog,
            store,
        })
    }

    /// Find a student by id, then by name.
    pub fn resolve_student(&self, key: &str) -> Result<Student> {
        self.store
            .student(key)
            .or_else(|| self.store.find_by_name(key))
            .cloned()
            .ok_or_else(|| StoreError::StudentNotFound(key.to_string()).into())
    }

    /// The named subject if it exists, else the first subject in the schema.
    pub fn resolve_subject(&self, subject: Option<&str>) -> Result<String> {
        match subject {
            Some(name) => Ok(self.catalog.subject(name)?.name.clone()),
            None => self
                .catalog
                .default_subject()
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("the evaluation schema defines no subjects")),
        }
    }
}

/// The effective config: file (or defaults) plus `--data-dir`.
pub fn load_config(global: &GlobalArgs) -> Result<ScorecardConfig> {
    let mut config = load_config_from(global.config.as_deref())?;
    if let Some(dir) = &global.data_dir {
        config.data.dir = dir.clone();
    }
    Ok(config)
}
