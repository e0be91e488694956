//! The `scorecard init` command.

use std::path::PathBuf;

use anyhow::Result;

use super::Session;
use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let config_path = global
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("scorecard.toml"));
    if config_path.exists() {
        println!("{} already exists, skipping.", config_path.display());
    } else {
        std::fs::write(&config_path, SAMPLE_CONFIG)?;
        println!("Created {}", config_path.display());
    }

    let config = super::load_config(&GlobalArgs {
        config: Some(config_path),
        data_dir: global.data_dir.clone(),
    })?;
    let data_files = [
        config.data.schema_path(),
        config.data.templates_path(),
        config.data.store_paths().roster,
    ];
    let existed = data_files.each_ref().map(|p| p.exists());

    let session = Session::from_config(config)?;

    for (path, existed) in data_files.iter().zip(existed) {
        if existed {
            println!("{} already exists, skipping.", path.display());
        } else {
            println!("Created {}", path.display());
        }
    }

    println!(
        "\n{} students; subjects: {}",
        session.store.students().count(),
        session
            .catalog
            .schema
            .subject_names()
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("\nNext steps:");
    println!("  1. Edit scorecard.toml with your API keys");
    println!("  2. Run: scorecard score --student 001 --set 学习习惯/课堂专注度=4");
    println!("  3. Run: scorecard report --student 001");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# scorecard configuration

default_provider = "deepseek"
timeout_secs = 30
system_prompt = "你是一个专业的助手"

[providers.deepseek]
type = "deepseek"
api_key = "${DEEPSEEK_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.zhipu]
type = "zhipu"
api_key = "${ZHIPUAI_API_KEY}"

[data]
dir = "."
"#;
