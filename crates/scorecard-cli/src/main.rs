//! scorecard CLI — record rubric scores and generate progress reports.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "scorecard",
    version,
    about = "Rubric scores in, LLM progress reports out"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the roster, history, schema and templates
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config, schema, templates and roster
    Init,

    /// Manage the student roster
    Students {
        #[command(subcommand)]
        action: StudentsAction,
    },

    /// Print the evaluation schema
    Schema {
        /// Only this subject
        #[arg(long)]
        subject: Option<String>,
    },

    /// Record a score snapshot for a student
    Score {
        /// Student id or name
        #[arg(long)]
        student: String,

        /// Subject (defaults to the first subject in the schema)
        #[arg(long)]
        subject: Option<String>,

        /// Leaf score, e.g. "专业模块/古文/字词理解=4" (repeatable)
        #[arg(long = "set", value_name = "PATH=SCORE")]
        sets: Vec<String>,

        /// JSON snapshot to start from instead of all-default scores
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show a student's latest scores with trends
    Show {
        /// Student id or name
        #[arg(long)]
        student: String,

        /// Subject (defaults to the first subject in the schema)
        #[arg(long)]
        subject: Option<String>,
    },

    /// Print the report prompt without calling a provider
    Prompt {
        /// Student id or name
        #[arg(long)]
        student: String,

        /// Subject (defaults to the first subject in the schema)
        #[arg(long)]
        subject: Option<String>,
    },

    /// Generate a progress report for a student
    Report {
        /// Student id or name
        #[arg(long)]
        student: String,

        /// Subject (defaults to the first subject in the schema)
        #[arg(long)]
        subject: Option<String>,

        /// Provider name or kind: deepseek, openai, zhipu
        #[arg(long)]
        provider: Option<String>,

        /// API key (overrides config and environment)
        #[arg(long)]
        api_key: Option<String>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Also write the report as Markdown to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum StudentsAction {
    /// List all students
    List,

    /// Add a student (no-op if the id already exists)
    Add {
        /// Student id
        #[arg(long)]
        id: String,

        /// Student name
        #[arg(long)]
        name: String,
    },

    /// Change a student's name
    Rename {
        /// Student id or current name
        #[arg(long)]
        student: String,

        /// New name
        #[arg(long)]
        name: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scorecard=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let global = cli.global;

    let result = match cli.command {
        Commands::Init => commands::init::execute(&global),
        Commands::Students { action } => match action {
            StudentsAction::List => commands::students::list(&global),
            StudentsAction::Add { id, name } => commands::students::add(&global, &id, &name),
            StudentsAction::Rename { student, name } => {
                commands::students::rename(&global, &student, &name)
            }
        },
        Commands::Schema { subject } => commands::schema::execute(&global, subject.as_deref()),
        Commands::Score {
            student,
            subject,
            sets,
            file,
        } => commands::score::execute(&global, &student, subject.as_deref(), &sets, file),
        Commands::Show { student, subject } => {
            commands::show::execute(&global, &student, subject.as_deref())
        }
        Commands::Prompt { student, subject } => {
            commands::prompt::execute(&global, &student, subject.as_deref())
        }
        Commands::Report {
            student,
            subject,
            provider,
            api_key,
            model,
            output,
        } => {
            commands::report::execute(
                &global,
                &student,
                subject.as_deref(),
                commands::report::Overrides {
                    provider,
                    api_key,
                    model,
                },
                output,
            )
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
