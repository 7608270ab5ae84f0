//! FindAFriend - discussion group matching CLI
//!
//! Collects questionnaire answers, groups respondents on a schedule and
//! relays chat messages within each group.

use clap::Parser;
use directories::ProjectDirs;
use findafriend::{
    chat::ChatHub,
    config::AppConfig,
    db::{Database, Questionnaire},
    grouping::{GroupingRunner, RunOutcome, RunOverrides},
    log_error, log_info, logging,
    scheduler::GroupingScheduler,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Submit (or update) one questionnaire
    Submit {
        #[arg(long)]
        email: String,
        /// Comma-separated hobbies
        #[arg(long, default_value = "")]
        hobbies: String,
        /// Comma-separated topics
        #[arg(long, default_value = "")]
        topics: String,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        year: Option<String>,
        #[arg(long)]
        purpose: Option<String>,
    },
    /// Import a JSON array of questionnaires
    Import {
        /// File to import
        path: PathBuf,
    },
    /// Run the grouping pipeline once
    Run {
        #[arg(long)]
        min_size: Option<usize>,
        #[arg(long)]
        max_size: Option<usize>,
        /// Minimum respondents before grouping happens
        #[arg(long)]
        min_batch: Option<usize>,
    },
    /// Run the grouping pipeline on the configured interval until Ctrl-C
    Schedule,
    /// List the current groups
    Groups,
    /// Show a group's chat history
    Messages {
        group_name: String,
    },
    /// Post a chat message to a group
    Send {
        group_name: String,
        email: String,
        message: String,
    },
}

#[derive(Parser, Debug)]
#[command(name = "findafriend")]
#[command(version = "0.1.0")]
#[command(about = "Match people into discussion groups from questionnaire answers", long_about = None)]
struct Args {
    /// Configuration file path (overrides defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database path (default: ~/.local/share/findafriend/findafriend.db)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Run log path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    init_logging(args.verbose || config.debug);

    let db_path = args
        .db_path
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(|| {
            ProjectDirs::from("com", "findafriend", "findafriend")
                .map(|dirs| dirs.data_dir().join("findafriend.db"))
                .unwrap_or_else(|| PathBuf::from("findafriend.db"))
        });

    tracing::info!("Initializing database at {:?}", db_path);
    let db = Arc::new(Database::new(&db_path).await?);

    match args.command {
        Command::Submit {
            email,
            hobbies,
            topics,
            gender,
            year,
            purpose,
        } => {
            let entry = Questionnaire {
                gender,
                year,
                purpose,
                ..Questionnaire::new(email, hobbies, topics)
            };
            db.save_questionnaire(&entry).await?;
            println!("Questionnaire saved for {}", entry.email);
        }
        Command::Import { path } => {
            let content = tokio::fs::read_to_string(&path).await?;
            let entries: Vec<Questionnaire> = serde_json::from_str(&content)?;
            for entry in &entries {
                db.save_questionnaire(entry).await?;
            }
            println!("Imported {} questionnaires", entries.len());
        }
        Command::Run {
            min_size,
            max_size,
            min_batch,
        } => {
            let path = logging::init_logger(args.log_file.as_deref())?;
            tracing::debug!("Run log at {}", path.display());

            let runner = GroupingRunner::new(db.clone(), config.grouping.clone(), config.roster_mode);
            let scheduler = GroupingScheduler::new(runner, &config.schedule);
            let overrides = RunOverrides {
                min_size,
                max_size,
                min_batch,
            };

            match scheduler.run_now(overrides).await? {
                RunOutcome::Grouped(run) => {
                    for group in &run.groups {
                        println!("{}: {}", group.group_name, group.email_list());
                    }
                }
                RunOutcome::Skipped {
                    respondents,
                    required,
                } => {
                    println!(
                        "Clustering skipped: {} respondents, {} required",
                        respondents, required
                    );
                }
            }
        }
        Command::Schedule => {
            logging::init_logger(args.log_file.as_deref())?;

            let runner = GroupingRunner::new(db.clone(), config.grouping.clone(), config.roster_mode);
            let scheduler = Arc::new(GroupingScheduler::new(runner, &config.schedule));
            let cancel = CancellationToken::new();

            log_info!(
                "Grouping every {}s (groups of {}..{})",
                scheduler.period().as_secs(),
                config.grouping.min_size,
                config.grouping.max_size
            );

            let task = {
                let scheduler = scheduler.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move { scheduler.run_forever(cancel).await })
            };

            if let Err(e) = tokio::signal::ctrl_c().await {
                log_error!("Failed to listen for shutdown signal: {}", e);
            }
            cancel.cancel();
            task.await?;
        }
        Command::Groups => {
            let groups = db.get_groups().await?;
            if groups.is_empty() {
                println!("No groups yet");
            }
            for group in groups {
                println!("{} ({}): {}", group.group_name, group.id, group.email);
            }
        }
        Command::Messages { group_name } => {
            for message in db.get_messages(&group_name).await? {
                println!("[{}] {}: {}", message.timestamp, message.email, message.message);
            }
        }
        Command::Send {
            group_name,
            email,
            message,
        } => {
            let hub = ChatHub::new();
            let sent = hub.post(&db, &group_name, &email, &message).await?;
            println!("Sent {}", sent.id);
        }
    }

    Ok(())
}

/// Initialize logging
fn init_logging(verbose: bool) {
    let filter = if verbose {
        "findafriend=debug,info"
    } else {
        "findafriend=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
