mod render;

pub use render::format_number;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::config::DashConfig;
use crate::services::Dashboard;
use crate::store::JsonDirStore;

/// Internal usage and account analytics
#[derive(Parser, Debug)]
#[command(name = "usagedash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Document store directory (overrides the config file)
    #[arg(long, global = true, env = "USAGEDASH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (default: ~/.usagedash/config.json)
    #[arg(long, global = true, env = "USAGEDASH_CONFIG")]
    config: Option<PathBuf>,

    /// Ignore cached results and read the store directly
    #[arg(long, global = true)]
    fresh: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List users
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one user's worksheets, plan and usage
    User {
        /// User ID
        user_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show population totals and the usage rollup
    Overall {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank users by total searches
    Leaderboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a user's plan (Trial, Inactive or Premium)
    SetPlan {
        /// User ID
        user_id: String,
        /// New plan
        plan: String,
    },

    /// Show assistant feedback
    Feedback {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Cli {
    fn dashboard(&self) -> anyhow::Result<Dashboard> {
        let mut config = DashConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }

        let data_dir = config.resolve_data_dir()?;
        let store = JsonDirStore::open(&data_dir)?;
        info!(
            data_dir = %data_dir.display(),
            excluded = config.excluded_users.len(),
            "opened store"
        );
        Ok(Dashboard::new(Box::new(store), &config).with_fresh_reads(self.fresh))
    }

    pub fn run(self) -> anyhow::Result<()> {
        let dash = self.dashboard()?;

        match self.command {
            Commands::Users { json } => {
                let users = dash.users().context("Failed to load users")?;
                if json {
                    print_json(&users)?;
                } else {
                    print!("{}", render::users(&users));
                }
            }
            Commands::User { user_id, json } => {
                let view = dash
                    .user_overview(&user_id)
                    .with_context(|| format!("Failed to load user {}", user_id))?;
                if json {
                    print_json(&view)?;
                } else {
                    print!("{}", render::user(&view));
                }
            }
            Commands::Overall { json } => {
                let view = dash
                    .population_overview()
                    .context("Failed to aggregate usage")?;
                if json {
                    print_json(&view)?;
                } else {
                    print!("{}", render::population(&view));
                }
            }
            Commands::Leaderboard { json } => {
                let rows = dash
                    .search_leaderboard()
                    .context("Failed to aggregate usage")?;
                if json {
                    print_json(&rows)?;
                } else {
                    print!("{}", render::leaderboard(&rows));
                }
            }
            Commands::SetPlan { user_id, plan } => {
                let update = dash
                    .update_plan(&user_id, &plan)
                    .context("Failed to update user plan")?;
                print!("{}", render::plan_update(&update));
            }
            Commands::Feedback { json } => {
                let (records, summary) = dash.feedback().context("Failed to load feedback")?;
                if json {
                    print_json(&serde_json::json!({
                        "summary": summary,
                        "records": records,
                    }))?;
                } else {
                    print!("{}", render::feedback(&records, &summary));
                }
            }
        }
        Ok(())
    }
}
