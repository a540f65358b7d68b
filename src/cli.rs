use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server and delivery workers (default)
    Serve,
    /// Manage database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Apply pending migrations
    Up {
        /// How many migrations to apply (default: all)
        #[arg(short, long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        /// How many migrations to roll back (default: 1)
        #[arg(short, long, default_value = "1")]
        steps: u32,
    },
    /// Show applied and pending migrations
    Status,
    /// Roll back everything, then apply all migrations again
    Reset,
    /// Roll back and reapply the most recent migrations
    Reapply {
        /// How many migrations to reapply (default: 1)
        #[arg(short, long, default_value = "1")]
        steps: u32,
    },
}
