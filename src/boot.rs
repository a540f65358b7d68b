use std::{env, str::FromStr as _};

use axum::Router;
use clap::Parser as _;
use config_rs::Config as ConfigRs;
use tracing::{debug, trace};

use crate::{
    app::App,
    app_info::AppInfo,
    cli::{Cli, Commands},
    commands::{migrate, serve, version},
    config::Config,
    environment::Environment,
    jobs::{job_registry::JobRegistry, scheduled_job::ScheduledJob},
    setup_tracing::setup_tracing_for_command,
};

const ENVIRONMENT_VARIABLE: &str = "APP_ENVIRONMENT";

/// Everything `boot` needs to assemble the service: binary metadata, the
/// API routes, the registered job types, and the recurring schedule.
pub struct BootConfig {
    pub app_info: AppInfo,
    pub app_router: fn(App) -> Router,
    pub job_registry: JobRegistry,
    pub job_schedule: Vec<ScheduledJob>,
}

impl BootConfig {
    #[must_use]
    pub const fn new(
        app_info: AppInfo,
        app_router: fn(App) -> Router,
        job_registry: JobRegistry,
        job_schedule: Vec<ScheduledJob>,
    ) -> Self {
        Self {
            app_info,
            app_router,
            job_registry,
            job_schedule,
        }
    }
}

/// Entrypoint: parse the CLI, load configuration for the selected
/// environment, and dispatch to the requested command.
pub async fn boot(boot_config: BootConfig) {
    let cli = Cli::parse();

    // Version runs before any config or tracing setup so it works even
    // without a config directory
    if matches!(cli.command, Some(Commands::Version)) {
        version::print_version_info(boot_config.app_info);
        return;
    }

    let environment = environment_from_env();
    let config = read_config(&environment);

    setup_tracing_for_command(&cli.command, &config.tracing.log_level);

    debug!("Booting in {environment} environment");
    trace!("Configuration loaded: {config:?}");

    match cli.command {
        Some(Commands::Migrate { action }) => {
            migrate::handle_migrate_command(&config, action).await;
        }
        Some(Commands::Version) => {
            version::print_version_info(boot_config.app_info);
        }
        Some(Commands::Serve) | None => {
            serve::handle_serve_command(
                environment,
                config,
                boot_config.app_router,
                boot_config.job_registry,
                boot_config.job_schedule,
            )
            .await;
        }
    }
}

/// `APP_ENVIRONMENT` picks the config file; unset or unrecognized values
/// fall back to development.
#[must_use]
pub fn environment_from_env() -> Environment {
    env::var(ENVIRONMENT_VARIABLE)
        .ok()
        .and_then(|s| Environment::from_str(&s).ok())
        .unwrap_or_default()
}

/// Layered configuration: `config/{environment}.toml` first, then `APP_*`
/// environment variables on top.
pub fn read_config(environment: &Environment) -> Config {
    let config_file_name = format!("config/{environment}");

    trace!("Reading configuration from: {}", config_file_name);

    ConfigRs::builder()
        .add_source(config_rs::File::with_name(&config_file_name))
        .add_source(config_rs::Environment::with_prefix("APP"))
        .build()
        .expect("Failed to read configuration")
        .try_deserialize()
        .expect("Failed to deserialize configuration")
}
