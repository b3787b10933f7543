//! `crm` entry-point: configuration, storage wiring and the session loop.

use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};

use crm::CrmSettings;
use crm::domain::ports::{CrmStore, PasswordHasher};
use crm::domain::{AdminSeed, CrmServices, InitializationReport, Initializer, RoleResolver, SessionGate};
use crm::inbound::cli::{SessionLoop, StdTerminal, Terminal};
use crm::outbound::password::Argon2PasswordHasher;
use crm::outbound::persistence::{DbPool, DieselCrmStore, PoolConfig, run_pending_migrations};
use crm::outbound::session::FileSessionTokenStore;
use crm::telemetry::init_tracing;

/// `crm` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "crm", about = "CRM staff console", version)]
struct CliArgs {
    /// Create the departments and the bootstrap administrator, then exit.
    #[arg(long, hide = true)]
    init: bool,
    /// Record a named command request in the log, then exit.
    #[arg(long, short = 'c', value_name = "name")]
    command: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let settings = CrmSettings::load_from_iter([OsString::from("crm")])
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    if let Err(err) = init_tracing(settings.log_format()?) {
        warn!(error = %err, "tracing init failed");
    }

    if let Some(name) = &args.command {
        info!(command = %name, "command requested");
        return Ok(());
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(async_main(args, settings))
}

async fn async_main(args: CliArgs, settings: CrmSettings) -> Result<()> {
    let pool_config = PoolConfig::from_settings(&settings).wrap_err("configure the database")?;
    let migration_url = pool_config.database_url().to_owned();
    tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .wrap_err("migration task failed")?
        .wrap_err("apply database migrations")?;

    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("create database pool")?;
    let store: Arc<dyn CrmStore> = Arc::new(DieselCrmStore::new(pool));
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    if args.init {
        let seed = AdminSeed::with_password(settings.admin_password());
        let report = Initializer::new(store, hasher)
            .run(&seed)
            .await
            .wrap_err("initialize the database")?;
        return print_report(&mut StdTerminal, &report).wrap_err("write report");
    }

    let key = FileSessionTokenStore::load_or_create_key(&settings.session_key_file())
        .wrap_err("load the session signing key")?;
    let tokens = Arc::new(FileSessionTokenStore::new(settings.session_file(), key));
    let gate = SessionGate::new(
        Arc::clone(&store),
        Arc::clone(&hasher),
        tokens,
        Arc::clone(&clock),
    );
    let roles = RoleResolver::new(Arc::clone(&store));
    let services = CrmServices::new(store, hasher, clock);

    SessionLoop::new(StdTerminal, gate, roles, services)
        .run()
        .await
        .wrap_err("terminal failure")
}

fn print_report(terminal: &mut dyn Terminal, report: &InitializationReport) -> std::io::Result<()> {
    let status = |created: bool| if created { "created" } else { "already present" };
    for (department, created) in &report.departments {
        terminal.write_line(&format!("Department {}: {}", department.name, status(*created)))?;
    }
    let (admin, created) = &report.admin;
    terminal.write_line(&format!(
        "Administrator {}: {}",
        admin.username,
        status(*created)
    ))
}
