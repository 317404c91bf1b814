pub mod models {
    pub mod farm;
}

pub mod charts;
pub mod config;
pub mod db {
    pub mod models;
}
pub mod kpi;
pub mod schema;
pub mod server;
pub mod stats;
pub mod store;
pub mod utils;
pub mod services {
    pub mod dashboard;
    pub mod fake_data;
    pub mod ingest;
}

use crate::config::Config;
use crate::server::AppState;
use crate::services::fake_data;
use crate::store::PgFarmStore;
use diesel::PgConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
    applied: usize,
}

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn apply_database_migrations(conn: &mut PgConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) if applied.is_empty() => {
            info!("Database schema is up to date; no migrations were applied");
            Ok(())
        }
        Ok(applied) => {
            let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
            info!("Applied {} database migration(s): {}", applied.len(), names);
            Ok(())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (bind={}, chart_window={}h, migrations_enabled={}, fake_data_enabled={}, fake_data_days={})",
        cfg.bind_addr, cfg.chart_window_hours, cfg.migrations_enabled, cfg.fake_data_enabled, cfg.fake_data_days
    );

    // 2) Schema and optional demo history; the setup connection is dropped before serving
    if cfg.migrations_enabled || cfg.fake_data_enabled {
        let mut conn =
            PgConnection::establish(&cfg.database_url).map_err(|e| format!("DB connection failed: {}", e))?;
        info!("Connected to database");

        if cfg.migrations_enabled {
            apply_database_migrations(&mut conn)?;
        } else {
            info!("Migrations disabled via MIGRATIONS_ENABLED={}", cfg.migrations_enabled);
        }

        if cfg.fake_data_enabled {
            fake_data::run(&mut conn, cfg.fake_data_days)?;
        }
    }

    // 3) Serve the dashboard API; every request opens its own connections
    let state = AppState {
        store: Arc::new(PgFarmStore::new(cfg.database_url.clone())),
        chart_window_hours: cfg.chart_window_hours,
    };
    let runtime = tokio::runtime::Runtime::new().map_err(|e| format!("tokio runtime init failed: {}", e))?;
    runtime.block_on(server::serve(cfg.bind_addr, state))?;

    info!("Dashboard API stopped");
    Ok(())
}

fn configure_env_from_cli() -> Result<Option<LoadedEnvFile>, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut env_file: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        let value = match arg.to_str() {
            Some("--env-file") => args
                .next()
                .ok_or_else(|| "`--env-file` requires a path argument".to_string())?,
            Some(s) if s.starts_with("--env-file=") => s["--env-file=".len()..].into(),
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        };
        if value.is_empty() {
            return Err("`--env-file` requires a path argument".to_string());
        }
        if env_file.replace(PathBuf::from(value)).is_some() {
            return Err("`--env-file` provided more than once".to_string());
        }
    }

    let (path, explicit) = match env_file {
        Some(path) if path.is_file() => (path, true),
        Some(path) => return Err(format!("env file not found: {}", path.display())),
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
            let default_path = cwd.join(".env");
            if !default_path.is_file() {
                return Ok(None);
            }
            (default_path, false)
        }
    };

    let applied = config::load_env_file(&path)?;
    Ok(Some(LoadedEnvFile { path, explicit, applied }))
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!(
            "Environment loaded from {} .env file: {} ({} variable(s) applied)",
            origin,
            info.path.display(),
            info.applied
        );
    }

    info!(
        "farm-dashboard {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
