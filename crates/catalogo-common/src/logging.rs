//! ---
//! cat_section: "01-core-functionality"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Shared primitives and utilities for the Catalogo services."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
use std::fs;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "CATALOGO_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Writer guards of the installed subscriber. Buffered lines are lost once
/// these drop.
static GUARDS: OnceCell<[WorkerGuard; 2]> = OnceCell::new();

/// Available log formats for the daemon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    StructuredJson,
    Pretty,
}

/// Install the process-wide subscriber.
///
/// `CATALOGO_LOG` sets the filter, falling back to `RUST_LOG` and then `info`.
/// Stdout follows `config.format`; a daily rolling JSON file under
/// `config.directory` is always written. Once a subscriber is installed,
/// later calls leave it in place.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    fs::create_dir_all(&config.directory).with_context(|| {
        format!(
            "unable to create log directory {}",
            config.directory.display()
        )
    })?;
    let prefix = config.file_prefix.as_deref().unwrap_or(service_name);
    let (file_writer, file_guard) =
        tracing_appender::non_blocking(daily(&config.directory, format!("{prefix}.log")));
    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let layers = vec![
        stdout_layer(config.format, stdout_writer),
        file_layer(file_writer),
    ];
    let installed = tracing_subscriber::registry()
        .with(layers)
        .with(resolve_filter(std::env::var(LOG_ENV).ok()))
        .try_init()
        .is_ok();
    if !installed {
        return Ok(());
    }

    let _ = GUARDS.set([file_guard, stdout_guard]);
    info!(
        service = service_name,
        log_dir = %config.directory.display(),
        format = ?config.format,
        "tracing initialised"
    );
    Ok(())
}

fn stdout_layer(format: LogFormat, writer: NonBlocking) -> BoxedLayer {
    let layer = fmt::layer()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(writer);
    match format {
        LogFormat::StructuredJson => layer.with_target(false).json().boxed(),
        LogFormat::Pretty => layer.with_target(true).boxed(),
    }
}

fn file_layer(writer: NonBlocking) -> BoxedLayer {
    fmt::layer()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(writer)
        .json()
        .boxed()
}

fn resolve_filter(directive: Option<String>) -> EnvFilter {
    match directive {
        Some(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!("invalid {LOG_ENV} directive ({err}); defaulting to {DEFAULT_DIRECTIVE}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}
