use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use deskline_api::{build_backend, supported_backend_keys, HttpBackendConfig};
use deskline_config::{BackendProviderKind, BackendRuntimeConfig, DesklineConfig};
use deskline_domain::CoreError;
use deskline_live::{LiveChannel, LiveChannelConfig};
use deskline_session::SessionStore;
use deskline_ui::{forward_pushes, App, Ui, ViewOptions};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli_flags()?;
    let config = match cli.config_path.as_deref() {
        Some(path) => deskline_config::load_from_path(path)?,
        None => deskline_config::load_from_env()?,
    };
    let store_path = config.session_store_path();
    init_file_logging(&store_path)?;

    let backend_runtime = resolve_backend_runtime(cli.backend.as_deref(), &config)?;
    let http_config = match backend_runtime.provider {
        BackendProviderKind::Http => HttpBackendConfig::from_settings(
            backend_runtime.api_url.clone(),
            backend_runtime.request_timeout,
        )?,
        BackendProviderKind::Demo => HttpBackendConfig::default(),
    };
    let backend = build_backend(backend_runtime.provider.as_key(), http_config)?.into_shared();
    backend.health_check().await?;

    let live_runtime = config.live_runtime();
    let channel_config =
        LiveChannelConfig::from_settings(live_runtime.ws_url, live_runtime.reconnect_delay)?;
    let channel = LiveChannel::connect(channel_config);

    let store = SessionStore::open(&store_path)?;
    let persisted_session = store.load()?;

    let view = config.ui_view();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let _push_forwarder = forward_pushes(channel.subscribe(), events_tx.clone());

    let mut app = App::new(
        backend,
        Arc::new(channel.sender()),
        channel.state_watch(),
        store,
        ViewOptions {
            notice_ttl: view.notice_ttl,
            description_preview_lines: view.description_preview_lines,
        },
        events_tx,
    );
    if let Some(session) = persisted_session {
        app.resume(session);
    }

    let mut ui = Ui::init()?;
    let run_result = ui.run(&mut app, &mut events_rx);
    drop(ui);

    match run_result {
        Ok(()) => {
            channel.shutdown().await?;
        }
        Err(ui_error) => {
            if let Err(stop_error) = channel.shutdown().await {
                tracing::warn!(error = %stop_error, "failed to stop the live channel during UI shutdown");
                return Err(anyhow::anyhow!(
                    "UI shutdown failed: {ui_error}; additionally, live channel shutdown failed: {stop_error}"
                ));
            }
            return Err(ui_error.into());
        }
    }

    Ok(())
}

fn init_file_logging(session_store_path: &Path) -> Result<(), CoreError> {
    let log_path = log_file_path(session_store_path);
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|error| {
                CoreError::Configuration(format!(
                    "failed to create deskline log directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|error| {
            CoreError::Configuration(format!(
                "failed to open deskline log file '{}': {error}",
                log_path.display()
            ))
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    Ok(())
}

/// The terminal owns stdout while the UI runs, so logs go to a file
/// next to the session store.
fn log_file_path(session_store_path: &Path) -> PathBuf {
    session_store_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join("deskline.log")
}

#[derive(Debug, Default)]
struct CliFlags {
    backend: Option<String>,
    config_path: Option<String>,
}

fn parse_cli_flags() -> Result<CliFlags, CoreError> {
    let mut flags = CliFlags::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--backend" => {
                flags.backend = Some(read_cli_value(
                    &arg,
                    args.next().ok_or_else(|| {
                        CoreError::Configuration(
                            "Missing value after --backend. Use --backend <http|demo>.".to_owned(),
                        )
                    })?,
                )?);
            }
            "--config" => {
                let value = args.next().ok_or_else(|| {
                    CoreError::Configuration(
                        "Missing value after --config. Use --config <path>.".to_owned(),
                    )
                })?;
                if value.trim().is_empty() {
                    return Err(CoreError::Configuration(
                        "Flag '--config' requires a non-empty value.".to_owned(),
                    ));
                }
                flags.config_path = Some(value);
            }
            "--help" | "-h" => {
                print_cli_help();
                std::process::exit(0);
            }
            value if value.starts_with("--") => {
                return Err(CoreError::Configuration(format!(
                    "Unknown flag '{value}'. Run with --help for valid flags."
                )));
            }
            unknown => {
                return Err(CoreError::Configuration(format!(
                    "Unexpected argument '{unknown}'. Run with --help for valid flags."
                )));
            }
        }
    }

    Ok(flags)
}

fn print_cli_help() {
    println!("Usage: deskline-app [--backend <http|demo>] [--config <path>]");
    println!();
    println!("  --backend <provider>   Override the configured backend provider (http or demo)");
    println!("  --config <path>        Read configuration from <path> instead of the default");
    println!("  --help                 Show this help message");
}

fn read_cli_value(flag: &str, value: String) -> Result<String, CoreError> {
    let value = value.trim().to_ascii_lowercase();
    if value.is_empty() {
        return Err(CoreError::Configuration(format!(
            "Flag '{flag}' requires a non-empty value."
        )));
    }
    Ok(value)
}

fn resolve_backend_runtime(
    cli_backend: Option<&str>,
    config: &DesklineConfig,
) -> Result<BackendRuntimeConfig> {
    let mut runtime = config.backend_runtime()?;
    if let Some(key) = cli_backend {
        runtime.provider = BackendProviderKind::from_key(key).ok_or_else(|| {
            CoreError::Configuration(format!(
                "Unknown backend provider '{key}'. Expected one of: {}.",
                supported_backend_keys().join(", ")
            ))
        })?;
    }
    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use deskline_config::{BackendProviderKind, DesklineConfig};

    use super::{log_file_path, read_cli_value, resolve_backend_runtime};

    #[test]
    fn log_file_sits_next_to_the_session_store() {
        let path = log_file_path(Path::new("/var/lib/deskline/session.sqlite3"));
        assert_eq!(path, Path::new("/var/lib/deskline/deskline.log"));

        let bare = log_file_path(Path::new("session.sqlite3"));
        assert_eq!(bare, Path::new("./deskline.log"));
    }

    #[test]
    fn cli_values_are_trimmed_and_lowercased() {
        assert_eq!(
            read_cli_value("--backend", "  DEMO ".to_owned()).unwrap(),
            "demo"
        );
        assert!(read_cli_value("--backend", "   ".to_owned()).is_err());
    }

    #[test]
    fn cli_backend_overrides_the_configured_provider() {
        let config = DesklineConfig::default();
        let runtime = resolve_backend_runtime(Some("demo"), &config).unwrap();
        assert_eq!(runtime.provider, BackendProviderKind::Demo);
    }

    #[test]
    fn unknown_cli_backend_is_rejected() {
        let config = DesklineConfig::default();
        let error = resolve_backend_runtime(Some("sqlite"), &config).unwrap_err();
        assert!(error.to_string().contains("Unknown backend provider"));
    }

    #[test]
    fn absent_cli_backend_keeps_the_configured_provider() {
        let config = DesklineConfig::default();
        let runtime = resolve_backend_runtime(None, &config).unwrap();
        assert_eq!(runtime.provider, BackendProviderKind::Http);
    }
}
