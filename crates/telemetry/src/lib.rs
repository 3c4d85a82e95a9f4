//! Tracing subscriber bootstrap.

use library_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolve the filter: `RUST_LOG` wins, then the configured directive.
pub fn env_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(settings));

    match settings.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init()?,
    }

    tracing::info!(
        target: "library-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        let settings = TelemetrySettings::default();
        // Another test binary may not have installed one yet; the second call
        // in this process must fail either way.
        let _ = init(&settings);
        assert!(init(&settings).is_err());
    }

    #[test]
    fn configured_filter_is_used_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let settings = TelemetrySettings {
            filter: "warn".to_string(),
            ..TelemetrySettings::default()
        };
        assert_eq!(env_filter(&settings).to_string(), "warn");
    }
}
