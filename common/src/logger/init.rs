use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Workspace crates that get `debug` output when verbose logging is requested.
const WORKSPACE_TARGETS: &[&str] = &["asset_alerts", "engine", "market", "notify", "state"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Installs the global subscriber. Safe to call more than once; only the
/// first call has any effect.
///
/// `RUST_LOG` always wins. Without it the filter is `info`, or `info` plus
/// `debug` for the workspace crates when `verbose` is set.
pub fn init_logger(service_name: &'static str, verbose: bool, format: LogFormat) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        match format {
            LogFormat::Pretty => builder.compact().init(),
            LogFormat::Json => builder.json().init(),
        }

        tracing::debug!(service = service_name, "logger initialized");
    });
}

fn default_directives(verbose: bool) -> String {
    if !verbose {
        return "info".to_string();
    }

    let mut directives = String::from("info");
    for target in WORKSPACE_TARGETS {
        directives.push(',');
        directives.push_str(target);
        directives.push_str("=debug");
    }
    directives
}
