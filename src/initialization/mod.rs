//! Process-level initialization: logger, HTTP client, DNS resolver, and the
//! TLS crypto provider.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hickory_resolver::TokioAsyncResolver;
use log::LevelFilter;

use crate::config::{Config, LogFormat};
use crate::error_handling::InitializationError;

/// Initializes the logger with the specified level and format.
///
/// Reads `RUST_LOG` first, then applies `level` on top, so `RUST_LOG=debug`
/// works for quick debugging while explicit arguments still win.
pub fn init_logger(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    // hickory warns about malformed UDP responses it already handles; keep
    // those out of normal output.
    builder.filter_module("hickory_proto", LevelFilter::Error);
    builder.filter_module("domain_origin", level);

    if let LogFormat::Json = format {
        builder.format(|buf, record| {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0);
            writeln!(
                buf,
                "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                ts,
                record.level(),
                record.target(),
                serde_json::to_string(&record.args().to_string())
                    .unwrap_or_else(|_| "\"\"".into())
            )
        });
    }

    // try_init() so tests can initialize more than once without panicking.
    builder.try_init().map_err(InitializationError::from)?;
    Ok(())
}

/// Initializes the shared HTTP client used for header and page probes:
/// redirects followed, per-request timeout, configured User-Agent.
pub fn init_client(config: &Config) -> Result<reqwest::Client, InitializationError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Initializes the DNS resolver with aggressive timeouts so a slow or
/// unresponsive nameserver cannot stall a lookup.
pub fn init_resolver() -> Arc<TokioAsyncResolver> {
    use hickory_resolver::config::{ResolverConfig, ResolverOpts};

    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(crate::config::DNS_TIMEOUT_SECS);
    opts.attempts = 2;
    // Prevent search-domain appending for bare hostnames.
    opts.ndots = 0;

    Arc::new(TokioAsyncResolver::tokio(ResolverConfig::default(), opts))
}

/// Installs the process-wide rustls crypto provider. Safe to call more than
/// once; later calls are no-ops.
pub fn init_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
