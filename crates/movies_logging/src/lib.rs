//! Tracing setup shared by the `movies-mcp-server` binary.
//!
//! The server's stdout is the JSON-RPC wire; every log line must go to
//! stderr or it would corrupt the transport.

const DEFAULT_LOG_FILTER: &str = "movies_mcp=info,movies_db=info,movies=info";

/// Initialize the global tracing subscriber.
///
/// `verbose` widens the default filter to `debug` for the server's own
/// crates; `RUST_LOG` always takes precedence when set.
pub fn init_logging(verbose: bool) {
    let filter = std::env::var("RUST_LOG").ok().unwrap_or_else(|| {
        if verbose {
            "movies_mcp=debug,movies_db=debug,movies=debug".to_string()
        } else {
            DEFAULT_LOG_FILTER.to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
