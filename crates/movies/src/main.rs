//! `movies-mcp-server`: process entry point.
//!
//! Owns what the `movies_mcp` crate deliberately doesn't: CLI parsing,
//! environment-driven configuration, schema migrations, and logging
//! initialization. Grounded on `casparian`'s `clap::Parser` binary and its
//! `cli::mcp::run_serve` (open a pool, run migrations, hand off to the
//! protocol server) — generalized from casparian's synchronous
//! single-runtime launcher to a `#[tokio::main]` entry point, since
//! `movies_mcp::McpServer::run` is async.

mod config;

use clap::Parser;
use movies_db::{ActorRepository, LinkRepository, MovieRepository};
use movies_mcp::{AppState, McpServer, ServerInfoConfig};
use std::process::ExitCode;
use tracing::{error, info};

/// A line-delimited JSON-RPC 2.0 MCP server exposing a movie/actor catalog.
#[derive(Parser, Debug)]
#[command(name = "movies-mcp-server", version, about)]
struct Cli {
    /// Run schema migrations and exit without starting the server.
    #[arg(long)]
    migrate_only: bool,

    /// Skip schema migrations on startup (the caller is responsible for an
    /// already-migrated database).
    #[arg(long)]
    skip_migrations: bool,

    /// Widen logging to debug for this server's own crates.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    movies_logging::init_logging(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    config::log_connection_env();
    let db_config = config::db_config();
    info!("opening catalog database at {}", db_config.url);

    let pool = movies_db::create_pool(&db_config).await?;

    if cli.skip_migrations {
        info!("skipping schema migrations (--skip-migrations)");
    } else {
        movies_db::ensure_schema(&pool).await?;
    }

    if cli.migrate_only {
        info!("migrations complete (--migrate-only), exiting");
        return Ok(());
    }

    let state = AppState {
        movies: movies_mcp::services::MovieService::new(MovieRepository::new(pool.clone())),
        actors: movies_mcp::services::ActorService::new(ActorRepository::new(pool.clone())),
        links: movies_mcp::services::LinkService::new(
            ActorRepository::new(pool.clone()),
            MovieRepository::new(pool.clone()),
            LinkRepository::new(pool.clone()),
        ),
        context: std::sync::Arc::new(movies_mcp::context::ContextManager::new()),
    };

    let server = McpServer::new(
        state,
        ServerInfoConfig {
            name: "movies-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    );

    server.run().await
}
