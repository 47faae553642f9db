/// Photo Journal - a small web service for uploading, browsing and
/// downloading photos
///
/// Originals and thumbnails live in a blob store (local disk or S3), records
/// in SQLite or memory.

mod api;
mod blob_store;
mod config;
mod context;
mod db;
mod error;
mod journal;
mod metrics;
mod photo_store;
mod server;

use config::{LogFormat, LoggingConfig, ServerConfig};
use context::AppContext;
use error::JournalResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> JournalResult<()> {
    // Load configuration (logging format depends on it)
    let config = ServerConfig::from_env()?;

    init_tracing(&config.logging);

    print_banner();

    let ctx = AppContext::new(config).await?;

    server::serve(ctx).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn print_banner() {
    println!(
        r#"
    ____  __          __           __                             __
   / __ \/ /_  ____  / /_____     / /___  __  ___________  ____ _/ /
  / /_/ / __ \/ __ \/ __/ __ \__ / / __ \/ / / / ___/ __ \/ __ `/ /
 / ____/ / / / /_/ / /_/ /_/ / /_/ / /_/ / /_/ / /  / / / / /_/ / /
/_/   /_/ /_/\____/\__/\____/\____/\____/\__,_/_/  /_/ /_/\__,_/_/

        Photo Journal v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
