use anyhow::Context;
use tracing_subscriber::EnvFilter;

use redis_streams_server::server::RedisServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = RedisServer::new(std::env::args()).context("invalid command line")?;

    tracing::info!(
        port = server.port,
        dir = %server.rdb_directory,
        dbfilename = %server.rdb_filename,
        "starting server"
    );

    server.run().await.context("server stopped")?;

    Ok(())
}
