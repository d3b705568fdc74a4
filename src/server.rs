//! Process configuration and the accept loop.

use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::{connection::handle_client_connection, rdb::load_snapshot, state::State};

const DEFAULT_PORT: u32 = 6379;
const DEFAULT_RDB_DIRECTORY: &str = "/tmp/redis-file";
const DEFAULT_RDB_FILENAME: &str = "rdbfile";

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("Invalid command line flag")]
    InvalidCommandLineFlag,
    #[error("Invalid command line flag value")]
    InvalidCommandLineFlagValue,
}

/// Startup configuration. Written once from the command line and read-only
/// afterwards; CONFIG GET reads `dir` and `dbfilename` from here.
#[derive(Debug, Clone, PartialEq)]
pub struct RedisServer {
    pub port: u32,
    pub rdb_directory: String,
    pub rdb_filename: String,
}

impl Default for RedisServer {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            rdb_directory: DEFAULT_RDB_DIRECTORY.to_string(),
            rdb_filename: DEFAULT_RDB_FILENAME.to_string(),
        }
    }
}

impl RedisServer {
    /// Builds the configuration from process arguments, program name first.
    ///
    /// Recognized flags: `--port <n>`, `--dir <path>`, `--dbfilename <name>`.
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let mut iter = command_line_args.into_iter().skip(1);
        let mut server = RedisServer::default();

        while let Some(arg) = iter.next() {
            let Some(value) = iter.next() else {
                return match arg.as_str() {
                    "--port" | "--dir" | "--dbfilename" => Err(CliError::InvalidCommandLineFlagValue),
                    _ => Err(CliError::InvalidCommandLineFlag),
                };
            };

            match arg.as_str() {
                "--port" => {
                    let port_number = value
                        .parse::<u32>()
                        .map_err(|_| CliError::InvalidCommandLineFlagValue)?;

                    if !(1..=65535).contains(&port_number) {
                        return Err(CliError::InvalidCommandLineFlagValue);
                    }

                    server.port = port_number;
                }
                "--dir" => server.rdb_directory = value,
                "--dbfilename" => server.rdb_filename = value,
                _ => return Err(CliError::InvalidCommandLineFlag),
            }
        }

        Ok(server)
    }

    /// Value of a CONFIG GET parameter, if it is one we expose. Names are
    /// case-insensitive.
    pub fn config_value(&self, name: &str) -> Option<&str> {
        match name.to_ascii_lowercase().as_str() {
            "dir" => Some(&self.rdb_directory),
            "dbfilename" => Some(&self.rdb_filename),
            _ => None,
        }
    }

    pub fn rdb_path(&self) -> PathBuf {
        PathBuf::from(&self.rdb_directory).join(&self.rdb_filename)
    }

    /// Loads the snapshot, binds the configured port and serves forever.
    pub async fn run(self) -> tokio::io::Result<()> {
        let state = State::new(self);

        let report = load_snapshot(&state.server.rdb_path(), &state.store).await;
        tracing::info!(
            keys_loaded = report.keys_loaded,
            expired_skipped = report.expired_skipped,
            stopped_early = ?report.stopped_early,
            "snapshot loaded"
        );

        let listener = TcpListener::bind(format!("127.0.0.1:{}", state.server.port)).await?;

        serve(listener, state).await
    }
}

/// Accepts connections on `listener`, one task per client.
///
/// A failing connection never takes the loop down; accept errors are logged
/// and the loop keeps going.
pub async fn serve(listener: TcpListener, state: State) -> tokio::io::Result<()> {
    tracing::info!(address = %listener.local_addr()?, "listening");

    loop {
        match listener.accept().await {
            Ok((stream, address)) => {
                let state = state.clone();

                tokio::spawn(async move {
                    handle_client_connection(stream, address.to_string(), state).await;
                });
            }
            Err(e) => {
                tracing::warn!("Error accepting connection: {}", e);
            }
        }
    }
}
