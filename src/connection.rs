//! Per-client request loop.

use tokio::{
    io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
};

use crate::{
    commands::{CommandError, CommandHandler},
    input::{CommandReadError, read_command, wait_for_disconnect},
    state::State,
};

/// Serves one client until it disconnects or sends something that is not a
/// request frame.
///
/// Requests on a connection are answered strictly in order, one reply per
/// request. Nothing a client does here can affect other connections beyond
/// the data it writes to the shared stores.
pub async fn handle_client_connection(stream: TcpStream, client_address: String, state: State) {
    tracing::info!(client = %client_address, "client connected");

    let (reader, writer) = stream.into_split();

    match serve_requests(BufReader::new(reader), writer, &state).await {
        Ok(()) => tracing::info!(client = %client_address, "client disconnected"),
        Err(e) => tracing::warn!(client = %client_address, "closing connection: {}", e),
    }
}

/// The request loop over any buffered reader and writer, so it can be driven
/// from in-memory pipes as well as sockets.
pub async fn serve_requests<R, W>(
    mut reader: R,
    mut writer: W,
    state: &State,
) -> Result<(), CommandReadError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let input = match read_command(&mut reader).await {
            Ok(input) => input,
            Err(CommandReadError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let result = match CommandHandler::new(input) {
            Ok(handler) => {
                tracing::debug!(
                    command = %handler.name,
                    arguments = ?handler.arguments,
                    "received command"
                );

                if handler.may_block() {
                    tokio::select! {
                        biased;
                        result = handler.handle_command(state) => result,
                        _ = wait_for_disconnect(&mut reader) => {
                            tracing::debug!("client went away while blocked");
                            return Ok(());
                        }
                    }
                } else {
                    handler.handle_command(state).await
                }
            }
            Err(e) => Err(e),
        };

        let reply = result.unwrap_or_else(|e: CommandError| {
            tracing::debug!("command failed: {}", e);
            e.as_string()
        });

        writer.write_all(reply.as_bytes()).await?;
        writer.flush().await?;
    }
}
