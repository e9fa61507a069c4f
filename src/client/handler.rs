use log::{error, info, warn};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

use crate::client::Session;
use crate::config::{RootContext, StartupConfig};
use crate::protocol::responses::{TRANSFER_COMPLETE, UNKNOWN_COMMAND, format_response};
use crate::protocol::{CommandData, CommandStatus, handle_command, handle_upload, parse_command};

/// Handles one console session using the Tokio async runtime.
///
/// - Uses BufReader to read command lines from the client.
/// - Dispatches commands using `handle_command`.
/// - Performs the follow-up transfer a command asks for (file download or
///   upload body) on the same connection.
pub async fn handle_client(
    cmd_stream: TcpStream,
    clients: Arc<Mutex<HashSet<SocketAddr>>>,
    client_addr: SocketAddr,
    root: RootContext,
    config: Arc<StartupConfig>,
) {
    let (read_half, mut write_half) = cmd_stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(client_addr);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(_) => {
                if line.len() > config.max_command_length {
                    let reply = format_response(UNKNOWN_COMMAND, "Command too long");
                    if write_half.write_all(reply.as_bytes()).await.is_err() {
                        break;
                    }
                    continue;
                }

                let command = parse_command(line.trim_end_matches(['\r', '\n']));
                info!("Received from {}: {:?}", client_addr, &command);

                let result = handle_command(&mut session, &command, &root, &config).await;

                if let Some(msg) = &result.message {
                    if write_half.write_all(msg.as_bytes()).await.is_err() {
                        break;
                    }
                }

                match (result.status, result.data) {
                    (CommandStatus::CloseConnection, _) => {
                        info!("Client {} requested to quit", client_addr);
                        break;
                    }
                    (_, Some(CommandData::File { path, size })) => {
                        if let Err(e) = send_file(&mut write_half, &path, size).await {
                            error!("Failed to send file to {}: {}", client_addr, e);
                            break;
                        }
                    }
                    (
                        _,
                        Some(CommandData::AwaitUpload {
                            length,
                            content_type,
                        }),
                    ) => {
                        let mut body = vec![0u8; length as usize];
                        if let Err(e) = reader.read_exact(&mut body).await {
                            warn!("Upload from {} aborted: {}", client_addr, e);
                            break;
                        }
                        let stored = handle_upload(&session, &body, &content_type, &root).await;
                        if let Some(msg) = stored.message {
                            if let Err(e) = write_half.write_all(msg.as_bytes()).await {
                                warn!("Failed to reply to {}: {}", client_addr, e);
                                break;
                            }
                        }
                    }
                    (CommandStatus::Failure(reason), None) => {
                        warn!("Command from {} failed: {}", client_addr, reason);
                    }
                    (CommandStatus::Success, None) => {}
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let mut clients_guard = clients.lock().await;
    clients_guard.remove(&client_addr);
    info!("Client {} disconnected", client_addr);
}

async fn send_file(
    write_half: &mut OwnedWriteHalf,
    path: &std::path::Path,
    size: u64,
) -> std::io::Result<()> {
    let mut file = tokio::fs::File::open(path).await?;
    let sent = tokio::io::copy(&mut file, write_half).await?;
    if sent != size {
        warn!("File changed during transfer: expected {} bytes, sent {}", size, sent);
    }
    write_half
        .write_all(format_response(TRANSFER_COMPLETE, "Transfer complete").as_bytes())
        .await?;
    write_half.flush().await
}
