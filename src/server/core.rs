use log::{error, info, warn};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::handle_client;
use crate::config::{RootContext, StartupConfig};
use crate::protocol::responses::{READY, TOO_MANY_CONNECTIONS, format_response};

/// Console server: accepts connections and runs one session task each.
pub struct Server {
    clients: Arc<Mutex<HashSet<SocketAddr>>>,
    listener: TcpListener,
    root: RootContext,
    config: Arc<StartupConfig>,
}

impl Server {
    pub async fn new(config: StartupConfig, root: RootContext) -> std::io::Result<Self> {
        let socket = config.control_socket();
        let listener = TcpListener::bind(&socket).await.inspect_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        Ok(Self {
            clients: Arc::new(Mutex::new(HashSet::new())),
            listener,
            root,
            config: Arc::new(config),
        })
    }

    /// Address actually bound, useful when the configured port is 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Starting Sandbox Explorer console on {} (max {} clients, root {})",
            self.config.control_socket(),
            self.config.max_clients,
            self.root.get().await.display()
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let clients = Arc::clone(&self.clients);
                    let root = self.root.clone();
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) = handle_new_client(stream, addr, clients, root, config).await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Greets a new client, enforces the connection limit, registers it and
/// hands off to the session handler.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    clients: Arc<Mutex<HashSet<SocketAddr>>>,
    root: RootContext,
    config: Arc<StartupConfig>,
) -> Result<(), std::io::Error> {
    {
        let mut registered = clients.lock().await;
        if registered.len() >= config.max_clients {
            let reply = format_response(TOO_MANY_CONNECTIONS, "Too many connections. Try again later.");
            stream.write_all(reply.as_bytes()).await?;
            return Ok(());
        }
        registered.insert(client_addr);
        info!(
            "Accepted client: {} ({}/{} clients)",
            client_addr,
            registered.len(),
            config.max_clients
        );
    }

    let greeting = format_response(READY, "Sandbox Explorer ready");
    if let Err(e) = stream.write_all(greeting.as_bytes()).await {
        clients.lock().await.remove(&client_addr);
        return Err(e);
    }

    handle_client(stream, clients, client_addr, root, config).await;
    Ok(())
}
