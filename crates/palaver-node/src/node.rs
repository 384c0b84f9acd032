//! Palaver node - the main application entry point.
//!
//! Architecture:
//! - Single daemon process with shared RocksDB storage
//! - HTTP API + WebSocket for participant screens and the monitor
//! - Unix admin socket for the facilitator (palaver-admin CLI)

use crate::admin_socket::AdminSocket;
use crate::api;
use crate::error::Result;
use crate::events::EventHub;
use crate::service::SessionService;
use crate::storage::Storage;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a Palaver node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Admin socket path (for palaver-admin CLI)
    pub admin_socket: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(
            std::env::var("PALAVER_DATA_DIR").unwrap_or_else(|_| "./palaver-data".to_string()),
        );

        let api_addr = std::env::var("PALAVER_API_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid PALAVER_API_ADDR");

        let admin_socket = std::env::var("PALAVER_ADMIN_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("admin.sock"));

        Self {
            data_dir,
            api_addr,
            admin_socket,
        }
    }
}

/// A Palaver node instance.
pub struct PalaverNode {
    service: Arc<SessionService>,
    config: NodeConfig,
}

impl PalaverNode {
    /// Create a new Palaver node.
    pub fn new(config: NodeConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        // Single shared storage instance behind the one service
        let storage = Arc::new(Storage::open(&config.data_dir)?);
        let service = Arc::new(SessionService::new(storage, EventHub::default()));

        Ok(Self { service, config })
    }

    /// Get the shared service (for API handlers and the admin socket).
    pub fn service(&self) -> Arc<SessionService> {
        Arc::clone(&self.service)
    }

    /// Run the node (starts the HTTP server and the admin socket).
    pub async fn run(self) -> Result<()> {
        tracing::info!("Palaver node starting");
        tracing::info!("  API: http://{}", self.config.api_addr);
        tracing::info!("  Admin: {:?}", self.config.admin_socket);
        tracing::info!("  Data: {:?}", self.config.data_dir);

        // Start admin socket server in background
        let admin_socket = AdminSocket::new(
            self.service(),
            self.config
                .admin_socket
                .to_str()
                .unwrap_or("./palaver-data/admin.sock"),
        );
        tokio::spawn(async move {
            if let Err(e) = admin_socket.run().await {
                tracing::error!("Admin socket error: {}", e);
            }
        });

        // Build HTTP API
        let app = api::build_router(self.service());

        // Start HTTP server
        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        tracing::info!("HTTP server listening on {}", self.config.api_addr);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
