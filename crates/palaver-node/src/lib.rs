//! Palaver - live negotiation exercises across a simulated language barrier.
//!
//! A facilitated session node: participants join a lobby with a shared
//! code, get seated into teams with asymmetric executive roles, and
//! negotiate in a team chat whose text distorts depending on who is
//! reading it.
//!
//! # Architecture
//!
//! - **Models**: the five record kinds (Session, Team, Participant, ChatMessage, Answer)
//! - **Storage**: RocksDB-backed persistent storage
//! - **Service**: guarded session operations with commit-time re-checks
//! - **Events / View**: change notifications and per-viewer reconciliation
//! - **API / WS**: HTTP endpoints and real-time session streaming
//! - **Admin Socket**: Unix socket for the facilitator (palaver-admin CLI)
//!
//! # Example
//!
//! ```no_run
//! use palaver_node::{NodeConfig, PalaverNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::default();
//!     let node = PalaverNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod models;
pub mod storage;
pub mod events;
pub mod service;
pub mod view;
pub mod node;
pub mod api;
pub mod ws;
pub mod admin_socket;
pub mod error;

pub use error::{Error, Result};
pub use models::{Answer, ChatMessage, Participant, Session, Team};
pub use node::{NodeConfig, PalaverNode};
pub use service::SessionService;
pub use storage::Storage;
