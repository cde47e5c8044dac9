//! Client management system
//!
//! Handles client connections, the shared registry, and session lifecycle.

pub mod broadcast;
pub mod handler;
pub mod registry;
pub mod session;
pub mod state;

pub use broadcast::broadcast;
pub use handler::handle_client;
pub use registry::Registry;
pub use session::{Session, SessionState};
pub use state::{ClientEntry, ConnectionId, Outbound};
