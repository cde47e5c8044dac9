//! Server core functionality
//!
//! Binds the chat listener and runs the accept loop.

pub mod core;

pub use core::Server;
