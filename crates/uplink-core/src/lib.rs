pub mod agent;
pub mod backend;
pub mod conversation;
pub mod error;
pub mod observer;
pub mod session;
pub mod workflow;

// Re-export the common error types and the session entry point
pub use error::{Result, TransportError, UplinkError};
pub use session::Session;
