//! High-level API to drive RTMP sessions.

pub mod error;
pub mod handler;
mod server_session;

pub use error::SessionError;
pub use handler::{PlayStream, SessionData, SessionHandler};
pub use server_session::Session;
