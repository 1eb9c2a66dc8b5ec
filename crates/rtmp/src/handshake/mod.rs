mod define;
mod digest;
mod errors;
mod server;

pub use self::define::{RTMP_HANDSHAKE_SIZE, ServerHandshakeState};
pub use self::errors::*;
pub use self::server::HandshakeServer;
