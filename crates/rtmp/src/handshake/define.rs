use num_derive::FromPrimitive;

/// The schema version.
///
/// A chunk is 764 bytes: `(1536 - 8) / 2`.
/// Schema 0 places the digest after the key (offset 776 = 768 + 8).
/// Schema 1 places the digest right after the time and version (offset 8).
/// The server always mirrors whatever schema the client used.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SchemaVersion {
    Schema0,
    Schema1,
}

/// The RTMP version. Only version 3 is supported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum RtmpVersion {
    Unknown = 0x0,
    Version3 = 0x3,
}

/// The state of the server-side handshake state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ServerHandshakeState {
    ReadC0C1,
    ReadC2,
    Finish,
}

/// Total size of a C1/S1 or C2/S2 packet.
pub const RTMP_HANDSHAKE_SIZE: usize = 1536;

/// Magic number used by the reference implementation, origin unknown.
///
/// See <https://blog.csdn.net/win_lin/article/details/13006803>.
pub const RTMP_SERVER_VERSION: u32 = 0x04050001;

/// Length of an HMAC-SHA256 digest embedded in the handshake.
pub const RTMP_DIGEST_LENGTH: usize = 32;

/// Combined length of the time and version fields (4 bytes each).
pub const TIME_VERSION_LENGTH: usize = 8;

/// Length of a single handshake chunk: `(1536 - 8) / 2`.
pub const CHUNK_LENGTH: usize = (RTMP_HANDSHAKE_SIZE - TIME_VERSION_LENGTH) / 2;

/// First half of the server key, used for the complex handshake.
pub const RTMP_SERVER_KEY_FIRST_HALF: &str = "Genuine Adobe Flash Media Server 001";

/// First half of the client key, used for the complex handshake.
pub const RTMP_CLIENT_KEY_FIRST_HALF: &str = "Genuine Adobe Flash Player 001";

/// Full server key, used to derive the key for the S2 digest.
pub const RTMP_SERVER_KEY: [u8; 68] = [
    0x47, 0x65, 0x6e, 0x75, 0x69, 0x6e, 0x65, 0x20, 0x41, 0x64, 0x6f, 0x62, 0x65, 0x20, 0x46, 0x6c, 0x61, 0x73, 0x68, 0x20,
    0x4d, 0x65, 0x64, 0x69, 0x61, 0x20, 0x53, 0x65, 0x72, 0x76, 0x65, 0x72, 0x20, 0x30, 0x30, 0x31, 0xf0, 0xee, 0xc2, 0x4a,
    0x80, 0x68, 0xbe, 0xe8, 0x2e, 0x00, 0xd0, 0xd1, 0x02, 0x9e, 0x7e, 0x57, 0x6e, 0xec, 0x5d, 0x2d, 0x29, 0x80, 0x6f, 0xab,
    0x93, 0xb8, 0xe6, 0x36, 0xcf, 0xeb, 0x31, 0xae,
];
