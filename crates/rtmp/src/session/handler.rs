use bytes::Bytes;
use tokio::sync::mpsc;

use super::SessionError;

#[derive(Debug, Clone)]
pub enum SessionData {
    Video { timestamp: u32, data: Bytes },
    Audio { timestamp: u32, data: Bytes },
    Amf0 { timestamp: u32, data: Bytes },
    /// The publisher this play was attached to has gone away.
    End,
}

/// Feed of [`SessionData`] a playing session forwards to the client verbatim.
///
/// Whoever implements [`SessionHandler::on_play`] is responsible for ordering: any cached
/// sequence headers/metadata a late joiner needs MUST be sent down this channel before live
/// frames, since the session itself has no notion of what is a sequence header.
pub type PlayStream = mpsc::Receiver<SessionData>;

pub trait SessionHandler {
    fn on_publish(
        &self,
        stream_id: u32,
        app_name: &str,
        stream_name: &str,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
    fn on_unpublish(&self, stream_id: u32) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
    fn on_data(
        &self,
        stream_id: u32,
        data: SessionData,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
    /// Called when the client asks to play `stream_name` published under `app_name`.
    ///
    /// Returns a channel the session drains for the lifetime of the play; the session closes
    /// it by dropping its end when the client disconnects or stops playing.
    fn on_play(
        &self,
        stream_id: u32,
        app_name: &str,
        stream_name: &str,
    ) -> impl std::future::Future<Output = Result<PlayStream, SessionError>> + Send;
}
