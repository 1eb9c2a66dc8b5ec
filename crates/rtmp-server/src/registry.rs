//! In-process stream registry: tracks published streams and fans their data out to every
//! subscriber watching the same app/stream-name pair, replaying cached sequence
//! headers and metadata to late joiners.

use std::collections::HashMap;
use std::sync::Arc;

use rtmp::{PlayStream, SessionData, SessionError, SessionHandler};
use tokio::sync::{mpsc, Mutex};

/// Depth of the per-subscriber forwarding channel. A subscriber that can't keep up backs up
/// its own channel; it never blocks the publisher or any other subscriber.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 128;

/// The most recent payload of each kind a late joiner needs before live frames will make
/// sense to its decoder.
#[derive(Clone, Default)]
struct SequenceCache {
    video: Option<SessionData>,
    audio: Option<SessionData>,
    metadata: Option<SessionData>,
}

impl SequenceCache {
    /// Replays the cached payloads, in the order a decoder needs them: metadata first, then
    /// the audio and video sequence headers.
    fn replay_into(&self, sender: &mpsc::Sender<SessionData>) {
        for cached in [&self.metadata, &self.audio, &self.video].into_iter().flatten() {
            // Best effort: if the channel is already full the subscriber hasn't even started
            // draining it yet, which shouldn't happen for a channel we just created.
            let _ = sender.try_send(cached.clone());
        }
    }

    /// Updates the cache if `data` is a sequence header or metadata payload, per the FLV tag
    /// layout (video frame type/codec id, audio sound format, and the AVC/AAC packet type).
    fn observe(&mut self, data: &SessionData) {
        match data {
            SessionData::Video { data: payload, .. } if is_avc_sequence_header(payload) => {
                self.video = Some(data.clone());
            }
            SessionData::Audio { data: payload, .. } if is_aac_sequence_header(payload) => {
                self.audio = Some(data.clone());
            }
            SessionData::Amf0 { .. } => {
                self.metadata = Some(data.clone());
            }
            _ => {}
        }
    }
}

fn is_avc_sequence_header(data: &bytes::Bytes) -> bool {
    data.len() >= 2 && data[0] & 0x0F == 7 && data[1] == 0
}

fn is_aac_sequence_header(data: &bytes::Bytes) -> bool {
    data.len() >= 2 && data[0] >> 4 == 10 && data[1] == 0
}

struct PublishedStream {
    /// NetStream ID the publisher is sending on; used to key `on_data`/`on_unpublish` calls.
    stream_id: u32,
    cache: SequenceCache,
    subscribers: Vec<mpsc::Sender<SessionData>>,
}

type StreamKey = (String, String);

/// Tracks every currently-published stream, keyed by `(app_name, stream_name)`, and hands out
/// subscriptions to `play` requests for them.
///
/// Publish conflicts are rejected, not evicted: a second `publish` to an already-registered
/// app/stream-name pair fails with [`SessionError::PublishRequestDenied`] rather than kicking
/// the existing publisher off.
///
/// A `play` for a name with no publisher yet doesn't fail: the subscriber's channel is created
/// and queued in `waiting`, and gets attached the moment a matching `publish` arrives.
#[derive(Default)]
struct Inner {
    streams: HashMap<StreamKey, PublishedStream>,
    waiting: HashMap<StreamKey, Vec<mpsc::Sender<SessionData>>>,
}

#[derive(Clone, Default)]
pub struct StreamRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionHandler for StreamRegistry {
    async fn on_publish(&self, stream_id: u32, app_name: &str, stream_name: &str) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        let key = (app_name.to_string(), stream_name.to_string());

        if inner.streams.contains_key(&key) {
            return Err(SessionError::PublishRequestDenied);
        }

        let waiting = inner.waiting.remove(&key).unwrap_or_default();
        tracing::debug!(app_name, stream_name, waiting = waiting.len(), "publish-start");

        inner.streams.insert(
            key,
            PublishedStream {
                stream_id,
                cache: SequenceCache::default(),
                subscribers: waiting,
            },
        );

        Ok(())
    }

    async fn on_unpublish(&self, stream_id: u32) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        let Some(key) = inner
            .streams
            .iter()
            .find(|(_, stream)| stream.stream_id == stream_id)
            .map(|(key, _)| key.clone())
        else {
            return Ok(());
        };

        if let Some(stream) = inner.streams.remove(&key) {
            tracing::debug!(app_name = %key.0, stream_name = %key.1, "publish-stop");
            for subscriber in &stream.subscribers {
                let _ = subscriber.send(SessionData::End).await;
            }
        }

        Ok(())
    }

    async fn on_data(&self, stream_id: u32, data: SessionData) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        let Some(stream) = inner.streams.values_mut().find(|stream| stream.stream_id == stream_id) else {
            return Ok(());
        };

        match &data {
            SessionData::Audio { data: payload, .. } => tracing::trace!(bytes = payload.len(), "audio-buffer"),
            SessionData::Video { data: payload, .. } => tracing::trace!(bytes = payload.len(), "video-buffer"),
            _ => {}
        }

        stream.cache.observe(&data);
        stream.subscribers.retain(|subscriber| subscriber.try_send(data.clone()).is_ok());

        Ok(())
    }

    async fn on_play(&self, _stream_id: u32, app_name: &str, stream_name: &str) -> Result<PlayStream, SessionError> {
        let mut inner = self.inner.lock().await;
        let key = (app_name.to_string(), stream_name.to_string());

        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);

        match inner.streams.get_mut(&key) {
            Some(stream) => {
                stream.cache.replay_into(&sender);
                stream.subscribers.push(sender);
            }
            None => {
                // No publisher under this name yet: queue the subscriber and attach it the
                // moment a matching `publish` arrives, instead of failing the play outright.
                inner.waiting.entry(key).or_default().push(sender);
            }
        }

        Ok(receiver)
    }
}
