use std::time::Duration;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::BytesMut;
use rtmp_amf0::Amf0Value;
use rtmp_bytes_util::BytesCursorExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use super::error::SessionError;
use super::handler::{PlayStream, SessionData, SessionHandler};
use crate::chunk::{AUDIO_CHUNK_STREAM_ID, CHUNK_SIZE, Chunk, ChunkDecoder, ChunkEncoder, DATA_CHUNK_STREAM_ID, VIDEO_CHUNK_STREAM_ID};
use crate::command_messages::netconnection::{NetConnectionCommand, NetConnectionCommandConnect, NetConnectionCommandConnectResult};
use crate::command_messages::netstream::{NetStreamCommand, NetStreamCommandPublishPublishingType};
use crate::command_messages::on_status::{OnStatus, codes};
use crate::command_messages::{Command, CommandResultLevel, CommandType};
use crate::handshake;
use crate::handshake::{HandshakeServer, ServerHandshakeState};
use crate::messages::{MessageData, MessageType};
use crate::protocol_control_messages::{
    ProtocolControlMessageAcknowledgement, ProtocolControlMessageSetChunkSize, ProtocolControlMessageSetPeerBandwidth,
    ProtocolControlMessageSetPeerBandwidthLimitType, ProtocolControlMessageWindowAcknowledgementSize,
};
use crate::user_control_messages::{EventMessage, EventMessagePingResponse, EventMessageStreamBegin, EventMessageStreamEOF, EventType};

/// What [`Session::drive`] woke up for.
enum DriveEvent {
    SocketRead(usize),
    PlayFrame(SessionData),
    PlayEnded,
}

/// Scans the leading values of a command for the first string, tolerating the nulls and
/// extra arguments some clients (e.g. FFmpeg) pad `play`/`publish` invocations with.
fn first_string(values: &[Amf0Value<'static>]) -> Option<String> {
    values.iter().take(4).find_map(|value| match value {
        Amf0Value::String(s) => Some(s.as_str().to_string()),
        _ => None,
    })
}

pub struct Session<S, H> {
    /// When you connect via rtmp, you specify the app name in the url
    /// For example: rtmp://localhost:1935/live/xyz
    /// The app name is "live"
    /// The next part of the url is the stream name (or the stream key) "xyz"
    /// However the stream key is not required to be the same for each stream
    /// you publish / play Traditionally we only publish a single stream per
    /// RTMP connection, However we can publish multiple streams per RTMP
    /// connection (using different stream keys) and or play multiple streams
    /// per RTMP connection (using different stream keys) as per the RTMP spec.
    app_name: Option<Box<str>>,

    /// Used to read and write data
    io: S,

    handler: H,

    /// Buffer to read data into
    read_buf: BytesMut,
    /// Buffer to write data to
    write_buf: Vec<u8>,

    /// Sometimes when doing the handshake we read too much data,
    /// this flag is used to indicate that we have data ready to parse and we
    /// should not read more data from the stream
    skip_read: bool,

    /// This is used to read the data from the stream and convert it into rtmp
    /// messages
    chunk_decoder: ChunkDecoder,
    /// This is used to convert rtmp messages into chunks
    chunk_encoder: ChunkEncoder,

    /// Is Publishing
    publishing_stream_ids: Vec<u32>,

    /// The stream we're forwarding to the client for an active `play`, if any.
    play_subscription: Option<PlayStream>,
    /// The NetStream ID the active `play` is being served on.
    play_stream_id: Option<u32>,

    /// Window size the client asked us to acknowledge its input against, if any.
    ack_window_size: Option<u32>,
    /// Bytes read from the client since the last [`ProtocolControlMessageAcknowledgement`] we sent.
    bytes_since_ack: u32,
    /// Running total of bytes read from the client, wrapping as a raw 32-bit counter, per the
    /// acknowledgement protocol. This is what goes out on the wire, not `bytes_since_ack`.
    total_bytes_read: u32,
}

impl<S, H> Session<S, H> {
    /// Create a new session.
    pub fn new(io: S, handler: H) -> Self {
        Self {
            app_name: None,
            io,
            handler,
            skip_read: false,
            chunk_decoder: ChunkDecoder::default(),
            chunk_encoder: ChunkEncoder::default(),
            read_buf: BytesMut::new(),
            write_buf: Vec::new(),
            publishing_stream_ids: Vec::new(),
            play_subscription: None,
            play_stream_id: None,
            ack_window_size: None,
            bytes_since_ack: 0,
            total_bytes_read: 0,
        }
    }
}

impl<S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin, H: SessionHandler> Session<S, H> {
    /// Run the session to completion
    /// The result of the return value will be true if all publishers have
    /// disconnected If any publishers are still connected, the result will be
    /// false This can be used to detect non-graceful disconnects (ie. the
    /// client crashed)
    pub async fn run(&mut self) -> Result<bool, SessionError> {
        let mut handshaker = HandshakeServer::default();
        // Run the handshake to completion
        while !self.drive_handshake(&mut handshaker).await? {
            self.flush().await?;
        }

        // Drop the handshaker, we don't need it anymore
        // We can get rid of the memory that was allocated for it
        drop(handshaker);

        tracing::debug!("Handshake complete");

        // Drive the session to completion
        while match self.drive().await {
            Ok(v) => v,
            Err(err) if err.is_client_closed() => {
                // The client closed the connection
                // We are done with the session
                tracing::debug!("Client closed the connection");
                false
            }
            Err(e) => {
                return Err(e);
            }
        } {
            self.flush().await?;
        }

        // We should technically check the stream_map here
        // However most clients just disconnect without cleanly stopping the subscrition
        // streams (play streams) So we just check that all publishers have disconnected
        // cleanly
        Ok(self.publishing_stream_ids.is_empty())
    }

    /// This drives the first stage of the session.
    /// It is used to do the handshake with the client.
    /// The handshake is the first thing that happens when a client connects to a
    /// RTMP server.
    ///
    /// Returns true if the handshake is complete, false if the handshake is not complete yet.
    /// If the handshake is not complete yet, this function should be called again.
    async fn drive_handshake(&mut self, handshaker: &mut HandshakeServer) -> Result<bool, SessionError> {
        // Read the handshake data + 1 byte for the version
        const READ_SIZE: usize = handshake::RTMP_HANDSHAKE_SIZE + 1;
        self.read_buf.reserve(READ_SIZE);

        let mut bytes_read = 0;
        while bytes_read < READ_SIZE {
            let n = timeout(Duration::from_secs(2), self.io.read_buf(&mut self.read_buf)).await??;
            bytes_read += n;
        }

        let mut cursor = std::io::Cursor::new(self.read_buf.split().freeze());

        handshaker.handshake(&mut cursor, &mut self.write_buf)?;

        if handshaker.state() == ServerHandshakeState::Finish {
            let over_read = cursor.extract_remaining();

            if !over_read.is_empty() {
                self.skip_read = true;
                self.read_buf.extend_from_slice(&over_read);
            }

            self.send_set_chunk_size().await?;

            // We are done with the handshake
            // This causes the loop to exit
            // And move onto the next stage of the session
            Ok(true)
        } else {
            // We are not done with the handshake yet
            // We need to read more data from the stream
            // This causes the loop to continue
            Ok(false)
        }
    }

    /// This drives the second and main stage of the session.
    /// It is used to read data from the stream and parse it into RTMP messages.
    /// We also send data to the client if they are playing a stream.
    ///
    /// Finish the handshake first by repeatedly calling [`drive_handshake`](Session::drive_handshake)
    /// until it returns true before calling this function.
    ///
    /// Returns true if the session is still active, false if the client has closed the connection.
    async fn drive(&mut self) -> Result<bool, SessionError> {
        // If we have data ready to parse, parse it without touching the socket or the
        // subscription.
        if self.skip_read {
            self.skip_read = false;
            self.parse_chunks().await?;
            return Ok(true);
        }

        let event = {
            let Self {
                io,
                read_buf,
                play_subscription,
                ..
            } = self;

            read_buf.reserve(CHUNK_SIZE);

            match play_subscription {
                Some(subscription) => {
                    tokio::select! {
                        biased;

                        data = subscription.recv() => match data {
                            Some(data) => DriveEvent::PlayFrame(data),
                            None => DriveEvent::PlayEnded,
                        },
                        result = timeout(Duration::from_millis(2500), io.read_buf(read_buf)) => {
                            DriveEvent::SocketRead(result??)
                        }
                    }
                }
                None => DriveEvent::SocketRead(timeout(Duration::from_millis(2500), io.read_buf(read_buf)).await??),
            }
        };

        match event {
            DriveEvent::SocketRead(0) => Ok(false),
            DriveEvent::SocketRead(n) => {
                self.observe_bytes_read(n)?;
                self.parse_chunks().await?;
                Ok(true)
            }
            DriveEvent::PlayFrame(data) => {
                self.write_play_data(data)?;
                Ok(true)
            }
            DriveEvent::PlayEnded => {
                self.play_subscription = None;
                Ok(true)
            }
        }
    }

    /// Forwards one frame of an active `play` subscription to the client.
    fn write_play_data(&mut self, data: SessionData) -> Result<(), SessionError> {
        let Some(stream_id) = self.play_stream_id else {
            return Ok(());
        };

        match data {
            SessionData::Audio { timestamp, data } => {
                self.chunk_encoder.write_chunk(
                    &mut self.write_buf,
                    Chunk::new(AUDIO_CHUNK_STREAM_ID, timestamp, MessageType::Audio, stream_id, data),
                )?;
            }
            SessionData::Video { timestamp, data } => {
                self.chunk_encoder.write_chunk(
                    &mut self.write_buf,
                    Chunk::new(VIDEO_CHUNK_STREAM_ID, timestamp, MessageType::Video, stream_id, data),
                )?;
            }
            SessionData::Amf0 { timestamp, data } => {
                self.chunk_encoder.write_chunk(
                    &mut self.write_buf,
                    Chunk::new(DATA_CHUNK_STREAM_ID, timestamp, MessageType::DataAMF0, stream_id, data),
                )?;
            }
            SessionData::End => {
                self.play_subscription = None;

                EventMessageStreamEOF { stream_id }.write(&self.chunk_encoder, &mut self.write_buf)?;

                Command {
                    command_type: CommandType::OnStatus(OnStatus {
                        level: CommandResultLevel::Status,
                        code: codes::NET_STREAM_UNPUBLISH_NOTIFY.into(),
                        description: None,
                        others: None,
                    }),
                    transaction_id: 0.0,
                }
                .write(&mut self.write_buf, &self.chunk_encoder)?;
            }
        }

        Ok(())
    }

    /// Accounts for bytes just read from the client, sending an [`ProtocolControlMessageAcknowledgement`]
    /// once the client's requested acknowledgement window has been filled. The acknowledgement
    /// carries the low 32 bits of the cumulative byte counter, not the size of the window that
    /// just filled up.
    fn observe_bytes_read(&mut self, n: usize) -> Result<(), SessionError> {
        self.total_bytes_read = self.total_bytes_read.wrapping_add(n as u32);

        let Some(window) = self.ack_window_size else { return Ok(()) };

        self.bytes_since_ack = self.bytes_since_ack.saturating_add(n as u32);

        if self.bytes_since_ack >= window {
            ProtocolControlMessageAcknowledgement {
                sequence_number: self.total_bytes_read,
            }
            .write(&mut self.write_buf, &self.chunk_encoder)?;
            self.bytes_since_ack = 0;
        }

        Ok(())
    }

    /// Parse data from the client into RTMP messages and process them.
    async fn parse_chunks(&mut self) -> Result<(), SessionError> {
        while let Some(chunk) = self.chunk_decoder.read_chunk(&mut self.read_buf)? {
            let msg_stream_id = chunk.message_header.msg_stream_id;

            if chunk.message_header.msg_type_id == MessageType::Aggregate {
                self.process_aggregate(msg_stream_id, chunk.payload.clone()).await?;
                continue;
            }

            let timestamp = chunk.message_header.timestamp;
            if let Some(msg) = MessageData::parse(&chunk)? {
                self.process_message(msg, msg_stream_id, timestamp).await?;
            }
        }

        Ok(())
    }

    /// Disaggregates an `Aggregate` message and forwards each inner tag as if it had arrived
    /// as its own ordinary audio/video/data message, using the timestamp resolved from the
    /// tag's own header rather than the outer message's.
    async fn process_aggregate(&mut self, stream_id: u32, payload: bytes::Bytes) -> Result<(), SessionError> {
        for tag in crate::messages::aggregate::disaggregate(payload)? {
            let data = match tag {
                crate::messages::aggregate::AggregateTag::Audio { timestamp, data } => SessionData::Audio { timestamp, data },
                crate::messages::aggregate::AggregateTag::Video { timestamp, data } => SessionData::Video { timestamp, data },
                crate::messages::aggregate::AggregateTag::DataAmf0 { timestamp, data } => SessionData::Amf0 { timestamp, data },
            };
            self.handler.on_data(stream_id, data).await?;
        }

        Ok(())
    }

    /// Process one RTMP message
    async fn process_message(&mut self, msg: MessageData<'_>, stream_id: u32, timestamp: u32) -> Result<(), SessionError> {
        match msg {
            MessageData::Amf0Command(command) => self.on_command_message(stream_id, command, false).await?,
            MessageData::Amf3Command(command) => self.on_command_message(stream_id, command, true).await?,
            MessageData::SetChunkSize(ProtocolControlMessageSetChunkSize { chunk_size }) => {
                self.on_set_chunk_size(chunk_size as usize)?;
            }
            MessageData::AudioData { data } => {
                self.handler
                    .on_data(stream_id, SessionData::Audio { timestamp, data })
                    .await?;
            }
            MessageData::VideoData { data } => {
                self.handler
                    .on_data(stream_id, SessionData::Video { timestamp, data })
                    .await?;
            }
            MessageData::DataAmf0 { data } => {
                self.handler.on_data(stream_id, SessionData::Amf0 { timestamp, data }).await?;
            }
            MessageData::UserControl(EventMessage { event_type, data }) if event_type == EventType::PingRequest => {
                if data.len() >= 4 {
                    let timestamp = (&data[..4]).read_u32::<BigEndian>().expect("checked length above");
                    EventMessagePingResponse { timestamp }.write(&self.chunk_encoder, &mut self.write_buf)?;
                }
            }
            MessageData::SetAcknowledgementWindowSize(ProtocolControlMessageWindowAcknowledgementSize {
                acknowledgement_window_size,
            }) => {
                self.ack_window_size = Some(acknowledgement_window_size);
            }
            MessageData::UserControl(_) | MessageData::Other { .. } => {}
        }

        Ok(())
    }

    /// Set the server chunk size to the client
    async fn send_set_chunk_size(&mut self) -> Result<(), SessionError> {
        ProtocolControlMessageSetChunkSize {
            chunk_size: CHUNK_SIZE as u32,
        }
        .write(&mut self.write_buf, &self.chunk_encoder)?;
        self.chunk_encoder.set_chunk_size(CHUNK_SIZE);

        Ok(())
    }

    /// Writes a command reply, encoded as AMF3 if the triggering command arrived as AMF3
    /// (`CommandAMF3`), so the client gets a reply in the wire format it used to ask.
    fn write_command_reply(&mut self, command: Command<'_>, as_amf3: bool) -> Result<(), SessionError> {
        if as_amf3 {
            command.write_amf3(&mut self.write_buf, &self.chunk_encoder)?;
        } else {
            command.write(&mut self.write_buf, &self.chunk_encoder)?;
        }

        Ok(())
    }

    /// on_amf0_command_message is called when we receive an AMF0 (or AMF3) command
    /// message from the client We then handle the command message
    async fn on_command_message(&mut self, stream_id: u32, command: Command<'_>, as_amf3: bool) -> Result<(), SessionError> {
        match command.command_type {
            CommandType::NetConnection(NetConnectionCommand::Connect(NetConnectionCommandConnect { app, .. })) => {
                self.on_command_connect(stream_id, command.transaction_id, app.into_owned(), as_amf3)
                    .await?;
            }
            CommandType::NetConnection(NetConnectionCommand::CreateStream) => {
                self.on_command_create_stream(stream_id, command.transaction_id, as_amf3).await?;
            }
            CommandType::NetStream(NetStreamCommand::DeleteStream {
                stream_id: delete_stream_id,
            }) => {
                self.on_command_delete_stream(stream_id, command.transaction_id, delete_stream_id, as_amf3)
                    .await?;
            }
            CommandType::NetStream(NetStreamCommand::Play { values }) => {
                let stream_name = first_string(&values).ok_or(SessionError::NoStreamName)?;
                self.on_command_play(stream_id, command.transaction_id, stream_name, as_amf3).await?;
            }
            CommandType::NetStream(NetStreamCommand::Play2 { .. }) => {
                return Err(SessionError::PlayNotSupported);
            }
            CommandType::NetStream(NetStreamCommand::Publish {
                publishing_name,
                publishing_type,
            }) => {
                self.on_command_publish(
                    stream_id,
                    command.transaction_id,
                    publishing_name.as_str().to_string(),
                    publishing_type,
                    as_amf3,
                )
                .await?;
            }
            CommandType::NetStream(NetStreamCommand::CloseStream) => {
                // Not sure what this is for
            }
            // ignore everything else
            _ => {}
        }

        Ok(())
    }

    /// on_set_chunk_size is called when we receive a set chunk size message
    /// from the client We then update the chunk size of the unpacketizer
    fn on_set_chunk_size(&mut self, chunk_size: usize) -> Result<(), SessionError> {
        if self.chunk_decoder.update_max_chunk_size(chunk_size) {
            Ok(())
        } else {
            Err(SessionError::InvalidChunkSize(chunk_size))
        }
    }

    /// on_command_connect is called when we receive a amf0 command message with
    /// the name "connect" We then handle the connect message
    /// This is called when the client first connects to the server
    async fn on_command_connect(&mut self, _stream_id: u32, transaction_id: f64, app: String, as_amf3: bool) -> Result<(), SessionError> {
        ProtocolControlMessageWindowAcknowledgementSize {
            acknowledgement_window_size: CHUNK_SIZE as u32,
        }
        .write(&mut self.write_buf, &self.chunk_encoder)?;

        ProtocolControlMessageSetPeerBandwidth {
            acknowledgement_window_size: CHUNK_SIZE as u32,
            limit_type: ProtocolControlMessageSetPeerBandwidthLimitType::Dynamic,
        }
        .write(&mut self.write_buf, &self.chunk_encoder)?;

        self.app_name = Some(Box::from(app));

        let result = NetConnectionCommandConnectResult::default();

        self.write_command_reply(
            Command {
                command_type: CommandType::NetConnection(NetConnectionCommand::ConnectResult(result)),
                transaction_id,
            },
            as_amf3,
        )?;

        Ok(())
    }

    /// on_command_create_stream is called when we receive a amf0 command
    /// message with the name "createStream" We then handle the createStream
    /// message This is called when the client wants to create a stream
    /// A NetStream is used to start publishing or playing a stream
    async fn on_command_create_stream(&mut self, _stream_id: u32, transaction_id: f64, as_amf3: bool) -> Result<(), SessionError> {
        // 1.0 is the Stream ID of the stream we are creating
        self.write_command_reply(
            Command {
                command_type: CommandType::NetConnection(NetConnectionCommand::CreateStreamResult { stream_id: 1.0 }),
                transaction_id,
            },
            as_amf3,
        )?;

        Ok(())
    }

    /// A delete stream message is unrelated to the NetConnection close method.
    /// Delete stream is basically a way to tell the server that you are done
    /// publishing or playing a stream. The server will then remove the stream
    /// from its list of streams.
    async fn on_command_delete_stream(
        &mut self,
        _stream_id: u32,
        transaction_id: f64,
        delete_stream_id: f64,
        as_amf3: bool,
    ) -> Result<(), SessionError> {
        let stream_id = delete_stream_id as u32;

        self.handler.on_unpublish(stream_id).await?;

        // Remove the stream id from the list of publishing stream ids
        self.publishing_stream_ids.retain(|id| *id != stream_id);

        self.write_command_reply(
            Command {
                command_type: CommandType::OnStatus(OnStatus {
                    level: CommandResultLevel::Status,
                    code: codes::NET_STREAM_DELETE_STREAM_SUCCESS.into(),
                    description: None,
                    others: None,
                }),
                transaction_id,
            },
            as_amf3,
        )?;

        Ok(())
    }

    /// on_command_publish is called when we receive a amf0 command message with
    /// the name "publish" publish commands are used to publish a stream to the
    /// server ie. the user wants to start streaming to the server
    async fn on_command_publish(
        &mut self,
        stream_id: u32,
        transaction_id: f64,
        publishing_name: String,
        _publishing_type: NetStreamCommandPublishPublishingType<'_>,
        as_amf3: bool,
    ) -> Result<(), SessionError> {
        let Some(app_name) = &self.app_name else {
            return Err(SessionError::NoAppName);
        };

        self.handler
            .on_publish(stream_id, app_name.as_ref(), publishing_name.as_ref())
            .await?;

        self.publishing_stream_ids.push(stream_id);

        EventMessageStreamBegin { stream_id }.write(&self.chunk_encoder, &mut self.write_buf)?;

        self.write_command_reply(
            Command {
                command_type: CommandType::OnStatus(OnStatus {
                    level: CommandResultLevel::Status,
                    code: codes::NET_STREAM_PUBLISH_START.into(),
                    description: None,
                    others: None,
                }),
                transaction_id,
            },
            as_amf3,
        )?;

        Ok(())
    }

    /// on_command_play is called when we receive an amf0 command message with the name "play".
    /// play commands are used to subscribe to a previously published stream.
    ///
    /// Per the resilient parsing this implementation does for `play`/`publish`, `stream_name` is
    /// whatever [`first_string`] found among the command's leading arguments.
    async fn on_command_play(
        &mut self,
        stream_id: u32,
        transaction_id: f64,
        stream_name: String,
        as_amf3: bool,
    ) -> Result<(), SessionError> {
        let Some(app_name) = &self.app_name else {
            return Err(SessionError::NoAppName);
        };

        match self.handler.on_play(stream_id, app_name.as_ref(), stream_name.as_ref()).await {
            Ok(subscription) => {
                self.play_subscription = Some(subscription);
                self.play_stream_id = Some(stream_id);

                EventMessageStreamBegin { stream_id }.write(&self.chunk_encoder, &mut self.write_buf)?;

                self.write_command_reply(
                    Command {
                        command_type: CommandType::OnStatus(OnStatus {
                            level: CommandResultLevel::Status,
                            code: codes::NET_STREAM_PLAY_START.into(),
                            description: None,
                            others: None,
                        }),
                        transaction_id,
                    },
                    as_amf3,
                )?;
            }
            // No publisher registered under that name yet: tell the client, don't tear down
            // the connection over it.
            Err(SessionError::UnknownStreamID(_)) => {
                self.write_command_reply(
                    Command {
                        command_type: CommandType::OnStatus(OnStatus {
                            level: CommandResultLevel::Error,
                            code: codes::NET_STREAM_PLAY_STREAM_NOT_FOUND.into(),
                            description: None,
                            others: None,
                        }),
                        transaction_id,
                    },
                    as_amf3,
                )?;
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SessionError> {
        if !self.write_buf.is_empty() {
            timeout(Duration::from_secs(2), self.io.write_all(self.write_buf.as_ref())).await??;
            self.write_buf.clear();
        }

        Ok(())
    }
}
