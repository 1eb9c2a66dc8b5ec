use crate::command_messages::CommandError;
use crate::protocol_control_messages::ProtocolControlMessageError;
use crate::user_control_messages::errors::EventMessagesError;

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("protocol control message error: {0}")]
    ProtocolControlMessage(#[from] ProtocolControlMessageError),
    #[error("command message: {0}")]
    CommandMessage(#[from] CommandError),
    #[error("user control event: {0}")]
    UserControlEvent(#[from] EventMessagesError),
    #[error("aggregate message tag is truncated")]
    TruncatedAggregateTag,
}
