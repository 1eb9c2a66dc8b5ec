//! Reading user control event messages.

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use super::EventType;
use super::errors::EventMessagesError;

/// A parsed user control event: the 2-byte event type plus whatever payload follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub event_type: EventType,
    pub data: Bytes,
}

impl EventMessage {
    pub fn read(payload: &Bytes) -> Result<Self, EventMessagesError> {
        if payload.len() < 2 {
            return Err(EventMessagesError::Truncated);
        }

        let event_type = EventType((&payload[..2]).read_u16::<BigEndian>().expect("checked length above"));

        Ok(Self {
            event_type,
            data: payload.slice(2..),
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_read_ping_request() {
        let payload = Bytes::from(vec![0x00, 0x06, 0xDE, 0xAD, 0xBE, 0xEF]);
        let event = EventMessage::read(&payload).unwrap();
        assert_eq!(event.event_type, EventType::PingRequest);
        assert_eq!(event.data, Bytes::from(vec![0xDE, 0xAD, 0xBE, 0xEF]));
    }

    #[test]
    fn test_read_truncated() {
        let payload = Bytes::from(vec![0x00]);
        assert!(matches!(EventMessage::read(&payload), Err(EventMessagesError::Truncated)));
    }
}
