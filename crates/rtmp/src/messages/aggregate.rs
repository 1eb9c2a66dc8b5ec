//! Disaggregating `Aggregate` messages (type 22) into their inner FLV tags.
//!
//! An aggregate message is a sequence of back-to-back FLV tags, each carrying its own type,
//! size and timestamp, trailing a 4-byte "previous tag size" field just like an FLV file body.
//! We split these out and forward each tag to subscribers as if it had arrived as its own
//! ordinary audio/video/data message.

use bytes::{Buf, Bytes};

use super::errors::MessageError;

const TAG_HEADER_LEN: usize = 11;
const PREV_TAG_SIZE_LEN: usize = 4;

const TAG_TYPE_AUDIO: u8 = 8;
const TAG_TYPE_VIDEO: u8 = 9;
const TAG_TYPE_DATA_AMF0: u8 = 18;

/// One inner tag of an `Aggregate` message, resolved to the kind of payload it carries.
#[derive(Debug, PartialEq, Eq)]
pub enum AggregateTag {
    /// FLV AUDIODATA tag.
    Audio {
        /// Timestamp resolved from the tag's own header, not the outer message's.
        timestamp: u32,
        /// The tag's payload.
        data: Bytes,
    },
    /// FLV VIDEODATA tag.
    Video {
        /// Timestamp resolved from the tag's own header, not the outer message's.
        timestamp: u32,
        /// The tag's payload.
        data: Bytes,
    },
    /// FLV AMF0 script data tag.
    DataAmf0 {
        /// Timestamp resolved from the tag's own header, not the outer message's.
        timestamp: u32,
        /// The tag's payload.
        data: Bytes,
    },
}

/// Splits an `Aggregate` message's payload into its inner FLV tags.
///
/// Unrecognized inner tag types are skipped rather than rejected, since an aggregate is
/// allowed to carry tag types we don't act on (e.g. encryption metadata); a truncated tag
/// header or body is an error since it means we've lost sync with the stream.
pub fn disaggregate(mut data: Bytes) -> Result<Vec<AggregateTag>, MessageError> {
    let mut tags = Vec::new();

    while data.has_remaining() {
        if data.remaining() < TAG_HEADER_LEN {
            return Err(MessageError::TruncatedAggregateTag);
        }

        let tag_type = data.get_u8();
        let size = ((data.get_u8() as usize) << 16) | ((data.get_u8() as usize) << 8) | data.get_u8() as usize;
        let ts_low = ((data.get_u8() as u32) << 16) | ((data.get_u8() as u32) << 8) | data.get_u8() as u32;
        let ts_high = data.get_u8() as u32;
        let timestamp = (ts_high << 24) | ts_low;
        // stream id, always 0
        data.advance(3);

        if data.remaining() < size + PREV_TAG_SIZE_LEN {
            return Err(MessageError::TruncatedAggregateTag);
        }

        let payload = data.copy_to_bytes(size);
        data.advance(PREV_TAG_SIZE_LEN);

        match tag_type {
            TAG_TYPE_AUDIO => tags.push(AggregateTag::Audio { timestamp, data: payload }),
            TAG_TYPE_VIDEO => tags.push(AggregateTag::Video { timestamp, data: payload }),
            TAG_TYPE_DATA_AMF0 => tags.push(AggregateTag::DataAmf0 { timestamp, data: payload }),
            _ => {}
        }
    }

    Ok(tags)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;

    fn push_tag(buf: &mut BytesMut, tag_type: u8, timestamp: u32, payload: &[u8]) {
        buf.put_u8(tag_type);
        let size = payload.len() as u32;
        buf.put_u8((size >> 16) as u8);
        buf.put_u8((size >> 8) as u8);
        buf.put_u8(size as u8);
        buf.put_u8((timestamp >> 16) as u8);
        buf.put_u8((timestamp >> 8) as u8);
        buf.put_u8(timestamp as u8);
        buf.put_u8((timestamp >> 24) as u8);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_slice(payload);
        buf.put_u32(TAG_HEADER_LEN as u32 + size);
    }

    #[test]
    fn disaggregates_audio_then_video_tag() {
        let mut buf = BytesMut::new();
        push_tag(&mut buf, TAG_TYPE_AUDIO, 10, &[0xAF, 0x01, 0xFF]);
        push_tag(&mut buf, TAG_TYPE_VIDEO, 0x0100_0010, &[0x27, 0x01]);

        let tags = disaggregate(buf.freeze()).unwrap();

        assert_eq!(
            tags,
            vec![
                AggregateTag::Audio {
                    timestamp: 10,
                    data: Bytes::from_static(&[0xAF, 0x01, 0xFF]),
                },
                AggregateTag::Video {
                    timestamp: 0x0100_0010,
                    data: Bytes::from_static(&[0x27, 0x01]),
                },
            ]
        );
    }

    #[test]
    fn unknown_tag_types_are_skipped() {
        let mut buf = BytesMut::new();
        push_tag(&mut buf, 0xFF, 0, &[1, 2, 3]);
        push_tag(&mut buf, TAG_TYPE_DATA_AMF0, 5, &[9]);

        let tags = disaggregate(buf.freeze()).unwrap();

        assert_eq!(tags, vec![AggregateTag::DataAmf0 { timestamp: 5, data: Bytes::from_static(&[9]) }]);
    }

    #[test]
    fn truncated_tag_header_is_an_error() {
        let err = disaggregate(Bytes::from_static(&[0, 0, 0])).unwrap_err();
        assert!(matches!(err, MessageError::TruncatedAggregateTag));
    }
}
