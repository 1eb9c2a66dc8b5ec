use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::define;
use super::define::SchemaVersion;
use super::errors::DigestError;

/// Computes and validates the HMAC-SHA256 digest embedded in the complex handshake.
pub struct DigestProcessor {
    data: Bytes,
    key: Bytes,
}

impl DigestProcessor {
    pub fn new(data: Bytes, key: impl Into<Bytes>) -> Self {
        Self { data, key: key.into() }
    }

    /// Reads the digest out of `self.data`, trying both schema layouts.
    ///
    /// Schema 0 is tried first; if validation fails we fall back to schema 1.
    pub fn read_digest(&self) -> Result<(Bytes, SchemaVersion), DigestError> {
        if let Ok(digest) = self.generate_and_validate(SchemaVersion::Schema0) {
            Ok((digest, SchemaVersion::Schema0))
        } else {
            let digest = self.generate_and_validate(SchemaVersion::Schema1)?;
            Ok((digest, SchemaVersion::Schema1))
        }
    }

    /// Generates a digest for `self.data` under the given schema and returns the
    /// message split around it: `(before, digest, after)`.
    pub fn generate_and_fill_digest(&self, version: SchemaVersion) -> Result<(Bytes, Bytes, Bytes), DigestError> {
        let (left_part, _, right_part) = self.cook_raw_message(version)?;
        let computed_digest = self.make_digest(&left_part, &right_part)?;

        Ok((left_part, computed_digest, right_part))
    }

    fn find_digest_offset(&self, version: SchemaVersion) -> Result<usize, DigestError> {
        const OFFSET_LENGTH: usize = 4;

        let schema_offset = match version {
            SchemaVersion::Schema0 => define::CHUNK_LENGTH + define::TIME_VERSION_LENGTH,
            SchemaVersion::Schema1 => define::TIME_VERSION_LENGTH,
        };

        let byte_at = |offset: usize| -> Result<usize, DigestError> {
            self.data.get(offset).copied().map(usize::from).ok_or(DigestError::NotEnoughData)
        };

        Ok((byte_at(schema_offset)? + byte_at(schema_offset + 1)? + byte_at(schema_offset + 2)? + byte_at(schema_offset + 3)?)
            % (define::CHUNK_LENGTH - define::RTMP_DIGEST_LENGTH - OFFSET_LENGTH)
            + schema_offset
            + OFFSET_LENGTH)
    }

    fn cook_raw_message(&self, version: SchemaVersion) -> Result<(Bytes, Bytes, Bytes), DigestError> {
        let digest_offset = self.find_digest_offset(version)?;

        if self.data.len() < digest_offset + define::RTMP_DIGEST_LENGTH {
            return Err(DigestError::NotEnoughData);
        }

        let left_part = self.data.slice(0..digest_offset);
        let digest_data = self.data.slice(digest_offset..digest_offset + define::RTMP_DIGEST_LENGTH);
        let right_part = self.data.slice(digest_offset + define::RTMP_DIGEST_LENGTH..);

        Ok((left_part, digest_data, right_part))
    }

    /// Computes `HMAC-SHA256(key, left || right)`.
    pub fn make_digest(&self, left: &[u8], right: &[u8]) -> Result<Bytes, DigestError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key[..]).map_err(|_| DigestError::CannotGenerate)?;
        mac.update(left);
        mac.update(right);

        let result = mac.finalize().into_bytes();
        if result.len() != define::RTMP_DIGEST_LENGTH {
            return Err(DigestError::DigestLengthNotCorrect);
        }

        Ok(result.to_vec().into())
    }

    fn generate_and_validate(&self, version: SchemaVersion) -> Result<Bytes, DigestError> {
        let (left_part, digest_data, right_part) = self.cook_raw_message(version)?;

        if digest_data == self.make_digest(&left_part, &right_part)? {
            Ok(digest_data)
        } else {
            Err(DigestError::CannotGenerate)
        }
    }
}
