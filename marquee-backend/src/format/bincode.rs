use marquee_core::CachedResponse;

use super::{Format, FormatError, StoredEntry};

/// Compact binary format, the default for on-disk backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeFormat;

impl Format for BincodeFormat {
    fn encode(&self, value: &CachedResponse) -> Result<Vec<u8>, FormatError> {
        let entry = StoredEntry::from(value);
        ::bincode::serde::encode_to_vec(&entry, ::bincode::config::standard())
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn decode(&self, data: &[u8]) -> Result<CachedResponse, FormatError> {
        let (entry, _): (StoredEntry, usize) =
            ::bincode::serde::decode_from_slice(data, ::bincode::config::standard())
                .map_err(|err| FormatError::Deserialize(Box::new(err)))?;
        CachedResponse::try_from(entry)
    }
}
