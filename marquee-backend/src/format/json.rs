use marquee_core::CachedResponse;

use super::{Format, FormatError, StoredEntry};

/// Human-readable format, handy when inspecting a store by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn encode(&self, value: &CachedResponse) -> Result<Vec<u8>, FormatError> {
        serde_json::to_vec(&StoredEntry::from(value))
            .map_err(|err| FormatError::Serialize(Box::new(err)))
    }

    fn decode(&self, data: &[u8]) -> Result<CachedResponse, FormatError> {
        let entry: StoredEntry =
            serde_json::from_slice(data).map_err(|err| FormatError::Deserialize(Box::new(err)))?;
        CachedResponse::try_from(entry)
    }
}
