use marquee_core::FetchResponse;

/// Which responses a rule may store.
///
/// Opaque cross-origin responses report status 0; they are only stored when
/// the rule opts in with [`with_opaque`](Self::with_opaque).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheableResponse {
    statuses: Vec<u16>,
}

impl Default for CacheableResponse {
    fn default() -> Self {
        Self {
            statuses: vec![200],
        }
    }
}

impl CacheableResponse {
    /// Stores responses with exactly these status codes.
    pub fn statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        let mut statuses: Vec<u16> = statuses.into_iter().collect();
        statuses.sort_unstable();
        statuses.dedup();
        Self { statuses }
    }

    /// Also stores opaque responses.
    pub fn with_opaque(mut self) -> Self {
        if let Err(at) = self.statuses.binary_search(&0) {
            self.statuses.insert(at, 0);
        }
        self
    }

    pub fn accepts(&self, response: &FetchResponse) -> bool {
        self.statuses.binary_search(&response.status_code()).is_ok()
    }
}
