use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use marquee_backend::{DeleteStatus, KeyValueStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{HomepageSnapshot, ManifestSnapshot, Purpose, Role, Tier, resolve_tier};

/// Settings of the [`StorageSelector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Prefix of every foreground storage key.
    pub prefix: SmolStr,
    /// Saved values older than this load as a miss (e.g. "1d").
    #[serde(with = "humantime_serde")]
    pub snapshot_max_age: Option<Duration>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            prefix: SmolStr::new_static("marquee"),
            snapshot_max_age: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}

/// What [`StorageSelector::on_session_boundary`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOutcome {
    /// First boundary of the session for an unprivileged caller: marker
    /// written, persistent tier purged.
    Purged,
    /// First boundary of the session for a privileged caller: marker written.
    Marked,
    /// The session already ran invalidation.
    AlreadyChecked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionGate {
    Unchecked,
    Checked,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    saved_at: DateTime<Utc>,
    value: T,
}

/// Picks the storage tier per caller role and runs session invalidation.
///
/// Reads and writes are only reachable through the [`SessionScope`] returned
/// by [`on_session_boundary`](Self::on_session_boundary), so nothing touches
/// a tier before the role is known and invalidation ran.
pub struct StorageSelector {
    ephemeral: Arc<dyn KeyValueStore>,
    persistent: Arc<dyn KeyValueStore>,
    config: SelectorConfig,
    gate: Mutex<SessionGate>,
}

impl StorageSelector {
    pub fn new<E, P>(ephemeral: E, persistent: P) -> Self
    where
        E: KeyValueStore + 'static,
        P: KeyValueStore + 'static,
    {
        Self {
            ephemeral: Arc::new(ephemeral),
            persistent: Arc::new(persistent),
            config: SelectorConfig::default(),
            gate: Mutex::new(SessionGate::Unchecked),
        }
    }

    pub fn with_config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Ephemeral key holding the session marker.
    pub fn marker_key(&self) -> String {
        format!("{}:session-id", self.config.prefix)
    }

    /// Physical key of `purpose` for `role`.
    pub fn key(&self, role: Role, purpose: Purpose) -> String {
        physical_key(&self.config.prefix, role, purpose)
    }

    fn store(&self, tier: Tier) -> &Arc<dyn KeyValueStore> {
        match tier {
            Tier::Ephemeral => &self.ephemeral,
            Tier::Persistent => &self.persistent,
        }
    }

    /// Runs session invalidation once the caller's role is known.
    ///
    /// The first call of a browser session writes the marker and, for an
    /// unprivileged caller, purges the persistent tier. Later calls only
    /// hand out the scope.
    pub async fn on_session_boundary(&self, role: Role) -> SessionScope {
        let mut gate = self.gate.lock().await;
        let outcome = match *gate {
            SessionGate::Checked => BoundaryOutcome::AlreadyChecked,
            SessionGate::Unchecked => {
                let outcome = self.check_marker(role).await;
                *gate = SessionGate::Checked;
                outcome
            }
        };
        drop(gate);
        debug!(%role, ?outcome, "session boundary");

        let tier = resolve_tier(role);
        SessionScope {
            role,
            tier,
            prefix: self.config.prefix.clone(),
            max_age: self.config.snapshot_max_age,
            store: Arc::clone(self.store(tier)),
            outcome,
        }
    }

    async fn check_marker(&self, role: Role) -> BoundaryOutcome {
        let marker_key = self.marker_key();
        let marker = match self.ephemeral.get(&marker_key).await {
            Ok(marker) => marker,
            Err(error) => {
                warn!(key = %marker_key, %error, "reading session marker failed");
                None
            }
        };
        if marker.is_some() {
            return BoundaryOutcome::AlreadyChecked;
        }
        if let Err(error) = self
            .ephemeral
            .set(&marker_key, Utc::now().to_rfc3339())
            .await
        {
            warn!(key = %marker_key, %error, "writing session marker failed");
        }
        match role {
            Role::Admin => BoundaryOutcome::Marked,
            Role::User => {
                self.purge_persistent().await;
                BoundaryOutcome::Purged
            }
        }
    }

    /// Deletes the session marker and purges the persistent tier now.
    ///
    /// The next [`on_session_boundary`](Self::on_session_boundary) runs
    /// invalidation again.
    pub async fn force_cache_refresh(&self) {
        let mut gate = self.gate.lock().await;
        let marker_key = self.marker_key();
        if let Err(error) = self.ephemeral.remove(&marker_key).await {
            warn!(key = %marker_key, %error, "deleting session marker failed");
        }
        self.purge_persistent().await;
        *gate = SessionGate::Unchecked;
        info!("forced cache refresh");
    }

    async fn purge_persistent(&self) {
        let mut purged = 0;
        for purpose in Purpose::ALL {
            let key = self.key(Role::User, purpose);
            match self.persistent.remove(&key).await {
                Ok(DeleteStatus::Deleted(_)) => purged += 1,
                Ok(DeleteStatus::Missing) => {}
                Err(error) => warn!(%key, %error, "purging persistent key failed"),
            }
        }
        debug!(purged, store = %self.persistent.label(), "persistent tier purged");
    }
}

fn physical_key(prefix: &str, role: Role, purpose: Purpose) -> String {
    format!("{prefix}:{}:{}", role.as_str(), purpose.as_str())
}

/// Storage access for one role after the session boundary.
///
/// Every failure is logged and reported as a miss (`None` / `false`).
#[derive(Clone)]
pub struct SessionScope {
    role: Role,
    tier: Tier,
    prefix: SmolStr,
    max_age: Option<Duration>,
    store: Arc<dyn KeyValueStore>,
    outcome: BoundaryOutcome,
}

impl SessionScope {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// What the boundary did when this scope was handed out.
    pub fn outcome(&self) -> BoundaryOutcome {
        self.outcome
    }

    pub fn key(&self, purpose: Purpose) -> String {
        physical_key(&self.prefix, self.role, purpose)
    }

    /// Loads the value saved for `purpose`, if present, readable and not too old.
    pub async fn load<T: DeserializeOwned>(&self, purpose: Purpose) -> Option<T> {
        let key = self.key(purpose);
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(%key, %error, "tier read failed");
                return None;
            }
        };
        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(%key, %error, "stored value does not decode");
                return None;
            }
        };
        if let Some(max_age) = self.max_age {
            let age = (Utc::now() - envelope.saved_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if age > max_age {
                debug!(%key, age_secs = age.as_secs(), "stored value too old");
                if let Err(error) = self.store.remove(&key).await {
                    warn!(%key, %error, "removing stale value failed");
                }
                return None;
            }
        }
        Some(envelope.value)
    }

    /// Replaces the value saved for `purpose`. Returns `false` on failure.
    pub async fn save<T: Serialize + Sync>(&self, purpose: Purpose, value: &T) -> bool {
        let key = self.key(purpose);
        let raw = match serde_json::to_string(&Envelope {
            saved_at: Utc::now(),
            value,
        }) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%key, %error, "value does not encode");
                return false;
            }
        };
        match self.store.set(&key, raw).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%key, %error, "tier write failed");
                false
            }
        }
    }

    /// Deletes the value saved for `purpose`.
    pub async fn clear(&self, purpose: Purpose) -> bool {
        let key = self.key(purpose);
        match self.store.remove(&key).await {
            Ok(_) => true,
            Err(error) => {
                warn!(%key, %error, "tier delete failed");
                false
            }
        }
    }

    pub async fn load_homepage(&self) -> Option<HomepageSnapshot> {
        self.load(Purpose::HomepageSnapshot).await
    }

    pub async fn save_homepage(&self, snapshot: &HomepageSnapshot) -> bool {
        self.save(Purpose::HomepageSnapshot, snapshot).await
    }

    pub async fn load_manifest(&self) -> Option<ManifestSnapshot> {
        self.load(Purpose::Manifest).await
    }

    pub async fn save_manifest(&self, snapshot: &ManifestSnapshot) -> bool {
        self.save(Purpose::Manifest, snapshot).await
    }
}

impl std::fmt::Debug for SessionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionScope")
            .field("role", &self.role)
            .field("tier", &self.tier)
            .field("store", &self.store.label())
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use marquee_moka::MokaStore;

    use super::*;

    fn selector() -> (StorageSelector, Arc<MokaStore>, Arc<MokaStore>) {
        let ephemeral = Arc::new(MokaStore::new(100));
        let persistent = Arc::new(MokaStore::new(100).with_label("local"));
        let selector = StorageSelector::new(ephemeral.clone(), persistent.clone());
        (selector, ephemeral, persistent)
    }

    #[tokio::test]
    async fn physical_keys() {
        let (selector, _, _) = selector();
        assert_eq!(selector.marker_key(), "marquee:session-id");
        assert_eq!(selector.key(Role::User, Purpose::HomepageSnapshot), "marquee:user:homepage");
        assert_eq!(selector.key(Role::Admin, Purpose::Manifest), "marquee:admin:manifest");
    }

    #[tokio::test]
    async fn stale_values_load_as_miss() {
        let (selector, _, persistent) = selector();
        let scope = selector.on_session_boundary(Role::User).await;
        let old = serde_json::to_string(&Envelope {
            saved_at: Utc::now() - TimeDelta::days(2),
            value: ManifestSnapshot::now(),
        })
        .unwrap();
        persistent.set("marquee:user:manifest", old).await.unwrap();

        assert!(scope.load_manifest().await.is_none());
        assert!(persistent.get("marquee:user:manifest").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_is_a_miss() {
        let (selector, _, persistent) = selector();
        let scope = selector.on_session_boundary(Role::User).await;
        persistent
            .set("marquee:user:homepage", "{not json".to_owned())
            .await
            .unwrap();
        assert!(scope.load_homepage().await.is_none());
    }
}
