//! Session-scoped storage tiers for the foreground.
//!
//! Privileged callers keep their data in the ephemeral tier, everybody else
//! in the persistent one. The first boundary of a browser session purges the
//! persistent tier for unprivileged callers so a new session never sees the
//! previous session's snapshots.

mod selector;
mod snapshot;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use selector::{BoundaryOutcome, SelectorConfig, SessionScope, StorageSelector};
pub use snapshot::{HomepageSnapshot, ManifestSnapshot, MediaSummary, MediaType};

/// Caller role, as reported by authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Privileged caller.
    Admin,
    /// Everybody else.
    User,
}

impl Role {
    /// Convenience for authentication's "is this caller privileged".
    pub fn from_privileged(privileged: bool) -> Self {
        if privileged { Self::Admin } else { Self::User }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Foreground storage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Cleared when the browser session ends.
    Ephemeral,
    /// Survives browser restarts.
    Persistent,
}

/// What a stored value is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Route to asset URL manifest.
    Manifest,
    /// Last rendered homepage sections.
    HomepageSnapshot,
}

impl Purpose {
    /// Every purpose, in purge order.
    pub const ALL: [Purpose; 2] = [Purpose::Manifest, Purpose::HomepageSnapshot];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::HomepageSnapshot => "homepage",
        }
    }
}

/// The tier a role reads and writes.
pub fn resolve_tier(role: Role) -> Tier {
    match role {
        Role::Admin => Tier::Ephemeral,
        Role::User => Tier::Persistent,
    }
}
