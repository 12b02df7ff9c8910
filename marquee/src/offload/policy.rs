use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time budget of one background task.
///
/// Written in YAML as `{ mode: none }`, `{ mode: cancel, after: 30s }` or
/// `{ mode: warn, after: 10s }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Tasks run to completion.
    #[default]
    None,
    /// A revalidation or priority fetch still running after `after` is
    /// abandoned. Whatever it already stored stays stored.
    Cancel {
        #[serde(with = "humantime_serde")]
        after: Duration,
    },
    /// Overrunning tasks are logged and left running.
    Warn {
        #[serde(with = "humantime_serde")]
        after: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_reads_human_durations() {
        let policy: TimeoutPolicy =
            serde_json::from_str(r#"{"mode":"cancel","after":"30s"}"#).unwrap();
        assert_eq!(
            policy,
            TimeoutPolicy::Cancel {
                after: Duration::from_secs(30)
            }
        );
        let policy: TimeoutPolicy = serde_json::from_str(r#"{"mode":"none"}"#).unwrap();
        assert_eq!(policy, TimeoutPolicy::None);
    }
}
