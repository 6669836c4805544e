//! Serializable retry settings.

use std::time::Duration;

/// Attempt count and backoff schedule, detached from any classifier.
///
/// Useful for loading retry settings from configuration files and applying
/// them to a policy with [`RetryPolicy::apply`](crate::RetryPolicy::apply).
/// With the `serde` feature, intervals are encoded as whole milliseconds under
/// the key `intervals_ms`.
///
/// # Examples
///
/// ```rust
/// use steadfast::PolicyConfig;
/// use std::time::Duration;
///
/// let config = PolicyConfig::default();
/// assert_eq!(config.max_attempts, 1);
/// assert_eq!(config.intervals, vec![Duration::from_secs(1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PolicyConfig {
    /// Maximum number of attempts. Zero is treated as one.
    pub max_attempts: u32,
    /// Backoff schedule. An empty list keeps the policy's current schedule.
    #[cfg_attr(feature = "serde", serde(rename = "intervals_ms", with = "millis"))]
    pub intervals: Vec<Duration>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            intervals: vec![Duration::from_secs(1)],
        }
    }
}

#[cfg(feature = "serde")]
mod millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delays: &[Duration], serializer: S) -> Result<S::Ok, S::Error> {
        let millis: Vec<u64> = delays
            .iter()
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Duration>, D::Error> {
        let millis = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis.into_iter().map(Duration::from_millis).collect())
    }
}
