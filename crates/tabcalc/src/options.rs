//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lifetime of a cached formula result
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Options for a [`FormulaEngine`](crate::FormulaEngine)
///
/// Deserializable so hosts can embed it in their own configuration file;
/// every field falls back to its default when absent.
///
/// ```
/// use std::time::Duration;
/// use tabcalc::EngineOptions;
///
/// let options: EngineOptions = serde_json::from_str(r#"{"cache_ttl_secs": 60}"#).unwrap();
/// assert_eq!(options.cache_ttl, Duration::from_secs(60));
/// assert!(options.cache_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// How long a computed value stays valid in the cache
    #[serde(rename = "cache_ttl_secs", with = "duration_secs")]
    pub cache_ttl: Duration,
    /// Consult and fill the result cache (default: true)
    pub cache_enabled: bool,
    /// Append a calculation history record after each write (default: true)
    pub record_history: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_enabled: true,
            record_history: true,
        }
    }
}

impl EngineOptions {
    /// Set the cache TTL (builder style)
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Disable the result cache (builder style)
    pub fn without_cache(mut self) -> Self {
        self.cache_enabled = false;
        self
    }

    /// Disable calculation history (builder style)
    pub fn without_history(mut self) -> Self {
        self.record_history = false;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = EngineOptions::default();
        assert_eq!(options.cache_ttl, Duration::from_secs(300));
        assert!(options.cache_enabled);
        assert!(options.record_history);

        let parsed: EngineOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_parse_all_fields() {
        let options: EngineOptions = serde_json::from_str(
            r#"{"cache_ttl_secs": 5, "cache_enabled": false, "record_history": false}"#,
        )
        .unwrap();
        assert_eq!(
            options,
            EngineOptions::default()
                .with_cache_ttl(Duration::from_secs(5))
                .without_cache()
                .without_history()
        );
    }

    #[test]
    fn test_serialize_uses_seconds() {
        let json = serde_json::to_value(EngineOptions::default()).unwrap();
        assert_eq!(json["cache_ttl_secs"], 300);
    }
}
