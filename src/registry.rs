//! Action registries mapping short action names to IFTTT webhook events
//!
//! Two structurally identical registries exist per process (home scenes and
//! EV/UAV mobility actions); they are separate namespaces and are never
//! merged. Both are loaded once from config and read-only for the process
//! lifetime.
//!
//! Resolution is order-dependent: the fuzzy fallback returns the first
//! matching entry in config-document order, so entries are kept in an
//! insertion-ordered `Vec` rather than a hash map.

use serde::de::{Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Result of resolving a user-supplied action name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An entry matched, exactly or via the fuzzy fallback
    Matched { key: String, event: String },
    /// The registry has no entries at all
    RegistryEmpty,
    /// No entry matched; carries the configured keys (sorted, for display)
    NotFound { available: Vec<String> },
}

/// An insertion-ordered mapping of action name to webhook event name
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    entries: Vec<(String, String)>,
}

impl ActionRegistry {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry keys sorted alphabetically, for listings and error messages
    pub fn keys_sorted(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.iter().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    /// Entries sorted by key, for listings
    pub fn entries_sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries
    }

    /// Resolve a raw user-supplied name to a registry entry
    ///
    /// Three tiers, in priority order:
    /// 1. exact lookup of the normalized (trimmed, lowercased) name;
    /// 2. fuzzy fallback: first entry, in insertion order, whose key contains
    ///    the name or is contained by it (either direction counts);
    /// 3. otherwise [`Resolution::RegistryEmpty`] or
    ///    [`Resolution::NotFound`].
    pub fn resolve(&self, raw: &str) -> Resolution {
        let probe = raw.trim().to_lowercase();

        for (key, event) in &self.entries {
            if key.to_lowercase() == probe {
                return Resolution::Matched {
                    key: key.clone(),
                    event: event.clone(),
                };
            }
        }

        // Fuzzy fallback: first hit in insertion order wins
        for (key, event) in &self.entries {
            let key_lower = key.to_lowercase();
            if key_lower.contains(&probe) || probe.contains(&key_lower) {
                return Resolution::Matched {
                    key: key.clone(),
                    event: event.clone(),
                };
            }
        }

        if self.entries.is_empty() {
            Resolution::RegistryEmpty
        } else {
            Resolution::NotFound {
                available: self.keys_sorted().iter().map(|k| k.to_string()).collect(),
            }
        }
    }
}

/// Deserializes from a JSON map, preserving document key order. Non-string
/// mapping values are skipped; any non-map shape degrades to an empty
/// registry rather than failing the whole config.
impl<'de> Deserialize<'de> for ActionRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = ActionRegistry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of action name to webhook event name")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    match map.next_value::<Value>()? {
                        Value::String(event) => entries.push((key, event)),
                        _ => {}
                    }
                }
                Ok(ActionRegistry { entries })
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(ActionRegistry::default())
            }

            fn visit_str<E: serde::de::Error>(self, _: &str) -> Result<Self::Value, E> {
                Ok(ActionRegistry::default())
            }

            fn visit_bool<E: serde::de::Error>(self, _: bool) -> Result<Self::Value, E> {
                Ok(ActionRegistry::default())
            }

            fn visit_i64<E: serde::de::Error>(self, _: i64) -> Result<Self::Value, E> {
                Ok(ActionRegistry::default())
            }

            fn visit_u64<E: serde::de::Error>(self, _: u64) -> Result<Self::Value, E> {
                Ok(ActionRegistry::default())
            }

            fn visit_f64<E: serde::de::Error>(self, _: f64) -> Result<Self::Value, E> {
                Ok(ActionRegistry::default())
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ActionRegistry::default())
            }
        }

        deserializer.deserialize_any(RegistryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mobility_registry() -> ActionRegistry {
        ActionRegistry::from_entries([
            ("start_ev_charging_home", "aerovolt_start_ev_charging_home"),
            ("ev_off_peak_schedule", "aerovolt_ev_off_peak_schedule"),
            ("uav_patrol_yard", "aerovolt_uav_patrol_yard"),
        ])
    }

    #[test]
    fn test_exact_match() {
        let resolution = mobility_registry().resolve("uav_patrol_yard");
        assert_eq!(
            resolution,
            Resolution::Matched {
                key: "uav_patrol_yard".into(),
                event: "aerovolt_uav_patrol_yard".into(),
            }
        );
    }

    #[test]
    fn test_exact_match_normalizes_case_and_whitespace() {
        let resolution = mobility_registry().resolve("  UAV_Patrol_Yard \n");
        assert!(matches!(
            resolution,
            Resolution::Matched { key, .. } if key == "uav_patrol_yard"
        ));
    }

    #[test]
    fn test_exact_match_beats_fuzzy() {
        // "ev" would fuzzy-match the first entry, but a verbatim key wins
        let registry = ActionRegistry::from_entries([
            ("start_ev_charging_home", "event_a"),
            ("ev", "event_b"),
        ]);
        assert_eq!(
            registry.resolve("ev"),
            Resolution::Matched {
                key: "ev".into(),
                event: "event_b".into(),
            }
        );
    }

    #[test]
    fn test_fuzzy_first_hit_wins() {
        // Both keys contain "ev"; insertion order decides, not alphabetical
        let resolution = mobility_registry().resolve("ev");
        assert_eq!(
            resolution,
            Resolution::Matched {
                key: "start_ev_charging_home".into(),
                event: "aerovolt_start_ev_charging_home".into(),
            }
        );
    }

    #[test]
    fn test_fuzzy_matches_either_direction() {
        // Probe contains the key
        let registry = ActionRegistry::from_entries([("patrol", "event_patrol")]);
        assert!(matches!(
            registry.resolve("uav_patrol_yard"),
            Resolution::Matched { key, .. } if key == "patrol"
        ));

        // Key contains the probe
        assert!(matches!(
            registry.resolve("atro"),
            Resolution::Matched { key, .. } if key == "patrol"
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ActionRegistry::default();
        assert_eq!(registry.resolve("anything"), Resolution::RegistryEmpty);
    }

    #[test]
    fn test_not_found_lists_available_keys_sorted() {
        let resolution = mobility_registry().resolve("xyz");
        assert_eq!(
            resolution,
            Resolution::NotFound {
                available: vec![
                    "ev_off_peak_schedule".into(),
                    "start_ev_charging_home".into(),
                    "uav_patrol_yard".into(),
                ],
            }
        );
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let registry: ActionRegistry = serde_json::from_str(
            r#"{
                "start_ev_charging_home": "event_a",
                "ev_off_peak_schedule": "event_b"
            }"#,
        )
        .expect("valid registry");

        assert!(matches!(
            registry.resolve("ev"),
            Resolution::Matched { key, .. } if key == "start_ev_charging_home"
        ));
    }

    #[test]
    fn test_deserialize_skips_non_string_values() {
        let registry: ActionRegistry =
            serde_json::from_str(r#"{"study": "event_study", "broken": 42}"#)
                .expect("valid registry");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deserialize_degrades_on_wrong_shape() {
        for doc in [r#"["a", "b"]"#, r#""scenes""#, "7", "null", "true"] {
            let registry: ActionRegistry =
                serde_json::from_str(doc).expect("should degrade, not fail");
            assert!(registry.is_empty());
        }
    }
}
