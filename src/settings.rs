// ============================================================================
// SETTINGS DOCUMENTS — JSON persistence of the filter configuration
// ============================================================================
//
// Document shape (one top-level key per *enabled* filter):
//
//   {
//     "rgbShift": { "enabled": true, "redOffset": 12.0, ... },
//     "glitchText": {
//       "enabled": true, "amount": 50.0, ...,
//       "textTypes":  { "404": true, "error": false, "sad": false },
//       "colorTypes": { "white": true, "black": false, "blue": false }
//     }
//   }
//
// Loading re-derives full catalog defaults first, then overlays only the
// keys present in the document. Unknown top-level keys are ignored, unknown
// keys inside a filter record are ignored, and a malformed document leaves
// the caller's current state untouched.
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::catalog::FilterId;
use crate::log_warn;
use crate::state::{EffectState, EffectStates};

/// Error type for settings document operations.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidDocument(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "I/O error: {}", e),
            SettingsError::Parse(e) => write!(f, "JSON parse error: {}", e),
            SettingsError::InvalidDocument(e) => write!(f, "Invalid settings document: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Serialization wrapper producing the document shape: one top-level entry
/// per enabled filter.
struct Document<'a>(&'a EffectStates);

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for id in FilterId::ALL {
            let st = self.0.get(id);
            if st.enabled {
                map.serialize_entry(id.as_str(), &Record(st))?;
            }
        }
        map.end()
    }
}

/// One filter record: the enabled flag plus every declared parameter key,
/// with category flags nested under `textTypes` / `colorTypes`.
struct Record<'a>(&'a EffectState);

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let st = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("enabled", &st.enabled)?;
        for (key, value) in st.scalar_entries() {
            map.serialize_entry(key, &value)?;
        }
        for (key, value) in st.toggle_entries() {
            map.serialize_entry(key, &value)?;
        }
        if !st.definition().text_types.is_empty() {
            let flags: Map<String, Value> = st
                .text_type_entries()
                .map(|(key, value)| (key.to_string(), Value::Bool(value)))
                .collect();
            map.serialize_entry("textTypes", &flags)?;
        }
        if !st.definition().color_types.is_empty() {
            let flags: Map<String, Value> = st
                .color_type_entries()
                .map(|(key, value)| (key.to_string(), Value::Bool(value)))
                .collect();
            map.serialize_entry("colorTypes", &flags)?;
        }
        map.end()
    }
}

/// Build the settings document for the given state snapshot.
/// Only enabled filters are included; each included record carries the
/// enabled flag plus every declared parameter key.
pub fn to_document(states: &EffectStates) -> Value {
    // Infallible: string keys, finite floats, bools.
    serde_json::to_value(Document(states)).expect("settings document serialization")
}

/// Rebuild a full state snapshot from a settings document: fresh catalog
/// defaults, overlaid with the keys the document provides.
pub fn from_document(doc: &Value) -> Result<EffectStates, SettingsError> {
    let top = doc
        .as_object()
        .ok_or_else(|| SettingsError::InvalidDocument("top level is not an object".to_string()))?;

    let mut states = EffectStates::defaults();
    for (key, entry) in top {
        let Some(id) = FilterId::from_str(key) else {
            log_warn!("settings: ignoring unknown filter '{}'", key);
            continue;
        };
        let Some(record) = entry.as_object() else {
            log_warn!("settings: entry for '{}' is not an object, skipping", key);
            continue;
        };
        overlay_record(&mut states, id, record);
    }
    Ok(states)
}

/// Overlay one filter record onto the snapshot. Only keys the catalog
/// declares for this filter are honored.
fn overlay_record(states: &mut EffectStates, id: FilterId, record: &Map<String, Value>) {
    let st = states.get_mut(id);

    if let Some(enabled) = record.get("enabled").and_then(Value::as_bool) {
        st.enabled = enabled;
    }

    for (key, value) in record {
        match key.as_str() {
            "enabled" => {}
            "textTypes" => {
                if let Some(flags) = value.as_object() {
                    for (flag, v) in flags {
                        if let Some(b) = v.as_bool() {
                            st.set_text_type(flag, b);
                        }
                    }
                }
            }
            "colorTypes" => {
                if let Some(flags) = value.as_object() {
                    for (flag, v) in flags {
                        if let Some(b) = v.as_bool() {
                            st.set_color_type(flag, b);
                        }
                    }
                }
            }
            _ => {
                if let Some(n) = value.as_f64() {
                    st.set_scalar(key, n as f32);
                } else if let Some(b) = value.as_bool() {
                    st.set_toggle(key, b);
                }
            }
        }
    }
}

/// Serialize the snapshot and write it to `path` as pretty-printed JSON.
pub fn save_settings(states: &EffectStates, path: &Path) -> Result<(), SettingsError> {
    let text = serde_json::to_string_pretty(&Document(states))?;
    fs::write(path, text)?;
    Ok(())
}

/// Read and parse a settings document. On any error the current state is
/// untouched — the caller only swaps in the returned snapshot on `Ok`.
pub fn load_settings(path: &Path) -> Result<EffectStates, SettingsError> {
    let text = fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&text)?;
    from_document(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterId;

    fn sample_states() -> EffectStates {
        let mut states = EffectStates::defaults();
        states.set_enabled(FilterId::RgbShift, true);
        states.get_mut(FilterId::RgbShift).set_scalar("redOffset", 17.0);
        states.set_enabled(FilterId::GlitchText, true);
        {
            let st = states.get_mut(FilterId::GlitchText);
            st.set_scalar("amount", 12.0);
            st.set_text_type("error", true);
            st.set_color_type("black", true);
        }
        states.get_mut(FilterId::Scanlines).set_toggle("radial", true); // disabled — must not be saved
        states
    }

    #[test]
    fn document_contains_only_enabled_filters() {
        let doc = to_document(&sample_states());
        let top = doc.as_object().unwrap();
        assert_eq!(top.len(), 2);
        assert!(top.contains_key("rgbShift"));
        assert!(top.contains_key("glitchText"));
        assert!(!top.contains_key("scanlines"));
    }

    #[test]
    fn records_carry_every_declared_key() {
        let doc = to_document(&sample_states());
        let record = doc["glitchText"].as_object().unwrap();
        assert_eq!(record["enabled"], Value::Bool(true));
        for key in ["amount", "size", "opacity", "rotation"] {
            assert!(record[key].is_number(), "missing scalar {}", key);
        }
        let text = record["textTypes"].as_object().unwrap();
        assert_eq!(text.len(), 3);
        assert_eq!(text["error"], Value::Bool(true));
        assert_eq!(text["404"], Value::Bool(false));
    }

    #[test]
    fn round_trip_reproduces_enabled_set_and_values() {
        let original = sample_states();
        let restored = from_document(&to_document(&original)).unwrap();

        assert_eq!(original.enabled_ids(), restored.enabled_ids());
        for id in original.enabled_ids() {
            let a = original.get(id);
            let b = restored.get(id);
            for (key, value) in a.scalar_entries() {
                assert_eq!(value, b.scalar(key), "{}.{}", id.as_str(), key);
            }
            for (key, value) in a.toggle_entries() {
                assert_eq!(value, b.toggle(key));
            }
            for (key, value) in a.text_type_entries() {
                assert_eq!(value, b.text_type(key));
            }
            for (key, value) in a.color_type_entries() {
                assert_eq!(value, b.color_type(key));
            }
        }
    }

    #[test]
    fn absent_filters_revert_to_defaults() {
        let restored = from_document(&to_document(&sample_states())).unwrap();
        // Scanlines was never saved (disabled), so its toggle is back to false.
        let st = restored.get(FilterId::Scanlines);
        assert!(!st.enabled);
        assert!(!st.toggle("radial"));
        assert_eq!(st.scalar("spacing"), 25.5);
    }

    #[test]
    fn unknown_top_level_keys_are_ignored() {
        let doc: Value = serde_json::from_str(
            r#"{ "notAFilter": { "enabled": true }, "monochrome": { "enabled": true } }"#,
        )
        .unwrap();
        let states = from_document(&doc).unwrap();
        assert_eq!(states.enabled_ids(), vec![FilterId::Monochrome]);
    }

    #[test]
    fn unknown_keys_inside_a_record_are_ignored() {
        let doc: Value = serde_json::from_str(
            r#"{ "posterize": { "enabled": true, "intensity": 4.0, "bogus": 99 } }"#,
        )
        .unwrap();
        let states = from_document(&doc).unwrap();
        let st = states.get(FilterId::Posterize);
        assert!(st.enabled);
        assert_eq!(st.scalar("intensity"), 4.0);
        assert_eq!(st.scalar("bogus"), 0.0);
    }

    #[test]
    fn partial_records_keep_defaults_for_missing_keys() {
        let doc: Value = serde_json::from_str(r#"{ "noise": { "enabled": true } }"#).unwrap();
        let states = from_document(&doc).unwrap();
        let st = states.get(FilterId::Noise);
        assert!(st.enabled);
        assert_eq!(st.scalar("amount"), 0.5);
        assert_eq!(st.scalar("size"), 5.5);
    }

    #[test]
    fn non_object_document_is_an_invalid_document() {
        let doc: Value = serde_json::from_str("[1, 2, 3]").unwrap();
        assert!(matches!(from_document(&doc), Err(SettingsError::InvalidDocument(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = std::env::temp_dir().join("glitchlab-settings-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_settings(&path), Err(SettingsError::Parse(_))));
    }
}
