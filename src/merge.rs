//! Overlay merging for decoded configuration trees.
//!
//! Field-by-field at the top level only: a setting present in the overlay
//! replaces the base setting wholesale, including nested mappings and
//! sequences. There is no conflict error; the overlay always wins for the
//! settings it defines.

use serde_json::Value;

/// Apply `overlay` onto `base` in place.
///
/// - A non-null top-level value in the overlay replaces the base value
///   entirely (nested mappings are not recursed into).
/// - Null means "not specified": the base value is preserved.
/// - Both sides have already been validated by the decoder, so the merge
///   cannot introduce unknown keys.
pub fn apply_overlay(base: &mut Value, overlay: Value) {
    let (Value::Object(base_map), Value::Object(overlay_map)) = (base, overlay) else {
        return;
    };
    for (key, value) in overlay_map {
        if !value.is_null() {
            base_map.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_wins_per_field() {
        let mut base = json!({"cluster_name": "X", "storage_port": 7000});
        apply_overlay(&mut base, json!({"cluster_name": "Y"}));
        assert_eq!(base, json!({"cluster_name": "Y", "storage_port": 7000}));
    }

    #[test]
    fn test_empty_overlay_is_identity() {
        let mut base = json!({"cluster_name": "X", "listen_address": "10.0.0.5"});
        let before = base.clone();
        apply_overlay(&mut base, json!({}));
        assert_eq!(base, before);
    }

    #[test]
    fn test_null_in_overlay_preserves_base() {
        let mut base = json!({"cluster_name": "X"});
        apply_overlay(&mut base, json!({"cluster_name": null}));
        assert_eq!(base, json!({"cluster_name": "X"}));
    }

    #[test]
    fn test_nested_values_replaced_wholesale() {
        let mut base = json!({
            "seed_provider": {
                "class_name": "a.B",
                "parameters": {"seeds": "10.0.0.1", "port": "7000"}
            }
        });
        apply_overlay(
            &mut base,
            json!({"seed_provider": {"class_name": "c.D"}}),
        );
        // No per-sub-field merge: the old parameters are gone.
        assert_eq!(base, json!({"seed_provider": {"class_name": "c.D"}}));
    }

    #[test]
    fn test_sequences_replaced_not_concatenated() {
        let mut base = json!({"data_file_directories": ["/data/a", "/data/b"]});
        apply_overlay(&mut base, json!({"data_file_directories": ["/ssd/a"]}));
        assert_eq!(base, json!({"data_file_directories": ["/ssd/a"]}));
    }

    #[test]
    fn test_overlay_can_add_fields_base_left_unset() {
        let mut base = json!({"cluster_name": "X"});
        apply_overlay(&mut base, json!({"listen_address": "10.0.0.9"}));
        assert_eq!(
            base,
            json!({"cluster_name": "X", "listen_address": "10.0.0.9"})
        );
    }
}
