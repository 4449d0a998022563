//! Layer merging.

use std::collections::HashSet;

/// Dotted paths of every leaf set by a file layer.
pub(crate) type FileFields = HashSet<String>;

/// Deep-merge `overlay` into `base`, recording every leaf it sets.
///
/// Tables merge per key; scalars and arrays from the overlay replace the
/// base value.
pub(crate) fn deep_merge(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    set: &mut FileFields,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match base_table.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val, &path, set),
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, set);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            set.insert(prefix.to_owned());
        },
    }
}

fn record_leaves(val: &toml::Value, prefix: &str, set: &mut FileFields) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &format!("{prefix}.{key}"), set);
        }
    } else {
        set.insert(prefix.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_replaces_scalars_and_keeps_siblings() {
        let mut base: toml::Value = toml::from_str("[server]\nbind = \"127.0.0.1\"\nport = 9071").unwrap();
        let overlay: toml::Value = toml::from_str("[server]\nport = 9100").unwrap();
        let mut set = FileFields::new();

        deep_merge(&mut base, &overlay, "", &mut set);

        assert_eq!(base["server"]["port"].as_integer(), Some(9100));
        assert_eq!(base["server"]["bind"].as_str(), Some("127.0.0.1"));
        assert!(set.contains("server.port"));
        assert!(!set.contains("server.bind"));
    }

    #[test]
    fn test_new_tables_record_every_leaf() {
        let mut base: toml::Value = toml::from_str("[server]\nport = 1").unwrap();
        let overlay: toml::Value = toml::from_str("[storage]\nbackend = \"memory\"").unwrap();
        let mut set = FileFields::new();

        deep_merge(&mut base, &overlay, "", &mut set);

        assert_eq!(base["storage"]["backend"].as_str(), Some("memory"));
        assert!(set.contains("storage.backend"));
    }
}
