//! Environment variable fallbacks.
//!
//! Environment variables fill in fields no config file set; a value in a
//! file always wins.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::FileFields;

/// How a variable's text becomes a TOML value.
#[derive(Clone, Copy)]
enum Kind {
    Text,
    Port,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: Kind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "MINDFUL_LOG_LEVEL",
        field_path: "logging.level",
        kind: Kind::Text,
    },
    EnvMapping {
        var_name: "MINDFUL_PORT",
        field_path: "server.port",
        kind: Kind::Port,
    },
    EnvMapping {
        var_name: "MINDFUL_DATA_DIR",
        field_path: "storage.data_dir",
        kind: Kind::Text,
    },
];

/// Snapshot the process environment.
pub(crate) fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply every mapped variable whose field no file set. Returns how many
/// were applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable cannot be converted to
/// its field's type.
pub(crate) fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    file_fields: &FileFields,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if file_fields.contains(mapping.field_path) {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = coerce(mapping, raw)?;
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    match mapping.kind {
        Kind::Text => Ok(toml::Value::String(raw.to_owned())),
        Kind::Port => raw
            .trim()
            .parse::<u16>()
            .map(|port| toml::Value::Integer(i64::from(port)))
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("'{raw}' is not a valid port: {e}"),
            }),
    }
}

/// Set a dotted path, creating intermediate tables as needed.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_fallbacks_fill_unset_fields() {
        let mut merged: toml::Value = toml::from_str("[server]\nport = 9071").unwrap();
        let vars = env(&[("MINDFUL_PORT", "9200"), ("MINDFUL_DATA_DIR", "/tmp/m")]);

        let count = apply_env_fallbacks(&mut merged, &FileFields::new(), &vars).unwrap();

        assert_eq!(count, 2);
        assert_eq!(merged["server"]["port"].as_integer(), Some(9200));
        assert_eq!(merged["storage"]["data_dir"].as_str(), Some("/tmp/m"));
    }

    #[test]
    fn test_file_value_wins() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let file_fields: FileFields = ["logging.level".to_owned()].into_iter().collect();
        let vars = env(&[("MINDFUL_LOG_LEVEL", "trace")]);

        let count = apply_env_fallbacks(&mut merged, &file_fields, &vars).unwrap();

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let vars = env(&[("MINDFUL_PORT", "ninety")]);

        let result = apply_env_fallbacks(&mut merged, &FileFields::new(), &vars);
        assert!(matches!(
            result,
            Err(ConfigError::EnvError { ref var_name, .. }) if var_name == "MINDFUL_PORT"
        ));
    }
}
