//! Loading and saving configuration documents
//!
//! [`DocumentStore`] is the only place where documents cross the disk
//! boundary. Loading validates the `file_name` / `file_version` header;
//! saving stamps `generated_at` and writes atomically.

use buildnis_fs::{Fingerprint, NormalizedPath, io};

use crate::{ConfigNode, Error, FileVersion, Result, Schema, Value, version::ENGINE_VERSION};

pub const FILE_NAME: &str = "file_name";
pub const FILE_VERSION: &str = "file_version";
pub const GENERATED_AT: &str = "generated_at";

/// Format of `generated_at`, local time with second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What [`DocumentStore::save_if_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    Unchanged,
}

/// Stateless loader and writer for configuration documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentStore;

impl DocumentStore {
    pub fn new() -> Self {
        Self
    }

    /// Load and validate the document at `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `path` is not a regular file
    /// - [`Error::Parse`] if the content is not a JSON object
    /// - [`Error::SchemaMismatch`] if `file_name` is not `schema`
    /// - [`Error::InvalidVersion`] if `file_version` is not `major.minor`
    /// - [`Error::VersionTooOld`] if `file_version` is below the engine version
    pub fn load(&self, path: &NormalizedPath, schema: Schema) -> Result<ConfigNode> {
        let bytes = io::read_bytes(path).map_err(|e| match e {
            buildnis_fs::Error::NotFound { path } => Error::NotFound { path },
            other => Error::Read {
                path: path.to_native(),
                source: other,
            },
        })?;

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| Error::Parse {
            path: path.to_native(),
            message: e.to_string(),
        })?;
        let node = ConfigNode::from_value(value).ok_or_else(|| Error::Parse {
            path: path.to_native(),
            message: "top level is not a JSON object".to_string(),
        })?;

        let actual = node.str_or_default(FILE_NAME);
        if actual != schema.as_str() {
            return Err(Error::SchemaMismatch {
                path: path.to_native(),
                expected: schema.as_str().to_string(),
                actual,
            });
        }

        let raw_version = node.str_or_default(FILE_VERSION);
        let version = FileVersion::parse(&raw_version).ok_or_else(|| Error::InvalidVersion {
            path: path.to_native(),
            value: raw_version.clone(),
        })?;
        if !version.is_supported() {
            return Err(Error::VersionTooOld {
                path: path.to_native(),
                found: version.to_string(),
                required: ENGINE_VERSION.to_string(),
            });
        }

        tracing::debug!(path = %path, schema = %schema, version = %version, "Loaded configuration");
        Ok(node)
    }

    /// Tag a freshly generated document with its schema and the engine version.
    ///
    /// The header fields are placed first when the node does not have them yet.
    pub fn stamp(&self, node: &mut ConfigNode, schema: Schema) {
        let mut stamped = ConfigNode::new();
        stamped.set(FILE_NAME, schema.as_str());
        stamped.set(FILE_VERSION, ENGINE_VERSION.to_string());
        stamped.set(
            GENERATED_AT,
            node.get(GENERATED_AT)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new())),
        );
        for (field, value) in node.iter() {
            if !stamped.contains(field) {
                stamped.set(field.clone(), value.clone());
            }
        }
        *node = stamped;
    }

    /// Stamp `generated_at` with the current time and write `node` to `path`.
    ///
    /// # Errors
    ///
    /// Any failure is reported as [`Error::Write`].
    pub fn save(&self, node: &mut ConfigNode, path: &NormalizedPath) -> Result<()> {
        node.set(GENERATED_AT, timestamp_now());
        let rendered = render(node, path)?;
        io::write_text(path, &rendered).map_err(|e| Error::Write {
            path: path.to_native(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path, "Saved configuration");
        Ok(())
    }

    /// Save `node` unless the file at `path` already holds the same document.
    ///
    /// The comparison ignores `generated_at`: the node is rendered with the
    /// existing file's timestamp and fingerprinted against the file. When the
    /// content is unchanged the file is not touched and `node` takes over the
    /// existing timestamp.
    pub fn save_if_changed(
        &self,
        node: &mut ConfigNode,
        path: &NormalizedPath,
    ) -> Result<SaveOutcome> {
        if let Some(existing_stamp) = existing_timestamp(path) {
            let mut candidate = node.clone();
            candidate.set(GENERATED_AT, existing_stamp);
            let rendered = render(&candidate, path)?;
            let rendered_print = Fingerprint::from_bytes(path.clone(), rendered.as_bytes());
            if rendered_print.matches_file(path)? {
                tracing::debug!(path = %path, "Configuration unchanged, keeping file");
                *node = candidate;
                return Ok(SaveOutcome::Unchanged);
            }
        }
        self.save(node, path)?;
        Ok(SaveOutcome::Written)
    }
}

/// The current local time formatted for `generated_at`.
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn render(node: &ConfigNode, path: &NormalizedPath) -> Result<String> {
    let mut text = serde_json::to_string_pretty(node).map_err(|e| Error::Write {
        path: path.to_native(),
        message: e.to_string(),
    })?;
    text.push('\n');
    Ok(text)
}

/// `generated_at` of the JSON document at `path`, if there is a readable one.
fn existing_timestamp(path: &NormalizedPath) -> Option<Value> {
    let bytes = io::read_bytes(path).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    value.get(GENERATED_AT).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stamp_puts_header_first() {
        let mut node = ConfigNode::from_value(json!({"host_name": "box"})).unwrap();
        DocumentStore::new().stamp(&mut node, Schema::Host);
        let keys: Vec<_> = node.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, [FILE_NAME, FILE_VERSION, GENERATED_AT, "host_name"]);
        assert_eq!(node.get_str(FILE_NAME), Some("host_config"));
        assert_eq!(node.get_str(FILE_VERSION), Some("1.0"));
    }

    #[test]
    fn timestamp_has_second_precision() {
        let stamp = timestamp_now();
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
    }
}
