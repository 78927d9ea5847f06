//! Schema migrations for the connection file
//!
//! Migrations operate on the raw JSON document rather than on typed structs,
//! so a migration only touches the fields it is about and everything else in
//! the file survives untouched. Each migration is registered once in
//! [`MIGRATIONS`] and upgrades the document by exactly one version; adding a
//! schema version means appending an entry, never editing an earlier one.

use serde_json::Value;

use crate::error::{ProjctlError, Result};

/// Schema version written by this build
pub const CURRENT_SCHEMA_VERSION: u64 = 1;

/// Key holding the schema version in the connection file
pub const SCHEMA_VERSION_KEY: &str = "schemaversion";

/// A single forward migration step
pub struct Migration {
    /// Version the migration upgrades from; it produces `from_version + 1`
    pub from_version: u64,
    /// Short human-readable summary used in logs
    pub description: &'static str,
    /// Transformation applied to the raw document
    pub apply: fn(&mut Value) -> Result<()>,
}

/// Every known migration, ordered by `from_version`
pub const MIGRATIONS: &[Migration] = &[Migration {
    from_version: 0,
    description: "rename connection field 'name' to 'id'",
    apply: rename_name_to_id,
}];

/// Reads the schema version of a raw document
///
/// Documents written before versioning existed carry no version key and are
/// treated as version 0.
pub fn schema_version(doc: &Value) -> u64 {
    doc.get(SCHEMA_VERSION_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Applies every pending migration to `doc`, in order
///
/// Returns `true` when the document was changed. Documents already at or
/// beyond [`CURRENT_SCHEMA_VERSION`] are left untouched.
///
/// # Errors
///
/// Returns [`ProjctlError::FileParse`] if the document is not a JSON object,
/// if no migration is registered for an intermediate version, or if a
/// migration step fails.
///
/// # Examples
///
/// ```
/// use projctl::connections::migration::{migrate, schema_version};
///
/// let mut doc = serde_json::json!({
///     "connections": [{ "name": "local", "label": "Local", "url": "" }]
/// });
/// assert!(migrate(&mut doc).unwrap());
/// assert_eq!(schema_version(&doc), 1);
/// assert_eq!(doc["connections"][0]["id"], "local");
///
/// // A second pass has nothing left to do.
/// assert!(!migrate(&mut doc).unwrap());
/// ```
pub fn migrate(doc: &mut Value) -> Result<bool> {
    if !doc.is_object() {
        return Err(
            ProjctlError::FileParse("connection file is not a JSON object".to_string()).into(),
        );
    }

    let mut version = schema_version(doc);
    let mut changed = false;

    while version < CURRENT_SCHEMA_VERSION {
        let migration = MIGRATIONS
            .iter()
            .find(|m| m.from_version == version)
            .ok_or_else(|| {
                ProjctlError::FileParse(format!(
                    "no migration registered from schema version {}",
                    version
                ))
            })?;

        tracing::info!(
            "Migrating connection file from schema version {} to {}: {}",
            version,
            version + 1,
            migration.description
        );
        (migration.apply)(doc)?;

        version += 1;
        doc[SCHEMA_VERSION_KEY] = Value::from(version);
        changed = true;
    }

    Ok(changed)
}

/// Version 0 → 1: connections were keyed by `name`, now by `id`
fn rename_name_to_id(doc: &mut Value) -> Result<()> {
    let Some(connections) = doc.get_mut("connections") else {
        return Ok(());
    };
    let connections = connections.as_array_mut().ok_or_else(|| {
        ProjctlError::FileParse("'connections' is not a JSON array".to_string())
    })?;

    for connection in connections.iter_mut() {
        let Some(fields) = connection.as_object_mut() else {
            continue;
        };
        if fields.contains_key("id") {
            continue;
        }
        if let Some(name) = fields.remove("name") {
            fields.insert("id".to_string(), name);
        }
    }

    Ok(())
}
