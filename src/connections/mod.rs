//! Persisted connection registry
//!
//! A connection names a target deployment together with the authorization
//! parameters its gatekeeper reported. All connections live in a single JSON
//! document (`connections.json`) that is always read completely, changed in
//! memory, and rewritten atomically, so independently launched processes
//! can at worst overwrite each other's changes but never corrupt the file.
//!
//! The reserved `local` connection is always present, unauthenticated, and
//! cannot be updated or removed.
//!
//! # Module Layout
//!
//! - [`gatekeeper`] -- discovery of a deployment's authorization parameters
//! - [`migration`]  -- forward-only schema migrations of the raw document

pub mod gatekeeper;
pub mod migration;

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ProjctlError, Result};
use crate::file_utils::{read_if_exists, write_atomic};

use self::migration::CURRENT_SCHEMA_VERSION;

/// Id of the reserved, unauthenticated connection
pub const LOCAL_CONNECTION_ID: &str = "local";

/// Returns `true` if `id` names the reserved local connection (any case)
pub fn is_local(id: &str) -> bool {
    fold(id) == LOCAL_CONNECTION_ID
}

/// Case-folded form used for every id, label and url comparison
fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A named target deployment and its authorization parameters
///
/// Field names on disk follow the connection file format: `auth` holds the
/// authorization server url and `clientid` the OAuth client id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique, case-insensitive, immutable identifier
    pub id: String,
    /// Human-readable name
    #[serde(default)]
    pub label: String,
    /// Base url of the deployment
    #[serde(default)]
    pub url: String,
    /// Base url of the authorization server
    #[serde(default, rename = "auth")]
    pub auth_url: String,
    /// Authorization realm
    #[serde(default)]
    pub realm: String,
    /// OAuth client id
    #[serde(default, rename = "clientid")]
    pub client_id: String,
    /// User the CLI authenticates as
    #[serde(default)]
    pub username: String,
}

impl Connection {
    /// The reserved local connection
    pub fn local() -> Self {
        Self {
            id: LOCAL_CONNECTION_ID.to_string(),
            label: "Local".to_string(),
            url: String::new(),
            auth_url: String::new(),
            realm: String::new(),
            client_id: String::new(),
            username: String::new(),
        }
    }

    /// Returns `true` for the reserved local connection
    pub fn is_local(&self) -> bool {
        is_local(&self.id)
    }
}

fn default_active() -> String {
    LOCAL_CONNECTION_ID.to_string()
}

/// The single persisted connection document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Schema version of the document
    #[serde(rename = "schemaversion")]
    pub schema_version: u64,
    /// Id of the connection commands target by default
    #[serde(default = "default_active")]
    pub active: String,
    /// Connections in insertion order
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            active: default_active(),
            connections: vec![Connection::local()],
        }
    }
}

impl ConnectionConfig {
    fn position(&self, id: &str) -> Option<usize> {
        let id = fold(id);
        self.connections.iter().position(|c| fold(&c.id) == id)
    }

    fn find(&self, id: &str) -> Option<&Connection> {
        self.position(id).map(|index| &self.connections[index])
    }

    /// Fails with a conflict if a non-local connection already uses the
    /// label or the url
    fn check_unique(&self, label: &str, url: &str) -> Result<()> {
        let (folded_label, folded_url) = (fold(label), fold(url));
        for existing in self.connections.iter().filter(|c| !c.is_local()) {
            if fold(&existing.label) == folded_label {
                return Err(ProjctlError::ConnectionConflict(format!(
                    "label '{}' is already used by connection '{}'",
                    label, existing.id
                ))
                .into());
            }
            if fold(&normalize_url(&existing.url)) == folded_url {
                return Err(ProjctlError::ConnectionConflict(format!(
                    "url '{}' is already used by connection '{}'",
                    url, existing.id
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Generates an id that no connection uses yet
    fn generate_id(&self) -> String {
        let now = Utc::now();
        let mut seed = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1000))
            .unsigned_abs();
        loop {
            let id = to_base36(seed);
            if self.find(&id).is_none() {
                return id;
            }
            seed = seed.wrapping_add(1);
        }
    }
}

/// Encodes `value` in lower-case base 36
fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Trims whitespace and trailing slashes from a deployment url
fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ProjctlError::MissingParameters(format!("{} cannot be empty", field)).into());
    }
    Ok(())
}

/// File-backed registry of connections
///
/// # Examples
///
/// ```
/// use projctl::connections::ConnectionRegistry;
///
/// let dir = tempfile::tempdir().unwrap();
/// let registry = ConnectionRegistry::new(dir.path().join("connections.json"));
/// registry.initialize().unwrap();
///
/// let local = registry.get_by_id("LOCAL").unwrap();
/// assert!(local.is_local());
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    path: PathBuf,
}

impl ConnectionRegistry {
    /// Creates a registry bound to the given connection file
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Creates a registry bound to the connection file named by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.connections_file()?))
    }

    /// Per-user location of the connection file
    pub fn default_path() -> Result<PathBuf> {
        Config::default().connections_file()
    }

    /// Path of the backing connection file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the connection file or brings it up to the current schema
    ///
    /// Migrations edit the raw document, so fields this version does not
    /// model are written back unchanged. A document without a local entry
    /// gets it back on disk. Safe to call on every process start: an
    /// up-to-date file is neither rewritten nor changed.
    ///
    /// # Errors
    ///
    /// Returns a `FileLoad`, `FileParse` or `FileWrite` error if the file
    /// cannot be read, decoded, or written.
    pub fn initialize(&self) -> Result<()> {
        let Some(contents) = read_if_exists(&self.path)? else {
            tracing::info!("Creating connection file at {}", self.path.display());
            return self.save(&ConnectionConfig::default());
        };

        let mut raw = parse_raw(&contents)?;
        let migrated = migration::migrate(&mut raw)?;
        let doc = decode(raw.clone())?;

        let restored = !doc.connections.iter().any(Connection::is_local);
        if restored {
            tracing::warn!(
                "Connection file {} has no local connection, restoring it",
                self.path.display()
            );
            restore_local(&mut raw)?;
        }

        if migrated || restored {
            self.save_raw(&raw)?;
        }
        Ok(())
    }

    /// Loads the full connection document
    ///
    /// Pending migrations are applied in memory. A document that somehow
    /// lost its local entry gets it back at the front of the list.
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::FileLoad`] if the file is missing or cannot be
    /// read, and [`ProjctlError::FileParse`] if it cannot be decoded.
    pub fn load(&self) -> Result<ConnectionConfig> {
        let contents = read_if_exists(&self.path)?.ok_or_else(|| {
            ProjctlError::FileLoad(format!(
                "connection file {} does not exist",
                self.path.display()
            ))
        })?;

        let mut raw = parse_raw(&contents)?;
        migration::migrate(&mut raw)?;
        let mut doc = decode(raw)?;

        if !doc.connections.iter().any(Connection::is_local) {
            tracing::warn!(
                "Connection file {} has no local connection, restoring it",
                self.path.display()
            );
            doc.connections.insert(0, Connection::local());
        }
        Ok(doc)
    }

    fn save_raw(&self, raw: &serde_json::Value) -> Result<()> {
        let body = serde_json::to_vec_pretty(raw)
            .map_err(|e| ProjctlError::FileWrite(format!("failed to encode connections: {}", e)))?;
        write_atomic(&self.path, &body)
    }

    fn save(&self, doc: &ConnectionConfig) -> Result<()> {
        let body = serde_json::to_vec_pretty(doc)
            .map_err(|e| ProjctlError::FileWrite(format!("failed to encode connections: {}", e)))?;
        write_atomic(&self.path, &body)
    }

    /// Lists every connection in file order
    pub fn list(&self) -> Result<Vec<Connection>> {
        Ok(self.load()?.connections)
    }

    /// Looks up a connection by id, ignoring case
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::ConnectionNotFound`] if no connection matches.
    pub fn get_by_id(&self, id: &str) -> Result<Connection> {
        let doc = self.load()?;
        doc.find(id)
            .cloned()
            .ok_or_else(|| ProjctlError::ConnectionNotFound(id.to_string()).into())
    }

    /// Adds a new remote connection
    ///
    /// The deployment's gatekeeper is queried for its authorization
    /// parameters before anything is written.
    ///
    /// # Arguments
    ///
    /// * `http` - HTTP client used for gatekeeper discovery
    /// * `label` - Unique human-readable name
    /// * `url` - Unique base url of the deployment
    /// * `username` - User to authenticate as
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::ConnectionConflict`] if the label or url is
    /// already used, [`ProjctlError::ConnectionDiscovery`] if the gatekeeper
    /// cannot be queried, or a file error if persistence fails.
    pub async fn add(
        &self,
        http: &reqwest::Client,
        label: &str,
        url: &str,
        username: &str,
    ) -> Result<Connection> {
        let label = label.trim();
        let url = normalize_url(url);
        require("label", label)?;
        require("url", &url)?;

        let mut doc = self.load()?;
        doc.check_unique(label, &url)?;

        let env = gatekeeper::fetch_environment(http, &url).await?;

        let connection = Connection {
            id: doc.generate_id(),
            label: label.to_string(),
            url,
            auth_url: env.auth_url,
            realm: env.realm,
            client_id: env.client_id,
            username: username.trim().to_string(),
        };
        doc.connections.push(connection.clone());
        self.save(&doc)?;

        tracing::info!(
            "Added connection '{}' ({}) for {}",
            connection.id,
            connection.label,
            connection.url
        );
        Ok(connection)
    }

    /// Replaces a remote connection in place
    ///
    /// The id and the position in the list are preserved; the auth
    /// parameters are rediscovered exactly as in [`add`](Self::add).
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::ConnectionProtected`] for the local
    /// connection and [`ProjctlError::ConnectionNotFound`] for unknown ids.
    pub async fn update(
        &self,
        http: &reqwest::Client,
        id: &str,
        label: &str,
        url: &str,
        username: &str,
    ) -> Result<Connection> {
        if is_local(id) {
            return Err(ProjctlError::ConnectionProtected(id.to_string()).into());
        }
        let label = label.trim();
        let url = normalize_url(url);
        require("label", label)?;
        require("url", &url)?;

        let mut doc = self.load()?;
        let index = doc
            .position(id)
            .ok_or_else(|| ProjctlError::ConnectionNotFound(id.to_string()))?;

        let env = gatekeeper::fetch_environment(http, &url).await?;

        let connection = Connection {
            id: doc.connections[index].id.clone(),
            label: label.to_string(),
            url,
            auth_url: env.auth_url,
            realm: env.realm,
            client_id: env.client_id,
            username: username.trim().to_string(),
        };
        doc.connections[index] = connection.clone();
        self.save(&doc)?;

        tracing::info!("Updated connection '{}'", connection.id);
        Ok(connection)
    }

    /// Removes a remote connection
    ///
    /// If the removed connection was active, `local` becomes active again.
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::ConnectionProtected`] for the local
    /// connection and [`ProjctlError::ConnectionNotFound`] if nothing
    /// matches.
    pub fn remove(&self, id: &str) -> Result<()> {
        if is_local(id) {
            return Err(ProjctlError::ConnectionProtected(id.to_string()).into());
        }
        let id = id.trim();

        let mut doc = self.load()?;
        let before = doc.connections.len();
        let folded = fold(id);
        doc.connections.retain(|c| fold(&c.id) != folded);
        if doc.connections.len() == before {
            return Err(ProjctlError::ConnectionNotFound(id.to_string()).into());
        }
        if fold(&doc.active) == folded {
            doc.active = default_active();
        }
        self.save(&doc)?;

        tracing::info!("Removed connection '{}'", id);
        Ok(())
    }

    /// Overwrites the file with the default single-local-connection document
    pub fn reset(&self) -> Result<()> {
        tracing::info!("Resetting connection file at {}", self.path.display());
        self.save(&ConnectionConfig::default())
    }

    /// Returns the active connection
    ///
    /// An active id that no longer resolves falls back to `local`.
    pub fn active(&self) -> Result<Connection> {
        let doc = self.load()?;
        Ok(doc
            .find(&doc.active)
            .cloned()
            .unwrap_or_else(Connection::local))
    }

    /// Makes `id` the active connection
    ///
    /// # Errors
    ///
    /// Returns [`ProjctlError::ConnectionNotFound`] for unknown ids.
    pub fn set_active(&self, id: &str) -> Result<Connection> {
        let mut doc = self.load()?;
        let connection = doc
            .find(id)
            .cloned()
            .ok_or_else(|| ProjctlError::ConnectionNotFound(id.to_string()))?;
        doc.active = connection.id.clone();
        self.save(&doc)?;
        Ok(connection)
    }
}

/// Puts the local entry at the front of a raw document's connection list
fn restore_local(raw: &mut serde_json::Value) -> Result<()> {
    let local = serde_json::to_value(Connection::local())
        .map_err(|e| ProjctlError::FileWrite(format!("failed to encode local connection: {}", e)))?;
    let doc = raw
        .as_object_mut()
        .ok_or_else(|| ProjctlError::FileParse("connection file is not a JSON object".to_string()))?;
    let connections = doc
        .entry("connections")
        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
    let list = connections
        .as_array_mut()
        .ok_or_else(|| ProjctlError::FileParse("'connections' is not a JSON array".to_string()))?;
    list.insert(0, local);
    Ok(())
}

fn parse_raw(contents: &str) -> Result<serde_json::Value> {
    serde_json::from_str(contents).map_err(|e| {
        ProjctlError::FileParse(format!("connection file is not valid JSON: {}", e)).into()
    })
}

fn decode(raw: serde_json::Value) -> Result<ConnectionConfig> {
    serde_json::from_value(raw).map_err(|e| {
        ProjctlError::FileParse(format!("connection file has an unexpected shape: {}", e)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_registry() -> (ConnectionRegistry, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let registry = ConnectionRegistry::new(dir.path().join("connections.json"));
        registry.initialize().expect("initialize");
        (registry, dir)
    }

    fn remote(id: &str, label: &str, url: &str) -> Connection {
        Connection {
            id: id.to_string(),
            label: label.to_string(),
            url: url.to_string(),
            auth_url: "https://auth.example.com".to_string(),
            realm: "dev".to_string(),
            client_id: "projctl-cli".to_string(),
            username: "alice".to_string(),
        }
    }

    fn seed(registry: &ConnectionRegistry, connections: Vec<Connection>) {
        let mut doc = registry.load().unwrap();
        doc.connections.extend(connections);
        registry.save(&doc).unwrap();
    }

    #[test]
    fn test_initialize_creates_default_document() {
        let (registry, _dir) = create_test_registry();
        let doc = registry.load().unwrap();
        assert_eq!(doc.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(doc.active, "local");
        assert_eq!(doc.connections, vec![Connection::local()]);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (registry, _dir) = create_test_registry();
        seed(&registry, vec![remote("k3x9", "staging", "https://staging.example.com")]);
        let before = std::fs::read_to_string(registry.path()).unwrap();
        registry.initialize().unwrap();
        let after = std::fs::read_to_string(registry.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_load_missing_file_is_file_load_error() {
        let dir = TempDir::new().unwrap();
        let registry = ConnectionRegistry::new(dir.path().join("absent.json"));
        let err = registry.load().unwrap_err();
        assert_eq!(err.downcast_ref::<ProjctlError>().unwrap().tag(), "file_load");
    }

    #[test]
    fn test_load_invalid_json_is_file_parse_error() {
        let (registry, _dir) = create_test_registry();
        std::fs::write(registry.path(), "{not json").unwrap();
        let err = registry.load().unwrap_err();
        assert_eq!(err.downcast_ref::<ProjctlError>().unwrap().tag(), "file_parse");
    }

    #[test]
    fn test_load_restores_missing_local_connection() {
        let (registry, _dir) = create_test_registry();
        std::fs::write(
            registry.path(),
            r#"{"schemaversion":1,"connections":[{"id":"k3x9","label":"staging"}]}"#,
        )
        .unwrap();
        let doc = registry.load().unwrap();
        assert!(doc.connections[0].is_local());
        assert_eq!(doc.connections[1].id, "k3x9");
    }

    #[test]
    fn test_initialize_persists_restored_local_connection() {
        let (registry, _dir) = create_test_registry();
        std::fs::write(
            registry.path(),
            r#"{"schemaversion":1,"connections":[{"id":"k3x9","label":"staging","namespace":"team-a"}]}"#,
        )
        .unwrap();

        registry.initialize().unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(registry.path()).unwrap()).unwrap();
        assert_eq!(on_disk["connections"][0]["id"], "local");
        assert_eq!(on_disk["connections"][1]["id"], "k3x9");
        assert_eq!(on_disk["connections"][1]["namespace"], "team-a");

        let before = std::fs::read_to_string(registry.path()).unwrap();
        registry.initialize().unwrap();
        assert_eq!(std::fs::read_to_string(registry.path()).unwrap(), before);
    }

    #[test]
    fn test_get_by_id_is_case_insensitive() {
        let (registry, _dir) = create_test_registry();
        seed(&registry, vec![remote("k3x9", "staging", "https://staging.example.com")]);
        assert_eq!(registry.get_by_id("K3X9").unwrap().label, "staging");
    }

    #[test]
    fn test_get_by_id_unknown_is_not_found() {
        let (registry, _dir) = create_test_registry();
        let err = registry.get_by_id("nope").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProjctlError>(),
            Some(ProjctlError::ConnectionNotFound(_))
        ));
    }

    #[test]
    fn test_remove_local_is_protected_in_any_case() {
        let (registry, _dir) = create_test_registry();
        for id in ["local", "LOCAL", "Local"] {
            let err = registry.remove(id).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ProjctlError>(),
                Some(ProjctlError::ConnectionProtected(_))
            ));
        }
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_local_is_protected() {
        let (registry, _dir) = create_test_registry();
        let http = reqwest::Client::new();
        let err = registry
            .update(&http, "LoCaL", "x", "https://x.example.com", "bob")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProjctlError>(),
            Some(ProjctlError::ConnectionProtected(_))
        ));
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found_without_discovery() {
        let (registry, _dir) = create_test_registry();
        let http = reqwest::Client::new();
        let err = registry
            .update(&http, "missing", "x", "http://127.0.0.1:9", "bob")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProjctlError>(),
            Some(ProjctlError::ConnectionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_add_conflicting_label_fails_before_discovery() {
        let (registry, _dir) = create_test_registry();
        seed(&registry, vec![remote("k3x9", "staging", "https://staging.example.com")]);
        let http = reqwest::Client::new();
        let err = registry
            .add(&http, "STAGING", "http://127.0.0.1:9", "bob")
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProjctlError>(),
            Some(ProjctlError::ConnectionConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_add_conflicting_url_ignores_case_and_trailing_slash() {
        let (registry, _dir) = create_test_registry();
        seed(&registry, vec![remote("k3x9", "staging", "https://staging.example.com")]);
        let http = reqwest::Client::new();
        let err = registry
            .add(&http, "other", "HTTPS://STAGING.EXAMPLE.COM/", "bob")
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ProjctlError>().unwrap().tag(), "con_conflict");
    }

    #[tokio::test]
    async fn test_add_conflicting_label_folds_non_ascii_case() {
        let (registry, _dir) = create_test_registry();
        seed(&registry, vec![remote("k3x9", "Über", "https://staging.example.com")]);
        let http = reqwest::Client::new();
        let err = registry
            .add(&http, "über", "http://127.0.0.1:9", "bob")
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ProjctlError>().unwrap().tag(), "con_conflict");
    }

    #[test]
    fn test_get_by_id_folds_non_ascii_case() {
        let (registry, _dir) = create_test_registry();
        seed(&registry, vec![remote("Äb12", "staging", "https://staging.example.com")]);
        assert_eq!(registry.get_by_id("äB12").unwrap().id, "Äb12");
    }

    #[tokio::test]
    async fn test_add_empty_label_is_missing_parameter() {
        let (registry, _dir) = create_test_registry();
        let http = reqwest::Client::new();
        let err = registry
            .add(&http, "  ", "https://x.example.com", "bob")
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ProjctlError>().unwrap().tag(), "cli_command");
    }

    #[test]
    fn test_remove_deletes_entry_and_resets_active() {
        let (registry, _dir) = create_test_registry();
        seed(
            &registry,
            vec![
                remote("k3x9", "staging", "https://staging.example.com"),
                remote("p2q7", "prod", "https://prod.example.com"),
            ],
        );
        registry.set_active("K3X9").unwrap();
        assert_eq!(registry.active().unwrap().id, "k3x9");

        registry.remove("K3X9").unwrap();

        let doc = registry.load().unwrap();
        assert_eq!(doc.active, "local");
        let ids: Vec<_> = doc.connections.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["local", "p2q7"]);
    }

    #[test]
    fn test_remove_keeps_unrelated_active() {
        let (registry, _dir) = create_test_registry();
        seed(
            &registry,
            vec![
                remote("k3x9", "staging", "https://staging.example.com"),
                remote("p2q7", "prod", "https://prod.example.com"),
            ],
        );
        registry.set_active("p2q7").unwrap();
        registry.remove("k3x9").unwrap();
        assert_eq!(registry.active().unwrap().id, "p2q7");
    }

    #[test]
    fn test_remove_unknown_is_not_found() {
        let (registry, _dir) = create_test_registry();
        let err = registry.remove("ghost").unwrap_err();
        assert_eq!(err.downcast_ref::<ProjctlError>().unwrap().tag(), "con_not_found");
    }

    #[test]
    fn test_set_active_unknown_is_not_found() {
        let (registry, _dir) = create_test_registry();
        assert!(registry.set_active("ghost").is_err());
        assert_eq!(registry.active().unwrap().id, "local");
    }

    #[test]
    fn test_reset_then_load_yields_only_local() {
        let (registry, _dir) = create_test_registry();
        seed(
            &registry,
            vec![
                remote("k3x9", "staging", "https://staging.example.com"),
                remote("p2q7", "prod", "https://prod.example.com"),
            ],
        );
        registry.reset().unwrap();
        let doc = registry.load().unwrap();
        assert_eq!(doc.connections.len(), 1);
        assert_eq!(doc.connections[0].id, "local");
    }

    #[test]
    fn test_generate_id_skips_existing_ids() {
        let mut doc = ConnectionConfig::default();
        let id = doc.generate_id();
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        doc.connections.push(remote(&id, "a", "https://a.example.com"));
        assert_ne!(doc.generate_id(), id);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn test_connection_serializes_with_file_field_names() {
        let value = serde_json::to_value(remote("k3x9", "staging", "https://s")).unwrap();
        assert_eq!(value["auth"], "https://auth.example.com");
        assert_eq!(value["clientid"], "projctl-cli");
        assert!(value.get("auth_url").is_none());
    }
}
