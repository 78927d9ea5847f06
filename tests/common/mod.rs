use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use projctl::auth::{AuthSession, RequestDispatcher};
use projctl::connections::ConnectionRegistry;
use projctl::credentials::backend::InsecureFileBackend;
use projctl::credentials::CredentialStore;

/// Isolated connection file and insecure keyring in a temp directory
#[allow(dead_code)]
pub struct TestEnv {
    pub dir: TempDir,
    pub registry: Arc<ConnectionRegistry>,
    pub store: Arc<CredentialStore>,
    pub http: Arc<reqwest::Client>,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let registry = Arc::new(ConnectionRegistry::new(dir.path().join("connections.json")));
        registry.initialize().expect("failed to initialize registry");

        let backend = InsecureFileBackend::new(dir.path().join("insecure-keyring.json"));
        let store = Arc::new(CredentialStore::with_backend(
            Box::new(backend),
            "org.projctl",
        ));

        let http = Arc::new(
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("failed to build client"),
        );

        Self {
            dir,
            registry,
            store,
            http,
        }
    }

    pub fn session(&self) -> AuthSession {
        AuthSession::new(
            self.http.clone(),
            self.registry.clone(),
            self.store.clone(),
        )
    }

    pub fn dispatcher(&self) -> RequestDispatcher {
        RequestDispatcher::new(self.session())
    }

    /// Writes a connection file holding `local` and one remote connection
    pub fn seed_remote(&self, id: &str, url: &str, auth_url: &str, username: &str) {
        let doc = serde_json::json!({
            "schemaversion": 1,
            "active": "local",
            "connections": [
                {"id": "local", "label": "Local"},
                {
                    "id": id,
                    "label": "Staging",
                    "url": url,
                    "auth": auth_url,
                    "realm": "dev",
                    "clientid": "projctl-cli",
                    "username": username
                }
            ]
        });
        fs::write(
            self.registry.path(),
            serde_json::to_vec_pretty(&doc).expect("serialize connections"),
        )
        .expect("failed to write connection file");
    }
}

/// Token endpoint path of the `dev` realm
#[allow(dead_code)]
pub const TOKEN_PATH: &str = "/auth/realms/dev/protocol/openid-connect/token";

/// A successful token endpoint response
#[allow(dead_code)]
pub fn token_body(access_token: &str, refresh_token: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_in": 300,
        "refresh_expires_in": 1800,
        "token_type": "bearer",
        "scope": "email profile"
    })
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
