//! Integration tests for the APR server.
//!
//! These tests start the real `apr-server` binary and drive it over HTTP.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Username registered on every test server.
pub const USERNAME: &str = "123";
/// Password registered on every test server.
pub const PASSWORD: &str = "correct horse battery staple";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JwtResponse {
    pub jwt: String,
}

#[derive(Debug, Deserialize)]
pub struct PrincipalResponse {
    pub principal: String,
    pub expires_at: u64,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Fixtures
// ============================================================================

/// Path to a key under `testdata/keys`.
pub fn key_path(name: &str) -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    Path::new(&manifest_dir)
        .join("../../testdata/keys")
        .join(name)
}

/// Writes a credentials file holding [`USERNAME`] / [`PASSWORD`].
fn write_credentials(dir: &Path) -> Result<PathBuf> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(PASSWORD.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hash failed: {e}"))?
        .to_string();

    let credentials: HashMap<&str, String> = HashMap::from([(USERNAME, hash)]);
    let path = dir.join("credentials.json");
    std::fs::write(&path, serde_json::to_string(&credentials)?)?;
    Ok(path)
}

// ============================================================================
// Test Server
// ============================================================================

/// A test server instance that manages its own data directory and process.
pub struct TestServer {
    process: Child,
    pub base_url: String,
    pub port: u16,
    _data_dir: TempDir,
}

impl TestServer {
    /// Start a new test server on the specified port, signing with
    /// `rsa4096_a.pem`.
    pub async fn start(port: u16) -> Result<Self> {
        let data_dir = TempDir::new().context("Failed to create temp dir")?;
        let credentials = write_credentials(data_dir.path())?;

        let server_binary = find_server_binary()?;

        let process = Command::new(&server_binary)
            .arg("--private-key")
            .arg(key_path("rsa4096_a.pem"))
            .arg("--credentials")
            .arg(&credentials)
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start server: {:?}", server_binary))?;

        let base_url = format!("http://127.0.0.1:{}", port);

        let server = Self {
            process,
            base_url,
            port,
            _data_dir: data_dir,
        };

        server.wait_for_ready().await?;

        Ok(server)
    }

    /// Wait for the server to be ready to accept connections.
    async fn wait_for_ready(&self) -> Result<()> {
        let client = Client::new();
        let url = format!("{}/api/health", self.base_url);

        for _ in 0..100 {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }

        bail!("Server failed to start within 10 seconds")
    }

    /// Get a configured HTTP client for this server.
    pub fn client(&self) -> AprClient {
        AprClient::new(&self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Find the server binary in the target directory.
pub fn find_server_binary() -> Result<PathBuf> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());

    // Try debug build first, then release
    let candidates = [
        Path::new(&manifest_dir).join("../../target/debug/apr-server"),
        Path::new(&manifest_dir).join("../../target/debug/apr-server.exe"),
        Path::new(&manifest_dir).join("../../target/release/apr-server"),
        Path::new(&manifest_dir).join("../../target/release/apr-server.exe"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.canonicalize()?);
        }
    }

    bail!(
        "Could not find apr-server binary. Run 'cargo build -p apr-server' first. Searched in: {:?}",
        candidates
    )
}

// ============================================================================
// Test Client
// ============================================================================

/// HTTP client for testing the APR API.
pub struct AprClient {
    client: Client,
    base_url: String,
}

impl AprClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.client.get(self.url("/api/health")).send().await?;
        Ok(resp.json().await?)
    }

    pub async fn login(&self, password: &str, service: Option<&str>) -> Result<JwtResponse> {
        let req = LoginRequest {
            username: USERNAME.to_string(),
            password: password.to_string(),
            service: service.map(str::to_string),
        };
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("Login failed: {}", resp.text().await?);
        }
        Ok(resp.json().await?)
    }

    /// `GET /api/auth/principal` with a raw `Authorization` value.
    pub async fn principal(
        &self,
        authorization: Option<&str>,
    ) -> Result<(StatusCode, serde_json::Value)> {
        let mut req = self.client.get(self.url("/api/auth/principal"));
        if let Some(value) = authorization {
            req = req.header("Authorization", value);
        }
        let resp = req.send().await?;
        let status = resp.status();
        Ok((status, resp.json().await?))
    }

    pub async fn sso(&self, token: &str, service: &str) -> Result<JwtResponse> {
        let resp = self
            .client
            .post(self.url(&format!("/api/auth/login/{}", service)))
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("SSO failed: {}", resp.text().await?);
        }
        Ok(resp.json().await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU16, Ordering};

    use apr_auth::{TokenConfig, TokenIssuer, TokenVerifier};
    use apr_crypto::{Keypair, PublicKey};

    // Port counter to avoid conflicts between parallel tests
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(17890);

    fn next_port() -> u16 {
        PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
    }

    fn error_of(body: &serde_json::Value) -> &str {
        body["error"].as_str().unwrap()
    }

    #[tokio::test]
    async fn test_server_health() {
        let server = TestServer::start(next_port()).await.unwrap();

        let health = server.client().health().await.unwrap();

        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_login_then_access_protected_route() {
        let server = TestServer::start(next_port()).await.unwrap();
        let client = server.client();

        let token = client.login(PASSWORD, None).await.unwrap().jwt;
        let (status, body) = client
            .principal(Some(&format!("Bearer {}", token)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["principal"], "123");
    }

    #[tokio::test]
    async fn test_issued_token_verifies_with_public_key() {
        let server = TestServer::start(next_port()).await.unwrap();

        let token = server.client().login(PASSWORD, None).await.unwrap().jwt;

        let public = PublicKey::from_pem_file(key_path("rsa4096_a_pub.pem")).unwrap();
        let verifier = TokenVerifier::new(&public).unwrap();
        let claims = verifier.verify(&token, "apr", "apr").unwrap();
        assert_eq!(claims.sub, USERNAME);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let server = TestServer::start(next_port()).await.unwrap();

        let result = server.client().login("not the password", None).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_wrong_scheme_rejected() {
        let server = TestServer::start(next_port()).await.unwrap();
        let client = server.client();

        let token = client.login(PASSWORD, None).await.unwrap().jwt;
        let (status, body) = client
            .principal(Some(&format!("Token {}", token)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&body), "invalid bearer format");
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let server = TestServer::start(next_port()).await.unwrap();

        let (status, body) = server.client().principal(None).await.unwrap();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&body), "missing header");
    }

    #[tokio::test]
    async fn test_foreign_key_rejected() {
        let server = TestServer::start(next_port()).await.unwrap();

        let foreign = Keypair::from_pem_file(key_path("rsa4096_b_pkcs8.pem")).unwrap();
        let issuer = TokenIssuer::new(&foreign, TokenConfig::default()).unwrap();
        let token = issuer.issue(USERNAME, "apr").unwrap();

        let (status, body) = server
            .client()
            .principal(Some(&format!("Bearer {}", token)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&body), "invalid token");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let server = TestServer::start(next_port()).await.unwrap();

        let keypair = Keypair::from_pem_file(key_path("rsa4096_a.pem")).unwrap();
        let issuer = TokenIssuer::new(&keypair, TokenConfig::default()).unwrap();
        // Issued in 2001.
        let token = issuer.issue_at(USERNAME, "apr", 1_000_000_000).unwrap();

        let (status, body) = server
            .client()
            .principal(Some(&format!("Bearer {}", token)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_of(&body), "invalid token");
    }

    #[tokio::test]
    async fn test_token_for_other_service_rejected() {
        let server = TestServer::start(next_port()).await.unwrap();
        let client = server.client();

        let token = client
            .login(PASSWORD, Some("javne_nabavke"))
            .await
            .unwrap()
            .jwt;
        let (status, _) = client
            .principal(Some(&format!("Bearer {}", token)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_sso_issues_token_for_service() {
        let server = TestServer::start(next_port()).await.unwrap();
        let client = server.client();

        let token = client.login(PASSWORD, None).await.unwrap().jwt;
        let sso = client.sso(&token, "javne_nabavke").await.unwrap().jwt;

        let public = PublicKey::from_pem_file(key_path("rsa4096_a_pub.pem")).unwrap();
        let verifier = TokenVerifier::new(&public).unwrap();
        let claims = verifier.verify(&sso, "javne_nabavke", "apr").unwrap();
        assert_eq!(claims.sub, USERNAME);
    }

    #[test]
    fn test_missing_key_is_fatal_without_dev_mode() {
        let dir = TempDir::new().unwrap();
        let server_binary = find_server_binary().unwrap();

        let status = Command::new(&server_binary)
            .arg("--private-key")
            .arg(dir.path().join("absent.pem"))
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", next_port()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();

        assert!(!status.success());
    }

    #[test]
    fn test_weak_key_is_fatal() {
        let server_binary = find_server_binary().unwrap();

        let status = Command::new(&server_binary)
            .arg("--dev")
            .arg("--private-key")
            .arg(key_path("rsa2048_weak.pem"))
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", next_port()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();

        assert!(!status.success());
    }
}
