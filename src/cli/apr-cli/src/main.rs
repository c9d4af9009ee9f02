//! APR CLI - Command line interface.

use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use apr_crypto::Keypair;
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const MIN_PASSWORD_CHARS: usize = 12;
const MAX_PASSWORD_CHARS: usize = 72;

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "apr")]
#[command(about = "APR CLI - Log in, exchange tokens, and manage signing keys")]
#[command(version)]
struct Cli {
    /// APR server address
    #[arg(long, default_value = "http://localhost:7887", env = "APR_ADDR")]
    addr: String,

    /// Bearer token for protected commands
    #[arg(long, env = "APR_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print a token
    Login {
        /// Username
        #[arg(long)]
        username: String,
        /// Password (read from stdin if not provided)
        #[arg(long)]
        password: Option<String>,
        /// Service the token is for (defaults to the server's audience)
        #[arg(long)]
        service: Option<String>,
    },
    /// Exchange the current token for one addressed to another service
    Sso {
        /// Target service
        service: String,
    },
    /// Show the principal the current token authenticates
    Whoami,
    /// Check server status
    Status,
    /// Generate a 4096-bit RSA signing key
    Keygen {
        /// Private key output path (PKCS#1 PEM)
        #[arg(long)]
        out: PathBuf,
        /// Optional public key output path (SPKI PEM)
        #[arg(long)]
        public_out: Option<PathBuf>,
    },
    /// Hash a password for the server's credentials file
    HashPassword {
        /// Password (read from stdin if not provided)
        #[arg(long)]
        password: Option<String>,
    },
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct JwtResponse {
    jwt: String,
}

#[derive(Debug, Deserialize)]
struct PrincipalResponse {
    principal: String,
    expires_at: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// HTTP Client
// ============================================================================

struct AprClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl AprClient {
    fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .token
            .as_ref()
            .context("Authentication token required. Set APR_TOKEN or use --token")?;
        Ok(req.bearer_auth(token))
    }

    async fn health(&self) -> Result<HealthResponse> {
        let resp = self
            .client
            .get(self.url("/api/health"))
            .send()
            .await
            .context("Failed to connect to server")?;

        parse(resp, "Server error").await
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
        service: Option<&str>,
    ) -> Result<JwtResponse> {
        let req = LoginRequest {
            username,
            password,
            service,
        };

        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&req)
            .send()
            .await
            .context("Failed to connect to server")?;

        parse(resp, "Login failed").await
    }

    async fn sso(&self, service: &str) -> Result<JwtResponse> {
        let resp = self
            .bearer(
                self.client
                    .post(self.url(&format!("/api/auth/login/{service}"))),
            )?
            .send()
            .await
            .context("Failed to connect to server")?;

        parse(resp, "SSO login failed").await
    }

    async fn principal(&self) -> Result<PrincipalResponse> {
        let resp = self
            .bearer(self.client.get(self.url("/api/auth/principal")))?
            .send()
            .await
            .context("Failed to connect to server")?;

        parse(resp, "Request failed").await
    }
}

async fn parse<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    if !resp.status().is_success() {
        let status = resp.status();
        let error: ErrorResponse = resp.json().await.unwrap_or(ErrorResponse {
            error: "Unknown error".into(),
        });
        bail!("{what} ({status}): {}", error.error);
    }

    resp.json().await.context("Failed to parse response")
}

// ============================================================================
// Command Handlers
// ============================================================================

async fn cmd_status(client: &AprClient) -> Result<()> {
    let health = client.health().await?;

    println!("APR server status:");
    println!("  Status:  {}", health.status);
    println!("  Version: {}", health.version);

    Ok(())
}

async fn cmd_login(
    client: &AprClient,
    username: &str,
    password: Option<String>,
    service: Option<&str>,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };

    let result = client.login(username, &password, service).await?;
    println!("{}", result.jwt);

    Ok(())
}

async fn cmd_sso(client: &AprClient, service: &str) -> Result<()> {
    let result = client.sso(service).await?;
    println!("{}", result.jwt);
    Ok(())
}

async fn cmd_whoami(client: &AprClient) -> Result<()> {
    let result = client.principal().await?;

    println!("Principal:  {}", result.principal);
    println!("Expires at: {} (unix)", result.expires_at);

    Ok(())
}

fn cmd_keygen(out: &Path, public_out: Option<&Path>) -> Result<()> {
    println!("Generating 4096-bit RSA key (this can take a while)...");

    let keypair = Keypair::generate()?;
    let pem = keypair.private_key_pem()?;
    write_private(out, pem.as_bytes())
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Private key written to {}", out.display());

    if let Some(path) = public_out {
        std::fs::write(path, keypair.public_key().to_pem()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Public key written to {}", path.display());
    }

    Ok(())
}

fn cmd_hash_password(password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ")?,
    };

    println!("{}", hash_password(&password)?);
    Ok(())
}

fn hash_password(password: &str) -> Result<String> {
    check_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn check_password(password: &str) -> Result<()> {
    let chars = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&chars) {
        bail!(
            "Password must be between {MIN_PASSWORD_CHARS} and {MAX_PASSWORD_CHARS} characters long"
        );
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();

    if value.is_empty() {
        bail!("Input cannot be empty");
    }
    Ok(value)
}

/// Creates `path` readable by the owner only and writes `contents`.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)?.write_all(contents)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = AprClient::new(&cli.addr, cli.token)?;

    match cli.command {
        Commands::Status => cmd_status(&client).await,
        Commands::Login {
            username,
            password,
            service,
        } => cmd_login(&client, &username, password, service.as_deref()).await,
        Commands::Sso { service } => cmd_sso(&client, &service).await,
        Commands::Whoami => cmd_whoami(&client).await,
        Commands::Keygen { out, public_out } => cmd_keygen(&out, public_out.as_deref()),
        Commands::HashPassword { password } => cmd_hash_password(password),
    }
}
