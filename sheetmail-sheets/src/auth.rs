//! OAuth credentials for the Sheets API.
//!
//! # Files
//!
//! ```text
//! credentials.json   client secret downloaded from the cloud console (read-only)
//! token.json         stored access/refresh token (written by the bootstrap)
//! ```
//!
//! # Bootstrap
//!
//! When no token is stored, the operator opens [`OAuthCredentialProvider::authorization_url`],
//! pastes the code back, and [`OAuthCredentialProvider::exchange_code`] stores
//! the token. Later runs read `token.json` and refresh it when expired.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{http_err, io_err, SheetsError};

/// Read-only spreadsheet scope.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Out-of-band redirect used when the secret lists no redirect URI.
const OOB_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";
/// Treat a token as expired this long before its real expiry.
const EXPIRY_SKEW_MS: i64 = 60_000;

// ---------------------------------------------------------------------------
// Client secrets
// ---------------------------------------------------------------------------

/// OAuth client identity from `credentials.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load the `installed` (or, failing that, `web`) client from `path`.
    pub fn load(path: &Path) -> Result<Self, SheetsError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SheetsError::CredentialsLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: CredentialsFile =
            serde_json::from_str(&contents).map_err(|e| SheetsError::CredentialsInvalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        file.installed
            .or(file.web)
            .ok_or_else(|| SheetsError::CredentialsInvalid {
                path: path.to_path_buf(),
                message: "expected an 'installed' or 'web' client section".to_string(),
            })
    }

    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(OOB_REDIRECT)
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// On-disk token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Expiry as milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    /// `true` when the token is expired (or about to be) at `now_ms`.
    /// Tokens without an expiry never expire.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expiry_date
            .map(|expiry| now_ms + EXPIRY_SKEW_MS >= expiry)
            .unwrap_or(false)
    }

    /// Load a token from `path`; `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, SheetsError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Save atomically: `<path>.tmp` then rename.
    pub fn save(&self, path: &Path) -> Result<(), SheetsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let tmp = PathBuf::from(format!("{}.tmp", path.display()));
        let json = serde_json::to_string(self)?;
        write_private(&tmp, json.as_bytes())?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(path, e));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_stored(self, now_ms: i64, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            scope: self.scope,
            token_type: self.token_type,
            expiry_date: self.expires_in.map(|secs| now_ms + secs * 1000),
        }
    }
}

/// Opaque bearer credential handed to the fetcher.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        AccessToken(secret.into())
    }

    pub(crate) fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// CredentialProvider
// ---------------------------------------------------------------------------

/// Supplies the handle a fetcher authenticates with.
pub trait CredentialProvider {
    fn authorize(&self) -> Result<AccessToken, SheetsError>;
}

/// Installed-app OAuth flow backed by `credentials.json` + `token.json`.
pub struct OAuthCredentialProvider {
    secrets: ClientSecrets,
    token_path: PathBuf,
    agent: ureq::Agent,
}

impl OAuthCredentialProvider {
    pub fn new(secrets: ClientSecrets, token_path: impl Into<PathBuf>) -> Self {
        OAuthCredentialProvider {
            secrets,
            token_path: token_path.into(),
            agent: ureq::Agent::new(),
        }
    }

    /// Load client secrets from `credentials_path`.
    pub fn from_files(
        credentials_path: &Path,
        token_path: impl Into<PathBuf>,
    ) -> Result<Self, SheetsError> {
        Ok(Self::new(ClientSecrets::load(credentials_path)?, token_path))
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Whether a token has been stored by an earlier bootstrap.
    pub fn has_token(&self) -> bool {
        self.token_path.exists()
    }

    /// URL the operator visits to grant read-only spreadsheet access.
    pub fn authorization_url(&self) -> Result<String, SheetsError> {
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("access_type", "offline"),
                ("scope", scope.as_str()),
                ("response_type", "code"),
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", self.secrets.redirect_uri()),
            ],
        )?;
        Ok(url.into())
    }

    /// Trade the pasted authorization `code` for a token and store it.
    pub fn exchange_code(&self, code: &str) -> Result<StoredToken, SheetsError> {
        let response = self
            .agent
            .post(&self.secrets.token_uri)
            .send_form(&[
                ("code", code.trim()),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("redirect_uri", self.secrets.redirect_uri()),
                ("grant_type", "authorization_code"),
            ])
            .map_err(http_err)?;
        let body: TokenResponse = response
            .into_json()
            .map_err(|e| SheetsError::Transport(e.to_string()))?;
        let token = body.into_stored(Utc::now().timestamp_millis(), None);
        token.save(&self.token_path)?;
        tracing::info!(path = %self.token_path.display(), "token stored");
        Ok(token)
    }

    fn refresh(&self, token: &StoredToken, refresh_token: &str) -> Result<StoredToken, SheetsError> {
        tracing::debug!("access token expired, refreshing");
        let response = self
            .agent
            .post(&self.secrets.token_uri)
            .send_form(&[
                ("refresh_token", refresh_token),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .map_err(http_err)?;
        let body: TokenResponse = response
            .into_json()
            .map_err(|e| SheetsError::Transport(e.to_string()))?;
        let refreshed = body.into_stored(
            Utc::now().timestamp_millis(),
            token.refresh_token.clone(),
        );
        refreshed.save(&self.token_path)?;
        Ok(refreshed)
    }
}

impl CredentialProvider for OAuthCredentialProvider {
    fn authorize(&self) -> Result<AccessToken, SheetsError> {
        let token = StoredToken::load(&self.token_path)?.ok_or_else(|| SheetsError::TokenMissing {
            path: self.token_path.clone(),
        })?;
        let token = match token.refresh_token.as_deref() {
            Some(refresh) if token.is_expired_at(Utc::now().timestamp_millis()) => {
                self.refresh(&token, refresh)?
            }
            _ => token,
        };
        Ok(AccessToken::new(token.access_token))
    }
}

/// Write `bytes` to a fresh file that is owner-only from the moment it exists.
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), SheetsError> {
    use std::io::Write;

    // A leftover file would keep its old mode; start from scratch.
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path, e)),
    }
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| io_err(path, e))?;
    file.write_all(bytes).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn secrets() -> ClientSecrets {
        ClientSecrets {
            client_id: "cid.apps.example".to_string(),
            client_secret: "shh".to_string(),
            redirect_uris: vec!["http://localhost".to_string()],
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        }
    }

    #[test]
    fn loads_installed_client() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"installed":{"client_id":"a","client_secret":"b","redirect_uris":["urn:x"]}}"#,
        )
        .unwrap();
        let s = ClientSecrets::load(&path).unwrap();
        assert_eq!(s.client_id, "a");
        assert_eq!(s.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(s.redirect_uri(), "urn:x");
    }

    #[test]
    fn credentials_without_client_section_are_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"other":{}}"#).unwrap();
        let err = ClientSecrets::load(&path).unwrap_err();
        assert!(matches!(err, SheetsError::CredentialsInvalid { .. }), "got: {err}");
    }

    #[test]
    fn missing_credentials_file_names_the_problem() {
        let dir = TempDir::new().unwrap();
        let err = ClientSecrets::load(&dir.path().join("credentials.json")).unwrap_err();
        assert!(err.to_string().starts_with("Error loading client secret file"));
    }

    #[test]
    fn authorization_url_requests_offline_readonly_access() {
        let provider = OAuthCredentialProvider::new(secrets(), "token.json");
        let url = Url::parse(&provider.authorization_url().unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("access_type".into(), "offline".into())));
        assert!(pairs.contains(&("scope".into(), SCOPES[0].into())));
        assert!(pairs.contains(&("client_id".into(), "cid.apps.example".into())));
    }

    #[test]
    fn token_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let token = StoredToken {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            scope: None,
            token_type: Some("Bearer".into()),
            expiry_date: Some(1),
        };
        token.save(&path).unwrap();
        assert!(!dir.path().join("token.json.tmp").exists());
        assert_eq!(StoredToken::load(&path).unwrap(), Some(token));
    }

    #[test]
    #[cfg(unix)]
    fn saved_token_is_owner_only_even_over_stale_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        let stale = dir.path().join("token.json.tmp");
        std::fs::write(&stale, "old").unwrap();
        std::fs::set_permissions(&stale, std::fs::Permissions::from_mode(0o644)).unwrap();

        StoredToken {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            scope: None,
            token_type: None,
            expiry_date: None,
        }
        .save(&path)
        .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(!stale.exists());
        assert_eq!(StoredToken::load(&path).unwrap().unwrap().access_token, "at");
    }

    #[test]
    fn expiry_uses_skew() {
        let token = StoredToken {
            access_token: "at".into(),
            refresh_token: None,
            scope: None,
            token_type: None,
            expiry_date: Some(100_000),
        };
        assert!(!token.is_expired_at(0));
        assert!(token.is_expired_at(100_000 - EXPIRY_SKEW_MS));
        let forever = StoredToken { expiry_date: None, ..token };
        assert!(!forever.is_expired_at(i64::MAX - EXPIRY_SKEW_MS));
    }

    #[test]
    fn authorize_without_token_asks_for_bootstrap() {
        let dir = TempDir::new().unwrap();
        let provider = OAuthCredentialProvider::new(secrets(), dir.path().join("token.json"));
        assert!(!provider.has_token());
        let err = provider.authorize().unwrap_err();
        assert!(matches!(err, SheetsError::TokenMissing { .. }), "got: {err}");
    }

    #[test]
    fn authorize_uses_unexpired_token_without_network() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        StoredToken {
            access_token: "live".into(),
            refresh_token: Some("rt".into()),
            scope: None,
            token_type: None,
            expiry_date: None,
        }
        .save(&path)
        .unwrap();
        let provider = OAuthCredentialProvider::new(secrets(), &path);
        assert_eq!(provider.authorize().unwrap(), AccessToken::new("live"));
    }

    #[test]
    fn access_token_debug_is_redacted() {
        assert_eq!(format!("{:?}", AccessToken::new("secret")), "AccessToken(<redacted>)");
    }
}
