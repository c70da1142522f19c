//! Firebase Cloud Messaging (HTTP v1).
//!
//! Access tokens come from the service-account flow: an RS256-signed JWT is
//! exchanged at the key's token endpoint and the resulting bearer token is
//! cached until five minutes before it expires.

use super::NotifyError;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 300;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Fields of a service-account key file used for signing.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account email, the JWT issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Key id placed in the JWT header.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// OAuth token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Parses a key from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Auth`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, NotifyError> {
        serde_json::from_str(json)
            .map_err(|e| NotifyError::Auth(format!("invalid service account key: {e}")))
    }

    /// Reads and parses a key file.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Auth`] if the file is unreadable or malformed.
    pub async fn load(path: &Path) -> Result<Self, NotifyError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            NotifyError::Auth(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    refresh_at: i64,
}

/// Push recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    /// A single device registration token.
    Token(String),
    /// Every device subscribed to a topic.
    Topic(String),
}

impl PushTarget {
    /// Display form used in delivery records.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Token(_) => "device".to_string(),
            Self::Topic(topic) => format!("topic:{topic}"),
        }
    }
}

/// A notification to push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    /// Recipient.
    pub target: PushTarget,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Extra key/value data delivered to the app.
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    /// Creates a message without data.
    #[must_use]
    pub fn new(target: PushTarget, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            target,
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    /// Adds a data entry.
    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    fn to_json(&self) -> serde_json::Value {
        let mut message = serde_json::json!({
            "notification": { "title": self.title, "body": self.body },
            "data": self.data,
        });
        match &self.target {
            PushTarget::Token(token) => message["token"] = token.as_str().into(),
            PushTarget::Topic(topic) => message["topic"] = topic.as_str().into(),
        }
        serde_json::json!({ "message": message })
    }
}

/// Sends push notifications.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Delivers one notification.
    async fn push(&self, message: &PushMessage) -> Result<(), NotifyError>;
}

/// FCM HTTP v1 client.
#[derive(Debug)]
pub struct FcmClient {
    http: Client,
    project_id: String,
    key: ServiceAccountKey,
    endpoint: String,
    token: Mutex<Option<AccessToken>>,
}

impl FcmClient {
    /// Creates a client for `project_id`.
    #[must_use]
    pub fn new(http: Client, project_id: impl Into<String>, key: ServiceAccountKey) -> Self {
        Self {
            http,
            project_id: project_id.into(),
            key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Overrides the FCM base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint.trim_end_matches('/'),
            self.project_id
        )
    }

    /// Returns a cached access token or fetches a new one.
    async fn access_token(&self) -> Result<String, NotifyError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref().filter(|t| now < t.refresh_at) {
            return Ok(token.token.clone());
        }

        let token = self.fetch_token(now).await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self, now: i64) -> Result<AccessToken, NotifyError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default)]
            expires_in: Option<i64>,
        }

        let claims = Claims {
            iss: self.key.client_email.clone(),
            scope: SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            exp: now + ASSERTION_LIFETIME_SECS,
            iat: now,
        };
        let header = Header {
            kid: self.key.private_key_id.clone(),
            ..Header::new(Algorithm::RS256)
        };

        // Key files sometimes carry escaped newlines
        let pem = self.key.private_key.replace("\\n", "\n");
        let signing_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| NotifyError::Auth(format!("invalid private key: {e}")))?;
        let assertion = encode(&header, &claims, &signing_key)
            .map_err(|e| NotifyError::Auth(format!("cannot sign assertion: {e}")))?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Auth(format!(
                "token exchange failed (HTTP {status}): {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Auth(format!("invalid token response: {e}")))?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        debug!(lifetime, "fcm access token refreshed");

        Ok(AccessToken {
            token: token.access_token,
            refresh_at: now + lifetime - REFRESH_MARGIN_SECS,
        })
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn push(&self, message: &PushMessage) -> Result<(), NotifyError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(self.send_url())
            .bearer_auth(token)
            .json(&message.to_json())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                service: "FCM",
                message: format!("HTTP {status}: {body}"),
            })
        }
    }
}
