//! Apple Push Notification service delivery.
//!
//! [`ApnsClient`] signs a provider token (ES256 JWT) with the team's `.p8`
//! key and POSTs one request per device to the APNs HTTP/2 API. Delivery is
//! a single attempt: a failed push is reported to the dispatcher, which logs
//! it and moves on.
//!
//! When the provider is not configured, [`ApnsConfig::from_env`] returns
//! `None` and the server wires in [`DisabledPush`] instead.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use evently_core::push::{Alert, PushMessage, PushPayload, PUSH_BADGE, PUSH_EXPIRY_SECS, PUSH_SOUND};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::sinks::{PushError, PushSink};

const PRODUCTION_HOST: &str = "https://api.push.apple.com";
const SANDBOX_HOST: &str = "https://api.sandbox.push.apple.com";

/// HTTP request timeout for a single push.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// APNs rejects provider tokens older than an hour; refresh well before that.
const TOKEN_REFRESH_AFTER: Duration = Duration::from_secs(50 * 60);

/// Alert pushes must be sent with immediate priority.
const APNS_PRIORITY: &str = "10";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the APNs provider.
#[derive(Debug, Clone)]
pub struct ApnsConfig {
    /// Path to the `.p8` signing key (PEM encoded).
    pub key_path: String,
    /// Identifier of the signing key, sent as the JWT `kid`.
    pub key_id: String,
    /// Apple developer team, sent as the JWT `iss`.
    pub team_id: String,
    /// App bundle identifier, sent as `apns-topic`.
    pub topic: String,
    /// Use the production gateway instead of the sandbox.
    pub production: bool,
}

impl ApnsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if any required variable is missing, signalling that
    /// push delivery is not configured and should be skipped.
    ///
    /// | Variable          | Required | Default |
    /// |-------------------|----------|---------|
    /// | `APNS_KEY_PATH`   | yes      |         |
    /// | `APNS_KEY_ID`     | yes      |         |
    /// | `APNS_TEAM_ID`    | yes      |         |
    /// | `APNS_TOPIC`      | yes      |         |
    /// | `APNS_PRODUCTION` | no       | `false` |
    pub fn from_env() -> Option<Self> {
        let key_path = std::env::var("APNS_KEY_PATH").ok()?;
        let key_id = std::env::var("APNS_KEY_ID").ok()?;
        let team_id = std::env::var("APNS_TEAM_ID").ok()?;
        let topic = std::env::var("APNS_TOPIC").ok()?;
        let production = std::env::var("APNS_PRODUCTION")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Some(Self {
            key_path,
            key_id,
            team_id,
            topic,
            production,
        })
    }

    pub fn host(&self) -> &'static str {
        if self.production {
            PRODUCTION_HOST
        } else {
            SANDBOX_HOST
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Aps {
    alert: Alert,
    badge: u32,
    sound: &'static str,
}

/// Request body: the `aps` dictionary plus the app's own keys.
#[derive(Debug, Serialize)]
struct ApnsBody {
    aps: Aps,
    #[serde(flatten)]
    payload: PushPayload,
}

impl ApnsBody {
    fn for_message(message: &PushMessage) -> Self {
        Self {
            aps: Aps {
                alert: message.alert(),
                badge: PUSH_BADGE,
                sound: PUSH_SOUND,
            },
            payload: message.payload(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApnsRejection {
    reason: String,
}

#[derive(Debug, Serialize)]
struct ProviderClaims<'a> {
    iss: &'a str,
    iat: i64,
}

struct ProviderToken {
    jwt: String,
    issued: Instant,
}

// ---------------------------------------------------------------------------
// ApnsClient
// ---------------------------------------------------------------------------

/// Sends alert pushes to Apple devices.
pub struct ApnsClient {
    client: reqwest::Client,
    config: ApnsConfig,
    key: EncodingKey,
    token: RwLock<Option<ProviderToken>>,
}

impl ApnsClient {
    /// Read the signing key and build the HTTP client.
    pub fn new(config: ApnsConfig) -> Result<Self, PushError> {
        let pem = std::fs::read(&config.key_path)
            .map_err(|e| PushError::Config(format!("{}: {e}", config.key_path)))?;
        let key = EncodingKey::from_ec_pem(&pem)?;
        let client = http_client()?;

        Ok(Self {
            client,
            config,
            key,
            token: RwLock::new(None),
        })
    }

    /// Return the cached provider token, signing a fresh one when stale.
    async fn provider_token(&self) -> Result<String, PushError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.issued.elapsed() < TOKEN_REFRESH_AFTER {
                return Ok(token.jwt.clone());
            }
        }

        let mut slot = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref() {
            if token.issued.elapsed() < TOKEN_REFRESH_AFTER {
                return Ok(token.jwt.clone());
            }
        }

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.clone());
        let claims = ProviderClaims {
            iss: &self.config.team_id,
            iat: chrono::Utc::now().timestamp(),
        };
        let jwt = jsonwebtoken::encode(&header, &claims, &self.key)?;
        tracing::debug!(key_id = %self.config.key_id, "Signed new APNs provider token");

        *slot = Some(ProviderToken {
            jwt: jwt.clone(),
            issued: Instant::now(),
        });
        Ok(jwt)
    }
}

/// APNs rejects HTTP/1.1, so the client skips ALPN negotiation and opens
/// every connection as HTTP/2.
fn http_client() -> Result<reqwest::Client, PushError> {
    let client = reqwest::Client::builder()
        .use_rustls_tls()
        .http2_prior_knowledge()
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}

fn build_request(
    client: &reqwest::Client,
    config: &ApnsConfig,
    jwt: &str,
    message: &PushMessage,
) -> Result<reqwest::Request, PushError> {
    let url = format!("{}/3/device/{}", config.host(), message.device_token);
    let expiration = chrono::Utc::now().timestamp() + PUSH_EXPIRY_SECS;

    let request = client
        .post(&url)
        .version(reqwest::Version::HTTP_2)
        .bearer_auth(jwt)
        .header("apns-topic", &config.topic)
        .header("apns-push-type", "alert")
        .header("apns-expiration", expiration.to_string())
        .header("apns-priority", APNS_PRIORITY)
        .json(&ApnsBody::for_message(message))
        .build()?;
    Ok(request)
}

#[async_trait]
impl PushSink for ApnsClient {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let jwt = self.provider_token().await?;
        let request = build_request(&self.client, &self.config, &jwt, message)?;
        let response = self.client.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .json::<ApnsRejection>()
                .await
                .map(|r| r.reason)
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(PushError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }

        tracing::debug!(
            event_id = message.event_id,
            kind = message.kind.as_str(),
            "Push sent",
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DisabledPush
// ---------------------------------------------------------------------------

/// Push sink used when no provider is configured. Drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPush;

#[async_trait]
impl PushSink for DisabledPush {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        tracing::debug!(
            event_id = message.event_id,
            kind = message.kind.as_str(),
            "Push delivery disabled, dropping message",
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use evently_core::push::PushKind;

    use super::*;

    fn message(kind: PushKind, event_name: Option<&str>, folder_name: Option<&str>) -> PushMessage {
        PushMessage {
            kind,
            event_id: 42,
            device_token: "abc123".into(),
            event_name: event_name.map(str::to_string),
            folder_name: folder_name.map(str::to_string),
        }
    }

    #[test]
    fn body_carries_aps_and_app_keys() {
        let body = ApnsBody::for_message(&message(PushKind::EventInvite, Some("Picnic"), None));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["eventId"], 42);
        assert_eq!(json["type"], "event-invite");
        assert_eq!(json["aps"]["badge"], 3);
        assert_eq!(json["aps"]["sound"], "ping.aiff");
        assert_eq!(json["aps"]["alert"]["loc-key"], "EVENT_INVITE_NAMED");
        assert_eq!(json["aps"]["alert"]["loc-args"][0], "Picnic");
    }

    #[test]
    fn folder_push_body_names_the_folder() {
        let body = ApnsBody::for_message(&message(
            PushKind::EventUpdate,
            Some("Dinner"),
            Some("Friday"),
        ));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["type"], "event-update");
        assert_eq!(json["aps"]["alert"]["loc-key"], "FOLDER_EVENT_UPDATED");
        assert_eq!(json["aps"]["alert"]["loc-args"][1], "Friday");
    }

    #[test]
    fn host_follows_environment_flag() {
        let mut config = ApnsConfig {
            key_path: "/nonexistent.p8".into(),
            key_id: "KEY".into(),
            team_id: "TEAM".into(),
            topic: "app.evently".into(),
            production: false,
        };
        assert_eq!(config.host(), SANDBOX_HOST);
        config.production = true;
        assert_eq!(config.host(), PRODUCTION_HOST);
    }

    #[test]
    fn requests_go_out_as_http2_with_apns_headers() {
        let config = ApnsConfig {
            key_path: "/nonexistent.p8".into(),
            key_id: "KEY".into(),
            team_id: "TEAM".into(),
            topic: "app.evently".into(),
            production: true,
        };
        let client = http_client().unwrap();
        let request = build_request(
            &client,
            &config,
            "signed.jwt",
            &message(PushKind::Event, Some("Picnic"), None),
        )
        .unwrap();

        assert_eq!(request.version(), reqwest::Version::HTTP_2);
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://api.push.apple.com/3/device/abc123"
        );
        let headers = request.headers();
        assert_eq!(headers["authorization"], "Bearer signed.jwt");
        assert_eq!(headers["apns-topic"], "app.evently");
        assert_eq!(headers["apns-push-type"], "alert");
        assert_eq!(headers["apns-priority"], "10");
        let expiration: i64 = headers["apns-expiration"].to_str().unwrap().parse().unwrap();
        assert!(expiration > chrono::Utc::now().timestamp());
    }

    #[test]
    fn missing_key_file_is_a_config_error() {
        let config = ApnsConfig {
            key_path: "/nonexistent/evently-test.p8".into(),
            key_id: "KEY".into(),
            team_id: "TEAM".into(),
            topic: "app.evently".into(),
            production: false,
        };
        let result = ApnsClient::new(config);
        assert!(matches!(result, Err(PushError::Config(_))));
    }

    #[tokio::test]
    async fn disabled_push_accepts_everything() {
        let sink = DisabledPush;
        assert!(sink
            .send(&message(PushKind::Event, Some("Picnic"), None))
            .await
            .is_ok());
    }
}
