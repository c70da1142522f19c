//! SMS through the Twilio Messages API.

use super::NotifyError;
use crate::config::TwilioConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends text messages.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Sends `body` to `to` (E.164) and returns the provider message id.
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifyError>;
}

/// Twilio REST client.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: Client,
    config: TwilioConfig,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: Option<String>,
    message: Option<String>,
}

impl TwilioClient {
    /// Creates a client sharing `http`.
    #[must_use]
    pub const fn new(http: Client, config: TwilioConfig) -> Self {
        Self { http, config }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioClient {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifyError> {
        if !to.starts_with('+') {
            return Err(NotifyError::InvalidRecipient(to.to_string()));
        }

        let params = [
            ("MessagingServiceSid", self.config.messaging_service_sid.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(%status, "twilio response");

        let parsed: MessageResponse =
            serde_json::from_str(&text).map_err(|_| NotifyError::Rejected {
                service: "Twilio",
                message: "Invalid response from Twilio".to_string(),
            })?;

        match parsed.sid {
            Some(sid) => Ok(sid),
            None => Err(NotifyError::Rejected {
                service: "Twilio",
                message: parsed.message.unwrap_or_else(|| "Unknown error".to_string()),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::notify::http_stub;

    fn client(base: &str) -> TwilioClient {
        TwilioClient::new(
            Client::new(),
            TwilioConfig {
                account_sid: "AC123".into(),
                auth_token: "secret".into(),
                messaging_service_sid: "MG456".into(),
                notify_number: "+639948962820".into(),
                api_base: base.into(),
            },
        )
    }

    #[tokio::test]
    async fn posts_form_with_basic_auth() {
        let (base, mut requests) =
            http_stub::serve(vec![(201, r#"{"sid":"SM789","status":"queued"}"#)]).await;

        let sid = client(&base)
            .send_sms("+639171234567", "New Contact from Oikos Website")
            .await
            .unwrap();
        assert_eq!(sid, "SM789");

        let request = requests.recv().await.unwrap();
        assert_eq!(
            request.request_line,
            "POST /2010-04-01/Accounts/AC123/Messages.json HTTP/1.1"
        );
        // base64("AC123:secret")
        assert_eq!(request.header("authorization"), Some("Basic QUMxMjM6c2VjcmV0"));
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(
            request.body,
            "MessagingServiceSid=MG456&To=%2B639171234567&Body=New+Contact+from+Oikos+Website"
        );
    }

    #[tokio::test]
    async fn error_message_is_reported() {
        let (base, _requests) = http_stub::serve(vec![(
            400,
            r#"{"code":21211,"message":"The 'To' number is not valid."}"#,
        )])
        .await;

        let err = client(&base).send_sms("+630000", "hi").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Twilio rejected the request: The 'To' number is not valid."
        );
    }

    #[tokio::test]
    async fn missing_sid_without_message() {
        let (base, _requests) = http_stub::serve(vec![(500, "{}")]).await;
        let err = client(&base).send_sms("+639171234567", "hi").await.unwrap_err();
        assert!(err.to_string().ends_with("Unknown error"));
    }

    #[tokio::test]
    async fn non_json_response() {
        let (base, _requests) = http_stub::serve(vec![(502, "<html>bad gateway</html>")]).await;
        let err = client(&base).send_sms("+639171234567", "hi").await.unwrap_err();
        assert!(err.to_string().ends_with("Invalid response from Twilio"));
    }

    #[tokio::test]
    async fn local_numbers_are_refused() {
        let err = client("http://127.0.0.1:9")
            .send_sms("09171234567", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::InvalidRecipient(_)));
    }
}
