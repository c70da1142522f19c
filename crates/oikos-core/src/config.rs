//! Application configuration.
//!
//! Everything is read from environment variables (the binary loads `.env`
//! first). [`AppConfig::from_lookup`] takes any key lookup so tests never touch
//! the process environment.

use oikos_smtp::{Address, Security, SmtpConfig};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("{key} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Outgoing email.
    pub mail: MailConfig,
    /// Twilio SMS, when configured.
    pub twilio: Option<TwilioConfig>,
    /// Carrier email-to-SMS gateways.
    pub sms_gateways: SmsGatewayTable,
    /// Google Sheets webhook, when configured.
    pub sheets: Option<SheetsConfig>,
    /// Firebase Cloud Messaging, when configured.
    pub fcm: Option<FcmConfig>,
    /// Flat-file storage.
    pub storage: StorageConfig,
    /// Business details used in messages.
    pub business: BusinessProfile,
    /// Per-client request limits.
    pub rate_limit: RateLimitConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` string for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// How outgoing email is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailBackend {
    /// Deliver through the configured SMTP relay.
    #[default]
    Smtp,
    /// Log messages instead of sending them (local development).
    Log,
}

/// Outgoing email settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Delivery backend.
    pub backend: MailBackend,
    /// Relay settings passed to every send.
    pub smtp: SmtpConfig,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: String,
    /// Where admin notifications go.
    pub admin_email: String,
}

/// Twilio Messaging settings.
#[derive(Clone)]
pub struct TwilioConfig {
    /// Account SID.
    pub account_sid: String,
    /// Auth token.
    pub auth_token: String,
    /// Messaging service that picks the sender number.
    pub messaging_service_sid: String,
    /// Number that receives admin notifications.
    pub notify_number: String,
    /// API base URL.
    pub api_base: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("messaging_service_sid", &self.messaging_service_sid)
            .field("notify_number", &self.notify_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Carrier email-to-SMS gateway domains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsGatewayTable {
    /// `(carrier, domain)` pairs in the configured order.
    pub carriers: Vec<(String, String)>,
    /// Admin phone reached through the gateways.
    pub admin_phone: Option<String>,
}

impl SmsGatewayTable {
    /// Parses `carrier=domain,carrier=domain`.
    ///
    /// # Errors
    ///
    /// Returns an error for entries without `=` or with an empty half.
    pub fn parse(list: &str) -> Result<Vec<(String, String)>, ConfigError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (carrier, domain) = entry.split_once('=').ok_or_else(|| invalid(
                    "SMS_GATEWAY_DOMAINS",
                    format!("expected carrier=domain, got {entry:?}"),
                ))?;
                let (carrier, domain) = (carrier.trim(), domain.trim().trim_start_matches('@'));
                if carrier.is_empty() || domain.is_empty() {
                    return Err(invalid(
                        "SMS_GATEWAY_DOMAINS",
                        format!("empty carrier or domain in {entry:?}"),
                    ));
                }
                Ok((carrier.to_string(), domain.to_string()))
            })
            .collect()
    }

    /// Whether any gateway is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }
}

/// Google Sheets webhook settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    /// Apps Script deployment URL.
    pub webhook_url: String,
    /// Target sheet, forwarded in the payload.
    pub sheet_id: Option<String>,
}

/// Firebase Cloud Messaging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcmConfig {
    /// Firebase project id.
    pub project_id: String,
    /// Path to the service account JSON key.
    pub service_account: PathBuf,
    /// Topic that receives booking notifications.
    pub topic: String,
}

/// Flat-file storage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding the logs and `bookings.json`.
    pub data_dir: PathBuf,
}

/// Business details shown in customer messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessProfile {
    /// Business name.
    pub name: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// Website.
    pub website: String,
    /// Location line.
    pub location: String,
    /// Country calling code used to normalize local numbers.
    pub country_code: String,
}

/// Per-client request limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 8080)?,
        };

        let mail = mail_config(&get)?;
        let business = BusinessProfile {
            name: get("BUSINESS_NAME").unwrap_or_else(|| mail.from_name.clone()),
            phone: get("BUSINESS_PHONE").unwrap_or_else(|| "+63 994 896 2820".to_string()),
            email: get("BUSINESS_EMAIL").unwrap_or_else(|| mail.admin_email.clone()),
            website: get("BUSINESS_WEBSITE")
                .unwrap_or_else(|| "www.oikosorchardandfarm.com".to_string()),
            location: get("BUSINESS_LOCATION")
                .unwrap_or_else(|| "Oikos Orchard & Farm, Valley Region".to_string()),
            country_code: get("COUNTRY_CODE").unwrap_or_else(|| "+63".to_string()),
        };

        let twilio = match (get("TWILIO_ACCOUNT_SID"), get("TWILIO_AUTH_TOKEN")) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                messaging_service_sid: get("TWILIO_MESSAGING_SERVICE_SID")
                    .ok_or(ConfigError::Missing("TWILIO_MESSAGING_SERVICE_SID"))?,
                notify_number: get("NOTIFY_PHONE_NUMBER")
                    .ok_or(ConfigError::Missing("NOTIFY_PHONE_NUMBER"))?,
                api_base: get("TWILIO_API_BASE")
                    .unwrap_or_else(|| "https://api.twilio.com".to_string()),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("TWILIO_AUTH_TOKEN")),
            (None, Some(_)) => return Err(ConfigError::Missing("TWILIO_ACCOUNT_SID")),
        };

        let sms_gateways = SmsGatewayTable {
            carriers: get("SMS_GATEWAY_DOMAINS")
                .map(|list| SmsGatewayTable::parse(&list))
                .transpose()?
                .unwrap_or_default(),
            admin_phone: get("ADMIN_PHONE"),
        };

        let sheets = get("SHEETS_WEBHOOK_URL").map(|webhook_url| SheetsConfig {
            webhook_url,
            sheet_id: get("SHEETS_SHEET_ID"),
        });

        let fcm = match (get("FCM_PROJECT_ID"), get("FCM_SERVICE_ACCOUNT")) {
            (Some(project_id), Some(path)) => Some(FcmConfig {
                project_id,
                service_account: PathBuf::from(path),
                topic: get("FCM_TOPIC").unwrap_or_else(|| "bookings".to_string()),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("FCM_SERVICE_ACCOUNT")),
            (None, Some(_)) => return Err(ConfigError::Missing("FCM_PROJECT_ID")),
        };

        let storage = StorageConfig {
            data_dir: get("DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: parse_or("RATE_LIMIT_MAX", get("RATE_LIMIT_MAX"), defaults.max_requests)?,
            window: Duration::from_secs(parse_or(
                "RATE_LIMIT_WINDOW_SECS",
                get("RATE_LIMIT_WINDOW_SECS"),
                defaults.window.as_secs(),
            )?),
        };

        Ok(Self {
            server,
            mail,
            twilio,
            sms_gateways,
            sheets,
            fcm,
            storage,
            business,
            rate_limit,
        })
    }
}

fn mail_config(get: &impl Fn(&str) -> Option<String>) -> Result<MailConfig, ConfigError> {
    let backend = match get("MAIL_BACKEND").as_deref() {
        None | Some("smtp") => MailBackend::Smtp,
        Some("log") => MailBackend::Log,
        Some(other) => {
            return Err(invalid("MAIL_BACKEND", format!("expected smtp or log, got {other}")));
        }
    };

    let security = match get("SMTP_SECURITY") {
        Some(raw) => raw
            .parse::<Security>()
            .map_err(|reason| invalid("SMTP_SECURITY", reason))?,
        None => Security::StartTls,
    };

    let host = get("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string());
    let mut smtp = SmtpConfig::new(host, security)
        .port(parse_or("SMTP_PORT", get("SMTP_PORT"), security.default_port())?)
        .strict_envelope(parse_bool("SMTP_STRICT_ENVELOPE", get("SMTP_STRICT_ENVELOPE"), true)?);
    if let Some(name) = get("SMTP_CLIENT_NAME") {
        smtp.client_name = name;
    }

    let username = get("SMTP_USERNAME");
    match (&username, get("SMTP_PASSWORD")) {
        (Some(user), Some(password)) => smtp = smtp.credentials(user.clone(), password),
        (Some(_), None) => return Err(ConfigError::Missing("SMTP_PASSWORD")),
        (None, Some(_)) => return Err(ConfigError::Missing("SMTP_USERNAME")),
        (None, None) => {}
    }

    let from_address = get("MAIL_FROM_ADDRESS")
        .or(username)
        .ok_or(ConfigError::Missing("MAIL_FROM_ADDRESS"))?;
    check_address("MAIL_FROM_ADDRESS", &from_address)?;

    let admin_email = get("ADMIN_EMAIL").unwrap_or_else(|| from_address.clone());
    check_address("ADMIN_EMAIL", &admin_email)?;

    Ok(MailConfig {
        backend,
        smtp,
        from_address,
        from_name: get("MAIL_FROM_NAME").unwrap_or_else(|| "Oikos Orchard & Farm".to_string()),
        admin_email,
    })
}

fn check_address(key: &'static str, value: &str) -> Result<(), ConfigError> {
    Address::new(value)
        .map(|_| ())
        .map_err(|e| invalid(key, e.to_string()))
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |raw| {
        raw.parse().map_err(|e: T::Err| invalid(key, e.to_string()))
    })
}

fn parse_bool(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(invalid(key, format!("expected a boolean, got {other}"))),
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    const GMAIL: &[(&str, &str)] = &[
        ("SMTP_USERNAME", "farm@gmail.com"),
        ("SMTP_PASSWORD", "app-password"),
    ];

    #[test]
    fn gmail_defaults() {
        let config = load(GMAIL).unwrap();

        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.mail.backend, MailBackend::Smtp);
        assert_eq!(config.mail.smtp.host, "smtp.gmail.com");
        assert_eq!(config.mail.smtp.port, 587);
        assert_eq!(config.mail.smtp.security, Security::StartTls);
        assert!(config.mail.smtp.strict_envelope);
        assert_eq!(config.mail.from_address, "farm@gmail.com");
        assert_eq!(config.mail.admin_email, "farm@gmail.com");
        assert_eq!(config.mail.from_name, "Oikos Orchard & Farm");
        assert_eq!(config.business.country_code, "+63");
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert!(config.twilio.is_none());
        assert!(config.sheets.is_none());
        assert!(config.fcm.is_none());
        assert!(config.sms_gateways.is_empty());
    }

    #[test]
    fn sender_is_required() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing("MAIL_FROM_ADDRESS")
        );
    }

    #[test]
    fn half_configured_credentials_are_rejected() {
        let err = load(&[("SMTP_USERNAME", "farm@gmail.com")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SMTP_PASSWORD"));
    }

    #[test]
    fn implicit_tls_uses_465() {
        let mut vars = GMAIL.to_vec();
        vars.push(("SMTP_SECURITY", "ssl"));
        vars.push(("SMTP_STRICT_ENVELOPE", "false"));
        let config = load(&vars).unwrap();
        assert_eq!(config.mail.smtp.security, Security::Tls);
        assert_eq!(config.mail.smtp.port, 465);
        assert!(!config.mail.smtp.strict_envelope);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let mut vars = GMAIL.to_vec();
        vars.push(("SMTP_PORT", "smtp"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "SMTP_PORT", .. }
        ));

        let mut vars = GMAIL.to_vec();
        vars.push(("ADMIN_EMAIL", "not-an-address"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid { key: "ADMIN_EMAIL", .. }
        ));
    }

    #[test]
    fn twilio_requires_all_parts() {
        let mut vars = GMAIL.to_vec();
        vars.push(("TWILIO_ACCOUNT_SID", "AC123"));
        vars.push(("TWILIO_AUTH_TOKEN", "token"));
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("TWILIO_MESSAGING_SERVICE_SID")
        );

        vars.push(("TWILIO_MESSAGING_SERVICE_SID", "MG123"));
        vars.push(("NOTIFY_PHONE_NUMBER", "+639177770851"));
        let twilio = load(&vars).unwrap().twilio.unwrap();
        assert_eq!(twilio.api_base, "https://api.twilio.com");
        assert!(!format!("{twilio:?}").contains("token\""));
    }

    #[test]
    fn gateway_table_parses() {
        let carriers = SmsGatewayTable::parse("globe=@text.globe.test, smart = sms.smart.test").unwrap();
        assert_eq!(
            carriers,
            vec![
                ("globe".to_string(), "text.globe.test".to_string()),
                ("smart".to_string(), "sms.smart.test".to_string()),
            ]
        );
        assert!(SmsGatewayTable::parse("globe").is_err());
        assert!(SmsGatewayTable::parse("=x.test").is_err());
        assert!(SmsGatewayTable::parse("").unwrap().is_empty());
    }

    #[test]
    fn optional_channels() {
        let mut vars = GMAIL.to_vec();
        vars.push(("SHEETS_WEBHOOK_URL", "https://script.google.test/exec"));
        vars.push(("FCM_PROJECT_ID", "oikos-orchard-and-farm"));
        vars.push(("FCM_SERVICE_ACCOUNT", "/etc/oikos/firebase.json"));
        vars.push(("MAIL_BACKEND", "log"));
        let config = load(&vars).unwrap();

        assert_eq!(config.mail.backend, MailBackend::Log);
        assert_eq!(config.sheets.unwrap().sheet_id, None);
        let fcm = config.fcm.unwrap();
        assert_eq!(fcm.topic, "bookings");
        assert_eq!(fcm.service_account, PathBuf::from("/etc/oikos/firebase.json"));
    }
}
