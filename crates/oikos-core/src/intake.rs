//! Form intake: validate, store, then notify.
//!
//! Each submission runs strictly in order. Only validation and storage can
//! fail a submission; every notification outcome is logged and returned on
//! the [`Receipt`].

use crate::config::{AppConfig, BusinessProfile, ConfigError, MailBackend, SmsGatewayTable};
use crate::error::Result;
use crate::form::{BookingForm, ContactForm, GetStartedForm, normalize_phone};
use crate::notify::{
    Channel, Delivery, FcmClient, LogMailer, Mailer, NotifyError, PushMessage, PushSender,
    PushTarget, ServiceAccountKey, SheetsWebhook, SmsSender, SmtpMailer, TwilioClient,
    gateway_addresses, templates,
};
use crate::storage::{BookingRecord, SubmissionStore, TIMESTAMP_FORMAT};
use chrono::Local;
use oikos_smtp::{Address, Mailbox, OutboundMessage};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reply shown after a contact message.
pub const CONTACT_RECEIVED: &str =
    "Thank you! Your message has been received. We will contact you soon.";
/// Reply shown after a booking.
pub const BOOKING_RECEIVED: &str =
    "Booking submitted successfully! Our team will contact you within 24 hours.";
/// Reply shown after a "get started" inquiry.
pub const GET_STARTED_RECEIVED: &str =
    "Thank you for your interest! Our team will contact you within 24 hours.";

/// Outcome of an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// Message for the visitor.
    pub message: String,
    /// Stored record, for bookings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Notification outcomes in the order they were attempted.
    pub deliveries: Vec<Delivery>,
}

impl Receipt {
    /// Deliveries that failed.
    pub fn failures(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| !d.is_ok())
    }
}

/// Notification channels used by the intake service.
pub struct Channels {
    /// Email delivery, also used for carrier SMS gateways.
    pub mailer: Arc<dyn Mailer>,
    /// Twilio SMS.
    pub sms: Option<Arc<dyn SmsSender>>,
    /// Push notifications.
    pub push: Option<Arc<dyn PushSender>>,
    /// Spreadsheet webhook for bookings.
    pub sheets: Option<SheetsWebhook>,
}

impl Channels {
    /// Builds the channels described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the FCM service account key cannot be loaded.
    pub async fn from_config(config: &AppConfig, http: reqwest::Client) -> Result<Self> {
        let mailer: Arc<dyn Mailer> = match config.mail.backend {
            MailBackend::Smtp => Arc::new(SmtpMailer::new(config.mail.smtp.clone())),
            MailBackend::Log => Arc::new(LogMailer),
        };

        let sms = config.twilio.clone().map(|twilio| {
            Arc::new(TwilioClient::new(http.clone(), twilio)) as Arc<dyn SmsSender>
        });

        let push = match &config.fcm {
            Some(fcm) => {
                let key = ServiceAccountKey::load(&fcm.service_account).await?;
                Some(Arc::new(FcmClient::new(http.clone(), &fcm.project_id, key)) as Arc<dyn PushSender>)
            }
            None => None,
        };

        let sheets = config
            .sheets
            .clone()
            .map(|sheets| SheetsWebhook::new(http.clone(), sheets));

        Ok(Self {
            mailer,
            sms,
            push,
            sheets,
        })
    }
}

/// Handles the three website forms.
pub struct IntakeService {
    store: SubmissionStore,
    channels: Channels,
    from: Mailbox,
    admin: Mailbox,
    notify_number: Option<String>,
    gateways: SmsGatewayTable,
    push_topic: Option<String>,
    business: BusinessProfile,
}

impl IntakeService {
    /// Creates the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender or admin address is unusable.
    pub fn new(config: &AppConfig, channels: Channels) -> Result<Self> {
        let from = Mailbox::with_name(&config.mail.from_name, &config.mail.from_address)
            .map_err(|e| ConfigError::Invalid {
                key: "MAIL_FROM_ADDRESS",
                reason: e.to_string(),
            })?;
        let admin = Mailbox::new(&config.mail.admin_email).map_err(|e| ConfigError::Invalid {
            key: "ADMIN_EMAIL",
            reason: e.to_string(),
        })?;

        Ok(Self {
            store: SubmissionStore::new(&config.storage.data_dir),
            channels,
            from,
            admin,
            notify_number: config.twilio.as_ref().map(|t| t.notify_number.clone()),
            gateways: config.sms_gateways.clone(),
            push_topic: config.fcm.as_ref().map(|f| f.topic.clone()),
            business: config.business.clone(),
        })
    }

    /// Submission storage.
    #[must_use]
    pub const fn store(&self) -> &SubmissionStore {
        &self.store
    }

    /// Handles a contact message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](crate::Error::Validation) for a bad form
    /// and [`Error::Storage`](crate::Error::Storage) if the log cannot be
    /// written; nothing is sent in either case.
    pub async fn submit_contact(&self, form: &ContactForm) -> Result<Receipt> {
        let message = form.validate()?;
        let now = Local::now();
        self.store.append_contact(&message, now).await?;
        info!(name = %message.name, "contact message logged");

        let mut deliveries = Vec::new();
        let submitted = now.format("%b %d, %Y | %-I:%M %p").to_string();
        let email = self.admin_email(
            templates::contact_subject(&message),
            templates::contact_admin_html(&message, &submitted, &self.business),
            &message.address,
        );
        deliveries.push(self.deliver_email(&email).await);
        deliveries.extend(self.notify_admin_sms(&templates::contact_sms(&message)).await);

        Ok(Receipt {
            message: CONTACT_RECEIVED.to_string(),
            data: None,
            deliveries,
        })
    }

    /// Handles a booking request.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad form or if the booking cannot be saved.
    pub async fn submit_booking(&self, form: &BookingForm) -> Result<Receipt> {
        let request = form.validate()?;
        let customer = request.address.clone();
        let record = BookingRecord::new(request, Local::now());
        self.store.save_booking(&record).await?;
        info!(id = %record.id, package = %record.package_name, "booking saved");

        let mut deliveries = Vec::new();

        if let Some(sheets) = &self.channels.sheets {
            let result = sheets.append(&record).await;
            deliveries.push(Delivery::record(Channel::Sheets, sheets.url(), &result));
        }

        let admin = self.admin_email(
            templates::booking_admin_subject(&record),
            templates::booking_admin_html(&record, &self.business),
            &customer,
        );
        deliveries.push(self.deliver_email(&admin).await);
        deliveries.push(
            self.deliver_customer_email(
                &customer,
                templates::booking_customer_subject(&self.business),
                templates::booking_customer_html(&record, &self.business),
            )
            .await,
        );

        if let (Some(push), Some(topic)) = (&self.channels.push, &self.push_topic) {
            let (title, body) = templates::booking_push(&record);
            let message = PushMessage::new(PushTarget::Topic(topic.clone()), title, body)
                .data("type", "booking")
                .data("bookingId", &record.id);
            let result = push.push(&message).await;
            deliveries.push(Delivery::record(Channel::Push, message.target.describe(), &result));
        }

        Ok(Receipt {
            message: BOOKING_RECEIVED.to_string(),
            data: Some(serde_json::to_value(&record)?),
            deliveries,
        })
    }

    /// Handles a "get started" inquiry from `client_ip`.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad form or if the logs cannot be written.
    pub async fn submit_get_started(
        &self,
        form: &GetStartedForm,
        client_ip: Option<IpAddr>,
    ) -> Result<Receipt> {
        let inquiry = form.validate()?;
        let now = Local::now();
        self.store.append_get_started(&inquiry, now, client_ip).await?;
        info!(name = %inquiry.name, interested = %inquiry.interested, "get started inquiry logged");

        let mut deliveries = Vec::new();
        let submitted = now.format(TIMESTAMP_FORMAT).to_string();

        let admin = self.admin_email(
            templates::get_started_admin_subject(&inquiry),
            templates::get_started_admin_html(&inquiry, &submitted, &self.business),
            &inquiry.address,
        );
        deliveries.push(self.deliver_email(&admin).await);
        deliveries.push(
            self.deliver_customer_email(
                &inquiry.address,
                templates::get_started_customer_subject(&self.business),
                templates::get_started_customer_html(&inquiry, &self.business),
            )
            .await,
        );

        deliveries.extend(
            self.notify_admin_sms(&templates::get_started_admin_sms(&inquiry))
                .await,
        );

        if let Some(sms) = &self.channels.sms {
            let number = normalize_phone(&inquiry.phone, &self.business.country_code);
            let text = templates::get_started_customer_sms(&inquiry, &self.business);
            let result = sms.send_sms(&number, &text).await;
            deliveries.push(Delivery::record(Channel::Sms, number, &result));
        }

        Ok(Receipt {
            message: GET_STARTED_RECEIVED.to_string(),
            data: None,
            deliveries,
        })
    }

    fn admin_email(&self, subject: String, html: String, reply_to: &Address) -> OutboundMessage {
        OutboundMessage::new(self.from.clone(), subject, html)
            .to(self.admin.clone())
            .reply_to(Mailbox::from(reply_to.clone()))
            .html()
    }

    async fn deliver_email(&self, email: &OutboundMessage) -> Delivery {
        let recipient = email
            .to
            .iter()
            .map(|m| m.address.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let result = self.channels.mailer.send(email).await;
        Delivery::record(Channel::Email, recipient, &result)
    }

    async fn deliver_customer_email(&self, to: &Address, subject: String, html: String) -> Delivery {
        let email = OutboundMessage::new(self.from.clone(), subject, html)
            .to(Mailbox::from(to.clone()))
            .reply_to(self.admin.clone())
            .html();
        self.deliver_email(&email).await
    }

    /// Sends an SMS to the admin.
    ///
    /// Twilio is used when configured. Otherwise the text goes to every carrier
    /// gateway, and if none of them accepts it the admin gets it by email.
    async fn notify_admin_sms(&self, text: &str) -> Vec<Delivery> {
        if let (Some(sms), Some(number)) = (&self.channels.sms, &self.notify_number) {
            let result = sms.send_sms(number, text).await;
            return vec![Delivery::record(Channel::Sms, number.clone(), &result)];
        }

        let Some(phone) = &self.gateways.admin_phone else {
            debug!("no SMS channel configured");
            return Vec::new();
        };
        let addresses = gateway_addresses(phone, &self.business.country_code, &self.gateways);
        if addresses.is_empty() {
            debug!("no SMS gateway configured");
            return Vec::new();
        }

        let mut deliveries = Vec::with_capacity(addresses.len() + 1);
        for address in addresses {
            let result = match Mailbox::new(&address) {
                Ok(to) => {
                    let email =
                        OutboundMessage::new(self.from.clone(), self.business.name.clone(), text)
                            .to(to);
                    self.channels.mailer.send(&email).await
                }
                Err(e) => Err(NotifyError::from(e)),
            };
            deliveries.push(Delivery::record(Channel::SmsGateway, address, &result));
        }

        if deliveries.iter().all(|d| !d.is_ok()) {
            warn!("every SMS gateway failed, emailing the admin instead");
            let email = OutboundMessage::new(
                self.from.clone(),
                format!("SMS notification - {}", self.business.name),
                text,
            )
            .to(self.admin.clone());
            deliveries.push(self.deliver_email(&email).await);
        }

        deliveries
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::form::ValidationError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundMessage>>,
        // Recipients whose domain ends with one of these are refused
        refuse: Vec<&'static str>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &OutboundMessage) -> std::result::Result<(), NotifyError> {
            let refused = message
                .to
                .iter()
                .any(|m| self.refuse.iter().any(|r| m.address.as_str().ends_with(r)));
            if refused {
                return Err(NotifyError::Rejected {
                    service: "SMTP",
                    message: "550 mailbox unavailable".into(),
                });
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSms {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl SmsSender for RecordingSms {
        async fn send_sms(&self, to: &str, body: &str) -> std::result::Result<String, NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected {
                    service: "Twilio",
                    message: "Unknown error".into(),
                });
            }
            self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
            Ok("SM1".into())
        }
    }

    #[derive(Default)]
    struct RecordingPush {
        sent: Mutex<Vec<PushMessage>>,
    }

    #[async_trait]
    impl PushSender for RecordingPush {
        async fn push(&self, message: &PushMessage) -> std::result::Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct Harness {
        service: IntakeService,
        mailer: Arc<RecordingMailer>,
        sms: Arc<RecordingSms>,
        push: Arc<RecordingPush>,
        dir: TempDir,
    }

    fn config(dir: &TempDir, extra: &[(&str, &str)]) -> AppConfig {
        let mut vars: HashMap<String, String> = [
            ("SMTP_USERNAME", "farm@example.com"),
            ("SMTP_PASSWORD", "app-password"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("BUSINESS_NAME", "Oikos Orchard & Farm"),
        ]
        .into_iter()
        .chain(extra.iter().copied())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        vars.insert("DATA_DIR".into(), dir.path().display().to_string());
        AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    fn harness(extra: &[(&str, &str)], mailer: RecordingMailer, sms: RecordingSms) -> Harness {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, extra);
        let mailer = Arc::new(mailer);
        let sms = Arc::new(sms);
        let push = Arc::new(RecordingPush::default());
        let channels = Channels {
            mailer: mailer.clone(),
            sms: config.twilio.is_some().then(|| sms.clone() as Arc<dyn SmsSender>),
            push: config.fcm.is_some().then(|| push.clone() as Arc<dyn PushSender>),
            sheets: None,
        };
        Harness {
            service: IntakeService::new(&config, channels).unwrap(),
            mailer,
            sms,
            push,
            dir,
        }
    }

    const TWILIO: &[(&str, &str)] = &[
        ("TWILIO_ACCOUNT_SID", "AC1"),
        ("TWILIO_AUTH_TOKEN", "token"),
        ("TWILIO_MESSAGING_SERVICE_SID", "MG1"),
        ("NOTIFY_PHONE_NUMBER", "+639948962820"),
    ];

    const GATEWAYS: &[(&str, &str)] = &[
        ("SMS_GATEWAY_DOMAINS", "globe=sms.globe.example,smart=sms.smart.example"),
        ("ADMIN_PHONE", "09948962820"),
    ];

    fn contact() -> ContactForm {
        ContactForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "09171234567".into(),
            body: "Are mangoes in season?".into(),
        }
    }

    fn booking() -> BookingForm {
        BookingForm {
            full_name: "Ana Cruz".into(),
            email: "ana@example.com".into(),
            phone: "09171234567".into(),
            checkin_date: "2026-11-02".into(),
            guests: "4".into(),
            package_name: "Glamping".into(),
            ..BookingForm::default()
        }
    }

    fn get_started() -> GetStartedForm {
        GetStartedForm {
            name: "Ben".into(),
            email: "ben@example.com".into(),
            phone: "0918 765 4321".into(),
            interested: "Farm tour".into(),
        }
    }

    #[tokio::test]
    async fn contact_emails_admin_and_texts_via_twilio() {
        let h = harness(TWILIO, RecordingMailer::default(), RecordingSms::default());

        let receipt = h.service.submit_contact(&contact()).await.unwrap();
        assert_eq!(receipt.message, CONTACT_RECEIVED);
        assert_eq!(receipt.failures().count(), 0);

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "New Contact: Ana");
        assert_eq!(sent[0].to[0].address.as_str(), "admin@example.com");
        assert_eq!(sent[0].reply_to[0].address.as_str(), "ana@example.com");

        let texts = h.sms.sent.lock().unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "+639948962820");
        assert!(texts[0].1.starts_with("New Contact from Oikos Website:\nName: Ana"));

        let log = std::fs::read_to_string(h.dir.path().join("contact-log.txt")).unwrap();
        assert!(log.contains("| Message: Are mangoes in season?"));
    }

    #[tokio::test]
    async fn contact_uses_every_gateway_without_twilio() {
        let h = harness(GATEWAYS, RecordingMailer::default(), RecordingSms::default());

        let receipt = h.service.submit_contact(&contact()).await.unwrap();
        let channels: Vec<Channel> = receipt.deliveries.iter().map(|d| d.channel).collect();
        assert_eq!(
            channels,
            [Channel::Email, Channel::SmsGateway, Channel::SmsGateway]
        );
        assert_eq!(receipt.deliveries[1].recipient, "09948962820@sms.globe.example");
    }

    #[tokio::test]
    async fn failed_gateways_fall_back_to_admin_email() {
        let mailer = RecordingMailer {
            refuse: vec!["sms.globe.example", "sms.smart.example"],
            ..RecordingMailer::default()
        };
        let h = harness(GATEWAYS, mailer, RecordingSms::default());

        let receipt = h.service.submit_contact(&contact()).await.unwrap();
        assert_eq!(receipt.message, CONTACT_RECEIVED);
        assert_eq!(receipt.failures().count(), 2);

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].subject.starts_with("SMS notification"));
        assert!(sent[1].body.contains("Message: Are mangoes in season?"));
    }

    #[tokio::test]
    async fn one_working_gateway_needs_no_fallback() {
        let mailer = RecordingMailer {
            refuse: vec!["sms.globe.example"],
            ..RecordingMailer::default()
        };
        let h = harness(GATEWAYS, mailer, RecordingSms::default());

        let receipt = h.service.submit_contact(&contact()).await.unwrap();
        assert_eq!(receipt.deliveries.len(), 3);
        assert_eq!(receipt.failures().count(), 1);
    }

    #[tokio::test]
    async fn invalid_contact_sends_nothing() {
        let h = harness(TWILIO, RecordingMailer::default(), RecordingSms::default());
        let form = ContactForm {
            body: "x".repeat(161),
            ..contact()
        };

        let err = h.service.submit_contact(&form).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MessageTooLong)));
        assert!(h.mailer.sent.lock().unwrap().is_empty());
        assert!(h.sms.sent.lock().unwrap().is_empty());
        assert!(!h.dir.path().join("contact-log.txt").exists());
    }

    #[tokio::test]
    async fn unwritable_log_is_a_storage_error() {
        let h = harness(TWILIO, RecordingMailer::default(), RecordingSms::default());
        std::fs::create_dir(h.dir.path().join("contact-log.txt")).unwrap();

        let err = h.service.submit_contact(&contact()).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mail_failure_still_succeeds() {
        let mailer = RecordingMailer {
            refuse: vec!["example.com"],
            ..RecordingMailer::default()
        };
        let h = harness(&[], mailer, RecordingSms::default());

        let receipt = h.service.submit_contact(&contact()).await.unwrap();
        assert_eq!(receipt.message, CONTACT_RECEIVED);
        let failure = receipt.failures().next().unwrap();
        assert_eq!(failure.channel, Channel::Email);
        assert!(failure.error.as_deref().unwrap().contains("550 mailbox unavailable"));
    }

    #[tokio::test]
    async fn booking_is_saved_and_announced() {
        let extra = [
            ("FCM_PROJECT_ID", "oikos-demo"),
            ("FCM_SERVICE_ACCOUNT", "unused.json"),
        ];
        let h = harness(&extra, RecordingMailer::default(), RecordingSms::default());

        let receipt = h.service.submit_booking(&booking()).await.unwrap();
        assert_eq!(receipt.message, BOOKING_RECEIVED);
        let data = receipt.data.unwrap();
        assert_eq!(data["fullName"], "Ana Cruz");
        assert!(data["id"].as_str().unwrap().starts_with("booking_"));

        let stored = h.service.store().load_bookings().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, data["id"]);

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].subject, "New Booking Request - Glamping");
        assert_eq!(sent[0].reply_to[0].address.as_str(), "ana@example.com");
        assert_eq!(sent[1].to[0].address.as_str(), "ana@example.com");
        assert_eq!(sent[1].reply_to[0].address.as_str(), "admin@example.com");

        let pushes = h.push.sent.lock().unwrap();
        assert_eq!(pushes[0].target, PushTarget::Topic("bookings".into()));
        assert_eq!(pushes[0].data["bookingId"], stored[0].id);
    }

    #[tokio::test]
    async fn apostrophe_address_is_mailed_unescaped() {
        let h = harness(&[], RecordingMailer::default(), RecordingSms::default());
        let form = BookingForm {
            email: "o'brien@example.com".into(),
            ..booking()
        };

        let receipt = h.service.submit_booking(&form).await.unwrap();
        assert_eq!(receipt.data.unwrap()["email"], "o&#039;brien@example.com");

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent[0].reply_to[0].address.as_str(), "o'brien@example.com");
        assert_eq!(sent[1].to[0].address.as_str(), "o'brien@example.com");
        drop(sent);

        let inquiry = GetStartedForm {
            email: "o'brien@example.com".into(),
            ..get_started()
        };
        h.service.submit_get_started(&inquiry, None).await.unwrap();
        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent[2].reply_to[0].address.as_str(), "o'brien@example.com");
        assert_eq!(sent[3].to[0].address.as_str(), "o'brien@example.com");
    }

    #[tokio::test]
    async fn booking_missing_fields() {
        let h = harness(&[], RecordingMailer::default(), RecordingSms::default());
        let form = BookingForm {
            package_name: String::new(),
            ..booking()
        };
        let err = h.service.submit_booking(&form).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingFields)));
        assert!(h.service.store().load_bookings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_started_notifies_admin_and_visitor() {
        let h = harness(TWILIO, RecordingMailer::default(), RecordingSms::default());

        let receipt = h
            .service
            .submit_get_started(&get_started(), Some("203.0.113.7".parse().unwrap()))
            .await
            .unwrap();
        assert_eq!(receipt.message, GET_STARTED_RECEIVED);

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "New Get Started Request - Farm tour");
        assert_eq!(sent[1].to[0].address.as_str(), "ben@example.com");

        let texts = h.sms.sent.lock().unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].0, "+639948962820");
        assert_eq!(texts[1].0, "+639187654321");

        let detailed =
            std::fs::read_to_string(h.dir.path().join("getstarted-detailed.txt")).unwrap();
        assert!(detailed.contains("IP Address: 203.0.113.7"));
    }

    #[tokio::test]
    async fn sms_failure_is_recorded() {
        let sms = RecordingSms {
            fail: true,
            ..RecordingSms::default()
        };
        let h = harness(TWILIO, RecordingMailer::default(), sms);

        let receipt = h.service.submit_get_started(&get_started(), None).await.unwrap();
        let failed: Vec<Channel> = receipt.failures().map(|d| d.channel).collect();
        assert_eq!(failed, [Channel::Sms, Channel::Sms]);
    }
}
