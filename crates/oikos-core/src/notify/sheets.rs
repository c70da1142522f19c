//! Spreadsheet webhook for bookings.

use super::NotifyError;
use crate::config::SheetsConfig;
use crate::storage::BookingRecord;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Row posted to the webhook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetsRow<'a> {
    /// Target sheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<&'a str>,
    /// Booking id.
    pub booking_id: &'a str,
    /// Guest full name.
    pub full_name: &'a str,
    /// Guest email.
    pub email: &'a str,
    /// Guest phone.
    pub phone: &'a str,
    /// Check-in date.
    pub checkin_date: &'a str,
    /// Number of guests.
    pub guests: &'a str,
    /// Package.
    pub package_name: &'a str,
    /// Package price.
    pub package_price: &'a str,
    /// Free-form requests.
    pub special_requests: &'a str,
    /// Submission time.
    pub timestamp: &'a str,
}

impl<'a> SheetsRow<'a> {
    /// Builds the row for `record`.
    #[must_use]
    pub fn new(record: &'a BookingRecord, sheet_id: Option<&'a str>) -> Self {
        Self {
            sheet_id,
            booking_id: &record.id,
            full_name: &record.full_name,
            email: &record.email,
            phone: &record.phone,
            checkin_date: &record.checkin_date,
            guests: &record.guests,
            package_name: &record.package_name,
            package_price: &record.package_price,
            special_requests: &record.special_requests,
            timestamp: &record.timestamp,
        }
    }
}

/// Posts booking rows to an Apps Script style webhook.
#[derive(Debug, Clone)]
pub struct SheetsWebhook {
    http: Client,
    config: SheetsConfig,
}

impl SheetsWebhook {
    /// Creates a webhook client sharing `http`.
    #[must_use]
    pub const fn new(http: Client, config: SheetsConfig) -> Self {
        Self { http, config }
    }

    /// Webhook URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.webhook_url
    }

    /// Posts one booking. Any 2xx status counts as success.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn append(&self, record: &BookingRecord) -> Result<(), NotifyError> {
        let row = SheetsRow::new(record, self.config.sheet_id.as_deref());
        let response = self
            .http
            .post(&self.config.webhook_url)
            .json(&row)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                service: "Sheets",
                message: format!("HTTP {status}"),
            })
        }
    }
}
