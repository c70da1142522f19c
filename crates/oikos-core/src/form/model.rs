//! Form payloads as submitted and their validated counterparts.

use oikos_smtp::Address;
use serde::{Deserialize, Deserializer, Serialize};

/// Contact form (JSON or form-encoded).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: String,
    /// Sender phone.
    pub phone: String,
    /// Message text, forwarded by SMS so limited to 160 characters.
    pub body: String,
}

/// Booking form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookingForm {
    /// Guest full name.
    pub full_name: String,
    /// Guest email.
    pub email: String,
    /// Guest phone.
    pub phone: String,
    /// Requested check-in date, as entered.
    pub checkin_date: String,
    /// Number of guests.
    #[serde(deserialize_with = "text_or_number")]
    pub guests: String,
    /// Selected package.
    pub package_name: String,
    /// Package price shown on the site.
    #[serde(deserialize_with = "text_or_number")]
    pub package_price: String,
    /// Free-form requests.
    #[serde(deserialize_with = "text_or_number")]
    pub special_requests: String,
}

/// "Get started" inquiry form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetStartedForm {
    /// Visitor name.
    pub name: String,
    /// Visitor email.
    pub email: String,
    /// Visitor phone.
    pub phone: String,
    /// What the visitor is interested in.
    pub interested: String,
}

/// Validated contact message. All text is trimmed and HTML-escaped; the
/// delivery address is kept unescaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    /// Sender name.
    pub name: String,
    /// Sender email, escaped for display.
    pub email: String,
    /// Sender address as entered, used for delivery and replies.
    #[serde(skip)]
    pub address: Address,
    /// Sender phone.
    pub phone: String,
    /// Message text.
    pub body: String,
}

/// Validated booking request. All text is trimmed and HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// Guest full name.
    pub full_name: String,
    /// Guest email, escaped for display.
    pub email: String,
    /// Guest address as entered.
    #[serde(skip)]
    pub address: Address,
    /// Guest phone.
    pub phone: String,
    /// Requested check-in date.
    pub checkin_date: String,
    /// Number of guests.
    pub guests: String,
    /// Selected package.
    pub package_name: String,
    /// Package price, possibly empty.
    pub package_price: String,
    /// Free-form requests, possibly empty.
    pub special_requests: String,
}

/// Validated "get started" inquiry. All text is trimmed and HTML-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetStartedInquiry {
    /// Visitor name.
    pub name: String,
    /// Visitor email, escaped for display.
    pub email: String,
    /// Visitor address as entered.
    #[serde(skip)]
    pub address: Address,
    /// Visitor phone.
    pub phone: String,
    /// What the visitor is interested in.
    pub interested: String,
}

// The site posts numbers for some fields from a few pages.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Null => String::new(),
    })
}
