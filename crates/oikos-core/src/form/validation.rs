//! Form validation.

use super::model::{
    BookingForm, BookingRequest, ContactForm, ContactMessage, GetStartedForm, GetStartedInquiry,
};
use oikos_smtp::Address;
use thiserror::Error;

/// Longest contact message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 160;

/// Validation error for a submitted form.
///
/// The display text is shown to the visitor as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("Please fill all required fields")]
    MissingFields,
    /// Email address format is invalid.
    #[error("Invalid email address")]
    InvalidEmail,
    /// Contact message is longer than one SMS.
    #[error("Message exceeds 160 character limit")]
    MessageTooLong,
    /// Phone contains characters other than digits and separators.
    #[error("Invalid phone number format")]
    InvalidPhone,
}

impl ValidationError {
    /// Get the field name this error relates to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingFields => None,
            Self::InvalidEmail => Some("email"),
            Self::MessageTooLong => Some("body"),
            Self::InvalidPhone => Some("phone"),
        }
    }
}

impl ContactForm {
    /// Validates the form and returns an escaped copy.
    ///
    /// # Errors
    ///
    /// Returns the first rule the form breaks.
    pub fn validate(&self) -> Result<ContactMessage, ValidationError> {
        let (name, email, phone, body) = (
            self.name.trim(),
            self.email.trim(),
            self.phone.trim(),
            self.body.trim(),
        );

        require(&[name, email, phone, body])?;
        let address = parse_email(email)?;
        if body.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ValidationError::MessageTooLong);
        }
        check_phone(phone)?;

        Ok(ContactMessage {
            name: escape_html(name),
            email: escape_html(email),
            address,
            phone: escape_html(phone),
            body: escape_html(body),
        })
    }
}

impl BookingForm {
    /// Validates the form and returns an escaped copy.
    ///
    /// # Errors
    ///
    /// Returns the first rule the form breaks.
    pub fn validate(&self) -> Result<BookingRequest, ValidationError> {
        let full_name = self.full_name.trim();
        let email = self.email.trim();
        let phone = self.phone.trim();
        let checkin_date = self.checkin_date.trim();
        let guests = self.guests.trim();
        let package_name = self.package_name.trim();

        require(&[full_name, email, phone, checkin_date, guests, package_name])?;
        let address = parse_email(email)?;
        check_phone(phone)?;

        Ok(BookingRequest {
            full_name: escape_html(full_name),
            email: escape_html(email),
            address,
            phone: escape_html(phone),
            checkin_date: escape_html(checkin_date),
            guests: escape_html(guests),
            package_name: escape_html(package_name),
            package_price: escape_html(self.package_price.trim()),
            special_requests: escape_html(self.special_requests.trim()),
        })
    }
}

impl GetStartedForm {
    /// Validates the form and returns an escaped copy.
    ///
    /// # Errors
    ///
    /// Returns the first rule the form breaks.
    pub fn validate(&self) -> Result<GetStartedInquiry, ValidationError> {
        let (name, email, phone, interested) = (
            self.name.trim(),
            self.email.trim(),
            self.phone.trim(),
            self.interested.trim(),
        );

        require(&[name, email, phone, interested])?;
        let address = parse_email(email)?;
        check_phone(phone)?;

        Ok(GetStartedInquiry {
            name: escape_html(name),
            email: escape_html(email),
            address,
            phone: escape_html(phone),
            interested: escape_html(interested),
        })
    }
}

fn require(fields: &[&str]) -> Result<(), ValidationError> {
    if fields.iter().any(|f| f.is_empty()) {
        Err(ValidationError::MissingFields)
    } else {
        Ok(())
    }
}

fn parse_email(email: &str) -> Result<Address, ValidationError> {
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Address::new(email).map_err(|_| ValidationError::InvalidEmail)
}

fn check_phone(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

/// Basic email validation.
///
/// One `@`, a non-empty local part, a dotted domain, no whitespace, and
/// nothing that could break an SMTP envelope.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '"' | ','))
    {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain needs a dot with something on both sides
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Digits, spaces and `-+()` only, with at least one digit.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'))
        && phone.chars().any(|c| c.is_ascii_digit())
}

/// Escapes `& < > " '` for safe inclusion in HTML.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Converts a local number to international format.
///
/// Separators are dropped; `09171234567` with `+63` becomes `+639171234567`.
/// Numbers that already carry a `+` are kept.
#[must_use]
pub fn normalize_phone(phone: &str, country_code: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if phone.trim_start().starts_with('+') {
        return format!("+{digits}");
    }

    let code = country_code.trim_start_matches('+');
    if !code.is_empty() && digits.starts_with(code) && !phone.trim_start().starts_with('0') {
        return format!("+{digits}");
    }

    format!("+{code}{}", digits.trim_start_matches('0'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn contact(body: &str) -> ContactForm {
        ContactForm {
            name: " Ana Cruz ".into(),
            email: "ana@example.com".into(),
            phone: "0917 123 4567".into(),
            body: body.into(),
        }
    }

    #[test]
    fn contact_is_trimmed_and_escaped() {
        let message = contact("Do you sell <b>mangoes</b> & \"guavas\"?").validate().unwrap();
        assert_eq!(message.name, "Ana Cruz");
        assert_eq!(
            message.body,
            "Do you sell &lt;b&gt;mangoes&lt;/b&gt; &amp; &quot;guavas&quot;?"
        );
    }

    #[test]
    fn contact_rules_in_order() {
        assert_eq!(contact("  ").validate(), Err(ValidationError::MissingFields));

        let mut form = contact("hi");
        form.email = "ana@example".into();
        assert_eq!(form.validate(), Err(ValidationError::InvalidEmail));

        assert_eq!(
            contact(&"x".repeat(161)).validate(),
            Err(ValidationError::MessageTooLong)
        );
        assert!(contact(&"x".repeat(160)).validate().is_ok());

        let mut form = contact("hi");
        form.phone = "call me".into();
        assert_eq!(form.validate(), Err(ValidationError::InvalidPhone));
    }

    #[test]
    fn address_is_kept_unescaped() {
        let mut form = contact("hi");
        form.email = " o'brien@example.com ".into();
        let message = form.validate().unwrap();
        assert_eq!(message.email, "o&#039;brien@example.com");
        assert_eq!(message.address.as_str(), "o'brien@example.com");
    }

    #[test]
    fn length_counts_characters() {
        // 160 multi-byte characters still fit
        assert!(contact(&"ñ".repeat(160)).validate().is_ok());
    }

    #[test]
    fn booking_optional_fields() {
        let form = BookingForm {
            full_name: "Ana Cruz".into(),
            email: "ana@example.com".into(),
            phone: "+63 917 123 4567".into(),
            checkin_date: "2026-11-02".into(),
            guests: "4".into(),
            package_name: "Glamping".into(),
            ..BookingForm::default()
        };
        let booking = form.validate().unwrap();
        assert!(booking.package_price.is_empty());
        assert!(booking.special_requests.is_empty());

        let incomplete = BookingForm {
            guests: String::new(),
            ..form
        };
        assert_eq!(incomplete.validate(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn get_started_requires_interest() {
        let form = GetStartedForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "09171234567".into(),
            interested: String::new(),
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn email_rules() {
        assert!(is_valid_email("guest@farm.ph"));
        assert!(is_valid_email("first.last+tag@mail.example.com"));
        assert!(!is_valid_email("guest@farm"));
        assert!(!is_valid_email("guest@.ph"));
        assert!(!is_valid_email("guest@farm."));
        assert!(!is_valid_email("@farm.ph"));
        assert!(!is_valid_email("a@b@farm.ph"));
        assert!(!is_valid_email("gu est@farm.ph"));
        assert!(!is_valid_email("guest@farm.ph>\r\nRCPT TO:<x@y.z"));
    }

    #[test]
    fn phone_rules() {
        assert!(is_valid_phone("+63 (917) 123-4567"));
        assert!(!is_valid_phone("0917-CALL-ME"));
        assert!(!is_valid_phone("--"));
    }

    #[test]
    fn normalizes_local_numbers() {
        assert_eq!(normalize_phone("09171234567", "+63"), "+639171234567");
        assert_eq!(normalize_phone("0917 123 4567", "+63"), "+639171234567");
        assert_eq!(normalize_phone("+63 917 123 4567", "+63"), "+639171234567");
        assert_eq!(normalize_phone("639171234567", "+63"), "+639171234567");
        assert_eq!(normalize_phone("9171234567", "+63"), "+639171234567");
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "Please fill all required fields"
        );
        assert_eq!(ValidationError::InvalidEmail.field(), Some("email"));
    }

    proptest! {
        #[test]
        fn escaped_text_has_no_markup(input in ".{0,64}") {
            let escaped = escape_html(&input);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
        }
    }
}
