//! Carrier email-to-SMS gateways.

use crate::config::SmsGatewayTable;

/// Gateway addresses for `phone`, one per configured carrier.
///
/// Carriers address subscribers by their local number, so the country code
/// `country_code` is replaced by a leading `0`. Returns nothing for a phone
/// without digits.
#[must_use]
pub fn gateway_addresses(phone: &str, country_code: &str, table: &SmsGatewayTable) -> Vec<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Vec::new();
    }

    let code = country_code.trim_start_matches('+');
    let international =
        phone.trim_start().starts_with('+') && !code.is_empty() && digits.starts_with(code);
    let local = if international {
        format!("0{}", &digits[code.len()..])
    } else {
        digits
    };

    table
        .carriers
        .iter()
        .map(|(_, domain)| format!("{local}@{domain}"))
        .collect()
}
