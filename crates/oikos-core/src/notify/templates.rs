//! Subjects and bodies for notification messages.
//!
//! Field values arrive HTML-escaped from form validation and are interpolated
//! as-is.

use crate::config::BusinessProfile;
use crate::form::{ContactMessage, GetStartedInquiry};
use crate::storage::BookingRecord;
use std::fmt::Write;

const STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; background: #f5f5f5; margin: 0; }\
.container { max-width: 600px; margin: 20px auto; background: #fff; border-radius: 8px; overflow: hidden; }\
.header { background: linear-gradient(135deg, #2d5016 0%, #4a7c2e 100%); color: #fff; padding: 24px; text-align: center; }\
.content { padding: 24px; }\
.field { margin: 12px 0; padding: 10px; border-left: 4px solid #4a7c2e; background: #f9f9f9; }\
.label { font-weight: bold; font-size: 12px; color: #666; text-transform: uppercase; }\
.footer { background: #f0f0f0; padding: 16px; text-align: center; font-size: 12px; color: #666; }";

fn layout(business: &str, heading: &str, content: &str, footer: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"UTF-8\"><style>{STYLE}</style></head>\n<body>\n\
         <div class=\"container\">\n\
         <div class=\"header\"><h2>{business}</h2><p>{heading}</p></div>\n\
         <div class=\"content\">\n{content}</div>\n\
         <div class=\"footer\">{footer}<p>&copy; {business}. All rights reserved.</p></div>\n\
         </div>\n</body>\n</html>\n"
    )
}

fn field(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(
        out,
        "<div class=\"field\"><div class=\"label\">{label}</div><div>{value}</div></div>"
    );
}

fn contact_lines(business: &BusinessProfile) -> String {
    format!(
        "<p><strong>Phone:</strong> {}<br><strong>Email:</strong> {}<br>\
         <strong>Website:</strong> {}<br><strong>Location:</strong> {}</p>\n",
        business.phone, business.email, business.website, business.location
    )
}

/// Admin subject for a contact message.
#[must_use]
pub fn contact_subject(message: &ContactMessage) -> String {
    format!("New Contact: {}", message.name)
}

/// Admin email body for a contact message.
#[must_use]
pub fn contact_admin_html(
    message: &ContactMessage,
    submitted: &str,
    business: &BusinessProfile,
) -> String {
    let mut content = String::from("<h3>Contact Details</h3>\n");
    field(&mut content, "Name", &message.name);
    field(
        &mut content,
        "Email",
        &format!("<a href=\"mailto:{0}\">{0}</a>", message.email),
    );
    field(&mut content, "Phone", &message.phone);
    content.push_str("<h3>Message</h3>\n");
    field(&mut content, "Message", &message.body);
    let _ = writeln!(content, "<p>Submitted: <strong>{submitted}</strong></p>");

    layout(
        &business.name,
        "New Contact Form Submission",
        &content,
        "<p>This is an automated message from your contact form.</p>",
    )
}

/// SMS text for a contact message.
#[must_use]
pub fn contact_sms(message: &ContactMessage) -> String {
    format!(
        "New Contact from Oikos Website:\nName: {}\nEmail: {}\nPhone: {}\nMessage: {}",
        message.name, message.email, message.phone, message.body
    )
}

/// Admin subject for a booking.
#[must_use]
pub fn booking_admin_subject(record: &BookingRecord) -> String {
    format!("New Booking Request - {}", record.package_name)
}

/// Admin email body for a booking.
#[must_use]
pub fn booking_admin_html(record: &BookingRecord, business: &BusinessProfile) -> String {
    let mut content = String::new();
    field(&mut content, "Package", &record.package_name);
    if !record.package_price.is_empty() {
        field(&mut content, "Price", &format!("&#8369;{}", record.package_price));
    }
    field(
        &mut content,
        "Guest Information",
        &format!(
            "<strong>Name:</strong> {}<br><strong>Email:</strong> <a href=\"mailto:{1}\">{1}</a><br>\
             <strong>Phone:</strong> <a href=\"tel:{2}\">{2}</a>",
            record.full_name, record.email, record.phone
        ),
    );
    field(
        &mut content,
        "Booking Details",
        &format!(
            "<strong>Check-in Date:</strong> {}<br><strong>Number of Guests:</strong> {}",
            record.checkin_date, record.guests
        ),
    );
    if !record.special_requests.is_empty() {
        field(&mut content, "Special Requests", &record.special_requests);
    }
    field(&mut content, "Booking ID", &record.id);
    field(&mut content, "Submitted At", &record.timestamp);

    let footer = format!(
        "<p><strong>ACTION REQUIRED:</strong> Please respond to the customer at \
         <a href=\"mailto:{0}\">{0}</a> within 24 hours to confirm their booking.</p>",
        record.email
    );
    layout(&business.name, "New Booking Request Received", &content, &footer)
}

/// Customer confirmation subject for a booking.
#[must_use]
pub fn booking_customer_subject(business: &BusinessProfile) -> String {
    format!("\u{2713} Booking Request Received - {}", business.name)
}

/// Customer confirmation body for a booking.
#[must_use]
pub fn booking_customer_html(record: &BookingRecord, business: &BusinessProfile) -> String {
    let mut content = format!(
        "<p>Dear <strong>{}</strong>,</p>\n\
         <p>Thank you for choosing <strong>{}</strong>! We are thrilled to welcome you.</p>\n",
        record.full_name, business.name
    );
    let mut details = format!(
        "<strong>Package:</strong> {}<br>",
        record.package_name
    );
    if !record.package_price.is_empty() {
        let _ = write!(details, "<strong>Price:</strong> &#8369;{}<br>", record.package_price);
    }
    let _ = write!(
        details,
        "<strong>Check-in Date:</strong> {}<br><strong>Number of Guests:</strong> {}<br>\
         <strong>Submitted:</strong> {}",
        record.checkin_date, record.guests, record.timestamp
    );
    field(&mut content, "Your Booking Details", &details);
    let _ = write!(
        content,
        "<p><strong>What Happens Next?</strong></p>\n\
         <p>Our team will review your booking request and <strong>contact you within 24 hours</strong> \
         at <strong>{}</strong> to confirm your reservation and share payment details.</p>\n\
         <p><strong>Need Immediate Assistance?</strong></p>\n{}\
         <p>Best regards,<br><strong>The {} Team</strong></p>\n",
        record.phone,
        contact_lines(business),
        business.name
    );

    layout(
        &business.name,
        "Your Booking Request is Received",
        &content,
        "<p><em>This is an automated confirmation email.</em></p>",
    )
}

/// Admin subject for a "get started" inquiry.
#[must_use]
pub fn get_started_admin_subject(inquiry: &GetStartedInquiry) -> String {
    format!("New Get Started Request - {}", inquiry.interested)
}

/// Admin email body for a "get started" inquiry.
#[must_use]
pub fn get_started_admin_html(
    inquiry: &GetStartedInquiry,
    submitted: &str,
    business: &BusinessProfile,
) -> String {
    let mut content = String::new();
    field(&mut content, "Interested In", &inquiry.interested);
    field(&mut content, "Name", &inquiry.name);
    field(
        &mut content,
        "Email",
        &format!("<a href=\"mailto:{0}\">{0}</a>", inquiry.email),
    );
    field(
        &mut content,
        "Phone",
        &format!("<a href=\"tel:{0}\">{0}</a>", inquiry.phone),
    );
    field(&mut content, "Submitted At", submitted);

    layout(
        &business.name,
        "New Get Started Request",
        &content,
        "<p>Please contact this visitor within 24 hours.</p>",
    )
}

/// Customer confirmation subject for a "get started" inquiry.
#[must_use]
pub fn get_started_customer_subject(business: &BusinessProfile) -> String {
    format!("\u{2713} Get Started Request Received - {}", business.name)
}

/// Customer confirmation body for a "get started" inquiry.
#[must_use]
pub fn get_started_customer_html(inquiry: &GetStartedInquiry, business: &BusinessProfile) -> String {
    let content = format!(
        "<p>Dear <strong>{}</strong>,</p>\n\
         <p>Thank you for your interest in <strong>{}</strong>. We received your request about \
         <strong>{}</strong> and our team will contact you within 24 hours.</p>\n{}\
         <p>Best regards,<br><strong>The {} Team</strong></p>\n",
        inquiry.name,
        business.name,
        inquiry.interested,
        contact_lines(business),
        business.name
    );
    layout(
        &business.name,
        "We Received Your Request",
        &content,
        "<p><em>This is an automated confirmation email.</em></p>",
    )
}

/// Admin SMS for a "get started" inquiry.
#[must_use]
pub fn get_started_admin_sms(inquiry: &GetStartedInquiry) -> String {
    format!(
        "New Get Started Request:\nName: {}\nEmail: {}\nPhone: {}\nInterested: {}",
        inquiry.name, inquiry.email, inquiry.phone, inquiry.interested
    )
}

/// Customer confirmation SMS for a "get started" inquiry.
#[must_use]
pub fn get_started_customer_sms(inquiry: &GetStartedInquiry, business: &BusinessProfile) -> String {
    format!(
        "Hi {}, thank you for contacting {}! We received your inquiry about {} and will \
         contact you within 24 hours. Questions? Call {}.",
        inquiry.name, business.name, inquiry.interested, business.phone
    )
}

/// Push notification title and body for a booking.
#[must_use]
pub fn booking_push(record: &BookingRecord) -> (String, String) {
    (
        "New Booking Request".to_string(),
        format!(
            "{} booked {} for {} ({} guests)",
            record.full_name, record.package_name, record.checkin_date, record.guests
        ),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use oikos_smtp::Address;

    fn business() -> BusinessProfile {
        BusinessProfile {
            name: "Oikos Orchard & Farm".into(),
            phone: "+63 994 896 2820".into(),
            email: "hello@example.com".into(),
            website: "www.oikosorchardandfarm.com".into(),
            location: "Oikos Orchard & Farm, Valley Region".into(),
            country_code: "+63".into(),
        }
    }

    fn record(special: &str) -> BookingRecord {
        BookingRecord {
            full_name: "Ana Cruz".into(),
            email: "ana@example.com".into(),
            phone: "09171234567".into(),
            checkin_date: "2026-11-02".into(),
            guests: "4".into(),
            package_name: "Glamping".into(),
            package_price: "2500".into(),
            special_requests: special.into(),
            timestamp: "2026-10-18 09:30:00".into(),
            id: "booking_1".into(),
        }
    }

    #[test]
    fn contact_texts() {
        let message = ContactMessage {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            address: Address::new("ana@example.com").unwrap(),
            phone: "0917".into(),
            body: "Hello".into(),
        };
        assert_eq!(contact_subject(&message), "New Contact: Ana");
        assert_eq!(
            contact_sms(&message),
            "New Contact from Oikos Website:\nName: Ana\nEmail: ana@example.com\nPhone: 0917\nMessage: Hello"
        );
        let html = contact_admin_html(&message, "Oct 18, 2026 | 9:30 AM", &business());
        assert!(html.contains("mailto:ana@example.com"));
        assert!(html.contains("Oct 18, 2026 | 9:30 AM"));
    }

    #[test]
    fn booking_special_requests_are_optional() {
        assert!(!booking_admin_html(&record(""), &business()).contains("Special Requests"));
        assert!(booking_admin_html(&record("Late arrival"), &business()).contains("Late arrival"));
    }

    #[test]
    fn booking_subjects() {
        assert_eq!(booking_admin_subject(&record("")), "New Booking Request - Glamping");
        assert_eq!(
            booking_customer_subject(&business()),
            "\u{2713} Booking Request Received - Oikos Orchard & Farm"
        );
        assert!(booking_customer_html(&record(""), &business()).contains("Dear <strong>Ana Cruz</strong>"));
    }

    #[test]
    fn get_started_texts() {
        let inquiry = GetStartedInquiry {
            name: "Ben".into(),
            email: "ben@example.com".into(),
            address: Address::new("ben@example.com").unwrap(),
            phone: "0918".into(),
            interested: "Farm tour".into(),
        };
        assert_eq!(
            get_started_admin_subject(&inquiry),
            "New Get Started Request - Farm tour"
        );
        assert!(get_started_admin_sms(&inquiry).ends_with("Interested: Farm tour"));
        assert!(get_started_customer_sms(&inquiry, &business()).contains("+63 994 896 2820"));
    }
}
