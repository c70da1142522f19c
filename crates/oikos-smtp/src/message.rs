//! Outbound message and its RFC 5322 rendering.

use crate::types::{Address, Mailbox};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write;

/// Longest run of raw bytes in one encoded word (60 base64 characters).
const ENCODED_WORD_BYTES: usize = 45;

/// Body content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// `text/plain`
    #[default]
    Plain,
    /// `text/html`
    Html,
}

impl BodyKind {
    /// MIME type for the `Content-Type` header.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

/// An email message to send. Built per send and never persisted.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Sender mailbox.
    pub from: Mailbox,
    /// Recipient mailboxes.
    pub to: Vec<Mailbox>,
    /// CC mailboxes.
    pub cc: Vec<Mailbox>,
    /// BCC mailboxes (envelope only, never rendered).
    pub bcc: Vec<Mailbox>,
    /// Reply-To mailboxes.
    pub reply_to: Vec<Mailbox>,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Body content type.
    pub kind: BodyKind,
    /// Charset named in `Content-Type`.
    pub charset: String,
}

impl OutboundMessage {
    /// Creates a new message with no recipients.
    #[must_use]
    pub fn new(from: Mailbox, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            kind: BodyKind::Plain,
            charset: "UTF-8".to_string(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<Mailbox>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Adds a Reply-To address.
    #[must_use]
    pub fn reply_to(mut self, mailbox: impl Into<Mailbox>) -> Self {
        self.reply_to.push(mailbox.into());
        self
    }

    /// Marks the body as HTML.
    #[must_use]
    pub const fn html(mut self) -> Self {
        self.kind = BodyKind::Html;
        self
    }

    /// Sets the body charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Envelope recipients: To, then Cc, then Bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|mailbox| &mailbox.address)
    }

    /// Builds the RFC 5322 formatted message.
    ///
    /// Header order is fixed: From, To, Cc, Reply-To, Subject, MIME-Version,
    /// Content-Type, Content-Transfer-Encoding; then a blank line and the body.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::with_capacity(self.body.len() + 256);

        let _ = write!(message, "From: {}\r\n", header_mailbox(&self.from));

        if !self.to.is_empty() {
            let _ = write!(message, "To: {}\r\n", join_mailboxes(&self.to));
        }

        if !self.cc.is_empty() {
            let _ = write!(message, "Cc: {}\r\n", join_mailboxes(&self.cc));
        }

        if !self.reply_to.is_empty() {
            let addresses: Vec<&str> = self.reply_to.iter().map(|m| m.address.as_str()).collect();
            let _ = write!(message, "Reply-To: {}\r\n", addresses.join(", "));
        }

        let _ = write!(message, "Subject: {}\r\n", header_text(&self.subject));
        message.push_str("MIME-Version: 1.0\r\n");
        let _ = write!(
            message,
            "Content-Type: {}; charset={}\r\n",
            self.kind.mime_type(),
            single_line(&self.charset)
        );
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");

        // Empty line between headers and body
        message.push_str("\r\n");

        message.push_str(&self.body);

        message
    }
}

fn join_mailboxes(mailboxes: &[Mailbox]) -> String {
    mailboxes
        .iter()
        .map(header_mailbox)
        .collect::<Vec<_>>()
        .join(", ")
}

fn header_mailbox(mailbox: &Mailbox) -> String {
    match &mailbox.name {
        Some(name) if !name.is_ascii() => format!("{} <{}>", header_text(name), mailbox.address),
        _ => mailbox.to_string(),
    }
}

/// Header text on one line; non-ASCII text becomes RFC 2047 `B` encoded
/// words, folded so each stays within 75 characters.
fn header_text(value: &str) -> String {
    let value = single_line(value);
    if value.is_ascii() {
        return value;
    }

    let mut words = Vec::new();
    let mut start = 0;
    for (i, c) in value.char_indices() {
        if i + c.len_utf8() - start > ENCODED_WORD_BYTES {
            words.push(encoded_word(&value[start..i]));
            start = i;
        }
    }
    words.push(encoded_word(&value[start..]));
    words.join("\r\n ")
}

fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text))
}

/// Folds CR/LF out of a header value.
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> OutboundMessage {
        OutboundMessage::new(
            Mailbox::with_name("Oikos Orchard & Farm", "farm@gmail.com").unwrap(),
            "Hi",
            "Hello",
        )
        .to(Mailbox::new("b@y.com").unwrap())
    }

    #[test]
    fn plain_message_layout() {
        let rendered = sample().to_rfc5322();
        assert_eq!(
            rendered,
            "From: Oikos Orchard & Farm <farm@gmail.com>\r\n\
             To: b@y.com\r\n\
             Subject: Hi\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             Hello"
        );
    }

    #[test]
    fn header_order_with_all_lists() {
        let message = sample()
            .to(Mailbox::with_name("Ana", "ana@y.com").unwrap())
            .cc(Mailbox::new("c@y.com").unwrap())
            .bcc(Mailbox::new("hidden@y.com").unwrap())
            .reply_to(Mailbox::with_name("Guest", "guest@z.com").unwrap())
            .html();
        let rendered = message.to_rfc5322();

        let order: Vec<&str> = rendered
            .split("\r\n")
            .take_while(|line| !line.is_empty())
            .map(|line| line.split(':').next().unwrap())
            .collect();
        assert_eq!(
            order,
            vec![
                "From",
                "To",
                "Cc",
                "Reply-To",
                "Subject",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding"
            ]
        );
        assert!(rendered.contains("To: b@y.com, Ana <ana@y.com>\r\n"));
        assert!(rendered.contains("Reply-To: guest@z.com\r\n"));
        assert!(!rendered.contains("hidden@y.com"));
    }

    #[test]
    fn exactly_one_content_type() {
        let html = sample().html().charset("ISO-8859-1").to_rfc5322();
        assert_eq!(html.matches("Content-Type:").count(), 1);
        assert!(html.contains("Content-Type: text/html; charset=ISO-8859-1\r\n"));

        let plain = sample().to_rfc5322();
        assert_eq!(plain.matches("Content-Type:").count(), 1);
        assert!(plain.contains("Content-Type: text/plain; charset=UTF-8\r\n"));
    }

    #[test]
    fn omits_empty_to() {
        let message = OutboundMessage::new(Mailbox::new("a@x.com").unwrap(), "s", "b")
            .bcc(Mailbox::new("hidden@y.com").unwrap());
        let rendered = message.to_rfc5322();
        assert!(!rendered.contains("\r\nTo:"));
        assert_eq!(message.recipients().count(), 1);
    }

    #[test]
    fn recipients_in_envelope_order() {
        let message = sample()
            .bcc(Mailbox::new("3@y.com").unwrap())
            .cc(Mailbox::new("2@y.com").unwrap());
        let order: Vec<&str> = message.recipients().map(Address::as_str).collect();
        assert_eq!(order, vec!["b@y.com", "2@y.com", "3@y.com"]);
    }

    fn decode_words(header: &str) -> String {
        let bytes: Vec<u8> = header
            .split("\r\n ")
            .flat_map(|word| {
                let inner = word
                    .strip_prefix("=?UTF-8?B?")
                    .and_then(|w| w.strip_suffix("?="))
                    .unwrap();
                STANDARD.decode(inner).unwrap()
            })
            .collect();
        String::from_utf8(bytes).unwrap()
    }

    fn subject_of(rendered: &str) -> &str {
        let start = rendered.find("Subject: ").unwrap() + "Subject: ".len();
        let end = rendered[start..].find("\r\nMIME-Version").unwrap();
        &rendered[start..start + end]
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let subject = "\u{2713} Booking Request Received - Oikos Orchard & Farm";
        let rendered =
            OutboundMessage::new(Mailbox::new("a@x.com").unwrap(), subject, "b").to_rfc5322();

        let header = subject_of(&rendered);
        assert!(header.is_ascii());
        assert!(header.starts_with("=?UTF-8?B?"));
        assert!(header.split("\r\n ").all(|word| word.len() <= 75));
        assert_eq!(decode_words(header), subject);
    }

    #[test]
    fn long_non_ascii_subject_folds_on_char_boundaries() {
        let subject = format!("Dear {}", "Pe\u{f1}a ".repeat(20));
        let rendered =
            OutboundMessage::new(Mailbox::new("a@x.com").unwrap(), subject.as_str(), "b")
                .to_rfc5322();

        let header = subject_of(&rendered);
        assert!(header.split("\r\n ").count() > 1);
        assert!(header.split("\r\n ").all(|word| word.len() <= 75));
        assert_eq!(decode_words(header), subject);
    }

    #[test]
    fn non_ascii_display_name_is_encoded() {
        let rendered = OutboundMessage::new(
            Mailbox::with_name("Granja Pe\u{f1}a", "a@x.com").unwrap(),
            "Hi",
            "b",
        )
        .to(Mailbox::new("b@y.com").unwrap())
        .to_rfc5322();
        let name = STANDARD.encode("Granja Pe\u{f1}a");
        assert!(rendered.starts_with(&format!("From: =?UTF-8?B?{name}?= <a@x.com>\r\n")));
    }

    #[test]
    fn subject_cannot_inject_headers() {
        let rendered = OutboundMessage::new(
            Mailbox::new("a@x.com").unwrap(),
            "New Contact: Eve\r\nBcc: victim@x.com",
            "b",
        )
        .to_rfc5322();
        assert!(rendered.contains("Subject: New Contact: Eve Bcc: victim@x.com\r\n"));
    }
}
