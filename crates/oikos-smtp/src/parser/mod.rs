//! SMTP response parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from response lines.
///
/// SMTP replies can be single-line or multi-line:
/// - Single: `250 OK\r\n`
/// - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
///
/// Every line must carry the same code as the first one.
///
/// # Errors
///
/// Returns an error if the reply is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let Some(first) = lines.first() else {
        return Err(Error::Protocol("Empty reply".into()));
    };

    let code = parse_reply_code(first)?;

    let mut text = Vec::with_capacity(lines.len());
    for line in lines {
        if parse_reply_code(line)? != code {
            return Err(Error::Protocol(format!(
                "Mixed reply codes in multi-line reply: {first} / {line}"
            )));
        }
        // Skip code and separator (e.g., "250-" or "250 ")
        text.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(code, text))
}

/// Reads the code of one reply line.
///
/// # Errors
///
/// Returns [`Error::Protocol`] unless the line starts with three digits
/// followed by a space, a hyphen, or nothing.
pub fn parse_reply_code(line: &str) -> Result<ReplyCode> {
    let code_str = line
        .get(0..3)
        .ok_or_else(|| Error::Protocol(format!("Reply too short: {line}")))?;

    if !code_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Protocol(format!("Invalid reply code: {code_str}")));
    }

    match line.as_bytes().get(3) {
        None | Some(b' ' | b'-') => {}
        Some(_) => return Err(Error::Protocol(format!("Malformed reply line: {line}"))),
    }

    code_str
        .parse::<u16>()
        .map(ReplyCode::new)
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {code_str}")))
}

/// Checks if a line is the last line of a (possibly multi-line) reply.
///
/// Continuation lines carry `-` in the fourth column; the final line carries
/// a space, or ends right after the code.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    match line.as_bytes().get(3) {
        Some(b) => *b == b' ',
        None => line.len() == 3,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_line_reply() {
        let reply = parse_reply(&["250 OK".to_string()]).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.lines, vec!["OK"]);
    }

    #[test]
    fn multi_line_ehlo_reply() {
        let lines = vec![
            "250-smtp.gmail.com at your service".to_string(),
            "250-SIZE 35882577".to_string(),
            "250-STARTTLS".to_string(),
            "250 SMTPUTF8".to_string(),
        ];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines.len(), 4);
        assert_eq!(reply.lines[3], "SMTPUTF8");
    }

    #[test]
    fn bare_code_line() {
        let reply = parse_reply(&["354".to_string()]).unwrap();
        assert_eq!(reply.code, ReplyCode::START_DATA);
        assert_eq!(reply.lines, vec![""]);
    }

    #[test]
    fn reply_code_of_one_line() {
        assert_eq!(parse_reply_code("220-first").unwrap(), ReplyCode::SERVICE_READY);
        assert!(parse_reply_code("HTTP/1.1 400 Bad Request").is_err());
        assert!(parse_reply_code("").is_err());
    }

    #[test]
    fn last_line_rule() {
        assert!(is_last_reply_line("250 OK"));
        assert!(is_last_reply_line("250"));
        assert!(!is_last_reply_line("250-Continuing"));
        assert!(!is_last_reply_line("25"));
    }

    #[test]
    fn malformed_replies() {
        assert!(parse_reply(&[]).is_err());
        assert!(parse_reply(&["25".to_string()]).is_err());
        assert!(parse_reply(&["ABC OK".to_string()]).is_err());
        assert!(parse_reply(&["250xOK".to_string()]).is_err());
        assert!(parse_reply(&["250-a".to_string(), "550 b".to_string()]).is_err());
    }

    proptest! {
        #[test]
        fn any_three_digit_code_round_trips(code in 200u16..600, text in "[ -~]{0,40}") {
            let reply = parse_reply(&[format!("{code} {text}")]).unwrap();
            prop_assert_eq!(reply.code.as_u16(), code);
            prop_assert_eq!(reply.text(), text);
        }
    }
}
