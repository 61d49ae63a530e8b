// inkwell-core/src/mail/message.rs

//! RFC 2822 building, parsing and the base64url framing the provider expects.

use anyhow::{anyhow, Context, Result};
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use lettre::message::header::ContentType;
use lettre::message::Mailbox as Address;
use lettre::Message;
use mail_parser::MessageParser;

use super::EmailDraft;

// Providers are not consistent about padding on the way out.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Header fields read back from a raw message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeaders {
    pub subject: Option<String>,
    /// `Name <address>` when a display name is present, bare address otherwise.
    pub from: Option<String>,
    /// Message-ID without angle brackets.
    pub message_id: Option<String>,
}

pub fn encode_raw(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

pub fn decode_raw(raw: &str) -> Result<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(raw.trim())
        .context("Failed to decode base64url message source")
}

pub fn parse_address(address: &str) -> Result<Address> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| anyhow!("Invalid email address '{}': {}", address.trim(), e))
}

/// Renders the draft as RFC 2822 bytes.
pub fn build_rfc2822(from: &str, draft: &EmailDraft) -> Result<Vec<u8>> {
    let mut builder = Message::builder()
        .from(parse_address(from)?)
        .to(parse_address(&draft.to)?)
        .subject(draft.subject.as_str());

    if let Some(in_reply_to) = &draft.in_reply_to {
        builder = builder.in_reply_to(in_reply_to.clone());
    }
    if let Some(references) = &draft.references {
        builder = builder.references(references.clone());
    }

    let message = builder
        .header(ContentType::TEXT_HTML)
        .body(draft.body.clone())
        .context("Failed to build email message")?;
    Ok(message.formatted())
}

pub fn parse_headers(raw: &[u8]) -> Result<ParsedHeaders> {
    let message = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| anyhow!("Failed to parse message source"))?;

    let from = message.from().and_then(|list| list.first()).map(|addr| {
        match (addr.name(), addr.address()) {
            (Some(name), Some(address)) => format!("{} <{}>", name, address),
            (None, Some(address)) => address.to_string(),
            (Some(name), None) => name.to_string(),
            (None, None) => String::new(),
        }
    });

    Ok(ParsedHeaders {
        subject: message.subject().map(|s| s.to_string()),
        from: from.filter(|f| !f.is_empty()),
        message_id: message.message_id().map(|s| s.to_string()),
    })
}

/// Address portion of a From value: whatever follows the last `<`, with
/// `>` removed.
pub fn extract_address(from: &str) -> String {
    let tail = from.rsplit('<').next().unwrap_or(from);
    tail.replace('>', "").trim().to_string()
}

pub fn reply_subject(original: &str) -> String {
    let trimmed = original.trim_start();
    let already_reply = trimmed
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if already_reply {
        original.to_string()
    } else {
        format!("Re: {}", original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_address() {
        assert_eq!(extract_address("Jane Doe <jane@example.com>"), "jane@example.com");
        assert_eq!(extract_address("jane@example.com"), "jane@example.com");
        assert_eq!(
            extract_address("\"A <b>\" <real@example.com> "),
            "real@example.com"
        );
    }

    #[test]
    fn test_reply_subject_not_doubled() {
        assert_eq!(reply_subject("Interview"), "Re: Interview");
        assert_eq!(reply_subject("Re: Interview"), "Re: Interview");
        assert_eq!(reply_subject("RE: Interview"), "RE: Interview");
        assert_eq!(reply_subject("re:Interview"), "re:Interview");
        assert_eq!(reply_subject("Regarding"), "Re: Regarding");
        assert_eq!(reply_subject(""), "Re: ");
    }

    #[test]
    fn test_build_and_parse_rfc2822() {
        let draft = EmailDraft {
            to: "Jane Doe <jane@example.com>".to_string(),
            subject: "Re: Interview".to_string(),
            body: "<p>Thanks!</p>".to_string(),
            in_reply_to: Some("<orig-1@example.com>".to_string()),
            references: Some("<orig-1@example.com>".to_string()),
            thread_id: Some("t1".to_string()),
        };
        let bytes = build_rfc2822("team@example.com", &draft).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("In-Reply-To: <orig-1@example.com>"));
        assert!(text.contains("References: <orig-1@example.com>"));
        assert!(text.contains("text/html"));

        let headers = parse_headers(&bytes).unwrap();
        assert_eq!(headers.subject.as_deref(), Some("Re: Interview"));
        assert_eq!(headers.from.as_deref(), Some("team@example.com"));
    }

    #[test]
    fn test_build_rejects_invalid_recipient() {
        let draft = EmailDraft {
            to: "not an address".to_string(),
            subject: "Hi".to_string(),
            body: "Hello".to_string(),
            ..Default::default()
        };
        let err = build_rfc2822("team@example.com", &draft).unwrap_err();
        assert!(err.to_string().contains("Invalid email address 'not an address'"));
    }

    #[test]
    fn test_parse_headers_from_raw_source() {
        let raw = b"From: Jane Doe <jane@example.com>\r\nSubject: Hello\r\nMessage-ID: <abc@example.com>\r\n\r\nBody\r\n";
        let headers = parse_headers(raw).unwrap();
        assert_eq!(headers.subject.as_deref(), Some("Hello"));
        assert_eq!(headers.from.as_deref(), Some("Jane Doe <jane@example.com>"));
        assert_eq!(headers.message_id.as_deref(), Some("abc@example.com"));
    }

    #[test]
    fn test_decode_accepts_unpadded_input() {
        let encoded = encode_raw(b"hi");
        assert_eq!(encoded, "aGk=");
        assert_eq!(decode_raw("aGk").unwrap(), b"hi");
        assert_eq!(decode_raw(&encoded).unwrap(), b"hi");
    }
}
