//! Inbound message model and RFC 822 extraction via mail-parser.

use mail_parser::MessageParser;

/// One fetched inbound message. Transient: constructed per fetched item,
/// discarded after processing.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// IMAP UID within the selected mailbox.
    pub uid: u32,
    /// Sender address from the From header, if one was present.
    pub sender: Option<String>,
    pub subject: String,
    /// Contents of the first plain-text part, if any.
    pub body_text: Option<String>,
}

/// Parse a raw RFC 822 message into an `InboundMessage`.
///
/// Returns `None` when the bytes are not parseable as a message at all.
pub fn parse_inbound(uid: u32, raw: &[u8]) -> Option<InboundMessage> {
    let parsed = MessageParser::default().parse(raw)?;

    let sender = parsed
        .from()
        .and_then(|addr| addr.first())
        .and_then(|a| a.address())
        .map(|s| s.to_string());

    let subject = parsed.subject().unwrap_or("").to_string();
    let body_text = parsed.body_text(0).map(|c| c.to_string());

    Some(InboundMessage {
        uid,
        sender,
        subject,
        body_text,
    })
}

/// Extract the domain of a sender address: the substring after the last
/// `@`, with a trailing `>` trimmed (some clients hand us `Name <a@b>`
/// style values).
pub fn sender_domain(address: &str) -> Option<&str> {
    let (_, domain) = address.rsplit_once('@')?;
    let domain = domain.trim_end_matches('>');
    if domain.is_empty() { None } else { Some(domain) }
}
