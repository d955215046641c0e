//! Subject-convention parsing: `weather:{daily|current|hourly}`.

use std::fmt;

use crate::mailbox::InboundMessage;

/// Subject prefix, matched case-insensitively.
const SUBJECT_PREFIX: &str = "weather:";

/// The three report kinds a requester can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    Daily,
    Current,
    Hourly,
}

impl ReportType {
    /// Report-type tokens are case-sensitive: `Daily` is not a request.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "daily" => Some(Self::Daily),
            "current" => Some(Self::Current),
            "hourly" => Some(Self::Hourly),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Current => "current",
            Self::Hourly => "hourly",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated report request, alive for a single processing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub sender: String,
    pub report_type: ReportType,
    pub location_text: String,
}

/// Why a message failed to become a `ReportRequest`.
///
/// Only `MissingBody` earns the requester an error reply; the other two
/// mean "not a request" and stay silent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// Subject does not start with the `weather:` prefix.
    NotARequest,
    /// Prefix matched but the report-type token is unknown.
    InvalidReportType(String),
    /// No plain-text part to use as the location text.
    MissingBody,
}

/// Validate the subject convention and extract the request payload.
///
/// The caller has already established the sender, so `sender` is passed
/// in rather than re-derived from the message.
pub fn parse_request(sender: &str, msg: &InboundMessage) -> Result<ReportRequest, ParseFailure> {
    let token = parse_subject(&msg.subject)?;
    let report_type =
        ReportType::from_token(token).ok_or_else(|| ParseFailure::InvalidReportType(token.to_string()))?;

    let location_text = msg.body_text.clone().ok_or(ParseFailure::MissingBody)?;

    Ok(ReportRequest {
        sender: sender.to_string(),
        report_type,
        location_text,
    })
}

/// The report-type token: text after the first colon, surrounding
/// whitespace trimmed. Prefix match is case-insensitive.
fn parse_subject(subject: &str) -> Result<&str, ParseFailure> {
    let trimmed = subject.trim_start();
    match trimmed.get(..SUBJECT_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SUBJECT_PREFIX) => {
            Ok(trimmed[SUBJECT_PREFIX.len()..].trim())
        }
        _ => Err(ParseFailure::NotARequest),
    }
}
