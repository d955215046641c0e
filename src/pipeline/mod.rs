//! Per-message policy: authorization, rate limiting, routing.

mod dispatcher;
pub mod request;

pub use dispatcher::Dispatcher;
pub use request::{ParseFailure, ReportRequest, ReportType, parse_request};

use crate::mailbox::{FOLDER_NOT_ACTION, FOLDER_PROCESSED};

/// How one inbound message was handled. Drives folder relocation and
/// nothing else; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Report generated and reply handed to the notifier.
    Handled,
    /// Within the sender's cooldown window; silently dropped.
    RateLimited,
    /// Sender domain not allow-listed (or no usable sender). No reply.
    Unauthorized,
    /// Not a well-formed request, or no plain-text body.
    ParseRejected,
    /// The report generator failed or produced nothing.
    GenerationFailed,
}

/// Where a classified message goes. Anything from an authorized domain
/// lands in "Processed" regardless of downstream outcome; only
/// unauthorized mail goes to "NotAction".
pub fn target_folder(outcome: ProcessingOutcome) -> &'static str {
    match outcome {
        ProcessingOutcome::Unauthorized => FOLDER_NOT_ACTION,
        _ => FOLDER_PROCESSED,
    }
}
