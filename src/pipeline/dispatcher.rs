//! Dispatcher — applies allow-list and cooldown policy to each fetched
//! message and routes it through parse → generate → reply.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::forecast::ForecastOrchestrator;
use crate::mailbox::{InboundMessage, sender_domain};
use crate::notify::MailSender;
use crate::pipeline::request::{ParseFailure, parse_request};
use crate::pipeline::ProcessingOutcome;
use crate::store::RateLimitStore;

pub struct Dispatcher {
    allowed_domains: Vec<String>,
    cooldown_secs: u64,
    store: Arc<dyn RateLimitStore>,
    orchestrator: ForecastOrchestrator,
    notifier: Arc<dyn MailSender>,
}

impl Dispatcher {
    pub fn new(
        allowed_domains: Vec<String>,
        cooldown_secs: u64,
        store: Arc<dyn RateLimitStore>,
        orchestrator: ForecastOrchestrator,
        notifier: Arc<dyn MailSender>,
    ) -> Self {
        Self {
            allowed_domains,
            cooldown_secs,
            store,
            orchestrator,
            notifier,
        }
    }

    /// `*` in the allow-list accepts every domain; otherwise exact match.
    fn is_domain_allowed(&self, domain: &str) -> bool {
        self.allowed_domains.iter().any(|d| d == "*" || d == domain)
    }

    /// Classify and handle one fetched message. Never fails: every
    /// failure mode folds into a `ProcessingOutcome` so the caller can
    /// relocate the message unconditionally.
    pub async fn dispatch(&self, msg: &InboundMessage) -> ProcessingOutcome {
        self.dispatch_at(msg, chrono::Utc::now().timestamp()).await
    }

    /// `dispatch` with an explicit clock, so cooldown ordering is testable.
    pub async fn dispatch_at(&self, msg: &InboundMessage, now: i64) -> ProcessingOutcome {
        let Some(sender) = msg.sender.as_deref() else {
            warn!(uid = msg.uid, "Message has no From address");
            return ProcessingOutcome::Unauthorized;
        };

        let Some(domain) = sender_domain(sender) else {
            warn!(uid = msg.uid, sender, "Sender address has no domain");
            return ProcessingOutcome::Unauthorized;
        };

        if !self.is_domain_allowed(domain) {
            warn!(sender, domain, "Domain not in allowed list");
            return ProcessingOutcome::Unauthorized;
        }

        // Charge the cooldown before any downstream work, so a slow or
        // failing generation still counts against the window. Within the
        // window the request is dropped silently: no reply, no error
        // recorded. Replying here would invite reply storms.
        match self
            .store
            .try_begin_request(sender, now, self.cooldown_secs)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                info!(sender, "Request within cooldown window, discarding");
                return ProcessingOutcome::RateLimited;
            }
            Err(e) => {
                // Fail closed: a broken store must not bypass the cooldown.
                error!(sender, error = %e, "Rate-limit store unavailable, discarding request");
                return ProcessingOutcome::RateLimited;
            }
        }

        let request = match parse_request(sender, msg) {
            Ok(request) => request,
            Err(ParseFailure::NotARequest) => {
                debug!(subject = %msg.subject, "Subject does not match the request convention");
                return ProcessingOutcome::ParseRejected;
            }
            Err(ParseFailure::InvalidReportType(token)) => {
                warn!(sender, token, "Invalid report type in subject");
                return ProcessingOutcome::ParseRejected;
            }
            Err(ParseFailure::MissingBody) => {
                warn!(sender, "No plain-text body in request");
                self.notifier
                    .send_error(Some(sender), "Failed to extract the email body.")
                    .await;
                return ProcessingOutcome::ParseRejected;
            }
        };

        info!(
            sender,
            report_type = %request.report_type,
            "Generating weather report"
        );

        match self.orchestrator.generate(&request).await {
            Ok(report) => {
                self.notifier.send_report(Some(sender), &report).await;
                ProcessingOutcome::Handled
            }
            Err(e) => {
                warn!(sender, error = %e, "Report generation failed");
                self.notifier
                    .send_error(
                        Some(sender),
                        &format!(
                            "Failed to generate the weather report for: {} | Error: {e}",
                            request.location_text
                        ),
                    )
                    .await;
                ProcessingOutcome::GenerationFailed
            }
        }
    }
}
