//! End-to-end dispatch scenarios: allow-listing, cooldown, parsing,
//! generation, and reply behavior, with the mailbox and SMTP boundaries
//! mocked out.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use weather_mailbot::error::ForecastError;
use weather_mailbot::forecast::{ForecastOrchestrator, ReportGenerator};
use weather_mailbot::mailbox::InboundMessage;
use weather_mailbot::notify::MailSender;
use weather_mailbot::pipeline::{Dispatcher, ProcessingOutcome, ReportRequest, ReportType, target_folder};
use weather_mailbot::store::{LibSqlStore, RateLimitStore};

// ── Mocks ───────────────────────────────────────────────────────────

#[derive(Clone)]
enum Script {
    Succeed(&'static str),
    Empty,
    Fail(&'static str),
}

struct MockGenerator {
    script: Script,
    calls: Mutex<Vec<(ReportType, String)>>,
}

impl MockGenerator {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(ReportType, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportGenerator for MockGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<String, ForecastError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.report_type, request.location_text.clone()));
        match &self.script {
            Script::Succeed(text) => Ok((*text).to_string()),
            Script::Empty => Ok(String::new()),
            Script::Fail(reason) => Err(ForecastError::Upstream((*reason).to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Report { to: String, body: String },
    Error { to: String, reason: String },
}

#[derive(Default)]
struct MockNotifier {
    sent: Mutex<Vec<Sent>>,
}

impl MockNotifier {
    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for MockNotifier {
    async fn send_report(&self, recipient: Option<&str>, report: &str) {
        self.sent.lock().unwrap().push(Sent::Report {
            to: recipient.unwrap_or_default().to_string(),
            body: report.to_string(),
        });
    }

    async fn send_error(&self, recipient: Option<&str>, reason: &str) {
        self.sent.lock().unwrap().push(Sent::Error {
            to: recipient.unwrap_or_default().to_string(),
            reason: reason.to_string(),
        });
    }
}

// ── Harness ─────────────────────────────────────────────────────────

struct Harness {
    dispatcher: Dispatcher,
    generator: Arc<MockGenerator>,
    notifier: Arc<MockNotifier>,
    store: Arc<LibSqlStore>,
}

const COOLDOWN_SECS: u64 = 30;

async fn harness(allowed: &[&str], script: Script) -> Harness {
    let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
    let generator = MockGenerator::new(script);
    let notifier = Arc::new(MockNotifier::default());

    let dispatcher = Dispatcher::new(
        allowed.iter().map(|d| d.to_string()).collect(),
        COOLDOWN_SECS,
        Arc::clone(&store) as Arc<dyn RateLimitStore>,
        ForecastOrchestrator::new(Arc::clone(&generator) as Arc<dyn ReportGenerator>),
        Arc::clone(&notifier) as Arc<dyn MailSender>,
    );

    Harness {
        dispatcher,
        generator,
        notifier,
        store,
    }
}

fn message(sender: Option<&str>, subject: &str, body: Option<&str>) -> InboundMessage {
    InboundMessage {
        uid: 1,
        sender: sender.map(str::to_string),
        subject: subject.to_string(),
        body_text: body.map(str::to_string),
    }
}

// ── Dispatch flow ───────────────────────────────────────────────────

#[tokio::test]
async fn valid_request_generates_and_replies() {
    let h = harness(&["ok.com"], Script::Succeed("Sunny, 68F.")).await;
    let msg = message(Some("a@ok.com"), "Weather: current", Some("Seattle, metric"));

    let outcome = h.dispatcher.dispatch_at(&msg, 1000).await;

    assert_eq!(outcome, ProcessingOutcome::Handled);
    assert_eq!(target_folder(outcome), "Processed");
    assert_eq!(
        h.generator.calls(),
        vec![(ReportType::Current, "Seattle, metric".to_string())]
    );
    assert_eq!(
        h.notifier.sent(),
        vec![Sent::Report {
            to: "a@ok.com".to_string(),
            body: "Sunny, 68F.".to_string(),
        }]
    );
    assert_eq!(h.store.last_request_at("a@ok.com").await.unwrap(), Some(1000));
}

#[tokio::test]
async fn second_request_within_cooldown_is_dropped() {
    let h = harness(&["ok.com"], Script::Succeed("Sunny.")).await;
    let msg = message(Some("a@ok.com"), "Weather: current", Some("Seattle"));

    assert_eq!(
        h.dispatcher.dispatch_at(&msg, 1000).await,
        ProcessingOutcome::Handled
    );

    let outcome = h.dispatcher.dispatch_at(&msg, 1005).await;
    assert_eq!(outcome, ProcessingOutcome::RateLimited);
    // Still relocated to Processed, just without a reply.
    assert_eq!(target_folder(outcome), "Processed");
    assert_eq!(h.notifier.sent().len(), 1);
    assert_eq!(h.generator.calls().len(), 1);
}

#[tokio::test]
async fn unlisted_domain_is_unauthorized_and_untouched() {
    let h = harness(&["ok.com"], Script::Succeed("Sunny.")).await;
    let msg = message(Some("x@bad.com"), "weather:current", Some("Seattle"));

    let outcome = h.dispatcher.dispatch_at(&msg, 1000).await;

    assert_eq!(outcome, ProcessingOutcome::Unauthorized);
    assert_eq!(target_folder(outcome), "NotAction");
    // Nothing downstream ran: no store mutation, no generator call, no reply.
    assert_eq!(h.store.last_request_at("x@bad.com").await.unwrap(), None);
    assert!(h.generator.calls().is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn invalid_report_type_gets_no_reply() {
    let h = harness(&["ok.com"], Script::Succeed("Sunny.")).await;
    let msg = message(Some("a@ok.com"), "weather:weekly", Some("Seattle"));

    let outcome = h.dispatcher.dispatch_at(&msg, 1000).await;

    assert_eq!(outcome, ProcessingOutcome::ParseRejected);
    assert_eq!(target_folder(outcome), "Processed");
    assert!(h.generator.calls().is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn empty_generation_sends_one_error_reply() {
    let h = harness(&["ok.com"], Script::Empty).await;
    let msg = message(Some("a@ok.com"), "weather:daily", Some("Nowhereville"));

    let outcome = h.dispatcher.dispatch_at(&msg, 1000).await;

    assert_eq!(outcome, ProcessingOutcome::GenerationFailed);
    assert_eq!(target_folder(outcome), "Processed");

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Sent::Error { to, reason } => {
            assert_eq!(to, "a@ok.com");
            assert!(reason.contains("Nowhereville"));
            assert!(reason.contains("Generated report was empty"));
        }
        other => panic!("expected an error reply, got {other:?}"),
    }
}

#[tokio::test]
async fn cooldown_rejection_keeps_first_timestamp() {
    let h = harness(&["ok.com"], Script::Succeed("Sunny.")).await;
    let msg = message(Some("a@ok.com"), "weather:current", Some("Seattle"));

    h.dispatcher.dispatch_at(&msg, 1000).await;
    h.dispatcher.dispatch_at(&msg, 1005).await;
    assert_eq!(h.store.last_request_at("a@ok.com").await.unwrap(), Some(1000));

    // Outside the window the request is accepted and the charge moves.
    assert_eq!(
        h.dispatcher.dispatch_at(&msg, 1000 + COOLDOWN_SECS as i64).await,
        ProcessingOutcome::Handled
    );
    assert_eq!(
        h.store.last_request_at("a@ok.com").await.unwrap(),
        Some(1000 + COOLDOWN_SECS as i64)
    );
}

#[tokio::test]
async fn cooldown_is_charged_even_when_generation_fails() {
    let h = harness(&["ok.com"], Script::Fail("upstream down")).await;
    let msg = message(Some("a@ok.com"), "weather:current", Some("Seattle"));

    assert_eq!(
        h.dispatcher.dispatch_at(&msg, 1000).await,
        ProcessingOutcome::GenerationFailed
    );
    // The charge happened before generation, so a retry inside the
    // window is still dropped.
    assert_eq!(
        h.dispatcher.dispatch_at(&msg, 1010).await,
        ProcessingOutcome::RateLimited
    );
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn wildcard_allow_list_accepts_any_domain() {
    let h = harness(&["*"], Script::Succeed("Sunny.")).await;
    let msg = message(Some("who@anywhere.org"), "weather:current", Some("Oslo"));

    assert_eq!(
        h.dispatcher.dispatch_at(&msg, 1000).await,
        ProcessingOutcome::Handled
    );
}

#[tokio::test]
async fn non_request_subject_from_authorized_sender_is_ignored() {
    let h = harness(&["ok.com"], Script::Succeed("Sunny.")).await;
    let msg = message(Some("a@ok.com"), "lunch on friday?", Some("hi"));

    let outcome = h.dispatcher.dispatch_at(&msg, 1000).await;
    assert_eq!(outcome, ProcessingOutcome::ParseRejected);
    assert_eq!(target_folder(outcome), "Processed");
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn missing_body_earns_an_error_reply() {
    let h = harness(&["ok.com"], Script::Succeed("Sunny.")).await;
    let msg = message(Some("a@ok.com"), "weather:current", None);

    let outcome = h.dispatcher.dispatch_at(&msg, 1000).await;
    assert_eq!(outcome, ProcessingOutcome::ParseRejected);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Sent::Error { to, .. } if to == "a@ok.com"));
    assert!(h.generator.calls().is_empty());
}

#[tokio::test]
async fn message_without_sender_is_unauthorized() {
    let h = harness(&["*"], Script::Succeed("Sunny.")).await;
    let msg = message(None, "weather:current", Some("Seattle"));

    let outcome = h.dispatcher.dispatch_at(&msg, 1000).await;
    assert_eq!(outcome, ProcessingOutcome::Unauthorized);
    assert_eq!(target_folder(outcome), "NotAction");
    assert!(h.notifier.sent().is_empty());
}
