//! Mailbox retrieval — async facade over the blocking IMAP session.
//!
//! One `MailboxClient` serves one poll cycle: connect, search, fetch each
//! candidate, relocate it once classified, then log out. All protocol IO
//! happens on blocking threads; the session is moved in and out of
//! `spawn_blocking` so a single authenticated session lasts the whole
//! cycle.

pub mod message;
mod session;

use tokio::task;

use crate::config::Config;
use crate::error::MailboxError;
pub use message::{InboundMessage, sender_domain};
use session::MailboxSession;

/// Folder for messages from allow-listed domains, whatever the downstream
/// outcome.
pub const FOLDER_PROCESSED: &str = "Processed";
/// Folder for messages from domains outside the allow-list.
pub const FOLDER_NOT_ACTION: &str = "NotAction";
/// Subject keyword in the IMAP search predicate.
pub const SUBJECT_KEYWORD: &str = "weather";

/// Async mailbox client for a single poll cycle.
pub struct MailboxClient {
    session: Option<MailboxSession>,
}

impl MailboxClient {
    /// Establish an authenticated session with INBOX selected.
    pub async fn connect(config: &Config) -> Result<Self, MailboxError> {
        let host = config.imap_host.clone();
        let port = config.imap_port;
        let username = config.username.clone();
        let password = config.password.clone();

        let session = task::spawn_blocking(move || {
            MailboxSession::connect(&host, port, &username, &password)
        })
        .await
        .map_err(join_error)??;

        Ok(Self {
            session: Some(session),
        })
    }

    /// UIDs of unread messages matching the subject convention.
    pub async fn find_candidates(&mut self) -> Result<Vec<u32>, MailboxError> {
        self.with_session(|s| s.search_unread(SUBJECT_KEYWORD)).await
    }

    /// Fetch and parse one message.
    pub async fn fetch(&mut self, uid: u32) -> Result<InboundMessage, MailboxError> {
        let raw = self.with_session(move |s| s.fetch_raw(uid)).await?;
        message::parse_inbound(uid, &raw).ok_or(MailboxError::Fetch {
            uid,
            reason: "unparseable message".to_string(),
        })
    }

    /// Move a classified message into its outcome folder
    /// (copy, flag deleted, expunge).
    pub async fn relocate(&mut self, uid: u32, folder: &'static str) -> Result<(), MailboxError> {
        self.with_session(move |s| s.relocate(uid, folder)).await
    }

    /// Best-effort logout; always releases the session.
    pub async fn disconnect(mut self) {
        if let Some(mut session) = self.session.take() {
            let _ = task::spawn_blocking(move || session.logout()).await;
        }
    }

    /// Run a blocking session operation, moving the session onto a
    /// blocking thread and back.
    async fn with_session<T, F>(&mut self, op: F) -> Result<T, MailboxError>
    where
        T: Send + 'static,
        F: FnOnce(&mut MailboxSession) -> Result<T, MailboxError> + Send + 'static,
    {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| MailboxError::Protocol("session already closed".to_string()))?;

        let (session, result) = task::spawn_blocking(move || {
            let result = op(&mut session);
            (session, result)
        })
        .await
        .map_err(join_error)?;

        self.session = Some(session);
        result
    }
}

fn join_error(e: task::JoinError) -> MailboxError {
    MailboxError::Protocol(format!("blocking mailbox task failed: {e}"))
}
