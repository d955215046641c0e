//! Poll loop — the single sequential worker driving the whole pipeline.
//!
//! One cycle: connect → search → for each candidate: fetch, classify,
//! relocate → logout. The sleep starts only after the cycle fully
//! completes, so cycles can never overlap, and the shutdown flag is
//! observed between cycles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::mailbox::MailboxClient;
use crate::pipeline::{Dispatcher, target_folder};

/// Spawn the background poll loop.
///
/// Returns the task handle and a shutdown flag; setting the flag stops
/// the loop at the next cycle boundary.
pub fn spawn_poller(
    config: Arc<Config>,
    dispatcher: Arc<Dispatcher>,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            interval_secs = config.poll_interval_secs,
            imap_host = %config.imap_host,
            "Mailbox poller started"
        );

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("Mailbox poller shutting down");
                return;
            }

            run_cycle(&config, &dispatcher).await;

            tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
        }
    });

    (handle, shutdown_flag)
}

/// One full poll cycle. Connection failure aborts the cycle; per-message
/// failures skip that message and keep going. Relocation happens
/// unconditionally once a message is classified, so nothing is ever
/// reprocessed on a later cycle.
async fn run_cycle(config: &Config, dispatcher: &Dispatcher) {
    debug!("Starting mailbox poll cycle");

    let mut mailbox = match MailboxClient::connect(config).await {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "Mailbox connection failed, skipping cycle");
            return;
        }
    };

    let uids = match mailbox.find_candidates().await {
        Ok(uids) => uids,
        Err(e) => {
            error!(error = %e, "Candidate search failed, aborting cycle");
            mailbox.disconnect().await;
            return;
        }
    };

    if !uids.is_empty() {
        info!(count = uids.len(), "Found candidate messages");
    }

    for uid in uids {
        let msg = match mailbox.fetch(uid).await {
            Ok(msg) => msg,
            Err(e) => {
                error!(uid, error = %e, "Fetch failed, skipping message");
                continue;
            }
        };

        let outcome = dispatcher.dispatch(&msg).await;
        let folder = target_folder(outcome);
        debug!(uid, ?outcome, folder, "Message classified");

        if let Err(e) = mailbox.relocate(uid, folder).await {
            warn!(uid, folder, error = %e, "Relocation failed, message left in place");
        }
    }

    mailbox.disconnect().await;
    debug!("Poll cycle complete");
}
