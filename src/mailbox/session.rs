//! Blocking IMAP session over rustls.
//!
//! Speaks just enough IMAP for this agent: LOGIN, SELECT, UID SEARCH,
//! UID FETCH, and the copy/flag/expunge relocation sequence. Runs on a
//! blocking thread (`spawn_blocking`); the async facade lives in
//! `mailbox::mod`.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::MailboxError;

const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// A tagged IMAP command's full response.
struct Response {
    /// Untagged (`*`) lines received before the tagged completion.
    lines: Vec<String>,
    /// Literal payloads (`{n}` blocks), in arrival order.
    literals: Vec<Vec<u8>>,
    /// The tagged completion line.
    tagged: String,
}

impl Response {
    fn is_ok(&self) -> bool {
        self.tagged
            .split_whitespace()
            .nth(1)
            .is_some_and(|w| w.eq_ignore_ascii_case("OK"))
    }
}

/// An authenticated IMAP session with INBOX selected.
pub struct MailboxSession {
    stream: rustls::StreamOwned<rustls::ClientConnection, TcpStream>,
    tag_seq: u32,
}

impl MailboxSession {
    /// Open a TLS connection, authenticate, and select INBOX.
    pub fn connect(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<Self, MailboxError> {
        let tcp = TcpStream::connect((host, port)).map_err(|e| MailboxError::Connection {
            host: host.to_string(),
            reason: e.to_string(),
        })?;
        tcp.set_read_timeout(Some(READ_TIMEOUT))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
            .map_err(|e| MailboxError::Tls(e.to_string()))?;
        let conn = rustls::ClientConnection::new(tls_config, server_name)
            .map_err(|e| MailboxError::Tls(e.to_string()))?;

        let mut session = Self {
            stream: rustls::StreamOwned::new(conn, tcp),
            tag_seq: 0,
        };

        // Server greeting
        session.read_line()?;

        let login = session.command(&format!("LOGIN \"{username}\" \"{password}\""))?;
        if !login.is_ok() {
            return Err(MailboxError::AuthRejected {
                username: username.to_string(),
            });
        }

        let select = session.command("SELECT \"INBOX\"")?;
        if !select.is_ok() {
            return Err(MailboxError::Protocol(format!(
                "SELECT INBOX failed: {}",
                select.tagged.trim_end()
            )));
        }

        Ok(session)
    }

    /// UIDs of unread messages whose subject contains `keyword`.
    pub fn search_unread(&mut self, keyword: &str) -> Result<Vec<u32>, MailboxError> {
        let resp = self.command(&format!("UID SEARCH SUBJECT \"{keyword}\" UNSEEN"))?;
        if !resp.is_ok() {
            return Err(MailboxError::Protocol(format!(
                "UID SEARCH failed: {}",
                resp.tagged.trim_end()
            )));
        }
        Ok(collect_search_uids(&resp.lines))
    }

    /// Fetch a message's raw RFC 822 bytes by UID.
    pub fn fetch_raw(&mut self, uid: u32) -> Result<Vec<u8>, MailboxError> {
        let resp = self.command(&format!("UID FETCH {uid} (RFC822)"))?;
        if !resp.is_ok() {
            return Err(MailboxError::Fetch {
                uid,
                reason: resp.tagged.trim_end().to_string(),
            });
        }
        resp.literals.into_iter().next().ok_or(MailboxError::Fetch {
            uid,
            reason: "no message data in FETCH response".to_string(),
        })
    }

    /// Relocate a message: copy to `folder`, flag the original deleted,
    /// purge. After this the message is gone from the unread candidate set
    /// and is never seen by a later cycle.
    pub fn relocate(&mut self, uid: u32, folder: &str) -> Result<(), MailboxError> {
        let copy = self.command(&format!("UID COPY {uid} \"{folder}\""))?;
        if !copy.is_ok() {
            return Err(MailboxError::Relocate {
                uid,
                folder: folder.to_string(),
                reason: copy.tagged.trim_end().to_string(),
            });
        }

        let flag = self.command(&format!("UID STORE {uid} +FLAGS (\\Deleted)"))?;
        if !flag.is_ok() {
            return Err(MailboxError::Relocate {
                uid,
                folder: folder.to_string(),
                reason: flag.tagged.trim_end().to_string(),
            });
        }

        let expunge = self.command("EXPUNGE")?;
        if !expunge.is_ok() {
            return Err(MailboxError::Relocate {
                uid,
                folder: folder.to_string(),
                reason: expunge.tagged.trim_end().to_string(),
            });
        }

        Ok(())
    }

    /// Best-effort LOGOUT; the TLS stream is dropped either way.
    pub fn logout(&mut self) {
        let _ = self.command("LOGOUT");
    }

    // ── Wire protocol ───────────────────────────────────────────────

    fn next_tag(&mut self) -> String {
        self.tag_seq += 1;
        format!("A{}", self.tag_seq)
    }

    /// Send one tagged command and collect everything up to its tagged
    /// completion, reading `{n}` literal payloads in full as they appear.
    fn command(&mut self, cmd: &str) -> Result<Response, MailboxError> {
        let tag = self.next_tag();
        self.stream.write_all(format!("{tag} {cmd}\r\n").as_bytes())?;
        self.stream.flush()?;
        let tag_prefix = format!("{tag} ");

        let mut lines = Vec::new();
        let mut literals = Vec::new();
        loop {
            let line = self.read_line()?;

            if let Some(len) = literal_len(&line) {
                let mut payload = vec![0u8; len];
                self.stream.read_exact(&mut payload)?;
                literals.push(payload);
                lines.push(line);
                // Remainder of the enclosing response line (usually ")")
                lines.push(self.read_line()?);
                continue;
            }

            if line.starts_with(&tag_prefix) {
                return Ok(Response {
                    lines,
                    literals,
                    tagged: line,
                });
            }
            lines.push(line);
        }
    }

    fn read_line(&mut self) -> Result<String, MailboxError> {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            match self.stream.read(&mut byte) {
                Ok(0) => {
                    return Err(MailboxError::Protocol(
                        "connection closed mid-response".to_string(),
                    ));
                }
                Ok(_) => {
                    buf.push(byte[0]);
                    if buf.ends_with(b"\r\n") {
                        return Ok(String::from_utf8_lossy(&buf).to_string());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Pull UIDs out of `* SEARCH ...` result lines.
fn collect_search_uids(lines: &[String]) -> Vec<u32> {
    let mut uids = Vec::new();
    for line in lines {
        if let Some(rest) = line.strip_prefix("* SEARCH") {
            uids.extend(rest.split_whitespace().filter_map(|w| w.parse::<u32>().ok()));
        }
    }
    uids
}

/// Length of a trailing IMAP literal marker (`{n}`) on a response line.
fn literal_len(line: &str) -> Option<usize> {
    let trimmed = line.trim_end();
    let inner = trimmed.strip_suffix('}')?;
    let start = inner.rfind('{')?;
    inner[start + 1..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_uids_parsed_from_result_line() {
        let lines = vec!["* SEARCH 4 17 102\r\n".to_string()];
        assert_eq!(collect_search_uids(&lines), vec![4, 17, 102]);
    }

    #[test]
    fn search_with_no_matches_is_empty() {
        let lines = vec!["* SEARCH\r\n".to_string()];
        assert!(collect_search_uids(&lines).is_empty());
    }

    #[test]
    fn unrelated_untagged_lines_are_ignored() {
        let lines = vec![
            "* 12 EXISTS\r\n".to_string(),
            "* SEARCH 3\r\n".to_string(),
        ];
        assert_eq!(collect_search_uids(&lines), vec![3]);
    }

    #[test]
    fn literal_marker_parsed() {
        assert_eq!(literal_len("* 1 FETCH (UID 4 RFC822 {3520}\r\n"), Some(3520));
        assert_eq!(literal_len("* 1 FETCH (FLAGS (\\Seen))\r\n"), None);
        assert_eq!(literal_len("A3 OK FETCH completed\r\n"), None);
    }
}
