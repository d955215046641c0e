//! weather-mailbot — unattended weather-report mailbox agent.
//!
//! Polls an inbox for unread `weather:{daily|current|hourly}` requests,
//! enforces a per-sender cooldown, generates a report through an external
//! resolver + weather service, replies by email, and files each message
//! into an outcome folder.

pub mod config;
pub mod error;
pub mod forecast;
pub mod mailbox;
pub mod notify;
pub mod pipeline;
pub mod poller;
pub mod store;
