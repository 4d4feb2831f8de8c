//! Chat cockpit runtime for an AI coding assistant.
//!
//! ## Flow
//!
//! A submitted prompt is appended to the current project (created on demand)
//! and persisted, then a [`runtime::RuntimeController`] worker asks the
//! configured [`chat_provider::ChatProvider`] for a reply. The reply is
//! ingested: fenced code blocks become [`project_store::CodeSnippet`]s, the
//! newest frontend snippet replaces the active preview, and the project is
//! persisted again. The status indicator walks `idle -> thinking -> building ->
//! idle`; the last step is a cosmetic delay (`COCKPIT_SETTLE_MS`).
//!
//! Only one turn is in flight at a time. Submissions made while busy are
//! dropped. A failed provider call leaves the conversation with just the user
//! message and returns the status to idle.
//!
//! ## Provider bootstrap
//!
//! `COCKPIT_PROVIDER` selects the provider; `mock` (the default) is the only
//! built-in one.

pub mod app;
pub mod commands;
pub mod config;
pub mod ingest;
pub mod live;
pub mod logging;
pub mod preview;
pub mod providers;
pub mod runtime;
pub mod turn;
