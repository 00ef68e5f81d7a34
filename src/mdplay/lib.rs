//! # mdplay Architecture
//!
//! mdplay is a **markdown playground library**: type markdown, get sanitized
//! HTML back, with the current document and a theme preference kept on disk
//! between sessions. The `mdplay` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, prints results, owns exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Thin facade over commands, normalizes inputs             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - Compose session, render, preference and export           │
//! │  - Return `CmdResult`, never print                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────┬──────────────────┬───────────────────────┐
//! │  render.rs       │  preference.rs   │  session.rs           │
//! │  newest-wins     │  theme sync      │  current document     │
//! │  coordination    │                  │  bootstrap            │
//! └──────────────────┴──────────────────┴───────────────────────┘
//!          │                     │                 │
//!          ▼                     └────────┬────────┘
//! ┌──────────────────┐           ┌────────▼──────────────────────┐
//! │  pipeline/       │           │  store/                       │
//! │  parse, restruct │           │  RecordStore over a backend   │
//! │  sanitize, serial│           │  (FsBackend, MemBackend)      │
//! └──────────────────┘           └───────────────────────────────┘
//! ```
//!
//! ## Failure policy
//!
//! - Rendering never fails past [`pipeline::Pipeline`]: stage errors become
//!   [`pipeline::ERROR_MARKER`].
//! - Store errors are returned to the direct caller, which logs them and
//!   keeps working from memory.
//! - Missing samples are `ResourceNotFound`; the session falls back to a
//!   fixed welcome text.
//!
//! ## Module Overview
//!
//! - [`api`]: facade used by the CLI
//! - [`commands`]: one module per user-facing operation
//! - [`pipeline`]: markdown to sanitized HTML
//! - [`render`]: token-based stale result suppression
//! - [`store`]: durable records
//! - [`preference`]: theme preference synchronization
//! - [`session`]: the current document
//! - [`samples`]: canned documents
//! - [`export`]: standalone HTML documents
//! - [`config`]: data directory and `config.json`
//! - [`model`]: record types
//! - [`error`]: error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod preference;
pub mod render;
pub mod samples;
pub mod session;
pub mod store;
