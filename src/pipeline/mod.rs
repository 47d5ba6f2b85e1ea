//! The summarization pipeline, stage by stage.
//!
//! ```text
//!   file reference
//!        │
//!        ▼
//!   access   ── resolve to a readable path (direct / copy / bookmark)
//!        │
//!        ▼
//!   extract  ── bytes -> normalized plain text
//!        │
//!        ▼
//!   llm      ── prompt -> completion endpoint -> raw reply
//!        │
//!        ▼
//!   repair   ── raw reply -> exactly N validated cards
//! ```
//!
//! Each stage is independently usable; [`crate::summarize`] wires them
//! together with retry, observer notifications, and persistence.

pub mod access;
pub mod extract;
pub mod llm;
pub mod repair;
