//! Graph Maker
//!
//! A terminal chat with a hosted data-analyst assistant. The assistant plans
//! in its own sandbox, but any code that must touch the local dataset comes
//! back as a tool call that this crate runs on the host and answers.
//!
//! # Architecture
//!
//! - **Run loop**: polls a remote run and reacts to each status
//! - **Tool bridge**: turns a tool call into exactly one tool output
//! - **Executor**: runs a script in a short-lived, resource-limited subprocess
//! - **Assistants client**: typed REST client for threads, runs and files
//!
//! # Modules
//!
//! - [`run`]: run advancement state machine
//! - [`bridge`]: tool-call to tool-output translation
//! - [`executor`]: isolated code execution
//! - [`assistants`]: remote API types, traits and HTTP client
//! - [`session`]: assistant and thread setup
//! - [`dataset`]: dataset upload
//! - [`chat`]: interactive loop

#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::module_name_repetitions)]

pub mod assistants;
pub mod bridge;
pub mod chat;
pub mod config;
pub mod dataset;
pub mod executor;
pub mod run;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod testing;
