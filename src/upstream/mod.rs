//! Upstream side: the long-poll source abstraction and its Nomad client.
//!
//! Pollers only see [`ResourceSource`]; [`NomadClient`] is the production
//! implementation talking to the Nomad HTTP API.

pub mod client;
pub mod source;

pub use client::NomadClient;
pub use source::{PollOutcome, ResourceSource};
