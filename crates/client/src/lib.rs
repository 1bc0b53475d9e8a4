//! HTTP implementation of the Avala platform API.
//!
//! [`AvalaClient`] implements the `avala_core::PlatformApi` trait over
//! reqwest. The agent crate drives it; handler code only ever sees it
//! through the narrow `ActionSink` capability carried by contexts.

pub mod client;

pub use client::{AvalaClient, DEFAULT_BASE_URL};
