//! Client-side integration with Instagram's OAuth flow and media API.
//!
//! See [`instagram`] for the retrieval pipeline and [`config`] for settings.

pub mod config;
pub mod instagram;
