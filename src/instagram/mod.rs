//! Instagram OAuth and media feed retrieval.
//!
//! This module turns the platform's page-oriented JSON into a flat,
//! newest-first, size-limited list of media entries:
//!
//! - **URLs**: Every request URL and form body, built from typed inputs
//! - **Transport**: JSON-over-HTTP with typed errors that keep the error body
//! - **Parsing**: Lenient mapping of raw records into [`MediaEntry`] values
//! - **Fetching**: OAuth token calls and the paginated media loop
//!
//! # Architecture
//!
//! - [`urls`] - Pure URL and form-body builders
//! - [`transport`] - The [`Transport`] seam and its `reqwest` implementation
//! - [`parser`] - Raw record → [`MediaEntry`], video-ignore policy
//! - [`fetcher`] - [`InstagramClient`], pagination and error classification
//! - [`token`] - Credentials, OAuth payloads and callback parsing
//!
//! # Example
//!
//! ```ignore
//! use instafeed::instagram::{AccessToken, InstagramClient};
//!
//! let client = InstagramClient::new(&config, reqwest::Client::new());
//! let token = AccessToken::new(access_code, user_id)?;
//! let media = client.fetch_media(&token, Some(20)).await?;
//! ```

mod error;
mod fetcher;
mod parser;
mod token;
pub mod transport;
pub mod urls;

pub use error::{InstagramError, BAD_TOKEN_ERROR_TYPE};
pub use fetcher::{InstagramClient, MAX_UNBOUNDED_ITEMS};
pub use parser::{is_ignored_video, parse_item, MediaChild, MediaEntry, MediaPage, MediaType, Paging};
pub use token::{AccessToken, AuthCallback, LongLivedToken, ShortLivedToken, UserDetails};
pub use transport::{HttpTransport, Transport, TransportError};
