use super::error::InstagramError;
use super::parser::{is_ignored_video, parse_item, MediaEntry, MediaPage};
use super::token::{AccessToken, LongLivedToken, ShortLivedToken, UserDetails};
use super::transport::{HttpTransport, Transport};
use super::urls::{self, Endpoints};
use crate::config::Config;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Hard ceiling on raw items accumulated when no limit is requested.
pub const MAX_UNBOUNDED_ITEMS: usize = 1000;

/// Instagram OAuth and media client.
///
/// Holds read-only settings; every call re-fetches from the network.
/// Requests are issued strictly one after another.
pub struct InstagramClient<T = HttpTransport> {
    transport: T,
    endpoints: Endpoints,
    client_id: String,
    client_secret: SecretString,
    redirect_uri: String,
    ignore_video: bool,
}

impl InstagramClient<HttpTransport> {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        Self::with_transport(config, HttpTransport::new(client))
    }
}

impl<T: Transport> InstagramClient<T> {
    pub fn with_transport(config: &Config, transport: T) -> Self {
        Self {
            transport,
            endpoints: Endpoints::new(&config.api_base_url, &config.graph_base_url),
            client_id: config.client_id.clone(),
            client_secret: SecretString::from(config.client_secret.clone()),
            redirect_uri: urls::redirect_uri(config.callback_base(), &config.auth_callback_route),
            ignore_video: config.ignore_video,
        }
    }

    /// Callback URL registered with the Instagram app.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Authorization URL; `state` is the per-profile CSRF token checked on callback.
    pub fn auth_url(&self, state: &str) -> String {
        self.endpoints
            .authorize_url(&self.client_id, &self.redirect_uri, state)
    }

    /// Exchanges an authorization code for a short-lived token.
    pub async fn request_token(&self, code: &str) -> Result<ShortLivedToken, InstagramError> {
        let form = urls::token_exchange_form(
            &self.client_id,
            self.client_secret.expose_secret(),
            &self.redirect_uri,
            code,
        );
        let value = self
            .transport
            .post_form(&self.endpoints.access_token_url(), &form)
            .await?;
        decode(value)
    }

    /// Swaps a short-lived token for a long-lived one.
    pub async fn exchange_token(
        &self,
        short_token: &ShortLivedToken,
    ) -> Result<LongLivedToken, InstagramError> {
        let url = self
            .endpoints
            .exchange_token_url(self.client_secret.expose_secret(), &short_token.access_token);
        decode(self.transport.get_json(&url).await?)
    }

    pub async fn refresh_token(&self, token: &AccessToken) -> Result<LongLivedToken, InstagramError> {
        let url = self.endpoints.refresh_token_url(token.access_code());
        decode(self.transport.get_json(&url).await?)
    }

    pub async fn fetch_user_details(
        &self,
        token: &AccessToken,
    ) -> Result<UserDetails, InstagramError> {
        let url = self
            .endpoints
            .user_info_url(token.user_id(), token.access_code());
        decode(self.transport.get_json(&url).await?)
    }

    /// Fetches the user's media, newest first, at most `limit` entries.
    ///
    /// Pages are followed while a `next` cursor exists and the accumulated
    /// raw count is still within `limit` (or [`MAX_UNBOUNDED_ITEMS`] when no
    /// limit is given), so one page past what is strictly needed may be read.
    /// Malformed records are skipped. Equal timestamps keep arrival order.
    ///
    /// # Errors
    ///
    /// - [`InstagramError::BadToken`] - the platform rejected the token
    /// - [`InstagramError::Transport`] - any other request failure
    /// - [`InstagramError::Decode`] - a page without a `data` array
    pub async fn fetch_media(
        &self,
        token: &AccessToken,
        limit: Option<usize>,
    ) -> Result<Vec<MediaEntry>, InstagramError> {
        let url = self.endpoints.media_url(
            token.user_id(),
            urls::page_size(limit),
            token.access_code(),
        );

        let page: MediaPage = decode(self.fetch_response_data(&url).await?)?;
        let mut pages = 1usize;
        let mut next = page.next_page().map(str::to_string);
        let mut raw_items: Vec<Value> = Vec::new();
        self.accumulate(&mut raw_items, page.data);

        while let Some(next_url) = next.take() {
            if !should_fetch_next_page(raw_items.len(), limit) {
                break;
            }
            pages += 1;
            tracing::debug!(
                page = pages,
                accumulated = raw_items.len(),
                "Fetching next media page"
            );
            let page: MediaPage = decode(self.fetch_response_data(&next_url).await?)?;
            next = page.next_page().map(str::to_string);
            self.accumulate(&mut raw_items, page.data);
        }

        let raw_count = raw_items.len();
        let mut entries: Vec<MediaEntry> = raw_items
            .iter()
            .filter_map(|raw| parse_item(raw, self.ignore_video))
            .collect();

        let skipped = raw_count - entries.len();
        if skipped > 0 {
            tracing::warn!(skipped = skipped, "Malformed media records skipped");
        }

        // Stable sort: equal timestamps keep arrival order
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        tracing::info!(
            user_id = %token.user_id(),
            pages = pages,
            raw = raw_count,
            returned = entries.len(),
            "Fetched media"
        );

        Ok(entries)
    }

    /// GETs `url`, reclassifying token failures as [`InstagramError::BadToken`].
    pub async fn fetch_response_data(&self, url: &str) -> Result<Value, InstagramError> {
        self.transport.get_json(url).await.map_err(|e| {
            let err = InstagramError::classify(e);
            if matches!(err, InstagramError::BadToken) {
                tracing::warn!("Instagram rejected the access token, re-authentication required");
            }
            err
        })
    }

    fn accumulate(&self, raw_items: &mut Vec<Value>, page: Vec<Value>) {
        raw_items.extend(
            page.into_iter()
                .filter(|raw| !is_ignored_video(raw, self.ignore_video)),
        );
    }
}

/// `<=` on purpose: reading can continue once the count equals the ceiling.
fn should_fetch_next_page(accumulated: usize, limit: Option<usize>) -> bool {
    accumulated <= limit.unwrap_or(MAX_UNBOUNDED_ITEMS)
}

fn decode<D: DeserializeOwned>(value: Value) -> Result<D, InstagramError> {
    serde_json::from_value(value).map_err(|e| InstagramError::Decode(e.to_string()))
}
