//! Request URL and form-body construction for every Instagram API call.
//!
//! All functions are pure. With [`Endpoints::default`] the produced URLs are
//! byte-for-byte what the Instagram Basic Display / Business Login APIs expect.

/// Fields requested for each media record.
pub const MEDIA_FIELDS: &str =
    "caption,id,media_type,media_url,thumbnail_url,permalink,children{media_type,media_url},timestamp";

/// OAuth scope requested during authorization.
pub const SCOPE: &str = "instagram_business_basic";

/// Largest page the media endpoint will return.
pub const MAX_PAGE_SIZE: usize = 100;

/// Base hosts for the OAuth (`api`) and Graph (`graph`) APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub graph_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: "https://api.instagram.com".to_string(),
            graph_base: "https://graph.instagram.com".to_string(),
        }
    }
}

impl Endpoints {
    pub fn new(api_base: &str, graph_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            graph_base: graph_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn authorize_url(&self, client_id: &str, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}/oauth/authorize/?client_id={}&redirect_uri={}&scope={}&response_type=code&state={}",
            self.api_base, client_id, redirect_uri, SCOPE, state
        )
    }

    pub fn access_token_url(&self) -> String {
        format!("{}/oauth/access_token", self.api_base)
    }

    pub fn exchange_token_url(&self, client_secret: &str, access_token: &str) -> String {
        format!(
            "{}/access_token?grant_type=ig_exchange_token&client_secret={}&access_token={}",
            self.graph_base, client_secret, access_token
        )
    }

    pub fn refresh_token_url(&self, access_token: &str) -> String {
        format!(
            "{}/refresh_access_token?grant_type=ig_refresh_token&access_token={}",
            self.graph_base, access_token
        )
    }

    pub fn user_info_url(&self, user_id: &str, access_token: &str) -> String {
        format!(
            "{}/{}?fields=id,username&access_token={}",
            self.graph_base, user_id, access_token
        )
    }

    pub fn media_url(&self, user_id: &str, page_size: usize, access_token: &str) -> String {
        format!(
            "{}/{}/media?fields={}&limit={}&access_token={}",
            self.graph_base,
            user_id,
            encoded_media_fields(),
            page_size,
            access_token
        )
    }
}

/// Form fields for the authorization-code exchange, in wire order.
pub fn token_exchange_form<'a>(
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    code: &'a str,
) -> [(&'static str, &'a str); 5] {
    [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
        ("code", code),
    ]
}

/// Joins the application base and callback route with exactly one `/`.
pub fn redirect_uri(base: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

/// Page size sent upstream: the requested limit capped at [`MAX_PAGE_SIZE`].
pub fn page_size(limit: Option<usize>) -> usize {
    limit.map_or(MAX_PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE))
}

fn encoded_media_fields() -> String {
    url::form_urlencoded::byte_serialize(MEDIA_FIELDS.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_authorize_url_wire_format() {
        let url = Endpoints::default().authorize_url(
            "client123",
            "https://app.test/instagram/auth/callback",
            "csrf-token",
        );
        assert_eq!(
            url,
            "https://api.instagram.com/oauth/authorize/?client_id=client123&redirect_uri=https://app.test/instagram/auth/callback&scope=instagram_business_basic&response_type=code&state=csrf-token"
        );
    }

    #[test]
    fn test_exchange_and_refresh_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.exchange_token_url("secret", "short"),
            "https://graph.instagram.com/access_token?grant_type=ig_exchange_token&client_secret=secret&access_token=short"
        );
        assert_eq!(
            endpoints.refresh_token_url("long"),
            "https://graph.instagram.com/refresh_access_token?grant_type=ig_refresh_token&access_token=long"
        );
        assert_eq!(
            endpoints.access_token_url(),
            "https://api.instagram.com/oauth/access_token"
        );
    }

    #[test]
    fn test_user_info_url() {
        assert_eq!(
            Endpoints::default().user_info_url("17841400", "tok"),
            "https://graph.instagram.com/17841400?fields=id,username&access_token=tok"
        );
    }

    #[test]
    fn test_media_url_encodes_field_list() {
        assert_eq!(
            Endpoints::default().media_url("17841400", 20, "tok"),
            "https://graph.instagram.com/17841400/media?fields=caption%2Cid%2Cmedia_type%2Cmedia_url%2Cthumbnail_url%2Cpermalink%2Cchildren%7Bmedia_type%2Cmedia_url%7D%2Ctimestamp&limit=20&access_token=tok"
        );
    }

    #[test]
    fn test_custom_endpoints_trim_trailing_slash() {
        let endpoints = Endpoints::new("http://127.0.0.1:9000/", "http://127.0.0.1:9001/");
        assert_eq!(
            endpoints.refresh_token_url("t"),
            "http://127.0.0.1:9001/refresh_access_token?grant_type=ig_refresh_token&access_token=t"
        );
    }

    #[test]
    fn test_redirect_uri_single_slash() {
        assert_eq!(
            redirect_uri("https://app.test/", "instagram/auth/callback"),
            "https://app.test/instagram/auth/callback"
        );
        assert_eq!(
            redirect_uri("https://app.test", "/instagram/auth/callback"),
            "https://app.test/instagram/auth/callback"
        );
        assert_eq!(
            redirect_uri("https://app.test//", "cb"),
            "https://app.test/cb"
        );
    }

    #[test]
    fn test_token_exchange_form_order() {
        let form = token_exchange_form("id", "secret", "https://app.test/cb", "abc");
        let keys: Vec<&str> = form.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["client_id", "client_secret", "grant_type", "redirect_uri", "code"]
        );
        assert_eq!(form[2].1, "authorization_code");
        assert_eq!(form[4].1, "abc");
    }

    #[test]
    fn test_page_size_capped() {
        assert_eq!(page_size(None), 100);
        assert_eq!(page_size(Some(5)), 5);
        assert_eq!(page_size(Some(100)), 100);
        assert_eq!(page_size(Some(150)), 100);
    }
}
