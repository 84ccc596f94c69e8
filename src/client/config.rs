//! Remote client configuration.

/// Default API root of the document store.
pub const DEFAULT_BASE_URL: &str = "https://dash.readme.io/api/v1";

/// Configuration for [`super::ReadmeClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, without trailing slash.
    pub base_url: String,

    /// API key, sent as the basic-auth username.
    pub api_key: String,

    /// Target documentation version (`x-readme-version` header).
    pub version: String,
}

impl ClientConfig {
    /// Create a config against the default API root.
    pub fn new(api_key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            version: version.into(),
        }
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Join a path onto the API root.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("version", &self.version)
            .finish()
    }
}
