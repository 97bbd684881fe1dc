use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ChatConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8787/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const CHAT_PATH: &str = "/api/chat";

/// Credentials for HTTP basic auth on the chat endpoint.
#[derive(Clone, PartialEq, Eq)]
pub enum BasicAuth {
    /// Already base64-encoded `user:password`.
    Encoded(String),
    Credentials { user: String, password: String },
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoded(_) => f.write_str("BasicAuth::Encoded(..)"),
            Self::Credentials { user, .. } => write!(f, "BasicAuth::Credentials({user}, ..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub endpoint: Url,
    pub timeout: Duration,
    pub basic_auth: Option<BasicAuth>,
}

impl ChatConfig {
    /// Builds a config for `base_url` with the default timeout and no auth.
    ///
    /// # Errors
    ///
    /// Returns `ChatConfigError::InvalidBaseUrl` if the joined endpoint is not
    /// an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ChatConfigError> {
        let joined = join_url(base_url, CHAT_PATH);
        let endpoint =
            Url::parse(&joined).map_err(|e| ChatConfigError::InvalidBaseUrl(format!("{joined}: {e}")))?;
        Ok(Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
            basic_auth: None,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }

    /// Reads `LEARN_CHAT_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ChatConfigError` for an unusable base URL or timeout.
    pub fn from_env() -> Result<Self, ChatConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ChatConfigError` for an unusable base URL or timeout.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ChatConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = var("LEARN_CHAT_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = var("LEARN_CHAT_TIMEOUT_MS") {
            let millis: u64 = raw
                .parse()
                .map_err(|_| ChatConfigError::InvalidTimeout(raw.clone()))?;
            if millis == 0 {
                return Err(ChatConfigError::InvalidTimeout(raw));
            }
            config.timeout = Duration::from_millis(millis);
        }

        config.basic_auth = match var("LEARN_CHAT_BASIC_AUTH") {
            Some(encoded) => Some(BasicAuth::Encoded(encoded)),
            None => match (var("LEARN_CHAT_BASIC_USER"), var("LEARN_CHAT_BASIC_PASSWORD")) {
                (Some(user), Some(password)) => Some(BasicAuth::Credentials { user, password }),
                _ => None,
            },
        };

        Ok(config)
    }
}

/// Joins `path` onto `base`, collapsing a duplicated `/api` segment.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    if base.is_empty() {
        return path;
    }
    if base.ends_with("/api") && path.starts_with("/api/") {
        return format!("{base}{}", &path[4..]);
    }
    format!("{base}{path}")
}
