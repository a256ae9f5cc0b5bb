use crate::error::AdapterError;
use crate::lifespan::LifespanMode;

pub const BASE_PATH_ENV: &str = "API_GATEWAY_BASE_PATH";
pub const TEXT_MIME_TYPES_ENV: &str = "API_TEXT_MIME_TYPES";
pub const EXCLUDE_HEADERS_ENV: &str = "API_EXCLUDE_HEADERS";
pub const LIFESPAN_ENV: &str = "API_LIFESPAN";

pub const DEFAULT_BASE_PATH: &str = "/";

const DEFAULT_TEXT_MIME_TYPES: &[&str] = &[
    "application/json",
    "application/javascript",
    "application/xml",
    "application/x-www-form-urlencoded",
    "image/svg+xml",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub lifespan: LifespanMode,
    /// Prefix stripped from API Gateway paths before they reach the
    /// application, e.g. a custom-domain mapping such as `/api`.
    pub api_gateway_base_path: String,
    /// Extra content types returned as plain text instead of base64, matched
    /// without regard to case.
    pub text_mime_types: Vec<String>,
    /// Response headers never forwarded to the platform, matched without
    /// regard to case.
    pub exclude_headers: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            lifespan: LifespanMode::default(),
            api_gateway_base_path: DEFAULT_BASE_PATH.to_string(),
            text_mime_types: Vec::new(),
            exclude_headers: Vec::new(),
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Unset or blank
    /// variables fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AdapterError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let lifespan = match read(LIFESPAN_ENV) {
            Some(value) => value.parse()?,
            None => LifespanMode::default(),
        };

        let config = Self {
            lifespan,
            api_gateway_base_path: read(BASE_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
            text_mime_types: read(TEXT_MIME_TYPES_ENV)
                .map(|value| split_list(&value))
                .unwrap_or_default(),
            exclude_headers: read(EXCLUDE_HEADERS_ENV)
                .map(|value| split_list(&value))
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_lifespan(mut self, lifespan: LifespanMode) -> Self {
        self.lifespan = lifespan;
        self
    }

    pub fn validate(&self) -> Result<(), AdapterError> {
        if !self.api_gateway_base_path.starts_with('/') {
            return Err(AdapterError::InvalidConfig(format!(
                "api gateway base path must start with '/' (got '{}')",
                self.api_gateway_base_path
            )));
        }
        Ok(())
    }

    pub(crate) fn is_excluded_header(&self, name: &str) -> bool {
        self.exclude_headers
            .iter()
            .any(|excluded| excluded.trim().eq_ignore_ascii_case(name))
    }

    /// Whether a response with this `content-type` is returned as a plain
    /// string. A missing content type counts as text.
    pub fn is_text_content_type(&self, content_type: Option<&str>) -> bool {
        let Some(content_type) = content_type else {
            return true;
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        mime.starts_with("text/")
            || mime.ends_with("+json")
            || mime.ends_with("+xml")
            || DEFAULT_TEXT_MIME_TYPES.contains(&mime.as_str())
            || self
                .text_mime_types
                .iter()
                .any(|custom| custom.trim().eq_ignore_ascii_case(&mime))
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
