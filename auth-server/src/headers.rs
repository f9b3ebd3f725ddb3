use axum::http::HeaderValue;
use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use log::warn;
use std::collections::BTreeMap;

const APPLICATION_JSON: &str = "application/json";

/// Headers attached to every gateway response, whether it is written to an
/// HTTP response or embedded in a proxy-integration envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    content_type: &'static str,
    allow_origin: Option<String>,
    no_store: bool,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self {
            content_type: APPLICATION_JSON,
            allow_origin: None,
            no_store: false,
        }
    }
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Access-Control-Allow-Origin header
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = Some(origin.into());
        self
    }

    /// Forbid intermediaries from storing the response
    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    /// Headers as plain name/value pairs, in a stable order
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("Content-Type".to_string(), self.content_type.to_string());
        if let Some(origin) = &self.allow_origin {
            map.insert("Access-Control-Allow-Origin".to_string(), origin.clone());
        }
        if self.no_store {
            map.insert("Cache-Control".to_string(), "no-store".to_string());
        }
        map
    }

    /// Apply headers to a response
    pub fn apply<B>(&self, response: &mut axum::response::Response<B>) {
        let headers = response.headers_mut();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));

        if let Some(origin) = &self.allow_origin {
            match HeaderValue::from_str(origin) {
                Ok(value) => {
                    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value);
                }
                Err(e) => warn!("failed to set allow-origin header: {e}"),
            }
        }

        if self.no_store {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        }
    }
}

/// Common header presets
pub mod presets {
    use super::*;

    /// JSON body readable from any origin
    pub fn public_json() -> ResponseHeaders {
        ResponseHeaders::new().allow_origin("*")
    }
}
