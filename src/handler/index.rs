//! Index page handler
//!
//! Loads `index.html` exactly once, together with the CSP init parameters,
//! and answers every request with the same cached response.

use crate::config::IndexConfig;
use crate::handler::policy::SecurityPolicy;
use crate::handler::resource::{resolve_context, LoadError, ResourceResolver};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::io::{self, BufReader, Read};

/// Resource path of the page, relative to the resolver root
pub const INDEX_PATH: &str = "/index.html";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// The page body and status fixed at initialization
#[derive(Debug, Clone)]
pub struct CachedPage {
    content: Bytes,
    status: StatusCode,
}

impl CachedPage {
    /// Load the page through the given resolution capability.
    ///
    /// Never fails: any [`LoadError`] becomes a plain-text 500 page.
    pub fn load<R: ResourceResolver>(context: io::Result<Option<R>>) -> Self {
        match read_index(context) {
            Ok(content) => Self {
                content,
                status: StatusCode::OK,
            },
            Err(e) => {
                logger::log_warning(&format!("Serving 500 for {INDEX_PATH}: {e}"));
                Self {
                    content: Bytes::from(e.to_string()),
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
        }
    }

    pub const fn content(&self) -> &Bytes {
        &self.content
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

fn read_index<R: ResourceResolver>(context: io::Result<Option<R>>) -> Result<Bytes, LoadError> {
    let resolver = context
        .map_err(LoadError::Context)?
        .ok_or(LoadError::ContextUnavailable)?;
    let reader = resolver
        .open(INDEX_PATH)
        .map_err(LoadError::Read)?
        .ok_or(LoadError::NotDeployed)?;

    let mut content = Vec::new();
    BufReader::new(reader)
        .read_to_end(&mut content)
        .map_err(LoadError::Read)?;
    Ok(Bytes::from(content))
}

/// Serves the cached index page with its CSP headers
#[derive(Debug)]
pub struct IndexHandler {
    page: CachedPage,
    policy: SecurityPolicy,
    policy_headers: Vec<(&'static str, HeaderValue)>,
}

impl IndexHandler {
    /// Build the handler from a resolution capability and init parameters.
    pub fn init<'a, R, I>(context: io::Result<Option<R>>, params: I) -> Self
    where
        R: ResourceResolver,
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let page = CachedPage::load(context);
        let policy = SecurityPolicy::from_params(params);

        let policy_headers = policy
            .headers()
            .filter_map(|(name, value)| match HeaderValue::from_str(value) {
                Ok(v) => Some((name, v)),
                Err(e) => {
                    logger::log_warning(&format!("Dropping {name}: invalid header value: {e}"));
                    None
                }
            })
            .collect();

        logger::log_info(&format!(
            "[Index] Loaded {INDEX_PATH}: status {}, {} bytes",
            page.status.as_u16(),
            page.content.len()
        ));
        for (name, value) in policy.headers() {
            logger::log_info(&format!("[Index] {name}: {value}"));
        }

        Self {
            page,
            policy,
            policy_headers,
        }
    }

    /// Build the handler from the `[index]` configuration section.
    pub fn from_config(config: &IndexConfig) -> Self {
        Self::init(
            resolve_context(config),
            config
                .params
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }

    pub const fn page(&self) -> &CachedPage {
        &self.page
    }

    pub const fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Render the cached response; HEAD gets the same headers and no body.
    pub fn respond(&self, is_head: bool) -> Response<Full<Bytes>> {
        let mut builder = Response::builder()
            .status(self.page.status)
            .header(CONTENT_TYPE, HTML_CONTENT_TYPE);
        for (name, value) in &self.policy_headers {
            builder = builder.header(*name, value.clone());
        }

        let body = if is_head {
            Bytes::new()
        } else {
            self.page.content.clone()
        };

        builder
            .header(CONTENT_LENGTH, self.page.content.len())
            .body(Full::new(body))
            .unwrap_or_else(|e| {
                logger::log_error(&format!("Failed to build index response: {e}"));
                Response::new(Full::new(Bytes::new()))
            })
    }
}
