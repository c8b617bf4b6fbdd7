use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::HttpError;

/// Longest slice of an error body kept in [`HttpError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// How a client authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// No credentials
    None,
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// A vendor specific header, e.g. `x-cg-pro-api-key`
    Header {
        /// Header name
        name: &'static str,
        /// Secret value
        value: String,
    },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::None => write!(f, "None"),
            Auth::Bearer(_) => write!(f, "Bearer(<redacted>)"),
            Auth::Header { name, .. } => write!(f, "Header({name}: <redacted>)"),
        }
    }
}

/// A JSON API client rooted at a base url.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// Client for `base_url`, sending `auth` on every request and giving up
    /// after `timeout`.
    pub fn new(base_url: &str, auth: Auth, timeout: Duration) -> Result<Self, HttpError> {
        Self::with_headers(Url::parse(base_url)?, auth, HeaderMap::new(), timeout)
    }

    /// Like [`HttpClient::new`] with extra default headers.
    pub fn with_headers(
        mut base_url: Url,
        auth: Auth,
        mut headers: HeaderMap,
        timeout: Duration,
    ) -> Result<Self, HttpError> {
        match auth {
            Auth::None => {}
            Auth::Bearer(token) => {
                headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {token}"))?);
            }
            Auth::Header { name, value } => {
                let name = HeaderName::from_str(name)
                    .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
                headers.insert(name, sensitive(&value)?);
            }
        }

        // paths are joined onto the base, which only works below a directory
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// The base url every path is joined onto
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute url for `path`, relative to the base url.
    pub fn url(&self, path: &str) -> Result<Url, HttpError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// GET `path` and decode the JSON body.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let url = self.url(path)?;
        self.send(self.http.get(url.clone()), url).await
    }

    /// GET `path` with query parameters and decode the JSON body.
    #[instrument(skip(self, query), level = "debug")]
    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        self.send(self.http.get(url.clone()).query(query), url).await
    }

    /// POST `body` as JSON to `path` and decode the JSON answer.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        self.send(self.http.post(url.clone()).json(body), url).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: Url,
    ) -> Result<T, HttpError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%url, %status, "HTTP response");
        decode(response, url).await
    }
}

fn sensitive(value: &str) -> Result<HeaderValue, HttpError> {
    let mut value =
        HeaderValue::from_str(value).map_err(|e| HttpError::InvalidHeader(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

async fn decode<T: DeserializeOwned>(response: Response, url: Url) -> Result<T, HttpError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        let body = match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((end, _)) => body[..end].to_owned(),
            None => body.into_owned(),
        };
        return Err(HttpError::Status {
            url: url.to_string(),
            status,
            body,
        });
    }
    serde_json::from_slice(&bytes).map_err(|source| HttpError::Decode {
        url: url.to_string(),
        source,
    })
}
