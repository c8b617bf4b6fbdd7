use std::str::FromStr;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::HttpError;

/// Query parameter carrying an extra request header as `Name:value`.
pub const CUSTOM_HEADER_PARAM: &str = "custom_rpc_header";

/// Split `custom_rpc_header=Name:value` parameters off an RPC url.
///
/// Hosted RPC providers often want an API key header; operators pass it on
/// the url so one setting is enough. Returns the headers and the url with
/// those parameters removed. Other parameters keep their order. Values
/// without a `:` are dropped.
pub fn split_custom_headers(url: &Url) -> Result<(HeaderMap, Url), HttpError> {
    let mut headers = HeaderMap::new();
    let mut kept = vec![];

    for (key, value) in url.query_pairs() {
        if key != CUSTOM_HEADER_PARAM {
            kept.push((key.into_owned(), value.into_owned()));
            continue;
        }
        let Some((name, value)) = value.split_once(':') else {
            continue;
        };
        let name = HeaderName::from_str(name.trim())
            .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
        let mut value = HeaderValue::from_str(value.trim())
            .map_err(|e| HttpError::InvalidHeader(format!("{name}: {e}")))?;
        value.set_sensitive(true);
        headers.insert(name, value);
    }

    let mut stripped = url.clone();
    stripped.set_query(None);
    if !kept.is_empty() {
        stripped.query_pairs_mut().extend_pairs(kept);
    }
    Ok((headers, stripped))
}
