//! Content-length probing.
//!
//! Before transferring any bytes, the engine needs the total resource size
//! to compute progress fractions and to verify completion. [`content_length`]
//! issues an HTTP HEAD request and reads the `Content-Length` response
//! header; a missing or unparseable header is a hard probe failure, because
//! the engine cannot verify a download it cannot size.
//!
//! [`supports_byte_ranges`] checks the `Accept-Ranges` header for servers
//! that advertise resumption support, and [`parse_content_range_total`]
//! extracts the total from a `Content-Range` header for servers that only
//! reveal their size on ranged responses.

use crate::error::{Error, Result};

use reqwest::{
    header::{ACCEPT_RANGES, CONTENT_LENGTH},
    Url,
};
use reqwest_middleware::ClientWithMiddleware;

/// Retrieves the total size of the resource at `url` via an HTTP HEAD
/// request.
///
/// Fails with [`Error::ContentLength`] when the header is missing or not a
/// valid `u64`, and with the underlying transport error when the request
/// itself fails. Either way the caller treats it as a transfer failure.
pub async fn content_length(client: &ClientWithMiddleware, url: &Url) -> Result<u64> {
    let res = client.head(url.clone()).send().await?;
    res.error_for_status_ref()
        .map_err(|e| Error::Reqwest { source: e })?;
    res.headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .ok_or_else(|| Error::ContentLength(url.to_string()))
}

/// Checks whether the server advertises byte-range support for `url`.
pub async fn supports_byte_ranges(client: &ClientWithMiddleware, url: &Url) -> Result<bool> {
    let res = client.head(url.clone()).send().await?;
    match res.headers().get(ACCEPT_RANGES) {
        None => Ok(false),
        Some(x) if x == "none" => Ok(false),
        Some(_) => Ok(true),
    }
}

/// Parses a `Content-Range` header to extract the total size.
///
/// Content-Range header format: "bytes start-end/total".
///
/// # Example
///
/// ```rust
/// use stamina::http::parse_content_range_total;
///
/// let total = parse_content_range_total("bytes 0-1023/2048");
/// assert_eq!(total, Some(2048));
/// ```
pub fn parse_content_range_total(content_range: &str) -> Option<u64> {
    content_range
        .split('/')
        .next_back()
        .and_then(|size| size.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("bytes 0-1023/2048"), Some(2048));
        assert_eq!(parse_content_range_total("bytes 200-1023/5000"), Some(5000));
        assert_eq!(parse_content_range_total("bytes 0-0/1"), Some(1));
        assert_eq!(parse_content_range_total("invalid"), None);
        assert_eq!(parse_content_range_total("bytes 0-1023"), None);
        assert_eq!(parse_content_range_total(""), None);
    }

    #[test]
    fn test_parse_content_range_total_edge_cases() {
        assert_eq!(parse_content_range_total("bytes 0-1023/ 2048 "), Some(2048));
        assert_eq!(parse_content_range_total("bytes 0-0/0"), Some(0));
        assert_eq!(
            parse_content_range_total("bytes 0-1023/999999999999"),
            Some(999999999999)
        );
    }
}
