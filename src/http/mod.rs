//! HTTP module containing client setup and the content-length prober.
//!
//! The client half builds the `reqwest` middleware stack every engine
//! request goes through; the probe half issues the metadata-only requests
//! used to size a download before any bytes are transferred.

pub mod client;
pub mod probe;

pub use client::{create_http_client, HttpClientConfig};
pub use probe::{content_length, parse_content_range_total, supports_byte_ranges};
