//! Artifact identity.
//!
//! An [`Artifact`] names a single downloadable file: the remote URL the
//! bytes come from and the file name used to save it on disk. When built
//! from a URL, the file name is extracted from the last path segment and
//! percent-decoded.
//!
//! # Examples
//!
//! ```rust
//! use stamina::artifact::Artifact;
//!
//! // File name extracted automatically.
//! let artifact = Artifact::try_from("https://example.com/app-1.2.3.apk")?;
//! assert_eq!(artifact.filename, "app-1.2.3.apk");
//!
//! // Or with an explicit name.
//! let url = reqwest::Url::parse("https://example.com/latest")?;
//! let artifact = Artifact::new(&url, "app-nightly.apk");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::Error;

use reqwest::Url;
use std::convert::TryFrom;

/// A single downloadable file, identified by its remote URL.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// URL of the remote byte stream.
    pub url: Url,
    /// File name used to save the completed artifact on disk.
    pub filename: String,
}

impl Artifact {
    /// Creates a new [`Artifact`] with an explicit file name.
    ///
    /// When using the [`Artifact::try_from`] method, the file name is
    /// automatically extracted from the URL.
    ///
    /// ## Example
    ///
    /// The following calls are equivalent, minus some extra URL validations
    /// performed by `try_from`:
    ///
    /// ```no_run
    /// # use color_eyre::{eyre::Report, Result};
    /// use stamina::artifact::Artifact;
    /// use reqwest::Url;
    ///
    /// # fn main() -> Result<(), Report> {
    /// Artifact::try_from("https://example.com/file-0.1.2.zip")?;
    /// Artifact::new(&Url::parse("https://example.com/file-0.1.2.zip")?, "file-0.1.2.zip");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(url: &Url, filename: &str) -> Self {
        Self {
            url: url.clone(),
            filename: String::from(filename),
        }
    }
}

impl TryFrom<&Url> for Artifact {
    type Error = crate::error::Error;

    fn try_from(value: &Url) -> Result<Self, Self::Error> {
        value
            .path_segments()
            .ok_or_else(|| {
                Error::InvalidUrl(format!(
                    "The url \"{}\" does not contain a valid path",
                    value
                ))
            })?
            .next_back()
            .filter(|segment| !segment.is_empty())
            .map(|filename| Artifact {
                url: value.clone(),
                filename: form_urlencoded::parse(filename.as_bytes())
                    .map(|(key, val)| [key, val].concat())
                    .collect(),
            })
            .ok_or_else(|| {
                Error::InvalidUrl(format!("The url \"{}\" does not contain a filename", value))
            })
    }
}

impl TryFrom<&str> for Artifact {
    type Error = crate::error::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Url::parse(value)
            .map_err(|e| {
                Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", value, e))
            })
            .and_then(|u| Artifact::try_from(&u))
    }
}
