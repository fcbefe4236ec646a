use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::trace;
use url::Url;

/// Absolute URL with the fragment removed.
///
/// Two `NormalizedUrl`s are equal exactly when their serialized strings are
/// equal, which makes this the identity key for the frontier and the scope
/// filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Parses an absolute URL string and strips its fragment.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .with_context(|| format!("Failed to parse URL '{}'", input))?;
        Ok(Self::from_url(url))
    }

    /// Wraps an already parsed URL, dropping any fragment.
    pub fn from_url(mut url: Url) -> Self {
        url.set_fragment(None);
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn host_str(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Resolves `href` against the page it was found on.
///
/// Handles absolute, relative, `../`, protocol-relative and query-only
/// references with standard URL resolution. Returns `None` when the href
/// cannot be resolved; callers drop those silently.
pub fn normalize(base: &NormalizedUrl, href: &str) -> Option<NormalizedUrl> {
    let href = href.trim();
    match base.as_url().join(href) {
        Ok(resolved) => Some(NormalizedUrl::from_url(resolved)),
        Err(e) => {
            trace!("Dropping unresolvable href '{}' on {}: {}", href, base, e);
            None
        }
    }
}
