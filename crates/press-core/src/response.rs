//! Framework-agnostic responses for the request boundary.
//!
//! The HTTP server itself lives elsewhere; these builders fix status codes,
//! headers and diagnostic bodies so every host serves artifacts the same way.

use std::io::Write;

use chrono::{DateTime, TimeDelta, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::config::PressConfig;
use crate::error::{format_retention, PressError, PressResult};
use crate::handle::ArtifactHandle;
use crate::types::{AssetKind, CachingStrategy};

/// One year, in seconds.
pub const FAR_FUTURE_MAX_AGE: u64 = 31_536_000;

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl AssetResponse {
    /// 200 with the artifact bytes.
    ///
    /// Only fingerprinted artifacts (`Change`) get long-lived caching headers:
    /// under `Always` and `Never` the URL does not change when sources do.
    pub async fn artifact(
        kind: AssetKind,
        strategy: CachingStrategy,
        handle: &ArtifactHandle,
        config: &PressConfig,
    ) -> PressResult<Self> {
        let body = handle.read().await?;
        let mut response = Self {
            status: 200,
            headers: vec![("Content-Type".to_string(), kind.content_type().to_string())],
            body,
        };

        if strategy == CachingStrategy::Change {
            let expires = Utc::now() + TimeDelta::days(365);
            response.set_header("Cache-Control", format!("max-age={FAR_FUTURE_MAX_AGE}"));
            response.set_header("Expires", http_date(expires));
            if let Some(p3p) = config.p3p_header.as_deref().filter(|v| !v.is_empty()) {
                response.set_header("P3P", p3p);
            }
        }
        Ok(response)
    }

    /// Comment-style diagnostic body, so a broken bundle is still valid
    /// JavaScript or CSS for the browser.
    pub fn from_error(kind: AssetKind, error: &PressError, config: &PressConfig) -> Self {
        let retention = match error {
            PressError::UnresolvedKey { retention, .. } => *retention,
            _ => config.key_retention(),
        };
        let body = format!(
            "/*\nThe compressed {label} file could not be generated: {error}\n\
             This happens when the page was rendered longer ago than the key \
             retention window (currently {retention}), or when building the \
             file failed.\n*/\n",
            label = kind.label(),
            retention = format_retention(&retention),
        );

        Self {
            status: error.status_code(),
            headers: vec![("Content-Type".to_string(), kind.content_type().to_string())],
            body: body.into_bytes(),
        }
    }

    /// Confirmation for a cache clear.
    pub fn cleared(kind: AssetKind, count: usize) -> Self {
        Self {
            status: 200,
            headers: vec![(
                "Content-Type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            body: format!(
                "Cleared {count} {} files from cache",
                kind.extension().to_ascii_uppercase()
            )
            .into_bytes(),
        }
    }

    pub fn with_last_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.set_header("Last-Modified", http_date(modified));
        self
    }

    /// Gzip the body for transport. Artifact identity is unaffected.
    pub fn gzip(mut self) -> std::io::Result<Self> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.body)?;
        self.body = encoder.finish()?;
        self.set_header("Content-Encoding", "gzip");
        self.set_header("Content-Length", self.body.len().to_string());
        Ok(self)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}
