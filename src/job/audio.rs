use std::path::Path;
use std::time::Duration;

use crate::foundation::error::{ReelError, ReelResult};

/// Sources matching this are downloaded; anything else is a local path.
pub const REMOTE_SOURCE_PATTERN: &str = r"^(http|https)://([\w.-]+/?)\S*$";

/// Where an audio source comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioSource<'a> {
    /// `http(s)://` URL.
    Remote(&'a str),
    /// Filesystem path.
    Local(&'a Path),
}

/// Fetches a job's audio track into its temp directory.
///
/// Owns one HTTP client for the process lifetime; share the fetcher, not a global.
#[derive(Clone, Debug)]
pub struct AudioFetcher {
    client: reqwest::blocking::Client,
    remote: regex::Regex,
}

impl AudioFetcher {
    /// Build a fetcher whose downloads give up after `timeout`.
    pub fn new(timeout: Duration) -> ReelResult<Self> {
        use anyhow::Context as _;
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("wordreel/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;
        let remote = regex::Regex::new(REMOTE_SOURCE_PATTERN)
            .map_err(|e| ReelError::validation(format!("remote source pattern: {e}")))?;
        Ok(Self { client, remote })
    }

    /// Classify a non-empty source string.
    pub fn classify<'a>(&self, source: &'a str) -> AudioSource<'a> {
        if self.remote.is_match(source) {
            AudioSource::Remote(source)
        } else {
            AudioSource::Local(Path::new(source))
        }
    }

    /// Copy `source` into `dest`; returns whether the job has audio.
    ///
    /// An absent or empty source means no audio. Any failure is logged and degrades to no audio.
    #[tracing::instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub fn fetch(&self, source: Option<&str>, dest: &Path) -> bool {
        let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) else {
            tracing::debug!("no audio source; rendering silent video");
            return false;
        };

        match self.try_fetch(source, dest) {
            Ok(bytes) => {
                tracing::info!(bytes, "audio fetched");
                true
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "audio fetch failed; continuing without audio");
                if dest.exists()
                    && let Err(rm) = std::fs::remove_file(dest)
                {
                    tracing::warn!(error = %rm, "failed to remove partial audio file");
                }
                false
            }
        }
    }

    fn try_fetch(&self, source: &str, dest: &Path) -> ReelResult<u64> {
        let mut out = std::fs::File::create(dest).map_err(|e| {
            ReelError::filesystem(format!("create audio temp '{}': {e}", dest.display()))
        })?;

        match self.classify(source) {
            AudioSource::Remote(url) => {
                let mut resp = self
                    .client
                    .get(url)
                    .send()
                    .map_err(|e| http_error(url, e))?;
                if !resp.status().is_success() {
                    return Err(ReelError::audio_fetch(format!(
                        "GET {url} returned status {}",
                        resp.status()
                    )));
                }
                resp.copy_to(&mut out).map_err(|e| http_error(url, e))
            }
            AudioSource::Local(path) => {
                let mut input = std::fs::File::open(path).map_err(|e| {
                    ReelError::audio_fetch(format!("open '{}': {e}", path.display()))
                })?;
                std::io::copy(&mut input, &mut out).map_err(|e| {
                    ReelError::audio_fetch(format!("copy '{}': {e}", path.display()))
                })
            }
        }
    }
}

fn http_error(url: &str, e: reqwest::Error) -> ReelError {
    if e.is_timeout() {
        ReelError::timeout(format!("audio download from {url} timed out"))
    } else {
        ReelError::audio_fetch(format!("download {url}: {e}"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/audio.rs"]
mod tests;
