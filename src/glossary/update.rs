//! Glossary sources and update checks.
//! A remote glossary is a CSV served over HTTP(S); a companion `version.json`
//! (`{"latest": "1.0.4"}`) announces tool releases.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use super::{Glossary, GlossaryError};

#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub latest: String,
}

impl VersionInfo {
    pub fn parse(json: &str) -> Result<Self, GlossaryError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateStatus {
    /// Set when the announced release differs from the running one.
    pub new_version: Option<String>,
    /// True when a fetched glossary differs from the active one.
    pub data_changed: bool,
}

impl UpdateStatus {
    pub fn has_updates(&self) -> bool {
        self.new_version.is_some() || self.data_changed
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.new_version, self.data_changed) {
            (None, false) => write!(f, "up to date"),
            (Some(version), false) => write!(f, "version {version} is available"),
            (None, true) => write!(f, "glossary data has changed"),
            (Some(version), true) => {
                write!(f, "version {version} is available and glossary data has changed")
            }
        }
    }
}

/// Compare the running version and active glossary against freshly fetched ones.
/// `fetched` is `None` when the glossary comes from a local file.
pub fn check_updates(
    current_version: &str,
    version_json: &str,
    active: &Glossary,
    fetched: Option<&Glossary>,
) -> Result<UpdateStatus, GlossaryError> {
    let info = VersionInfo::parse(version_json)?;
    let new_version = (info.latest.trim() != current_version.trim()).then_some(info.latest);
    let data_changed = fetched.is_some_and(|g| g.fingerprint() != active.fingerprint());

    info!(
        current = current_version,
        latest = new_version.as_deref().unwrap_or(current_version),
        data_changed,
        "update check complete"
    );
    Ok(UpdateStatus {
        new_version,
        data_changed,
    })
}

/// Fetch the version document and, for a remote glossary, a fresh copy of
/// the data, and compare both against what is running.
pub async fn check_for_updates(
    remote: &RemoteSource,
    version_url: &str,
    source: &GlossarySource,
    active: &Glossary,
) -> Result<UpdateStatus, GlossaryError> {
    let version_json = remote.fetch_text(version_url).await?;
    let fetched = match source {
        GlossarySource::Remote(url) => Some(remote.fetch_glossary(url).await?),
        GlossarySource::Local(_) => None,
    };
    check_updates(env!("CARGO_PKG_VERSION"), &version_json, active, fetched.as_ref())
}

/// Where a glossary comes from, resolved from a user-supplied string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlossarySource {
    Local(PathBuf),
    Remote(String),
}

impl GlossarySource {
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            GlossarySource::Remote(trimmed.to_string())
        } else {
            GlossarySource::Local(PathBuf::from(trimmed))
        }
    }

    pub async fn load(&self, remote: &RemoteSource) -> Result<Glossary, GlossaryError> {
        match self {
            GlossarySource::Local(path) => Glossary::load_from_file(path),
            GlossarySource::Remote(url) => remote.fetch_glossary(url).await,
        }
    }
}

/// HTTP client for remote glossaries and version documents.
pub struct RemoteSource {
    http: reqwest::Client,
}

impl RemoteSource {
    pub fn new() -> Result<Self, GlossaryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { http })
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, GlossaryError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "remote fetch failed");
            return Err(GlossaryError::Fetch(format!("{url} returned HTTP {status}")));
        }
        Ok(response.text().await?)
    }

    pub async fn fetch_glossary(&self, url: &str) -> Result<Glossary, GlossaryError> {
        let content = self.fetch_text(url).await?;
        let glossary = Glossary::from_csv(&content);
        info!(url, entries = glossary.len(), "remote glossary loaded");
        Ok(glossary)
    }

    pub async fn fetch_version(&self, url: &str) -> Result<VersionInfo, GlossaryError> {
        VersionInfo::parse(&self.fetch_text(url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::GlossaryEntry;

    fn glossary(target: &str) -> Glossary {
        Glossary::from_entries(0, vec![GlossaryEntry::new("Rank", target, "", "")])
    }

    #[test]
    fn detects_version_and_data_changes() {
        let active = glossary("อันดับ");
        let same = glossary("อันดับ");
        let changed = glossary("ลำดับ");

        let status = check_updates("1.0.3", r#"{"latest": "1.0.3"}"#, &active, Some(&same)).unwrap();
        assert!(!status.has_updates());

        let status = check_updates("1.0.3", r#"{"latest": "1.0.4"}"#, &active, Some(&changed)).unwrap();
        assert_eq!(status.new_version.as_deref(), Some("1.0.4"));
        assert!(status.data_changed);

        let status = check_updates("1.0.3", r#"{"latest": "1.0.3"}"#, &active, None).unwrap();
        assert!(!status.data_changed);
    }

    #[test]
    fn status_messages() {
        assert_eq!(UpdateStatus::default().to_string(), "up to date");
        let status = UpdateStatus {
            new_version: Some("1.0.4".into()),
            data_changed: true,
        };
        assert_eq!(
            status.to_string(),
            "version 1.0.4 is available and glossary data has changed"
        );
    }

    #[test]
    fn malformed_version_document_is_parse_error() {
        let active = Glossary::empty();
        let err = check_updates("1.0.3", "{}", &active, None).unwrap_err();
        assert!(matches!(err, GlossaryError::Parse(_)));
    }

    #[test]
    fn resolves_sources() {
        assert_eq!(
            GlossarySource::parse(" https://example.com/data.csv "),
            GlossarySource::Remote("https://example.com/data.csv".into())
        );
        assert_eq!(
            GlossarySource::parse("data/data.csv"),
            GlossarySource::Local(PathBuf::from("data/data.csv"))
        );
    }
}
