//! # Provider Tarball API (`fetch::api`)
//!
//! File: cli/src/fetch/api.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `TarballApiFetcher` downloads repository tarballs straight from the hosting
//! provider's REST API. No local tools are needed and nothing touches the disk
//! until extraction, which makes it the preferred tier.
//!
//! | Host   | Tarball                                                      | Latest commit                                  |
//! |--------|--------------------------------------------------------------|------------------------------------------------|
//! | GitHub | `<api>/repos/<o>/<n>/tarball/<ref>`                          | `<api>/repos/<o>/<n>/commits/<ref>` (sha media type) |
//! | GitLab | `<api>/projects/<o>%2F<n>/repository/archive.tar.gz?sha=<ref>` | `<api>/projects/<o>%2F<n>/repository/commits/<ref>` |
//!
//! `<api>` comes from `HostConfig::api_root`, so self-hosted instances work by
//! overriding the base URL. Tokens go in `Authorization: Bearer` (GitHub) or
//! `PRIVATE-TOKEN` (GitLab).
//!
use super::host::HostConfig;
use super::reference::{Host, RepositoryReference};
use super::strategy::Tier;
use super::tarball::{Tarball, TarballStream};
use super::{is_commit_hash, Fetcher};
use crate::core::error::{FetchError, FetchResult};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io;
use tracing::{debug, info};

const GITHUB_SHA_MEDIA_TYPE: &str = "application/vnd.github.sha";
/// Longest slice of an error response body quoted in messages.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Deserialize)]
struct GitlabCommit {
    id: String,
}

#[derive(Deserialize)]
struct GitlabProject {
    default_branch: Option<String>,
}

pub struct TarballApiFetcher {
    hosts: HostConfig,
    client: Client,
}

impl TarballApiFetcher {
    pub fn new(hosts: HostConfig) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("tplfetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { hosts, client })
    }

    fn tarball_url(&self, reference: &RepositoryReference) -> String {
        let api = self.hosts.api_root(reference.host());
        match reference.host() {
            Host::Github => format!(
                "{}/repos/{}/{}/tarball/{}",
                api,
                reference.owner(),
                reference.name(),
                encode_component(reference.ref_or_head())
            ),
            Host::Gitlab => {
                let mut url = format!(
                    "{}/projects/{}/repository/archive.tar.gz",
                    api,
                    gitlab_project_id(reference)
                );
                // Without `sha` GitLab archives the default branch.
                if let Some(branch) = reference.branch() {
                    url.push_str("?sha=");
                    url.push_str(&encode_component(branch));
                }
                url
            }
        }
    }

    fn commit_url(&self, reference: &RepositoryReference, git_ref: &str) -> String {
        let api = self.hosts.api_root(reference.host());
        match reference.host() {
            Host::Github => format!(
                "{}/repos/{}/{}/commits/{}",
                api,
                reference.owner(),
                reference.name(),
                encode_component(git_ref)
            ),
            Host::Gitlab => format!(
                "{}/projects/{}/repository/commits/{}",
                api,
                gitlab_project_id(reference),
                encode_component(git_ref)
            ),
        }
    }

    fn project_url(&self, reference: &RepositoryReference) -> String {
        format!(
            "{}/projects/{}",
            self.hosts.api_root(reference.host()),
            gitlab_project_id(reference)
        )
    }

    fn get(&self, host: Host, url: &str, token: Option<&str>) -> RequestBuilder {
        let request = self.client.get(url);
        match (host, token) {
            (Host::Github, Some(token)) => {
                request.header(AUTHORIZATION, format!("Bearer {}", token))
            }
            (Host::Gitlab, Some(token)) => request.header("PRIVATE-TOKEN", token),
            (_, None) => request,
        }
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> FetchResult<Response> {
        debug!("GET {}", url);
        let response = request.send().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        check_status(response, url).await
    }

    async fn gitlab_default_branch(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<String> {
        let url = self.project_url(reference);
        let response = self.send(self.get(Host::Gitlab, &url, token), &url).await?;
        let project: GitlabProject = read_json(response, &url).await?;
        // Empty projects have no default branch.
        Ok(project.default_branch.unwrap_or_else(|| "HEAD".to_string()))
    }
}

#[async_trait]
impl Fetcher for TarballApiFetcher {
    fn tier(&self) -> Tier {
        Tier::Tarball
    }

    async fn fetch_tarball(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<Tarball> {
        let url = self.tarball_url(reference);
        info!("Downloading {}", url);
        let response = self
            .send(self.get(reference.host(), &url, token), &url)
            .await?;

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename);
        let name = tarball_name(reference, disposition.as_deref());
        debug!("Streaming tarball {}", name);

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        Ok(Tarball {
            name,
            body: TarballStream::new(body),
        })
    }

    async fn fetch_latest_commit(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<String> {
        let git_ref = match (reference.host(), reference.branch()) {
            (_, Some(branch)) => branch.to_string(),
            (Host::Github, None) => "HEAD".to_string(),
            (Host::Gitlab, None) => self.gitlab_default_branch(reference, token).await?,
        };
        let url = self.commit_url(reference, &git_ref);
        let not_found = || FetchError::RemoteRefNotFound {
            repo: reference.slug(),
            reference: git_ref.clone(),
        };

        let hash = match reference.host() {
            Host::Github => {
                let request = self
                    .get(Host::Github, &url, token)
                    .header(ACCEPT, GITHUB_SHA_MEDIA_TYPE);
                let response = self.send(request, &url).await.map_err(|e| match e {
                    FetchError::Http { ref message, .. } if is_missing_ref(message) => not_found(),
                    other => other,
                })?;
                response.text().await.map_err(|e| FetchError::Http {
                    url: url.clone(),
                    message: e.to_string(),
                })?
            }
            Host::Gitlab => {
                let response = self
                    .send(self.get(Host::Gitlab, &url, token), &url)
                    .await
                    .map_err(|e| match e {
                        FetchError::Http { ref message, .. } if is_missing_ref(message) => {
                            not_found()
                        }
                        other => other,
                    })?;
                let commit: GitlabCommit = read_json(response, &url).await?;
                commit.id
            }
        };

        let hash = hash.trim();
        if is_commit_hash(hash) {
            Ok(hash.to_ascii_lowercase())
        } else {
            Err(not_found())
        }
    }
}

/// Turns non-2xx responses into `FetchError::Http`, quoting the start of the body.
async fn check_status(response: Response, url: &str) -> FetchResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
    Err(FetchError::Http {
        url: url.to_string(),
        message: if snippet.is_empty() {
            format!("status {}", status)
        } else {
            format!("status {}: {}", status, snippet)
        },
    })
}

async fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> FetchResult<T> {
    let body = response.text().await.map_err(|e| FetchError::Http {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&body).map_err(|e| FetchError::Http {
        url: url.to_string(),
        message: format!("unexpected response body: {}", e),
    })
}

fn is_missing_ref(message: &str) -> bool {
    message.starts_with(&format!("status {}", StatusCode::NOT_FOUND))
        || message.starts_with(&format!("status {}", StatusCode::UNPROCESSABLE_ENTITY))
}

/// `owner%2Fname`, the URL-encoded path GitLab accepts as a project id.
fn gitlab_project_id(reference: &RepositoryReference) -> String {
    format!("{}%2F{}", reference.owner(), reference.name())
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Extracts the `filename` parameter of a `Content-Disposition` header.
fn disposition_filename(header: &str) -> Option<String> {
    header.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Names a downloaded tarball `<owner>-<name>-<short>.tar.gz`.
///
/// The name is always rebuilt from the reference, never taken verbatim from
/// the server, so it is a single plain file name. The short hash comes from
/// the last `-` segment of the `Content-Disposition` filename (GitHub:
/// `<owner>-<name>-<sha>.tar.gz`, GitLab: `<name>-<ref>-<sha>.tar.gz`).
/// Without a usable hash the ref stands in for it.
fn tarball_name(reference: &RepositoryReference, disposition: Option<&str>) -> String {
    let hash = disposition.and_then(|filename| {
        filename
            .trim_end_matches(".tar.gz")
            .rsplit('-')
            .next()
            .filter(|segment| is_commit_hash(segment))
    });
    let component = match hash {
        Some(hash) => hash[..7].to_ascii_lowercase(),
        None => reference
            .ref_or_head()
            .chars()
            .map(|c| match c {
                'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
                _ => '-',
            })
            .collect(),
    };
    format!("{}.tar.gz", reference.archive_stem(&component))
}
