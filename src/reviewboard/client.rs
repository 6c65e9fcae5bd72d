use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::credentials::Credentials;
use crate::reviewboard::server::ReviewServer;
use crate::reviewboard::types::{
    DiffPayload, DiffRevision, FileDiff, FileDiffPayload, Page, Repository, RepositoryPayload,
    ReviewEvent, ReviewPayload, ReviewRequest, ReviewRequestPayload, ReviewRequestQuery,
};

const JSON_MIMETYPE: &str = "application/json";
const PATCH_MIMETYPE: &str = "text/x-patch";

/// Review Board Web API client
pub struct RbClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

/// Create a client for the server at `url`, authenticating with basic auth
/// when credentials are given
pub fn create_client(url: &str, credentials: Option<Credentials>) -> Result<RbClient> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("rb-keeper/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create Review Board client")?;

    Ok(RbClient {
        http,
        base_url: url.trim_end_matches('/').to_string(),
        credentials,
    })
}

impl RbClient {
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => request.basic_auth(&creds.username, Some(&creds.password)),
            None => request,
        }
    }

    /// GET a list resource. A cursor replaces the URL and query entirely,
    /// since next links already carry their own query string.
    async fn get_list(
        &self,
        path: &str,
        query: &[(&str, String)],
        cursor: Option<String>,
    ) -> Result<Value> {
        let request = match cursor {
            Some(next) => {
                debug!(url = %next, "GET (next page)");
                self.http.get(next)
            }
            None => {
                let url = self.api_url(path);
                debug!(%url, ?query, "GET");
                self.http.get(url).query(query)
            }
        };
        let response = self
            .authorize(request.header(ACCEPT, JSON_MIMETYPE))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;
        read_json(response).await
    }
}

/// Decode a JSON response, turning `stat: fail` bodies and HTTP errors into
/// errors carrying the server's message.
async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read response from {}", url))?;

    let body: Value = match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return Err(anyhow!("Review Board returned HTTP {} for {}", status, url))
        }
        Err(e) => return Err(e).with_context(|| format!("Invalid JSON from {}", url)),
    };

    if !status.is_success() || body["stat"] == "fail" {
        let msg = body["err"]["msg"].as_str().unwrap_or("unknown error");
        let code = body["err"]["code"].as_i64().unwrap_or_default();
        return Err(anyhow!(
            "Review Board API error {} (HTTP {}) for {}: {}",
            code,
            status,
            url,
            msg
        ));
    }

    Ok(body)
}

/// Pull one page out of a list response: the array under `key`, the
/// reported total and the next link.
fn parse_page<P, T>(mut body: Value, key: &str, convert: impl Fn(P) -> Result<T>) -> Result<Page<T>>
where
    P: DeserializeOwned,
{
    let raw: Vec<P> = serde_json::from_value(body[key].take())
        .with_context(|| format!("Malformed '{}' list in response", key))?;
    let items = raw.into_iter().map(convert).collect::<Result<Vec<_>>>()?;
    let total_results = body["total_results"]
        .as_u64()
        .map(|n| n as usize)
        .unwrap_or(items.len());
    let next = body["links"]["next"]["href"].as_str().map(str::to_string);

    Ok(Page {
        items,
        total_results,
        next,
    })
}

fn review_request_params(query: &ReviewRequestQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(repository) = query.repository {
        params.push(("repository", repository.to_string()));
    }
    // The server only lists pending requests unless told otherwise.
    let status = query.status.map(|s| s.as_str()).unwrap_or("all");
    params.push(("status", status.to_string()));
    if let Some(user) = &query.to_users {
        params.push(("to-users", user.clone()));
    }
    if let Some(group) = &query.to_groups {
        params.push(("to-groups", group.clone()));
    }
    if let Some(user) = &query.from_user {
        params.push(("from-user", user.clone()));
    }
    if let Some(max) = query.max_results {
        params.push(("max-results", max.to_string()));
    }
    params
}

#[async_trait]
impl ReviewServer for RbClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn repositories(&self, cursor: Option<String>) -> Result<Page<Repository>> {
        let body = self.get_list("repositories/", &[], cursor).await?;
        parse_page(body, "repositories", |p: RepositoryPayload| Ok(Repository::from(p)))
    }

    async fn review_requests(
        &self,
        query: &ReviewRequestQuery,
        cursor: Option<String>,
    ) -> Result<Page<ReviewRequest>> {
        let params = review_request_params(query);
        let body = self.get_list("review-requests/", &params, cursor).await?;
        parse_page(body, "review_requests", |p: ReviewRequestPayload| {
            ReviewRequest::try_from(p)
        })
    }

    async fn diff_revisions(
        &self,
        review_request: u64,
        cursor: Option<String>,
    ) -> Result<Page<DiffRevision>> {
        let path = format!("review-requests/{}/diffs/", review_request);
        let body = self.get_list(&path, &[], cursor).await?;
        parse_page(body, "diffs", |p: DiffPayload| DiffRevision::try_from(p))
    }

    async fn diff_files(
        &self,
        review_request: u64,
        revision: u32,
        cursor: Option<String>,
    ) -> Result<Page<FileDiff>> {
        let path = format!("review-requests/{}/diffs/{}/files/", review_request, revision);
        let body = self.get_list(&path, &[], cursor).await?;
        parse_page(body, "files", |p: FileDiffPayload| Ok(FileDiff::from(p)))
    }

    async fn file_patch(
        &self,
        review_request: u64,
        revision: u32,
        file_id: u64,
    ) -> Result<Vec<u8>> {
        let url = self.api_url(&format!(
            "review-requests/{}/diffs/{}/files/{}/",
            review_request, revision, file_id
        ));
        debug!(%url, "GET patch");
        let response = self
            .authorize(self.http.get(&url).header(ACCEPT, PATCH_MIMETYPE))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Review Board returned HTTP {} for {}", status, url));
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read patch from {}", url))?;
        Ok(bytes.to_vec())
    }

    async fn reviews(&self, review_request: u64, cursor: Option<String>) -> Result<Page<ReviewEvent>> {
        let path = format!("review-requests/{}/reviews/", review_request);
        let body = self.get_list(&path, &[], cursor).await?;
        parse_page(body, "reviews", |p: ReviewPayload| ReviewEvent::try_from(p))
    }

    async fn close_review_request(
        &self,
        review_request: u64,
        description: Option<&str>,
    ) -> Result<()> {
        let url = self.api_url(&format!("review-requests/{}/", review_request));
        let mut form = vec![("status", "submitted")];
        if let Some(description) = description {
            form.push(("close_description", description));
        }
        debug!(%url, "PUT status=submitted");
        let response = self
            .authorize(self.http.put(&url).header(ACCEPT, JSON_MIMETYPE).form(&form))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;
        read_json(response).await?;
        Ok(())
    }
}
