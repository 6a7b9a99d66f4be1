//! Search service seam and its HTTP implementation.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use docsite_shared::{DocsiteError, DomainConfig, Result};

use crate::batch::{DocumentOp, SearchResponse, UploadResponse};

/// API version prefix of every service path.
const API_VERSION: &str = "2013-01-01";

/// User-Agent string for service requests.
const USER_AGENT: &str = concat!("docsite/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    /// Use the structured query parser instead of the simple one.
    pub structured: bool,
    pub size: Option<usize>,
}

impl SearchQuery {
    pub fn simple(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            structured: false,
            size: None,
        }
    }

    pub fn structured(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            structured: true,
            size: None,
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Every document in the domain.
    pub fn match_all(size: usize) -> Self {
        Self::structured("matchall").size(size)
    }
}

// ---------------------------------------------------------------------------
// SearchService trait
// ---------------------------------------------------------------------------

/// The operations the indexer needs from a search domain.
pub trait SearchService {
    /// Run a query against the search endpoint.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse>;

    /// Submit a batch of adds and deletes to the document endpoint.
    async fn upload(&self, batch: &[DocumentOp]) -> Result<UploadResponse>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Outcome of checking a search endpoint for a well-formed answer.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCheck {
    /// A JSON object with `status` and `hits`.
    Valid,
    /// JSON, but not the expected shape.
    UnexpectedShape(serde_json::Value),
    /// Not JSON at all; holds the raw body.
    InvalidJson(String),
}

/// Talks to a search domain over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: Client,
    search_url: Url,
    batch_url: Url,
}

impl HttpSearchClient {
    /// Build a client for the endpoints of `domain`.
    pub fn new(domain: &DomainConfig, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DocsiteError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            search_url: service_url(&domain.search_endpoint, "search")?,
            batch_url: service_url(&domain.document_endpoint, "documents/batch")?,
        })
    }

    /// The full URL a query is sent to.
    pub fn search_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.search_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.q);
            if query.structured {
                pairs.append_pair("q.parser", "structured");
            }
            if let Some(size) = query.size {
                pairs.append_pair("size", &size.to_string());
            }
        }
        url
    }

    /// Whether the search endpoint answers at all.
    pub async fn is_reachable(&self) -> bool {
        match self.client.get(self.search_url.clone()).send().await {
            Ok(resp) => {
                debug!(status = %resp.status(), "endpoint answered");
                true
            }
            Err(e) => {
                debug!(error = %e, "endpoint not reachable yet");
                false
            }
        }
    }

    /// Fetch a match-all page and check that it looks like a search answer.
    #[instrument(skip_all, fields(url = %self.search_url))]
    pub async fn check_search(&self) -> Result<SearchCheck> {
        let url = self.search_url(&SearchQuery::match_all(1));
        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DocsiteError::Network(format!("{url}: {e}")))?
            .text()
            .await
            .map_err(|e| DocsiteError::Network(format!("{url}: failed to read body: {e}")))?;

        Ok(classify_search_answer(&body))
    }
}

fn classify_search_answer(body: &str) -> SearchCheck {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) if json.get("status").is_some() && json.get("hits").is_some() => {
            SearchCheck::Valid
        }
        Ok(json) => SearchCheck::UnexpectedShape(json),
        Err(_) => SearchCheck::InvalidJson(body.to_string()),
    }
}

impl SearchService for HttpSearchClient {
    #[instrument(skip_all, fields(q = %query.q, size = ?query.size))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse> {
        let url = self.search_url(query);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DocsiteError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocsiteError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocsiteError::Network(format!("{url}: failed to read body: {e}")))?;
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| DocsiteError::parse(format!("search response from {url}: {e}")))?;

        debug!(found = parsed.hits.found, returned = parsed.hits.hit.len(), "search done");
        Ok(parsed)
    }

    #[instrument(skip_all, fields(ops = batch.len()))]
    async fn upload(&self, batch: &[DocumentOp]) -> Result<UploadResponse> {
        let url = &self.batch_url;
        let response = self
            .client
            .post(url.clone())
            .json(batch)
            .send()
            .await
            .map_err(|e| DocsiteError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DocsiteError::Network(format!("{url}: failed to read body: {e}")))?;
        if !status.is_success() {
            return Err(DocsiteError::Search(format!("{url}: HTTP {status}: {body}")));
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| DocsiteError::parse(format!("upload response from {url}: {e}")))?;

        info!(status = %parsed.status, adds = parsed.adds, deletes = parsed.deletes, "batch uploaded");
        Ok(parsed)
    }
}

/// `<endpoint>/2013-01-01/<path>`. Bare hosts get `https://`.
fn service_url(endpoint: &str, path: &str) -> Result<Url> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(DocsiteError::config("search endpoint is empty"));
    }
    let base = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    };
    Url::parse(&format!("{base}/{API_VERSION}/{path}"))
        .map_err(|e| DocsiteError::config(format!("invalid endpoint '{endpoint}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn domain_for(server: &MockServer) -> DomainConfig {
        DomainConfig {
            name: "test".into(),
            document_endpoint: server.uri(),
            search_endpoint: server.uri(),
        }
    }

    #[test]
    fn bare_hosts_get_https() {
        let url = service_url("search-legato.example.com", "search").expect("url");
        assert_eq!(
            url.as_str(),
            "https://search-legato.example.com/2013-01-01/search"
        );
        let url = service_url("http://127.0.0.1:9000/", "documents/batch").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/2013-01-01/documents/batch");
        assert!(service_url("  ", "search").is_err());
    }

    #[test]
    fn query_parameters() {
        let domain = DomainConfig {
            name: "d".into(),
            document_endpoint: "doc.example.com".into(),
            search_endpoint: "search.example.com".into(),
        };
        let client = HttpSearchClient::new(&domain, 5).expect("client");
        let url = client.search_url(&SearchQuery::match_all(600));
        assert_eq!(
            url.as_str(),
            "https://search.example.com/2013-01-01/search?q=matchall&q.parser=structured&size=600"
        );
        let url = client.search_url(&SearchQuery::simple("le_args.h"));
        assert_eq!(url.query(), Some("q=le_args.h"));
    }

    #[test]
    fn search_answer_classification() {
        assert_eq!(
            classify_search_answer(r#"{"status":{"rid":"x"},"hits":{"found":0,"hit":[]}}"#),
            SearchCheck::Valid
        );
        assert!(matches!(
            classify_search_answer(r#"{"message":"Forbidden"}"#),
            SearchCheck::UnexpectedShape(_)
        ));
        assert!(matches!(classify_search_answer("<html>"), SearchCheck::InvalidJson(_)));
    }

    #[tokio::test]
    async fn search_sends_structured_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2013-01-01/search"))
            .and(query_param("q", "matchall"))
            .and(query_param("q.parser", "structured"))
            .and(query_param("size", "600"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status":{"rid":"r"},"hits":{"found":2,"hit":[{"id":"a.html"},{"id":"old.html"}]}}"#,
            ))
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&domain_for(&server), 5).expect("client");
        let resp = client
            .search(&SearchQuery::match_all(600))
            .await
            .expect("search");
        assert_eq!(resp.ids().collect::<Vec<_>>(), vec!["a.html", "old.html"]);
    }

    #[tokio::test]
    async fn search_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2013-01-01/search"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&domain_for(&server), 5).expect("client");
        let err = client
            .search(&SearchQuery::simple("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsiteError::Network(_)));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn upload_posts_batch_json() {
        let server = MockServer::start().await;
        let batch = vec![DocumentOp::Delete { id: "old.html".into() }];
        Mock::given(method("POST"))
            .and(path("/2013-01-01/documents/batch"))
            .and(body_json(serde_json::json!([{"type": "delete", "id": "old.html"}])))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"status":"success","adds":0,"deletes":1}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&domain_for(&server), 5).expect("client");
        let resp = client.upload(&batch).await.expect("upload");
        assert!(resp.is_success());
        assert_eq!(resp.deletes, 1);
    }

    #[tokio::test]
    async fn search_check_and_reachability_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2013-01-01/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"status":{"rid":"r"},"hits":{"found":0,"hit":[]}}"#),
            )
            .mount(&server)
            .await;

        let client = HttpSearchClient::new(&domain_for(&server), 5).expect("client");
        assert!(client.is_reachable().await);
        assert_eq!(client.check_search().await.expect("check"), SearchCheck::Valid);
    }
}
