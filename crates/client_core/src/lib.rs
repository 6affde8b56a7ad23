use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    multipart::{Form, Part},
    Client, RequestBuilder,
};
use serde_json::Value;
use shared::{
    domain::{DocumentQuery, NewsArticle, VerificationQuery},
    error::VerificationError,
    protocol::{
        parse_article_list, CheckOutcome, CHECK_NEWS_PATH, CHECK_NEWS_QUERY_PARAM, CHECK_PDF_FIELD,
        CHECK_PDF_PATH, GET_ALL_PATH,
    },
};
use tracing::{debug, warn};

pub mod controller;

pub use controller::{
    Completion, RequestState, ViewController, ViewRequest, ViewSnapshot, GENERIC_FAILURE_MESSAGE,
};

const JSON_CONTENT_TYPE: &str = "application/json";
const FALLBACK_UPLOAD_MIME: &str = "application/octet-stream";

/// Calls the remote verification API. Each method issues exactly one request.
#[async_trait]
pub trait VerificationApi: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<NewsArticle>, VerificationError>;
    async fn check_text(&self, query: &str) -> Result<CheckOutcome, VerificationError>;
    async fn check_document(
        &self,
        document: DocumentQuery,
    ) -> Result<CheckOutcome, VerificationError>;

    async fn check(&self, query: VerificationQuery) -> Result<CheckOutcome, VerificationError> {
        match query {
            VerificationQuery::Text(text) => self.check_text(&text.text).await,
            VerificationQuery::Document(document) => self.check_document(document).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationClient {
    http: Client,
    base_url: String,
}

impl VerificationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends the request and reads the body of a 2xx response as JSON.
    async fn send_for_json(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Value, VerificationError> {
        debug!(operation, "issuing verification request");
        let result = read_json(request).await;
        if let Err(err) = &result {
            warn!(
                operation,
                kind = ?err.kind(),
                status = ?err.status(),
                error = %err,
                "verification request failed"
            );
        }
        result
    }
}

async fn read_json(request: RequestBuilder) -> Result<Value, VerificationError> {
    let response = request.send().await.map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(VerificationError::transport(
            Some(status.as_u16()),
            format!("HTTP error! Status: {}", status.as_u16()),
        ));
    }

    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body)
        .map_err(|e| VerificationError::malformed(format!("response body is not valid JSON: {e}")))
}

fn map_reqwest_error(err: reqwest::Error) -> VerificationError {
    VerificationError::transport(err.status().map(|s| s.as_u16()), err.to_string())
}

#[async_trait]
impl VerificationApi for VerificationClient {
    async fn fetch_all(&self) -> Result<Vec<NewsArticle>, VerificationError> {
        let request = self
            .http
            .get(self.endpoint(GET_ALL_PATH))
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        let payload = self.send_for_json("fetch_all", request).await?;

        let articles = parse_article_list(payload).inspect_err(|err| {
            warn!(operation = "fetch_all", error = %err, "list payload rejected");
        })?;
        debug!(count = articles.len(), "fetched article list");
        Ok(articles)
    }

    async fn check_text(&self, query: &str) -> Result<CheckOutcome, VerificationError> {
        let request = self
            .http
            .get(self.endpoint(CHECK_NEWS_PATH))
            .query(&[(CHECK_NEWS_QUERY_PARAM, query)])
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self.send_for_json("check_text", request)
            .await
            .map(CheckOutcome)
    }

    async fn check_document(
        &self,
        document: DocumentQuery,
    ) -> Result<CheckOutcome, VerificationError> {
        let mime_type = document
            .mime_type
            .unwrap_or_else(|| FALLBACK_UPLOAD_MIME.to_string());
        let size_bytes = document.file_bytes.len();
        let part = Part::bytes(document.file_bytes)
            .file_name(document.file_name)
            .mime_str(&mime_type)
            .map_err(|e| {
                VerificationError::transport(None, format!("invalid upload mime type: {e}"))
            })?;
        debug!(size_bytes, mime_type = %mime_type, "prepared document upload");

        // The multipart encoder sets the content type with its boundary.
        let request = self
            .http
            .post(self.endpoint(CHECK_PDF_PATH))
            .multipart(Form::new().part(CHECK_PDF_FIELD, part));
        self.send_for_json("check_document", request)
            .await
            .map(CheckOutcome)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
