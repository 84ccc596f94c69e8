//! HTTP client for the ReadMe-style document API.
//!
//! Every request carries basic auth (API key as username, empty password)
//! and the target version header. Non-success responses are mapped to
//! [`ClientError`], parsing the structured rejection body when there is one.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    Category, ClientConfig, ClientError, Doc, DocApi, DocForm, DocSummaryParent,
    RemoteValidationError,
};

const VERSION_HEADER: &str = "x-readme-version";

/// Document store client over HTTP.
#[derive(Debug, Clone)]
pub struct ReadmeClient {
    http: Client,
    config: ClientConfig,
}

impl ReadmeClient {
    /// Create a client with a fresh connection pool.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(Client::new(), config)
    }

    /// Create a client sharing an existing `reqwest::Client`.
    pub fn with_http_client(http: Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.config.api_key, None::<&str>)
            .header(VERSION_HEADER, &self.config.version)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.request(builder).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = error_body(status, response.text().await);
        Err(classify_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }
}

/// Body of a failed response, empty if it could not be read.
fn error_body<E: std::fmt::Display>(status: StatusCode, body: Result<String, E>) -> String {
    body.unwrap_or_else(|e| {
        debug!(status = %status, error = %e, "Failed to read error body");
        String::new()
    })
}

/// Map a failed response to a client error.
///
/// A 4xx body (other than 404) in the structured rejection shape becomes
/// [`ClientError::Rejected`]; anything else keeps the raw status and body.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> ClientError {
    if status.is_client_error() && status != StatusCode::NOT_FOUND {
        if let Ok(rejection) = serde_json::from_str::<RemoteValidationError>(body) {
            return ClientError::Rejected(rejection);
        }
    }

    ClientError::Http {
        status: status.as_u16(),
        body: body.to_string(),
    }
}

fn not_found_as_category(err: ClientError, slug: &str) -> ClientError {
    match err {
        ClientError::Http { status: 404, .. } => ClientError::CategoryNotFound(slug.to_string()),
        other => other,
    }
}

#[async_trait]
impl DocApi for ReadmeClient {
    async fn get_category(&self, slug: &str) -> Result<Category, ClientError> {
        let url = self.config.url(&format!("categories/{}", slug));
        debug!(url = %url, "Fetching category");

        self.send_json(self.http.get(&url))
            .await
            .map_err(|e| not_found_as_category(e, slug))
    }

    async fn get_category_docs(&self, slug: &str) -> Result<Vec<DocSummaryParent>, ClientError> {
        let url = self.config.url(&format!("categories/{}/docs", slug));
        debug!(url = %url, "Fetching category docs");

        self.send_json(self.http.get(&url))
            .await
            .map_err(|e| not_found_as_category(e, slug))
    }

    async fn create_doc(&self, form: &DocForm) -> Result<Doc, ClientError> {
        let url = self.config.url("docs");
        debug!(url = %url, slug = %form.slug, "POST doc");

        self.send_json(self.http.post(&url).json(form)).await
    }

    async fn update_doc(&self, slug: &str, form: &DocForm) -> Result<Doc, ClientError> {
        let url = self.config.url(&format!("docs/{}", slug));
        debug!(url = %url, slug = %slug, "PUT doc");

        self.send_json(self.http.put(&url).json(form)).await
    }

    async fn delete_doc(&self, slug: &str) -> Result<(), ClientError> {
        let url = self.config.url(&format!("docs/{}", slug));
        debug!(url = %url, slug = %slug, "DELETE doc");

        self.send(self.http.delete(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_error_body_falls_back_to_empty() {
        let status = StatusCode::BAD_GATEWAY;
        let body = error_body(status, Err::<String, _>("connection reset"));
        assert_eq!(body, "");
        assert!(matches!(
            classify_error(status, &body),
            ClientError::Http { status: 502, ref body } if body.is_empty()
        ));

        assert_eq!(error_body(status, Ok::<_, String>("upstream".to_string())), "upstream");
    }

    #[test]
    fn test_classify_structured_rejection() {
        let body = serde_json::json!({
            "error": "DOC_INVALID",
            "message": "Title is required",
            "errors": { "title": "required" }
        })
        .to_string();
        let body = body.as_str();
        match classify_error(StatusCode::BAD_REQUEST, body) {
            ClientError::Rejected(rejection) => {
                assert_eq!(rejection.code, "DOC_INVALID");
                assert_eq!(rejection.description, "Title is required");
                assert!(rejection.errors.unwrap().contains_key("title"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_unstructured_error() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(err, ClientError::Http { status: 500, ref body } if body == "oops"));

        let err = classify_error(StatusCode::NOT_FOUND, "<html>not found</html>");
        assert!(matches!(err, ClientError::Http { status: 404, .. }));

        let body = r#"{"error":"CATEGORY_NOTFOUND","message":"The category couldn't be found."}"#;
        let err = classify_error(StatusCode::NOT_FOUND, body);
        assert!(matches!(err, ClientError::Http { status: 404, .. }));
    }

    #[test]
    fn test_server_error_with_json_body_is_not_rejection() {
        let body = r#"{"error":"INTERNAL","message":"boom"}"#;
        let err = classify_error(StatusCode::BAD_GATEWAY, body);
        assert!(matches!(err, ClientError::Http { status: 502, .. }));
    }

    #[test]
    fn test_not_found_maps_to_category() {
        let err = not_found_as_category(
            ClientError::Http { status: 404, body: String::new() },
            "guides",
        );
        assert!(matches!(err, ClientError::CategoryNotFound(ref slug) if slug == "guides"));

        let err = not_found_as_category(
            ClientError::Http { status: 500, body: String::new() },
            "guides",
        );
        assert!(matches!(err, ClientError::Http { status: 500, .. }));
    }
}
