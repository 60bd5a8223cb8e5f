//! Generic authenticated calls against `{base}/api/...`.

use std::fmt;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::error::non_empty_or;
use super::{bearer_header, ApiResult, ClientError};

const NETWORK_ERROR: &str = "Network error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Extra per-call settings. Headers given here are applied after the bearer
/// header, so they may replace it, but never the JSON content type of a body.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Sends bearer-authenticated JSON requests to the application API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RequestDispatcher {
    client: Client,
    api_url: String,
}

impl RequestDispatcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            api_url: format!("{}/api", base_url),
        }
    }

    /// Join the caller's path onto `{base}/api` with a single slash at the seam.
    /// The rest of the path is used verbatim.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_url, path)
        } else {
            format!("{}/{}", self.api_url, path)
        }
    }

    /// Perform one request. Without a token nothing is sent.
    pub async fn request<T, B>(
        &self,
        token: Option<&str>,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!(%method, path, "No token, request not sent");
            return Err(ClientError::NoToken);
        };

        let url = self.url_for(path);
        let headers = Self::build_headers(token, options, body.is_some())?;

        let mut builder = self
            .client
            .request(method.into(), &url)
            .headers(headers);
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| ClientError::InvalidRequest(non_empty_or(e.to_string(), NETWORK_ERROR)))?;
            builder = builder.body(bytes);
        }

        debug!(%method, url = %url, "Sending API request");
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, NETWORK_ERROR))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                %method,
                url = %url,
                status = status.as_u16(),
                body = %ClientError::truncate_body(&body),
                "API request failed"
            );
            return Err(ClientError::Http {
                method,
                url,
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_transport(e, NETWORK_ERROR))?;
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            warn!(%method, url = %url, error = %e, "Failed to parse API response");
            ClientError::InvalidResponse(non_empty_or(e.to_string(), NETWORK_ERROR))
        })
    }

    fn build_headers(token: &str, options: &RequestOptions, has_body: bool) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, bearer_header(token)?);

        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::InvalidRequest(format!("Invalid header name {}: {}", name, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::InvalidRequest(format!("Invalid value for header {}: {}", name, e)))?;
            headers.insert(header_name, header_value);
        }

        if has_body {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> RequestDispatcher {
        RequestDispatcher::new(Client::new(), "http://localhost:8080")
    }

    #[test]
    fn test_url_for_joins_single_seam_slash() {
        let d = dispatcher();
        assert_eq!(d.url_for("/things"), "http://localhost:8080/api/things");
        assert_eq!(d.url_for("things"), "http://localhost:8080/api/things");
        assert_eq!(d.url_for("/buckets/b1/files?limit=5"), "http://localhost:8080/api/buckets/b1/files?limit=5");
        // Interior slashes are the caller's responsibility
        assert_eq!(d.url_for("//things"), "http://localhost:8080/api//things");
    }

    #[test]
    fn test_headers_bearer_then_caller_then_content_type() {
        let options = RequestOptions::new()
            .header("X-Trace", "abc")
            .header("Content-Type", "text/plain");

        let headers = RequestDispatcher::build_headers("T1", &options, true).unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer T1");
        assert_eq!(headers["x-trace"], "abc");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");

        // Without a body the caller's content type stands
        let headers = RequestDispatcher::build_headers("T1", &options, false).unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_caller_may_override_authorization() {
        let options = RequestOptions::new().header("Authorization", "Basic Zm9vOmJhcg==");
        let headers = RequestDispatcher::build_headers("T1", &options, false).unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Basic Zm9vOmJhcg==");
        assert!(headers.get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_invalid_header_is_reported() {
        let options = RequestOptions::new().header("Bad Header", "x");
        let err = RequestDispatcher::build_headers("T1", &options, false).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn test_missing_token_never_sends() {
        let d = dispatcher();
        let result: ApiResult<serde_json::Value> = tokio_test::block_on(d.request(
            None,
            Method::Get,
            "/things",
            None::<&serde_json::Value>,
            &RequestOptions::default(),
        ));
        assert_eq!(result, Err(ClientError::NoToken));

        let result: ApiResult<serde_json::Value> = tokio_test::block_on(d.request(
            Some(""),
            Method::Post,
            "/things",
            Some(&serde_json::json!({"name": "x"})),
            &RequestOptions::default(),
        ));
        assert_eq!(result, Err(ClientError::NoToken));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.as_str(), "DELETE");
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
    }
}
