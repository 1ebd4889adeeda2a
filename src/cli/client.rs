use anyhow::Context;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

/// Thin HTTP client for the admin API
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

/// Decoded response: status plus JSON body (`Null` when the body is empty or not JSON)
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success() && self.body.get("success") == Some(&Value::Bool(true))
    }

    pub fn error_message(&self) -> String {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base = Url::parse(server).with_context(|| format!("invalid server URL '{}'", server))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token,
        })
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded
    pub fn url(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("server URL '{}' cannot be a base", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn send(&self, method: Method, segments: &[&str]) -> anyhow::Result<ApiReply> {
        let url = self.url(segments)?;
        let mut request = self.http.request(method, url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(ApiReply { status, body })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_ids_in_urls() {
        let client = ApiClient::new("http://localhost:3000/", None).unwrap();
        let url = client.url(&["users", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/users/a%2Fb");
    }

    #[test]
    fn reply_success_requires_envelope() {
        let ok = ApiReply { status: StatusCode::OK, body: json!({"success": true}) };
        let odd = ApiReply { status: StatusCode::OK, body: Value::Null };
        assert!(ok.is_success());
        assert!(!odd.is_success());
        assert_eq!(odd.error_message(), "HTTP 200 OK");
    }
}
