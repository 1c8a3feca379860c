//! Mock HTTP server standing in for language model providers and image hosts.

use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Wrapper around wiremock MockServer with convenience methods
pub struct MockHttpServer {
    pub server: MockServer,
}

impl MockHttpServer {
    /// Start a new mock HTTP server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Get URL for a specific path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Mock an OpenAI-compatible chat endpoint answering with `content`
    pub async fn mock_chat_completion(&self, api_key: &str, content: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", format!("Bearer {api_key}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": content}}
                ]
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the Baidu token exchange and chat endpoints
    pub async fn mock_baidu(&self, client_id: &str, token: &str, result: &str) {
        Mock::given(method("POST"))
            .and(path("/oauth/2.0/token"))
            .and(query_param("grant_type", "client_credentials"))
            .and(query_param("client_id", client_id))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "access_token": token })),
            )
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/completions"))
            .and(query_param("access_token", token))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": result })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a GET endpoint returning raw bytes
    pub async fn mock_get_bytes(&self, endpoint: &str, content_type: &str, bytes: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(bytes)
                    .insert_header("content-type", content_type),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock an endpoint that returns an error for any method
    pub async fn mock_error(&self, endpoint: &str, status: u16, message: &str) {
        Mock::given(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_string(message))
            .mount(&self.server)
            .await;
    }
}
