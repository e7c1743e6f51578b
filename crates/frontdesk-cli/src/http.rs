//! HTTP implementations of the backend collaborator traits
//!
//! Bootstrap and send are plain request/response calls; only the push channel
//! needs a persistent connection (see `frontdesk-push`).

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use frontdesk_core::{
    BootstrapError, BootstrapResponse, BootstrapService, SendError, SendReceipt, SendTransport,
};

/// HTTP backend for session bootstrap and message send
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct StartSessionRequest<'a> {
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    #[serde(rename = "connectionToken")]
    connection_token: &'a str,
    content: &'a str,
}

#[async_trait]
impl BootstrapService for HttpChatBackend {
    async fn start_session(
        &self,
        display_name: Option<&str>,
    ) -> Result<BootstrapResponse, BootstrapError> {
        let url = self.endpoint("chat/start");
        debug!(%url, "starting chat session");

        let response = self
            .client
            .post(&url)
            .json(&StartSessionRequest { display_name })
            .send()
            .await
            .map_err(|e| BootstrapError::request_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BootstrapError::request_failed(format!(
                "backend returned {}",
                status
            )));
        }

        response
            .json::<BootstrapResponse>()
            .await
            .map_err(|e| BootstrapError::MalformedResponse {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl SendTransport for HttpChatBackend {
    async fn send_message(
        &self,
        connection_token: &str,
        content: &str,
    ) -> Result<SendReceipt, SendError> {
        let url = self.endpoint("chat/send");

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                connection_token,
                content,
            })
            .send()
            .await
            .map_err(|e| SendError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Rejected {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("request rejected")
                    .to_string(),
            });
        }

        response
            .json::<SendReceipt>()
            .await
            .map_err(|e| SendError::transport(e.to_string()))
    }
}
