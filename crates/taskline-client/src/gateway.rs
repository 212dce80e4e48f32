//! HTTP gateway collaborator: task submission and best-effort cancellation.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use taskline_wire::{CancelTaskRequest, SubmitTaskRequest, SubmitTaskResponse};

use crate::config::ClientConfig;
use crate::error::GatewayError;

/// The session controller's view of the submission backend. A trait so
/// tests can substitute an in-memory fake.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Submit a task; returns the task identifier to subscribe to.
    async fn submit_task(&self, message: &str, agent_id: &str) -> Result<String, GatewayError>;

    /// Ask the backend to stop the agent's current task.
    async fn cancel_task(&self, agent_id: &str) -> Result<(), GatewayError>;
}

/// The real gateway: thin reqwest wrapper over `/api/message` and
/// `/api/cancel`, with an optional bearer token.
pub struct HttpGateway {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.gateway_base_url.trim_end_matches('/').to_string(),
            token: config.gateway_token.clone(),
            client: Client::new(),
        }
    }

    fn authed(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }
}

#[async_trait]
impl TaskGateway for HttpGateway {
    async fn submit_task(&self, message: &str, agent_id: &str) -> Result<String, GatewayError> {
        let url = format!("{}/api/message", self.base_url);
        let body = SubmitTaskRequest {
            message: message.to_string(),
            agent_id: agent_id.to_string(),
        };
        let resp = self.authed(self.client.post(&url)).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status(resp.status().as_u16()));
        }
        let parsed = resp.json::<SubmitTaskResponse>().await?;
        debug!(task_id = %parsed.current_task_id, "task submitted");
        Ok(parsed.current_task_id)
    }

    async fn cancel_task(&self, agent_id: &str) -> Result<(), GatewayError> {
        let url = format!("{}/api/cancel", self.base_url);
        let body = CancelTaskRequest {
            agent_id: agent_id.to_string(),
        };
        let resp = self.authed(self.client.post(&url)).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}
