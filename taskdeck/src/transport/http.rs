//! HTTP transport for the task API.
//!
//! Sends JSON requests with a bearer token and maps error bodies back into
//! [`TransportError::Rejected`].

use serde::de::DeserializeOwned;
use url::Url;

use taskdeck_proto::api::{
    CreateTaskRequest, ErrorBody, MutationResponse, TASKS_PATH, UpdateStatusRequest, task_path,
};
use taskdeck_proto::task::{Task, TaskId, TodoStatus};

use super::{TaskApi, TransportError};

/// `reqwest`-backed [`TaskApi`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for the server at `base_url`.
    ///
    /// API paths resolve below any path prefix on `base_url`, so
    /// `https://example.com/tracker` sends to `https://example.com/tracker/api/tasks`.
    /// Without a token every request is sent unauthenticated and the server
    /// will reject it.
    #[must_use]
    pub fn new(mut base_url: Url, token: Option<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    /// The server base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::Unreachable(format!("invalid endpoint {path}: {e}")))
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, TransportError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        tracing::debug!(status = %status, "server returned an error");
        match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(error) => Err(TransportError::Rejected {
                code: error.code,
                message: error.message,
            }),
            Err(_) => Err(TransportError::UnexpectedResponse(format!("HTTP {status}"))),
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(body).map_err(|e| TransportError::UnexpectedResponse(e.to_string()))
}

impl TaskApi for HttpTransport {
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        let url = self.endpoint(TASKS_PATH)?;
        let body = self.send(self.client.get(url)).await?;
        decode(&body)
    }

    async fn create_task(
        &self,
        request: &CreateTaskRequest,
    ) -> Result<MutationResponse, TransportError> {
        let url = self.endpoint(TASKS_PATH)?;
        let body = self.send(self.client.post(url).json(request)).await?;
        decode(&body)
    }

    async fn update_status(
        &self,
        id: TaskId,
        status: TodoStatus,
    ) -> Result<MutationResponse, TransportError> {
        let url = self.endpoint(&task_path(id))?;
        let request = UpdateStatusRequest {
            todo_status: status,
        };
        let body = self.send(self.client.patch(url).json(&request)).await?;
        decode(&body)
    }

    async fn delete_task(&self, id: TaskId) -> Result<MutationResponse, TransportError> {
        let url = self.endpoint(&task_path(id))?;
        let body = self.send(self.client.delete(url)).await?;
        decode(&body)
    }
}
