use super::*;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Talks to a running server over HTTP with a bounded per-request timeout
pub struct HttpClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Transport(e.to_string())
        }
    }

    /// Decode a success body, or turn an error status into a typed rejection
    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Err(error_from_status(status, text))
    }
}

/// A 4xx is final even when something in between replaced the body; only
/// 408, 429 and 5xx are worth resending
fn error_from_status(status: StatusCode, text: String) -> ClientError {
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
        if status.is_client_error() {
            return ClientError::Rejected(body);
        }
    }

    let retryable = matches!(
        status,
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
    );
    if status.is_client_error() && !retryable {
        let message = if text.trim().is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, text.trim())
        };
        return ClientError::Rejected(ErrorBody::new(ErrorCode::BadRequest, message));
    }

    ClientError::Server {
        status: status.as_u16(),
        message: text,
    }
}

#[async_trait]
impl GameClient for HttpClient {
    async fn status(&self) -> ClientResult<StatusSnapshot> {
        let response = self
            .client
            .get(self.url("/api/status"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    async fn latest_pulse(&self, after: Option<u64>) -> ClientResult<LatestPulseResponse> {
        let mut request = self.client.get(self.url("/api/pulse/latest"));
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    async fn vote(&self, request: &VoteRequest) -> ClientResult<VoteResponse> {
        let response = self
            .client
            .post(self.url("/api/vote"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    async fn pulse(&self, judge_id: JudgeId) -> ClientResult<PulseResponse> {
        let response = self
            .client
            .post(self.url("/api/pulse"))
            .json(&PulseRequest { judge_id })
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }

    async fn reset(&self) -> ClientResult<ResetResponse> {
        let response = self
            .client
            .post(self.url("/api/reset"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.decode(response).await
    }
}
