//! JSON-over-HTTP client for the recognition service.
//!
//! Endpoints, relative to the configured base URL:
//! `POST /jobs`, `GET /jobs/{name}`, `DELETE /jobs/{name}`.

use std::time::Duration;

use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{RecognitionError, RemoteJob, SpeechRecognitionClient, SubmitRequest};
use crate::model::RemoteJobStatus;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    status: RemoteJobStatus,
}

pub struct HttpRecognitionClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    timeout_secs: u64,
}

impl HttpRecognitionClient {
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, RecognitionError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RecognitionError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
        })
    }

    fn job_url(&self, job_name: &str) -> String {
        format!("{}/jobs/{}", self.base_url, job_name)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }

    fn send_error(&self, err: reqwest::Error) -> RecognitionError {
        if err.is_timeout() {
            RecognitionError::Timeout(self.timeout_secs)
        } else {
            RecognitionError::Transport(err.to_string())
        }
    }

    /// Maps a non-success response onto the error taxonomy.
    async fn status_error(job_name: &str, response: Response) -> RecognitionError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => RecognitionError::NotFound(job_name.to_string()),
            s if s.is_client_error() => {
                RecognitionError::Rejected(format!("{} ({}): {}", job_name, s, body))
            }
            s => RecognitionError::Transport(format!("{} ({}): {}", job_name, s, body)),
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognitionClient for HttpRecognitionClient {
    async fn submit(&self, request: &SubmitRequest) -> Result<RemoteJobStatus, RecognitionError> {
        info!(
            "Submitting recognition job {} for {}",
            request.job_name, request.media_uri
        );

        let response = self
            .authorize(self.client.post(format!("{}/jobs", self.base_url)))
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(&request.job_name, response).await);
        }

        let accepted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::Decode(format!("submit response: {}", e)))?;
        Ok(accepted.status)
    }

    async fn get_status(&self, job_name: &str) -> Result<RemoteJob, RecognitionError> {
        let response = self
            .authorize(self.client.get(self.job_url(job_name)))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(job_name, response).await);
        }

        let job: RemoteJob = response
            .json()
            .await
            .map_err(|e| RecognitionError::Decode(format!("status response: {}", e)))?;
        debug!("Recognition job {} reports {}", job_name, job.status);
        Ok(job)
    }

    async fn cancel(&self, job_name: &str) -> Result<(), RecognitionError> {
        let response = self
            .authorize(self.client.delete(self.job_url(job_name)))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(job_name, response).await);
        }
        Ok(())
    }
}
