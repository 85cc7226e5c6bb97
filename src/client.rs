use crate::errors::Result;
use crate::models::{EventAggregateRecord, EventSubmission};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_stats(&self) -> Result<Vec<EventAggregateRecord>>;
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn submit_event(&self, event: &EventSubmission) -> Result<()>;
}

/// HTTP client for the event backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl StatsSource for ApiClient {
    async fn fetch_stats(&self) -> Result<Vec<EventAggregateRecord>> {
        let url = format!("{}/api/stats", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        let records: Vec<EventAggregateRecord> = serde_json::from_slice(&body)?;
        debug!(%status, records = records.len(), "fetched stats");
        Ok(records)
    }
}

#[async_trait]
impl EventSink for ApiClient {
    async fn submit_event(&self, event: &EventSubmission) -> Result<()> {
        let url = format!("{}/api/events", self.base_url);
        let response = self.authorize(self.client.post(&url)).json(event).send().await?;
        debug!(status = %response.status(), event_type = %event.event_type, "event submitted");
        Ok(())
    }
}
