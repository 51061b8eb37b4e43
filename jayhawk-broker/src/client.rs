//! Broker HTTP client

use crate::errors::{BrokerError, BrokerResult};
use crate::identity::{DeregistrationRequest, RegistrationRequest, WorkerIdentity};
use jayhawk_config::BrokerEndpointConfig;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

/// Registration calls a worker makes against the broker
#[async_trait::async_trait]
pub trait BrokerClient: Send + Sync {
    /// Announce the worker. A single attempt; callers log and move on.
    async fn register(&self, identity: &WorkerIdentity) -> BrokerResult<()>;

    /// Ask the broker to forget the worker. Bounded by the request timeout.
    async fn deregister(&self, identity: &WorkerIdentity) -> BrokerResult<()>;
}

/// reqwest-backed broker client
#[derive(Debug, Clone)]
pub struct HttpBrokerClient {
    client: Client,
    base_url: String,
    models: Vec<String>,
}

impl HttpBrokerClient {
    /// Build a client for the configured broker. The underlying connection
    /// pool is shared by every call.
    pub fn new(config: &BrokerEndpointConfig, models: Vec<String>) -> BrokerResult<Self> {
        debug!(
            "Creating broker client for {} with timeout: {}ms",
            config.base_url(),
            config.timeout.as_millis()
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(concat!("jayhawk-worker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BrokerError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            models,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn register_url(&self) -> String {
        format!("{}/workers", self.base_url)
    }

    pub fn deregister_url(&self) -> String {
        format!("{}/workers/remove", self.base_url)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        url: &str,
        body: &T,
    ) -> BrokerResult<()> {
        debug!("POST {} ({})", url, operation);

        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Rejected {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl BrokerClient for HttpBrokerClient {
    async fn register(&self, identity: &WorkerIdentity) -> BrokerResult<()> {
        let body = RegistrationRequest::new(identity, &self.models);
        self.post_json("register", &self.register_url(), &body).await?;
        info!(worker_id = %identity.id, "Registered with broker at {}", self.base_url);
        Ok(())
    }

    async fn deregister(&self, identity: &WorkerIdentity) -> BrokerResult<()> {
        let body = DeregistrationRequest::from(identity);
        self.post_json("deregister", &self.deregister_url(), &body)
            .await?;
        info!(worker_id = %identity.id, "Deregistered from broker at {}", self.base_url);
        Ok(())
    }
}
