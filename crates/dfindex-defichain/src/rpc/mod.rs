//! HTTP JSON-RPC [`ChainClient`] for a DeFiChain node, backed by `reqwest`.

mod request;
mod retry;

pub use request::{RpcErrorObject, RpcRequest, RpcResponse};
pub use retry::Backoff;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dfindex_core::client::ChainClient;
use dfindex_core::error::ClientError;
use dfindex_core::indexer::IndexerConfig;
use dfindex_core::types::RawBlock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Node error code for a height beyond the tip.
const RPC_INVALID_PARAMETER: i64 = -8;
/// Node error code for an unknown block hash.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// Connection settings for [`HttpChainClient`].
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub backoff: Backoff,
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&IndexerConfig::default())
    }
}

impl From<&IndexerConfig> for HttpClientConfig {
    fn from(config: &IndexerConfig) -> Self {
        Self {
            user: config.rpc_user.clone(),
            password: config.rpc_password.clone(),
            backoff: Backoff::default().with_retries(config.rpc_max_retries),
            request_timeout: Duration::from_millis(config.rpc_timeout_ms),
        }
    }
}

/// Talks `getblockcount` / `getblockhash` / `getblock` to one node.
pub struct HttpChainClient {
    url: String,
    http: reqwest::Client,
    config: HttpClientConfig,
    next_id: AtomicU64,
}

impl HttpChainClient {
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self, ClientError> {
        Self::new(config.rpc_url.clone(), HttpClientConfig::from(config))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, request: &RpcRequest<'_>) -> Result<Value, ClientError> {
        let mut http = self.http.post(&self.url).json(request);
        if let Some(user) = &self.config.user {
            http = http.basic_auth(user, self.config.password.as_ref());
        }
        let reply = http
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        // RPC failures arrive as HTTP 500 with a JSON body, so parse first
        let status = reply.status();
        let body = reply
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        match serde_json::from_str::<RpcResponse>(&body) {
            Ok(parsed) => parsed.into_result().map_err(|e| ClientError::Rpc {
                code: e.code,
                message: e.message,
            }),
            Err(_) if !status.is_success() => Err(ClientError::Rpc {
                code: i64::from(status.as_u16()),
                message: body,
            }),
            Err(e) => Err(ClientError::Deserialization(e)),
        }
    }

    /// Invoke `method`, retrying transport failures on the configured backoff.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[Value],
    ) -> Result<T, ClientError> {
        let request = RpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);
        let mut failed = 0u32;
        loop {
            let err = match self.post(&request).await {
                Ok(value) => return Ok(serde_json::from_value(value)?),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };
            failed += 1;
            let Some(delay) = self.config.backoff.delay_after(failed) else {
                warn!(
                    method,
                    failed,
                    slept_ms = self.config.backoff.worst_case().as_millis() as u64,
                    url = %self.url,
                    error = %err,
                    "node unreachable, giving up"
                );
                return Err(err);
            };
            debug!(
                method,
                failed,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying node call"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Rewrite a node error `code` into the typed variant the sync loop matches on.
fn classify(err: ClientError, code: i64, typed: impl FnOnce() -> ClientError) -> ClientError {
    match err {
        ClientError::Rpc { code: c, .. } if c == code => typed(),
        other => other,
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn get_block_count(&self) -> Result<u64, ClientError> {
        self.call("getblockcount", &[]).await
    }

    async fn get_block_hash(&self, height: u64) -> Result<String, ClientError> {
        self.call("getblockhash", &[json!(height)])
            .await
            .map_err(|e| classify(e, RPC_INVALID_PARAMETER, || ClientError::HeightOutOfRange { height }))
    }

    async fn get_block(&self, hash: &str) -> Result<RawBlock, ClientError> {
        self.call("getblock", &[json!(hash), json!(2)]).await.map_err(|e| {
            classify(e, RPC_INVALID_ADDRESS_OR_KEY, || ClientError::BlockNotFound {
                hash: hash.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_indexer_config() {
        let indexer = IndexerConfig {
            rpc_user: Some("rpc".into()),
            rpc_password: Some("secret".into()),
            rpc_timeout_ms: 5_000,
            rpc_max_retries: 7,
            ..Default::default()
        };
        let cfg = HttpClientConfig::from(&indexer);
        assert_eq!(cfg.user.as_deref(), Some("rpc"));
        assert_eq!(cfg.backoff.retries, 7);
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn node_codes_map_to_typed_errors() {
        let beyond_tip = ClientError::Rpc {
            code: RPC_INVALID_PARAMETER,
            message: "Block height out of range".into(),
        };
        let mapped = classify(beyond_tip, RPC_INVALID_PARAMETER, || {
            ClientError::HeightOutOfRange { height: 9 }
        });
        assert!(mapped.is_out_of_range());

        let other = ClientError::Rpc {
            code: -1,
            message: "boom".into(),
        };
        let kept = classify(other, RPC_INVALID_PARAMETER, || {
            ClientError::HeightOutOfRange { height: 9 }
        });
        assert!(matches!(kept, ClientError::Rpc { code: -1, .. }));
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        let client = HttpChainClient::new(
            "http://127.0.0.1:1",
            HttpClientConfig {
                backoff: Backoff::default().with_retries(0),
                request_timeout: Duration::from_millis(200),
                ..Default::default()
            },
        )
        .unwrap();
        let err = client.get_block_count().await.unwrap_err();
        assert!(err.is_retryable(), "got {err:?}");
    }
}
