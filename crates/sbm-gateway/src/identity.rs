//! HTTP client for the identity store

use crate::api::IdentityStore;
use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::transport::{HttpTransport, NO_QUERY};
use crate::types::IdentityRecord;
use async_trait::async_trait;

/// Identity store gateway over HTTP
#[derive(Debug, Clone)]
pub struct IdentityStoreClient {
    http: HttpTransport,
}

impl IdentityStoreClient {
    /// Create client; the store is read only so the run mode is ignored
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        Ok(Self {
            http: HttpTransport::new(config)?,
        })
    }
}

#[async_trait]
impl IdentityStore for IdentityStoreClient {
    async fn get_identity(&self, identity: &str) -> GatewayResult<Option<IdentityRecord>> {
        let url = self.http.endpoint(&format!("identity/{identity}"));
        match self.http.get_json(&url, NO_QUERY).await {
            Ok(record) => Ok(Some(record)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }
}
