use reqwest::header::{ACCEPT, COOKIE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::core::auth::SessionCookie;
use crate::core::policy::ResetGrant;
use crate::core::service::wire::{CreditInfo, RecoveryInfo, ResetInfo};
use crate::core::service::{validate_endpoint, AccountSource, Operation, ResetAction, ServiceError};

/// Everything needed to talk to the service. Built once per invocation and
/// never mutated.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub cookie: SessionCookie,
}

impl ClientConfig {
    pub fn url(&self, operation: Operation) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), operation.path())
    }
}

/// Cookie-authenticated JSON client for the account endpoints.
pub struct HttpAccountService {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpAccountService {
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        validate_endpoint(&config.base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            config,
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        operation: Operation,
    ) -> Result<T, ServiceError> {
        let url = self.config.url(operation);
        tracing::info!(%operation, %method, %url, "sending request");

        let response = self
            .http
            .request(method, &url)
            .header(COOKIE, self.config.cookie.as_str())
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        tracing::debug!(%operation, status = status.as_u16(), %body, "received response");

        if !status.is_success() {
            return Err(ServiceError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ServiceError::Decode {
            operation,
            message: e.to_string(),
        })
    }
}

impl AccountSource for HttpAccountService {
    async fn credit_info(&self) -> Result<CreditInfo, ServiceError> {
        self.request(Method::GET, Operation::CreditInfo).await
    }

    async fn recovery_info(&self) -> Result<RecoveryInfo, ServiceError> {
        self.request(Method::GET, Operation::RecoveryInfo).await
    }

    async fn reset_info(&self) -> Result<ResetInfo, ServiceError> {
        self.request(Method::GET, Operation::ResetInfo).await
    }
}

impl ResetAction for HttpAccountService {
    async fn reset(&self, grant: ResetGrant) -> Result<serde_json::Value, ServiceError> {
        tracing::info!(
            remaining_resets = grant.remaining_resets(),
            "triggering manual credit reset"
        );
        self.request(Method::POST, Operation::Reset).await
    }
}
