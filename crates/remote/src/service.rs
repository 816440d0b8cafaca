use crate::error::ApiResult;
use crate::types::{ConfigUpdateResult, ConfigurationSnapshot, LoginResult, PurchaseCodeResult};
use async_trait::async_trait;

/// Operations the admin console consumes from the backend.
///
/// Each method is exactly one remote call; implementations must not retry.
/// A returned `Ok` only means the call completed: callers interpret the
/// status carried by the result themselves.
#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn current_configuration(&self) -> ApiResult<ConfigurationSnapshot>;

    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResult>;

    async fn update_purchase_code(
        &self,
        code: &str,
        email: Option<&str>,
    ) -> ApiResult<PurchaseCodeResult>;

    async fn update_maps_api_key(
        &self,
        backend: &str,
        admin_panel: &str,
    ) -> ApiResult<ConfigUpdateResult>;

    async fn update_firebase(&self, key_file_name: &str) -> ApiResult<ConfigUpdateResult>;

    async fn disable_server(&self, ip: &str) -> ApiResult<ConfigUpdateResult>;
}
