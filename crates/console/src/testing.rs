use async_trait::async_trait;
use setup_admin_remote::{
    ApiError, ApiResult, ClientInfo, ConfigService, ConfigStatus, ConfigUpdateResult,
    ConfigurationSnapshot, LoginResult, PurchaseCodeResult, PurchaseCodeStatus,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Scripted `ConfigService`. Queued responses are served first; an empty queue
/// answers with an `OK` result.
#[derive(Default)]
pub(crate) struct MockService {
    pub snapshot: ConfigurationSnapshot,
    pub login_responses: Mutex<VecDeque<ApiResult<LoginResult>>>,
    pub purchase_responses: Mutex<VecDeque<ApiResult<PurchaseCodeResult>>>,
    pub maps_responses: Mutex<VecDeque<ApiResult<ConfigUpdateResult>>>,
    pub firebase_responses: Mutex<VecDeque<ApiResult<ConfigUpdateResult>>>,
    pub disable_responses: Mutex<VecDeque<ApiResult<ConfigUpdateResult>>>,
    pub calls: Mutex<Vec<String>>,
    pub fetch_calls: AtomicU32,
    pub login_calls: AtomicU32,
    pub purchase_calls: AtomicU32,
    pub maps_calls: AtomicU32,
    pub firebase_calls: AtomicU32,
    pub disable_calls: AtomicU32,
}

impl MockService {
    pub fn with_snapshot(snapshot: ConfigurationSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    pub fn queue_login(&self, response: ApiResult<LoginResult>) {
        self.login_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_purchase(&self, response: ApiResult<PurchaseCodeResult>) {
        self.purchase_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_maps(&self, response: ApiResult<ConfigUpdateResult>) {
        self.maps_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_firebase(&self, response: ApiResult<ConfigUpdateResult>) {
        self.firebase_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_disable(&self, response: ApiResult<ConfigUpdateResult>) {
        self.disable_responses.lock().unwrap().push_back(response);
    }

    pub fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, counter: &AtomicU32, call: String) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);
    }
}

pub(crate) fn purchase(status: PurchaseCodeStatus, message: Option<&str>) -> PurchaseCodeResult {
    PurchaseCodeResult {
        status,
        message: message.map(String::from),
        clients: Vec::new(),
    }
}

pub(crate) fn client_found(ips: &[&str]) -> PurchaseCodeResult {
    PurchaseCodeResult {
        status: PurchaseCodeStatus::ClientFound,
        message: None,
        clients: ips
            .iter()
            .map(|ip| ClientInfo { ip: ip.to_string() })
            .collect(),
    }
}

pub(crate) fn rejected(message: Option<&str>) -> ConfigUpdateResult {
    ConfigUpdateResult {
        status: ConfigStatus::Invalid,
        message: message.map(String::from),
    }
}

pub(crate) fn transport_error() -> ApiError {
    ApiError::Api("connection reset by peer".into())
}

#[async_trait]
impl ConfigService for MockService {
    async fn current_configuration(&self) -> ApiResult<ConfigurationSnapshot> {
        self.record(&self.fetch_calls, "current_configuration".into());
        Ok(self.snapshot.clone())
    }

    async fn login(&self, username: &str, _password: &str) -> ApiResult<LoginResult> {
        self.record(&self.login_calls, format!("login {username}"));
        self.login_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(LoginResult {
                    token: "server-token".into(),
                })
            })
    }

    async fn update_purchase_code(
        &self,
        code: &str,
        email: Option<&str>,
    ) -> ApiResult<PurchaseCodeResult> {
        self.record(
            &self.purchase_calls,
            format!("update_purchase_code {code} {}", email.unwrap_or("-")),
        );
        self.purchase_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(purchase(PurchaseCodeStatus::Ok, None)))
    }

    async fn update_maps_api_key(
        &self,
        backend: &str,
        admin_panel: &str,
    ) -> ApiResult<ConfigUpdateResult> {
        self.record(
            &self.maps_calls,
            format!("update_maps_api_key {backend} {admin_panel}"),
        );
        self.maps_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ConfigUpdateResult::ok()))
    }

    async fn update_firebase(&self, key_file_name: &str) -> ApiResult<ConfigUpdateResult> {
        self.record(&self.firebase_calls, format!("update_firebase {key_file_name}"));
        self.firebase_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ConfigUpdateResult::ok()))
    }

    async fn disable_server(&self, ip: &str) -> ApiResult<ConfigUpdateResult> {
        self.record(&self.disable_calls, format!("disable_server {ip}"));
        self.disable_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ConfigUpdateResult::ok()))
    }
}
