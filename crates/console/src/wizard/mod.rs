//! Setup wizard: purchase verification, map API keys, then the Firebase key.

use crate::config::{PurchaseCodePolicy, WizardConfig};
use crate::notice::Notices;
use setup_admin_remote::{
    ApiError, ApiResult, ConfigService, ConfigurationSnapshot, PurchaseCodeStatus,
};
use std::sync::Arc;
use thiserror::Error;

mod reconcile;
mod step;
mod upload;

pub use reconcile::{DeviceReconciliation, TITLE as RECONCILIATION_TITLE};
pub use step::WizardStep;
pub use upload::UploadEvent;

const INVALID_MAPS_KEYS: &str = "Google Maps API Keys seem invalid.";
const INVALID_FIREBASE_KEY: &str = "Firebase Project key seems invalid.";
const INVALID_PURCHASE_CODE: &str = "Purchase code is invalid, but continuing with the process.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Advanced { from: WizardStep, to: WizardStep },
    Retreated { from: WizardStep, to: WizardStep },
    /// Purchase code is bound to active devices; the reconciliation sub-flow is open.
    Suspended { candidates: Vec<String> },
    /// Reconciliation finished and the main flow is back in control.
    Resumed,
    Unchanged,
    Configured,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Request failed: {0}")]
    Transport(#[from] ApiError),

    #[error("Resolve the active device conflict first.")]
    ReconciliationPending,

    #[error("Select a device to disable.")]
    NoDeviceSelected,

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("A request is already in progress.")]
    Busy,
}

pub struct ConfigWizard {
    service: Arc<dyn ConfigService>,
    options: WizardConfig,
    step: WizardStep,
    snapshot: ConfigurationSnapshot,
    email: Option<String>,
    configured: bool,
    reconciliation: Option<DeviceReconciliation>,
    pub notices: Notices,
}

impl ConfigWizard {
    pub fn new(
        service: Arc<dyn ConfigService>,
        options: WizardConfig,
        snapshot: ConfigurationSnapshot,
    ) -> Self {
        Self {
            service,
            options,
            step: WizardStep::FIRST,
            snapshot,
            email: None,
            configured: false,
            reconciliation: None,
            notices: Notices::default(),
        }
    }

    /// Fetches the current configuration once and starts at the first step.
    pub async fn enter(service: Arc<dyn ConfigService>, options: WizardConfig) -> ApiResult<Self> {
        let snapshot = service.current_configuration().await?;
        tracing::info!("Loaded current configuration");
        Ok(Self::new(service, options, snapshot))
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn snapshot(&self) -> &ConfigurationSnapshot {
        &self.snapshot
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn reconciliation(&self) -> Option<&DeviceReconciliation> {
        self.reconciliation.as_ref()
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = Some(email.to_string()).filter(|e| !e.is_empty());
    }

    pub fn set_purchase_code(&mut self, code: &str) {
        self.snapshot.purchase_code = Some(code.to_string());
    }

    pub fn set_admin_panel_api_key(&mut self, key: &str) {
        self.snapshot.admin_panel_api_key = Some(key.to_string());
    }

    pub fn set_backend_maps_api_key(&mut self, key: &str) {
        self.snapshot.backend_maps_api_key = Some(key.to_string());
    }

    pub async fn advance(&mut self) -> Result<Transition, WizardError> {
        if self.reconciliation.is_some() {
            return self.fail(WizardError::ReconciliationPending);
        }
        match self.step {
            WizardStep::PurchaseVerification => self.submit_purchase_code().await,
            WizardStep::ApiKeys => self.submit_maps_keys().await,
            WizardStep::Firebase => Ok(Transition::Unchanged),
        }
    }

    pub fn retreat(&mut self) -> Transition {
        if self.reconciliation.is_some() || self.step == WizardStep::FIRST {
            return Transition::Unchanged;
        }
        let from = self.step;
        self.step = from.previous();
        tracing::debug!(from = from.index(), to = self.step.index(), "Wizard stepped back");
        Transition::Retreated {
            from,
            to: self.step,
        }
    }

    pub async fn complete(&mut self) -> Result<Transition, WizardError> {
        if self.configured {
            return Ok(Transition::Configured);
        }
        if self.reconciliation.is_some() {
            return self.fail(WizardError::ReconciliationPending);
        }
        if self.step != WizardStep::LAST {
            return self.fail(WizardError::Validation(
                "Finish the previous steps first.".to_string(),
            ));
        }

        let key_file = match self.snapshot.firebase_project_private_key.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return self.fail(WizardError::Validation(INVALID_FIREBASE_KEY.to_string())),
        };

        let result = match self.service.update_firebase(&key_file).await {
            Ok(result) => result,
            Err(e) => return self.fail(WizardError::Transport(e)),
        };

        if result.is_ok() {
            self.configured = true;
            tracing::info!("Backend configuration completed");
            Ok(Transition::Configured)
        } else {
            let message = result.message.unwrap_or_else(|| "Unknown error".to_string());
            self.fail(WizardError::Rejected(message))
        }
    }

    /// Local only: the key reference is persisted remotely by `complete`.
    pub fn handle_upload(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Uploading { .. } => {}
            UploadEvent::Done { name } => {
                self.notices
                    .success(format!("{name} file uploaded successfully."));
                self.snapshot.firebase_project_private_key = Some(name);
            }
            UploadEvent::Failed { name } => {
                self.notices.error(format!("{name} file upload failed."));
            }
        }
    }

    pub fn select_device(&mut self, ip: &str) -> Result<(), WizardError> {
        let outcome = match self.reconciliation.as_mut() {
            Some(flow) => flow.select(ip),
            None => Err(WizardError::Validation(
                "No device conflict to resolve.".to_string(),
            )),
        };
        if let Err(e) = outcome {
            self.notices.error(e.to_string());
            return Err(e);
        }
        Ok(())
    }

    /// Disables the selected device and closes the reconciliation sub-flow.
    /// The purchase-code step is not re-submitted.
    pub async fn deactivate(&mut self) -> Result<Transition, WizardError> {
        let begun = match self.reconciliation.as_mut() {
            Some(flow) => flow.begin(),
            None => return Ok(Transition::Unchanged),
        };
        let ip = match begun {
            Ok(ip) => ip,
            Err(e) => return self.fail(e),
        };

        let outcome = match self.service.disable_server(&ip).await {
            Ok(result) if result.is_ok() => Ok(()),
            Ok(result) => Err(WizardError::Rejected(
                result.message.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            Err(e) => Err(WizardError::Transport(e)),
        };

        match outcome {
            Ok(()) => {
                self.reconciliation = None;
                tracing::info!(device = %ip, "Disabled device bound to the purchase code");
                self.notices.success("Disable was successful.");
                self.notices
                    .info("Submit the purchase code again to continue.");
                Ok(Transition::Resumed)
            }
            Err(e) => {
                if let Some(flow) = self.reconciliation.as_mut() {
                    flow.abort();
                }
                self.fail(e)
            }
        }
    }

    async fn submit_purchase_code(&mut self) -> Result<Transition, WizardError> {
        let code = self.snapshot.purchase_code.clone().unwrap_or_default();
        let result = match self
            .service
            .update_purchase_code(&code, self.email.as_deref())
            .await
        {
            Ok(result) => result,
            Err(e) => return self.fail(WizardError::Transport(e)),
        };
        tracing::debug!(status = ?result.status, "Purchase code submitted");

        match result.status {
            PurchaseCodeStatus::ClientFound => {
                let candidates = result.client_ips();
                if candidates.is_empty() {
                    return self.fail(WizardError::Rejected(
                        "Purchase code is bound to active devices, but none were listed."
                            .to_string(),
                    ));
                }
                tracing::info!(count = candidates.len(), "Purchase code already in use");
                self.reconciliation = Some(DeviceReconciliation::new(candidates.clone()));
                return Ok(Transition::Suspended { candidates });
            }
            PurchaseCodeStatus::Invalid => {
                let message = result
                    .message
                    .unwrap_or_else(|| INVALID_PURCHASE_CODE.to_string());
                if self.options.purchase_code_policy == PurchaseCodePolicy::Enforced {
                    return self.fail(WizardError::Rejected(message));
                }
                tracing::warn!("Purchase code check failed, continuing: {message}");
            }
            PurchaseCodeStatus::Ok | PurchaseCodeStatus::Unknown => {}
        }

        Ok(self.step_forward())
    }

    async fn submit_maps_keys(&mut self) -> Result<Transition, WizardError> {
        let min_len = self.options.min_api_key_len;
        let long_enough = |key: &Option<String>| {
            key.as_deref()
                .filter(|k| k.chars().count() >= min_len)
                .map(String::from)
        };

        let (admin_panel, backend) = match (
            long_enough(&self.snapshot.admin_panel_api_key),
            long_enough(&self.snapshot.backend_maps_api_key),
        ) {
            (Some(admin_panel), Some(backend)) => (admin_panel, backend),
            _ => return self.fail(WizardError::Validation(INVALID_MAPS_KEYS.to_string())),
        };

        let result = match self.service.update_maps_api_key(&backend, &admin_panel).await {
            Ok(result) => result,
            Err(e) => return self.fail(WizardError::Transport(e)),
        };

        if result.is_ok() {
            Ok(self.step_forward())
        } else {
            let message = result.message.unwrap_or_else(|| "Unknown Error".to_string());
            self.fail(WizardError::Rejected(message))
        }
    }

    fn step_forward(&mut self) -> Transition {
        let from = self.step;
        self.step = from.next();
        tracing::info!(from = from.index(), to = self.step.index(), "Wizard advanced");
        Transition::Advanced {
            from,
            to: self.step,
        }
    }

    /// Reports `error` to the operator. Transport failures get the short
    /// operator message; the full error only goes to the log.
    fn fail<T>(&mut self, error: WizardError) -> Result<T, WizardError> {
        match error {
            WizardError::Transport(ref e) => {
                tracing::warn!(step = self.step.index(), "Wizard request failed: {e}");
                self.notices.error(e.user_message());
            }
            ref other => self.notices.error(other.to_string()),
        }
        Err(error)
    }
}
