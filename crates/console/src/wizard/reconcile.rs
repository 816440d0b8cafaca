use super::WizardError;

pub const TITLE: &str = "License Verification";

/// Modal sub-state entered when the purchase code is already bound to active
/// installations. The operator picks one of them to disable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReconciliation {
    candidates: Vec<String>,
    selected: Option<String>,
    in_flight: bool,
}

impl DeviceReconciliation {
    pub fn new(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            selected: None,
            in_flight: false,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn select(&mut self, ip: &str) -> Result<(), WizardError> {
        if !self.candidates.iter().any(|c| c == ip) {
            return Err(WizardError::UnknownDevice(ip.to_string()));
        }
        self.selected = Some(ip.to_string());
        Ok(())
    }

    /// Marks the disable request as started and hands back the device to disable.
    pub(super) fn begin(&mut self) -> Result<String, WizardError> {
        if self.in_flight {
            return Err(WizardError::Busy);
        }
        let ip = self.selected.clone().ok_or(WizardError::NoDeviceSelected)?;
        self.in_flight = true;
        Ok(ip)
    }

    pub(super) fn abort(&mut self) {
        self.in_flight = false;
    }
}
