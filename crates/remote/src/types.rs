use serde::{Deserialize, Serialize};

/// Server-held configuration the setup wizard edits field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSnapshot {
    pub purchase_code: Option<String>,
    #[serde(rename = "adminPanelAPIKey")]
    pub admin_panel_api_key: Option<String>,
    #[serde(rename = "backendMapsAPIKey")]
    pub backend_maps_api_key: Option<String>,
    pub firebase_project_private_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseCodeStatus {
    Ok,
    Invalid,
    ClientFound,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigStatus {
    Ok,
    Invalid,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseCodeResult {
    pub status: PurchaseCodeStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub clients: Vec<ClientInfo>,
}

impl PurchaseCodeResult {
    pub fn client_ips(&self) -> Vec<String> {
        self.clients.iter().map(|c| c.ip.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdateResult {
    pub status: ConfigStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl ConfigUpdateResult {
    pub fn ok() -> Self {
        Self {
            status: ConfigStatus::Ok,
            message: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ConfigStatus::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub token: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ClientInfo>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ClientInfo>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_server_field_names() {
        let snapshot: ConfigurationSnapshot = serde_json::from_value(serde_json::json!({
            "purchaseCode": "abc-123",
            "adminPanelAPIKey": "AIzaAdminKey",
            "backendMapsAPIKey": null,
            "firebaseProjectPrivateKey": "project.json"
        }))
        .expect("decode snapshot");

        assert_eq!(snapshot.purchase_code.as_deref(), Some("abc-123"));
        assert_eq!(snapshot.admin_panel_api_key.as_deref(), Some("AIzaAdminKey"));
        assert_eq!(snapshot.backend_maps_api_key, None);
        assert_eq!(
            snapshot.firebase_project_private_key.as_deref(),
            Some("project.json")
        );
    }

    #[test]
    fn purchase_result_with_null_clients() {
        let result: PurchaseCodeResult = serde_json::from_value(serde_json::json!({
            "status": "INVALID",
            "message": "code already used",
            "clients": null
        }))
        .expect("decode result");

        assert_eq!(result.status, PurchaseCodeStatus::Invalid);
        assert!(result.clients.is_empty());
    }

    #[test]
    fn client_found_lists_ips() {
        let result: PurchaseCodeResult = serde_json::from_value(serde_json::json!({
            "status": "CLIENT_FOUND",
            "clients": [{ "ip": "10.0.0.1" }, { "ip": "10.0.0.2" }]
        }))
        .expect("decode result");

        assert_eq!(result.status, PurchaseCodeStatus::ClientFound);
        assert_eq!(result.client_ips(), vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn unrecognised_status_decodes_as_unknown() {
        let result: ConfigUpdateResult =
            serde_json::from_value(serde_json::json!({ "status": "QUOTA_EXCEEDED" }))
                .expect("decode result");
        assert_eq!(result.status, ConfigStatus::Unknown);
        assert!(!result.is_ok());
    }
}
