use crate::error::{ApiError, ApiResult};
use crate::service::ConfigService;
use crate::session::SessionStore;
use crate::types::{ConfigUpdateResult, ConfigurationSnapshot, LoginResult, PurchaseCodeResult};
use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const CURRENT_CONFIGURATION: &str = "query CurrentConfiguration { currentConfiguration { purchaseCode adminPanelAPIKey backendMapsAPIKey firebaseProjectPrivateKey } }";
const LOGIN: &str =
    "query Login($username: String!, $password: String!) { login(userName: $username, password: $password) { token } }";
const UPDATE_PURCHASE_CODE: &str = "mutation UpdatePurchaseCode($code: String!, $email: String) { updatePurchaseCode(input: { purchaseCode: $code, email: $email }) { status message clients { ip } } }";
const UPDATE_MAPS_API_KEY: &str = "mutation UpdateMapsAPIKey($backend: String!, $adminPanel: String!) { updateMapsAPIKey(backend: $backend, adminPanel: $adminPanel) { status message } }";
const UPDATE_FIREBASE: &str = "mutation UpdateFirebase($keyFileName: String!) { updateFirebase(keyFileName: $keyFileName) { status message } }";
const DISABLE_SERVER: &str =
    "mutation DisableServer($ip: String!) { disableServer(ip: $ip) { status message } }";

/// GraphQL-over-HTTP client for the backend's configuration API.
#[derive(Clone)]
pub struct GraphqlClient {
    http: Client,
    root: Url,
    session: Option<Arc<dyn SessionStore>>,
}

impl GraphqlClient {
    pub fn new(root: &str, timeout: Duration) -> ApiResult<Self> {
        let mut root = root.to_string();
        if !root.ends_with('/') {
            root.push('/');
        }
        let root = Url::parse(&root).map_err(|e| ApiError::Api(format!("Invalid root URL: {e}")))?;

        let http = Client::builder()
            .user_agent("setup-admin/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            http,
            root,
            session: None,
        })
    }

    /// Reads the bearer token from the session slot on every request, so a
    /// login performed after construction is picked up.
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    fn bearer(&self) -> Option<String> {
        let store = self.session.as_ref()?;
        match store.load() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::debug!("No bearer available: {e}");
                None
            }
        }
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.root
            .join(path)
            .map_err(|e| ApiError::Api(format!("Invalid endpoint {path}: {e}")))
    }

    /// Posts `query` and decodes `data.<field>` from the response.
    async fn execute<T: DeserializeOwned>(
        &self,
        field: &str,
        query: &str,
        variables: Value,
    ) -> ApiResult<T> {
        let mut request = self
            .http
            .post(self.endpoint("graphql")?)
            .json(&json!({ "query": query, "variables": variables }));

        if let Some(bearer) = self.bearer() {
            request = request.header("Authorization", format!("Bearer {}", bearer));
        }

        tracing::debug!(field, "Sending GraphQL request");
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth(format!("{field}: HTTP {status}")));
        }

        let body: Value = response.json().await?;
        extract_field(body, field)
    }

    /// Uploads a Firebase service-account key file and returns the name the
    /// backend stores it under.
    pub async fn upload_key_file(&self, path: &Path) -> ApiResult<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| ApiError::Api(format!("Not a file path: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;

        let part = multipart::Part::bytes(bytes).file_name(file_name.clone());
        let form = multipart::Form::new().part("file", part);

        let mut request = self.http.post(self.endpoint("upload")?).multipart(form);
        if let Some(bearer) = self.bearer() {
            request = request.header("Authorization", format!("Bearer {}", bearer));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Api(format!(
                "Upload of {} failed: {}",
                file_name,
                response.status()
            )));
        }

        tracing::info!(file = %file_name, "Key file uploaded");
        Ok(file_name)
    }
}

/// Pulls `data.<field>` out of a GraphQL response body, surfacing the first
/// entry of `errors` when the server reported any.
fn extract_field<T: DeserializeOwned>(body: Value, field: &str) -> ApiResult<T> {
    if let Some(errors) = body.get("errors").and_then(|v| v.as_array()) {
        if let Some(first) = errors.first() {
            let message = first
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            return Err(ApiError::GraphQl(message));
        }
    }

    let value = body
        .get("data")
        .and_then(|d| d.get(field))
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| ApiError::Decode(format!("response has no data.{field}")))?;

    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl ConfigService for GraphqlClient {
    async fn current_configuration(&self) -> ApiResult<ConfigurationSnapshot> {
        self.execute("currentConfiguration", CURRENT_CONFIGURATION, json!({}))
            .await
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResult> {
        self.execute(
            "login",
            LOGIN,
            json!({ "username": username, "password": password }),
        )
        .await
    }

    async fn update_purchase_code(
        &self,
        code: &str,
        email: Option<&str>,
    ) -> ApiResult<PurchaseCodeResult> {
        self.execute(
            "updatePurchaseCode",
            UPDATE_PURCHASE_CODE,
            json!({ "code": code, "email": email }),
        )
        .await
    }

    async fn update_maps_api_key(
        &self,
        backend: &str,
        admin_panel: &str,
    ) -> ApiResult<ConfigUpdateResult> {
        self.execute(
            "updateMapsAPIKey",
            UPDATE_MAPS_API_KEY,
            json!({ "backend": backend, "adminPanel": admin_panel }),
        )
        .await
    }

    async fn update_firebase(&self, key_file_name: &str) -> ApiResult<ConfigUpdateResult> {
        self.execute(
            "updateFirebase",
            UPDATE_FIREBASE,
            json!({ "keyFileName": key_file_name }),
        )
        .await
    }

    async fn disable_server(&self, ip: &str) -> ApiResult<ConfigUpdateResult> {
        self.execute("disableServer", DISABLE_SERVER, json!({ "ip": ip }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConfigStatus;

    #[test]
    fn root_without_trailing_slash_keeps_its_path() {
        let client =
            GraphqlClient::new("http://localhost:3000/api", Duration::from_secs(5)).expect("client");
        assert_eq!(
            client.endpoint("graphql").expect("endpoint").as_str(),
            "http://localhost:3000/api/graphql"
        );
        assert_eq!(
            client.endpoint("upload").expect("endpoint").as_str(),
            "http://localhost:3000/api/upload"
        );
    }

    #[test]
    fn bearer_follows_the_session_store() {
        let store = Arc::new(crate::session::MemorySessionStore::new());
        let client = GraphqlClient::new("http://localhost:3000/", Duration::from_secs(5))
            .expect("client")
            .with_session_store(store.clone());
        assert_eq!(client.bearer(), None);

        store.store("fresh-token").expect("store");
        assert_eq!(client.bearer().as_deref(), Some("fresh-token"));

        store.clear().expect("clear");
        assert_eq!(client.bearer(), None);
    }

    #[test]
    fn rejects_unparseable_root() {
        assert!(GraphqlClient::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn extracts_operation_payload() {
        let body = json!({
            "data": { "updateFirebase": { "status": "OK", "message": null } }
        });
        let result: ConfigUpdateResult =
            extract_field(body, "updateFirebase").expect("payload");
        assert_eq!(result.status, ConfigStatus::Ok);
    }

    #[test]
    fn graphql_errors_take_precedence() {
        let body = json!({
            "data": null,
            "errors": [{ "message": "Invalid credentials" }, { "message": "second" }]
        });
        let err = extract_field::<LoginResult>(body, "login").unwrap_err();
        assert!(matches!(err, ApiError::GraphQl(ref m) if m == "Invalid credentials"));
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        let err = extract_field::<LoginResult>(json!({ "data": {} }), "login").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn each_query_selects_the_field_it_is_decoded_from() {
        let pairs = [
            ("currentConfiguration", CURRENT_CONFIGURATION),
            ("login", LOGIN),
            ("updatePurchaseCode", UPDATE_PURCHASE_CODE),
            ("updateMapsAPIKey", UPDATE_MAPS_API_KEY),
            ("updateFirebase", UPDATE_FIREBASE),
            ("disableServer", DISABLE_SERVER),
        ];
        for (field, query) in pairs {
            assert!(
                query.contains(&format!("{{ {field}")),
                "{field} missing from query"
            );
        }
    }
}
