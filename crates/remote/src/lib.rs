pub mod error;
pub mod graphql;
pub mod service;
pub mod session;
pub mod types;

pub use error::{redact_secrets, ApiError, ApiResult};
pub use graphql::GraphqlClient;
pub use service::ConfigService;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use types::*;
