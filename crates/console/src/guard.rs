use setup_admin_remote::{ApiResult, SessionStore};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Config,
}

impl Route {
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Route),
}

/// Explicit handle on the session slot, shared by the guard and the login controller.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Present, non-empty token. Storage failures read as "no token".
    pub fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Could not read session token: {e}");
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> ApiResult<()> {
        self.store.store(token)
    }

    pub fn clear(&self) -> ApiResult<()> {
        self.store.clear()
    }
}

pub struct SessionGuard {
    session: SessionContext,
}

impl SessionGuard {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn can_activate(&self, route: Route) -> GuardDecision {
        if !route.is_protected() || self.session.token().is_some() {
            return GuardDecision::Allow;
        }
        tracing::debug!(?route, "No session token, redirecting to login");
        GuardDecision::Redirect(Route::Login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setup_admin_remote::{ApiError, MemorySessionStore};

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn load(&self) -> ApiResult<Option<String>> {
            Err(ApiError::Session("corrupt".into()))
        }
        fn store(&self, _token: &str) -> ApiResult<()> {
            Ok(())
        }
        fn clear(&self) -> ApiResult<()> {
            Ok(())
        }
    }

    fn guard_with(store: impl SessionStore + 'static) -> SessionGuard {
        SessionGuard::new(SessionContext::new(Arc::new(store)))
    }

    #[test]
    fn allows_protected_route_with_token() {
        let guard = guard_with(MemorySessionStore::with_token("tok"));
        assert_eq!(guard.can_activate(Route::Config), GuardDecision::Allow);
    }

    #[test]
    fn redirects_to_login_without_token() {
        let guard = guard_with(MemorySessionStore::new());
        assert_eq!(
            guard.can_activate(Route::Config),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let guard = guard_with(MemorySessionStore::with_token(""));
        assert_eq!(
            guard.can_activate(Route::Config),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn login_route_is_always_open() {
        let guard = guard_with(MemorySessionStore::new());
        assert_eq!(guard.can_activate(Route::Login), GuardDecision::Allow);
    }

    #[test]
    fn unreadable_store_denies_entry() {
        let guard = guard_with(BrokenStore);
        assert_eq!(
            guard.can_activate(Route::Config),
            GuardDecision::Redirect(Route::Login)
        );
    }
}
