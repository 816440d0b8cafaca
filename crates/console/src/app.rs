use crate::config::Config;
use crate::guard::{GuardDecision, Route, SessionContext, SessionGuard};
use crate::login::{LoginController, LoginOutcome};
use crate::notice::{Notice, Notices};
use crate::wizard::ConfigWizard;
use setup_admin_remote::ConfigService;
use std::sync::Arc;

/// Routes operator intents to the login controller or the setup wizard,
/// consulting the session guard before any protected view is entered.
pub struct AdminApp {
    config: Config,
    service: Arc<dyn ConfigService>,
    session: SessionContext,
    guard: SessionGuard,
    route: Route,
    pub login: LoginController,
    pub wizard: Option<ConfigWizard>,
    notices: Notices,
}

impl AdminApp {
    pub fn new(config: Config, service: Arc<dyn ConfigService>, session: SessionContext) -> Self {
        let login = LoginController::new(service.clone(), session.clone())
            .with_failure_token(config.auth.failure_token.clone());
        Self {
            guard: SessionGuard::new(session.clone()),
            config,
            service,
            session,
            route: Route::Login,
            login,
            wizard: None,
            notices: Notices::default(),
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Applies the guard and lands on the resulting route. Entering the
    /// config view loads the wizard on first visit.
    pub async fn navigate(&mut self, target: Route) -> Route {
        let destination = match self.guard.can_activate(target) {
            GuardDecision::Allow => target,
            GuardDecision::Redirect(to) => to,
        };

        if destination == Route::Config && self.wizard.is_none() {
            match ConfigWizard::enter(self.service.clone(), self.config.wizard.clone()).await {
                Ok(wizard) => self.wizard = Some(wizard),
                Err(e) => {
                    self.notices
                        .error(format!("Could not load current configuration: {e}"));
                    self.route = Route::Login;
                    return self.route;
                }
            }
        }

        self.route = destination;
        self.route
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Route {
        match self.login.authenticate(username, password).await {
            LoginOutcome::Navigate(route) => self.navigate(route).await,
            LoginOutcome::Rejected => self.route,
        }
    }

    pub fn logout(&mut self) -> Route {
        let LoginOutcome::Navigate(route) = self.login.logout() else {
            return self.route;
        };
        self.wizard = None;
        self.route = route;
        self.route
    }

    /// The wizard, if the guard still allows the config view.
    pub async fn protected_wizard(&mut self) -> Option<&mut ConfigWizard> {
        if self.navigate(Route::Config).await != Route::Config {
            self.notices.error("Please sign in first.");
            return None;
        }
        self.wizard.as_mut()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut all = self.notices.drain();
        all.extend(self.login.notices.drain());
        if let Some(wizard) = self.wizard.as_mut() {
            all.extend(wizard.notices.drain());
        }
        all
    }
}
