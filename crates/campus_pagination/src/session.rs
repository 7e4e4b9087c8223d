pub const USER_ID_ENV_VAR: &str = "CAMPUS_USER_ID";

/// Read access to the signed-in user, injected wherever a handler needs to
/// stamp a request with "who did this".
pub trait SessionAccessor: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Fixed user, for tests and scripted runs.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    user_id: Option<String>,
}

impl StaticSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        StaticSession {
            user_id: Some(user_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        StaticSession { user_id: None }
    }
}

impl SessionAccessor for StaticSession {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

/// Reads the user id from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvSession {
    var_name: String,
}

impl EnvSession {
    pub fn new(var_name: impl Into<String>) -> Self {
        EnvSession {
            var_name: var_name.into(),
        }
    }
}

impl Default for EnvSession {
    fn default() -> Self {
        EnvSession::new(USER_ID_ENV_VAR)
    }
}

impl SessionAccessor for EnvSession {
    fn current_user_id(&self) -> Option<String> {
        std::env::var(&self.var_name)
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }
}
