use crate::error::ClientError;
use crate::forms::{LoginForm, RegisterForm};
use crate::router::{Navigation, Route};
use crate::session::SessionContext;

use super::describe;

const INVALID_CREDENTIALS: &str = "Invalid username or password.";
const LOGIN_FAILED: &str = "Login failed.";
const REGISTER_FAILED: &str = "Registration failed.";

#[derive(Debug, Default)]
pub struct LoginPage {
    pub form: LoginForm,
    error: Option<String>,
}

impl LoginPage {
    pub fn new(form: LoginForm) -> Self {
        Self { form, error: None }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Home on success; otherwise stays on the login page with a message and
    /// nothing persisted.
    pub async fn submit(&mut self, ctx: &mut SessionContext) -> Navigation {
        self.error = None;
        match ctx.login(&self.form).await {
            Ok(_) => Navigation::Redirect(Route::Home),
            Err(e) => {
                self.error = Some(match e {
                    ClientError::Unauthorized => INVALID_CREDENTIALS.to_string(),
                    ref other => describe(other, LOGIN_FAILED),
                });
                Navigation::Render(Route::Login)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RegisterPage {
    pub form: RegisterForm,
    error: Option<String>,
}

impl RegisterPage {
    pub fn new(form: RegisterForm) -> Self {
        Self { form, error: None }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn submit(&mut self, ctx: &mut SessionContext) -> Navigation {
        self.error = None;
        match ctx.register(&self.form).await {
            Ok(_) => Navigation::Redirect(Route::Home),
            Err(e) => {
                self.error = Some(describe(&e, REGISTER_FAILED));
                Navigation::Render(Route::Register)
            }
        }
    }
}
