use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
}

impl Route {
    /// Unknown paths fall through to home.
    pub fn from_path(path: &str) -> Route {
        match normalized(path) {
            "/login" => Route::Login,
            "/register" => Route::Register,
            _ => Route::Home,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Home => "/",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Home)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

impl Navigation {
    pub fn route(&self) -> Route {
        match self {
            Navigation::Render(r) | Navigation::Redirect(r) => *r,
        }
    }
}

pub struct Router;

impl Router {
    pub fn resolve(path: &str, authenticated: bool) -> Navigation {
        let route = Route::from_path(path);
        if route.requires_auth() && !authenticated {
            return Navigation::Redirect(Route::Login);
        }
        if route.path() != normalized(path) {
            return Navigation::Redirect(route);
        }
        Navigation::Render(route)
    }
}

fn normalized(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    }
}
