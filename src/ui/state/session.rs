use serde::{Deserialize, Serialize};

const PROTECTED_ROUTES: [&str; 2] = ["/dashboard", "/profile"];

/// Session presence, resolved once by the session provider and passed down.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn {
        token: String,
    },
}

impl AuthState {
    /// A stored token, or being on a protected route, counts as signed in.
    pub fn resolve(token: Option<&str>, path: &str) -> Self {
        match token.filter(|token| !token.is_empty()) {
            Some(token) => AuthState::SignedIn {
                token: token.to_string(),
            },
            None if is_protected_route(path) => AuthState::SignedIn {
                token: String::new(),
            },
            None => AuthState::SignedOut,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }
}

pub fn is_protected_route(path: &str) -> bool {
    PROTECTED_ROUTES.iter().any(|route| path.starts_with(route))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderAction {
    SubmitProject,
    Dashboard,
    Profile,
    SignOut,
    SignIn,
    JoinCommunity,
}

impl HeaderAction {
    pub fn label(self) -> &'static str {
        match self {
            HeaderAction::SubmitProject => "Submit Project",
            HeaderAction::Dashboard => "Dashboard",
            HeaderAction::Profile => "Profile",
            HeaderAction::SignOut => "Sign Out",
            HeaderAction::SignIn => "Sign in",
            HeaderAction::JoinCommunity => "Join Community",
        }
    }

    /// Link target; `None` for actions handled in place.
    pub fn href(self) -> Option<&'static str> {
        match self {
            HeaderAction::SubmitProject => Some("/dashboard/new-project"),
            HeaderAction::Dashboard => Some("/dashboard"),
            HeaderAction::Profile => Some("/profile"),
            HeaderAction::SignOut => None,
            HeaderAction::SignIn => Some("/signin"),
            HeaderAction::JoinCommunity => Some("/discord"),
        }
    }
}

pub fn header_actions(auth: &AuthState) -> Vec<HeaderAction> {
    let mut actions = vec![HeaderAction::SubmitProject];
    if auth.is_signed_in() {
        actions.extend([
            HeaderAction::Dashboard,
            HeaderAction::Profile,
            HeaderAction::SignOut,
        ]);
    } else {
        actions.extend([HeaderAction::SignIn, HeaderAction::JoinCommunity]);
    }
    actions
}
