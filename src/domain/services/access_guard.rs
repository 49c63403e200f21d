#[cfg(test)]
#[path = "access_guard_test.rs"]
mod tests;

use crate::domain::models::Session;
use crate::domain::models::View;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny { redirect: View },
}

/// Decides whether a view may be entered. Evaluated on every navigation and
/// again before every protected dispatch, never cached.
pub struct AccessGuard {}

impl AccessGuard {
    pub fn evaluate(session: Option<&Session>, view: View) -> Access {
        if !view.is_protected() {
            return Access::Allow;
        }

        let authenticated = session
            .map(|e| return e.is_authenticated())
            .unwrap_or(false);
        if authenticated {
            return Access::Allow;
        }

        tracing::debug!(view = %view, "Redirecting unauthenticated user to login");
        return Access::Deny {
            redirect: View::Login,
        };
    }
}
