use std::fmt;

use serde::{Deserialize, Serialize};

/// Landing page unauthenticated visitors are sent back to.
pub const SIGNED_OUT_REDIRECT: &str = "/";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a learner's session is in its lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState<Id> {
    #[default]
    Absent,
    /// A token was presented but the profile has not been resolved yet.
    Pending,
    Established { user_id: Id, role: Role },
}

impl<Id> SessionState<Id> {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Established { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            SessionState::Established { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&Id> {
        match self {
            SessionState::Established { user_id, .. } => Some(user_id),
            _ => None,
        }
    }
}

/// Outcome of checking a session against a route's requirements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    /// Session still resolving; render a loading state.
    Wait,
    Redirect(&'static str),
    Denied,
}

/// `authenticated AND (no required role OR role == required)`.
///
/// Never fails: unauthenticated sessions are redirected, wrong roles are
/// denied.
pub fn route_access<Id>(session: &SessionState<Id>, required: Option<Role>) -> AccessDecision {
    match session {
        SessionState::Absent => AccessDecision::Redirect(SIGNED_OUT_REDIRECT),
        SessionState::Pending => AccessDecision::Wait,
        SessionState::Established { role, .. } => match required {
            None => AccessDecision::Allow,
            Some(required) if *role == required => AccessDecision::Allow,
            Some(_) => AccessDecision::Denied,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessDecision, Role, SessionState, route_access};

    fn established(role: Role) -> SessionState<u32> {
        SessionState::Established { user_id: 7, role }
    }

    #[test]
    fn absent_session_redirects_home() {
        let session: SessionState<u32> = SessionState::Absent;
        assert_eq!(route_access(&session, None), AccessDecision::Redirect("/"));
        assert_eq!(
            route_access(&session, Some(Role::Admin)),
            AccessDecision::Redirect("/")
        );
    }

    #[test]
    fn pending_session_waits() {
        let session: SessionState<u32> = SessionState::Pending;
        assert_eq!(route_access(&session, None), AccessDecision::Wait);
    }

    #[test]
    fn learners_cannot_reach_admin_routes() {
        assert_eq!(
            route_access(&established(Role::User), Some(Role::Admin)),
            AccessDecision::Denied
        );
        assert_eq!(
            route_access(&established(Role::User), None),
            AccessDecision::Allow
        );
    }

    #[test]
    fn admins_pass_admin_routes() {
        assert_eq!(
            route_access(&established(Role::Admin), Some(Role::Admin)),
            AccessDecision::Allow
        );
    }

    #[test]
    fn session_accessors() {
        let session = established(Role::Admin);
        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Admin));
        assert_eq!(session.user_id(), Some(&7));
        assert_eq!(SessionState::<u32>::Absent.role(), None);
    }

    #[test]
    fn roles_round_trip_through_strings() {
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("moderator"), None);
        assert_eq!(Role::User.to_string(), "user");
    }
}
