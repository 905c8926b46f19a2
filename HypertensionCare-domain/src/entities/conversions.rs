// Conversions between the domain session types and the persisted session records
use hypertension_care_data::models::session::{StoredSession, StoredUser};

use super::session::{Session, UserSummary};

impl From<StoredUser> for UserSummary {
    fn from(stored: StoredUser) -> Self {
        Self {
            id: stored.id,
            username: stored.username,
            role: stored.role,
        }
    }
}

impl From<&UserSummary> for StoredUser {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
        }
    }
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.clone(),
            user: StoredUser::from(&session.user),
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            token: stored.token,
            user: stored.user.into(),
        }
    }
}
