use crate::lecturecam_core::database::Database;
use crate::lecturecam_core::error::Result;

/// Storage keys shared with the photo list cache and local event store.
pub const PHOTO_CACHE_PREFIX: &str = "PHOTO_CACHE_";
pub const USER_CALENDAR_IDS_KEY: &str = "USER_CALENDAR_IDS";
pub const ONBOARDED_KEY: &str = "onboarded";
pub const AUTH_TOKEN_KEY: &str = "AUTH_TOKEN";
pub const AUTH_USERNAME_KEY: &str = "AUTH_USERNAME";
pub const LOCAL_EVENTS_KEY: &str = "MY_APP_LOCAL_EVENTS";

/// Credentials of the logged-in backend user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub username: String,
}

/// Native calendar ids the user opted into. Empty when never chosen.
pub fn calendar_ids(db: &Database) -> Vec<String> {
    db.get_json(USER_CALENDAR_IDS_KEY).unwrap_or_default()
}

pub fn set_calendar_ids(db: &Database, ids: &[String]) -> Result<()> {
    db.set_json(USER_CALENDAR_IDS_KEY, ids)
}

pub fn is_onboarded(db: &Database) -> bool {
    db.get_item(ONBOARDED_KEY).as_deref() == Some("1")
}

pub fn mark_onboarded(db: &Database) -> Result<()> {
    db.set_item(ONBOARDED_KEY, "1")
}

/// Load the saved session. Both token and username must be present.
pub fn auth_session(db: &Database) -> Option<AuthSession> {
    let token = db.get_item(AUTH_TOKEN_KEY)?;
    let username = db.get_item(AUTH_USERNAME_KEY)?;
    Some(AuthSession { token, username })
}

pub fn save_auth_session(db: &Database, session: &AuthSession) -> Result<()> {
    db.set_item(AUTH_TOKEN_KEY, &session.token)?;
    db.set_item(AUTH_USERNAME_KEY, &session.username)
}

pub fn clear_auth_session(db: &Database) -> Result<()> {
    db.remove_item(AUTH_TOKEN_KEY)?;
    db.remove_item(AUTH_USERNAME_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_ids_default_empty() {
        let db = Database::in_memory().unwrap();
        assert!(calendar_ids(&db).is_empty());

        set_calendar_ids(&db, &["home".to_string(), "uni".to_string()]).unwrap();
        assert_eq!(calendar_ids(&db), vec!["home", "uni"]);
    }

    #[test]
    fn test_onboarding_flag() {
        let db = Database::in_memory().unwrap();
        assert!(!is_onboarded(&db));
        mark_onboarded(&db).unwrap();
        assert!(is_onboarded(&db));
    }

    #[test]
    fn test_auth_session_lifecycle() {
        let db = Database::in_memory().unwrap();
        assert!(auth_session(&db).is_none());

        let session = AuthSession {
            token: "t0k3n".to_string(),
            username: "ada".to_string(),
        };
        save_auth_session(&db, &session).unwrap();
        assert_eq!(auth_session(&db), Some(session));

        clear_auth_session(&db).unwrap();
        assert!(auth_session(&db).is_none());
    }
}
