//! Persistent session: a bearer token and the user profile, always kept as a pair.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::models::{Role, UserProfile};

pub const TOKEN_KEY: &str = "apbia_token";
pub const USER_KEY: &str = "apbia_user";

/// Key/value persistence the session lives in (`localStorage` in the browser).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// In-memory store. Used in tests and when the browser denies `localStorage`.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Session operations on top of a [`KeyValueStore`].
#[derive(Clone, Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists token and profile together, replacing any previous session.
    /// If the profile cannot be written both keys are cleared, so a stale
    /// profile never outlives its token.
    pub fn save_session(&self, token: &str, profile: &UserProfile) -> Result<(), StoreError> {
        let user_json = serde_json::to_string(profile).map_err(|e| StoreError::Serialize {
            key: USER_KEY.to_string(),
            message: e.to_string(),
        })?;

        self.store.set(TOKEN_KEY, token)?;
        if let Err(e) = self.store.set(USER_KEY, &user_json) {
            warn!("Profile write failed, dropping the partial session: {e}");
            self.clear_session();
            return Err(e);
        }

        debug!("Session saved for user {}", profile.id);
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn profile(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Stored user profile is unreadable, treating as absent: {e}");
                None
            }
        }
    }

    pub fn clear_session(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && self.profile().is_some()
    }

    pub fn has_role(&self, role: &Role) -> bool {
        if self.token().is_none() {
            return false;
        }
        self.profile().is_some_and(|p| &p.role == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::Admin)
    }

    pub fn is_advisor(&self) -> bool {
        self.has_role(&Role::Advisor)
    }

    pub fn is_participant(&self) -> bool {
        self.has_role(&Role::Participant)
    }

    /// Advisors and admins may annotate AI messages.
    pub fn can_annotate(&self) -> bool {
        self.is_advisor() || self.is_admin()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;

    use super::*;

    pub(crate) fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: 42,
            full_name: "Maria Clara Lima".to_string(),
            email: "maria@escola.edu.br".to_string(),
            role,
            bp: Some("BRG12345678".to_string()),
        }
    }

    /// Refuses profile writes once `fail_user_writes` is set.
    struct FailingUserWrites {
        inner: MemoryStore,
        fail_user_writes: Cell<bool>,
    }

    impl KeyValueStore for FailingUserWrites {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == USER_KEY && self.fail_user_writes.get() {
                return Err(StoreError::WriteFailed {
                    key: key.to_string(),
                    message: "quota exceeded".to_string(),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) {
            self.inner.remove(key)
        }
    }

    #[test]
    fn round_trip_then_clear() {
        let session = SessionStore::new(MemoryStore::new());
        assert!(!session.is_authenticated());

        let p = profile(Role::Participant);
        session.save_session("tok-1", &p).unwrap();
        assert_eq!(session.token().as_deref(), Some("tok-1"));
        assert_eq!(session.profile(), Some(p));
        assert!(session.is_authenticated());

        session.clear_session();
        assert_eq!(session.token(), None);
        assert_eq!(session.profile(), None);
        assert!(!session.is_authenticated());

        session.clear_session();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn save_overwrites_previous_session() {
        let session = SessionStore::new(MemoryStore::new());
        session.save_session("old", &profile(Role::Admin)).unwrap();
        session.save_session("new", &profile(Role::Advisor)).unwrap();
        assert_eq!(session.token().as_deref(), Some("new"));
        assert!(session.is_advisor());
        assert!(!session.is_admin());
    }

    #[test]
    fn corrupt_profile_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "tok").unwrap();
        store.set(USER_KEY, "{not json").unwrap();
        let session = SessionStore::new(store);
        assert_eq!(session.profile(), None);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let session = SessionStore::new(MemoryStore::new());
        session.save_session("", &profile(Role::Admin)).unwrap();
        assert!(!session.is_authenticated());
        assert!(!session.has_role(&Role::Admin));
    }

    #[test]
    fn failed_profile_write_leaves_no_token() {
        let inner = MemoryStore::new();
        let store = Rc::new(FailingUserWrites { inner: inner.clone(), fail_user_writes: Cell::new(true) });
        let session = SessionStore::new(store);
        assert!(session.save_session("tok", &profile(Role::Admin)).is_err());
        assert!(inner.is_empty());
    }

    #[test]
    fn failed_overwrite_drops_previous_session() {
        let inner = MemoryStore::new();
        let store = Rc::new(FailingUserWrites { inner: inner.clone(), fail_user_writes: Cell::new(false) });
        let session = SessionStore::new(store.clone());
        session.save_session("old", &profile(Role::Admin)).unwrap();
        assert!(session.is_admin());

        store.fail_user_writes.set(true);
        assert!(session.save_session("new", &profile(Role::Advisor)).is_err());
        assert_eq!(session.token(), None);
        assert_eq!(session.profile(), None);
        assert!(inner.is_empty());
    }

    #[test]
    fn role_predicates() {
        let session = SessionStore::new(MemoryStore::new());
        assert!(!session.has_role(&Role::Participant));

        session.save_session("t", &profile(Role::Participant)).unwrap();
        assert!(session.is_participant());
        assert!(!session.can_annotate());

        session.save_session("t", &profile(Role::Advisor)).unwrap();
        assert!(session.can_annotate());
    }
}
