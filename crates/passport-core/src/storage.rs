//! # Storage Capabilities
//!
//! The narrow interfaces HTTP handlers are written against, plus their
//! in-memory implementations over [`EntityStore`].
//!
//! Listing is the only place behavior is added on top of the store: results
//! are sorted by identity so responses are deterministic.

use std::fmt::Debug;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::StoreError;
use crate::model::{Passport, User, UserId};
use crate::store::EntityStore;

/// User operations available to handlers.
pub trait UserStorage: Debug + Send + Sync {
    /// All users, ascending by id.
    fn list_users(&self) -> Vec<User>;
    fn get_user(&self, id: UserId) -> Result<User, StoreError>;
    /// Store a new user under a freshly assigned id. The input id is ignored.
    fn add_user(&self, user: User) -> Result<User, StoreError>;
    /// Replace the user stored under `user.id`.
    fn update_user(&self, user: User) -> Result<User, StoreError>;
    fn delete_user(&self, id: UserId) -> Result<(), StoreError>;
}

/// In-place change applied by [`PassportStorage::amend_passport`].
pub type PassportEdit = Box<dyn FnOnce(&mut Passport) + Send>;

/// Passport operations available to handlers.
pub trait PassportStorage: Debug + Send + Sync {
    /// Passports owned by `user_id`, ascending by passport id.
    /// An unknown user yields an empty list.
    fn list_passports_by_user(&self, user_id: UserId) -> Vec<Passport>;
    fn get_passport(&self, id: &str) -> Result<Passport, StoreError>;
    /// Store a new passport. Fails if the passport id is taken.
    fn add_passport(&self, passport: Passport) -> Result<Passport, StoreError>;
    /// Replace the passport stored under `passport.id`.
    fn update_passport(&self, passport: Passport) -> Result<Passport, StoreError>;
    /// Apply `edit` to the stored passport as one atomic step. The id is kept.
    fn amend_passport(&self, id: &str, edit: PassportEdit) -> Result<Passport, StoreError>;
    fn delete_passport(&self, id: &str) -> Result<(), StoreError>;
}

/// In-memory [`UserStorage`].
#[derive(Debug, Clone, Default)]
pub struct UserService {
    store: EntityStore<User>,
}

impl UserService {
    /// Service over an existing store.
    pub fn new(store: EntityStore<User>) -> Self {
        Self { store }
    }

    /// Service pre-loaded with [`seed_users`].
    pub fn seeded() -> Self {
        Self::new(EntityStore::seeded(seed_users()))
    }
}

impl UserStorage for UserService {
    fn list_users(&self) -> Vec<User> {
        let mut users = self.store.list();
        users.sort_by_key(|u| u.id);
        users
    }

    fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        self.store.get(&id)
    }

    fn add_user(&self, user: User) -> Result<User, StoreError> {
        self.store.add(user)
    }

    fn update_user(&self, user: User) -> Result<User, StoreError> {
        self.store.update(user)
    }

    fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        self.store.delete(&id)
    }
}

/// In-memory [`PassportStorage`].
#[derive(Debug, Clone, Default)]
pub struct PassportService {
    store: EntityStore<Passport>,
}

impl PassportService {
    /// Service over an existing store.
    pub fn new(store: EntityStore<Passport>) -> Self {
        Self { store }
    }

    /// Service pre-loaded with [`seed_passports`].
    pub fn seeded() -> Self {
        Self::new(EntityStore::seeded(seed_passports()))
    }
}

impl PassportStorage for PassportService {
    fn list_passports_by_user(&self, user_id: UserId) -> Vec<Passport> {
        let mut passports = self.store.find_all(|p| p.user_id == user_id);
        passports.sort_by(|a, b| a.id.cmp(&b.id));
        passports
    }

    fn get_passport(&self, id: &str) -> Result<Passport, StoreError> {
        self.store.get(&id.to_string())
    }

    fn add_passport(&self, passport: Passport) -> Result<Passport, StoreError> {
        self.store.add(passport)
    }

    fn update_passport(&self, passport: Passport) -> Result<Passport, StoreError> {
        self.store.update(passport)
    }

    fn amend_passport(&self, id: &str, edit: PassportEdit) -> Result<Passport, StoreError> {
        self.store.modify(&id.to_string(), edit)
    }

    fn delete_passport(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(&id.to_string())
    }
}

/// Midnight UTC on the given day. Only called with valid literal dates.
fn midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// The two users the service starts with.
pub fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 0,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: midnight(1985, 12, 31),
            location_of_birth: "London".to_string(),
        },
        User {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: midnight(1992, 1, 1),
            location_of_birth: "Milton Keynes".to_string(),
        },
    ]
}

/// One passport per seeded user.
pub fn seed_passports() -> Vec<Passport> {
    vec![
        Passport {
            id: "012345678".to_string(),
            date_of_issue: midnight(2020, 1, 15),
            date_of_expiry: midnight(2030, 1, 15),
            authority: "HMPO".to_string(),
            user_id: 0,
        },
        Passport {
            id: "987654321".to_string(),
            date_of_issue: midnight(2019, 6, 1),
            date_of_expiry: midnight(2029, 6, 1),
            authority: "HMPO".to_string(),
            user_id: 1,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn passport(id: &str, user_id: UserId) -> Passport {
        Passport {
            id: id.to_string(),
            date_of_issue: midnight(2021, 1, 1),
            date_of_expiry: midnight(2031, 1, 1),
            authority: "HMPO".to_string(),
            user_id,
        }
    }

    fn user(first: &str) -> User {
        User {
            id: 0,
            first_name: first.to_string(),
            last_name: "Jack".to_string(),
            date_of_birth: midnight(1972, 3, 7),
            location_of_birth: "Cambridge".to_string(),
        }
    }

    #[test]
    fn seed_dates_are_exact() {
        let users = seed_users();
        assert_eq!(users[0].date_of_birth.to_rfc3339(), "1985-12-31T00:00:00+00:00");
        assert_eq!(users[1].location_of_birth, "Milton Keynes");
        let passports = seed_passports();
        assert_eq!(passports[1].date_of_issue.to_rfc3339(), "2019-06-01T00:00:00+00:00");
    }

    #[test]
    fn seeded_users_list_in_id_order() {
        let svc = UserService::seeded();
        let ids: Vec<UserId> = svc.list_users().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn add_user_after_seed_gets_next_id() {
        let svc = UserService::seeded();
        let created = svc.add_user(user("Apple")).unwrap();
        assert_eq!(created.id, 2);
        assert_eq!(svc.get_user(2).unwrap().first_name, "Apple");
        assert_eq!(svc.list_users().len(), 3);
    }

    #[test]
    fn update_unknown_user_is_not_found() {
        let svc = UserService::seeded();
        let mut ghost = user("Ghost");
        ghost.id = 42;
        assert!(svc.update_user(ghost).unwrap_err().is_not_found());
        assert_eq!(svc.list_users().len(), 2);
    }

    #[test]
    fn delete_user_then_get_fails() {
        let svc = UserService::seeded();
        svc.delete_user(1).unwrap();
        assert!(svc.get_user(1).unwrap_err().is_not_found());
        assert!(svc.delete_user(1).is_err());
    }

    #[test]
    fn passports_filtered_by_owner_and_sorted() {
        let svc = PassportService::seeded();
        svc.add_passport(passport("555000111", 0)).unwrap();
        svc.add_passport(passport("000000001", 0)).unwrap();
        svc.add_passport(passport("777777777", 1)).unwrap();

        let ids: Vec<String> = svc
            .list_passports_by_user(0)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["000000001", "012345678", "555000111"]);
        assert!(svc
            .list_passports_by_user(0)
            .iter()
            .all(|p| p.user_id == 0));
    }

    #[test]
    fn unmatched_owner_yields_empty_list() {
        let svc = PassportService::seeded();
        assert!(svc.list_passports_by_user(99).is_empty());
    }

    #[test]
    fn duplicate_passport_is_rejected() {
        let svc = PassportService::seeded();
        let err = svc.add_passport(passport("012345678", 1)).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(svc.get_passport("012345678").unwrap().user_id, 0);
    }

    #[test]
    fn passport_update_and_delete() {
        let svc = PassportService::seeded();
        let mut p = svc.get_passport("987654321").unwrap();
        p.authority = "UKPA".to_string();
        svc.update_passport(p).unwrap();
        assert_eq!(svc.get_passport("987654321").unwrap().authority, "UKPA");

        svc.delete_passport("987654321").unwrap();
        assert!(svc.get_passport("987654321").unwrap_err().is_not_found());
        assert!(svc.delete_passport("987654321").unwrap_err().is_not_found());
    }

    #[test]
    fn amend_keeps_fields_the_edit_leaves_alone() {
        let svc = PassportService::seeded();
        let amended = svc
            .amend_passport(
                "987654321",
                Box::new(|p: &mut Passport| {
                    p.authority = "UKPA".to_string();
                    p.id = "elsewhere".to_string();
                }),
            )
            .unwrap();
        assert_eq!(amended.id, "987654321");
        assert_eq!(amended.user_id, 1);
        assert_eq!(svc.get_passport("987654321").unwrap().authority, "UKPA");
        assert!(svc
            .amend_passport("000000000", Box::new(|_: &mut Passport| {}))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn services_are_usable_as_trait_objects() {
        let users: Arc<dyn UserStorage> = Arc::new(UserService::seeded());
        let passports: Arc<dyn PassportStorage> = Arc::new(PassportService::seeded());
        assert_eq!(users.list_users().len(), 2);
        assert_eq!(passports.list_passports_by_user(1).len(), 1);
    }
}
