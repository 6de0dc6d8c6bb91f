//! # Records
//!
//! The two record types held by the service. Both serialize camelCase so the
//! wire format matches the HTTP contract (`firstName`, `userId`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::Entity;

/// Identity of a [`User`]. Assigned by the store.
pub type UserId = i64;

/// A person who may hold passports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned identity.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: DateTime<Utc>,
    pub location_of_birth: String,
}

impl Entity for User {
    type Key = UserId;
    const KIND: &'static str = "user";

    fn key(&self) -> &UserId {
        &self.id
    }

    fn with_key(self, id: UserId) -> Self {
        Self { id, ..self }
    }
}

/// A passport issued to a user.
///
/// `user_id` is an informal reference: nothing checks that the user exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Passport {
    /// Passport number, supplied by the client.
    pub id: String,
    pub date_of_issue: DateTime<Utc>,
    pub date_of_expiry: DateTime<Utc>,
    /// Issuing authority, e.g. `HMPO`.
    pub authority: String,
    /// Owning user.
    pub user_id: UserId,
}

impl Entity for Passport {
    type Key = String;
    const KIND: &'static str = "passport";

    fn key(&self) -> &String {
        &self.id
    }

    fn with_key(self, id: String) -> Self {
        Self { id, ..self }
    }
}
