//! # passport-core — Storage Layer for the Passport API
//!
//! Record types, the generic in-memory [`EntityStore`], and the two storage
//! capability traits the HTTP layer is written against.
//!
//! ## Layers
//!
//! ```text
//! handlers → UserStorage / PassportStorage → UserService / PassportService → EntityStore
//! ```
//!
//! The store never calls back upward. Handlers only see the traits, so a
//! different backing store can be substituted without touching them.
//!
//! ## Crate Policy
//!
//! - No HTTP types. This is the leaf of the dependency graph.
//! - No `.unwrap()` outside tests.
//! - Every lock is held only for a map lookup or mutation, never across I/O.

pub mod error;
pub mod model;
pub mod storage;
pub mod store;

pub use error::StoreError;
pub use model::{Passport, User, UserId};
pub use storage::{
    seed_passports, seed_users, PassportEdit, PassportService, PassportStorage, UserService, UserStorage,
};
pub use store::{Entity, EntityStore, StoreKey};
