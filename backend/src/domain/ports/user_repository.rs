//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use pagination::{PageRequest, Paginated};

use crate::domain::{EmailAddress, Error, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

impl From<UserPersistenceError> for Error {
    fn from(error: UserPersistenceError) -> Self {
        match error {
            UserPersistenceError::Connection { message } => {
                Self::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Self::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateEmail { .. } => {
                Self::invalid_request("a user with this email already exists")
            }
        }
    }
}

/// Storage for user accounts.
///
/// Deleting a user is an `update` with `is_deleted` set; rows are never
/// removed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier, including soft-deleted rows.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email, including soft-deleted rows.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Page through live users ordered by name.
    async fn list(&self, page: PageRequest) -> Result<Paginated<User>, UserPersistenceError>;

    /// Insert a new user. Fails with `DuplicateEmail` when the address is taken.
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Overwrite an existing user.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;
}
