//! Domain primitives, aggregates, ports and services.
//!
//! Purpose: model the quoting business (users and groups, manufacturers and
//! their catalogs, customers, proposals, orders and payments) without any
//! knowledge of HTTP or SQL. Adapters live under `inbound` and `outbound`.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Principal (alias to `access::Principal`): authenticated caller with
//!   resolved permissions and group scope.
//! - ports: repository traits implemented by the outbound adapters.
//! - services: use cases consumed by the HTTP layer.

pub mod access;
pub mod auth;
pub mod catalog;
pub mod customer;
pub mod dashboard;
pub mod error;
pub mod manufacturer;
pub mod modification;
pub mod order;
pub mod payment;
pub mod permissions;
pub mod ports;
pub mod pricing;
pub mod proposal;
pub mod resources;
pub mod services;
pub mod settings;
pub mod share;
pub mod trace_id;
pub mod user;
pub mod user_group;

pub use self::access::{AccessScope, Principal};
pub use self::auth::{LoginCredentials, SignupDetails};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::order::DocumentNumber;
pub use self::permissions::{ModuleAccess, Permission, PermissionSet};
pub use self::proposal::ProposalStatus;
pub use self::trace_id::TraceId;
pub use self::user::{EmailAddress, Role, User, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use cabinet_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
