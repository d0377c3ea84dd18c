//! `stockroom-auth`: authentication and authorization boundary.
//!
//! Decoupled from HTTP: the API layer resolves a bearer token into a
//! `Principal` through `AuthService` and asks `authorize*` for decisions.
//! Storage is reached only through the `UserStore` / `SessionStore` ports.

pub mod authorize;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod service;
pub mod session;
pub mod store;
pub mod user;

pub use authorize::{AuthzError, authorize, authorize_self_or};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use service::{AuthService, LoginOutcome, UserService};
pub use session::{Session, SessionToken};
pub use store::{SessionStore, UserStore};
pub use user::{NewUser, User, UserChanges};
