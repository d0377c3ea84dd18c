//! Storage ports for accounts and sessions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{DomainResult, PageRequest, UserId};

use crate::{Session, SessionToken, User};

/// Account persistence. Reads never return soft-deleted users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already taken.
    async fn insert_user(&self, user: &User) -> DomainResult<()>;
    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn update_user(&self, user: &User) -> DomainResult<()>;
    /// Newest first; returns the page and the total row count.
    async fn list_users(&self, page: PageRequest) -> DomainResult<(Vec<User>, u64)>;
    /// Returns `false` when no live user had that id.
    async fn soft_delete_user(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<bool>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> DomainResult<()>;
    async fn get_session(&self, token: SessionToken) -> DomainResult<Option<Session>>;
    async fn revoke_session(&self, token: SessionToken, at: DateTime<Utc>) -> DomainResult<bool>;
    async fn revoke_user_sessions(&self, user_id: UserId, at: DateTime<Utc>) -> DomainResult<u64>;
    /// Delete sessions that are expired or revoked as of `now`.
    async fn purge_sessions(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn insert_user(&self, user: &User) -> DomainResult<()> {
        (**self).insert_user(user).await
    }

    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>> {
        (**self).get_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        (**self).find_user_by_email(email).await
    }

    async fn update_user(&self, user: &User) -> DomainResult<()> {
        (**self).update_user(user).await
    }

    async fn list_users(&self, page: PageRequest) -> DomainResult<(Vec<User>, u64)> {
        (**self).list_users(page).await
    }

    async fn soft_delete_user(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<bool> {
        (**self).soft_delete_user(id, at).await
    }
}

#[async_trait]
impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn insert_session(&self, session: &Session) -> DomainResult<()> {
        (**self).insert_session(session).await
    }

    async fn get_session(&self, token: SessionToken) -> DomainResult<Option<Session>> {
        (**self).get_session(token).await
    }

    async fn revoke_session(&self, token: SessionToken, at: DateTime<Utc>) -> DomainResult<bool> {
        (**self).revoke_session(token, at).await
    }

    async fn revoke_user_sessions(&self, user_id: UserId, at: DateTime<Utc>) -> DomainResult<u64> {
        (**self).revoke_user_sessions(user_id, at).await
    }

    async fn purge_sessions(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        (**self).purge_sessions(now).await
    }
}
