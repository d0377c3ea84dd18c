use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_auth::{Session, SessionStore, SessionToken, User, UserStore};
use stockroom_core::{DomainError, DomainResult, PageRequest, SoftDelete, UserId};

use super::{InMemoryStore, paginate};

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: &User) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        let taken = t
            .users
            .values()
            .any(|u| !u.is_deleted() && u.email == user.email);
        if taken || t.users.contains_key(&user.id) {
            return Err(DomainError::conflict("email already registered"));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t
            .users
            .values()
            .find(|u| !u.is_deleted() && u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        let clash = t
            .users
            .values()
            .any(|u| u.id != user.id && !u.is_deleted() && u.email == user.email);
        if clash {
            return Err(DomainError::conflict("email already registered"));
        }
        match t.users.get_mut(&user.id).filter(|u| !u.is_deleted()) {
            Some(row) => {
                *row = user.clone();
                Ok(())
            }
            None => Err(DomainError::not_found("user")),
        }
    }

    async fn list_users(&self, page: PageRequest) -> DomainResult<(Vec<User>, u64)> {
        let t = self.tables.lock().await;
        let rows = t.users.values().filter(|u| !u.is_deleted()).cloned().collect();
        Ok(paginate(rows, page))
    }

    async fn soft_delete_user(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<bool> {
        let mut t = self.tables.lock().await;
        match t.users.get_mut(&id).filter(|u| !u.is_deleted()) {
            Some(user) => {
                user.mark_deleted(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn insert_session(&self, session: &Session) -> DomainResult<()> {
        let mut t = self.tables.lock().await;
        if t.sessions.contains_key(&session.token) {
            return Err(DomainError::conflict("session token already issued"));
        }
        t.sessions.insert(session.token, session.clone());
        Ok(())
    }

    async fn get_session(&self, token: SessionToken) -> DomainResult<Option<Session>> {
        Ok(self.tables.lock().await.sessions.get(&token).cloned())
    }

    async fn revoke_session(&self, token: SessionToken, at: DateTime<Utc>) -> DomainResult<bool> {
        let mut t = self.tables.lock().await;
        match t.sessions.get_mut(&token) {
            Some(s) if s.revoked_at.is_none() && s.expires_at > at => {
                s.revoked_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_user_sessions(&self, user_id: UserId, at: DateTime<Utc>) -> DomainResult<u64> {
        let mut t = self.tables.lock().await;
        let mut revoked = 0;
        for s in t.sessions.values_mut() {
            if s.user_id == user_id && s.revoked_at.is_none() {
                s.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn purge_sessions(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let mut t = self.tables.lock().await;
        let before = t.sessions.len();
        t.sessions.retain(|_, s| s.is_active(now));
        Ok((before - t.sessions.len()) as u64)
    }
}
