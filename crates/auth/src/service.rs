//! Login/session lifecycle and account management.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use stockroom_core::{DomainError, DomainResult, PageRequest, Paged, UserId};

use crate::password::{hash_password, verify_password};
use crate::user::normalize_email;
use crate::{
    NewUser, Permission, Principal, Role, Session, SessionStore, SessionToken, User, UserChanges,
    UserStore, authorize, authorize_self_or,
};

const INVALID_CREDENTIALS: &str = "invalid email or password";
const INACTIVE_ACCOUNT: &str = "account is inactive";

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    pub user: User,
}

/// Issues, resolves and revokes bearer sessions.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            ttl,
        }
    }

    #[instrument(skip(self, password), err)]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<LoginOutcome> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::unauthorized(INVALID_CREDENTIALS))?;

        if !verify_password(password, &user.password_hash) {
            return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
        }
        if !user.is_active {
            return Err(DomainError::unauthorized(INACTIVE_ACCOUNT));
        }

        let session = Session::issue(user.id, now, self.ttl);
        self.sessions.insert_session(&session).await?;

        info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(LoginOutcome { session, user })
    }

    /// Resolve a bearer token into the acting principal.
    pub async fn authenticate(
        &self,
        token: SessionToken,
        now: DateTime<Utc>,
    ) -> DomainResult<Principal> {
        let session = self
            .sessions
            .get_session(token)
            .await?
            .filter(|s| s.is_active(now))
            .ok_or_else(|| DomainError::unauthorized("invalid or expired session"))?;

        let user = self
            .users
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| DomainError::unauthorized("invalid or expired session"))?;

        if !user.is_active {
            return Err(DomainError::unauthorized(INACTIVE_ACCOUNT));
        }

        Ok(Principal::new(user.id, user.role))
    }

    #[instrument(skip(self), err)]
    pub async fn logout(&self, token: SessionToken, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.sessions.revoke_session(token, now).await? {
            return Err(DomainError::unauthorized("session already ended"));
        }
        Ok(())
    }

    pub async fn logout_all(&self, user_id: UserId, now: DateTime<Utc>) -> DomainResult<u64> {
        let revoked = self.sessions.revoke_user_sessions(user_id, now).await?;
        info!(user_id = %user_id, revoked, "revoked all sessions");
        Ok(revoked)
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        self.sessions.purge_sessions(now).await
    }
}

/// Account management with role-assignment rules.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { users, sessions }
    }

    #[instrument(skip(self, new), fields(actor = %actor.user_id, role = %new.role), err)]
    pub async fn create(
        &self,
        actor: &Principal,
        new: NewUser,
        now: DateTime<Utc>,
    ) -> DomainResult<User> {
        authorize(actor, &Permission::USERS_MANAGE)?;
        if !actor.role.can_assign(new.role) {
            return Err(DomainError::forbidden(format!(
                "{} cannot create a {} account",
                actor.role, new.role
            )));
        }
        self.insert_new(new, now).await
    }

    /// Create the first super admin when no account owns `email` yet.
    pub async fn bootstrap_super_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<User>> {
        if self
            .users
            .find_user_by_email(&normalize_email(email))
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let user = self
            .insert_new(
                NewUser {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    full_name: "Super Admin".to_string(),
                    role: Role::SuperAdmin,
                },
                now,
            )
            .await?;
        info!(user_id = %user.id, "bootstrapped super admin");
        Ok(Some(user))
    }

    async fn insert_new(&self, new: NewUser, now: DateTime<Utc>) -> DomainResult<User> {
        new.validate()?;
        let email = normalize_email(&new.email);
        self.ensure_email_free(&email, None).await?;

        let user = User {
            id: UserId::new(),
            username: new.username.trim().to_string(),
            email,
            password_hash: hash_password(&new.password)?,
            full_name: new.full_name.trim().to_string(),
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.users.insert_user(&user).await?;
        Ok(user)
    }

    pub async fn get(&self, actor: &Principal, id: UserId) -> DomainResult<User> {
        authorize_self_or(actor, id, &Permission::USERS_MANAGE)?;
        self.load(id).await
    }

    #[instrument(skip(self, changes), fields(actor = %actor.user_id, target = %id), err)]
    pub async fn update(
        &self,
        actor: &Principal,
        id: UserId,
        changes: UserChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<User> {
        authorize_self_or(actor, id, &Permission::USERS_MANAGE)?;
        changes.validate()?;

        let mut user = self.load(id).await?;

        if changes.touches_privileges() {
            authorize(actor, &Permission::USERS_MANAGE)?;
            self.ensure_can_manage(actor, &user)?;
            if let Some(role) = changes.role {
                if !actor.role.can_assign(role) {
                    return Err(DomainError::forbidden(format!(
                        "{} cannot assign the {} role",
                        actor.role, role
                    )));
                }
            }
        }

        if let Some(email) = &changes.email {
            let email = normalize_email(email);
            self.ensure_email_free(&email, Some(user.id)).await?;
            user.email = email;
        }
        if let Some(username) = changes.username {
            user.username = username.trim().to_string();
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name.trim().to_string();
        }
        if let Some(password) = changes.password {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        let deactivated = changes.is_active == Some(false) && user.is_active;
        if let Some(active) = changes.is_active {
            user.is_active = active;
        }
        user.updated_at = now;

        self.users.update_user(&user).await?;

        if deactivated {
            self.sessions.revoke_user_sessions(user.id, now).await?;
        }
        Ok(user)
    }

    pub async fn list(&self, actor: &Principal, page: PageRequest) -> DomainResult<Paged<User>> {
        authorize(actor, &Permission::USERS_MANAGE)?;
        let (items, total) = self.users.list_users(page).await?;
        Ok(Paged::new(items, page, total))
    }

    #[instrument(skip(self), fields(actor = %actor.user_id), err)]
    pub async fn delete(&self, actor: &Principal, id: UserId, now: DateTime<Utc>) -> DomainResult<()> {
        authorize(actor, &Permission::USERS_MANAGE)?;
        if actor.user_id == id {
            return Err(DomainError::invalid("cannot delete your own account"));
        }

        let user = self.load(id).await?;
        self.ensure_can_manage(actor, &user)?;

        if !self.users.soft_delete_user(id, now).await? {
            return Err(DomainError::not_found("user"));
        }
        let revoked = self.sessions.revoke_user_sessions(id, now).await?;
        info!(user_id = %id, revoked, "user deleted");
        Ok(())
    }

    async fn load(&self, id: UserId) -> DomainResult<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    /// Admins may not modify or remove super admins.
    fn ensure_can_manage(&self, actor: &Principal, target: &User) -> DomainResult<()> {
        if !actor.role.can_assign(target.role) {
            warn!(actor = %actor.user_id, target = %target.id, "attempt to manage a higher role");
            return Err(DomainError::forbidden(format!(
                "{} cannot manage a {} account",
                actor.role, target.role
            )));
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<UserId>) -> DomainResult<()> {
        match self.users.find_user_by_email(email).await? {
            Some(existing) if Some(existing.id) != owner => {
                Err(DomainError::conflict("email already registered"))
            }
            _ => Ok(()),
        }
    }
}
