mod common;

use assert_matches::assert_matches;
use chrono::Duration;

use stockroom_auth::{NewUser, Principal, Role, SessionToken, UserChanges};
use stockroom_core::{DomainError, PageRequest};

use common::{Harness, t0};

async fn bootstrap(h: &Harness) -> Principal {
    let root = h
        .users
        .bootstrap_super_admin("root", "root@example.com", "s3cret!", t0())
        .await
        .unwrap()
        .expect("first bootstrap creates the account");
    Principal::new(root.id, root.role)
}

fn new_user(name: &str, role: Role) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: format!("{name}@example.com"),
        password: "password1".to_string(),
        full_name: format!("{name} tester"),
        role,
    }
}

#[tokio::test]
async fn bootstrap_is_idempotent() {
    let h = Harness::new();
    bootstrap(&h).await;
    let again = h
        .users
        .bootstrap_super_admin("root", "ROOT@example.com", "s3cret!", t0())
        .await
        .unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn login_authenticate_logout() {
    let h = Harness::new();
    let root = bootstrap(&h).await;

    let outcome = h.auth.login("Root@Example.com ", "s3cret!", t0()).await.unwrap();
    assert_eq!(outcome.user.id, root.user_id);

    let principal = h.auth.authenticate(outcome.session.token, t0()).await.unwrap();
    assert_eq!(principal.role, Role::SuperAdmin);

    h.auth.logout(outcome.session.token, t0()).await.unwrap();
    assert_matches!(
        h.auth.authenticate(outcome.session.token, t0()).await,
        Err(DomainError::Unauthorized(_))
    );
    assert_matches!(
        h.auth.logout(outcome.session.token, t0()).await,
        Err(DomainError::Unauthorized(_))
    );
}

#[tokio::test]
async fn bad_credentials_share_one_message() {
    let h = Harness::new();
    bootstrap(&h).await;

    let wrong_password = h.auth.login("root@example.com", "nope", t0()).await.unwrap_err();
    let unknown_email = h.auth.login("ghost@example.com", "s3cret!", t0()).await.unwrap_err();
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.to_string(), "unauthorized: invalid email or password");
}

#[tokio::test]
async fn sessions_expire_and_are_purged() {
    let h = Harness::new();
    bootstrap(&h).await;
    let outcome = h.auth.login("root@example.com", "s3cret!", t0()).await.unwrap();

    let tomorrow = t0() + Duration::hours(25);
    assert_matches!(
        h.auth.authenticate(outcome.session.token, tomorrow).await,
        Err(DomainError::Unauthorized(_))
    );
    assert_eq!(h.auth.purge_expired(tomorrow).await.unwrap(), 1);
    assert_eq!(h.auth.purge_expired(tomorrow).await.unwrap(), 0);

    assert_matches!(
        h.auth.authenticate(SessionToken::generate(), t0()).await,
        Err(DomainError::Unauthorized(_))
    );
}

#[tokio::test]
async fn role_assignment_rules() {
    let h = Harness::new();
    let root = bootstrap(&h).await;

    let admin = h
        .users
        .create(&root, new_user("alice", Role::Admin), t0())
        .await
        .unwrap();
    let admin = Principal::new(admin.id, admin.role);

    assert_matches!(
        h.users.create(&admin, new_user("mallory", Role::SuperAdmin), t0()).await,
        Err(DomainError::Forbidden(_))
    );
    let staff = h
        .users
        .create(&admin, new_user("bob", Role::Staff), t0())
        .await
        .unwrap();
    let staff = Principal::new(staff.id, staff.role);

    assert_matches!(
        h.users.create(&staff, new_user("eve", Role::Staff), t0()).await,
        Err(DomainError::Forbidden(_))
    );
    assert_matches!(
        h.users.list(&staff, PageRequest::default()).await,
        Err(DomainError::Forbidden(_))
    );
    assert_matches!(
        h.users
            .update(
                &admin,
                root.user_id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
                t0(),
            )
            .await,
        Err(DomainError::Forbidden(_))
    );

    // Staff may edit their own profile but not their role.
    let renamed = h
        .users
        .update(
            &staff,
            staff.user_id,
            UserChanges {
                full_name: Some("Bob Builder".to_string()),
                ..Default::default()
            },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(renamed.full_name, "Bob Builder");
    assert_matches!(
        h.users
            .update(
                &staff,
                staff.user_id,
                UserChanges {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                t0(),
            )
            .await,
        Err(DomainError::Forbidden(_))
    );

    let listed = h.users.list(&root, PageRequest::default()).await.unwrap();
    assert_eq!(listed.meta.total, 3);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let h = Harness::new();
    let root = bootstrap(&h).await;
    h.users
        .create(&root, new_user("carol", Role::Staff), t0())
        .await
        .unwrap();
    let err = h
        .users
        .create(&root, new_user("carol", Role::Staff), t0())
        .await
        .unwrap_err();
    assert_matches!(err, DomainError::Conflict(_));
}

#[tokio::test]
async fn deactivation_and_deletion_end_sessions() {
    let h = Harness::new();
    let root = bootstrap(&h).await;
    let dave = h
        .users
        .create(&root, new_user("dave", Role::Staff), t0())
        .await
        .unwrap();
    let session = h
        .auth
        .login("dave@example.com", "password1", t0())
        .await
        .unwrap()
        .session;

    h.users
        .update(
            &root,
            dave.id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
            t0(),
        )
        .await
        .unwrap();
    assert_matches!(
        h.auth.authenticate(session.token, t0()).await,
        Err(DomainError::Unauthorized(_))
    );
    let err = h
        .auth
        .login("dave@example.com", "password1", t0())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unauthorized: account is inactive");

    assert_matches!(
        h.users.delete(&root, root.user_id, t0()).await,
        Err(DomainError::InvalidRequest(_))
    );
    h.users.delete(&root, dave.id, t0()).await.unwrap();
    assert_matches!(h.users.get(&root, dave.id).await, Err(DomainError::NotFound(_)));
}
