//! Accounts, credentials and the login guard.
//!
//! Passwords are stored as argon2 PHC strings. A logged-in session carries
//! the user's id under [`USER_ID_KEY`]; logging in cycles the session id and
//! logging out flushes the whole session.
//!
//! [`require_login`] is the guard for routes that need an account. It is
//! attached with `route_layer`, so it only runs for requests that matched one
//! of those routes.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::db::{Database, DbError};
use crate::error::AppError;
use crate::forms::CleanRegistration;
use crate::state::AppState;
use crate::types::{NewUser, User};

pub const USER_ID_KEY: &str = "user_id";
pub const LOGIN_PATH: &str = "/rango/login/";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::Hash(err)
    }
}

/// Result of checking a username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(User),
    /// Right password, but the account is switched off.
    Inactive,
    Invalid,
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. A hash that doesn't parse
/// never matches.
pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Hash the password and store the new account with its profile.
///
/// Hashing and the insert both run on the blocking pool.
pub async fn register(db: &Database, reg: CleanRegistration) -> Result<User, AuthError> {
    let user = db
        .blocking(move |db| -> Result<User, AuthError> {
            let password_hash = hash_password(&reg.password)?;
            Ok(db.create_user(&NewUser {
                username: reg.username,
                email: reg.email,
                password_hash,
                website: reg.website,
            })?)
        })
        .await?;
    info!(username = %user.username, "registered user");
    Ok(user)
}

pub async fn authenticate(
    db: &Database,
    username: String,
    password: String,
) -> Result<LoginOutcome, AuthError> {
    db.blocking(move |db| -> Result<LoginOutcome, AuthError> {
        let Some(user) = db.user_by_username(&username)? else {
            return Ok(LoginOutcome::Invalid);
        };
        if !verify_password(&user.password_hash, &password) {
            return Ok(LoginOutcome::Invalid);
        }
        if !user.is_active {
            return Ok(LoginOutcome::Inactive);
        }
        Ok(LoginOutcome::Success(user))
    })
    .await
}

/// Switch an account on or off. Returns `None` if there's no such user.
pub fn set_active(db: &Database, username: &str, active: bool) -> Result<Option<User>, AuthError> {
    let Some(user) = db.user_by_username(username)? else {
        return Ok(None);
    };
    db.set_user_active(user.id, active)?;
    info!(username, active, "account status changed");
    Ok(Some(User {
        is_active: active,
        ..user
    }))
}

/// Attach `user` to the session under a fresh session id.
pub async fn login(session: &Session, user: &User) -> Result<(), AuthError> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await?;
    info!(username = %user.username, "user logged in");
    Ok(())
}

/// Drop everything in the session, visit counter included.
pub async fn logout(session: &Session) -> Result<(), AuthError> {
    session.flush().await?;
    Ok(())
}

/// The logged-in user, if the session has one that still exists and hasn't
/// been deactivated since logging in.
pub async fn current_user(session: &Session, db: &Database) -> Result<Option<User>, AuthError> {
    let Some(id) = session.get::<i64>(USER_ID_KEY).await? else {
        return Ok(None);
    };
    let user = db.blocking(move |db| db.user_by_id(id)).await?;
    Ok(user.filter(|u| u.is_active))
}

/// Guard for login-only routes: requests without an active account behind
/// them are sent to the login page with the original path in `next`.
pub async fn require_login(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    match current_user(&session, state.db()).await {
        Ok(Some(_)) => next.run(request).await,
        Ok(None) => {
            let path = request.uri().path();
            Redirect::to(&format!("{LOGIN_PATH}?next={path}")).into_response()
        }
        Err(e) => {
            warn!(error = %e, "user lookup failed in login guard");
            AppError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn registration(username: &str, password: &str) -> CleanRegistration {
        CleanRegistration {
            username: username.to_string(),
            email: None,
            password: password.to_string(),
            website: None,
        }
    }

    async fn check(db: &Database, username: &str, password: &str) -> LoginOutcome {
        authenticate(db, username.to_string(), password.to_string())
            .await
            .unwrap()
    }

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("tango").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "tango"));
        assert!(!verify_password(&hash, "salsa"));
    }

    #[test]
    fn same_password_different_hashes() {
        assert_ne!(hash_password("tango").unwrap(), hash_password("tango").unwrap());
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify_password("not-a-phc-string", "anything"));
    }

    #[tokio::test]
    async fn register_stores_hash_not_password() {
        let db = test_db();
        let user = register(&db, registration("leifos", "tango")).await.unwrap();
        assert_ne!(user.password_hash, "tango");
        assert!(verify_password(&user.password_hash, "tango"));
    }

    #[tokio::test]
    async fn register_duplicate_username() {
        let db = test_db();
        register(&db, registration("leifos", "tango")).await.unwrap();
        let err = register(&db, registration("leifos", "salsa"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Database(DbError::Duplicate(_))));
    }

    #[tokio::test]
    async fn authenticate_outcomes() {
        let db = test_db();
        let user = register(&db, registration("leifos", "tango")).await.unwrap();

        assert_eq!(
            check(&db, "leifos", "tango").await,
            LoginOutcome::Success(user.clone())
        );
        assert_eq!(check(&db, "leifos", "salsa").await, LoginOutcome::Invalid);
        assert_eq!(check(&db, "nobody", "tango").await, LoginOutcome::Invalid);

        set_active(&db, "leifos", false).unwrap();
        assert_eq!(check(&db, "leifos", "tango").await, LoginOutcome::Inactive);
        // A disabled account still needs the right password to learn that
        assert_eq!(check(&db, "leifos", "salsa").await, LoginOutcome::Invalid);
    }

    #[tokio::test]
    async fn hashing_leaves_the_runtime_free() {
        let db = test_db();
        let ticker = tokio::spawn(async {
            let mut worst = std::time::Duration::ZERO;
            for _ in 0..50 {
                let start = std::time::Instant::now();
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                worst = worst.max(start.elapsed());
            }
            worst
        });

        for name in ["leifos", "laura", "david"] {
            register(&db, registration(name, "tango")).await.unwrap();
        }
        let worst = ticker.await.unwrap();
        assert!(worst < std::time::Duration::from_millis(250), "stalled {worst:?}");
    }

    #[test]
    fn set_active_unknown_user() {
        let db = test_db();
        assert_eq!(set_active(&db, "nobody", false).unwrap(), None);
    }

    #[test]
    fn set_active_round_trip() {
        let db = seeded_db();
        db.create_user(&NewUser {
            username: "maxwell".to_string(),
            email: None,
            password_hash: "hash".to_string(),
            website: None,
        })
        .unwrap();
        let user = set_active(&db, "maxwell", false).unwrap().unwrap();
        assert!(!user.is_active);
        assert!(!db.user_by_username("maxwell").unwrap().unwrap().is_active);
        assert!(set_active(&db, "maxwell", true).unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn login_then_logout() {
        let db = test_db();
        let user = register(&db, registration("leifos", "tango")).await.unwrap();
        let session = new_session();

        assert_eq!(current_user(&session, &db).await.unwrap(), None);
        login(&session, &user).await.unwrap();
        assert_eq!(current_user(&session, &db).await.unwrap(), Some(user));
        logout(&session).await.unwrap();
        assert_eq!(current_user(&session, &db).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deactivated_user_drops_out_of_session() {
        let db = test_db();
        let user = register(&db, registration("leifos", "tango")).await.unwrap();
        let session = new_session();
        login(&session, &user).await.unwrap();

        set_active(&db, "leifos", false).unwrap();
        assert_eq!(current_user(&session, &db).await.unwrap(), None);
    }
}
