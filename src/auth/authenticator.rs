use std::sync::Arc;

use axum::{extract::FromRef, http::HeaderMap};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::basic::Credentials;
use super::password::{verify_password, VerifyError};
use crate::state::AppState;
use crate::store::{StoreError, UserStore};
use crate::users::repo_types::User;

/// The user a request was authenticated as. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

impl From<User> for Identity {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email_address: u.email_address,
        }
    }
}

/// Why a request was not authenticated. The first three kinds render the same
/// 401; `Store` and `Verify` are infrastructure failures and go down the fatal
/// path.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("no basic credentials on request")]
    NoCredentials,
    #[error("unknown user")]
    UnknownUser,
    #[error("password mismatch")]
    BadPassword,
    #[error("user lookup failed")]
    Store(#[from] StoreError),
    #[error("password check failed")]
    Verify(#[from] VerifyError),
}

/// Resolves Basic credentials against the user store.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
}

impl FromRef<AppState> for Authenticator {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone())
    }
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthFailure> {
        let Some(creds) = Credentials::from_headers(headers) else {
            warn!("auth header not found");
            return Err(AuthFailure::NoCredentials);
        };

        let Some(user) = self.users.find_by_email(&creds.name).await? else {
            warn!(username = %creds.name, "unable to find user for username");
            return Err(AuthFailure::UnknownUser);
        };

        match verify_password(creds.pass, user.password.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = %user.id, username = %user.email_address, "authentication failure");
                return Err(AuthFailure::BadPassword);
            }
            Err(e @ VerifyError::Unparseable(_)) => {
                // stored value is not a hash (written outside the hashing window)
                warn!(user_id = %user.id, error = %e, "stored password is not verifiable");
                return Err(AuthFailure::BadPassword);
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, username = %user.email_address, "authentication successful");
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_policy;
    use crate::store::MemoryStore;
    use crate::users::repo_types::NewUser;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    async fn setup() -> (Authenticator, User) {
        let store = Arc::new(MemoryStore::new(test_policy()));
        let user = store
            .create_user(NewUser {
                first_name: Some("Joe".into()),
                last_name: Some("Smith".into()),
                email_address: Some("joe@smith.com".into()),
                password: Some("joepassword".into()),
            })
            .await
            .unwrap();
        (Authenticator::new(store), user)
    }

    fn basic(name: &str, pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let creds = Credentials {
            name: name.into(),
            pass: pass.into(),
        };
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&creds.encode()).unwrap());
        headers
    }

    #[tokio::test]
    async fn resolves_identity_for_good_credentials() {
        let (auth, user) = setup().await;
        let identity = auth
            .authenticate(&basic("joe@smith.com", "joepassword"))
            .await
            .unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.email_address, "joe@smith.com");
    }

    #[tokio::test]
    async fn missing_header_is_no_credentials() {
        let (auth, _) = setup().await;
        let err = auth.authenticate(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NoCredentials));
    }

    #[tokio::test]
    async fn non_basic_scheme_is_no_credentials() {
        let (auth, _) = setup().await;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let err = auth.authenticate(&headers).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NoCredentials));
    }

    #[tokio::test]
    async fn unknown_email_is_unknown_user() {
        let (auth, _) = setup().await;
        let err = auth
            .authenticate(&basic("nobody@smith.com", "joepassword"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthFailure::UnknownUser));
    }

    #[tokio::test]
    async fn wrong_password_is_bad_password() {
        let (auth, _) = setup().await;
        let err = auth
            .authenticate(&basic("joe@smith.com", "not-his-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthFailure::BadPassword));
    }

    #[tokio::test]
    async fn raw_stored_password_never_authenticates() {
        let store = Arc::new(MemoryStore::new(test_policy()));
        store
            .create_user(NewUser {
                first_name: Some("Sam".into()),
                last_name: Some("Short".into()),
                email_address: Some("sam@short.io".into()),
                password: Some("tiny".into()),
            })
            .await
            .unwrap();
        let auth = Authenticator::new(store);
        let err = auth.authenticate(&basic("sam@short.io", "tiny")).await.unwrap_err();
        assert!(matches!(err, AuthFailure::BadPassword));
    }
}
