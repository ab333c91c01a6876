//! Teacher identity provider
//!
//! `SupabaseIdentity` talks to the GoTrue REST API. `MemoryIdentity` keeps
//! accounts in process for local development and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use maum_core::credentials::{generate_session_token, hash_token};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::AuthError;

/// Provider request timeout.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifetime of tokens minted by [`MemoryIdentity`], in seconds.
const MEMORY_TOKEN_TTL: i64 = 3600;

/// Longest provider error text carried into responses and logs.
const MAX_ERROR_LEN: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub access_token: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: ProviderUser,
    /// Absent when the provider requires e-mail confirmation first
    pub session: Option<ProviderSession>,
}

#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: ProviderUser,
    pub session: ProviderSession,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Resolve an access token. `Ok(None)` when the token is unknown or expired.
    async fn user(&self, access_token: &str) -> Result<Option<ProviderUser>, AuthError>;
}

// ============================================================================
// Supabase GoTrue
// ============================================================================

#[derive(Serialize)]
struct PasswordBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Token grant, also returned by sign-up when confirmation is off
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: ProviderUser,
}

/// Sign-up answers either with a full session or with the bare user
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(ProviderUser),
}

pub struct SupabaseIdentity {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseIdentity {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(PROVIDER_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/auth/v1", url.trim_end_matches('/')),
            anon_key: anon_key.to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_password(&self, path: &str, email: &str, password: &str) -> Result<Response, AuthError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .header("apikey", &self.anon_key)
            .json(&PasswordBody { email, password })
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let response = self.post_password("/signup", email, password).await?;
        let outcome = match response.json::<SignUpResponse>().await? {
            SignUpResponse::Session(token) => SignUpOutcome {
                user: token.user,
                session: Some(ProviderSession {
                    access_token: token.access_token,
                    expires_in: token.expires_in,
                }),
            },
            SignUpResponse::User(user) => SignUpOutcome { user, session: None },
        };
        Ok(outcome)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError> {
        let response = self
            .post_password("/token?grant_type=password", email, password)
            .await?;
        let token: TokenResponse = response.json().await?;
        Ok(SignInOutcome {
            user: token.user,
            session: ProviderSession {
                access_token: token.access_token,
                expires_in: token.expires_in,
            },
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.endpoint("/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        // An already-dead token is as good as logged out
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn user(&self, access_token: &str) -> Result<Option<ProviderUser>, AuthError> {
        let response = self
            .client
            .get(self.endpoint("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            _ => {
                let response = check_status(response).await?;
                Ok(Some(response.json().await?))
            }
        }
    }
}

/// Pass 2xx responses through; turn everything else into an `AuthError`.
async fn check_status(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = provider_message(&body);
    if status.is_client_error() {
        Err(AuthError::Rejected(message))
    } else {
        Err(AuthError::Protocol(format!("{}: {}", status, message)))
    }
}

/// Pull a human-readable message out of a GoTrue error body.
fn provider_message(body: &str) -> String {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct ErrorBody {
        error_description: Option<String>,
        msg: Option<String>,
        message: Option<String>,
        error: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| body.trim().to_owned());

    if message.is_empty() {
        return "authentication failed".to_owned();
    }
    message.chars().take(MAX_ERROR_LEN).collect()
}

// ============================================================================
// In-memory
// ============================================================================

struct MemoryAccount {
    id: Uuid,
    password_hash: String,
}

#[derive(Default)]
struct MemoryStore {
    accounts: HashMap<String, MemoryAccount>,
    tokens: HashMap<String, ProviderUser>,
}

/// Accounts and tokens held in process. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryIdentity {
    store: Mutex<MemoryStore>,
}

impl MemoryIdentity {
    fn issue(store: &mut MemoryStore, user: &ProviderUser) -> ProviderSession {
        let access_token = generate_session_token();
        store.tokens.insert(access_token.clone(), user.clone());
        ProviderSession {
            access_token,
            expires_in: MEMORY_TOKEN_TTL,
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let email = email.to_lowercase();
        let mut store = self.store.lock().await;
        if store.accounts.contains_key(&email) {
            return Err(AuthError::Rejected("User already registered".into()));
        }

        let user = ProviderUser {
            id: Uuid::new_v4(),
            email: Some(email.clone()),
        };
        store.accounts.insert(
            email,
            MemoryAccount {
                id: user.id,
                password_hash: hash_token(password),
            },
        );
        let session = Self::issue(&mut store, &user);

        Ok(SignUpOutcome {
            user,
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError> {
        let email = email.to_lowercase();
        let mut store = self.store.lock().await;
        let user = match store.accounts.get(&email) {
            Some(account) if account.password_hash == hash_token(password) => ProviderUser {
                id: account.id,
                email: Some(email.clone()),
            },
            _ => return Err(AuthError::Rejected("Invalid login credentials".into())),
        };
        let session = Self::issue(&mut store, &user);

        Ok(SignInOutcome { user, session })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.store.lock().await.tokens.remove(access_token);
        Ok(())
    }

    async fn user(&self, access_token: &str) -> Result<Option<ProviderUser>, AuthError> {
        Ok(self.store.lock().await.tokens.get(access_token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(provider_message(body), "Invalid login credentials");
    }

    #[test]
    fn provider_message_reads_msg() {
        let body = r#"{"code":422,"msg":"User already registered"}"#;
        assert_eq!(provider_message(body), "User already registered");
    }

    #[test]
    fn provider_message_falls_back_to_body() {
        assert_eq!(provider_message("  gateway down "), "gateway down");
        assert_eq!(provider_message(""), "authentication failed");
    }

    #[test]
    fn sign_up_response_variants() {
        let id = Uuid::new_v4();
        let session = format!(
            r#"{{"access_token":"a","token_type":"bearer","expires_in":3600,"refresh_token":"r","user":{{"id":"{id}","email":"t@school.kr"}}}}"#
        );
        assert!(matches!(
            serde_json::from_str::<SignUpResponse>(&session).unwrap(),
            SignUpResponse::Session(_)
        ));

        let bare = format!(r#"{{"id":"{id}","email":"t@school.kr","confirmation_sent_at":"2024-03-01T00:00:00Z"}}"#);
        match serde_json::from_str::<SignUpResponse>(&bare).unwrap() {
            SignUpResponse::User(user) => assert_eq!(user.id, id),
            SignUpResponse::Session(_) => panic!("expected bare user"),
        }
    }

    #[test]
    fn endpoints_strip_trailing_slash() {
        let identity = SupabaseIdentity::new("https://x.supabase.co/", "anon").unwrap();
        assert_eq!(identity.endpoint("/user"), "https://x.supabase.co/auth/v1/user");
    }

    #[tokio::test]
    async fn memory_round_trip() {
        let identity = MemoryIdentity::default();
        let signed_up = identity.sign_up("T@School.kr", "password1").await.unwrap();
        let session = signed_up.session.unwrap();

        let user = identity.user(&session.access_token).await.unwrap().unwrap();
        assert_eq!(user.id, signed_up.user.id);

        let signed_in = identity.sign_in("t@school.kr", "password1").await.unwrap();
        assert_eq!(signed_in.user.id, signed_up.user.id);

        identity.sign_out(&session.access_token).await.unwrap();
        assert!(identity.user(&session.access_token).await.unwrap().is_none());
        assert!(identity.user(&signed_in.session.access_token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn memory_rejects_bad_password_and_duplicates() {
        let identity = MemoryIdentity::default();
        identity.sign_up("t@school.kr", "password1").await.unwrap();

        assert!(matches!(
            identity.sign_in("t@school.kr", "wrong-pass").await,
            Err(AuthError::Rejected(_))
        ));
        assert!(matches!(
            identity.sign_up("t@school.kr", "password2").await,
            Err(AuthError::Rejected(_))
        ));
    }
}
