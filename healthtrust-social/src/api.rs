//! REST client for the HealthTrust application backend.
//!
//! Every call carries the current session token. A 401 from any endpoint
//! destroys the session before the error reaches the caller.

use crate::post::{FeedPage, NewPost};
use crate::session::{Session, SessionManager, User};
use healthtrust_common::{HealthTrustError, Result};
use healthtrust_config::BackendSettings;
use healthtrust_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct BackendApi {
    http: HttpClient,
    session: SessionManager,
}

impl BackendApi {
    pub fn new(settings: &BackendSettings, session: SessionManager) -> Result<Self> {
        let http = HttpClient::new(&settings.base_url)
            .map_err(|e| HealthTrustError::Config(format!("backend URL: {e}")))?
            .with_timeout(Duration::from_secs(settings.timeout_secs));
        Ok(Self { http, session })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn map_error(&self, path: &str, err: HttpError) -> HealthTrustError {
        if err.status() == Some(401) {
            tracing::warn!(path, "backend.unauthorized");
            self.session.invalidate();
            return HealthTrustError::Unauthorized;
        }
        tracing::warn!(path, error = %err, "backend.call.failed");
        HealthTrustError::Service(
            err.api_message()
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
        )
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<Vec<(&str, Cow<'_, str>)>>,
    ) -> Result<T> {
        let token = self.session.token();
        let opts = RequestOpts {
            auth: token.as_deref().map(Auth::Bearer),
            query,
            ..Default::default()
        };
        self.http
            .get_json(path, opts)
            .await
            .map_err(|e| self.map_error(path, e))
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let token = self.session.token();
        let opts = RequestOpts {
            auth: token.as_deref().map(Auth::Bearer),
            ..Default::default()
        };
        self.http
            .post_json(path, body, opts)
            .await
            .map_err(|e| self.map_error(path, e))
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let token = self.session.token();
        let opts = RequestOpts {
            auth: token.as_deref().map(Auth::Bearer),
            ..Default::default()
        };
        self.http
            .put_json(path, body, opts)
            .await
            .map_err(|e| self.map_error(path, e))
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let token = self.session.token();
        let opts = RequestOpts {
            auth: token.as_deref().map(Auth::Bearer),
            ..Default::default()
        };
        self.http
            .delete_json(path, opts)
            .await
            .map_err(|e| self.map_error(path, e))
    }

    /// Adopt `{token, user}` from an auth response when the backend sends one.
    fn adopt_session(&self, body: &Value) -> Result<()> {
        let token = body.get("token").and_then(Value::as_str);
        let user = body
            .get("user")
            .cloned()
            .and_then(|u| serde_json::from_value::<User>(u).ok());
        if let (Some(token), Some(user)) = (token, user) {
            self.session.establish(Session {
                token: token.to_string(),
                user,
            })?;
        }
        Ok(())
    }

    // auth

    pub async fn login(&self, email: &str, password: &str) -> Result<Value> {
        let body: Value = self
            .post("auth/login", &json!({ "email": email, "password": password }))
            .await?;
        self.adopt_session(&body)?;
        Ok(body)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value> {
        let body: Value = self.post("auth/register", request).await?;
        self.adopt_session(&body)?;
        Ok(body)
    }

    /// Server-side logout; the local session is cleared whatever the outcome.
    pub async fn logout(&self) -> Result<()> {
        let outcome: Result<Value> = self.post("auth/logout", &json!({})).await;
        self.session.logout()?;
        outcome.map(|_| ())
    }

    pub async fn get_profile(&self) -> Result<Value> {
        self.get("auth/profile", None).await
    }

    pub async fn update_profile(&self, profile: &Value) -> Result<Value> {
        self.put("auth/profile", profile).await
    }

    // posts

    pub async fn get_feed(&self, page: u32, limit: u32) -> Result<FeedPage> {
        let query = vec![
            ("page", Cow::Owned(page.to_string())),
            ("limit", Cow::Owned(limit.to_string())),
        ];
        self.get("posts/feed", Some(query)).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Value> {
        self.post("posts", post).await
    }

    pub async fn like_post(&self, post_id: u64) -> Result<Value> {
        self.post(&format!("posts/{post_id}/like"), &json!({})).await
    }

    pub async fn comment_on_post(&self, post_id: u64, comment: &str) -> Result<Value> {
        self.post(&format!("posts/{post_id}/comments"), &json!({ "comment": comment }))
            .await
    }

    pub async fn request_fact_check(&self, post_id: u64) -> Result<Value> {
        self.post(&format!("posts/{post_id}/fact-check"), &json!({}))
            .await
    }

    pub async fn report_post(&self, post_id: u64, reason: &str) -> Result<Value> {
        self.post(&format!("posts/{post_id}/report"), &json!({ "reason": reason }))
            .await
    }

    // community

    pub async fn get_users(&self, page: u32, limit: u32) -> Result<Value> {
        let query = vec![
            ("page", Cow::Owned(page.to_string())),
            ("limit", Cow::Owned(limit.to_string())),
        ];
        self.get("community/users", Some(query)).await
    }

    pub async fn follow_user(&self, user_id: u64) -> Result<Value> {
        self.post(&format!("community/follow/{user_id}"), &json!({}))
            .await
    }

    pub async fn unfollow_user(&self, user_id: u64) -> Result<Value> {
        self.delete(&format!("community/follow/{user_id}")).await
    }

    pub async fn get_user_profile(&self, user_id: u64) -> Result<Value> {
        self.get(&format!("community/users/{user_id}"), None).await
    }

    pub async fn get_followers(&self, user_id: u64) -> Result<Value> {
        self.get(&format!("community/users/{user_id}/followers"), None)
            .await
    }

    pub async fn get_following(&self, user_id: u64) -> Result<Value> {
        self.get(&format!("community/users/{user_id}/following"), None)
            .await
    }
}
