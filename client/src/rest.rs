//! HTTP store — the hosted vote table, entry catalog and auth endpoints.
//!
//! Speaks the PostgREST dialect: rows are filtered with `column=eq.value`
//! query parameters and `Prefer: return=representation` makes a PATCH echo
//! back the rows it touched, which is how a missing row is detected.

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use songjam_store::{CatalogStore, IdentityProvider, StoreError, VoteStore};
use songjam_types::{Entry, EntryId, Points, UserId, VoteRecord};

use crate::config::StoreConfig;
use crate::SessionError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct NewVoteRow<'a> {
    user_id: &'a UserId,
    entry_id: &'a EntryId,
    points: Points,
}

#[derive(Serialize)]
struct PointsPatch {
    points: Points,
}

#[derive(Deserialize)]
struct AuthUser {
    id: UserId,
}

/// Vote table, catalog and identity backed by the hosted store's REST API.
#[derive(Clone)]
pub struct RestStore {
    http: reqwest::Client,
    config: StoreConfig,
    access_token: Option<String>,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SessionError::Http(e.to_string()))?;
        Ok(Self {
            http,
            config,
            access_token: None,
        })
    }

    /// Act as the user the OAuth provider issued `token` for.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Where to send the browser to sign in.
    pub fn authorize_url(&self) -> Result<Url, SessionError> {
        Url::parse_with_params(
            &format!("{}/auth/v1/authorize", self.base()),
            [
                ("provider", self.config.oauth_provider.as_str()),
                ("redirect_to", self.config.redirect_url.as_str()),
            ],
        )
        .map_err(|e| SessionError::Config(format!("store.url: {e}")))
    }

    fn base(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{table}", self.base()))
            .map_err(|e| StoreError::Backend(format!("bad store url: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn votes_url(&self, params: &[(&str, String)]) -> Result<Url, StoreError> {
        self.table_url(&self.config.votes_table, params)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(&self.config.anon_key);
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, body = %body, "store request rejected");
        Err(classify_status(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, StoreError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl VoteStore for RestStore {
    async fn fetch_votes(&self, user: &UserId) -> Result<Vec<VoteRecord>, StoreError> {
        let url = self.votes_url(&[
            ("user_id", format!("eq.{user}")),
            ("select", "entry_id,points".to_string()),
        ])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    async fn insert_vote(
        &self,
        user: &UserId,
        entry: &EntryId,
        points: Points,
    ) -> Result<(), StoreError> {
        let url = self.votes_url(&[])?;
        let row = NewVoteRow {
            user_id: user,
            entry_id: entry,
            points,
        };
        self.send(
            self.request(Method::POST, url)
                .header("Prefer", "return=minimal")
                .json(&row),
        )
        .await?;
        Ok(())
    }

    async fn update_vote(
        &self,
        user: &UserId,
        entry: &EntryId,
        new_points: Points,
    ) -> Result<(), StoreError> {
        let url = self.votes_url(&[
            ("user_id", format!("eq.{user}")),
            ("entry_id", format!("eq.{entry}")),
        ])?;
        let rows: Vec<serde_json::Value> = self
            .send_json(
                self.request(Method::PATCH, url)
                    .header("Prefer", "return=representation")
                    .json(&PointsPatch { points: new_points }),
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("{user}/{entry}")));
        }
        Ok(())
    }
}

impl CatalogStore for RestStore {
    async fn fetch_entries(&self) -> Result<Vec<Entry>, StoreError> {
        let url = self.table_url(&self.config.entries_table, &[("select", "*".to_string())])?;
        self.send_json(self.request(Method::GET, url)).await
    }
}

impl IdentityProvider for RestStore {
    async fn current_user(&self) -> Result<Option<UserId>, StoreError> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let url = Url::parse(&format!("{}/auth/v1/user", self.base()))
            .map_err(|e| StoreError::Backend(format!("bad store url: {e}")))?;
        match self.send_json::<AuthUser>(self.request(Method::GET, url)).await {
            Ok(user) => Ok(Some(user.id)),
            Err(StoreError::Unauthorized(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Map a non-success HTTP status to a store error.
fn classify_status(status: StatusCode, body: &str) -> StoreError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };
    match status {
        StatusCode::CONFLICT => StoreError::Conflict(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(detail),
        StatusCode::NOT_FOUND => StoreError::NotFound(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::Transient(detail)
        }
        s if s.is_server_error() => StoreError::Transient(detail),
        _ => StoreError::Backend(detail),
    }
}

fn classify_transport(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Transient(format!("request timed out: {e}"))
    } else if e.is_connect() {
        StoreError::Transient(format!("connection failed: {e}"))
    } else if e.is_builder() {
        StoreError::Backend(e.to_string())
    } else {
        StoreError::Transient(e.to_string())
    }
}
