//! Firebase backend over `fetch`
//!
//! Anonymous sign-in via the Identity Toolkit REST API and the Realtime
//! Database REST API for score records. The session token from sign-in is
//! shared with the database handle so writes pass the security rules, and
//! is refreshed before it expires.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::token::{REFRESH_URL, RefreshResponse, SessionToken, SignUpResponse};
use super::{ScoreStore, filter_equal_to, order_by_child};
use crate::error::{Error, Result};
use crate::identity::{AnonymousAuth, PlayerIdentity};
use crate::platform::now_ms;
use crate::settings::Settings;

const SIGN_UP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Session token shared between auth and database handles
pub type SharedToken = Rc<RefCell<Option<SessionToken>>>;

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("HTTP 401: {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Failed(String),
}

fn js_err(e: wasm_bindgen::JsValue) -> FetchError {
    FetchError::Failed(format!("{:?}", e))
}

/// Issue a request and return the response body; non-2xx is an error
async fn fetch_text(
    method: &str,
    url: &str,
    content_type: &str,
    body: Option<&str>,
) -> std::result::Result<String, FetchError> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = body {
        opts.set_body(&wasm_bindgen::JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;
    request
        .headers()
        .set("Content-Type", content_type)
        .map_err(js_err)?;

    let window = web_sys::window().ok_or_else(|| FetchError::Failed("no window".into()))?;
    let resp = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_err)?;
    let resp: Response = resp.dyn_into().map_err(js_err)?;

    let text = JsFuture::from(resp.text().map_err(js_err)?)
        .await
        .map_err(js_err)?
        .as_string()
        .unwrap_or_default();

    match resp.status() {
        _ if resp.ok() => Ok(text),
        401 => Err(FetchError::Unauthorized(text)),
        status => Err(FetchError::Failed(format!("HTTP {}: {}", status, text))),
    }
}

/// REST query results come back as an unordered object (or null when empty)
fn children_of(body: &str) -> Result<Vec<(String, Value)>> {
    match serde_json::from_str::<Value>(body).map_err(|e| Error::StoreUnavailable(e.to_string()))? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::StoreUnavailable(format!(
            "unexpected query result: {}",
            other
        ))),
    }
}

/// Anonymous sign-in against the Identity Toolkit
#[derive(Debug, Clone)]
pub struct FirebaseAuth {
    api_key: String,
    token: SharedToken,
}

impl FirebaseAuth {
    pub fn new(settings: &Settings, token: SharedToken) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            token,
        }
    }
}

impl AnonymousAuth for FirebaseAuth {
    async fn sign_in_anonymously(&self) -> Result<PlayerIdentity> {
        let url = format!("{}?key={}", SIGN_UP_URL, self.api_key);
        let body = fetch_text("POST", &url, JSON, Some(r#"{"returnSecureToken":true}"#))
            .await
            .map_err(|e| Error::AuthUnavailable(e.to_string()))?;
        let resp: SignUpResponse =
            serde_json::from_str(&body).map_err(|e| Error::AuthUnavailable(e.to_string()))?;

        *self.token.borrow_mut() = Some(SessionToken::from_sign_up(&resp, now_ms()));
        // A uid the store cannot key on is as good as no uid
        PlayerIdentity::new(resp.local_id)
            .map_err(|_| Error::AuthUnavailable("provider returned an unusable id".into()))
    }
}

/// Realtime Database REST client
#[derive(Debug, Clone)]
pub struct FirebaseDatabase {
    root: String,
    api_key: String,
    token: SharedToken,
}

impl FirebaseDatabase {
    pub fn new(settings: &Settings, token: SharedToken) -> Self {
        Self {
            root: settings.database_root().to_string(),
            api_key: settings.api_key.clone(),
            token,
        }
    }

    fn url(&self, path: &str, query: &str, id_token: Option<&str>) -> String {
        let mut url = format!("{}/{}.json", self.root, path.trim_matches('/'));
        let mut sep = '?';
        if !query.is_empty() {
            url.push(sep);
            url.push_str(query);
            sep = '&';
        }
        if let Some(token) = id_token {
            url.push(sep);
            url.push_str("auth=");
            url.push_str(token);
        }
        url
    }

    /// Current id token, exchanged first if it is about to lapse or `force`
    async fn id_token(&self, force: bool) -> Result<Option<String>> {
        let current = self.token.borrow().clone();
        let Some(mut token) = current else {
            return Ok(None);
        };

        if force || token.needs_refresh(now_ms()) {
            let url = format!("{}?key={}", REFRESH_URL, self.api_key);
            let body = fetch_text("POST", &url, FORM, Some(&token.refresh_body()))
                .await
                .map_err(|e| Error::StoreUnavailable(format!("token refresh failed: {}", e)))?;
            let resp: RefreshResponse = serde_json::from_str(&body)
                .map_err(|e| Error::StoreUnavailable(format!("token refresh failed: {}", e)))?;
            token
                .apply_refresh(resp, now_ms())
                .map_err(|e| Error::StoreUnavailable(format!("token refresh failed: {}", e)))?;
            log::info!("Refreshed session token, valid until {}", token.expires_at_ms());
            *self.token.borrow_mut() = Some(token.clone());
        }
        Ok(Some(token.id_token().to_string()))
    }

    /// Send a request with the session token, refreshing and retrying once
    /// if the store rejects it.
    async fn send(&self, method: &str, path: &str, query: &str, body: Option<&str>) -> Result<String> {
        let id_token = self.id_token(false).await?;
        let url = self.url(path, query, id_token.as_deref());
        match fetch_text(method, &url, JSON, body).await {
            Ok(text) => Ok(text),
            Err(FetchError::Unauthorized(msg)) if id_token.is_some() => {
                log::warn!("Store rejected the session token: {}", msg);
                let id_token = self.id_token(true).await?;
                let url = self.url(path, query, id_token.as_deref());
                fetch_text(method, &url, JSON, body)
                    .await
                    .map_err(|e| Error::StoreUnavailable(e.to_string()))
            }
            Err(e) => Err(Error::StoreUnavailable(e.to_string())),
        }
    }
}

impl ScoreStore for FirebaseDatabase {
    async fn write(&self, path: &str, value: &Value) -> Result<()> {
        self.send("PUT", path, "", Some(&value.to_string())).await?;
        Ok(())
    }

    async fn read_ordered_by_child(
        &self,
        collection: &str,
        child: &str,
        limit_to_last: usize,
    ) -> Result<Vec<(String, Value)>> {
        let query = format!("orderBy=%22{}%22&limitToLast={}", child, limit_to_last);
        let body = self.send("GET", collection, &query, None).await?;
        Ok(order_by_child(children_of(&body)?, child, limit_to_last))
    }

    async fn read_equal_to(
        &self,
        collection: &str,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>> {
        let encoded = String::from(js_sys::encode_uri_component(&value.to_string()));
        let query = format!("orderBy=%22{}%22&equalTo={}", child, encoded);
        let body = self.send("GET", collection, &query, None).await?;
        Ok(filter_equal_to(children_of(&body)?, child, value))
    }
}
