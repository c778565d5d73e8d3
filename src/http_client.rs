use anyhow::{Context, Result as AnyResult};
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Request, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{SessionManager, TokenRefresher};
use crate::error::{ApiError, Result};
use crate::navigation::Navigator;

/// Default API origin
pub const DEFAULT_BASE_URL: &str = "https://club-applications-d42c9d50a2b6.herokuapp.com/api/";

/// Default token refresh endpoint
pub const DEFAULT_REFRESH_URL: &str = "http://127.0.0.1:8000/api/login/refresh/";

/// Default login entry point for forced redirects
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// A 401 triggers at most this many refresh-and-retry rounds per request
const MAX_AUTH_RETRIES: u32 = 1;

/// Value of the `Authorization` header for an access token
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// One field of a multipart payload
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        data: Bytes,
    },
}

impl MultipartField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        MultipartField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: Bytes) -> Self {
        MultipartField::File {
            name: name.into(),
            file_name: file_name.into(),
            data,
        }
    }
}

/// Request payload, sent as given
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<MultipartField>),
}

/// Outbound request descriptor
///
/// Never mutated by the client: each attempt builds a fresh request from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }
}

/// Connection settings for [`ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub refresh_url: String,
    pub login_path: String,
    pub connect_timeout: u64,
    pub request_timeout: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_url: DEFAULT_REFRESH_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            connect_timeout: 30,
            request_timeout: 300,
        }
    }
}

/// HTTP client for the club recruitment API
///
/// Attaches the stored access token to every request and renews it once when
/// the API answers 401.
pub struct ApiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Base URL, always ending in `/`
    base_url: Url,

    /// Session credentials
    session: Arc<SessionManager>,

    /// Token renewal, on its own client
    refresher: TokenRefresher,
}

impl ApiClient {
    pub fn new(
        options: ClientOptions,
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
    ) -> AnyResult<Self> {
        let base_url = normalize_base_url(&options.base_url)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(options.connect_timeout))
            .timeout(Duration::from_secs(options.request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        let refresh_client = Client::builder()
            .connect_timeout(Duration::from_secs(options.connect_timeout))
            .timeout(Duration::from_secs(options.request_timeout))
            .build()
            .context("Failed to create refresh HTTP client")?;

        let refresher = TokenRefresher::new(
            refresh_client,
            options.refresh_url,
            session.clone(),
            navigator,
            options.login_path,
        );

        Ok(Self {
            client,
            base_url,
            session,
            refresher,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Execute a request, renewing the access token once on 401
    ///
    /// A 2xx response is returned untouched. Any other status becomes
    /// [`ApiError::Status`]; a failed renewal becomes [`ApiError::SessionExpired`].
    pub async fn request(&self, request: &ApiRequest) -> Result<Response> {
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Response> {
        let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let mut token = self.session.access_token()?;
        let mut attempt: u32 = 0;

        tracing::debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            authenticated = token.is_some(),
            "Sending API request"
        );

        loop {
            let req = self.build_request(request, token.as_deref())?;
            let url = req.url().clone();

            let response = self.client.execute(req).await.map_err(|e| {
                let err = ApiError::transport(e);
                tracing::warn!(
                    request_id = %request_id,
                    url = %url,
                    attempt = attempt + 1,
                    error = %err,
                    "HTTP request error"
                );
                err
            })?;

            let status = response.status();
            if status.is_success() {
                tracing::debug!(request_id = %request_id, status = %status, "Request successful");
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED && attempt < MAX_AUTH_RETRIES {
                tracing::warn!(
                    request_id = %request_id,
                    url = %url,
                    "Received 401, renewing access token and retrying..."
                );

                let renewed = self.refresher.renew(token.as_deref()).await.map_err(|e| {
                    tracing::error!(request_id = %request_id, "Token renewal failed: {}", e);
                    ApiError::SessionExpired(e)
                })?;

                token = Some(renewed);
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                request_id = %request_id,
                status = status.as_u16(),
                url = %url,
                attempt = attempt + 1,
                response_body = %body,
                "API request failed with error response"
            );

            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
    }

    /// Build one attempt of `request`, attaching `token` when present
    pub fn build_request(&self, request: &ApiRequest, token: Option<&str>) -> Result<Request> {
        let url = self.url_for(&request.path)?;
        let mut builder = self.client.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, bearer(token));
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)),
        };

        builder.build().map_err(ApiError::transport)
    }

    /// Resolve a relative path against the base URL
    pub fn url_for(&self, path: &str) -> Result<Url> {
        let relative = path.trim_start_matches('/');
        let url = self
            .base_url
            .join(relative)
            .map_err(|e| ApiError::InvalidPath(format!("{}: {}", path, e)))?;

        // Absolute URLs in `path` would escape the API origin
        if !url.as_str().starts_with(self.base_url.as_str()) {
            return Err(ApiError::InvalidPath(format!(
                "{} is outside {}",
                path, self.base_url
            )));
        }

        Ok(url)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.request(&ApiRequest::get(path)).await
    }

    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.with_query(*k, *v));
        self.request(&request).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.get(path).await?).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        decode(self.get_with_query(path, query).await?).await
    }

    /// Send a JSON body with any method and decode the JSON response
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::new(method, path).with_json(serde_json::to_value(body)?);
        decode(self.request(&request).await?).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Vec<MultipartField>,
    ) -> Result<T> {
        let request = ApiRequest::post(path).with_multipart(fields);
        decode(self.request(&request).await?).await
    }

    /// DELETE a resource, discarding the (usually empty) response body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(&ApiRequest::delete(path)).await?;
        Ok(())
    }
}

/// Decode a JSON response body
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json().await.map_err(ApiError::Decode)
}

fn normalize_base_url(raw: &str) -> AnyResult<Url> {
    let mut url = Url::parse(raw).with_context(|| format!("Invalid API base URL: {}", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_form(fields: &[MultipartField]) -> Form {
    fields.iter().fold(Form::new(), |form, field| match field {
        MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
        MultipartField::File {
            name,
            file_name,
            data,
        } => form.part(
            name.clone(),
            Part::bytes(data.to_vec()).file_name(file_name.clone()),
        ),
    })
}
