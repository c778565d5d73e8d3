// Token refresh logic

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use std::sync::{Arc, Mutex};

use super::manager::SessionManager;
use super::types::{RefreshRequest, RefreshResponse};
use crate::error::{classify_transport_error, RefreshError};
use crate::navigation::Navigator;

type RefreshFlight = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// Exchange the stored refresh token for a new access token
///
/// Runs on a bare client so the call never goes through the API client's own
/// 401 handling. The new access token is written to the session on success.
pub async fn refresh_access_token(
    client: &Client,
    refresh_url: &str,
    session: &SessionManager,
) -> Result<String, RefreshError> {
    let refresh_token = session
        .refresh_token()?
        .filter(|t| !t.trim().is_empty())
        .ok_or(RefreshError::MissingRefreshToken)?;

    tracing::info!("Refreshing access token...");

    let response = client
        .post(refresh_url)
        .json(&RefreshRequest {
            refresh: &refresh_token,
        })
        .send()
        .await
        .map_err(|e| {
            let kind = classify_transport_error(&e);
            tracing::warn!(error_kind = kind, error = %e, url = refresh_url, "Refresh request error");
            RefreshError::Transport(format!("{} (kind: {})", e, kind))
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %body,
            "Token refresh rejected"
        );
        return Err(RefreshError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let data: RefreshResponse = response
        .json()
        .await
        .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

    if data.access.is_empty() {
        return Err(RefreshError::InvalidResponse(
            "response does not contain an access token".to_string(),
        ));
    }

    session.update_access_token(&data.access)?;
    tracing::info!("Access token refreshed");

    Ok(data.access)
}

/// Coordinates token renewal for every request sharing a session
///
/// Requests that hit 401 while a refresh is running wait for that refresh
/// instead of starting their own. A failed refresh clears the tokens and
/// redirects to the login entry once, inside the shared flight.
pub struct TokenRefresher {
    client: Client,
    refresh_url: String,
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    in_flight: Mutex<Option<RefreshFlight>>,
}

impl TokenRefresher {
    pub fn new(
        client: Client,
        refresh_url: impl Into<String>,
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            refresh_url: refresh_url.into(),
            session,
            navigator,
            login_path: login_path.into(),
            in_flight: Mutex::new(None),
        }
    }

    /// Get an access token to replace `rejected`, the token a 401 answered
    ///
    /// If storage already holds a different token, a concurrent request has
    /// renewed it and no refresh call is made.
    pub async fn renew(&self, rejected: Option<&str>) -> Result<String, RefreshError> {
        let flight = {
            let mut slot = self
                .in_flight
                .lock()
                .map_err(|_| RefreshError::Store("refresh slot lock poisoned".to_string()))?;

            match slot.as_ref() {
                Some(flight) if flight.peek().is_none() => {
                    tracing::debug!("Joining in-flight token refresh");
                    flight.clone()
                }
                _ => {
                    if let Some(current) = self.session.access_token()? {
                        if rejected != Some(current.as_str()) {
                            tracing::debug!("Access token already renewed by another request");
                            return Ok(current);
                        }
                    }

                    let flight = self.start_flight();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    fn start_flight(&self) -> RefreshFlight {
        let client = self.client.clone();
        let refresh_url = self.refresh_url.clone();
        let session = self.session.clone();
        let navigator = self.navigator.clone();
        let login_path = self.login_path.clone();

        async move {
            let result = refresh_access_token(&client, &refresh_url, &session).await;

            if let Err(ref e) = result {
                tracing::error!("Token refresh failed, abandoning session: {}", e);
                if let Err(store_err) = session.clear_tokens() {
                    tracing::error!("Failed to clear tokens: {}", store_err);
                }
                navigator.redirect(&login_path);
            }

            result
        }
        .boxed()
        .shared()
    }
}
