//! Typed calls against the adoption backend.
//!
//! Every call goes through the resilient [`RequestClient`]. Authenticated
//! calls read the bearer token from the [`SessionStore`]; any 401 clears that
//! session before the error reaches the caller.

pub mod endpoints;

use std::time::Duration;

use chrono::Utc;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ApiRequest, ClientError, RawResponse, RequestClient, RetryPolicy};
use crate::models::{
    Animal, AnimalUpdateResponse, ApiMessage, Donation, DonationMessage, DonationRequest,
    LoginRequest, LoginResponse, RegisterRequest, User, VolunteerApplication,
};
use crate::session::{Session, SessionError, SessionStore};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("login response did not include a token")]
    MissingToken,

    #[error("{what} '{id}' was not found")]
    NotFound { what: &'static str, id: String },

    #[error("invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("missing path parameter '{name}'")]
    MissingPathParam { name: String },

    #[error("{0}")]
    Validation(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ApiError::Client(e) => e.is_unauthorized() || matches!(e, ClientError::AuthRequired),
            _ => false,
        }
    }

    /// Text suitable for a one-line notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub struct ApiService {
    client: RequestClient,
    base_url: Url,
    session: SessionStore,
    health_policy: RetryPolicy,
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("base_url", &self.base_url.as_str())
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl ApiService {
    pub fn new(client: RequestClient, base_url: &str, session: SessionStore) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim()).map_err(|_| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        Ok(Self {
            client,
            base_url,
            session,
            health_policy: RetryPolicy::single_attempt(HEALTH_TIMEOUT),
        })
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_policy = RetryPolicy::single_attempt(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(
        &self,
        template: &str,
        params: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<String, ApiError> {
        Ok(endpoints::build_url(&self.base_url, template, params, query)?.into())
    }

    fn request(&self, method: Method, url: String) -> ApiRequest {
        ApiRequest::new(method, url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
    }

    fn with_body<T: Serialize>(request: ApiRequest, body: &T) -> Result<ApiRequest, ApiError> {
        Ok(request.json(serde_json::to_value(body)?))
    }

    /// Attaches the stored token, or fails before anything is sent.
    fn authed(&self, request: ApiRequest) -> Result<ApiRequest, ApiError> {
        let token = self.session.token().ok_or(ClientError::AuthRequired)?;
        Ok(request.bearer(&token))
    }

    fn maybe_authed(&self, request: ApiRequest) -> ApiRequest {
        match self.session.token() {
            Some(token) => request.bearer(&token),
            None => request,
        }
    }

    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        match self.client.execute(&request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                if err.is_unauthorized() {
                    warn!(url = %request.url, "unauthorized response, clearing local session");
                    if let Err(e) = self.session.clear() {
                        warn!(error = %e, "failed to clear session");
                    }
                }
                Err(err.into())
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        Ok(self.send(request).await?.json()?)
    }

    async fn send_message(&self, request: ApiRequest) -> Result<ApiMessage, ApiError> {
        let response = self.send(request).await?;
        // Some endpoints answer with plain text instead of a JSON object.
        match response.json::<Option<ApiMessage>>() {
            Ok(message) => Ok(message.unwrap_or_default()),
            Err(_) => {
                let text = response.text();
                Ok(ApiMessage {
                    message: Some(text.trim().to_string()).filter(|s| !s.is_empty()),
                })
            }
        }
    }

    pub async fn register(&self, form: &RegisterRequest) -> Result<ApiMessage, ApiError> {
        for (field, value) in [
            ("name", &form.name),
            ("email", &form.email),
            ("password", &form.password),
            ("phone", &form.phone),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::Validation(format!("{field} is required")));
            }
        }
        let url = self.url(endpoints::REGISTER, &[], &[])?;
        let request = Self::with_body(self.request(Method::POST, url), form)?;
        let message = self.send_message(request).await?;
        info!(email = %form.email, "registered");
        Ok(message)
    }

    /// Logs in and persists the session. A response without a token is a
    /// failure and leaves the stored session untouched.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Session, ApiError> {
        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        let url = self.url(endpoints::LOGIN, &[], &[])?;
        let request = Self::with_body(self.request(Method::POST, url), credentials)?;
        let response: Option<LoginResponse> = self.send_json(request).await?;
        let response = response.unwrap_or_default();

        let token = response
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ApiError::MissingToken)?;
        self.session.save(&token, response.user.as_ref())?;
        info!(email = %credentials.email, "logged in");
        Ok(Session {
            token,
            user: response.user,
        })
    }

    /// Clears the local session first; the server call is best effort.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let token = self.session.token();
        self.session.clear()?;

        let url = self.url(endpoints::LOGOUT, &[], &[])?;
        let mut request = self.request(Method::POST, url);
        if let Some(token) = token {
            request = request.bearer(&token);
        }
        // Best effort: one attempt, short timeout.
        if let Err(e) = self.client.execute_with(&request, &self.health_policy).await {
            debug!(error = %e, "logout call failed, local session already cleared");
        }
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        let url = self.url(endpoints::CURRENT_USER, &[], &[])?;
        let request = self.authed(self.request(Method::GET, url))?;
        self.send_json(request).await
    }

    pub async fn available_animals(&self) -> Result<Vec<Animal>, ApiError> {
        let url = self.url(endpoints::ANIMALS_AVAILABLE, &[], &[])?;
        self.fetch_animals(self.request(Method::GET, url)).await
    }

    /// Includes adopted and reserved records.
    pub async fn all_animals(&self) -> Result<Vec<Animal>, ApiError> {
        let url = self.url(endpoints::ANIMALS_ALL, &[], &[])?;
        let request = self.authed(self.request(Method::GET, url))?;
        self.fetch_animals(request).await
    }

    pub async fn search_animals(&self, term: &str) -> Result<Vec<Animal>, ApiError> {
        let url = self.url(endpoints::ANIMAL_SEARCH, &[], &[("q", term.trim().to_string())])?;
        self.fetch_animals(self.request(Method::GET, url)).await
    }

    async fn fetch_animals(&self, request: ApiRequest) -> Result<Vec<Animal>, ApiError> {
        let animals: Option<Vec<Animal>> = self.send_json(request).await?;
        let animals: Vec<Animal> = animals
            .unwrap_or_default()
            .into_iter()
            .map(Animal::normalized)
            .collect();
        debug!(count = animals.len(), "fetched animals");
        Ok(animals)
    }

    pub async fn animal(&self, id: &str) -> Result<Animal, ApiError> {
        let url = self.url(endpoints::ANIMAL_DETAIL, &[("id", id)], &[])?;
        let animal: Option<Animal> = self.send_json(self.request(Method::GET, url)).await?;
        animal.map(Animal::normalized).ok_or_else(|| ApiError::NotFound {
            what: "animal",
            id: id.to_string(),
        })
    }

    pub async fn update_animal(&self, id: &str, animal: &Animal) -> Result<Animal, ApiError> {
        let url = self.url(endpoints::ANIMAL_DETAIL, &[("id", id)], &[])?;
        let request = self.authed(self.request(Method::PUT, url))?;
        let request = Self::with_body(request, animal)?;
        let response: Option<AnimalUpdateResponse> = self.send_json(request).await?;
        let updated = response
            .and_then(|r| r.animal)
            .unwrap_or_else(|| animal.clone())
            .normalized();
        info!(id, "animal updated");
        Ok(updated)
    }

    pub async fn submit_volunteer_application(
        &self,
        application: &VolunteerApplication,
    ) -> Result<ApiMessage, ApiError> {
        if application.email.trim().is_empty() {
            return Err(ApiError::Validation("email is required".to_string()));
        }
        let url = self.url(endpoints::VOLUNTEER_APPLY, &[], &[])?;
        let request = self.maybe_authed(self.request(Method::POST, url));
        let request = Self::with_body(request, application)?;
        self.send_message(request).await
    }

    pub async fn process_donation(&self, donation: &DonationRequest) -> Result<ApiMessage, ApiError> {
        if !(donation.amount > 0.0 && donation.amount.is_finite()) {
            return Err(ApiError::Validation(
                "donation amount must be greater than zero".to_string(),
            ));
        }
        let has_email = donation
            .donor_email
            .as_deref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false);
        if !has_email && donation.user_id.is_none() {
            return Err(ApiError::Validation(
                "Please provide your email address or login first.".to_string(),
            ));
        }
        let url = self.url(endpoints::DONATE, &[], &[])?;
        let request = self.maybe_authed(self.request(Method::POST, url));
        let request = Self::with_body(request, donation)?;
        self.send_message(request).await
    }

    pub async fn recent_donations(&self, limit: usize) -> Result<Vec<DonationMessage>, ApiError> {
        let url = self.url(endpoints::RECENT_DONATIONS, &[], &[("limit", limit.to_string())])?;
        let donations: Option<Vec<Donation>> =
            self.send_json(self.request(Method::GET, url)).await?;
        let now = Utc::now();
        Ok(donations
            .unwrap_or_default()
            .iter()
            .take(limit)
            .map(|d| d.to_message(now))
            .collect())
    }

    /// Single short attempt; any failure reads as unhealthy.
    pub async fn check_health(&self) -> bool {
        let url = match self.url(endpoints::HEALTH, &[], &[]) {
            Ok(url) => url,
            Err(_) => return false,
        };
        let request = ApiRequest::get(url);
        match self.client.execute_with(&request, &self.health_policy).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "backend health check failed");
                false
            }
        }
    }
}
