use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::MarketplaceAuth;
use crate::models::event::{
    CancelRequest, DoorSalesOnlyRequest, DraftCreated, EventListResponse, EventPayload,
    PostponeRequest, SoldOutRequest, StatusChanged,
};
use crate::models::form::{EventDraftPayload, SectionId};

/// Failure taxonomy for marketplace API calls.
///
/// Autosave callers swallow `Transport` and retry on the next edit; explicit
/// actions surface every variant. `BusinessRule` carries the server message
/// verbatim so the dashboard can show it unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("marketplace api unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("organizer session expired")]
    SessionExpired,
    #[error("submission rejected: {message}")]
    Rejected {
        sections: Vec<SectionId>,
        message: String,
    },
    #[error("{0}")]
    BusinessRule(String),
    #[error("draft session is closed")]
    SessionClosed,
    #[error("unexpected response status: {0}")]
    Unexpected(StatusCode),
}

// Error body the API attaches to 4xx responses. A submit rejection lists the
// sections whose fields failed server-side validation.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    sections: Vec<SectionId>,
}

/// The remote operations the draft workflow needs from the marketplace.
///
/// The sync engine, submission gate and handlers all go through this trait so
/// they can be exercised against an in-memory marketplace in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DraftApi {
    async fn fetch_event(&self, event_id: &str) -> Result<EventPayload, ApiError>;
    async fn create_draft(&self, draft: &EventDraftPayload) -> Result<DraftCreated, ApiError>;
    async fn update_draft(
        &self,
        event_id: &str,
        draft: &EventDraftPayload,
    ) -> Result<(), ApiError>;
    async fn submit_for_review(&self, event_id: &str) -> Result<StatusChanged, ApiError>;
    async fn set_sold_out(
        &self,
        event_id: &str,
        request: &SoldOutRequest,
    ) -> Result<StatusChanged, ApiError>;
    async fn set_door_sales_only(
        &self,
        event_id: &str,
        request: &DoorSalesOnlyRequest,
    ) -> Result<StatusChanged, ApiError>;
    async fn postpone_event(
        &self,
        event_id: &str,
        request: &PostponeRequest,
    ) -> Result<StatusChanged, ApiError>;
    async fn cancel_event(
        &self,
        event_id: &str,
        request: &CancelRequest,
    ) -> Result<StatusChanged, ApiError>;
    async fn list_events(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<EventListResponse, ApiError>;
}

/// Client for the ticketing marketplace organizer API
pub struct MarketplaceClient {
    client: Client,
    app_id: String,
    secret_id: String,
    secret_key: String,
    endpoint: String,
    organizer_id: String,
}

impl MarketplaceClient {
    /// Create a new marketplace client from environment variables
    pub fn new() -> Self {
        dotenv().ok();

        Self {
            client: Client::new(),
            app_id: env::var("MARKETPLACE_APP_ID")
                .expect("MARKETPLACE_APP_ID must be set in environment"),
            secret_id: env::var("MARKETPLACE_SECRET_ID")
                .expect("MARKETPLACE_SECRET_ID must be set in environment"),
            secret_key: env::var("MARKETPLACE_SECRET_KEY")
                .expect("MARKETPLACE_SECRET_KEY must be set in environment"),
            endpoint: env::var("MARKETPLACE_API_ENDPOINT")
                .unwrap_or_else(|_| "https://api.marketplace.example.com".to_string()),
            organizer_id: env::var("MARKETPLACE_ORGANIZER_ID")
                .unwrap_or_else(|_| "organizer".to_string()),
        }
    }

    pub fn get_organizer_id(&self) -> &str {
        &self.organizer_id
    }

    // Sign and send one request, then map non-2xx statuses into the error
    // taxonomy before the caller touches the body.
    async fn execute<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.endpoint, path_and_query);
        let timestamp = MarketplaceAuth::get_timestamp();
        let nonce = MarketplaceAuth::generate_nonce();
        let body_json = match body {
            Some(b) => serde_json::to_string(b)?,
            None => String::new(),
        };

        let signature = MarketplaceAuth::generate_signature(
            &self.secret_id,
            &self.secret_key,
            method.as_str(),
            path_and_query,
            timestamp,
            &nonce,
            &body_json,
        );

        debug!("API URL: {}", url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header("X-Api-AppId", &self.app_id)
            .header("X-Api-Key", &self.secret_id)
            .header("X-Api-Timestamp", timestamp.to_string())
            .header("X-Api-Nonce", &nonce)
            .header("X-Api-Signature", signature)
            .header("X-Organizer-Id", &self.organizer_id);

        if !body_json.is_empty() {
            request = request.body(body_json);
        }

        let res = request.send().await?;
        debug!("Response received with status: {}", res.status());

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let ApiErrorBody { message, sections } = res.json().await.unwrap_or_default();
        let message_or = move |fallback: &str| {
            if message.is_empty() {
                fallback.to_string()
            } else {
                message.clone()
            }
        };

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::SessionExpired),
            StatusCode::BAD_REQUEST => Err(ApiError::Rejected {
                message: message_or("validation failed"),
                sections,
            }),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ApiError::BusinessRule(message_or("request rejected")))
            }
            _ => Err(ApiError::Unexpected(status)),
        }
    }
}

#[async_trait]
impl DraftApi for MarketplaceClient {
    async fn fetch_event(&self, event_id: &str) -> Result<EventPayload, ApiError> {
        info!("Fetching event {} from marketplace", event_id);
        let uri = format!("/organizer/events/{}", event_id);
        let res = self.execute::<()>(Method::GET, &uri, None).await?;
        Ok(res.json::<EventPayload>().await?)
    }

    async fn create_draft(&self, draft: &EventDraftPayload) -> Result<DraftCreated, ApiError> {
        info!("Creating event draft \"{}\"", draft.name);
        let res = self
            .execute(Method::POST, "/organizer/events", Some(draft))
            .await?;
        let created = res.json::<DraftCreated>().await?;
        info!("Draft created with id {}", created.event_id);
        Ok(created)
    }

    async fn update_draft(
        &self,
        event_id: &str,
        draft: &EventDraftPayload,
    ) -> Result<(), ApiError> {
        debug!("Updating event draft {}", event_id);
        let uri = format!("/organizer/events/{}", event_id);
        self.execute(Method::PATCH, &uri, Some(draft)).await?;
        Ok(())
    }

    async fn submit_for_review(&self, event_id: &str) -> Result<StatusChanged, ApiError> {
        info!("Submitting event {} for review", event_id);
        let uri = format!("/organizer/events/{}/submit", event_id);
        let res = self.execute::<()>(Method::POST, &uri, None).await?;
        Ok(res.json::<StatusChanged>().await?)
    }

    async fn set_sold_out(
        &self,
        event_id: &str,
        request: &SoldOutRequest,
    ) -> Result<StatusChanged, ApiError> {
        info!("Setting sold-out={} on event {}", request.enabled, event_id);
        let uri = format!("/organizer/events/{}/sold-out", event_id);
        let res = self.execute(Method::POST, &uri, Some(request)).await?;
        Ok(res.json::<StatusChanged>().await?)
    }

    async fn set_door_sales_only(
        &self,
        event_id: &str,
        request: &DoorSalesOnlyRequest,
    ) -> Result<StatusChanged, ApiError> {
        info!(
            "Setting door-sales-only={} on event {}",
            request.enabled, event_id
        );
        let uri = format!("/organizer/events/{}/door-sales-only", event_id);
        let res = self.execute(Method::POST, &uri, Some(request)).await?;
        Ok(res.json::<StatusChanged>().await?)
    }

    async fn postpone_event(
        &self,
        event_id: &str,
        request: &PostponeRequest,
    ) -> Result<StatusChanged, ApiError> {
        info!(
            "Postponing event {} to {} (reason: {})",
            event_id, request.new_date, request.reason
        );
        let uri = format!("/organizer/events/{}/postpone", event_id);
        let res = self.execute(Method::POST, &uri, Some(request)).await?;
        Ok(res.json::<StatusChanged>().await?)
    }

    async fn cancel_event(
        &self,
        event_id: &str,
        request: &CancelRequest,
    ) -> Result<StatusChanged, ApiError> {
        info!("Cancelling event {} (reason: {})", event_id, request.reason);
        let uri = format!("/organizer/events/{}/cancel", event_id);
        let res = self.execute(Method::POST, &uri, Some(request)).await?;
        Ok(res.json::<StatusChanged>().await?)
    }

    async fn list_events(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<EventListResponse, ApiError> {
        info!("Listing organizer events page={}", page);
        let uri = format!("/organizer/events?page={}&page_size={}", page, page_size);
        let res = self.execute::<()>(Method::GET, &uri, None).await?;
        Ok(res.json::<EventListResponse>().await?)
    }
}
