use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::client::DraftApi;
use crate::handlers::api::{
    add_ticket, cancel_event, close_session, create_session, get_session, list_events,
    mark_door_sales_only, mark_sold_out, postpone_event, remove_ticket, save_draft,
    submit_session, toggle_section, update_field, AppState,
};
use crate::handlers::test::{health_check, sample_draft};

pub fn create_router<C: DraftApi + Send + Sync + 'static>(
    app_state: Arc<AppState<C>>,
    is_production: bool,
) -> Router {
    let mut router = Router::new();

    // Health check is always available
    let health_route = Router::new().route("/health", get(health_check));
    router = router.merge(health_route);

    // Draft session workflow is the core surface and is always exposed
    let session_routes = Router::new()
        .route("/sessions", post(create_session::<C>))
        .route(
            "/sessions/:session_id",
            get(get_session::<C>).delete(close_session::<C>),
        )
        .route("/sessions/:session_id/fields", patch(update_field::<C>))
        .route("/sessions/:session_id/tickets", post(add_ticket::<C>))
        .route(
            "/sessions/:session_id/tickets/:index",
            delete(remove_ticket::<C>),
        )
        .route("/sessions/:session_id/toggle", post(toggle_section::<C>))
        .route("/sessions/:session_id/save", post(save_draft::<C>))
        .route("/sessions/:session_id/submit", post(submit_session::<C>));
    router = router.merge(session_routes);

    // Status actions on published events are always exposed too
    let status_routes = Router::new()
        .route("/events/:event_id/sold-out", post(mark_sold_out::<C>))
        .route(
            "/events/:event_id/door-sales-only",
            post(mark_door_sales_only::<C>),
        )
        .route("/events/:event_id/postpone", post(postpone_event::<C>))
        .route("/events/:event_id/cancel", post(cancel_event::<C>));
    router = router.merge(status_routes);

    // Only add management routes if not in production mode
    if !is_production {
        let management_routes = Router::new()
            .route("/events", get(list_events::<C>))
            .route("/test/sample-draft", get(sample_draft));
        router = router.merge(management_routes);

        info!("Management routes enabled - server running in development mode");
    } else {
        info!("Running in production mode - only session, status and health endpoints exposed");
    }

    router.with_state(app_state)
}
