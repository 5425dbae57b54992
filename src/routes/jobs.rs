use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::jobs;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(jobs::create_posting))
        .route("/:id/apply", post(jobs::submit_application))
        .route("/:id/applicants", get(jobs::get_applicants))
        .route("/applications/:id", patch(jobs::update_application_status))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(jobs::list_postings))
        .merge(protected)
}
