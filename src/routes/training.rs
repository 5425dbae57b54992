use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::training;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/videos", post(training::create_session))
        .route("/:id/enroll", post(training::enroll))
        .route("/:id", patch(training::update_session))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/videos", get(training::get_all_videos))
        .route("/video/:id", get(training::stream_video))
        .route("/upcoming", get(training::upcoming_sessions))
        .route("/paginate", get(training::paginate_sessions))
        .route("/filter", get(training::filter_sessions))
        .merge(protected)
}
