use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(crate::handlers::auth::me))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/signup", post(crate::handlers::auth::signup))
        .route("/login", post(crate::handlers::auth::login))
        .merge(protected)
}
