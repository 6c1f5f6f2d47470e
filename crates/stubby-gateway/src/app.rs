use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    create_url_handler, delete_url_handler, health_handler, list_urls_handler, ping_handler,
    replace_url_handler, resolve_url_handler, stats_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ping", get(ping_handler))
            .route(
                "/shorten",
                get(list_urls_handler).post(create_url_handler),
            )
            .route(
                "/shorten/{shortcode}",
                get(resolve_url_handler)
                    .put(replace_url_handler)
                    .delete(delete_url_handler),
            )
            .route("/shorten/{shortcode}/stats", get(stats_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
