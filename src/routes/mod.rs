use axum::http::HeaderValue;
use axum::{extract::FromRef, routing::get, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    graphql::{build_schema, AppSchema},
    state::AppState,
};

pub mod graphql;
pub mod health;

#[derive(Clone)]
pub struct RouterState {
    pub app: AppState,
    pub schema: AppSchema,
}

impl FromRef<RouterState> for AppState {
    fn from_ref(input: &RouterState) -> Self {
        input.app.clone()
    }
}

impl FromRef<RouterState> for AppSchema {
    fn from_ref(input: &RouterState) -> Self {
        input.schema.clone()
    }
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(err) => {
                        tracing::warn!(origin = %trimmed, error = %err, "ignoring invalid CORS origin");
                        None
                    }
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let router_state = RouterState {
        schema: build_schema(state.clone()),
        app: state,
    };

    Router::new()
        .route(
            graphql::GRAPHQL_PATH,
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        .route("/api/health", get(health::health_check))
        .with_state(router_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
