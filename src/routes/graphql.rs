use async_graphql::http::GraphiQLSource;
use axum::{
    extract::State,
    response::{Html, Json},
};

use crate::graphql::AppSchema;

pub const GRAPHQL_PATH: &str = "/graphql";

/// Accepts a single operation object or a JSON array of them, as GraphQL
/// clients that batch over HTTP send.
pub async fn graphql_handler(
    State(schema): State<AppSchema>,
    Json(batch): Json<async_graphql::BatchRequest>,
) -> Json<async_graphql::BatchResponse> {
    Json(schema.execute_batch(batch).await)
}

pub async fn graphiql() -> Html<String> {
    Html(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish())
}
