use axum::{response::Html, routing::get, Router};

const INDEX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/index.html"));

async fn index() -> Html<&'static str> {
    Html(INDEX)
}

async fn status() -> &'static str {
    "ok"
}

pub fn routes() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
}
