pub mod chat;
pub mod research;
pub mod ui;

use crate::state::AppState;
use axum::Router;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(ui::routes())
        .merge(chat::routes(state.clone()))
        .merge(research::routes(state))
}
