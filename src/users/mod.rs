use crate::state::AppState;
use axum::Router;

pub mod dto;
mod flash;
pub mod handlers;
mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
mod views;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::register_routes())
        .merge(handlers::listing_routes())
}
