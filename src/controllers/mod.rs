pub mod filters;
pub mod users;
pub mod genres;
pub mod actors;
pub mod theater_halls;
pub mod plays;
pub mod performances;
pub mod reservations;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(users::routes())
        .merge(genres::routes())
        .merge(actors::routes())
        .merge(theater_halls::routes())
        .merge(plays::routes())
        .merge(performances::routes())
        .merge(reservations::routes())
}
