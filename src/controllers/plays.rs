use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extract::{Json, Path, Query},
    controllers::filters::parse_id_list,
    database::Database,
    error::{AppError, AppResult},
    models::{
        play::{NewPlay, PlayFilter},
        Actor, Genre, Play,
    },
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plays", get(list_plays).post(create_play))
        .route("/plays/{id}", get(get_play))
}

#[derive(Debug, Deserialize)]
struct PlaysQuery {
    title: Option<String>,
    genres: Option<String>,
    actors: Option<String>,
}

/// Компактный вид: имена актеров и названия жанров.
#[derive(Debug, Serialize)]
pub struct PlayListItem {
    pub id: i64,
    pub title: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PlayDetail {
    id: i64,
    title: String,
    description: String,
    actors: Vec<Actor>,
    genres: Vec<Genre>,
}

#[derive(Debug, Serialize)]
struct PlayWriteView {
    id: i64,
    title: String,
    description: String,
    actors: Vec<i64>,
    genres: Vec<i64>,
}

/// Строит компактные виды для пьес, подтягивая связи двумя запросами.
pub async fn play_list_items(db: &Database, plays: Vec<Play>) -> AppResult<Vec<PlayListItem>> {
    let ids: Vec<i64> = plays.iter().map(|p| p.id).collect();
    let mut actors = Play::actors_for(db, &ids).await?;
    let mut genres = Play::genres_for(db, &ids).await?;

    Ok(plays
        .into_iter()
        .map(|play| PlayListItem {
            actors: actors
                .remove(&play.id)
                .unwrap_or_default()
                .iter()
                .map(Actor::full_name)
                .collect(),
            genres: genres
                .remove(&play.id)
                .unwrap_or_default()
                .into_iter()
                .map(|g| g.name)
                .collect(),
            id: play.id,
            title: play.title,
        })
        .collect())
}

// GET /api/plays?title=&genres=1,2&actors=3,7
async fn list_plays(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlaysQuery>,
) -> AppResult<Json<Vec<PlayListItem>>> {
    let filter = PlayFilter {
        title: params.title.filter(|t| !t.trim().is_empty()),
        genres: parse_id_list("genres", params.genres.as_deref())?,
        actors: parse_id_list("actors", params.actors.as_deref())?,
    };

    let plays = Play::list(&state.db, &filter).await?;
    Ok(Json(play_list_items(&state.db, plays).await?))
}

// GET /api/plays/{id}
async fn get_play(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<PlayDetail>> {
    let play = Play::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Play", id))?;

    let actors = Play::actors_for(&state.db, &[id]).await?.remove(&id).unwrap_or_default();
    let genres = Play::genres_for(&state.db, &[id]).await?.remove(&id).unwrap_or_default();

    Ok(Json(PlayDetail {
        id: play.id,
        title: play.title,
        description: play.description,
        actors,
        genres,
    }))
}

// POST /api/plays
async fn create_play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewPlay>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let created = Play::create(&state.db, &req).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlayWriteView {
            id: created.play.id,
            title: created.play.title,
            description: created.play.description,
            actors: created.actor_ids,
            genres: created.genre_ids,
        }),
    ))
}
