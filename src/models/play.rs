use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, Row};
use std::collections::HashMap;
use tracing::info;
use validator::Validate;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Actor, Genre};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Play {
    pub id: i64,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewPlay {
    #[validate(length(min = 1, max = 255, message = "title must be 1..255 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actors: Vec<i64>,
    #[serde(default)]
    pub genres: Vec<i64>,
}

/// Фильтры списка пьес. Пустые поля не ограничивают выборку.
#[derive(Debug, Default, Clone)]
pub struct PlayFilter {
    pub title: Option<String>,
    pub genres: Option<Vec<i64>>,
    pub actors: Option<Vec<i64>>,
}

/// Пьеса вместе с id связанных актеров и жанров.
#[derive(Debug, Clone)]
pub struct PlayWithLinks {
    pub play: Play,
    pub actor_ids: Vec<i64>,
    pub genre_ids: Vec<i64>,
}

impl Play {
    pub async fn list(db: &Database, filter: &PlayFilter) -> Result<Vec<Play>, sqlx::Error> {
        // EXISTS вместо JOIN: пьеса попадает в выборку один раз,
        // даже если совпала по нескольким актерам или жанрам
        let mut q = String::from("SELECT p.id, p.title, p.description FROM plays p WHERE TRUE");
        let mut bind_idx = 1;
        if filter.title.is_some() {
            q.push_str(&format!(" AND p.title ILIKE '%' || ${} || '%'", bind_idx));
            bind_idx += 1;
        }
        if filter.genres.is_some() {
            q.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM play_genres pg WHERE pg.play_id = p.id AND pg.genre_id = ANY(${}))",
                bind_idx
            ));
            bind_idx += 1;
        }
        if filter.actors.is_some() {
            q.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM play_actors pa WHERE pa.play_id = p.id AND pa.actor_id = ANY(${}))",
                bind_idx
            ));
        }
        q.push_str(" ORDER BY p.title, p.id");

        let mut dbq = sqlx::query_as::<_, Play>(&q);
        if let Some(title) = &filter.title {
            dbq = dbq.bind(escape_like(title));
        }
        if let Some(genres) = &filter.genres {
            dbq = dbq.bind(genres.clone());
        }
        if let Some(actors) = &filter.actors {
            dbq = dbq.bind(actors.clone());
        }

        dbq.fetch_all(&db.pool).await
    }

    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Play>, sqlx::Error> {
        sqlx::query_as::<_, Play>("SELECT id, title, description FROM plays WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Актеры для набора пьес, сгруппированные по play_id.
    pub async fn actors_for(db: &Database, play_ids: &[i64]) -> Result<HashMap<i64, Vec<Actor>>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT pa.play_id, a.id, a.first_name, a.second_name
            FROM play_actors pa
            JOIN actors a ON a.id = pa.actor_id
            WHERE pa.play_id = ANY($1)
            ORDER BY a.second_name, a.id
            "#
        )
        .bind(play_ids)
        .fetch_all(&db.pool)
        .await?;

        let mut map: HashMap<i64, Vec<Actor>> = HashMap::new();
        for r in rows {
            let play_id: i64 = r.get("play_id");
            map.entry(play_id).or_default().push(Actor {
                id: r.get("id"),
                first_name: r.get("first_name"),
                second_name: r.get("second_name"),
            });
        }
        Ok(map)
    }

    /// Жанры для набора пьес, сгруппированные по play_id.
    pub async fn genres_for(db: &Database, play_ids: &[i64]) -> Result<HashMap<i64, Vec<Genre>>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT pg.play_id, g.id, g.name
            FROM play_genres pg
            JOIN genres g ON g.id = pg.genre_id
            WHERE pg.play_id = ANY($1)
            ORDER BY g.name
            "#
        )
        .bind(play_ids)
        .fetch_all(&db.pool)
        .await?;

        let mut map: HashMap<i64, Vec<Genre>> = HashMap::new();
        for r in rows {
            let play_id: i64 = r.get("play_id");
            map.entry(play_id).or_default().push(Genre { id: r.get("id"), name: r.get("name") });
        }
        Ok(map)
    }

    /// Создает пьесу и ее связи одной транзакцией.
    pub async fn create(db: &Database, new: &NewPlay) -> AppResult<PlayWithLinks> {
        let actor_ids = dedup(&new.actors);
        let genre_ids = dedup(&new.genres);

        let mut tx = db.pool.begin().await?;

        ensure_all_exist(&mut *tx, "actors", "Actor", &actor_ids).await?;
        ensure_all_exist(&mut *tx, "genres", "Genre", &genre_ids).await?;

        let play = sqlx::query_as::<_, Play>(
            "INSERT INTO plays (title, description)
             VALUES ($1, $2)
             RETURNING id, title, description"
        )
        .bind(new.title.trim())
        .bind(&new.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO play_actors (play_id, actor_id) SELECT $1, UNNEST($2::BIGINT[])"
        )
        .bind(play.id)
        .bind(&actor_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO play_genres (play_id, genre_id) SELECT $1, UNNEST($2::BIGINT[])"
        )
        .bind(play.id)
        .bind(&genre_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(play_id = play.id, actors = actor_ids.len(), genres = genre_ids.len(), "Play created");

        Ok(PlayWithLinks { play, actor_ids, genre_ids })
    }
}

// Проверяет, что все id есть в таблице; первый отсутствующий -> 404
async fn ensure_all_exist(
    conn: &mut sqlx::PgConnection,
    table: &'static str,
    entity: &'static str,
    ids: &[i64],
) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<i64> = sqlx::query_scalar::<_, i64>(
        &format!("SELECT id FROM {} WHERE id = ANY($1)", table)
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;

    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(AppError::not_found(entity, *missing)),
        None => Ok(()),
    }
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

// % и _ в запросе пользователя ищутся буквально
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
