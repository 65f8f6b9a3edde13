use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewActor {
    #[validate(length(min = 1, max = 255, message = "first name must be 1..255 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 255, message = "second name must be 1..255 characters"))]
    pub second_name: String,
}

impl Actor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.second_name)
    }

    pub async fn list(db: &Database) -> Result<Vec<Actor>, sqlx::Error> {
        sqlx::query_as::<_, Actor>(
            "SELECT id, first_name, second_name FROM actors ORDER BY second_name, id"
        )
        .fetch_all(&db.pool)
        .await
    }

    pub async fn create(db: &Database, new: &NewActor) -> Result<Actor, sqlx::Error> {
        sqlx::query_as::<_, Actor>(
            "INSERT INTO actors (first_name, second_name)
             VALUES ($1, $2)
             RETURNING id, first_name, second_name"
        )
        .bind(new.first_name.trim())
        .bind(new.second_name.trim())
        .fetch_one(&db.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_first_and_second_name() {
        let actor = Actor { id: 1, first_name: "Olga".into(), second_name: "Knipper".into() };
        assert_eq!(actor.full_name(), "Olga Knipper");
    }

    #[test]
    fn empty_names_fail_validation() {
        let new = NewActor { first_name: "".into(), second_name: "Knipper".into() };
        let errors = new.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
    }
}
