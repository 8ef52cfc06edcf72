use std::sync::Arc;

use color_eyre::{Result, eyre::Context};
use sea_orm::{ActiveValue, EntityTrait, PaginatorTrait, QueryOrder, TransactionTrait};
use serde::Serialize;

use crate::database::Database;
use crate::entities;

/// Vocabulary inserted the first time a booking form is rendered against an
/// empty genre table.
pub const DEFAULT_GENRES: [&str; 19] = [
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreChoice {
    pub id: i64,
    pub name: String,
}

impl From<entities::genre::Model> for GenreChoice {
    fn from(model: entities::genre::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

pub struct GenreService {
    db: Arc<Database>,
}

impl GenreService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All genres ordered by id. Never seeds; edit forms use this.
    pub async fn list(&self) -> Result<Vec<GenreChoice>> {
        let genres = entities::genre::Entity::find()
            .order_by_asc(entities::genre::Column::Id)
            .all(&self.db.conn)
            .await
            .context("Failed to query genres")?;

        Ok(genres.into_iter().map(GenreChoice::from).collect())
    }

    /// Genre choices for a create form. Inserts the default vocabulary once
    /// when the table is empty.
    pub async fn choices(&self) -> Result<Vec<GenreChoice>> {
        let count = entities::genre::Entity::find()
            .count(&self.db.conn)
            .await
            .context("Failed to count genres")?;

        if count == 0 {
            log::info!("Seeding default genre vocabulary");
            let txn = self
                .db
                .conn
                .begin()
                .await
                .context("Failed to begin transaction")?;

            for name in DEFAULT_GENRES {
                let genre = entities::genre::ActiveModel {
                    id: ActiveValue::NotSet,
                    name: ActiveValue::Set(name.to_string()),
                };
                entities::genre::Entity::insert(genre)
                    .exec(&txn)
                    .await
                    .context("Failed to insert default genre")?;
            }

            txn.commit().await.context("Failed to commit genre seed")?;
        }

        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;

    #[tokio::test]
    async fn test_choices_seeds_default_vocabulary() {
        let db = test_db().await;
        let service = GenreService::new(db);

        let choices = service.choices().await.unwrap();

        assert_eq!(choices.len(), DEFAULT_GENRES.len());
        assert_eq!(choices[0].name, "Alternative");
        assert_eq!(choices.last().unwrap().name, "Other");
    }

    #[tokio::test]
    async fn test_choices_is_idempotent() {
        let db = test_db().await;
        let service = GenreService::new(db);

        service.choices().await.unwrap();
        let second = service.choices().await.unwrap();

        assert_eq!(second.len(), DEFAULT_GENRES.len());
    }

    #[tokio::test]
    async fn test_list_never_seeds() {
        let db = test_db().await;
        let service = GenreService::new(db);

        let genres = service.list().await.unwrap();

        assert!(genres.is_empty());
    }
}
