use std::sync::Arc;

use chrono::{DateTime, Utc};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::entities;
use crate::query_builder::apply_text_search;
use crate::services::genre::GenreChoice;
use crate::services::show::split_past_upcoming;
use crate::services::{NotFound, SearchResults, blank_to_none};

/// Form payload for creating or editing an artist.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistInput {
    pub name: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub facebook_link: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_venue: bool,
    #[serde(default)]
    pub seeking_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<i64>,
}

/// Flat artist record handed back to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ArtistProfile {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

impl From<entities::artist::Model> for ArtistProfile {
    fn from(model: entities::artist::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            city: model.city,
            state: model.state,
            phone: model.phone,
            image_link: model.image_link,
            facebook_link: model.facebook_link,
            website: model.website,
            seeking_venue: model.seeking_venue,
            seeking_description: model.seeking_description,
        }
    }
}

/// One artist row in listings and search results.
#[derive(Debug, Serialize)]
pub struct ArtistOverview {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: u64,
}

/// A show on the artist page, enriched with the hosting venue.
#[derive(Debug, Serialize)]
pub struct ArtistShowEntry {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: DateTime<Utc>,
}

/// Everything the artist page needs.
#[derive(Debug, Serialize)]
pub struct ArtistDetails {
    #[serde(flatten)]
    pub artist: ArtistProfile,
    pub genres: Vec<GenreChoice>,
    pub past_shows: Vec<ArtistShowEntry>,
    pub past_shows_count: usize,
    pub upcoming_shows: Vec<ArtistShowEntry>,
    pub upcoming_shows_count: usize,
}

/// Artist plus genre selections for the edit form.
#[derive(Debug, Serialize)]
pub struct ArtistEditContext {
    pub artist: ArtistProfile,
    pub genres: Vec<GenreChoice>,
    pub selected_genres: Vec<i64>,
}

/// Replace an artist's genre links inside the caller's transaction.
async fn set_genres<C>(conn: &C, artist_id: i64, genre_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    entities::artist_genre::Entity::delete_many()
        .filter(entities::artist_genre::Column::ArtistId.eq(artist_id))
        .exec(conn)
        .await
        .context("Failed to clear artist genres")?;

    for genre_id in genre_ids {
        let link = entities::artist_genre::ActiveModel {
            artist_id: Set(artist_id),
            genre_id: Set(*genre_id),
        };
        entities::artist_genre::Entity::insert(link)
            .exec(conn)
            .await
            .context("Failed to link artist genre")?;
    }

    Ok(())
}

pub struct ArtistService {
    db: Arc<Database>,
}

impl ArtistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn count_upcoming(&self, artist_id: i64, now: DateTime<Utc>) -> Result<u64> {
        entities::show::Entity::find()
            .filter(entities::show::Column::ArtistId.eq(artist_id))
            .filter(entities::show::Column::StartTime.gte(now))
            .count(&self.db.conn)
            .await
            .context("Failed to count upcoming shows")
    }

    async fn overview(
        &self,
        artist: entities::artist::Model,
        now: DateTime<Utc>,
    ) -> Result<ArtistOverview> {
        let num_upcoming_shows = self.count_upcoming(artist.id, now).await?;
        Ok(ArtistOverview {
            id: artist.id,
            name: artist.name,
            num_upcoming_shows,
        })
    }

    /// All artists ordered by name, each with its upcoming-show count.
    pub async fn list(&self) -> Result<Vec<ArtistOverview>> {
        let artists = entities::artist::Entity::find()
            .order_by_asc(entities::artist::Column::Name)
            .all(&self.db.conn)
            .await
            .context("Failed to query artists")?;

        let now = Utc::now();
        let mut overviews = Vec::new();
        for artist in artists {
            overviews.push(self.overview(artist, now).await?);
        }

        Ok(overviews)
    }

    /// Case-insensitive substring search on the artist name. An empty term
    /// matches every artist.
    pub async fn search(&self, term: &str) -> Result<SearchResults<ArtistOverview>> {
        let query = apply_text_search(
            entities::artist::Entity::find(),
            entities::artist::Column::Name,
            term,
        );
        let artists = query
            .all(&self.db.conn)
            .await
            .context("Failed to search artists")?;

        let now = Utc::now();
        let mut data = Vec::new();
        for artist in artists {
            data.push(self.overview(artist, now).await?);
        }

        Ok(SearchResults {
            count: data.len(),
            data,
        })
    }

    /// Most recently added artists, newest first.
    pub async fn recently_added(&self, limit: u64) -> Result<Vec<ArtistOverview>> {
        let artists = entities::artist::Entity::find()
            .order_by_desc(entities::artist::Column::Id)
            .limit(limit)
            .all(&self.db.conn)
            .await
            .context("Failed to query recent artists")?;

        let now = Utc::now();
        let mut overviews = Vec::new();
        for artist in artists {
            overviews.push(self.overview(artist, now).await?);
        }

        Ok(overviews)
    }

    /// The artist page: profile, genres and the past/upcoming show split.
    pub async fn get_details(&self, id: i64) -> Result<ArtistDetails> {
        let artist = entities::artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query artist")?
            .ok_or_else(|| NotFound(format!("artist {id}")))?;

        let genres = self
            .db
            .get_artist_genres(id)
            .await?
            .into_iter()
            .map(GenreChoice::from)
            .collect();

        let rows = entities::show::Entity::find()
            .filter(entities::show::Column::ArtistId.eq(id))
            .order_by_asc(entities::show::Column::StartTime)
            .find_also_related(entities::venue::Entity)
            .all(&self.db.conn)
            .await
            .context("Failed to query artist shows")?;

        let mut pairs = Vec::new();
        for (show, venue) in rows {
            let venue = venue.ok_or_else(|| eyre!("Show {} has no venue", show.id))?;
            pairs.push((show, venue));
        }

        let (past, upcoming) = split_past_upcoming(pairs, Utc::now());
        let past_shows = to_entries(past);
        let upcoming_shows = to_entries(upcoming);

        Ok(ArtistDetails {
            artist: artist.into(),
            genres,
            past_shows_count: past_shows.len(),
            past_shows,
            upcoming_shows_count: upcoming_shows.len(),
            upcoming_shows,
        })
    }

    /// Artist plus the full genre vocabulary and current selections, for the
    /// edit form.
    pub async fn edit_context(&self, id: i64) -> Result<ArtistEditContext> {
        let artist = entities::artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query artist")?
            .ok_or_else(|| NotFound(format!("artist {id}")))?;

        let genres = entities::genre::Entity::find()
            .order_by_asc(entities::genre::Column::Id)
            .all(&self.db.conn)
            .await
            .context("Failed to query genres")?
            .into_iter()
            .map(GenreChoice::from)
            .collect();

        let selected_genres = self
            .db
            .get_artist_genres(id)
            .await?
            .into_iter()
            .map(|genre| genre.id)
            .collect();

        Ok(ArtistEditContext {
            artist: artist.into(),
            genres,
            selected_genres,
        })
    }

    /// Create an artist and link its genres. Blank optional fields are
    /// stored as absent.
    pub async fn create(&self, input: ArtistInput) -> Result<ArtistProfile> {
        log::debug!("Creating artist: '{}'", input.name);

        let txn = self
            .db
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let artist = entities::artist::ActiveModel {
            name: Set(input.name),
            city: Set(input.city),
            state: Set(input.state),
            phone: Set(blank_to_none(input.phone)),
            image_link: Set(blank_to_none(input.image_link)),
            facebook_link: Set(blank_to_none(input.facebook_link)),
            website: Set(blank_to_none(input.website)),
            seeking_venue: Set(input.seeking_venue),
            seeking_description: Set(blank_to_none(input.seeking_description)),
            ..entities::artist::ActiveModel::new()
        }
        .insert(&txn)
        .await
        .context("Failed to insert artist")?;

        set_genres(&txn, artist.id, &input.genres).await?;

        txn.commit().await.context("Failed to commit artist")?;

        log::info!("Artist created: '{}' (ID: {})", artist.name, artist.id);
        Ok(artist.into())
    }

    /// Update an artist in place and replace its genre links.
    pub async fn update(&self, id: i64, input: ArtistInput) -> Result<ArtistProfile> {
        let artist = entities::artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query artist")?
            .ok_or_else(|| NotFound(format!("artist {id}")))?;

        let txn = self
            .db
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut active: entities::artist::ActiveModel = artist.into();
        active.name = Set(input.name);
        active.city = Set(input.city);
        active.state = Set(input.state);
        active.phone = Set(blank_to_none(input.phone));
        active.image_link = Set(blank_to_none(input.image_link));
        active.facebook_link = Set(blank_to_none(input.facebook_link));
        active.website = Set(blank_to_none(input.website));
        active.seeking_venue = Set(input.seeking_venue);
        active.seeking_description = Set(blank_to_none(input.seeking_description));

        let artist = active
            .update(&txn)
            .await
            .context("Failed to update artist")?;

        set_genres(&txn, id, &input.genres).await?;

        txn.commit().await.context("Failed to commit artist update")?;

        log::info!("Artist updated: '{}' (ID: {})", artist.name, artist.id);
        Ok(artist.into())
    }

    /// Delete an artist, removing its shows and genre links first.
    pub async fn delete(&self, id: i64) -> Result<ArtistProfile> {
        let artist = entities::artist::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query artist")?
            .ok_or_else(|| NotFound(format!("artist {id}")))?;

        log::debug!("Deleting artist: '{}' (ID: {})", artist.name, artist.id);

        let txn = self
            .db
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        entities::show::Entity::delete_many()
            .filter(entities::show::Column::ArtistId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete artist shows")?;

        entities::artist_genre::Entity::delete_many()
            .filter(entities::artist_genre::Column::ArtistId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to unlink artist genres")?;

        entities::artist::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete artist")?;

        txn.commit().await.context("Failed to commit artist delete")?;

        log::info!("Artist deleted: '{}' (ID: {})", artist.name, artist.id);
        Ok(artist.into())
    }
}

fn to_entries(rows: Vec<(entities::show::Model, entities::venue::Model)>) -> Vec<ArtistShowEntry> {
    rows.into_iter()
        .map(|(show, venue)| ArtistShowEntry {
            venue_id: venue.id,
            venue_name: venue.name,
            venue_image_link: venue.image_link,
            start_time: show.start_time,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;
    use chrono::Duration;

    fn artist_input(name: &str) -> ArtistInput {
        ArtistInput {
            name: name.to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            phone: None,
            image_link: None,
            facebook_link: None,
            website: None,
            seeking_venue: false,
            seeking_description: None,
            genres: Vec::new(),
        }
    }

    async fn insert_genre(db: &Database, name: &str) -> entities::genre::Model {
        entities::genre::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            name: Set(name.to_string()),
        }
        .insert(&db.conn)
        .await
        .unwrap()
    }

    async fn insert_venue(db: &Database, name: &str) -> entities::venue::Model {
        entities::venue::ActiveModel {
            name: Set(name.to_string()),
            city: Set("San Francisco".to_string()),
            state: Set("CA".to_string()),
            address: Set("1015 Folsom Street".to_string()),
            ..entities::venue::ActiveModel::new()
        }
        .insert(&db.conn)
        .await
        .unwrap()
    }

    async fn insert_show(
        db: &Database,
        artist_id: i64,
        venue_id: i64,
        start_time: DateTime<Utc>,
    ) -> entities::show::Model {
        entities::show::ActiveModel {
            artist_id: Set(artist_id),
            venue_id: Set(venue_id),
            start_time: Set(start_time),
            ..entities::show::ActiveModel::new()
        }
        .insert(&db.conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_links_genres_and_normalizes_blanks() {
        let db = test_db().await;
        let rock = insert_genre(&db, "Rock n Roll").await;

        let service = ArtistService::new(db.clone());
        let mut input = artist_input("Guns N Petals");
        input.genres = vec![rock.id];
        input.phone = Some(String::new());

        let artist = service.create(input).await.unwrap();

        assert_eq!(artist.phone, None);
        let genres = db.get_artist_genres(artist.id).await.unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].name, "Rock n Roll");
    }

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let db = test_db().await;
        let service = ArtistService::new(db);
        service.create(artist_input("The Wild Saxes")).await.unwrap();
        service.create(artist_input("Aretha Lives")).await.unwrap();

        let artists = service.list().await.unwrap();

        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].name, "Aretha Lives");
        assert_eq!(artists[1].name, "The Wild Saxes");
    }

    #[tokio::test]
    async fn test_search_counts_match_results() {
        let db = test_db().await;
        let service = ArtistService::new(db);
        service.create(artist_input("Guns N Petals")).await.unwrap();
        service.create(artist_input("Matt Quevedo")).await.unwrap();

        let results = service.search("guns").await.unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.count, results.data.len());

        let results = service.search("").await.unwrap();
        assert_eq!(results.count, 2);
        assert_eq!(results.count, results.data.len());

        let results = service.search("no such artist").await.unwrap();
        assert_eq!(results.count, 0);
        assert!(results.data.is_empty());
    }

    #[tokio::test]
    async fn test_get_details_splits_shows_with_venue_info() {
        let db = test_db().await;
        let venue = insert_venue(&db, "The Musical Hop").await;

        let service = ArtistService::new(db.clone());
        let artist = service.create(artist_input("Guns N Petals")).await.unwrap();

        let now = Utc::now();
        insert_show(&db, artist.id, venue.id, now - Duration::days(1)).await;
        insert_show(&db, artist.id, venue.id, now + Duration::days(1)).await;
        insert_show(&db, artist.id, venue.id, now + Duration::days(2)).await;

        let details = service.get_details(artist.id).await.unwrap();

        assert_eq!(details.past_shows_count, 1);
        assert_eq!(details.upcoming_shows_count, 2);
        assert_eq!(details.upcoming_shows[0].venue_name, "The Musical Hop");
    }

    #[tokio::test]
    async fn test_delete_removes_dependent_shows() {
        let db = test_db().await;
        let venue = insert_venue(&db, "The Musical Hop").await;

        let service = ArtistService::new(db.clone());
        let artist = service.create(artist_input("Guns N Petals")).await.unwrap();
        insert_show(&db, artist.id, venue.id, Utc::now() + Duration::days(7)).await;

        service.delete(artist.id).await.unwrap();

        let shows = entities::show::Entity::find()
            .count(&db.conn)
            .await
            .unwrap();
        assert_eq!(shows, 0);

        let err = service.get_details(artist.id).await.unwrap_err();
        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn test_edit_context_reports_selected_genres() {
        let db = test_db().await;
        let jazz = insert_genre(&db, "Jazz").await;
        let blues = insert_genre(&db, "Blues").await;

        let service = ArtistService::new(db);
        let mut input = artist_input("Matt Quevedo");
        input.genres = vec![blues.id];
        let artist = service.create(input).await.unwrap();

        let context = service.edit_context(artist.id).await.unwrap();

        assert_eq!(context.genres.len(), 2);
        assert_eq!(context.selected_genres, vec![blues.id]);
        assert!(context.genres.iter().any(|genre| genre.id == jazz.id));
    }
}
