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

/// Form payload for creating or editing a venue.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueInput {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image_link: Option<String>,
    #[serde(default)]
    pub facebook_link: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_talent: bool,
    #[serde(default)]
    pub seeking_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<i64>,
}

/// Flat venue record handed back to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct VenueProfile {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl From<entities::venue::Model> for VenueProfile {
    fn from(model: entities::venue::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            city: model.city,
            state: model.state,
            address: model.address,
            phone: model.phone,
            image_link: model.image_link,
            facebook_link: model.facebook_link,
            website: model.website,
            seeking_talent: model.seeking_talent,
            seeking_description: model.seeking_description,
        }
    }
}

/// One venue row in listings and search results.
#[derive(Debug, Serialize)]
pub struct VenueOverview {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: u64,
}

/// Venues sharing a city and state, in city order.
#[derive(Debug, Serialize)]
pub struct CityGroup {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueOverview>,
}

/// A show on the venue page, enriched with the performing artist.
#[derive(Debug, Serialize)]
pub struct VenueShowEntry {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: DateTime<Utc>,
}

/// Everything the venue page needs.
#[derive(Debug, Serialize)]
pub struct VenueDetails {
    #[serde(flatten)]
    pub venue: VenueProfile,
    pub genres: Vec<GenreChoice>,
    pub past_shows: Vec<VenueShowEntry>,
    pub past_shows_count: usize,
    pub upcoming_shows: Vec<VenueShowEntry>,
    pub upcoming_shows_count: usize,
}

/// Venue plus genre selections for the edit form.
#[derive(Debug, Serialize)]
pub struct VenueEditContext {
    pub venue: VenueProfile,
    pub genres: Vec<GenreChoice>,
    pub selected_genres: Vec<i64>,
}

/// Replace a venue's genre links inside the caller's transaction.
async fn set_genres<C>(conn: &C, venue_id: i64, genre_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    entities::venue_genre::Entity::delete_many()
        .filter(entities::venue_genre::Column::VenueId.eq(venue_id))
        .exec(conn)
        .await
        .context("Failed to clear venue genres")?;

    for genre_id in genre_ids {
        let link = entities::venue_genre::ActiveModel {
            venue_id: Set(venue_id),
            genre_id: Set(*genre_id),
        };
        entities::venue_genre::Entity::insert(link)
            .exec(conn)
            .await
            .context("Failed to link venue genre")?;
    }

    Ok(())
}

pub struct VenueService {
    db: Arc<Database>,
}

impl VenueService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn count_upcoming(&self, venue_id: i64, now: DateTime<Utc>) -> Result<u64> {
        entities::show::Entity::find()
            .filter(entities::show::Column::VenueId.eq(venue_id))
            .filter(entities::show::Column::StartTime.gte(now))
            .count(&self.db.conn)
            .await
            .context("Failed to count upcoming shows")
    }

    async fn overview(&self, venue: entities::venue::Model, now: DateTime<Utc>) -> Result<VenueOverview> {
        let num_upcoming_shows = self.count_upcoming(venue.id, now).await?;
        Ok(VenueOverview {
            id: venue.id,
            name: venue.name,
            num_upcoming_shows,
        })
    }

    /// All venues grouped by city/state in city order, each with its
    /// upcoming-show count.
    pub async fn list_grouped(&self) -> Result<Vec<CityGroup>> {
        let venues = entities::venue::Entity::find()
            .order_by_asc(entities::venue::Column::City)
            .order_by_asc(entities::venue::Column::State)
            .order_by_asc(entities::venue::Column::Name)
            .all(&self.db.conn)
            .await
            .context("Failed to query venues")?;

        let now = Utc::now();
        let mut groups: Vec<CityGroup> = Vec::new();
        for venue in venues {
            let city = venue.city.clone();
            let state = venue.state.clone();
            let overview = self.overview(venue, now).await?;

            match groups.last_mut() {
                Some(group) if group.city == city && group.state == state => {
                    group.venues.push(overview);
                }
                _ => groups.push(CityGroup {
                    city,
                    state,
                    venues: vec![overview],
                }),
            }
        }

        Ok(groups)
    }

    /// Case-insensitive substring search on the venue name. An empty term
    /// matches every venue.
    pub async fn search(&self, term: &str) -> Result<SearchResults<VenueOverview>> {
        let query = apply_text_search(
            entities::venue::Entity::find(),
            entities::venue::Column::Name,
            term,
        );
        let venues = query
            .all(&self.db.conn)
            .await
            .context("Failed to search venues")?;

        let now = Utc::now();
        let mut data = Vec::new();
        for venue in venues {
            data.push(self.overview(venue, now).await?);
        }

        Ok(SearchResults {
            count: data.len(),
            data,
        })
    }

    /// Most recently added venues, newest first.
    pub async fn recently_added(&self, limit: u64) -> Result<Vec<VenueOverview>> {
        let venues = entities::venue::Entity::find()
            .order_by_desc(entities::venue::Column::Id)
            .limit(limit)
            .all(&self.db.conn)
            .await
            .context("Failed to query recent venues")?;

        let now = Utc::now();
        let mut overviews = Vec::new();
        for venue in venues {
            overviews.push(self.overview(venue, now).await?);
        }

        Ok(overviews)
    }

    /// The venue page: profile, genres and the past/upcoming show split.
    pub async fn get_details(&self, id: i64) -> Result<VenueDetails> {
        let venue = entities::venue::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query venue")?
            .ok_or_else(|| NotFound(format!("venue {id}")))?;

        let genres = self
            .db
            .get_venue_genres(id)
            .await?
            .into_iter()
            .map(GenreChoice::from)
            .collect();

        let rows = entities::show::Entity::find()
            .filter(entities::show::Column::VenueId.eq(id))
            .order_by_asc(entities::show::Column::StartTime)
            .find_also_related(entities::artist::Entity)
            .all(&self.db.conn)
            .await
            .context("Failed to query venue shows")?;

        let mut pairs = Vec::new();
        for (show, artist) in rows {
            let artist =
                artist.ok_or_else(|| eyre!("Show {} has no performing artist", show.id))?;
            pairs.push((show, artist));
        }

        let (past, upcoming) = split_past_upcoming(pairs, Utc::now());
        let past_shows = to_entries(past);
        let upcoming_shows = to_entries(upcoming);

        Ok(VenueDetails {
            venue: venue.into(),
            genres,
            past_shows_count: past_shows.len(),
            past_shows,
            upcoming_shows_count: upcoming_shows.len(),
            upcoming_shows,
        })
    }

    /// Venue plus the full genre vocabulary and current selections, for the
    /// edit form.
    pub async fn edit_context(&self, id: i64) -> Result<VenueEditContext> {
        let venue = entities::venue::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query venue")?
            .ok_or_else(|| NotFound(format!("venue {id}")))?;

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
            .get_venue_genres(id)
            .await?
            .into_iter()
            .map(|genre| genre.id)
            .collect();

        Ok(VenueEditContext {
            venue: venue.into(),
            genres,
            selected_genres,
        })
    }

    /// Create a venue and link its genres. Blank optional fields are stored
    /// as absent.
    pub async fn create(&self, input: VenueInput) -> Result<VenueProfile> {
        log::debug!("Creating venue: '{}'", input.name);

        let txn = self
            .db
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let venue = entities::venue::ActiveModel {
            name: Set(input.name),
            city: Set(input.city),
            state: Set(input.state),
            address: Set(input.address),
            phone: Set(blank_to_none(input.phone)),
            image_link: Set(blank_to_none(input.image_link)),
            facebook_link: Set(blank_to_none(input.facebook_link)),
            website: Set(blank_to_none(input.website)),
            seeking_talent: Set(input.seeking_talent),
            seeking_description: Set(blank_to_none(input.seeking_description)),
            ..entities::venue::ActiveModel::new()
        }
        .insert(&txn)
        .await
        .context("Failed to insert venue")?;

        set_genres(&txn, venue.id, &input.genres).await?;

        txn.commit().await.context("Failed to commit venue")?;

        log::info!("Venue created: '{}' (ID: {})", venue.name, venue.id);
        Ok(venue.into())
    }

    /// Update a venue in place and replace its genre links.
    pub async fn update(&self, id: i64, input: VenueInput) -> Result<VenueProfile> {
        let venue = entities::venue::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query venue")?
            .ok_or_else(|| NotFound(format!("venue {id}")))?;

        let txn = self
            .db
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut active: entities::venue::ActiveModel = venue.into();
        active.name = Set(input.name);
        active.city = Set(input.city);
        active.state = Set(input.state);
        active.address = Set(input.address);
        active.phone = Set(blank_to_none(input.phone));
        active.image_link = Set(blank_to_none(input.image_link));
        active.facebook_link = Set(blank_to_none(input.facebook_link));
        active.website = Set(blank_to_none(input.website));
        active.seeking_talent = Set(input.seeking_talent);
        active.seeking_description = Set(blank_to_none(input.seeking_description));

        let venue = active
            .update(&txn)
            .await
            .context("Failed to update venue")?;

        set_genres(&txn, id, &input.genres).await?;

        txn.commit().await.context("Failed to commit venue update")?;

        log::info!("Venue updated: '{}' (ID: {})", venue.name, venue.id);
        Ok(venue.into())
    }

    /// Delete a venue, removing its shows and genre links first.
    pub async fn delete(&self, id: i64) -> Result<VenueProfile> {
        let venue = entities::venue::Entity::find_by_id(id)
            .one(&self.db.conn)
            .await
            .context("Failed to query venue")?
            .ok_or_else(|| NotFound(format!("venue {id}")))?;

        log::debug!("Deleting venue: '{}' (ID: {})", venue.name, venue.id);

        let txn = self
            .db
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        entities::show::Entity::delete_many()
            .filter(entities::show::Column::VenueId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to delete venue shows")?;

        entities::venue_genre::Entity::delete_many()
            .filter(entities::venue_genre::Column::VenueId.eq(id))
            .exec(&txn)
            .await
            .context("Failed to unlink venue genres")?;

        entities::venue::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete venue")?;

        txn.commit().await.context("Failed to commit venue delete")?;

        log::info!("Venue deleted: '{}' (ID: {})", venue.name, venue.id);
        Ok(venue.into())
    }
}

fn to_entries(rows: Vec<(entities::show::Model, entities::artist::Model)>) -> Vec<VenueShowEntry> {
    rows.into_iter()
        .map(|(show, artist)| VenueShowEntry {
            artist_id: artist.id,
            artist_name: artist.name,
            artist_image_link: artist.image_link,
            start_time: show.start_time,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;
    use chrono::Duration;

    fn venue_input(name: &str, city: &str, state: &str) -> VenueInput {
        VenueInput {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            address: "1015 Folsom Street".to_string(),
            phone: None,
            image_link: None,
            facebook_link: None,
            website: None,
            seeking_talent: false,
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

    async fn insert_artist(db: &Database, name: &str) -> entities::artist::Model {
        entities::artist::ActiveModel {
            name: Set(name.to_string()),
            city: Set("San Francisco".to_string()),
            state: Set("CA".to_string()),
            ..entities::artist::ActiveModel::new()
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

    #[test]
    fn test_details_serialize_with_flattened_profile() {
        let details = VenueDetails {
            venue: VenueProfile {
                id: 1,
                name: "The Musical Hop".to_string(),
                city: "San Francisco".to_string(),
                state: "CA".to_string(),
                address: "1015 Folsom Street".to_string(),
                phone: None,
                image_link: None,
                facebook_link: None,
                website: None,
                seeking_talent: true,
                seeking_description: Some("Looking for local artists".to_string()),
            },
            genres: Vec::new(),
            past_shows: Vec::new(),
            past_shows_count: 0,
            upcoming_shows: Vec::new(),
            upcoming_shows_count: 0,
        };

        let value = serde_json::to_value(&details).unwrap();

        // Profile fields sit at the top level of the document
        assert_eq!(value["name"], "The Musical Hop");
        assert_eq!(value["seeking_talent"], true);
        assert_eq!(value["upcoming_shows_count"], 0);
    }

    #[tokio::test]
    async fn test_create_links_genres() {
        let db = test_db().await;
        let jazz = insert_genre(&db, "Jazz").await;
        let soul = insert_genre(&db, "Soul").await;

        let service = VenueService::new(db.clone());
        let mut input = venue_input("The Musical Hop", "San Francisco", "CA");
        input.genres = vec![jazz.id, soul.id];

        let venue = service.create(input).await.unwrap();

        let genres = db.get_venue_genres(venue.id).await.unwrap();
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[0].name, "Jazz");
    }

    #[tokio::test]
    async fn test_create_stores_blank_optionals_as_absent() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let mut input = venue_input("The Musical Hop", "San Francisco", "CA");
        input.phone = Some(String::new());
        input.website = Some("https://themusicalhop.com".to_string());

        let venue = service.create(input).await.unwrap();

        assert_eq!(venue.phone, None);
        assert_eq!(
            venue.website,
            Some("https://themusicalhop.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_genre() {
        let db = test_db().await;
        let service = VenueService::new(db.clone());

        let mut input = venue_input("The Musical Hop", "San Francisco", "CA");
        input.genres = vec![9999];

        assert!(service.create(input).await.is_err());

        // The venue insert rolled back with the failed genre link
        let count = entities::venue::Entity::find()
            .count(&db.conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let db = test_db().await;
        let service = VenueService::new(db);
        service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        service
            .create(venue_input("Park Square Live Music & Coffee", "San Francisco", "CA"))
            .await
            .unwrap();

        let results = service.search("MUSIC").await.unwrap();

        assert_eq!(results.count, 2);
        assert_eq!(results.count, results.data.len());

        let results = service.search("hop").await.unwrap();
        assert_eq!(results.count, 1);
        assert_eq!(results.data[0].name, "The Musical Hop");
    }

    #[tokio::test]
    async fn test_search_empty_term_matches_all() {
        let db = test_db().await;
        let service = VenueService::new(db);
        service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        service
            .create(venue_input("The Dueling Pianos Bar", "New York", "NY"))
            .await
            .unwrap();

        let results = service.search("").await.unwrap();

        assert_eq!(results.count, 2);
        assert_eq!(results.count, results.data.len());
    }

    #[tokio::test]
    async fn test_list_grouped_by_city_and_state() {
        let db = test_db().await;
        let service = VenueService::new(db);
        service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        service
            .create(venue_input("Park Square Live Music & Coffee", "San Francisco", "CA"))
            .await
            .unwrap();
        service
            .create(venue_input("The Dueling Pianos Bar", "New York", "NY"))
            .await
            .unwrap();

        let groups = service.list_grouped().await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].city, "New York");
        assert_eq!(groups[0].venues.len(), 1);
        assert_eq!(groups[1].city, "San Francisco");
        assert_eq!(groups[1].venues.len(), 2);
    }

    #[tokio::test]
    async fn test_get_details_splits_past_and_upcoming() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Guns N Petals").await;

        let service = VenueService::new(db.clone());
        let venue = service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();

        let now = Utc::now();
        insert_show(&db, artist.id, venue.id, now - Duration::days(30)).await;
        insert_show(&db, artist.id, venue.id, now + Duration::days(30)).await;

        let details = service.get_details(venue.id).await.unwrap();

        assert_eq!(details.past_shows_count, 1);
        assert_eq!(details.upcoming_shows_count, 1);
        assert_eq!(details.past_shows.len(), 1);
        assert_eq!(details.upcoming_shows.len(), 1);
        assert_eq!(details.upcoming_shows[0].artist_name, "Guns N Petals");
    }

    #[tokio::test]
    async fn test_get_details_missing_venue_is_not_found() {
        let db = test_db().await;
        let service = VenueService::new(db);

        let err = service.get_details(9999).await.unwrap_err();

        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_genres() {
        let db = test_db().await;
        let jazz = insert_genre(&db, "Jazz").await;
        let folk = insert_genre(&db, "Folk").await;

        let service = VenueService::new(db.clone());
        let mut input = venue_input("The Musical Hop", "San Francisco", "CA");
        input.genres = vec![jazz.id];
        let venue = service.create(input).await.unwrap();

        let mut update = venue_input("The Musical Hop", "Oakland", "CA");
        update.genres = vec![folk.id];
        update.seeking_talent = true;
        let updated = service.update(venue.id, update).await.unwrap();

        assert_eq!(updated.city, "Oakland");
        assert!(updated.seeking_talent);

        let genres = db.get_venue_genres(venue.id).await.unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].name, "Folk");
    }

    #[tokio::test]
    async fn test_delete_removes_dependent_shows() {
        let db = test_db().await;
        let artist = insert_artist(&db, "Guns N Petals").await;

        let service = VenueService::new(db.clone());
        let venue = service
            .create(venue_input("The Musical Hop", "San Francisco", "CA"))
            .await
            .unwrap();
        insert_show(&db, artist.id, venue.id, Utc::now() + Duration::days(7)).await;

        service.delete(venue.id).await.unwrap();

        let shows = entities::show::Entity::find()
            .count(&db.conn)
            .await
            .unwrap();
        assert_eq!(shows, 0);

        let err = service.get_details(venue.id).await.unwrap_err();
        assert!(err.downcast_ref::<NotFound>().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_venue_is_not_found() {
        let db = test_db().await;
        let service = VenueService::new(db);

        let err = service.delete(9999).await.unwrap_err();

        assert!(err.downcast_ref::<NotFound>().is_some());
    }
}
