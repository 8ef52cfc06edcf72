use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::entities;

/// One scheduled performance, enriched for the shows listing.
#[derive(Debug, Serialize)]
pub struct ShowListing {
    pub id: i64,
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EntityRef {
    pub id: i64,
    pub name: String,
}

/// Artist and venue references for the booking form selects.
#[derive(Debug, Serialize)]
pub struct BookingFormContext {
    pub artists: Vec<EntityRef>,
    pub venues: Vec<EntityRef>,
}

/// Form payload for booking a show.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowInput {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: String,
}

/// Split shows into (past, upcoming) around `now`. A show starting exactly
/// at `now` counts as upcoming. Relative order is preserved, so input sorted
/// by start time yields both halves sorted by start time.
pub fn split_past_upcoming<T>(
    rows: Vec<(entities::show::Model, T)>,
    now: DateTime<Utc>,
) -> (
    Vec<(entities::show::Model, T)>,
    Vec<(entities::show::Model, T)>,
) {
    rows.into_iter().partition(|(show, _)| show.start_time < now)
}

/// Parse the booking form's start time: RFC 3339, or a naive
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` taken as UTC.
pub fn parse_start_time(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .wrap_err_with(|| format!("Unrecognized start time: {raw}"))?;

    Ok(naive.and_utc())
}

pub struct ShowService {
    db: Arc<Database>,
}

impl ShowService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All shows ordered by start time, each joined with its venue and artist.
    pub async fn list(&self) -> Result<Vec<ShowListing>> {
        let rows = entities::show::Entity::find()
            .order_by_asc(entities::show::Column::StartTime)
            .find_also_related(entities::artist::Entity)
            .all(&self.db.conn)
            .await
            .context("Failed to query shows")?;

        let mut listings = Vec::new();
        for (show, artist) in rows {
            let artist =
                artist.ok_or_else(|| eyre!("Show {} has no performing artist", show.id))?;
            let venue = entities::venue::Entity::find_by_id(show.venue_id)
                .one(&self.db.conn)
                .await
                .context("Failed to query show venue")?
                .ok_or_else(|| eyre!("Show {} has no venue", show.id))?;

            listings.push(ShowListing {
                id: show.id,
                venue_id: venue.id,
                venue_name: venue.name,
                artist_id: artist.id,
                artist_name: artist.name,
                artist_image_link: artist.image_link,
                start_time: show.start_time,
            });
        }

        Ok(listings)
    }

    /// Artist and venue references (ordered by name) for the booking form.
    pub async fn form_context(&self) -> Result<BookingFormContext> {
        let artists = entities::artist::Entity::find()
            .order_by_asc(entities::artist::Column::Name)
            .all(&self.db.conn)
            .await
            .context("Failed to query artists")?
            .into_iter()
            .map(|artist| EntityRef {
                id: artist.id,
                name: artist.name,
            })
            .collect();

        let venues = entities::venue::Entity::find()
            .order_by_asc(entities::venue::Column::Name)
            .all(&self.db.conn)
            .await
            .context("Failed to query venues")?
            .into_iter()
            .map(|venue| EntityRef {
                id: venue.id,
                name: venue.name,
            })
            .collect();

        Ok(BookingFormContext { artists, venues })
    }

    /// Book a show. The referenced artist and venue must exist; the foreign
    /// keys reject anything else and the transaction rolls back.
    pub async fn create(&self, input: ShowInput) -> Result<entities::show::Model> {
        let start_time = parse_start_time(&input.start_time)?;

        log::debug!(
            "Booking show: artist_id={}, venue_id={}, start_time={}",
            input.artist_id,
            input.venue_id,
            start_time
        );

        let txn = self
            .db
            .conn
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let show = entities::show::ActiveModel {
            artist_id: Set(input.artist_id),
            venue_id: Set(input.venue_id),
            start_time: Set(start_time),
            ..entities::show::ActiveModel::new()
        }
        .insert(&txn)
        .await
        .context("Failed to insert show")?;

        txn.commit().await.context("Failed to commit show")?;

        log::info!("Show booked (ID: {})", show.id);
        Ok(show)
    }
}
