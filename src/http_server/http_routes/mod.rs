pub mod artists;
pub mod shows;
pub mod venues;

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::http_server::error::Report;
use crate::http_server::state::AppState;
use crate::services::artist::{ArtistOverview, ArtistService};
use crate::services::venue::{VenueOverview, VenueService};

const HOME_FEED_LIMIT: u64 = 6;

/// The home feed: most recently listed venues and artists.
#[derive(Debug, Serialize)]
pub struct HomeFeed {
    pub venues: Vec<VenueOverview>,
    pub artists: Vec<ArtistOverview>,
}

pub async fn home(State(state): State<Arc<AppState>>) -> Result<Json<HomeFeed>, Report> {
    let venues = VenueService::new(state.db.clone())
        .recently_added(HOME_FEED_LIMIT)
        .await?;
    let artists = ArtistService::new(state.db.clone())
        .recently_added(HOME_FEED_LIMIT)
        .await?;

    Ok(Json(HomeFeed { venues, artists }))
}
