use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::Form;
use serde::{Deserialize, Serialize};

use crate::http_server::error::Report;
use crate::http_server::state::AppState;
use crate::services::SearchResults;
use crate::services::genre::{GenreChoice, GenreService};
use crate::services::venue::{
    CityGroup, VenueDetails, VenueEditContext, VenueInput, VenueOverview, VenueProfile,
    VenueService,
};

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct VenueFormContext {
    pub genres: Vec<GenreChoice>,
}

pub async fn list_venues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CityGroup>>, Report> {
    let groups = VenueService::new(state.db.clone()).list_grouped().await?;
    Ok(Json(groups))
}

pub async fn search_venues(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResults<VenueOverview>>, Report> {
    let results = VenueService::new(state.db.clone())
        .search(&form.search_term)
        .await?;
    Ok(Json(results))
}

pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<VenueDetails>, Report> {
    let details = VenueService::new(state.db.clone())
        .get_details(venue_id)
        .await?;
    Ok(Json(details))
}

/// Rendering the create form also seeds the genre vocabulary on first use.
pub async fn new_venue_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VenueFormContext>, Report> {
    let genres = GenreService::new(state.db.clone()).choices().await?;
    Ok(Json(VenueFormContext { genres }))
}

pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    Form(input): Form<VenueInput>,
) -> Result<(StatusCode, Json<VenueProfile>), Report> {
    let venue = VenueService::new(state.db.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(venue)))
}

pub async fn edit_venue_form(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<VenueEditContext>, Report> {
    let context = VenueService::new(state.db.clone())
        .edit_context(venue_id)
        .await?;
    Ok(Json(context))
}

pub async fn update_venue(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
    Form(input): Form<VenueInput>,
) -> Result<Json<VenueProfile>, Report> {
    let venue = VenueService::new(state.db.clone())
        .update(venue_id, input)
        .await?;
    Ok(Json(venue))
}

pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<VenueProfile>, Report> {
    let venue = VenueService::new(state.db.clone()).delete(venue_id).await?;
    Ok(Json(venue))
}
