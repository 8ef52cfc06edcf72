use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::Form;
use serde::Serialize;

use crate::http_server::error::Report;
use crate::http_server::http_routes::venues::SearchForm;
use crate::http_server::state::AppState;
use crate::services::SearchResults;
use crate::services::artist::{
    ArtistDetails, ArtistEditContext, ArtistInput, ArtistOverview, ArtistProfile, ArtistService,
};
use crate::services::genre::{GenreChoice, GenreService};

#[derive(Debug, Serialize)]
pub struct ArtistFormContext {
    pub genres: Vec<GenreChoice>,
}

pub async fn list_artists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ArtistOverview>>, Report> {
    let artists = ArtistService::new(state.db.clone()).list().await?;
    Ok(Json(artists))
}

pub async fn search_artists(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResults<ArtistOverview>>, Report> {
    let results = ArtistService::new(state.db.clone())
        .search(&form.search_term)
        .await?;
    Ok(Json(results))
}

pub async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> Result<Json<ArtistDetails>, Report> {
    let details = ArtistService::new(state.db.clone())
        .get_details(artist_id)
        .await?;
    Ok(Json(details))
}

/// Rendering the create form also seeds the genre vocabulary on first use.
pub async fn new_artist_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ArtistFormContext>, Report> {
    let genres = GenreService::new(state.db.clone()).choices().await?;
    Ok(Json(ArtistFormContext { genres }))
}

pub async fn create_artist(
    State(state): State<Arc<AppState>>,
    Form(input): Form<ArtistInput>,
) -> Result<(StatusCode, Json<ArtistProfile>), Report> {
    let artist = ArtistService::new(state.db.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(artist)))
}

pub async fn edit_artist_form(
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> Result<Json<ArtistEditContext>, Report> {
    let context = ArtistService::new(state.db.clone())
        .edit_context(artist_id)
        .await?;
    Ok(Json(context))
}

pub async fn update_artist(
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
    Form(input): Form<ArtistInput>,
) -> Result<Json<ArtistProfile>, Report> {
    let artist = ArtistService::new(state.db.clone())
        .update(artist_id, input)
        .await?;
    Ok(Json(artist))
}

pub async fn delete_artist(
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> Result<Json<ArtistProfile>, Report> {
    let artist = ArtistService::new(state.db.clone())
        .delete(artist_id)
        .await?;
    Ok(Json(artist))
}
