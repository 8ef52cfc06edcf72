use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
};
use serde::Serialize;

use crate::http_server::error::Report;
use crate::http_server::state::AppState;
use crate::services::show::{BookingFormContext, ShowInput, ShowListing, ShowService};

#[derive(Debug, Serialize)]
pub struct BookedShow {
    pub id: i64,
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub async fn list_shows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShowListing>>, Report> {
    let listings = ShowService::new(state.db.clone()).list().await?;
    Ok(Json(listings))
}

pub async fn booking_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BookingFormContext>, Report> {
    let context = ShowService::new(state.db.clone()).form_context().await?;
    Ok(Json(context))
}

pub async fn create_show(
    State(state): State<Arc<AppState>>,
    Form(input): Form<ShowInput>,
) -> Result<(StatusCode, Json<BookedShow>), Report> {
    let show = ShowService::new(state.db.clone()).create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookedShow {
            id: show.id,
            artist_id: show.artist_id,
            venue_id: show.venue_id,
            start_time: show.start_time,
        }),
    ))
}
