use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
#[cfg(not(debug_assertions))]
use tower_http::cors::AllowMethods;
use tower_http::cors::CorsLayer;

use crate::database::Database;
use crate::http_server::{http_routes, state::AppState};

pub async fn start(port: u16, database: Arc<Database>) -> color_eyre::Result<()> {
    let app_state = Arc::new(AppState { db: database });

    #[cfg(debug_assertions)]
    let cors_layer = CorsLayer::permissive();

    #[cfg(not(debug_assertions))]
    let cors_layer = CorsLayer::new().allow_methods(AllowMethods::any());

    let app = Router::new()
        .route("/", get(http_routes::home))
        .route("/venues", get(http_routes::venues::list_venues))
        .route("/venues/search", post(http_routes::venues::search_venues))
        .route(
            "/venues/create",
            get(http_routes::venues::new_venue_form).post(http_routes::venues::create_venue),
        )
        .route("/venues/{venue_id}", get(http_routes::venues::get_venue))
        .route(
            "/venues/{venue_id}/edit",
            get(http_routes::venues::edit_venue_form).post(http_routes::venues::update_venue),
        )
        .route(
            "/venues/{venue_id}/delete",
            post(http_routes::venues::delete_venue),
        )
        .route("/artists", get(http_routes::artists::list_artists))
        .route("/artists/search", post(http_routes::artists::search_artists))
        .route(
            "/artists/create",
            get(http_routes::artists::new_artist_form).post(http_routes::artists::create_artist),
        )
        .route("/artists/{artist_id}", get(http_routes::artists::get_artist))
        .route(
            "/artists/{artist_id}/edit",
            get(http_routes::artists::edit_artist_form).post(http_routes::artists::update_artist),
        )
        .route(
            "/artists/{artist_id}/delete",
            post(http_routes::artists::delete_artist),
        )
        .route("/shows", get(http_routes::shows::list_shows))
        .route(
            "/shows/create",
            get(http_routes::shows::booking_form).post(http_routes::shows::create_show),
        )
        .layer(ServiceBuilder::new().layer(cors_layer))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;
    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
