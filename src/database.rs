use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder,
};
use std::path::Path;
use std::time::Duration;

use crate::entities;

pub struct Database {
    pub conn: DatabaseConnection,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create database directory: {}",
                parent.display()
            ))?;
        }

        // Create SQLite connection URL
        let url = format!("sqlite://{}?mode=rwc", path.display());

        // Configure connection options
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(100)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(8))
            .max_lifetime(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        // Cascading show deletes rely on SQLite actually checking foreign keys
        conn.execute_unprepared("PRAGMA foreign_keys = ON")
            .await
            .context("Failed to enable foreign keys")?;

        // Run migrations
        log::debug!("Running database migrations");
        migration::Migrator::up(&conn, None)
            .await
            .context("Failed to run database migrations")?;

        log::info!("Database ready at: {}", path.display());
        Ok(Database { conn })
    }

    // ========== Genre Junction Methods ==========

    /// Get all genres attached to a venue, ordered by genre id
    pub async fn get_venue_genres(&self, venue_id: i64) -> Result<Vec<entities::genre::Model>> {
        let links = entities::venue_genre::Entity::find()
            .filter(entities::venue_genre::Column::VenueId.eq(venue_id))
            .all(&self.conn)
            .await
            .context("Failed to query venue genres")?;

        let genre_ids: Vec<i64> = links.iter().map(|link| link.genre_id).collect();

        let genres = entities::genre::Entity::find()
            .filter(entities::genre::Column::Id.is_in(genre_ids))
            .order_by_asc(entities::genre::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query genres")?;

        Ok(genres)
    }

    /// Get all genres attached to an artist, ordered by genre id
    pub async fn get_artist_genres(&self, artist_id: i64) -> Result<Vec<entities::genre::Model>> {
        let links = entities::artist_genre::Entity::find()
            .filter(entities::artist_genre::Column::ArtistId.eq(artist_id))
            .all(&self.conn)
            .await
            .context("Failed to query artist genres")?;

        let genre_ids: Vec<i64> = links.iter().map(|link| link.genre_id).collect();

        let genres = entities::genre::Entity::find()
            .filter(entities::genre::Column::Id.is_in(genre_ids))
            .order_by_asc(entities::genre::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query genres")?;

        Ok(genres)
    }
}
