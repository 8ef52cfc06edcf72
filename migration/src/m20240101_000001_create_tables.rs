use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create genres table
        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Genre::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Genre::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Create venues table
        manager
            .create_table(
                Table::create()
                    .table(Venue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Venue::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Venue::Name).string().not_null())
                    .col(ColumnDef::new(Venue::City).string().not_null())
                    .col(ColumnDef::new(Venue::State).string().not_null())
                    .col(ColumnDef::new(Venue::Address).string().not_null())
                    .col(ColumnDef::new(Venue::Phone).string())
                    .col(ColumnDef::new(Venue::ImageLink).string())
                    .col(ColumnDef::new(Venue::FacebookLink).string())
                    .col(ColumnDef::new(Venue::Website).string())
                    .col(
                        ColumnDef::new(Venue::SeekingTalent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Venue::SeekingDescription).string())
                    .col(ColumnDef::new(Venue::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Venue::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create artists table
        manager
            .create_table(
                Table::create()
                    .table(Artist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Artist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Artist::Name).string().not_null())
                    .col(ColumnDef::new(Artist::City).string().not_null())
                    .col(ColumnDef::new(Artist::State).string().not_null())
                    .col(ColumnDef::new(Artist::Phone).string())
                    .col(ColumnDef::new(Artist::ImageLink).string())
                    .col(ColumnDef::new(Artist::FacebookLink).string())
                    .col(ColumnDef::new(Artist::Website).string())
                    .col(
                        ColumnDef::new(Artist::SeekingVenue)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Artist::SeekingDescription).string())
                    .col(ColumnDef::new(Artist::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Artist::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create shows table
        manager
            .create_table(
                Table::create()
                    .table(Show::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Show::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Show::ArtistId).integer().not_null())
                    .col(ColumnDef::new(Show::VenueId).integer().not_null())
                    .col(ColumnDef::new(Show::StartTime).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_show_artist_id")
                            .from(Show::Table, Show::ArtistId)
                            .to(Artist::Table, Artist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_show_venue_id")
                            .from(Show::Table, Show::VenueId)
                            .to(Venue::Table, Venue::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create venue_genres junction table
        manager
            .create_table(
                Table::create()
                    .table(VenueGenre::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(VenueGenre::VenueId).integer().not_null())
                    .col(ColumnDef::new(VenueGenre::GenreId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(VenueGenre::VenueId)
                            .col(VenueGenre::GenreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_venue_genre_venue_id")
                            .from(VenueGenre::Table, VenueGenre::VenueId)
                            .to(Venue::Table, Venue::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_venue_genre_genre_id")
                            .from(VenueGenre::Table, VenueGenre::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create artist_genres junction table
        manager
            .create_table(
                Table::create()
                    .table(ArtistGenre::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ArtistGenre::ArtistId).integer().not_null())
                    .col(ColumnDef::new(ArtistGenre::GenreId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(ArtistGenre::ArtistId)
                            .col(ArtistGenre::GenreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artist_genre_artist_id")
                            .from(ArtistGenre::Table, ArtistGenre::ArtistId)
                            .to(Artist::Table, Artist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artist_genre_genre_id")
                            .from(ArtistGenre::Table, ArtistGenre::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_venue_city")
                    .table(Venue::Table)
                    .col(Venue::City)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_artist_name")
                    .table(Artist::Table)
                    .col(Artist::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_show_artist_id")
                    .table(Show::Table)
                    .col(Show::ArtistId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_show_venue_id")
                    .table(Show::Table)
                    .col(Show::VenueId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_show_start_time")
                    .table(Show::Table)
                    .col(Show::StartTime)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table(ArtistGenre::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VenueGenre::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Show::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Artist::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Venue::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Genre::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Venue {
    Table,
    Id,
    Name,
    City,
    State,
    Address,
    Phone,
    ImageLink,
    FacebookLink,
    Website,
    SeekingTalent,
    SeekingDescription,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Artist {
    Table,
    Id,
    Name,
    City,
    State,
    Phone,
    ImageLink,
    FacebookLink,
    Website,
    SeekingVenue,
    SeekingDescription,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Show {
    Table,
    Id,
    ArtistId,
    VenueId,
    StartTime,
}

#[derive(DeriveIden)]
enum VenueGenre {
    Table,
    VenueId,
    GenreId,
}

#[derive(DeriveIden)]
enum ArtistGenre {
    Table,
    ArtistId,
    GenreId,
}
