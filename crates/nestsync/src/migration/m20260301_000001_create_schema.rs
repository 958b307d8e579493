//! Initial migration to create the nestsync database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_collections(manager).await?;
        self.create_collection_preferences(manager).await?;
        self.create_properties(manager).await?;
        self.create_collection_properties(manager).await?;
        self.create_sync_runs(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CollectionProperties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(CollectionPreferences::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Collections::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_collections(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collections::Name).string().not_null())
                    .col(ColumnDef::new(Collections::AgentId).uuid().null())
                    .col(ColumnDef::new(Collections::VisitorEmail).string().null())
                    .col(ColumnDef::new(Collections::VisitorName).string().null())
                    .col(ColumnDef::new(Collections::ShareToken).string().null())
                    .col(
                        ColumnDef::new(Collections::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Collections::LastSyncedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Collections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Scheduler selection scans active collections ordered by last sync.
        manager
            .create_index(
                Index::create()
                    .name("idx_collections_status_last_synced")
                    .table(Collections::Table)
                    .col(Collections::Status)
                    .col(Collections::LastSyncedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_collection_preferences(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CollectionPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionPreferences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::CollectionId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::Cities)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::Townships)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::Latitude)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::Longitude)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::RadiusMiles)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::MinPrice)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::MaxPrice)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CollectionPreferences::MinBeds).integer().null())
                    .col(ColumnDef::new(CollectionPreferences::MaxBeds).integer().null())
                    .col(ColumnDef::new(CollectionPreferences::MinBaths).double().null())
                    .col(ColumnDef::new(CollectionPreferences::MaxBaths).double().null())
                    .col(
                        ColumnDef::new(CollectionPreferences::MinLivingArea)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::SingleFamily)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::Condo)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::Townhouse)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::MultiFamily)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::Apartment)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::LotLand)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionPreferences::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_preferences_collection")
                            .from(
                                CollectionPreferences::Table,
                                CollectionPreferences::CollectionId,
                            )
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_properties(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Properties::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Properties::ProviderId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Properties::StreetAddress).string().null())
                    .col(ColumnDef::new(Properties::City).string().null())
                    .col(ColumnDef::new(Properties::State).string().null())
                    .col(ColumnDef::new(Properties::Zipcode).string().null())
                    .col(ColumnDef::new(Properties::Price).big_integer().null())
                    .col(ColumnDef::new(Properties::Beds).integer().null())
                    .col(ColumnDef::new(Properties::Baths).double().null())
                    .col(ColumnDef::new(Properties::LivingArea).integer().null())
                    .col(ColumnDef::new(Properties::HomeType).string().null())
                    .col(
                        ColumnDef::new(Properties::ListingStatus)
                            .string()
                            .not_null()
                            .default("for_sale"),
                    )
                    .col(ColumnDef::new(Properties::Latitude).double().null())
                    .col(ColumnDef::new(Properties::Longitude).double().null())
                    .col(ColumnDef::new(Properties::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(Properties::RawAttributes)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    .col(ColumnDef::new(Properties::Detail).json().null())
                    .col(
                        ColumnDef::new(Properties::DetailCachedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Properties::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Properties::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_collection_properties(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CollectionProperties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CollectionProperties::CollectionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::PropertyId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::Source)
                            .string()
                            .not_null()
                            .default("auto"),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::RemovedByAgent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::Liked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::Disliked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::Viewed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::Commented)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CollectionProperties::InteractedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CollectionProperties::CollectionId)
                            .col(CollectionProperties::PropertyId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_collection")
                            .from(
                                CollectionProperties::Table,
                                CollectionProperties::CollectionId,
                            )
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_property")
                            .from(
                                CollectionProperties::Table,
                                CollectionProperties::PropertyId,
                            )
                            .to(Properties::Table, Properties::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_collection_properties_property")
                    .table(CollectionProperties::Table)
                    .col(CollectionProperties::PropertyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_sync_runs(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncRuns::CollectionId).uuid().not_null())
                    .col(
                        ColumnDef::new(SyncRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::Outcome)
                            .string()
                            .not_null()
                            .default("running"),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::Added)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::MarkedUnavailable)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::Reactivated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::TotalActive)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncRuns::Error).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sync_runs_collection")
                            .from(SyncRuns::Table, SyncRuns::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_runs_collection_started")
                    .table(SyncRuns::Table)
                    .col(SyncRuns::CollectionId)
                    .col(SyncRuns::StartedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Collections {
    Table,
    Id,
    Name,
    AgentId,
    VisitorEmail,
    VisitorName,
    ShareToken,
    Status,
    LastSyncedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CollectionPreferences {
    Table,
    Id,
    CollectionId,
    Cities,
    Townships,
    Latitude,
    Longitude,
    RadiusMiles,
    MinPrice,
    MaxPrice,
    MinBeds,
    MaxBeds,
    MinBaths,
    MaxBaths,
    MinLivingArea,
    SingleFamily,
    Condo,
    Townhouse,
    MultiFamily,
    Apartment,
    LotLand,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Properties {
    Table,
    Id,
    ProviderId,
    StreetAddress,
    City,
    State,
    Zipcode,
    Price,
    Beds,
    Baths,
    LivingArea,
    HomeType,
    ListingStatus,
    Latitude,
    Longitude,
    ImageUrl,
    RawAttributes,
    Detail,
    DetailCachedAt,
    FirstSeenAt,
    SyncedAt,
}

#[derive(DeriveIden)]
enum CollectionProperties {
    Table,
    CollectionId,
    PropertyId,
    AddedAt,
    Source,
    Status,
    RemovedByAgent,
    Liked,
    Disliked,
    Viewed,
    Commented,
    InteractedAt,
}

#[derive(DeriveIden)]
enum SyncRuns {
    Table,
    Id,
    CollectionId,
    StartedAt,
    FinishedAt,
    Outcome,
    Added,
    MarkedUnavailable,
    Reactivated,
    TotalActive,
    Error,
}
