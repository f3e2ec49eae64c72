//! Migration: items table with soft delete.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Items::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::Price).decimal_len(12, 2).not_null())
                    .col(ColumnDef::new(Items::Description).text().not_null())
                    .col(ColumnDef::new(Items::Category).string().not_null())
                    .col(ColumnDef::new(Items::SellerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Items::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Items::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Items::DeletedAt).timestamp_with_time_zone().null())
                    .check(Expr::col(Items::Price).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_items_seller")
                            .from(Items::Table, Items::SellerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_items_seller_id")
                    .table(Items::Table)
                    .col(Items::SellerId)
                    .to_owned(),
            )
            .await?;

        // Listings filter on live rows
        manager
            .create_index(
                Index::create()
                    .name("idx_items_deleted_at")
                    .table(Items::Table)
                    .col(Items::DeletedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Items {
    Table,
    Id,
    Name,
    Price,
    Description,
    Category,
    SellerId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
