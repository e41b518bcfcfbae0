use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id))
                    .col(string_len(Products::Name, 200))
                    .col(decimal_len(Products::Price, 12, 2))
                    .col(integer(Products::Stock).default(0))
                    .col(boolean(Products::Visible).default(true))
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Products::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Last line of defence for the reservation engine: stock can never go negative
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE products
                    ADD CONSTRAINT chk_products_stock_non_negative CHECK (stock >= 0),
                    ADD CONSTRAINT chk_products_price_positive CHECK (price > 0)
                "#,
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_visible")
                    .table(Products::Table)
                    .col(Products::Visible)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_created_at")
                    .table(Products::Table)
                    .col(Products::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER products_touch_updated_at
                    BEFORE UPDATE ON products
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS products_touch_updated_at ON products")
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    Name,
    Price,
    Stock,
    Visible,
    CreatedAt,
    UpdatedAt,
}
