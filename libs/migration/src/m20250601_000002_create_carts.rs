use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Carts::Table)
                    .if_not_exists()
                    .col(pk_uuid(Carts::Id))
                    .col(uuid_uniq(Carts::UserId))
                    .col(
                        timestamp_with_time_zone(Carts::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Carts::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // No foreign key on product_id: a line keeps its snapshot after the
        // product is removed from the catalog.
        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(pk_uuid(CartItems::Id))
                    .col(uuid(CartItems::CartId))
                    .col(uuid(CartItems::ProductId))
                    .col(string_len(CartItems::ProductName, 200))
                    .col(decimal_len(CartItems::Price, 12, 2))
                    .col(integer(CartItems::Quantity))
                    .col(decimal_len(CartItems::LineTotal, 14, 2))
                    .col(
                        timestamp_with_time_zone(CartItems::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(CartItems::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_cart_id")
                            .from(CartItems::Table, CartItems::CartId)
                            .to(Carts::Table, Carts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE cart_items ADD CONSTRAINT chk_cart_items_quantity_positive CHECK (quantity >= 1)",
            )
            .await?;

        // One line per (cart, product); concurrent first adds collide here and
        // the loser is retried as an update.
        manager
            .create_index(
                Index::create()
                    .name("uq_cart_items_cart_product")
                    .table(CartItems::Table)
                    .col(CartItems::CartId)
                    .col(CartItems::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cart_items_product_id")
                    .table(CartItems::Table)
                    .col(CartItems::ProductId)
                    .to_owned(),
            )
            .await?;

        for table in ["carts", "cart_items"] {
            manager
                .get_connection()
                .execute_unprepared(&format!(
                    r#"
                    CREATE TRIGGER {table}_touch_updated_at
                        BEFORE UPDATE ON {table}
                        FOR EACH ROW
                        EXECUTE FUNCTION util.touch_updated_at()
                    "#
                ))
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Carts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Carts {
    Table,
    Id,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CartItems {
    Table,
    Id,
    CartId,
    ProductId,
    ProductName,
    Price,
    Quantity,
    LineTotal,
    CreatedAt,
    UpdatedAt,
}
