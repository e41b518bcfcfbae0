use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
            INSERT INTO products (id, name, price, stock, visible, created_at, updated_at)
            VALUES
                ('01970a3c-1a2b-7000-8000-000000000001', 'Mechanical Keyboard', 89.99, 25, true, NOW(), NOW()),
                ('01970a3c-1a2b-7001-8000-000000000002', 'Wireless Mouse', 24.50, 60, true, NOW(), NOW()),
                ('01970a3c-1a2b-7002-8000-000000000003', '27" Monitor', 279.00, 8, true, NOW(), NOW()),
                ('01970a3c-1a2b-7003-8000-000000000004', 'USB-C Hub', 39.95, 0, true, NOW(), NOW()),
                ('01970a3c-1a2b-7004-8000-000000000005', 'Prototype Headset', 149.00, 5, false, NOW(), NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "DELETE FROM products WHERE id::text LIKE '01970a3c-1a2b-700_-8000-00000000000_'",
            )
            .await?;

        Ok(())
    }
}
