use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub line_total: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cart::Entity",
        from = "Column::CartId",
        to = "super::cart::Column::Id",
        on_delete = "Cascade"
    )]
    Cart,
}

impl Related<super::cart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cart.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::CartLine {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            cart_id: model.cart_id,
            product_id: model.product_id,
            product_name: model.product_name,
            price: model.price,
            quantity: model.quantity,
            line_total: model.line_total,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<&crate::models::CartLine> for ActiveModel {
    fn from(line: &crate::models::CartLine) -> Self {
        ActiveModel {
            id: Set(line.id),
            cart_id: Set(line.cart_id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            price: Set(line.price),
            quantity: Set(line.quantity),
            line_total: Set(line.line_total),
            created_at: Set(line.created_at.into()),
            updated_at: Set(line.updated_at.into()),
        }
    }
}
