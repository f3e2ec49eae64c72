//! Cart line rows, keyed by (user_id, item_id).

use sea_orm::entity::prelude::*;

use crate::domain::CartLine;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cart_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: Uuid,
    pub quantity: i32,
    /// Display order within the cart
    pub position: i32,
    pub added_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CartLine {
    fn from(model: Model) -> Self {
        CartLine {
            item_id: model.item_id,
            quantity: model.quantity,
            added_at: model.added_at,
        }
    }
}
