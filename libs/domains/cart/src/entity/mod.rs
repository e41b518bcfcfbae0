//! Sea-ORM entities for the `carts` and `cart_items` tables

pub mod cart;
pub mod cart_item;
