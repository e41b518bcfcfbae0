//! Custom extractors for Axum handlers.

pub mod user_id;
pub mod uuid_path;
pub mod validated_json;

pub use user_id::{USER_ID_HEADER, UserId, ensure_user_id};
pub use uuid_path::UuidPath;
pub use validated_json::{ValidatedJson, ValidatedQuery};
