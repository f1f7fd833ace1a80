use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role granted the list-all capability.
pub const ADMIN_ROLE: &str = "admin";

/// Role assigned to newly registered accounts.
pub const DEFAULT_ROLE: &str = "user";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2 PHC hash string, never the plaintext.
    pub password: String,

    /// `admin` or `user`.
    pub role: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
