use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boat_identifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Original client-supplied filename. Free text, not unique.
    pub image_filename: String,

    /// Object store key. Internal detail, never exposed to clients;
    /// the record id is the only durable external handle.
    #[sea_orm(unique)]
    pub blob_key: String,

    pub is_boat: bool,

    /// `high`, `medium` or `low` when the classifier reported one.
    pub confidence: Option<String>,

    /// Full classification result, stored verbatim. Superset of the
    /// denormalized columns below: also carries description, year,
    /// length, hull material and the features list.
    #[sea_orm(column_type = "JsonBinary")]
    pub identification_data: serde_json::Value,

    // Write-once copies of payload fields, present only so filter
    // queries can hit indexes instead of the document.
    pub make: Option<String>,
    pub model: Option<String>,
    pub boat_type: Option<String>,
    pub year_estimate: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
