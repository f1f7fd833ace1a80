use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::{boat_identification, user};
use crate::utils::hash;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't cover composite non-unique indexes, so
/// the full index set backing the list/search predicates is created
/// manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    use boat_identification::Column;

    let single: &[(&str, Column)] = &[
        ("idx_boat_is_boat", Column::IsBoat),
        ("idx_boat_confidence", Column::Confidence),
        ("idx_boat_make", Column::Make),
        ("idx_boat_model", Column::Model),
        ("idx_boat_type", Column::BoatType),
        ("idx_boat_created_at", Column::CreatedAt),
    ];

    let composite: &[(&str, [Column; 2])] = &[
        ("idx_boat_make_model", [Column::Make, Column::Model]),
        (
            "idx_boat_type_confidence",
            [Column::BoatType, Column::Confidence],
        ),
        (
            "idx_boat_created_boat",
            [Column::CreatedAt, Column::IsBoat],
        ),
    ];

    for (name, column) in single {
        let stmt = Index::create()
            .if_not_exists()
            .name(*name)
            .table(boat_identification::Entity)
            .col(*column)
            .to_string(PostgresQueryBuilder);
        execute_index(db, name, &stmt).await;
    }

    for (name, columns) in composite {
        let mut index = Index::create();
        index
            .if_not_exists()
            .name(*name)
            .table(boat_identification::Entity);
        for column in columns {
            index.col(*column);
        }
        let stmt = index.to_string(PostgresQueryBuilder);
        execute_index(db, name, &stmt).await;
    }

    Ok(())
}

async fn execute_index(db: &DatabaseConnection, name: &str, stmt: &str) {
    match db.execute_unprepared(stmt).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => tracing::warn!("Failed to create index {name}: {e}"),
    }
}

/// Create the bootstrap admin account when configured and absent.
pub async fn seed_admin_account(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), DbErr> {
    let (Some(username), Some(password)) = (&auth.admin_username, &auth.admin_password) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let hashed = hash::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("password hash error: {e}")))?;

    let model = user::ActiveModel {
        username: Set(username.clone()),
        password: Set(hashed),
        role: Set(user::ADMIN_ROLE.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
    {
        Ok(_) => {
            info!("Seeded bootstrap admin account '{username}'");
            Ok(())
        }
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}
