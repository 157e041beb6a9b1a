use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{notification, rating, role, role_permission};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &["admin", role::DEFAULT_ROLE];

/// Every permission checked by the handlers.
pub const ALL_PERMISSIONS: &[&str] = &[
    "movie:create",
    "movie:edit",
    "movie:delete",
    "genre:manage",
    "banner:manage",
    "notification:fanout",
    "rating:recompute",
    "dashboard:view",
];

/// Seed the `role` and `role_permission` tables with defaults.
///
/// `admin` holds every permission; viewers hold none.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => roles_inserted += n as u32,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let rows = ALL_PERMISSIONS
        .iter()
        .map(|&permission| role_permission::ActiveModel {
            role: Set("admin".to_string()),
            permission: Set(permission.to_string()),
        });

    let result = role_permission::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                role_permission::Column::Role,
                role_permission::Column::Permission,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(n) if n > 0 => info!("Seeded {} new role-permission mappings", n),
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Notification inbox and unread count:
    // WHERE user_id = ? AND is_read = false ORDER BY created_at DESC
    create_index(
        db,
        "idx_notification_user_read_created",
        Index::create()
            .table(notification::Entity)
            .col(notification::Column::UserId)
            .col(notification::Column::IsRead)
            .col(notification::Column::CreatedAt)
            .to_owned(),
    )
    .await;

    // Review listing: WHERE movie_id = ? AND has_comment = true
    create_index(
        db,
        "idx_rating_movie_comment",
        Index::create()
            .table(rating::Entity)
            .col(rating::Column::MovieId)
            .col(rating::Column::HasComment)
            .to_owned(),
    )
    .await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, mut stmt: IndexCreateStatement) {
    let sql = stmt
        .if_not_exists()
        .name(name)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&sql).await {
        Ok(_) => info!("Ensured index {} exists", name),
        Err(e) => warn!("Failed to create index {}: {}", name, e),
    }
}
