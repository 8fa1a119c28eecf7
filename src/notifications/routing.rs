use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::alarms::types::AlertPriority;
use crate::entities::user;
use crate::error::Result;

/// Active users whose role hears about `priority`. Users without a role get nothing.
pub async fn recipients<C: ConnectionTrait>(
    db: &C,
    priority: AlertPriority,
) -> Result<Vec<user::Model>> {
    let candidates = user::Entity::find()
        .filter(user::Column::IsActive.eq(true))
        .filter(user::Column::Role.is_not_null())
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;

    Ok(candidates
        .into_iter()
        .filter(|u| u.role.is_some_and(|role| role.receives(priority)))
        .collect())
}
