use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};

use crate::domain::models::{Delegation, DelegationPage, ListQuery, StoredDelegation};
use crate::infrastructure::persistence::entities::delegations;
use crate::infrastructure::persistence::error::StoreError;

/// Repository for delegation persistence operations
#[derive(Clone)]
pub struct DelegationRepository {
    conn: DatabaseConnection,
}

impl DelegationRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a batch in a single transaction, skipping known upstream ids
    pub async fn save_batch(&self, batch: &[Delegation]) -> Result<u64, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().fixed_offset();
        let models = batch
            .iter()
            .map(|d| to_active_model(d, now))
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self.conn.begin().await?;
        let inserted = insert_ignoring_conflicts(&txn, models).await?;
        txn.commit().await?;

        Ok(inserted)
    }

    pub async fn highest_level(&self) -> Result<u64, StoreError> {
        let max = delegations::Entity::find()
            .select_only()
            .column_as(delegations::Column::Level.max(), "max_level")
            .into_tuple::<Option<i64>>()
            .one(&self.conn)
            .await?;

        Ok(max.flatten().map(|level| level.max(0) as u64).unwrap_or(0))
    }

    /// Newest first, ties broken by upstream id
    pub async fn find_page(&self, query: &ListQuery) -> Result<DelegationPage, StoreError> {
        let total = self.count(query.year).await?;

        let rows = filtered(query.year)
            .order_by_desc(delegations::Column::Timestamp)
            .order_by_desc(delegations::Column::UpstreamId)
            .offset(Some(query.offset()))
            .limit(Some(query.limit))
            .all(&self.conn)
            .await?;

        let items = rows
            .into_iter()
            .map(to_domain_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DelegationPage { items, total })
    }

    pub async fn count(&self, year: Option<i32>) -> Result<u64, StoreError> {
        Ok(filtered(year).count(&self.conn).await?)
    }
}

async fn insert_ignoring_conflicts<C: ConnectionTrait>(
    conn: &C,
    models: Vec<delegations::ActiveModel>,
) -> Result<u64, DbErr> {
    let result = delegations::Entity::insert_many(models)
        .on_conflict(
            OnConflict::column(delegations::Column::UpstreamId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await;

    match result {
        Ok(inserted) => Ok(inserted),
        // Every row conflicted
        Err(DbErr::RecordNotInserted) => Ok(0),
        Err(e) => Err(e),
    }
}

fn filtered(year: Option<i32>) -> Select<delegations::Entity> {
    let query = delegations::Entity::find();
    match year.and_then(crate::domain::models::year_window) {
        Some((start, end)) => query
            .filter(delegations::Column::Timestamp.gte(start))
            .filter(delegations::Column::Timestamp.lt(end)),
        // A year outside the representable range matches nothing
        None if year.is_some() => query.filter(delegations::Column::Id.lt(0)),
        None => query,
    }
}

fn to_active_model(
    delegation: &Delegation,
    now: DateTime<chrono::FixedOffset>,
) -> Result<delegations::ActiveModel, StoreError> {
    Ok(delegations::ActiveModel {
        id: NotSet,
        upstream_id: Set(to_i64("upstream_id", delegation.upstream_id)?),
        delegator: Set(delegation.delegator.clone()),
        delegate: Set(delegation.delegate.clone()),
        timestamp: Set(delegation.timestamp.timestamp()),
        amount: Set(delegation.amount_tez),
        level: Set(to_i64("level", delegation.block_level)?),
        created_at: Set(now),
    })
}

fn to_domain_model(model: delegations::Model) -> Result<StoredDelegation, StoreError> {
    let timestamp = DateTime::from_timestamp(model.timestamp, 0).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "timestamp {} of delegation {} is out of range",
            model.timestamp, model.upstream_id
        ))
    })?;

    Ok(StoredDelegation {
        id: model.id,
        delegation: Delegation {
            upstream_id: model.upstream_id.max(0) as u64,
            delegator: model.delegator,
            delegate: model.delegate,
            amount_tez: model.amount,
            block_level: model.level.max(0) as u64,
            timestamp,
        },
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn to_i64(field: &str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{field} {value} exceeds BIGINT")))
}
