use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, TransactionTrait};

use crate::domain::models::Account;
use crate::infrastructure::persistence::entities::accounts;
use crate::infrastructure::persistence::error::StoreError;

/// Repository for derived accounts
#[derive(Clone)]
pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert accounts not seen before; existing rows keep their first level
    pub async fn save_batch(&self, batch: &[Account]) -> Result<u64, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().fixed_offset();
        let models = batch
            .iter()
            .map(|account| {
                let level = i64::try_from(account.first_seen_level).map_err(|_| {
                    StoreError::InvalidData(format!(
                        "first_seen_level {} exceeds BIGINT",
                        account.first_seen_level
                    ))
                })?;
                Ok(accounts::ActiveModel {
                    address: Set(account.address.clone()),
                    alias: Set(account.alias.clone()),
                    first_seen_level: Set(level),
                    created_at: Set(now),
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let txn = self.conn.begin().await?;
        let result = accounts::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(accounts::Column::Address)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await;

        let inserted = match result {
            Ok(inserted) => inserted,
            Err(DbErr::RecordNotInserted) => 0,
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;

        Ok(inserted)
    }
}
