use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::pagination::PageSelection;
use crate::application::repos::{ItemPage, ItemsRepo, RepoError};
use crate::domain::items::ItemRecord;

use super::{PostgresItems, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    created_at: OffsetDateTime,
}

impl From<ItemRow> for ItemRecord {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ItemsRepo for PostgresItems {
    async fn count_items(&self) -> Result<u64, RepoError> {
        let count: i64 = QueryBuilder::new("SELECT COUNT(*) FROM items")
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn query_page(&self, selection: PageSelection) -> Result<ItemPage, RepoError> {
        let mut qb = QueryBuilder::new("SELECT id, name, created_at FROM items ");
        match selection {
            PageSelection::Keyset { limit, after_id } => {
                qb.push("WHERE id > ");
                qb.push_bind(after_id);
                qb.push(" ORDER BY id ASC LIMIT ");
                qb.push_bind(i64::from(limit));
            }
            PageSelection::Offset { limit, offset } => {
                let offset = i64::try_from(offset)
                    .map_err(|_| RepoError::from_persistence("offset exceeds supported range"))?;
                qb.push("ORDER BY id ASC LIMIT ");
                qb.push_bind(i64::from(limit));
                qb.push(" OFFSET ");
                qb.push_bind(offset);
            }
        }

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM items ");
        if let PageSelection::Keyset { after_id, .. } = selection {
            count_qb.push("WHERE id > ");
            count_qb.push_bind(after_id);
        }
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ItemPage {
            items: rows.into_iter().map(ItemRecord::from).collect(),
            total: Self::convert_count(total)?,
        })
    }

    async fn insert_items(&self, names: &[String]) -> Result<(), RepoError> {
        if names.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::new("INSERT INTO items (name) ");
        qb.push_values(names, |mut row, name| {
            row.push_bind(name.as_str());
        });

        qb.build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
