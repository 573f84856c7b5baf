use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::AuctionStore;
use crate::config::DatabaseConfig;
use crate::models::{AuctionDetail, AuctionStatus, AuctionUpdate, ChangeEvent, Notification, TrackedAuction};
use crate::utils::error::AppError;
use crate::Result;

const TRACKED_COLUMNS: &str = "a.id, a.auction_id, a.title, a.current_price, a.buy_now_price, \
     a.previous_price, a.price_changed, a.status, a.end_time, a.last_checked";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    max_notifications: u32,
}

impl SqliteStore {
    pub async fn connect(config: &DatabaseConfig, max_notifications: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            // An in-memory database lives only as long as its connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(&config.url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(url = %config.url, "Database ready");

        Ok(Self { pool, max_notifications })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts or refreshes the auction row for a fetched detail page and
    /// returns its row id. Known prices are never overwritten with nulls.
    pub async fn upsert_auction(&self, detail: &AuctionDetail) -> Result<i64> {
        let image_urls = serde_json::to_string(&detail.image_urls)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO auctions (auction_id, title, current_price, buy_now_price, seller_id,
                                  start_time, end_time, image_urls, url, last_checked)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(auction_id) DO UPDATE SET
                title = excluded.title,
                current_price = COALESCE(excluded.current_price, auctions.current_price),
                buy_now_price = COALESCE(excluded.buy_now_price, auctions.buy_now_price),
                seller_id = COALESCE(excluded.seller_id, auctions.seller_id),
                start_time = COALESCE(excluded.start_time, auctions.start_time),
                end_time = COALESCE(excluded.end_time, auctions.end_time),
                image_urls = excluded.image_urls,
                url = excluded.url,
                last_checked = excluded.last_checked
            RETURNING id
            "#,
        )
        .bind(&detail.auction_id)
        .bind(&detail.title)
        .bind(detail.current_price)
        .bind(detail.buy_now_price)
        .bind(&detail.seller_id)
        .bind(detail.start_time)
        .bind(detail.end_time)
        .bind(image_urls)
        .bind(&detail.url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Links an auction to a product, re-enabling a previously removed link.
    pub async fn track(&self, product_id: i64, auction_row_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_auction_links (product_id, auction_id, is_monitoring, created_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(product_id, auction_id) DO UPDATE SET is_monitoring = 1
            "#,
        )
        .bind(product_id)
        .bind(auction_row_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(product_id, auction_row_id, "Monitoring enabled");
        Ok(())
    }

    /// Soft delete: the link row stays, with monitoring switched off.
    pub async fn untrack(&self, product_id: i64, auction_id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE product_auction_links SET is_monitoring = 0
            WHERE product_id = ?1
              AND auction_id = (SELECT id FROM auctions WHERE auction_id = ?2)
            "#,
        )
        .bind(product_id)
        .bind(auction_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound {
                resource: format!("link between product {} and auction {}", product_id, auction_id),
            });
        }

        info!(product_id, auction_id, "Monitoring disabled");
        Ok(())
    }

    pub async fn find_auction(&self, auction_id: &str) -> Result<Option<TrackedAuction>> {
        let row = sqlx::query_as::<_, TrackedAuction>(&format!(
            "SELECT {} FROM auctions a WHERE a.auction_id = ?1",
            TRACKED_COLUMNS
        ))
        .bind(auction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_notifications(&self, limit: u32) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, kind, title, message, link_url, is_read, created_at
            FROM notifications
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl AuctionStore for SqliteStore {
    async fn monitored_auctions(&self) -> Result<Vec<TrackedAuction>> {
        let rows = sqlx::query_as::<_, TrackedAuction>(&format!(
            r#"
            SELECT DISTINCT {}
            FROM auctions a
            JOIN product_auction_links l ON l.auction_id = a.id
            WHERE l.is_monitoring = 1 AND a.status = ?1
            ORDER BY a.id
            "#,
            TRACKED_COLUMNS
        ))
        .bind(AuctionStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn commit_cycle(&self, updates: &[AuctionUpdate], events: &[ChangeEvent]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let mut stale = 0u64;
        for update in updates {
            // Rows that left `active` while the cycle was fetching keep their state
            let result = sqlx::query(
                r#"
                UPDATE auctions SET
                    current_price = ?1,
                    buy_now_price = ?2,
                    previous_price = ?3,
                    price_changed = ?4,
                    status = ?5,
                    last_checked = ?6
                WHERE id = ?7 AND status = ?8
                "#,
            )
            .bind(update.current_price)
            .bind(update.buy_now_price)
            .bind(update.previous_price)
            .bind(update.price_changed)
            .bind(update.status)
            .bind(update.last_checked)
            .bind(update.id)
            .bind(AuctionStatus::Active.as_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                stale += 1;
            }
        }

        let created_at = Utc::now();
        for event in events {
            sqlx::query(
                r#"
                INSERT INTO notifications (kind, title, message, link_url, is_read, created_at)
                VALUES (?1, ?2, ?3, ?4, 0, ?5)
                "#,
            )
            .bind(event.kind.as_str())
            .bind(&event.title)
            .bind(&event.message)
            .bind(&event.link)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        let pruned = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE id NOT IN (SELECT id FROM notifications ORDER BY id DESC LIMIT ?1)
            "#,
        )
        .bind(self.max_notifications)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        debug!(
            updates = updates.len(),
            stale,
            events = events.len(),
            pruned,
            "Cycle committed"
        );
        Ok(())
    }
}
