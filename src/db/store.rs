use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::db::models::{ListingRow, PriceHistoryRow, ProductRow};
use crate::error::{AppError, Result};
use crate::types::{now_ns, ListingRecord, PlatformListing, PriceHistoryPoint, Product};

const DAY_NS: i64 = 24 * 3_600 * 1_000_000_000;

/// Start of a window reaching `days` back from now. Saturates instead of
/// overflowing, so a huge window simply covers everything.
fn window_start(days: u32) -> i64 {
    now_ns().saturating_sub(i64::from(days).saturating_mul(DAY_NS))
}

/// Listing writes the refresh pipeline depends on.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert or overwrite the listing keyed by (product, platform). Returns the row id.
    async fn upsert(&self, listing: &PlatformListing) -> Result<i64>;

    /// Append a price point stamped with the current time.
    async fn record_price_history(&self, listing_id: i64, price: f64) -> Result<()>;

    /// Delete price points older than `older_than_days`. Returns rows removed.
    async fn prune_history(&self, older_than_days: u32) -> Result<u64>;

    /// Upsert plus its history point, committed together.
    async fn save_listing(&self, listing: &PlatformListing) -> Result<i64>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_product_by_url(&self, source_url: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, source_url, created_at, last_updated FROM product WHERE source_url = ?",
        )
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    pub async fn product(&self, id: i64) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, source_url, created_at, last_updated FROM product WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    /// Insert a product, or return the one already stored under `source_url`
    /// when a concurrent add got there first.
    pub async fn insert_product(&self, name: &str, source_url: &str) -> Result<Product> {
        let now = now_ns();
        let inserted = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO product (name, source_url, created_at, last_updated)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (source_url) DO NOTHING
            RETURNING id, name, source_url, created_at, last_updated
            "#,
        )
        .bind(name)
        .bind(source_url)
        .bind(now)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row.into());
        }
        self.find_product_by_url(source_url)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {source_url}")))
    }

    pub async fn touch_product(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE product SET last_updated = ? WHERE id = ?")
            .bind(now_ns())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Case-insensitive substring match on name, at most 10 rows.
    pub async fn search_products(&self, term: &str) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, source_url, created_at, last_updated
            FROM product
            WHERE LOWER(name) LIKE '%' || LOWER(?) || '%'
            ORDER BY last_updated DESC
            LIMIT 10
            "#,
        )
        .bind(term.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn all_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, source_url, created_at, last_updated FROM product ORDER BY last_updated DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn product_ids(&self) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM product ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Stored listings, cheapest first.
    pub async fn listings(&self, product_id: i64) -> Result<Vec<ListingRecord>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, product_id, platform, price, rating, reviewcount, seller, delivery_time,
                   return_policy, warranty, offers, availability, product_link, last_scraped
            FROM product_detail
            WHERE product_id = ?
            ORDER BY price ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ListingRecord::from).collect())
    }

    pub async fn listing_exists(&self, listing_id: i64) -> Result<bool> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product_detail WHERE id = ?")
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }

    /// Price points recorded in the last `days` days, oldest first.
    pub async fn history(&self, listing_id: i64, days: u32) -> Result<Vec<PriceHistoryPoint>> {
        let since = window_start(days);
        let rows = sqlx::query_as::<_, PriceHistoryRow>(
            r#"
            SELECT id, product_detail_id, price, recorded_at
            FROM price_history
            WHERE product_detail_id = ? AND recorded_at >= ?
            ORDER BY recorded_at ASC, id ASC
            "#,
        )
        .bind(listing_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PriceHistoryPoint::from).collect())
    }
}

async fn upsert_on(conn: &mut SqliteConnection, l: &PlatformListing) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO product_detail (
            product_id, platform, price, rating, reviewcount, seller, delivery_time,
            return_policy, warranty, offers, availability, product_link, last_scraped
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (product_id, platform) DO UPDATE SET
            price         = excluded.price,
            rating        = excluded.rating,
            reviewcount   = excluded.reviewcount,
            seller        = excluded.seller,
            delivery_time = excluded.delivery_time,
            return_policy = excluded.return_policy,
            warranty      = excluded.warranty,
            offers        = excluded.offers,
            availability  = excluded.availability,
            product_link  = excluded.product_link,
            last_scraped  = excluded.last_scraped
        RETURNING id
        "#,
    )
    .bind(l.product_id)
    .bind(&l.platform)
    .bind(l.price)
    .bind(l.rating)
    .bind(i64::from(l.review_count))
    .bind(&l.seller)
    .bind(&l.delivery_estimate)
    .bind(&l.return_policy)
    .bind(&l.warranty)
    .bind(&l.offer_text)
    .bind(l.availability.to_string())
    .bind(&l.product_link)
    .bind(now_ns())
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

async fn append_history_on(conn: &mut SqliteConnection, listing_id: i64, price: f64) -> Result<()> {
    sqlx::query("INSERT INTO price_history (product_detail_id, price, recorded_at) VALUES (?, ?, ?)")
        .bind(listing_id)
        .bind(price)
        .bind(now_ns())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[async_trait]
impl PersistenceGateway for SqliteStore {
    async fn upsert(&self, listing: &PlatformListing) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        upsert_on(&mut conn, listing).await
    }

    async fn record_price_history(&self, listing_id: i64, price: f64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        append_history_on(&mut conn, listing_id, price).await
    }

    async fn prune_history(&self, older_than_days: u32) -> Result<u64> {
        let cutoff = window_start(older_than_days);
        let done = sqlx::query("DELETE FROM price_history WHERE recorded_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    async fn save_listing(&self, listing: &PlatformListing) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let id = upsert_on(&mut tx, listing).await?;
        append_history_on(&mut tx, id, listing.price).await?;
        tx.commit().await?;
        debug!(listing_id = id, platform = %listing.platform, price = listing.price, "Listing saved");
        Ok(id)
    }
}
