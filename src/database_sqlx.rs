use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqliteConnection, SqlitePool,
};
use tracing::{debug, info};

use crate::analysis::summarize_industry;
use crate::models::{IndustryAggregate, IndustryAggregateRecord, SecurityMetrics, SecurityRecord};

/// SQLX-based store for per-security statistics and industry aggregations
#[derive(Clone)]
pub struct DatabaseManagerSqlx {
    pool: SqlitePool,
}

impl DatabaseManagerSqlx {
    /// Open (or create) the SQLite database and make sure the schema exists
    pub async fn new(database_path: &str) -> Result<Self> {
        let path = database_path.strip_prefix("sqlite:").unwrap_or(database_path);

        // one connection keeps every statement strictly sequential
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(SqliteConnectOptions::new().filename(path).create_if_missing(true))
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS security_statistics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT UNIQUE NOT NULL,
                industry TEXT NOT NULL,
                pe_ratio REAL,
                revenue_growth REAL,
                net_income_ttm REAL,
                debt_ratio REAL,
                revenue REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS industry_aggregations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                industry TEXT UNIQUE NOT NULL,
                avg_pe_ratio REAL,
                avg_revenue_growth REAL,
                sum_revenue REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_security_statistics_industry ON security_statistics(industry)")
            .execute(&pool)
            .await?;

        info!("Database ready at {}", path);
        Ok(Self { pool })
    }

    /// Upsert all staged security metrics in one transaction.
    ///
    /// Either every row is written or none is.
    pub async fn commit_security_statistics(&self, staged: &[SecurityMetrics]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for metrics in staged {
            upsert_security(&mut tx, metrics).await?;
        }
        tx.commit().await?;

        info!("💾 Committed statistics for {} securities", staged.len());
        Ok(staged.len())
    }

    /// Upsert a single security outside of a batch
    pub async fn upsert_security_statistics(&self, metrics: &SecurityMetrics) -> Result<()> {
        self.commit_security_statistics(std::slice::from_ref(metrics)).await?;
        Ok(())
    }

    pub async fn get_security_by_symbol(&self, symbol: &str) -> Result<Option<SecurityRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, symbol, industry, pe_ratio, revenue_growth, net_income_ttm, debt_ratio, revenue, created_at
            FROM security_statistics
            WHERE symbol = ?
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(security_from_row).transpose()?)
    }

    pub async fn get_securities_by_industry(&self, industry: &str) -> Result<Vec<SecurityRecord>> {
        let mut conn = self.pool.acquire().await?;
        securities_by_industry(&mut conn, industry).await
    }

    /// Recompute and upsert the aggregate of every listed industry from the
    /// persisted security records, in one transaction.
    ///
    /// Industries without any persisted security are left untouched.
    pub async fn refresh_industry_aggregations(&self, industries: &[String]) -> Result<Vec<IndustryAggregate>> {
        let mut tx = self.pool.begin().await?;
        let mut refreshed = Vec::new();

        for industry in industries {
            let records = securities_by_industry(&mut tx, industry).await?;
            match summarize_industry(industry, &records) {
                Some(aggregate) => {
                    upsert_aggregate(&mut tx, &aggregate).await?;
                    refreshed.push(aggregate);
                }
                None => debug!("No persisted securities for industry {}", industry),
            }
        }

        tx.commit().await?;
        info!("📊 Aggregated {} industries", refreshed.len());
        Ok(refreshed)
    }

    pub async fn get_industry_aggregation(&self, industry: &str) -> Result<Option<IndustryAggregateRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, industry, avg_pe_ratio, avg_revenue_growth, sum_revenue, created_at
            FROM industry_aggregations
            WHERE industry = ?
            "#,
        )
        .bind(industry)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(aggregate_from_row).transpose()?)
    }

    pub async fn list_industry_aggregations(&self) -> Result<Vec<IndustryAggregateRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, industry, avg_pe_ratio, avg_revenue_growth, sum_revenue, created_at
            FROM industry_aggregations
            ORDER BY industry
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(aggregate_from_row).collect::<Result<_, _>>()?)
    }

    /// Row counts of (security_statistics, industry_aggregations)
    pub async fn get_stats(&self) -> Result<(i64, i64)> {
        let securities = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM security_statistics")
            .fetch_one(&self.pool)
            .await?;
        let industries = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM industry_aggregations")
            .fetch_one(&self.pool)
            .await?;

        Ok((securities, industries))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Insert a new record or overwrite the metric columns of the existing one.
/// Identity, industry and creation time of an existing record are kept.
async fn upsert_security(conn: &mut SqliteConnection, metrics: &SecurityMetrics) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO security_statistics
            (symbol, industry, pe_ratio, revenue_growth, net_income_ttm, debt_ratio, revenue, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(symbol) DO UPDATE SET
            pe_ratio = excluded.pe_ratio,
            revenue_growth = excluded.revenue_growth,
            net_income_ttm = excluded.net_income_ttm,
            debt_ratio = excluded.debt_ratio,
            revenue = excluded.revenue
        "#,
    )
    .bind(&metrics.symbol)
    .bind(&metrics.industry)
    .bind(metrics.pe_ratio)
    .bind(metrics.revenue_growth)
    .bind(metrics.net_income_ttm)
    .bind(metrics.debt_ratio)
    .bind(metrics.ttm_revenue)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn upsert_aggregate(conn: &mut SqliteConnection, aggregate: &IndustryAggregate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO industry_aggregations
            (industry, avg_pe_ratio, avg_revenue_growth, sum_revenue, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(industry) DO UPDATE SET
            avg_pe_ratio = excluded.avg_pe_ratio,
            avg_revenue_growth = excluded.avg_revenue_growth,
            sum_revenue = excluded.sum_revenue
        "#,
    )
    .bind(&aggregate.industry)
    .bind(aggregate.avg_pe_ratio)
    .bind(aggregate.avg_revenue_growth)
    .bind(aggregate.sum_revenue)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn securities_by_industry(conn: &mut SqliteConnection, industry: &str) -> Result<Vec<SecurityRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, symbol, industry, pe_ratio, revenue_growth, net_income_ttm, debt_ratio, revenue, created_at
        FROM security_statistics
        WHERE industry = ?
        ORDER BY symbol
        "#,
    )
    .bind(industry)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(security_from_row).collect::<Result<_, _>>()?)
}

fn security_from_row(r: &SqliteRow) -> Result<SecurityRecord, sqlx::Error> {
    Ok(SecurityRecord {
        id: r.try_get("id")?,
        symbol: r.try_get("symbol")?,
        industry: r.try_get("industry")?,
        pe_ratio: r.try_get("pe_ratio")?,
        revenue_growth: r.try_get("revenue_growth")?,
        net_income_ttm: r.try_get("net_income_ttm")?,
        debt_ratio: r.try_get("debt_ratio")?,
        revenue: r.try_get("revenue")?,
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn aggregate_from_row(r: &SqliteRow) -> Result<IndustryAggregateRecord, sqlx::Error> {
    Ok(IndustryAggregateRecord {
        id: r.try_get("id")?,
        industry: r.try_get("industry")?,
        avg_pe_ratio: r.try_get("avg_pe_ratio")?,
        avg_revenue_growth: r.try_get("avg_revenue_growth")?,
        sum_revenue: r.try_get("sum_revenue")?,
        created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
