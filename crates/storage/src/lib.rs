mod fixtures;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use careconnect_core::{ServiceAvailability, ServiceCategory, ServiceRecord};
use parking_lot::RwLock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

pub use fixtures::fixture_services;

// records come back in catalog order
pub trait ServiceCatalog: Send + Sync {
    async fn services_in_category(&self, category: ServiceCategory) -> Result<Vec<ServiceRecord>>;
    async fn first_services(&self, limit: usize) -> Result<Vec<ServiceRecord>>;
    async fn service_by_id(&self, id: &str) -> Result<Option<ServiceRecord>>;
    async fn upsert_service(&self, record: ServiceRecord) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct MemoryCatalog {
    records: Arc<RwLock<Vec<ServiceRecord>>>,
}

impl MemoryCatalog {
    pub fn new(records: Vec<ServiceRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn fixtures() -> Self {
        Self::new(fixture_services())
    }
}

impl ServiceCatalog for MemoryCatalog {
    async fn services_in_category(&self, category: ServiceCategory) -> Result<Vec<ServiceRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|record| record.category == category)
            .cloned()
            .collect())
    }

    async fn first_services(&self, limit: usize) -> Result<Vec<ServiceRecord>> {
        Ok(self.records.read().iter().take(limit).cloned().collect())
    }

    async fn service_by_id(&self, id: &str) -> Result<Option<ServiceRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn upsert_service(&self, record: ServiceRecord) -> Result<()> {
        let mut records = self.records.write();
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if database_url.contains(":memory:") {
            // each connection to an in-memory database sees its own empty database
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let catalog = Self { pool };
        catalog.ensure_schema().await?;
        catalog.seed_if_empty(fixture_services()).await?;
        Ok(catalog)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS services (
              position INTEGER PRIMARY KEY AUTOINCREMENT,
              id TEXT NOT NULL UNIQUE,
              name TEXT NOT NULL,
              category TEXT NOT NULL,
              distance_km REAL NOT NULL,
              availability TEXT NOT NULL,
              address TEXT NOT NULL,
              phone TEXT,
              email TEXT,
              description TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS services_category ON services (category)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn seed_if_empty(&self, records: Vec<ServiceRecord>) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        for record in records {
            self.upsert_service(record).await?;
        }
        Ok(())
    }
}

impl ServiceCatalog for SqliteCatalog {
    async fn services_in_category(&self, category: ServiceCategory) -> Result<Vec<ServiceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category, distance_km, availability, address, phone, email, description
            FROM services
            WHERE category = ?1
            ORDER BY position
            "#,
        )
        .bind(category.as_code())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn first_services(&self, limit: usize) -> Result<Vec<ServiceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, category, distance_km, availability, address, phone, email, description
            FROM services
            ORDER BY position
            LIMIT ?1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    async fn service_by_id(&self, id: &str) -> Result<Option<ServiceRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, category, distance_km, availability, address, phone, email, description
            FROM services
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn upsert_service(&self, record: ServiceRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO services (id, name, category, distance_km, availability, address, phone, email, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
              name=excluded.name,
              category=excluded.category,
              distance_km=excluded.distance_km,
              availability=excluded.availability,
              address=excluded.address,
              phone=excluded.phone,
              email=excluded.email,
              description=excluded.description
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(record.category.as_code())
        .bind(record.distance_km)
        .bind(record.availability.as_code())
        .bind(&record.address)
        .bind(&record.phone)
        .bind(&record.email)
        .bind(&record.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> Result<ServiceRecord> {
    let category_code: String = row.get("category");
    let category = ServiceCategory::parse(&category_code)
        .with_context(|| format!("unknown service category {}", category_code))?;

    Ok(ServiceRecord {
        id: row.get("id"),
        name: row.get("name"),
        category,
        distance_km: row.get("distance_km"),
        availability: ServiceAvailability::parse(row.get::<String, _>("availability").as_str()),
        address: row.get("address"),
        phone: row.get("phone"),
        email: row.get("email"),
        description: row.get("description"),
    })
}

#[derive(Clone)]
pub enum Catalog {
    Memory(MemoryCatalog),
    Sqlite(SqliteCatalog),
}

impl Catalog {
    pub fn fixtures() -> Self {
        Self::Memory(MemoryCatalog::fixtures())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteCatalog::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl ServiceCatalog for Catalog {
    async fn services_in_category(&self, category: ServiceCategory) -> Result<Vec<ServiceRecord>> {
        match self {
            Catalog::Memory(catalog) => catalog.services_in_category(category).await,
            Catalog::Sqlite(catalog) => catalog.services_in_category(category).await,
        }
    }

    async fn first_services(&self, limit: usize) -> Result<Vec<ServiceRecord>> {
        match self {
            Catalog::Memory(catalog) => catalog.first_services(limit).await,
            Catalog::Sqlite(catalog) => catalog.first_services(limit).await,
        }
    }

    async fn service_by_id(&self, id: &str) -> Result<Option<ServiceRecord>> {
        match self {
            Catalog::Memory(catalog) => catalog.service_by_id(id).await,
            Catalog::Sqlite(catalog) => catalog.service_by_id(id).await,
        }
    }

    async fn upsert_service(&self, record: ServiceRecord) -> Result<()> {
        match self {
            Catalog::Memory(catalog) => catalog.upsert_service(record).await,
            Catalog::Sqlite(catalog) => catalog.upsert_service(record).await,
        }
    }
}
