use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use super::{format_timestamp, parse_timestamp};
use crate::models::{NewVisit, Visit, VisitStatus};

/// Durable store for visits. Every call commits on its own.
#[derive(Debug, Clone)]
pub struct VisitRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: i64,
    business_name: String,
    contact_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    zip_code: String,
    lat: Option<f64>,
    lng: Option<f64>,
    visit_status: String,
    notes: Option<String>,
    source: String,
    ghl_contact_id: Option<String>,
    ghl_location_id: Option<String>,
    synced_to_ghl: bool,
    last_sync_error: Option<String>,
    visit_date: String,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        Visit {
            id: row.id,
            business_name: row.business_name,
            contact_name: row.contact_name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            city: row.city,
            zip_code: row.zip_code,
            lat: row.lat,
            lng: row.lng,
            visit_status: VisitStatus::from(row.visit_status),
            notes: row.notes,
            source: row.source,
            ghl_contact_id: row.ghl_contact_id,
            ghl_location_id: row.ghl_location_id,
            synced_to_ghl: row.synced_to_ghl,
            last_sync_error: row.last_sync_error,
            visit_date: parse_timestamp(&row.visit_date),
        }
    }
}

/// Visit counts for the territory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TerritoryStats {
    pub total_visits: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_zip: BTreeMap<String, i64>,
}

impl VisitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records a visit and returns its newly assigned id.
    ///
    /// No uniqueness is enforced; the same business may be visited many times.
    pub async fn insert(&self, visit: &NewVisit) -> Result<i64, sqlx::Error> {
        let visit_date = format_timestamp(Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO business_visits
                (business_name, contact_name, phone, email, address, city, zip_code,
                 notes, visit_status, lat, lng, source, ghl_location_id, visit_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&visit.business_name)
        .bind(&visit.contact_name)
        .bind(&visit.phone)
        .bind(&visit.email)
        .bind(&visit.address)
        .bind(&visit.city)
        .bind(&visit.zip_code)
        .bind(&visit.notes)
        .bind(visit.visit_status.as_str())
        .bind(visit.lat)
        .bind(visit.lng)
        .bind(&visit.source)
        .bind(&visit.ghl_location_id)
        .bind(&visit_date)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Visit>, sqlx::Error> {
        let row: Option<VisitRow> = sqlx::query_as("SELECT * FROM business_visits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Visit::from))
    }

    /// Every visit, newest first.
    pub async fn list_all(&self) -> Result<Vec<Visit>, sqlx::Error> {
        let rows: Vec<VisitRow> =
            sqlx::query_as("SELECT * FROM business_visits ORDER BY visit_date DESC, id DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }

    /// Visits that can be placed on a map, newest first.
    pub async fn list_with_coordinates(&self) -> Result<Vec<Visit>, sqlx::Error> {
        let rows: Vec<VisitRow> = sqlx::query_as(
            r#"
            SELECT * FROM business_visits
            WHERE lat IS NOT NULL AND lng IS NOT NULL
            ORDER BY visit_date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }

    pub async fn list_by_zip(&self, zip_code: &str) -> Result<Vec<Visit>, sqlx::Error> {
        let rows: Vec<VisitRow> = sqlx::query_as(
            r#"
            SELECT * FROM business_visits
            WHERE zip_code = ?
            ORDER BY visit_date DESC, id DESC
            "#,
        )
        .bind(zip_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }

    /// Visits whose last sync never succeeded, in insertion order.
    pub async fn list_unsynced(&self) -> Result<Vec<Visit>, sqlx::Error> {
        let rows: Vec<VisitRow> =
            sqlx::query_as("SELECT * FROM business_visits WHERE synced_to_ghl = 0 ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Visit::from).collect())
    }

    /// Records the outcome of a sync attempt.
    ///
    /// Success links the visit (when a contact id is given), marks it synced
    /// and clears the error. Failure only stores the error: `synced_to_ghl`
    /// keeps whatever value an earlier success left behind.
    pub async fn update_sync_result(
        &self,
        id: i64,
        ghl_contact_id: Option<&str>,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        if success {
            sqlx::query(
                r#"
                UPDATE business_visits
                SET ghl_contact_id = COALESCE(?, ghl_contact_id),
                    synced_to_ghl = 1,
                    last_sync_error = NULL
                WHERE id = ?
                "#,
            )
            .bind(ghl_contact_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("UPDATE business_visits SET last_sync_error = ? WHERE id = ?")
                .bind(error_message)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Counts visits overall, per status and per zip code.
    pub async fn stats(&self) -> Result<TerritoryStats, sqlx::Error> {
        let (total_visits,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM business_visits")
            .fetch_one(&self.pool)
            .await?;

        let by_status: Vec<(String, i64)> = sqlx::query_as(
            "SELECT visit_status, COUNT(*) FROM business_visits GROUP BY visit_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let by_zip: Vec<(String, i64)> =
            sqlx::query_as("SELECT zip_code, COUNT(*) FROM business_visits GROUP BY zip_code")
                .fetch_all(&self.pool)
                .await?;

        Ok(TerritoryStats {
            total_visits,
            by_status: by_status.into_iter().collect(),
            by_zip: by_zip.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    struct TestContext {
        repo: VisitRepository,
        _temp_dir: TempDir, // Keep alive for duration of test
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = init_db(&db_path).await.unwrap();
        TestContext {
            repo: VisitRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let new_visit = NewVisit::new("Joe's Diner", "98404")
            .with_contact_name("Joe Smith")
            .with_phone("253-555-0100")
            .with_email("joe@diner.test")
            .with_address("123 Test St")
            .with_city("Tacoma")
            .with_notes("Wants a quote")
            .with_coordinates(47.2529, -122.4443)
            .with_source("whatsapp");

        let id = repo.insert(&new_visit).await.unwrap();
        let visit = repo.get(id).await.unwrap().unwrap();

        assert_eq!(visit.id, id);
        assert_eq!(visit.business_name, new_visit.business_name);
        assert_eq!(visit.zip_code, new_visit.zip_code);
        assert_eq!(visit.contact_name, new_visit.contact_name);
        assert_eq!(visit.phone, new_visit.phone);
        assert_eq!(visit.email, new_visit.email);
        assert_eq!(visit.address, new_visit.address);
        assert_eq!(visit.city, new_visit.city);
        assert_eq!(visit.notes, new_visit.notes);
        assert_eq!(visit.lat, new_visit.lat);
        assert_eq!(visit.lng, new_visit.lng);
        assert_eq!(visit.source, "whatsapp");
        assert_eq!(visit.visit_status, VisitStatus::Interested);
        assert!(visit.ghl_contact_id.is_none());
        assert!(!visit.synced_to_ghl);
        assert!(visit.last_sync_error.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let ctx = setup_repo().await;
        assert!(ctx.repo.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_strictly_increase_and_duplicates_allowed() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let visit = NewVisit::new("Same Shop", "98402");
        let first = repo.insert(&visit).await.unwrap();
        let second = repo.insert(&visit).await.unwrap();
        let third = repo.insert(&NewVisit::new("", "")).await.unwrap();

        assert!(first < second);
        assert!(second < third);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_with_coordinates_newest_first() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let a = repo
            .insert(&NewVisit::new("A", "98404").with_coordinates(47.1, -122.1))
            .await
            .unwrap();
        repo.insert(&NewVisit::new("No coords", "98404"))
            .await
            .unwrap();
        let mut half = NewVisit::new("Lat only", "98404");
        half.lat = Some(47.0);
        repo.insert(&half).await.unwrap();
        let b = repo
            .insert(&NewVisit::new("B", "98405").with_coordinates(47.2, -122.2))
            .await
            .unwrap();

        let visits = repo.list_with_coordinates().await.unwrap();
        let ids: Vec<i64> = visits.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[tokio::test]
    async fn test_list_by_zip() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let first = repo.insert(&NewVisit::new("A", "98404")).await.unwrap();
        repo.insert(&NewVisit::new("B", "98405")).await.unwrap();
        let second = repo.insert(&NewVisit::new("C", "98404")).await.unwrap();

        let visits = repo.list_by_zip("98404").await.unwrap();
        let ids: Vec<i64> = visits.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![second, first]);

        assert!(repo.list_by_zip("00000").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_sync_result_success_links_and_clears_error() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let id = repo.insert(&NewVisit::new("A", "98404")).await.unwrap();
        repo.update_sync_result(id, None, false, Some("HTTP 500: boom"))
            .await
            .unwrap();

        let visit = repo.get(id).await.unwrap().unwrap();
        assert_eq!(visit.last_sync_error.as_deref(), Some("HTTP 500: boom"));
        assert!(!visit.synced_to_ghl);

        repo.update_sync_result(id, Some("abc123"), true, None)
            .await
            .unwrap();

        let visit = repo.get(id).await.unwrap().unwrap();
        assert_eq!(visit.ghl_contact_id.as_deref(), Some("abc123"));
        assert!(visit.synced_to_ghl);
        assert!(visit.last_sync_error.is_none());
    }

    #[tokio::test]
    async fn test_update_sync_result_success_without_id_keeps_link() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let id = repo.insert(&NewVisit::new("A", "98404")).await.unwrap();
        repo.update_sync_result(id, Some("abc123"), true, None)
            .await
            .unwrap();
        repo.update_sync_result(id, None, true, None).await.unwrap();

        let visit = repo.get(id).await.unwrap().unwrap();
        assert_eq!(visit.ghl_contact_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_failed_resync_leaves_synced_flag_set() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let id = repo.insert(&NewVisit::new("A", "98404")).await.unwrap();
        repo.update_sync_result(id, Some("abc123"), true, None)
            .await
            .unwrap();
        repo.update_sync_result(id, None, false, Some("HTTP 502: bad gateway"))
            .await
            .unwrap();

        // A later failure does not mark the visit unsynced again
        let visit = repo.get(id).await.unwrap().unwrap();
        assert!(visit.synced_to_ghl);
        assert_eq!(
            visit.last_sync_error.as_deref(),
            Some("HTTP 502: bad gateway")
        );
        assert_eq!(visit.ghl_contact_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_list_unsynced_in_insertion_order() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let a = repo.insert(&NewVisit::new("A", "1")).await.unwrap();
        let b = repo.insert(&NewVisit::new("B", "1")).await.unwrap();
        let c = repo.insert(&NewVisit::new("C", "1")).await.unwrap();
        repo.update_sync_result(b, Some("remote-b"), true, None)
            .await
            .unwrap();

        let ids: Vec<i64> = repo
            .list_unsynced()
            .await
            .unwrap()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[tokio::test]
    async fn test_stats() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        repo.insert(&NewVisit::new("A", "98404")).await.unwrap();
        repo.insert(&NewVisit::new("B", "98404").with_status(VisitStatus::Converted))
            .await
            .unwrap();
        repo.insert(
            &NewVisit::new("C", "98405").with_status(VisitStatus::Other("callback".into())),
        )
        .await
        .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_visits, 3);
        assert_eq!(stats.by_status.get("interested"), Some(&1));
        assert_eq!(stats.by_status.get("converted"), Some(&1));
        assert_eq!(stats.by_status.get("callback"), Some(&1));
        assert_eq!(stats.by_zip.get("98404"), Some(&2));
        assert_eq!(stats.by_zip.get("98405"), Some(&1));
    }

    #[tokio::test]
    async fn test_stats_empty() {
        let ctx = setup_repo().await;
        assert_eq!(ctx.repo.stats().await.unwrap(), TerritoryStats::default());
    }
}
