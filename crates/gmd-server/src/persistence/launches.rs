//! Launch log persistence operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use gmd_core::models::{Missile, MissileStatus};

/// A row of the launch log.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchRecord {
    pub missile_id: String,
    pub name: String,
    pub missile_type: String,
    pub launch_lat: f64,
    pub launch_lon: f64,
    pub target_lat: f64,
    pub target_lon: f64,
    pub speed_mps: f64,
    pub launch_time: DateTime<Utc>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Status change queued for the persist loop.
#[derive(Debug, Clone)]
pub struct StatusWrite {
    pub missile_id: String,
    pub status: MissileStatus,
}

pub async fn insert_launch(pool: &SqlitePool, missile: &Missile) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO launches (missile_id, name, missile_type, launch_lat, launch_lon, target_lat, target_lon, speed_mps, launch_time, status, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(missile_id) DO NOTHING
        "#,
    )
    .bind(&missile.id)
    .bind(&missile.name)
    .bind(missile.class.as_str())
    .bind(missile.launch.lat)
    .bind(missile.launch.lon)
    .bind(missile.target.lat)
    .bind(missile.target.lon)
    .bind(missile.speed_mps)
    .bind(missile.launch_time.to_rfc3339())
    .bind(missile.status.as_str())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Update the recorded status of a launch. Returns false if the launch was never logged.
pub async fn update_status(pool: &SqlitePool, missile_id: &str, status: MissileStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE launches SET status = ?1, updated_at = ?2 WHERE missile_id = ?3")
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(missile_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Most recent launches, newest first.
pub async fn list_launches(pool: &SqlitePool, limit: u32) -> Result<Vec<LaunchRecord>> {
    let rows = sqlx::query_as::<_, LaunchRow>(
        "SELECT missile_id, name, missile_type, launch_lat, launch_lon, target_lat, target_lon, speed_mps, launch_time, status, updated_at FROM launches ORDER BY launch_time DESC LIMIT ?1",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct LaunchRow {
    missile_id: String,
    name: String,
    missile_type: String,
    launch_lat: f64,
    launch_lon: f64,
    target_lat: f64,
    target_lon: f64,
    speed_mps: f64,
    launch_time: String,
    status: String,
    updated_at: String,
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl From<LaunchRow> for LaunchRecord {
    fn from(row: LaunchRow) -> Self {
        LaunchRecord {
            launch_time: parse_time(&row.launch_time),
            updated_at: parse_time(&row.updated_at),
            missile_id: row.missile_id,
            name: row.name,
            missile_type: row.missile_type,
            launch_lat: row.launch_lat,
            launch_lon: row.launch_lon,
            target_lat: row.target_lat,
            target_lon: row.target_lon,
            speed_mps: row.speed_mps,
            status: row.status,
        }
    }
}
