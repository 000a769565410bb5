use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::models::{CardInsert, CardRow, CardSummary};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn init(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cards (\
                id TEXT PRIMARY KEY,\
                name TEXT NOT NULL,\
                title TEXT NOT NULL,\
                skills TEXT NOT NULL DEFAULT '[]',\
                stats TEXT NOT NULL DEFAULT '[]',\
                photo_url TEXT,\
                created_at TEXT NOT NULL\
            );",
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cards_created_at ON cards(created_at);")
            .execute(&pool)
            .await?;

        info!("Database initialized");
        Ok(Database { pool })
    }

    pub async fn insert_card(&self, card: &CardInsert) -> Result<(), sqlx::Error> {
        let skills = serde_json::to_string(&card.skills).unwrap_or_else(|_| "[]".to_string());
        let stats = serde_json::to_string(&card.stats).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            "INSERT INTO cards (id, name, title, skills, stats, photo_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&card.id)
        .bind(&card.name)
        .bind(&card.title)
        .bind(skills)
        .bind(stats)
        .bind(&card.photo_url)
        .bind(card.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_cards(&self) -> Result<Vec<CardSummary>, sqlx::Error> {
        sqlx::query_as::<_, CardSummary>(
            "SELECT id, name, title, created_at FROM cards ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_card(&self, id: &str) -> Result<Option<CardRow>, sqlx::Error> {
        sqlx::query_as::<_, CardRow>(
            "SELECT id, name, title, skills, stats, photo_url, created_at \
             FROM cards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::StatEntry;

    async fn test_db() -> Database {
        Database::init("sqlite::memory:").await.unwrap()
    }

    fn card(id: &str, name: &str) -> CardInsert {
        CardInsert {
            id: id.to_string(),
            name: name.to_string(),
            title: "Staff Engineer".to_string(),
            skills: vec!["Rust".to_string()],
            stats: vec![StatEntry {
                label: "Vision".to_string(),
                value: 91,
            }],
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_fetch_round_trip() {
        let db = test_db().await;
        db.insert_card(&card("card-1", "Ada Lovelace")).await.unwrap();

        let row = db.get_card("card-1").await.unwrap().expect("card row");
        assert_eq!(row.name, "Ada Lovelace");
        assert_eq!(row.skills, r#"["Rust"]"#);
        assert_eq!(row.stats, r#"[{"label":"Vision","value":91}]"#);
    }

    #[tokio::test]
    async fn missing_card_is_none() {
        let db = test_db().await;
        assert!(db.get_card("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let db = test_db().await;
        let mut first = card("card-1", "First");
        first.created_at = Utc::now() - chrono::Duration::seconds(60);
        db.insert_card(&first).await.unwrap();
        db.insert_card(&card("card-2", "Second")).await.unwrap();

        let cards = db.list_cards().await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].name, "Second");
        assert_eq!(cards[1].name, "First");
    }
}
