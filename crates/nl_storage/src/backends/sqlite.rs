use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nl_core::{Error, Result, SavedArticle, User, UserProfile, UserStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        identity_key TEXT PRIMARY KEY,
        auth0_id TEXT NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        picture TEXT NOT NULL,
        created_at TEXT NOT NULL,
        saved_articles TEXT NOT NULL DEFAULT '[]'
    )
    "#,
];

/// Users and their saved articles in a single SQLite table. Saved articles
/// are kept as a JSON array, the way the account document embeds them.
#[derive(Debug, Clone)]
pub struct SQLiteStorage {
    pool: SqlitePool,
}

fn identity_key(auth0_id: &str) -> String {
    auth0_id.to_lowercase()
}

fn query_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            Error::StoreUnavailable(e.to_string())
        }
        other => Error::Storage(other.to_string()),
    }
}

impl SQLiteStorage {
    /// Connects to a `sqlite:` URL, creating the database file when missing.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::InvalidInput(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        // Every connection to `:memory:` opens a separate database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::StoreUnavailable(format!("Failed to run migration {}: {}", i, e)))?;
        }

        debug!("SQLite store ready at {}", url);
        Ok(Self { pool })
    }

    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::connect(&format!("sqlite:{}", db_path.display())).await
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let get = |column: &str| -> Result<String> {
        row.try_get::<String, _>(column)
            .map_err(|e| Error::Storage(format!("Failed to read column {}: {}", column, e)))
    };

    let created_at = DateTime::parse_from_rfc3339(&get("created_at")?)
        .map_err(|e| Error::Storage(format!("Failed to parse date: {}", e)))?
        .with_timezone(&Utc);
    let saved_articles: Vec<SavedArticle> = serde_json::from_str(&get("saved_articles")?)?;

    Ok(User {
        auth0_id: get("auth0_id")?,
        name: get("name")?,
        email: get("email")?,
        picture: get("picture")?,
        created_at,
        saved_articles,
    })
}

#[async_trait]
impl UserStore for SQLiteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find_user_by_identity(&self, auth0_id: &str) -> Result<User> {
        let row = sqlx::query("SELECT * FROM users WHERE identity_key = ?")
            .bind(identity_key(auth0_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .ok_or_else(|| Error::NotFound(format!("user {}", auth0_id)))?;
        user_from_row(&row)
    }

    async fn append_saved_article(&self, auth0_id: &str, article: SavedArticle) -> Result<()> {
        // One statement, so the write lock is taken up front.
        let result = sqlx::query(
            "UPDATE users SET saved_articles = json_insert(saved_articles, '$[#]', json(?)) WHERE identity_key = ?",
        )
        .bind(serde_json::to_string(&article)?)
        .bind(identity_key(auth0_id))
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {}", auth0_id)));
        }
        Ok(())
    }

    async fn upsert_user(&self, profile: UserProfile) -> Result<User> {
        let user = User::from_profile(profile);
        sqlx::query(
            r#"
            INSERT INTO users (identity_key, auth0_id, name, email, picture, created_at, saved_articles)
            VALUES (?, ?, ?, ?, ?, ?, '[]')
            ON CONFLICT(identity_key) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                picture = excluded.picture
            "#,
        )
        .bind(identity_key(&user.auth0_id))
        .bind(&user.auth0_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.picture)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        self.find_user_by_identity(&user.auth0_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nl_core::NewSavedArticle;
    use tempfile::tempdir;

    fn profile(auth0_id: &str) -> UserProfile {
        UserProfile {
            auth0_id: auth0_id.to_string(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            picture: "https://example.com/grace.png".to_string(),
        }
    }

    fn article(title: &str) -> SavedArticle {
        NewSavedArticle {
            id: Some("a-1".to_string()),
            title: title.to_string(),
            content: "Saved body".to_string(),
            url: Some("https://news.example.com/a".to_string()),
        }
        .into_saved()
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("nested/users.db"))
            .await
            .unwrap();

        let created = storage.upsert_user(profile("google-oauth2|XyZ")).await.unwrap();
        assert!(created.saved_articles.is_empty());

        storage
            .append_saved_article("GOOGLE-OAUTH2|xyz", article("Budget"))
            .await
            .unwrap();

        let user = storage.find_user_by_identity("google-oauth2|xyz").await.unwrap();
        assert_eq!(user.auth0_id, "google-oauth2|XyZ");
        assert_eq!(user.saved_articles.len(), 1);
        assert_eq!(user.saved_articles[0].id, "a-1");
        assert_eq!(user.created_at.timestamp(), created.created_at.timestamp());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found_and_untouched() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("users.db"))
            .await
            .unwrap();
        storage.upsert_user(profile("auth0|known")).await.unwrap();

        let err = storage
            .append_saved_article("auth0|unknown", article("Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&storage.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        let known = storage.find_user_by_identity("auth0|known").await.unwrap();
        assert!(known.saved_articles.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_refreshes_profile_and_keeps_articles() {
        let storage = SQLiteStorage::connect("sqlite::memory:").await.unwrap();
        storage.upsert_user(profile("auth0|1")).await.unwrap();
        storage.append_saved_article("auth0|1", article("Kept")).await.unwrap();

        let user = storage
            .upsert_user(UserProfile {
                email: "new@example.com".to_string(),
                ..profile("AUTH0|1")
            })
            .await
            .unwrap();
        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.auth0_id, "auth0|1");
        assert_eq!(user.saved_articles[0].title, "Kept");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_all_land() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("users.db"))
            .await
            .unwrap();
        storage.upsert_user(profile("auth0|busy")).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .append_saved_article("auth0|busy", article(&format!("Story {}", i)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let user = storage.find_user_by_identity("auth0|busy").await.unwrap();
        assert_eq!(user.saved_articles.len(), 20);
        let mut titles: Vec<_> = user.saved_articles.iter().map(|a| a.title.clone()).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), 20);
    }
}
