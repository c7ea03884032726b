//! Schema migrations. Idempotent: safe to run against an already-migrated
//! database on every startup.

use crate::error::Result;
use sqlx::SqlitePool;

pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_movies_table(pool).await?;
    create_actors_table(pool).await?;
    create_movie_actors_table(pool).await?;

    tracing::info!("schema migrations applied");
    Ok(())
}

async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            director    TEXT NOT NULL,
            year        INTEGER NOT NULL,
            rating      REAL,
            genres      TEXT NOT NULL DEFAULT '[]',
            poster_url  TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_director ON movies(director)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_year ON movies(year)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_actors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS actors (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            birth_year  INTEGER,
            bio         TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_actors_name ON actors(name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_movie_actors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movie_actors (
            movie_id   INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
            actor_id   INTEGER NOT NULL REFERENCES actors(id) ON DELETE CASCADE,
            role       TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (movie_id, actor_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movie_actors_actor ON movie_actors(actor_id)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{create_pool, DbConfig};

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = create_pool(&DbConfig::sqlite_memory()).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }
}
