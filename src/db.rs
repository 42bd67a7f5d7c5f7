use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

/// A blog post as served in the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PostRow {
    title: String,
    link: String,
    description: String,
    pub_date: String,
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(row: PostRow) -> anyhow::Result<Self> {
        let pub_date = DateTime::parse_from_rfc3339(&row.pub_date)
            .map_err(|e| anyhow::anyhow!("invalid pub_date '{}': {}", row.pub_date, e))?
            .with_timezone(&Utc);

        Ok(Self {
            title: row.title,
            link: row.link,
            description: row.description,
            pub_date,
        })
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                link TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                pub_date TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_posts_pub_date
            ON posts(pub_date DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_post(
        &self,
        title: &str,
        link: &str,
        description: &str,
        pub_date: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, link, description, pub_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(link)
        .bind(description)
        .bind(pub_date.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Posts newest first. `None` returns every post.
    pub async fn fetch_posts(&self, limit: Option<i64>) -> anyhow::Result<Vec<Post>> {
        // SQLite treats a negative LIMIT as "no limit"
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT title, link, description, pub_date FROM posts
            ORDER BY pub_date DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Post::try_from).collect()
    }
}
