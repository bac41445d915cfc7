//! SQLite storage.
//!
//! [`Database`] wraps an r2d2 pool of SQLite connections and exposes one
//! method per query the application needs. Every method checks out a single
//! connection for its duration and returns concrete values (`Vec`, `Option`,
//! records), so callers never hold a lazy query.
//!
//! ## Schema
//!
//! ```text
//! category       id, name UNIQUE, slug UNIQUE, views, likes
//! page           id, category_id → category, title, url, views
//! users          id, username UNIQUE, email, password_hash, is_active, date_joined
//! user_profile   user_id → users, website
//! ```
//!
//! Tables are created on open if missing.

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, Row, params};
use std::path::Path;
use thiserror::Error;

use crate::types::{Category, NewCategory, NewPage, NewUser, Page, User, UserProfile};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A UNIQUE constraint rejected the write.
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS category (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL UNIQUE,
    slug    TEXT NOT NULL UNIQUE,
    views   INTEGER NOT NULL DEFAULT 0,
    likes   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS page (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL REFERENCES category(id),
    title       TEXT NOT NULL,
    url         TEXT NOT NULL,
    views       INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS page_category ON page(category_id);

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT,
    password_hash TEXT NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    date_joined   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_profile (
    user_id INTEGER PRIMARY KEY REFERENCES users(id),
    website TEXT
);
"#;

const CATEGORY_COLUMNS: &str = "id, name, slug, views, likes";
const PAGE_COLUMNS: &str = "id, category_id, title, url, views";
const USER_COLUMNS: &str = "id, username, email, password_hash, is_active";

/// Handle to the application database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().build(manager)?;
        Self::from_pool(pool)
    }

    /// Open a private in-memory database.
    ///
    /// Each SQLite memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;
        Self::from_pool(pool)
    }

    fn from_pool(pool: DbPool) -> Result<Self, DbError> {
        let db = Self { pool };
        db.migrate()?;
        Ok(db)
    }

    /// Run `f` against this database on tokio's blocking pool.
    ///
    /// Async callers go through here so pool checkout, SQLite I/O and
    /// anything else `f` does (password hashing) stay off the worker threads.
    pub async fn blocking<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<DbError> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| E::from(DbError::Task(e)))?
    }

    fn migrate(&self) -> Result<(), DbError> {
        let conn = self.pool.get()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ── Categories ──────────────────────────────────────────────────

    /// The `limit` most liked categories.
    pub fn top_categories(&self, limit: u32) -> Result<Vec<Category>, DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category ORDER BY likes DESC, id ASC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], category_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Every category, in creation order.
    pub fn all_categories(&self) -> Result<Vec<Category>, DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError> {
        let conn = self.pool.get()?;
        let category = conn
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM category WHERE slug = ?1"),
                params![slug],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    #[cfg(test)]
    pub fn category_by_name(&self, name: &str) -> Result<Option<Category>, DbError> {
        let conn = self.pool.get()?;
        let category = conn
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM category WHERE name = ?1"),
                params![name],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Insert a new category with zeroed counters.
    ///
    /// Returns [`DbError::Duplicate`] if the name or slug is taken.
    pub fn create_category(&self, new: &NewCategory) -> Result<Category, DbError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO category (name, slug) VALUES (?1, ?2)",
            params![new.name, new.slug],
        )
        .map_err(|e| unique_violation(e, "category"))?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: new.name.clone(),
            slug: new.slug.clone(),
            views: 0,
            likes: 0,
        })
    }

    /// Fetch the category called `name`, inserting it if absent.
    ///
    /// The flag is true when a row was inserted.
    pub fn get_or_create_category(&self, new: &NewCategory) -> Result<(Category, bool), DbError> {
        let conn = self.pool.get()?;
        let inserted = conn
            .execute(
                "INSERT INTO category (name, slug) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
                params![new.name, new.slug],
            )
            .map_err(|e| unique_violation(e, "category slug"))?;
        let category = conn.query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM category WHERE name = ?1"),
            params![new.name],
            category_from_row,
        )?;
        Ok((category, inserted == 1))
    }

    pub fn set_category_counters(&self, id: i64, views: i64, likes: i64) -> Result<(), DbError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE category SET views = ?1, likes = ?2 WHERE id = ?3",
            params![views, likes, id],
        )?;
        Ok(())
    }

    pub fn count_categories(&self) -> Result<u64, DbError> {
        self.count("category")
    }

    // ── Pages ───────────────────────────────────────────────────────

    /// The `limit` most viewed pages across all categories.
    pub fn top_pages(&self, limit: u32) -> Result<Vec<Page>, DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PAGE_COLUMNS} FROM page ORDER BY views DESC, id ASC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], page_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Pages filed under a category, in creation order.
    pub fn pages_for_category(&self, category_id: i64) -> Result<Vec<Page>, DbError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PAGE_COLUMNS} FROM page WHERE category_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![category_id], page_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Insert a page under `category_id` with zero views.
    pub fn create_page(&self, category_id: i64, new: &NewPage) -> Result<Page, DbError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO page (category_id, title, url, views) VALUES (?1, ?2, ?3, 0)",
            params![category_id, new.title, new.url],
        )?;
        Ok(Page {
            id: conn.last_insert_rowid(),
            category_id,
            title: new.title.clone(),
            url: new.url.clone(),
            views: 0,
        })
    }

    /// Fetch the page titled `title` in a category, inserting an empty one if
    /// absent. The flag is true when a row was inserted.
    pub fn get_or_create_page(&self, category_id: i64, title: &str) -> Result<(Page, bool), DbError> {
        let conn = self.pool.get()?;
        let existing = conn
            .query_row(
                &format!(
                    "SELECT {PAGE_COLUMNS} FROM page WHERE category_id = ?1 AND title = ?2 \
                     ORDER BY id ASC LIMIT 1"
                ),
                params![category_id, title],
                page_from_row,
            )
            .optional()?;
        if let Some(page) = existing {
            return Ok((page, false));
        }
        conn.execute(
            "INSERT INTO page (category_id, title, url, views) VALUES (?1, ?2, '', 0)",
            params![category_id, title],
        )?;
        let page = Page {
            id: conn.last_insert_rowid(),
            category_id,
            title: title.to_string(),
            url: String::new(),
            views: 0,
        };
        Ok((page, true))
    }

    pub fn set_page_details(&self, id: i64, url: &str, views: i64) -> Result<(), DbError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE page SET url = ?1, views = ?2 WHERE id = ?3",
            params![url, views, id],
        )?;
        Ok(())
    }

    pub fn count_pages(&self) -> Result<u64, DbError> {
        self.count("page")
    }

    // ── Users ───────────────────────────────────────────────────────

    /// Insert a user and their profile in one transaction.
    ///
    /// Returns [`DbError::Duplicate`] if the username is taken.
    pub fn create_user(&self, new: &NewUser) -> Result<User, DbError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO users (username, email, password_hash, is_active, date_joined) \
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![
                new.username,
                new.email,
                new.password_hash,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| unique_violation(e, "username"))?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO user_profile (user_id, website) VALUES (?1, ?2)",
            params![id, new.website],
        )?;
        tx.commit()?;
        Ok(User {
            id,
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            is_active: true,
        })
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn profile_for_user(&self, user_id: i64) -> Result<Option<UserProfile>, DbError> {
        let conn = self.pool.get()?;
        let profile = conn
            .query_row(
                "SELECT user_id, website FROM user_profile WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserProfile {
                        user_id: row.get(0)?,
                        website: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    pub fn set_user_active(&self, id: i64, active: bool) -> Result<(), DbError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET is_active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(())
    }

    pub fn count_users(&self) -> Result<u64, DbError> {
        self.count("users")
    }

    fn count(&self, table: &str) -> Result<u64, DbError> {
        let conn = self.pool.get()?;
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(n as u64)
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        views: row.get(3)?,
        likes: row.get(4)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        category_id: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        views: row.get(4)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_active: row.get(4)?,
    })
}

/// Map a UNIQUE constraint failure to [`DbError::Duplicate`].
fn unique_violation(err: rusqlite::Error, what: &str) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            DbError::Duplicate(what.to_string())
        }
        _ => DbError::Sqlite(err),
    }
}
