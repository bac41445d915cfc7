//! # Rango
//!
//! A small content directory web app: visitors browse categories and the
//! pages (links) filed under them, add new ones, and register or log in.
//! The server is axum on tokio, storage is SQLite behind an r2d2 pool, and
//! every page is rendered server-side with Maud.
//!
//! # Request Flow
//!
//! ```text
//! request → TraceLayer → SessionManagerLayer → [require_login] → handler
//!                                                                   │
//!                    session (visits, user id) ◄───────────────────┤
//!                    Database (repository calls) ◄─────────────────┤
//!                    templates (Markup) ◄──────────────────────────┘
//! ```
//!
//! Handlers pull what they need explicitly: the visit counter through
//! [`visits::track_visit`], the logged-in user through
//! [`auth::current_user`], data through [`db::Database`] methods. Nothing is
//! injected into templates behind the handler's back.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`server`] | Opens the database, binds the listener, graceful shutdown |
//! | [`router`] | Route table, session layer, request tracing, login guard placement |
//! | [`handlers`] | One async function per page; forms, redirects, plain-text auth replies |
//! | [`templates`] | Maud layout and page renderers |
//! | [`forms`] | Urlencoded form structs, validation, URL normalization |
//! | [`auth`] | Argon2 password hashing, login/logout, account (de)activation, `require_login` middleware |
//! | [`visits`] | Per-session visit counter with a one-day window |
//! | [`db`] | SQLite schema and repository methods over an r2d2 pool |
//! | [`populate`] | Idempotent seed data for a fresh database |
//! | [`slug`] | Category name → URL slug |
//! | [`config`] | `rango.toml` loading, merging over stock defaults, validation |
//! | [`state`] | `Arc`-wrapped config and database shared by handlers |
//! | [`error`] | `AppError`, the 500 response for infrastructure failures |
//! | [`types`] | Records passed between the database and the templates |
//! | [`output`] | CLI output formatting for `populate` and `check` |
//!
//! # Design Decisions
//!
//! ## Sessions Live In Memory
//!
//! Sessions use `tower_sessions::MemoryStore`, so a restart logs everyone out
//! and resets visit counters. Accounts and content are in SQLite and survive.
//!
//! ## Synchronous Repository, Blocking Pool
//!
//! [`db::Database`] methods are plain synchronous rusqlite calls, used as-is
//! by the CLI and unit tests. Async code never calls them directly: handlers
//! and the login guard go through
//! [`db::Database::blocking`], which runs the closure on tokio's blocking
//! pool. Argon2 hashing and verification run inside the same closures as the
//! user lookup or insert, so a login or registration never stalls the
//! runtime's worker threads.
//!
//! ## Duplicates Are Form Errors
//!
//! Category names and usernames are unique in the schema. Validation doesn't
//! pre-check them; the insert reports [`db::DbError::Duplicate`] and the
//! handler turns that into a message on the re-rendered form.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod output;
pub mod populate;
pub mod router;
pub mod server;
pub mod slug;
pub mod state;
pub mod templates;
pub mod types;
pub mod visits;

#[cfg(test)]
pub(crate) mod test_helpers;
