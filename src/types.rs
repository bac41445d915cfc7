//! Records stored in the database and handed to the templates.

/// A named group of pages, addressed in URLs by its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    /// Display name, unique across categories.
    pub name: String,
    /// URL-safe identifier derived from `name`, also unique.
    pub slug: String,
    pub views: i64,
    pub likes: i64,
}

/// A link filed under exactly one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub url: String,
    pub views: i64,
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// Argon2 PHC string, never the plain password.
    pub password_hash: String,
    /// Inactive accounts can't log in even with the right password.
    pub is_active: bool,
}

/// Extra details collected at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: i64,
    pub website: Option<String>,
}

/// A category about to be inserted. Built by form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
}

/// A page about to be inserted under an existing category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub title: String,
    pub url: String,
}

/// An account about to be inserted, password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub website: Option<String>,
}
