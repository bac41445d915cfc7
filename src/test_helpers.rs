//! Shared test utilities.
//!
//! Provides in-memory databases (empty or seeded) and lookup helpers that
//! panic with a readable message on a miss.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let db = seeded_db();
//! let python = find_category(&db, "Python");
//! assert_eq!(python.likes, 64);
//! ```

use crate::db::Database;
use crate::populate::populate;
use crate::types::Category;

// =========================================================================
// Fixture setup
// =========================================================================

/// Fresh, empty in-memory database.
pub fn test_db() -> Database {
    Database::open_in_memory().unwrap()
}

/// In-memory database with the seed categories and pages loaded.
pub fn seeded_db() -> Database {
    let db = test_db();
    populate(&db).unwrap();
    db
}

// =========================================================================
// Lookups — panics with a clear message on miss
// =========================================================================

/// Find a category by name. Panics if not found.
pub fn find_category(db: &Database, name: &str) -> Category {
    db.category_by_name(name).unwrap().unwrap_or_else(|| {
        let names = category_names(db);
        panic!("category '{name}' not found. Available: {names:?}")
    })
}

/// All category names in creation order.
pub fn category_names(db: &Database) -> Vec<String> {
    db.all_categories()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect()
}
