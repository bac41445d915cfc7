//! CLI output formatting for the `populate` and `check` commands.
//!
//! # Output Format
//!
//! ## Populate
//!
//! One line per seeded category/page pair, then a summary:
//!
//! ```text
//! - Python - Official Python Tutorial
//! - Python - How to Think like a Computer Scientist
//! - Django - Official Django Tutorial
//!
//! Seeded 3 categories, 8 pages (11 new rows)
//! ```
//!
//! A category without pages still gets a line so it shows up in the list.
//!
//! ## Check
//!
//! ```text
//! Config
//!     rango.toml
//!     bind: 127.0.0.1:8000
//! Database
//!     rango.sqlite3
//!     categories: 3
//!     pages: 8
//!     users: 0
//! ```
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use std::path::Path;

use crate::config::AppConfig;
use crate::populate::PopulateReport;

/// Row counts shown by `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub categories: u64,
    pub pages: u64,
    pub users: u64,
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// populate
// ============================================================================

pub fn format_populate_output(report: &PopulateReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut page_count = 0;

    for (category, pages) in &report.categories {
        if pages.is_empty() {
            lines.push(format!("- {}", category.name));
        }
        for page in pages {
            lines.push(format!("- {} - {}", category.name, page.title));
            page_count += 1;
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Seeded {}, {} ({})",
        plural(report.categories.len(), "category", "categories"),
        plural(page_count, "page", "pages"),
        plural(report.inserted, "new row", "new rows"),
    ));
    lines
}

pub fn print_populate_output(report: &PopulateReport) {
    for line in format_populate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// `config_file` is `None` when no file was found and stock defaults apply.
pub fn format_check_output(
    config_file: Option<&Path>,
    config: &AppConfig,
    counts: &TableCounts,
) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];
    match config_file {
        Some(path) => lines.push(format!("    {}", path.display())),
        None => lines.push("    (stock defaults)".to_string()),
    }
    lines.push(format!("    bind: {}", config.server.bind));

    lines.push("Database".to_string());
    lines.push(format!("    {}", config.database.path));
    lines.push(format!("    categories: {}", counts.categories));
    lines.push(format!("    pages: {}", counts.pages));
    lines.push(format!("    users: {}", counts.users));
    lines
}

pub fn print_check_output(config_file: Option<&Path>, config: &AppConfig, counts: &TableCounts) {
    for line in format_check_output(config_file, config, counts) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Page};

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            views: 0,
            likes: 0,
        }
    }

    fn page(id: i64, category_id: i64, title: &str) -> Page {
        Page {
            id,
            category_id,
            title: title.to_string(),
            url: "http://example.com/".to_string(),
            views: 0,
        }
    }

    // =========================================================================
    // populate
    // =========================================================================

    #[test]
    fn populate_lists_each_pair() {
        let report = PopulateReport {
            categories: vec![
                (
                    category(1, "Python"),
                    vec![page(1, 1, "Official Python Tutorial"), page(2, 1, "Learn Python")],
                ),
                (category(2, "Django"), vec![page(3, 2, "Official Django Tutorial")]),
            ],
            inserted: 5,
        };
        let lines = format_populate_output(&report);
        assert_eq!(
            lines,
            vec![
                "- Python - Official Python Tutorial",
                "- Python - Learn Python",
                "- Django - Official Django Tutorial",
                "",
                "Seeded 2 categories, 3 pages (5 new rows)",
            ]
        );
    }

    #[test]
    fn populate_shows_empty_category() {
        let report = PopulateReport {
            categories: vec![(category(1, "Rust"), vec![])],
            inserted: 0,
        };
        let lines = format_populate_output(&report);
        assert_eq!(lines[0], "- Rust");
        assert_eq!(lines[2], "Seeded 1 category, 0 pages (0 new rows)");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
        assert_eq!(plural(2, "new row", "new rows"), "2 new rows");
    }

    // =========================================================================
    // check
    // =========================================================================

    #[test]
    fn check_output_with_file() {
        let counts = TableCounts {
            categories: 3,
            pages: 8,
            users: 1,
        };
        let lines = format_check_output(
            Some(Path::new("rango.toml")),
            &AppConfig::default(),
            &counts,
        );
        assert_eq!(
            lines,
            vec![
                "Config",
                "    rango.toml",
                "    bind: 127.0.0.1:8000",
                "Database",
                "    rango.sqlite3",
                "    categories: 3",
                "    pages: 8",
                "    users: 1",
            ]
        );
    }

    #[test]
    fn check_output_without_file() {
        let counts = TableCounts {
            categories: 0,
            pages: 0,
            users: 0,
        };
        let lines = format_check_output(None, &AppConfig::default(), &counts);
        assert_eq!(lines[1], "    (stock defaults)");
    }
}
