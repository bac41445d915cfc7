//! Seed data.
//!
//! [`populate`] loads a fixed set of categories and pages using
//! get-or-create, then overwrites their counters. Running it any number of
//! times leaves the same three categories and eight pages behind; rows added
//! through the forms are left alone.

use tracing::info;

use crate::db::{Database, DbError};
use crate::slug::category_slug;
use crate::types::{Category, NewCategory, Page};

struct SeedPage {
    title: &'static str,
    url: &'static str,
    views: i64,
}

struct SeedCategory {
    name: &'static str,
    views: i64,
    likes: i64,
    pages: &'static [SeedPage],
}

const SEED: &[SeedCategory] = &[
    SeedCategory {
        name: "Python",
        views: 128,
        likes: 64,
        pages: &[
            SeedPage {
                title: "Official Python Tutorial",
                url: "http://docs.python.org/2/tutorial/",
                views: 7,
            },
            SeedPage {
                title: "How to think like a Computer Scientist",
                url: "http://www.greenteapress.com/thinkpython/",
                views: 6,
            },
            SeedPage {
                title: "Learn Python in 10 minutes",
                url: "http://www.korokithakis.net/tutorials/python",
                views: 5,
            },
        ],
    },
    SeedCategory {
        name: "Django",
        views: 64,
        likes: 32,
        pages: &[
            SeedPage {
                title: "Official Django Tutorial",
                url: "https://docs.djangoproject.com/en/1.9/intro/tutorial01/",
                views: 3,
            },
            SeedPage {
                title: "Django Rocks",
                url: "http://www.djangorocks.com/",
                views: 8,
            },
            SeedPage {
                title: "How to Tango with Django",
                url: "http://www.tangowithdjango.com/",
                views: 9,
            },
        ],
    },
    SeedCategory {
        name: "Other Frameworks",
        views: 32,
        likes: 16,
        pages: &[
            SeedPage {
                title: "Bottle",
                url: "http://bottlepy.org/docs/dev/",
                views: 10,
            },
            SeedPage {
                title: "Flask",
                url: "http://flask.pocoo.org",
                views: 11,
            },
        ],
    },
];

/// Every category with its pages, as left in the database after seeding.
#[derive(Debug)]
pub struct PopulateReport {
    pub categories: Vec<(Category, Vec<Page>)>,
    /// Rows inserted by this run (zero on a re-run).
    pub inserted: usize,
}

/// Insert or refresh the seed categories and pages.
pub fn populate(db: &Database) -> Result<PopulateReport, DbError> {
    let mut inserted = 0;

    for seed in SEED {
        let (category, created) = db.get_or_create_category(&NewCategory {
            name: seed.name.to_string(),
            slug: category_slug(seed.name),
        })?;
        inserted += usize::from(created);
        db.set_category_counters(category.id, seed.views, seed.likes)?;

        for page in seed.pages {
            let (row, created) = db.get_or_create_page(category.id, page.title)?;
            inserted += usize::from(created);
            db.set_page_details(row.id, page.url, page.views)?;
        }
    }
    info!(inserted, "seed data loaded");

    let categories = db
        .all_categories()?
        .into_iter()
        .map(|c| -> Result<_, DbError> {
            let pages = db.pages_for_category(c.id)?;
            Ok((c, pages))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PopulateReport {
        categories,
        inserted,
    })
}
