//! HTML rendering.
//!
//! Every page is built with [maud](https://maud.lambda.xyz/): templates are
//! Rust functions returning [`Markup`], checked at compile time and escaped
//! by default. Handlers pass in plain records and get markup back; nothing
//! here touches the database or the session.
//!
//! All pages share [`base_document`] (head, inline stylesheet) and
//! [`site_header`] (site title plus navigation). Navigation depends only on
//! whether someone is logged in, which the handler supplies as a [`Viewer`].

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::forms::{CategoryForm, FormErrors, PageForm, RegisterForm};
use crate::types::{Category, Page};

const CSS: &str = include_str!("../static/style.css");

/// Who is looking at the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer<'a> {
    pub username: Option<&'a str>,
}

impl<'a> Viewer<'a> {
    pub fn anonymous() -> Self {
        Self { username: None }
    }

    pub fn user(username: &'a str) -> Self {
        Self {
            username: Some(username),
        }
    }
}

pub fn category_url(category: &Category) -> String {
    format!("/rango/category/{}/", category.slug)
}

pub fn add_page_url(slug: &str) -> String {
    format!("/rango/category/{slug}/add_page/")
}

// ============================================================================
// Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Rango - " (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

/// Renders the site header with the title and navigation
fn site_header(viewer: Viewer<'_>) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/rango/" { "Rango" }
            nav.site-nav {
                (render_nav(viewer))
            }
        }
    }
}

/// Renders the navigation links; account links depend on login state
pub fn render_nav(viewer: Viewer<'_>) -> Markup {
    html! {
        ul {
            li { a href="/rango/" { "Home" } }
            li { a href="/rango/about/" { "About" } }
            li { a href="/rango/add_category/" { "Add a New Category" } }
            @if viewer.username.is_some() {
                li { a href="/rango/restricted/" { "Restricted Page" } }
                li { a href="/rango/logout/" { "Logout" } }
            } @else {
                li { a href="/rango/register/" { "Register Here" } }
                li { a href="/rango/login/" { "Login" } }
            }
        }
    }
}

fn field_errors(errors: &FormErrors, field: &str) -> Markup {
    html! {
        @for message in errors.for_field(field) {
            p.field-error { (message) }
        }
    }
}

fn page_layout(title: &str, viewer: Viewer<'_>, main: Markup) -> Markup {
    let content = html! {
        (site_header(viewer))
        main { (main) }
    };
    base_document(title, content)
}

// ============================================================================
// Page renderers
// ============================================================================

/// Renders the index page with the most liked categories and most viewed pages
pub fn render_index(
    viewer: Viewer<'_>,
    categories: &[Category],
    pages: &[Page],
    visits: u64,
) -> Markup {
    let main = html! {
        h1 { "Rango says..." }
        p.greeting {
            @if let Some(name) = viewer.username {
                "howdy " (name) "!"
            } @else {
                "hey there partner!"
            }
        }
        section.top-categories {
            h2 { "Most Liked Categories" }
            @if categories.is_empty() {
                p { strong { "There are no categories present." } }
            } @else {
                ul {
                    @for category in categories {
                        li { a href=(category_url(category)) { (category.name) } }
                    }
                }
            }
        }
        section.top-pages {
            h2 { "Most Viewed Pages" }
            @if pages.is_empty() {
                p { strong { "There are no pages present." } }
            } @else {
                ul {
                    @for page in pages {
                        li { a href=(page.url) { (page.title) } }
                    }
                }
            }
        }
        p.visits { "Visits: " (visits) }
    };
    page_layout("Home", viewer, main)
}

pub fn render_about(viewer: Viewer<'_>, visits: u64) -> Markup {
    let main = html! {
        h1 { "Rango says: here is the about page." }
        p { "Rango is a directory of useful web pages, filed by category." }
        p.visits { "You have visited this site " (visits) " time(s)." }
    };
    page_layout("About", viewer, main)
}

/// Renders a category and its pages, or a notice when the slug matched nothing
pub fn render_category(viewer: Viewer<'_>, found: Option<(&Category, &[Page])>) -> Markup {
    let title = found.map(|(c, _)| c.name.as_str()).unwrap_or("Unknown Category");
    let main = html! {
        @if let Some((category, pages)) = found {
            h1 { (category.name) }
            @if pages.is_empty() {
                p { strong { "No pages currently in category." } }
            } @else {
                ul.page-list {
                    @for page in pages {
                        li { a href=(page.url) { (page.title) } }
                    }
                }
            }
            p { a href=(add_page_url(&category.slug)) { "Add a Page" } }
        } @else {
            p { strong { "The specified category does not exist!" } }
        }
    };
    page_layout(title, viewer, main)
}

pub fn render_add_category(viewer: Viewer<'_>, form: &CategoryForm, errors: &FormErrors) -> Markup {
    let main = html! {
        h1 { "Add a Category" }
        form #category_form method="post" action="/rango/add_category/" {
            label for="name" { "Please enter the category name." }
            input #name type="text" name="name" maxlength="128" value=(form.name);
            (field_errors(errors, "name"))
            button type="submit" { "Create Category" }
        }
    };
    page_layout("Add a Category", viewer, main)
}

/// Renders the add-page form; without a category there is nothing to add to
pub fn render_add_page(
    viewer: Viewer<'_>,
    category: Option<&Category>,
    form: &PageForm,
    errors: &FormErrors,
) -> Markup {
    let main = html! {
        @if let Some(category) = category {
            h1 { "Add a Page to " (category.name) }
            form #page_form method="post" action=(add_page_url(&category.slug)) {
                label for="title" { "Please enter the title of the page." }
                input #title type="text" name="title" maxlength="128" value=(form.title);
                (field_errors(errors, "title"))
                label for="url" { "Please enter the URL of the page." }
                input #url type="text" name="url" maxlength="200" value=(form.url);
                (field_errors(errors, "url"))
                button type="submit" { "Add Page" }
            }
        } @else {
            h1 { "Add a Page" }
            p { strong { "This category does not exist." } }
        }
    };
    page_layout("Add a Page", viewer, main)
}

pub fn render_register(
    viewer: Viewer<'_>,
    form: &RegisterForm,
    errors: &FormErrors,
    registered: bool,
) -> Markup {
    let main = html! {
        h1 { "Register with Rango" }
        @if registered {
            p.registered {
                strong { "Thank you for registering!" }
                " "
                a href="/rango/" { "Return to the homepage." }
            }
        } @else {
            form #user_form method="post" action="/rango/register/" {
                label for="username" { "Username" }
                input #username type="text" name="username" maxlength="150" value=(form.username);
                (field_errors(errors, "username"))
                label for="email" { "Email address" }
                input #email type="email" name="email" value=(form.email);
                (field_errors(errors, "email"))
                label for="password" { "Password" }
                input #password type="password" name="password";
                (field_errors(errors, "password"))
                label for="website" { "Website" }
                input #website type="text" name="website" maxlength="200" value=(form.website);
                (field_errors(errors, "website"))
                button type="submit" { "Register" }
            }
        }
    };
    page_layout("Register", viewer, main)
}

pub fn render_login(viewer: Viewer<'_>, next: Option<&str>) -> Markup {
    let main = html! {
        h1 { "Login to Rango" }
        form #login_form method="post" action="/rango/login/" {
            label for="username" { "Username:" }
            input #username type="text" name="username";
            label for="password" { "Password:" }
            input #password type="password" name="password";
            @if let Some(next) = next {
                input type="hidden" name="next" value=(next);
            }
            button type="submit" { "Login" }
        }
    };
    page_layout("Login", viewer, main)
}

pub fn render_restricted(viewer: Viewer<'_>, message: &str) -> Markup {
    let main = html! {
        h1 { "Restricted Page" }
        p { (message) }
    };
    page_layout("Restricted", viewer, main)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, slug: &str) -> Category {
        Category {
            id: 1,
            name: name.to_string(),
            slug: slug.to_string(),
            views: 0,
            likes: 0,
        }
    }

    fn page(title: &str, url: &str) -> Page {
        Page {
            id: 1,
            category_id: 1,
            title: title.to_string(),
            url: url.to_string(),
            views: 0,
        }
    }

    #[test]
    fn nav_for_anonymous_offers_login() {
        let html = render_nav(Viewer::anonymous()).into_string();
        assert!(html.contains("/rango/login/"));
        assert!(html.contains("/rango/register/"));
        assert!(!html.contains("/rango/logout/"));
    }

    #[test]
    fn nav_for_user_offers_logout() {
        let html = render_nav(Viewer::user("leifos")).into_string();
        assert!(html.contains("/rango/logout/"));
        assert!(html.contains("/rango/restricted/"));
        assert!(!html.contains("/rango/login/"));
    }

    #[test]
    fn index_lists_categories_and_pages() {
        let cats = vec![category("Other Frameworks", "other-frameworks")];
        let pages = vec![page("Flask", "http://flask.pocoo.org")];
        let html = render_index(Viewer::anonymous(), &cats, &pages, 3).into_string();
        assert!(html.contains(r#"href="/rango/category/other-frameworks/""#));
        assert!(html.contains(r#"href="http://flask.pocoo.org""#));
        assert!(html.contains("Visits: 3"));
        assert!(html.contains("hey there partner!"));
    }

    #[test]
    fn index_empty_state() {
        let html = render_index(Viewer::user("leifos"), &[], &[], 1).into_string();
        assert!(html.contains("There are no categories present."));
        assert!(html.contains("There are no pages present."));
        assert!(html.contains("howdy leifos!"));
    }

    #[test]
    fn category_not_found_notice() {
        let html = render_category(Viewer::anonymous(), None).into_string();
        assert!(html.contains("The specified category does not exist!"));
        assert!(!html.contains("Add a Page"));
    }

    #[test]
    fn category_with_no_pages() {
        let cat = category("Rust", "rust");
        let pages: Vec<Page> = Vec::new();
        let html = render_category(Viewer::anonymous(), Some((&cat, &pages[..]))).into_string();
        assert!(html.contains("No pages currently in category."));
        assert!(html.contains("/rango/category/rust/add_page/"));
    }

    #[test]
    fn names_are_escaped() {
        let cat = category("<script>alert(1)</script>", "script-alert-1-script");
        let pages = vec![page("a & b", "http://example.com")];
        let html = render_category(Viewer::anonymous(), Some((&cat, &pages[..]))).into_string();
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn add_category_shows_errors_and_value() {
        let form = CategoryForm {
            name: "Python".to_string(),
        };
        let mut errors = FormErrors::default();
        errors.add("name", "Category with this Name already exists.");
        let html = render_add_category(Viewer::anonymous(), &form, &errors).into_string();
        assert!(html.contains(r#"value="Python""#));
        assert!(html.contains("Category with this Name already exists."));
    }

    #[test]
    fn add_page_without_category() {
        let html = render_add_page(
            Viewer::anonymous(),
            None,
            &PageForm::default(),
            &FormErrors::default(),
        )
        .into_string();
        assert!(html.contains("This category does not exist."));
        assert!(!html.contains("page_form"));
    }

    #[test]
    fn register_done_hides_form() {
        let html = render_register(
            Viewer::anonymous(),
            &RegisterForm::default(),
            &FormErrors::default(),
            true,
        )
        .into_string();
        assert!(html.contains("Thank you for registering!"));
        assert!(!html.contains("user_form"));
    }

    #[test]
    fn login_carries_next() {
        let html = render_login(Viewer::anonymous(), Some("/rango/restricted/")).into_string();
        assert!(html.contains(r#"name="next" value="/rango/restricted/""#));
    }
}
