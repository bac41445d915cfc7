//! Request handlers.
//!
//! Handlers read the session and database through explicit calls
//! ([`track_visit`], [`auth::current_user`], [`Database`] methods run through
//! [`Database::blocking`]) and hand plain records to [`templates`]. Expected
//! outcomes (unknown slug, invalid form, bad credentials) are rendered; only
//! infrastructure failures come back as [`AppError`].

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use maud::Markup;
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crate::auth::{self, AuthError, LoginOutcome};
use crate::db::{Database, DbError};
use crate::error::AppError;
use crate::forms::{
    CategoryForm, FormErrors, LoginForm, NextParam, PageForm, RegisterForm, safe_next,
};
use crate::slug::is_valid_slug;
use crate::state::AppState;
use crate::templates::{self, Viewer, category_url};
use crate::types::{Category, User};
use crate::visits::track_visit;

pub const INDEX_PATH: &str = "/rango/";
pub const RESTRICTED_MESSAGE: &str = "Since you're logged in, you can see this text!";
pub const ACCOUNT_DISABLED: &str = "Your Rango account is disabled.";
pub const INVALID_LOGIN: &str = "Invalid login details supplied.";

type HandlerResult = Result<Response, AppError>;

fn html_page(markup: Markup) -> Response {
    Html(markup.into_string()).into_response()
}

fn viewer(user: Option<&User>) -> Viewer<'_> {
    match user {
        Some(u) => Viewer::user(&u.username),
        None => Viewer::anonymous(),
    }
}

async fn session_user(session: &Session, db: &Database) -> Result<Option<User>, AppError> {
    Ok(auth::current_user(session, db).await?)
}

/// Category addressed by a URL slug. Slugs that could never have been
/// generated aren't looked up.
async fn category_for_slug(db: &Database, slug: String) -> Result<Option<Category>, AppError> {
    if !is_valid_slug(&slug) {
        return Ok(None);
    }
    Ok(db.blocking(move |db| db.category_by_slug(&slug)).await?)
}

pub async fn root() -> Redirect {
    Redirect::to(INDEX_PATH)
}

// ============================================================================
// Browsing
// ============================================================================

pub async fn index(State(state): State<AppState>, session: Session) -> HandlerResult {
    let visit = track_visit(&session, Utc::now()).await?;
    let db = state.db();
    let top_categories = state.config().listing.top_categories;
    let top_pages = state.config().listing.top_pages;

    let (categories, pages) = db
        .blocking(move |db| -> Result<_, DbError> {
            Ok((db.top_categories(top_categories)?, db.top_pages(top_pages)?))
        })
        .await?;
    let user = session_user(&session, db).await?;

    Ok(html_page(templates::render_index(
        viewer(user.as_ref()),
        &categories,
        &pages,
        visit.visits,
    )))
}

pub async fn about(State(state): State<AppState>, session: Session) -> HandlerResult {
    let visit = track_visit(&session, Utc::now()).await?;
    let user = session_user(&session, state.db()).await?;
    Ok(html_page(templates::render_about(
        viewer(user.as_ref()),
        visit.visits,
    )))
}

pub async fn show_category(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> HandlerResult {
    let db = state.db();
    let category = category_for_slug(db, slug).await?;
    let pages = match &category {
        Some(c) => {
            let id = c.id;
            db.blocking(move |db| db.pages_for_category(id)).await?
        }
        None => Vec::new(),
    };
    let user = session_user(&session, db).await?;

    Ok(html_page(templates::render_category(
        viewer(user.as_ref()),
        category.as_ref().map(|c| (c, pages.as_slice())),
    )))
}

// ============================================================================
// Adding content
// ============================================================================

pub async fn add_category_form(State(state): State<AppState>, session: Session) -> HandlerResult {
    let user = session_user(&session, state.db()).await?;
    Ok(html_page(templates::render_add_category(
        viewer(user.as_ref()),
        &CategoryForm::default(),
        &FormErrors::default(),
    )))
}

pub async fn add_category(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> HandlerResult {
    let db = state.db();
    let errors = match form.clean() {
        Ok(new) => match db.blocking(move |db| db.create_category(&new)).await {
            Ok(category) => {
                info!(name = %category.name, slug = %category.slug, "created category");
                return Ok(Redirect::to(INDEX_PATH).into_response());
            }
            Err(DbError::Duplicate(_)) => {
                let mut errors = FormErrors::default();
                errors.add("name", "Category with this name already exists.");
                errors
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };
    debug!(?errors, "category form rejected");

    let user = session_user(&session, db).await?;
    Ok(html_page(templates::render_add_category(
        viewer(user.as_ref()),
        &form,
        &errors,
    )))
}

pub async fn add_page_form(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> HandlerResult {
    let db = state.db();
    let category = category_for_slug(db, slug).await?;
    let user = session_user(&session, db).await?;
    Ok(html_page(templates::render_add_page(
        viewer(user.as_ref()),
        category.as_ref(),
        &PageForm::default(),
        &FormErrors::default(),
    )))
}

pub async fn add_page(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
    Form(form): Form<PageForm>,
) -> HandlerResult {
    let db = state.db();
    let category = category_for_slug(db, slug.clone()).await?;

    let errors = match (form.clean(), &category) {
        (Ok(new), Some(category)) => {
            let category_id = category.id;
            let page = db
                .blocking(move |db| db.create_page(category_id, &new))
                .await?;
            info!(category = %category.slug, title = %page.title, "created page");
            return Ok(Redirect::to(&category_url(category)).into_response());
        }
        (Ok(_), None) => {
            debug!(%slug, "page submitted for a missing category");
            FormErrors::default()
        }
        (Err(errors), _) => errors,
    };
    debug!(?errors, "page form rejected");

    let user = session_user(&session, db).await?;
    Ok(html_page(templates::render_add_page(
        viewer(user.as_ref()),
        category.as_ref(),
        &form,
        &errors,
    )))
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn register_form(State(state): State<AppState>, session: Session) -> HandlerResult {
    let user = session_user(&session, state.db()).await?;
    Ok(html_page(templates::render_register(
        viewer(user.as_ref()),
        &RegisterForm::default(),
        &FormErrors::default(),
        false,
    )))
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> HandlerResult {
    let db = state.db();
    let (registered, errors) = match form.clean() {
        Ok(clean) => match auth::register(db, clean).await {
            Ok(_) => (true, FormErrors::default()),
            Err(AuthError::Database(DbError::Duplicate(_))) => {
                let mut errors = FormErrors::default();
                errors.add("username", "A user with that username already exists.");
                (false, errors)
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => (false, errors),
    };
    if !errors.is_empty() {
        debug!(?errors, "registration form rejected");
    }

    let user = session_user(&session, db).await?;
    Ok(html_page(templates::render_register(
        viewer(user.as_ref()),
        &form,
        &errors,
        registered,
    )))
}

pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<NextParam>,
) -> HandlerResult {
    let user = session_user(&session, state.db()).await?;
    Ok(html_page(templates::render_login(
        viewer(user.as_ref()),
        safe_next(params.next.as_deref()),
    )))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> HandlerResult {
    let outcome =
        auth::authenticate(state.db(), form.username.clone(), form.password.clone()).await?;
    match outcome {
        LoginOutcome::Success(user) => {
            auth::login(&session, &user).await?;
            let target = safe_next(form.next.as_deref()).unwrap_or(INDEX_PATH);
            Ok(Redirect::to(target).into_response())
        }
        LoginOutcome::Inactive => {
            info!(username = %form.username, "login refused for disabled account");
            Ok(ACCOUNT_DISABLED.into_response())
        }
        LoginOutcome::Invalid => {
            warn!(username = %form.username, "invalid login details");
            Ok(INVALID_LOGIN.into_response())
        }
    }
}

pub async fn logout(session: Session) -> HandlerResult {
    auth::logout(&session).await?;
    Ok(Redirect::to(INDEX_PATH).into_response())
}

pub async fn restricted(State(state): State<AppState>, session: Session) -> HandlerResult {
    let user = session_user(&session, state.db()).await?;
    Ok(html_page(templates::render_restricted(
        viewer(user.as_ref()),
        RESTRICTED_MESSAGE,
    )))
}
