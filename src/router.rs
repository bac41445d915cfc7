//! Route table and middleware stack.

use axum::{
    Router, middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tower_sessions::{
    Expiry, MemoryStore, SessionManagerLayer,
    cookie::{SameSite, time::Duration},
};

use crate::auth::require_login;
use crate::config::SessionConfig;
use crate::handlers;
use crate::state::AppState;

/// Build the application router with sessions, request tracing and the
/// login guard on account-only routes.
pub fn create_router(state: AppState) -> Router {
    let session_layer = session_layer(&state.config().session);

    let guarded = Router::new()
        .route("/rango/logout/", get(handlers::logout))
        .route("/rango/restricted/", get(handlers::restricted))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_login,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/rango/", get(handlers::index))
        .route("/rango/about/", get(handlers::about))
        .route(
            "/rango/add_category/",
            get(handlers::add_category_form).post(handlers::add_category),
        )
        .route("/rango/category/{slug}/", get(handlers::show_category))
        .route(
            "/rango/category/{slug}/add_page/",
            get(handlers::add_page_form).post(handlers::add_page),
        )
        .route(
            "/rango/register/",
            get(handlers::register_form).post(handlers::register),
        )
        .route(
            "/rango/login/",
            get(handlers::login_form).post(handlers::login),
        )
        .merge(guarded)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(config.cookie_name.clone())
        .with_secure(config.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(i64::from(
            config.expiry_days,
        ))))
}
