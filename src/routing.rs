//! Application router configuration.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get},
};

use crate::{
    AppState,
    category::get_categories_endpoint,
    dashboard::get_transaction_overview,
    endpoints,
    pdf_export::export_pdf_endpoint,
    principal::principal_layer,
    problem::get_404_not_found,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::COFFEE, get(get_coffee));

    let protected_routes = Router::new()
        .route(endpoints::CATEGORIES, get(get_categories_endpoint))
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint)
                .post(create_transaction_endpoint)
                .put(edit_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::TRANSACTION_OVERVIEW,
            get(get_transaction_overview),
        )
        .route(endpoints::EXPORT_PDF, get(export_pdf_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), principal_layer));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}
