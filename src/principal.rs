//! Middleware that resolves the user making a request.
//!
//! There is no log in yet, so every request acts as the placeholder principal
//! configured in [AppState].

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{AppState, UserId};

/// The state needed for the principal middleware.
#[derive(Debug, Clone)]
pub struct PrincipalState {
    /// The user every request acts as.
    pub principal: UserId,
}

impl FromRef<AppState> for PrincipalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            principal: state.principal.clone(),
        }
    }
}

/// Middleware function that places the current user ID into the request
/// before running the request as normal.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn principal_layer(
    State(state): State<PrincipalState>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(state.principal);

    next.run(request).await
}
