use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod chat;
pub mod health;
pub mod player;
pub mod quiz;
pub mod session;
pub mod sse;

/// Compose all route trees, wiring in shared state and the Swagger UI at `/docs`.
pub fn router(state: SharedState) -> Router<()> {
    let docs: Router<SharedState> = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into();

    health::router()
        .merge(quiz::router())
        .merge(session::router())
        .merge(player::router())
        .merge(chat::router())
        .merge(sse::router())
        .merge(docs)
        .with_state(state)
}
