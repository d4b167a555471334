use axum::extract::DefaultBodyLimit;
use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use chara_core::CharacterLifecycle;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middlewares::MultipartConfig;
use crate::rest;
use crate::CharaAxumState;

/// Mount point of the character routes.
pub const CHARACTERS_PATH: &str = "/api/characters";

#[derive(Clone)]
pub struct CharaAxumApp {
    pub state: CharaAxumState,
    pub router: Router<()>,
}

impl CharaAxumApp {
    pub fn new(lifecycle: CharacterLifecycle) -> Self {
        Self::with_form_config(lifecycle, MultipartConfig::default())
    }

    pub fn with_form_config(lifecycle: CharacterLifecycle, form: MultipartConfig) -> Self {
        let state = CharaAxumState::new(lifecycle, form);
        let router = Router::new().nest(CHARACTERS_PATH, rest::characters_router(state.clone()));
        Self { state, router }
    }

    /// Plain GET endpoint, e.g. a health check.
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// The finished router: request ids, tracing and the body limit applied.
    pub fn into_router(self) -> Router<()> {
        let body_limit = self.state.form.max_total_size;
        self.router
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}
