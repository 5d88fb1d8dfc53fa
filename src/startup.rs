use std::net::TcpListener;
use std::path::Path;

use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::{get, post},
    serve::Serve,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

use crate::configuration::{AlphaRedirect, Settings};
use crate::routes::{alpha_redirect, health_check, subscribe, MAX_BODY_BYTES};
use crate::store::{StoreWriter, SubscriberStore};

#[derive(Clone)]
pub struct AppState {
    pub store: SubscriberStore,
    pub writer: StoreWriter,
    pub alpha: AlphaRedirect,
}

pub struct Application {
    port: u16,
    server: Serve<Router, Router>,
}

impl Application {
    /// Prepares the subscriber store, starts its writer and binds the listener.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let store = SubscriberStore::new(&configuration.storage.subscribers_file);
        store.init().await?;
        let writer = StoreWriter::spawn(store.clone());

        let state = AppState {
            store,
            writer,
            alpha: configuration.alpha.redirect(),
        };

        let address = configuration.application.address();
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);

        let server = run(listener, state, &configuration.static_files.root)?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    static_root: &Path,
) -> Result<Serve<Router, Router>, std::io::Error> {
    let app = Router::new()
        .route("/health_check", get(health_check))
        .route(
            "/subscribe",
            post(subscribe).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .route("/alpha", get(alpha_redirect))
        .route("/alpha/", get(alpha_redirect))
        .route("/alpha/*rest", get(alpha_redirect))
        .fallback_service(ServeDir::new(static_root))
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request| {
                        let request_id = Uuid::new_v4();
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id
                        )
                    })
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ),
        )
        .with_state(state);

    listener.set_nonblocking(true)?;
    let listener = tokio::net::TcpListener::from_std(listener)?;

    let server = axum::serve(listener, app);
    Ok(server)
}
