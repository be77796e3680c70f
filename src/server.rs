use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use chrono::{DateTime, Utc};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder as HyperBuilder,
    server::graceful::GracefulShutdown,
    service::TowerToHyperService,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    cli::CommandArguments,
    error::{ServiceError, ServiceResult},
    handler::{
        add_todo_endpoint, delete_todo_endpoint, get_todos_endpoint, health_endpoint,
        todo_stats_endpoint, update_todo_endpoint,
    },
    storage::{MemoryTodoStore, MongoTodoStore, TodoStore},
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// State shared by every request: the store handle and startup metadata.
pub struct ServerState {
    pub store: Arc<dyn TodoStore>,
    pub version: &'static str,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self {
            store,
            version: crate::metadata::PKG_VERSION,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

pub fn cors_layer(allowed_origins: &[String]) -> ServiceResult<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            if origin == "*" {
                return Err(ServiceError::Config(
                    "wildcard origin cannot be combined with credentials".to_string(),
                ));
            }
            HeaderValue::from_str(origin)
                .map_err(|e| ServiceError::Config(format!("invalid origin '{origin}': {e}")))
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    // Credentials cannot be combined with a `*` header list, so requested
    // headers are mirrored instead.
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
            Method::PUT,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub fn router(state: SharedState, allowed_origins: &[String]) -> ServiceResult<Router> {
    Ok(Router::new()
        .route("/add-todo", post(add_todo_endpoint))
        .route("/get-todos", get(get_todos_endpoint))
        .route("/update-todo", put(update_todo_endpoint))
        .route("/delete-todo", delete(delete_todo_endpoint))
        .route("/todo-stats", get(todo_stats_endpoint))
        .route("/health", get(health_endpoint))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins)?)
        .with_state(state))
}

async fn build_store(args: &CommandArguments) -> ServiceResult<Arc<dyn TodoStore>> {
    if args.in_memory {
        tracing::warn!("Using in-memory store; todo lists are lost on exit");
        return Ok(Arc::new(MemoryTodoStore::new()));
    }

    let settings = args
        .mongo_settings()
        .ok_or_else(|| ServiceError::Config("MONGODB_URI is not set".to_string()))?;
    let store = MongoTodoStore::connect(&settings).await?;
    // An unreachable server should not keep the process from starting.
    if let Err(err) = store.ensure_indexes().await {
        tracing::warn!(error = %err, "could not ensure the unique email index");
    }
    Ok(Arc::new(store))
}

pub async fn start_server(args: CommandArguments) -> ServiceResult<()> {
    args.validate().map_err(ServiceError::Config)?;

    let store = build_store(&args).await?;
    let backend = store.backend_name();
    let state = Arc::new(ServerState::new(store));
    let app = router(state, &args.allowed_origins)?;

    let addr: SocketAddr = args.http_addr.parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::FromString(format!("HTTP listen error: {e}")))?;
    tracing::info!(
        "{} v{} listening on http://{} ({backend} store)",
        crate::metadata::PKG_NAME,
        crate::metadata::PKG_VERSION,
        listener.local_addr()?
    );

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        trigger.cancel();
    });

    serve(listener, app, shutdown).await
}

/// Accept connections until `shutdown` fires, then let open connections
/// finish for up to [`SHUTDOWN_GRACE`].
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> ServiceResult<()> {
    let service = TowerToHyperService::new(app);
    let builder = HyperBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!("HTTP accept error: {err}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let conn = builder.serve_connection_with_upgrades(io, service.clone());
                let conn = graceful.watch(conn.into_owned());
                tokio::spawn(async move {
                    if let Err(err) = conn.await {
                        tracing::warn!("HTTP connection error from {peer}: {err}");
                    }
                });
            }
            _ = shutdown.cancelled() => break,
        }
    }

    drop(listener);
    tokio::select! {
        _ = graceful.shutdown() => tracing::info!("All connections closed"),
        _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
            tracing::warn!("Timed out waiting for connections to close");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                tracing::warn!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
