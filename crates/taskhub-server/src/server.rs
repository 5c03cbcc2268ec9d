use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Router, middleware};
use taskhub_auth::{AuthState, JwtService, PasswordCodec};
use taskhub_db_memory::InMemoryStorage;
use taskhub_db_postgres::{PostgresStorage, create_pool, mask_password, migrations};
use taskhub_service::{
    AccountService, CacheBackend, CachedAccountStorage, CachedTaskStorage, TaskService,
    create_cache_backend,
};
use taskhub_storage::{AccountStorage, TaskStorage};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::{handlers, middleware as app_middleware};

/// Shared handles for every request.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub tasks: TaskService,
    pub passwords: Arc<PasswordCodec>,
    pub auth: AuthState,
    /// Role claim written into issued tokens.
    pub default_role: Arc<str>,
    pub cache: CacheBackend,
}

impl AppState {
    /// Wires services over the given storage.
    ///
    /// Task reads and account lookups by id go through `cache`. The task
    /// service checks owner existence against the raw account store.
    pub fn new(
        cfg: &AppConfig,
        accounts: Arc<dyn AccountStorage>,
        tasks: Arc<dyn TaskStorage>,
        cache: CacheBackend,
    ) -> anyhow::Result<Self> {
        let jwt = JwtService::from_config(&cfg.auth)?;
        let ttl = cfg.cache_ttl();

        let cached_accounts: Arc<dyn AccountStorage> = Arc::new(CachedAccountStorage::new(
            accounts.clone(),
            cache.clone(),
            ttl,
        ));
        let cached_tasks: Arc<dyn TaskStorage> =
            Arc::new(CachedTaskStorage::new(tasks, cache.clone(), ttl));

        Ok(Self {
            accounts: AccountService::new(cached_accounts),
            tasks: TaskService::new(accounts, cached_tasks),
            passwords: Arc::new(PasswordCodec::with_pepper(&cfg.auth.password_pepper)),
            auth: AuthState::new(Arc::new(jwt)),
            default_role: Arc::from(cfg.auth.default_role.as_str()),
            cache,
        })
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todos/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api_routes())
        .with_state(state)
        // Outermost last: request id -> trace -> cors -> compression -> timeout -> body limit
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(cfg.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

/// Storage selected at startup.
struct Storage {
    accounts: Arc<dyn AccountStorage>,
    tasks: Arc<dyn TaskStorage>,
    postgres: Option<PostgresStorage>,
}

impl Storage {
    fn memory() -> Self {
        let store = Arc::new(InMemoryStorage::new());
        Self {
            accounts: store.clone(),
            tasks: store,
            postgres: None,
        }
    }

    fn postgres(store: PostgresStorage) -> Self {
        let shared = Arc::new(store.clone());
        Self {
            accounts: shared.clone(),
            tasks: shared,
            postgres: Some(store),
        }
    }
}

/// Connects the configured backend.
///
/// A failed connection falls back to memory when `fallback_to_memory` is set.
/// A failed migration is always fatal.
async fn open_storage(cfg: &StorageConfig) -> anyhow::Result<Storage> {
    if cfg.backend == StorageBackend::Memory {
        tracing::info!("Using in-memory storage");
        return Ok(Storage::memory());
    }

    let url = mask_password(&cfg.postgres.connection_url());
    let pool = match create_pool(&cfg.postgres).await {
        Ok(pool) => pool,
        Err(e) if cfg.fallback_to_memory => {
            tracing::warn!(
                error = %e,
                url = %url,
                "PostgreSQL unavailable. Falling back to in-memory storage; data will not survive a restart."
            );
            return Ok(Storage::memory());
        }
        Err(e) => return Err(anyhow::anyhow!("failed to connect to {url}: {e}")),
    };

    if cfg.postgres.run_migrations {
        migrations::run(&pool).await?;
    }

    tracing::info!(url = %url, "Using PostgreSQL storage");
    Ok(Storage::postgres(PostgresStorage::from_pool(pool)))
}

pub struct TaskhubServer {
    addr: SocketAddr,
    app: Router,
    shutdown_timeout: Duration,
    postgres: Option<PostgresStorage>,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<TaskhubServer> {
        let storage = open_storage(&self.config.storage).await?;
        let cache = create_cache_backend(&self.config.cache, &self.config.redis).await;
        tracing::info!(cache.mode = cache.mode(), "Cache backend ready");

        let state = AppState::new(&self.config, storage.accounts, storage.tasks, cache)?;
        let app = build_app(state, &self.config);

        Ok(TaskhubServer {
            addr: self.addr,
            app,
            shutdown_timeout: self.config.shutdown_timeout(),
            postgres: storage.postgres,
        })
    }
}

impl TaskhubServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on `listener` until `shutdown` completes.
    ///
    /// In-flight requests get `shutdown_timeout` to finish. The database pool
    /// is closed afterwards in either case.
    pub async fn serve<F>(self, listener: tokio::net::TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stopping_tx, mut stopping_rx) = tokio::sync::watch::channel(false);
        let signal = async move {
            shutdown.await;
            let _ = stopping_tx.send(true);
        };

        let server = axum::serve(listener, self.app)
            .with_graceful_shutdown(signal)
            .into_future();
        tokio::pin!(server);

        let drain_limit = self.shutdown_timeout;
        let result = tokio::select! {
            res = &mut server => res.map_err(anyhow::Error::from),
            _ = async {
                let _ = stopping_rx.wait_for(|stopping| *stopping).await;
                tracing::info!(timeout_secs = drain_limit.as_secs(), "draining in-flight requests");
                tokio::time::sleep(drain_limit).await;
            } => {
                tracing::warn!("drain timeout elapsed, dropping remaining requests");
                Ok(())
            }
        };

        if let Some(pg) = self.postgres {
            pg.close().await;
        }
        tracing::info!("server stopped");
        result
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("shutdown signal received");
}
