use crate::config::ServerConfig;
use crate::network::idle::IdleTimeout;
use crate::network::{Record, Status};
use crate::{KvStoreError, KvsEngine};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

/// Represents a database server instance, wrapping a datastore, serving its
/// operations over HTTP.
#[derive(Clone)]
pub struct Server<E>
where
    E: KvsEngine,
{
    db: E,
    config: ServerConfig,
}

impl<E> Server<E>
where
    E: KvsEngine,
{
    /// Construct a new server around the given engine.
    pub fn new(db: E, config: ServerConfig) -> Server<E> {
        Server { db, config }
    }

    /// Build the HTTP routes of the service.
    ///
    /// | Method | Path       | Engine call   | Success |
    /// |--------|------------|---------------|---------|
    /// | PUT    | `/v1/{key}`| `set`         | 201     |
    /// | GET    | `/v1/{key}`| `get`         | 200     |
    /// | DELETE | `/v1/{key}`| `remove`      | 200     |
    /// | PUT    | `/v1/`     | `bulk_set`    | 201     |
    /// | GET    | `/v1/`     | `bulk_get`    | 200     |
    /// | DELETE | `/v1/`     | `bulk_remove` | 200     |
    /// | GET    | `/status`  | none          | 200     |
    /// | GET    | `/metrics` | `metrics`     | 200     |
    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/v1/",
                get(bulk_get_keys::<E>)
                    .put(bulk_set_keys::<E>)
                    .delete(bulk_delete_keys::<E>)
                    .layer(DefaultBodyLimit::max(self.config.body_limit)),
            )
            .route(
                "/v1/:key",
                get(get_key::<E>)
                    .put(set_key::<E>)
                    .delete(delete_key::<E>)
                    .layer(DefaultBodyLimit::disable()),
            )
            .route("/status", get(status))
            .route("/metrics", get(metrics::<E>))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn(log_request))
                    .layer(TimeoutLayer::new(self.config.request_timeout)),
            )
            .with_state(self.db.clone())
    }

    /// Serve requests from `listener` until `shutdown` resolves. In-flight
    /// requests then get `shutdown_timeout` to finish before they are cut off.
    ///
    /// Connections that stay silent for `idle_timeout` are closed.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let idle_timeout = self.config.idle_timeout;
        let grace = self.config.shutdown_timeout;

        let (drain_tx, drain_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => continue,
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        // Usually fd exhaustion; back off instead of spinning.
                        warn!("failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                },
            };

            let service = TowerToHyperService::new(router.clone());
            let mut drain = drain_rx.clone();

            connections.spawn(async move {
                let io = TokioIo::new(IdleTimeout::new(stream, idle_timeout));
                let conn = http1::Builder::new().serve_connection(io, service);
                tokio::pin!(conn);

                let res = tokio::select! {
                    res = conn.as_mut() => res,
                    _ = drain.changed() => {
                        conn.as_mut().graceful_shutdown();
                        conn.await
                    }
                };

                if let Err(e) = res {
                    debug!("connection from {} closed: {}", peer, e);
                }
            });
        }

        drop(listener);
        info!("Shutting down, waiting up to {:?} for in-flight requests.", grace);
        let _ = drain_tx.send(true);

        let drained = tokio::time::timeout(grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!("In-flight requests did not finish within {:?}.", grace);
            connections.abort_all();
        }
    }

    /// Listen on the configured address until SIGINT or SIGTERM.
    ///
    /// Blocks the calling thread on a runtime with `threads` workers.
    pub fn listen(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.threads.max(1))
            .enable_all()
            .build()
            .map_err(|c| ServerError::RuntimeFailure { c })?;

        runtime.block_on(async move {
            let addr = self.config.addr.clone();
            let listener = TcpListener::bind(&addr)
                .await
                .map_err(|c| ServerError::BindFailure {
                    c,
                    addr: addr.clone(),
                })?;
            info!("Listening on '{}'.", addr);

            self.serve(listener, shutdown_signal()).await;
            info!("Server stopped.");

            Ok::<(), ServerError>(())
        })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let resp = next.run(req).await;

    info!("{} {} -> {}", method, path, resp.status());
    resp
}

async fn get_key<E: KvsEngine>(
    State(db): State<E>,
    Path(key): Path<String>,
) -> std::result::Result<String, ApiError> {
    db.get(&key).map_err(ApiError::read)
}

async fn set_key<E: KvsEngine>(
    State(db): State<E>,
    Path(key): Path<String>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<StatusCode, ApiError> {
    let body = body.map_err(|e| ApiError::bad_request(e.to_string()))?;
    let value = String::from_utf8(body.to_vec())
        .map_err(|_| ApiError::bad_request("value is not valid UTF-8"))?;

    db.set(key, value).map_err(ApiError::write)?;

    Ok(StatusCode::CREATED)
}

async fn delete_key<E: KvsEngine>(
    State(db): State<E>,
    Path(key): Path<String>,
) -> std::result::Result<String, ApiError> {
    db.remove(&key).map_err(ApiError::read)
}

async fn bulk_set_keys<E: KvsEngine>(
    State(db): State<E>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<StatusCode, ApiError> {
    let records: Vec<Record> = parse_json(body)?;

    db.bulk_set(records).map_err(ApiError::write)?;

    Ok(StatusCode::CREATED)
}

async fn bulk_get_keys<E: KvsEngine>(
    State(db): State<E>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<Json<Vec<Record>>, ApiError> {
    let keys: Vec<String> = parse_json(body)?;

    db.bulk_get(&keys).map(Json).map_err(ApiError::read)
}

async fn bulk_delete_keys<E: KvsEngine>(
    State(db): State<E>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<StatusCode, ApiError> {
    let keys: Vec<String> = parse_json(body)?;

    db.bulk_remove(&keys).map_err(ApiError::read)?;

    Ok(StatusCode::OK)
}

async fn status() -> Json<Status> {
    Json(Status::now())
}

async fn metrics<E: KvsEngine>(
    State(db): State<E>,
) -> std::result::Result<Json<crate::Metrics>, ApiError> {
    db.metrics().map(Json).map_err(ApiError::read)
}

/// Decode a bulk request body. A missing, truncated, oversized or
/// malformed body is the client's fault.
fn parse_json<T: DeserializeOwned>(
    body: std::result::Result<Bytes, BytesRejection>,
) -> std::result::Result<T, ApiError> {
    let body = body.map_err(|e| ApiError::bad_request(e.to_string()))?;

    serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("malformed JSON body: {}", e)))
}

/// Plain text error reply.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Map a store failure of a read or delete.
    fn read(err: KvStoreError) -> ApiError {
        let status = match &err {
            KvStoreError::EmptyKey | KvStoreError::KeyNotFound => StatusCode::NOT_FOUND,
            KvStoreError::PoisonedLock => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }

    /// Map a store failure of a write.
    fn write(err: KvStoreError) -> ApiError {
        let status = match &err {
            KvStoreError::EmptyKey => StatusCode::BAD_REQUEST,
            KvStoreError::KeyNotFound => StatusCode::NOT_FOUND,
            KvStoreError::PoisonedLock => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }

    fn bad_request<M: Into<String>>(message: M) -> ApiError {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("request failed: {}", self.message);
        }

        (self.status, self.message).into_response()
    }
}

type Result<T> = std::result::Result<T, ServerError>;

/// Error type for the kvd server.
#[derive(Debug, Fail)]
pub enum ServerError {
    /// Failure when starting the async runtime.
    #[fail(display = "failed to start runtime")]
    RuntimeFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
    },

    /// Failure when binding the listen address.
    #[fail(display = "failed to bind {}", addr)]
    BindFailure {
        /// Underlying io Error.
        #[cause]
        c: std::io::Error,
        /// Address that could not be bound.
        addr: String,
    },
}
