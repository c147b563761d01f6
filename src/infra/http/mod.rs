pub mod api;
pub mod middleware;

pub use api::{ApiState, build_api_router};
pub use middleware::{
    QUERY_COUNT_HEADER, REQUEST_ID_HEADER, RESPONSE_TIME_HEADER, RequestContext,
};

use std::{io, sync::Arc, time::Duration};

use axum::{Json, Router, middleware as axum_middleware, routing::get};
use quillpost_api_types::HealthResponse;
use tokio::{net::TcpListener, sync::Notify};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Full application router.
///
/// Layers, outermost first: CORS, instrumentation, response logging. The
/// instrumentation layer sits outside every handler and error conversion,
/// so its headers land on every response.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([RESPONSE_TIME_HEADER, QUERY_COUNT_HEADER, REQUEST_ID_HEADER]);

    Router::new()
        .route("/health", get(health))
        .merge(build_api_router(state))
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::instrument_request))
        .layer(cors)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Serve `router` until `signal` fires, then let in-flight requests finish
/// for at most `grace` before returning.
pub async fn serve<S>(
    listener: TcpListener,
    router: Router,
    signal: S,
    grace: Duration,
) -> io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let signalled = Arc::new(Notify::new());
    let notify = signalled.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            signal.await;
            notify.notify_one();
        })
        .into_future();

    let deadline = async {
        signalled.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result,
        _ = deadline => {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "requests still in flight after the shutdown grace period; closing"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::{io::AsyncWriteExt, net::TcpStream, sync::oneshot};

    use super::*;

    #[tokio::test]
    async fn shutdown_does_not_wait_past_the_grace_period() {
        let (entered_tx, entered_rx) = oneshot::channel::<()>();
        let entered = Arc::new(Mutex::new(Some(entered_tx)));
        let router = Router::new().route(
            "/stuck",
            get(move || {
                let entered = entered.clone();
                async move {
                    let tx = entered.lock().expect("lock").take();
                    if let Some(tx) = tx {
                        let _ = tx.send(());
                    }
                    std::future::pending::<()>().await;
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(serve(
            listener,
            router,
            async move {
                let _ = entered_rx.await;
            },
            Duration::from_millis(100),
        ));

        let mut client = TcpStream::connect(addr).await.expect("connect");
        client
            .write_all(b"GET /stuck HTTP/1.1\r\nhost: localhost\r\n\r\n")
            .await
            .expect("send request");

        let outcome = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(matches!(outcome, Ok(Ok(Ok(())))), "server did not stop: {outcome:?}");
        drop(client);
    }

    #[tokio::test]
    async fn health_reports_crate_version() {
        let Json(body) = health().await;
        assert_eq!(body.status, "healthy");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
