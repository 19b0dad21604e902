//! Shared helpers: spin up the router on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pg_diag_gateway::catalog::QueryCatalog;
use pg_diag_gateway::db::DatabaseClient;
use pg_diag_gateway::gateway::{build_router, serve, AppState};
use pg_diag_gateway::query::QueryExecutor;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A running gateway. Dropping it shuts the server down.
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server(db: Arc<dyn DatabaseClient>, timeout: Duration) -> TestServer {
    let executor = QueryExecutor::new(db, Arc::new(QueryCatalog::builtin()), timeout);
    let router = build_router(AppState::new(executor));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = serve(listener, router, async {
            let _ = rx.await;
        })
        .await;
    });

    TestServer {
        addr,
        _shutdown: tx,
    }
}
