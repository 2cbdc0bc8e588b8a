//! Test server wrapper that starts Atelier on a random port

use std::net::SocketAddr;
use std::time::Duration;

use atelier_config::Config;
use atelier_server::Server;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(&config)?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `POST /api/gallery/sync`, returning the `status` field
    pub async fn trigger_sync(&self) -> String {
        let body: Value = self
            .client
            .post(self.url("/api/gallery/sync"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        body["status"].as_str().unwrap().to_owned()
    }

    /// `GET /api/gallery/sync/status`
    pub async fn sync_status(&self) -> Value {
        self.client
            .get(self.url("/api/gallery/sync/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Poll the status endpoint until no run is in progress
    pub async fn wait_for_idle(&self) -> Value {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);

        loop {
            let status = self.sync_status().await;
            if status["is_syncing"] == false {
                return status;
            }
            assert!(tokio::time::Instant::now() < deadline, "sync did not finish: {status}");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Trigger a run and wait for its final status
    pub async fn sync(&self) -> Value {
        assert_eq!(self.trigger_sync().await, "started");
        self.wait_for_idle().await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
