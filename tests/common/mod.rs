//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stub_server::lifecycle::{self, Running, Settings};

/// A config file in its own temp dir, so it can be replaced by rename.
pub struct ConfigFile {
    _dir: tempfile::TempDir,
    pub path: PathBuf,
}

impl ConfigFile {
    pub fn new(content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        Self { _dir: dir, path }
    }

    /// Rewrite the file in place.
    pub fn write(&self, content: &str) {
        std::fs::write(&self.path, content).unwrap();
    }

    /// Replace the file the way editors do: write a sibling, rename over.
    #[allow(dead_code)]
    pub fn replace(&self, content: &str) {
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).unwrap();
        std::fs::rename(&tmp, &self.path).unwrap();
    }
}

/// Settings for an ephemeral-port server on `path`.
pub fn settings(path: &Path) -> Settings {
    let mut settings = Settings::new(path, "127.0.0.1:0".parse::<SocketAddr>().unwrap());
    settings.settle_delay = Duration::from_millis(20);
    settings
}

pub async fn start(settings: Settings) -> Running {
    lifecycle::start(settings).await.expect("server failed to start")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// GET `path` and return status and body.
#[allow(dead_code)]
pub async fn get(client: &reqwest::Client, addr: SocketAddr, path: &str) -> (u16, String) {
    let res = client
        .get(format!("http://{addr}{path}"))
        .send()
        .await
        .expect("stub server unreachable");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}

/// Poll `check` until it returns true or the timeout expires.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

/// Config with one route whose every field encodes `version`.
#[allow(dead_code)]
pub fn versioned_config(version: u32) -> String {
    format!(
        r#"
[[routes]]
path = "/version"
method = "GET"
status_code = 200
content_type = "text/v{version}"
response_body = "v{version}"

[[routes]]
path = "/only-in-v{version}"
method = "GET"
response_body = "v{version}"
"#
    )
}
