use assert_cmd::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

pub struct TestEnv {
    pub server: MockServer,
    pub home_dir: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            home_dir: TempDir::new().unwrap(),
        }
    }

    /// `zavax` with an isolated home so no user config leaks in.
    pub fn zavax(&self) -> Command {
        let mut cmd = Command::cargo_bin("zavax").unwrap();
        let path = self.home_dir.path();
        cmd.env("HOME", path);
        cmd.env("USERPROFILE", path);
        cmd.env_remove("ZAVAX_CONFIG");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// Answer every POST with `replies` in order, repeating the last one.
    pub async fn mock_replies(&self, replies: Vec<serde_json::Value>) {
        let counter = Arc::new(AtomicUsize::new(0));
        Mock::given(method("POST"))
            .respond_with(move |_: &wiremock::Request| {
                let i = counter.fetch_add(1, Ordering::SeqCst);
                let reply = replies.get(i).or(replies.last()).cloned().unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(reply)
            })
            .mount(&self.server)
            .await;
    }

    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.unwrap_or_default().len()
    }
}

pub fn block_reply(height: u64, id: &str, parent: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "timestamp": "1700000000",
            "height": "12",
            "id": id,
            "parentID": parent,
            "data": { "height": height }
        }
    })
}
