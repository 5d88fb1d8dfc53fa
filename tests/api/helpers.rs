use std::future::IntoFuture;
use std::path::PathBuf;

use nafez::{
    configuration::get_configuration,
    domain::Subscriber,
    startup::Application,
    store::SubscriberStore,
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub const INDEX_HTML: &str = "<!doctype html><title>Nafez</title><h1>Nafez</h1>";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: SubscriberStore,
    pub api_client: reqwest::Client,
    // Removed (with the store and static files) when the test ends.
    pub workdir: TempDir,
}

impl TestApp {
    pub async fn post_subscribe(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscribe", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_subscribe_raw(
        &self,
        content_type: &str,
        body: impl Into<reqwest::Body>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.api_client
            .post(&format!("{}/subscribe", &self.address))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(&format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn subscribers(&self) -> Vec<Subscriber> {
        self.store
            .load_all()
            .await
            .expect("Failed to read the subscriber store.")
    }

    pub fn subscribers_file(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let workdir = TempDir::new().expect("Failed to create a temporary directory.");
    let static_root = workdir.path().join("public");
    std::fs::create_dir_all(static_root.join("js")).unwrap();
    std::fs::write(static_root.join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(static_root.join("js").join("script.js"), "'use strict';").unwrap();
    std::fs::write(workdir.path().join("secret.txt"), "outside the root").unwrap();

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.storage.subscribers_file = workdir.path().join("data").join("subscribers.json");
        c.static_files.root = static_root;
        c.alpha.origin = "alpha.nafez.test".into();
        c.alpha.base_path = "/alpha".into();
        c
    };
    let store = SubscriberStore::new(&configuration.storage.subscribers_file);

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let port = application.port();
    let address = format!("http://127.0.0.1:{}", port);
    let _ = tokio::spawn(application.run_until_stopped().into_future());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        port,
        store,
        api_client,
        workdir,
    }
}

pub fn assert_is_redirect_to(response: &reqwest::Response, location: &str) {
    assert_eq!(response.status().as_u16(), 302);
    assert_eq!(response.headers().get("Location").unwrap(), location);
}
