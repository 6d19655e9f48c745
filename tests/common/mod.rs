#![allow(dead_code)]

use std::collections::HashSet;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use smartblog::config::Config;
use smartblog::data_formats::Upload;
use smartblog::services::{ImageHost, Mailer};
use smartblog::state::AppContext;
use smartblog::{make_app, run_migrations, serve};
use sqlx::sqlite::SqlitePoolOptions;

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records every send; addresses in `failing` get an error instead.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
    pub attempts: Mutex<Vec<String>>,
    pub failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn fail_for(&self, email: &str) {
        self.failing.lock().unwrap().insert(email.to_string());
    }

    pub fn sent_to(&self, email: &str) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|mail| mail.to == email)
            .cloned()
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> anyhow::Result<()> {
        self.attempts.lock().unwrap().push(to.to_string());
        if self.failing.lock().unwrap().contains(to) {
            return Err(anyhow!("mailbox {to} unavailable"));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

/// Hands out predictable hosted URLs. Deletions can be made to fail.
#[derive(Default)]
pub struct FakeImageHost {
    pub uploads: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: bool,
}

impl FakeImageHost {
    pub fn failing_deletes() -> Self {
        FakeImageHost {
            fail_deletes: true,
            ..FakeImageHost::default()
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, _image: Upload) -> anyhow::Result<String> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "https://res.cloudinary.com/demo/image/upload/v100/blog/image{n}.png"
        ))
    }

    async fn delete(&self, url: &str) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(url.to_string());
        if self.fail_deletes {
            return Err(anyhow!("image host unavailable"));
        }
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub ctx: Arc<AppContext>,
    pub mailer: Arc<RecordingMailer>,
    pub images: Arc<FakeImageHost>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(FakeImageHost::default()).await
}

pub async fn spawn_app_with(images: FakeImageHost) -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    run_migrations(&pool).await.expect("migrations");

    let config = Config {
        jwt_secret: "integration-test-secret".to_string(),
        ..Config::default()
    };
    let mailer = Arc::new(RecordingMailer::default());
    let images = Arc::new(images);
    let ctx = Arc::new(AppContext::with_collaborators(
        pool,
        config,
        mailer.clone(),
        images.clone(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").expect("free port");
    let address = format!("http://{}", listener.local_addr().unwrap());
    let app = make_app(ctx.clone()).expect("router");
    tokio::spawn(async move {
        let _ = serve(listener, app).await;
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        ctx,
        mailer,
        images,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/users/register"))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "register {email}");
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a post (or a draft when `published` is false) through the JSON form.
    pub async fn create_post(
        &self,
        author: &str,
        title: &str,
        category: &str,
        published: bool,
    ) -> Value {
        let response = self
            .client
            .post(self.url("/api/posts/create"))
            .json(&json!({
                "title": title,
                "content": format!("{title} body"),
                "category": category,
                "authorEmail": author,
                "published": published,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "create {title}");
        response.json().await.unwrap()
    }

    /// Same as `create_post` but as a multipart form carrying an image.
    pub async fn create_post_with_image(
        &self,
        author: &str,
        title: &str,
        published: bool,
    ) -> Value {
        let form = Form::new()
            .text("title", title.to_string())
            .text("content", format!("{title} body"))
            .text("category", "photos")
            .text("authorEmail", author.to_string())
            .text("published", published.to_string())
            .part("image", png_part());
        let response = self
            .client
            .post(self.url("/api/posts/create"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "create {title}");
        response.json().await.unwrap()
    }

    /// Polls until `check` holds; background email delivery is not awaited by handlers.
    pub async fn eventually<F: Fn() -> bool>(&self, check: F) -> bool {
        for _ in 0..50 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        check()
    }
}

pub fn png_part() -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G', 1, 2, 3])
        .file_name("photo.png")
        .mime_str("image/png")
        .unwrap()
}
