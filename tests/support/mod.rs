//! ---
//! cat_section: "15-testing-qa-runbook"
//! cat_subsection: "integration-tests"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Integration and validation tests for the Catalogo stack."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
#![allow(dead_code)]

use std::sync::Arc;

use catalogo_api::{spawn_api_server, ApiServer, ApiState};
use catalogo_common::config::AppConfig;
use catalogo_security::hash_password;
use catalogo_store::MemoryStore;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Response};
use serde_json::{json, Value};

pub const PASSWORD: &str = "correct horse battery staple";

/// A running server over a memory store, plus a client that carries the
/// session cookie by hand.
pub struct Harness {
    pub server: ApiServer,
    pub store: MemoryStore,
    pub client: Client,
    pub base: String,
    pub cookie: Option<String>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    pub async fn with_store(store: MemoryStore) -> Self {
        let mut config = AppConfig::default();
        config.auth.admin_password_hash = hash_password(PASSWORD).unwrap();
        config.session.secret = Some("integration-session-secret".into());

        let state = ApiState::from_config(&config, Arc::new(store.clone())).unwrap();
        let server =
            spawn_api_server(Arc::new(state), "127.0.0.1:0".parse().unwrap(), None).unwrap();
        let base = format!("http://{}", server.addr());
        Self {
            server,
            store,
            client: Client::new(),
            base,
            cookie: None,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    /// Log in and remember the returned cookie.
    pub async fn login(&mut self, password: &str) -> Response {
        let response = self
            .request(reqwest::Method::POST, "/api/login")
            .json(&json!({ "password": password }))
            .send()
            .await
            .unwrap();
        if let Some(cookie) = session_cookie(&response) {
            self.cookie = Some(cookie);
        }
        response
    }

    pub async fn is_admin(&self) -> bool {
        let body: Value = self
            .request(reqwest::Method::GET, "/api/session")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["isAdmin"].as_bool().unwrap()
    }

    pub async fn projects(&self) -> Vec<Value> {
        let response = self
            .request(reqwest::Method::GET, "/api/projects")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    pub async fn create(&self, nombre: &str, codigo: &str) -> Response {
        self.request(reqwest::Method::POST, "/api/projects")
            .json(&json!({ "nombre": nombre, "codigo": codigo }))
            .send()
            .await
            .unwrap()
    }

    pub async fn shutdown(self) {
        self.server.shutdown().await.unwrap();
    }
}

/// `name=value` pair from the response's `Set-Cookie` header.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(str::to_owned)
}

pub fn names(projects: &[Value]) -> Vec<&str> {
    projects
        .iter()
        .map(|project| project["nombre"].as_str().unwrap())
        .collect()
}
