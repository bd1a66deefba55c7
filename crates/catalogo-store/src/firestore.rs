//! ---
//! cat_section: "02-storage"
//! cat_subsection: "module"
//! cat_type: "source"
//! cat_scope: "code"
//! cat_description: "Document store abstractions and backend bindings."
//! cat_version: "v0.0.0-prealpha"
//! cat_owner: "tbd"
//! ---
//! Firestore REST (v1) backend.
//!
//! Documents live in a single top-level collection. Field values use the
//! Firestore typed-value JSON encoding (`stringValue`, `integerValue`, ...).
//! Batches map onto `documents:commit`, which Firestore applies atomically;
//! every write carries a `currentDocument.exists` precondition so a batch
//! touching a vanished document fails as a whole.
//!
//! Requests authenticate with a static bearer token when one is configured,
//! otherwise with access tokens minted from a service-account key.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use catalogo_common::config::FirestoreConfig;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::credentials::{ServiceAccountKey, ServiceAccountTokens};
use crate::record::{NewProject, ProjectPatch, ProjectRecord, WriteBatch, WriteOp};
use crate::{DocumentStore, Result, StoreError};

const PAGE_SIZE: &str = "300";
const MAX_DOCUMENT_ID_BYTES: usize = 1500;

/// Store backed by the Firestore REST API (or its emulator).
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    base_url: Url,
    project_id: String,
    database: String,
    collection: String,
    auth: Authorization,
}

#[derive(Debug, Clone)]
enum Authorization {
    Anonymous,
    Bearer(String),
    ServiceAccount(Arc<ServiceAccountTokens>),
}

impl fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field(
                "auth",
                &match self.auth {
                    Authorization::Anonymous => "anonymous",
                    Authorization::Bearer(_) => "bearer",
                    Authorization::ServiceAccount(_) => "service-account",
                },
            )
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl FirestoreStore {
    /// Build a client from configuration.
    pub fn from_config(config: &FirestoreConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| StoreError::Config(format!("base_url {}: {err}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "base_url {} cannot carry a path",
                config.base_url
            )));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        let auth = match (&config.token, service_account_key(config)?) {
            (Some(token), _) => Authorization::Bearer(token.clone()),
            (None, Some(key)) => Authorization::ServiceAccount(Arc::new(
                ServiceAccountTokens::new(client.clone(), key)?,
            )),
            (None, None) => Authorization::Anonymous,
        };

        let mut project_id = config.project_id.trim().to_owned();
        if project_id.is_empty() {
            if let Authorization::ServiceAccount(tokens) = &auth {
                project_id = tokens.project_id().unwrap_or_default().to_owned();
            }
        }
        if project_id.is_empty() {
            return Err(StoreError::Config(
                "project_id is neither configured nor present in the service account key".into(),
            ));
        }

        Ok(Self {
            client,
            base_url,
            project_id,
            database: config.database.clone(),
            collection: config.collection.clone(),
            auth,
        })
    }

    /// Resource name of the database documents root.
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    /// Fully qualified resource name of a project document.
    fn document_name(&self, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), self.collection, id)
    }

    /// REST URL below `v1/projects/{p}/databases/{d}/`, ending in `tail`.
    fn url(&self, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    "v1",
                    "projects",
                    self.project_id.as_str(),
                    "databases",
                    self.database.as_str(),
                ])
                .extend(tail);
        }
        url
    }

    fn collection_url(&self) -> Url {
        self.url(&["documents", self.collection.as_str()])
    }

    fn document_url(&self, id: &str) -> Url {
        self.url(&["documents", self.collection.as_str(), id])
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match &self.auth {
            Authorization::Anonymous => request,
            Authorization::Bearer(token) => request.bearer_auth(token),
            Authorization::ServiceAccount(tokens) => {
                request.bearer_auth(tokens.access_token().await?)
            }
        })
    }

    /// Send `request`, turning any non-success status into [`StoreError::Remote`].
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).await?.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.rejection(response).await)
    }

    async fn rejection(&self, response: Response) -> StoreError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // A revoked or clock-skewed token; mint a new one next time.
            if let Authorization::ServiceAccount(tokens) = &self.auth {
                tokens.invalidate().await;
            }
        }
        let body = response.text().await.unwrap_or_default();
        let message = remote_error_message(&body);
        warn!(status = status.as_u16(), %message, "firestore request rejected");
        StoreError::Remote {
            status: status.as_u16(),
            message,
        }
    }
}

fn service_account_key(config: &FirestoreConfig) -> Result<Option<ServiceAccountKey>> {
    if let Some(raw) = &config.service_account {
        return ServiceAccountKey::from_json(raw).map(Some);
    }
    config
        .credentials_file
        .as_deref()
        .map(ServiceAccountKey::from_file)
        .transpose()
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn backend(&self) -> &'static str {
        "firestore"
    }

    async fn list(&self) -> Result<Vec<ProjectRecord>> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .client
                .get(self.collection_url())
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let page: ListDocumentsResponse = self.send(request).await?.json().await?;
            for document in page.documents {
                records.push(decode_document(document)?);
            }
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        debug!(count = records.len(), "firestore collection listed");
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<ProjectRecord>> {
        if !is_valid_document_id(id) {
            return Ok(None);
        }
        let request = self.authorize(self.client.get(self.document_url(id))).await?;
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.rejection(response).await);
        }
        let document: FirestoreDocument = response.json().await?;
        decode_document(document).map(Some)
    }

    async fn count(&self) -> Result<usize> {
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": { "from": [{ "collectionId": self.collection }] },
                "aggregations": [{ "alias": "total", "count": {} }]
            }
        });
        let request = self
            .client
            .post(self.url(&["documents:runAggregationQuery"]))
            .json(&body);
        let rows: Vec<Value> = self.send(request).await?.json().await?;
        decode_count(&rows)
    }

    async fn insert(&self, project: NewProject) -> Result<ProjectRecord> {
        let body = json!({ "fields": encode_new_project(&project) });
        let request = self.client.post(self.collection_url()).json(&body);
        let document: FirestoreDocument = self.send(request).await?.json().await?;
        decode_document(document)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        for write in batch.writes() {
            if !is_valid_document_id(write.id()) {
                return Err(StoreError::Missing(write.id().to_owned()));
            }
        }
        let writes = batch.len();
        let body = self.commit_body(&batch);
        let request = self.client.post(self.url(&["documents:commit"])).json(&body);
        match self.send(request).await {
            Ok(_) => {
                debug!(writes, "firestore batch committed");
                Ok(())
            }
            Err(StoreError::Remote { status, message })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Err(StoreError::Missing(self.missing_document_id(&message)))
            }
            Err(err) => Err(err),
        }
    }
}

impl FirestoreStore {
    /// Identifier of the document named in a failed-precondition message such
    /// as `No document to update: projects/p/databases/d/documents/projects/ID`.
    /// Falls back to the whole message.
    fn missing_document_id(&self, message: &str) -> String {
        let prefix = format!("documents/{}/", self.collection);
        message
            .rsplit_once(prefix.as_str())
            .map(|(_, tail)| tail.trim_end_matches(|c: char| c == '"' || c == '.'))
            .filter(|id| is_valid_document_id(id))
            .unwrap_or(message)
            .to_owned()
    }

    fn commit_body(&self, batch: &WriteBatch) -> Value {
        let writes: Vec<Value> = batch
            .writes()
            .iter()
            .map(|write| match write {
                WriteOp::Update { id, patch } => json!({
                    "update": {
                        "name": self.document_name(id),
                        "fields": encode_patch(patch),
                    },
                    "updateMask": { "fieldPaths": patch.field_paths() },
                    "currentDocument": { "exists": true },
                }),
                WriteOp::Delete { id } => json!({
                    "delete": self.document_name(id),
                    "currentDocument": { "exists": true },
                }),
            })
            .collect();
        json!({ "writes": writes })
    }
}

fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_DOCUMENT_ID_BYTES
        && id != "."
        && id != ".."
        && !id.contains('/')
        && !(id.starts_with("__") && id.ends_with("__"))
}

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn integer_value(value: i64) -> Value {
    json!({ "integerValue": value.to_string() })
}

fn encode_new_project(project: &NewProject) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("nombre".into(), string_value(&project.nombre));
    fields.insert("codigo".into(), string_value(&project.codigo));
    fields.insert("descripcion".into(), string_value(&project.descripcion));
    fields.insert("orden".into(), integer_value(project.orden));
    fields
}

fn encode_patch(patch: &ProjectPatch) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(nombre) = &patch.nombre {
        fields.insert("nombre".into(), string_value(nombre));
    }
    if let Some(codigo) = &patch.codigo {
        fields.insert("codigo".into(), string_value(codigo));
    }
    if let Some(descripcion) = &patch.descripcion {
        fields.insert("descripcion".into(), string_value(descripcion));
    }
    if let Some(orden) = patch.orden {
        fields.insert("orden".into(), integer_value(orden));
    }
    fields
}

fn decode_document(document: FirestoreDocument) -> Result<ProjectRecord> {
    let id = document
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::Malformed(format!("document name '{}'", document.name)))?
        .to_owned();
    let fields = &document.fields;
    Ok(ProjectRecord {
        nombre: decode_string(fields, "nombre").unwrap_or_default(),
        codigo: decode_string(fields, "codigo").unwrap_or_default(),
        descripcion: decode_string(fields, "descripcion").unwrap_or_default(),
        orden: decode_integer(fields, "orden"),
        id,
    })
}

fn decode_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let value = fields.get(key)?;
    if let Some(text) = value.get("stringValue").and_then(Value::as_str) {
        return Some(text.to_owned());
    }
    // Legacy documents occasionally store codes as numbers.
    decode_number(value).map(|number| number.to_string())
}

/// Integers arrive as decimal strings; JS clients may also write doubles.
fn decode_integer(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    fields.get(key).and_then(decode_number)
}

fn decode_number(value: &Value) -> Option<i64> {
    if let Some(raw) = value.get("integerValue") {
        return match raw {
            Value::String(text) => text.parse().ok(),
            other => other.as_i64(),
        };
    }
    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .filter(|number| number.is_finite() && number.fract() == 0.0)
        .map(|number| number as i64)
}

fn decode_count(rows: &[Value]) -> Result<usize> {
    rows.iter()
        .find_map(|row| row.pointer("/result/aggregateFields/total"))
        .and_then(decode_number)
        .and_then(|total| usize::try_from(total).ok())
        .ok_or_else(|| StoreError::Malformed("aggregation response without a total".into()))
}

fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store() -> FirestoreStore {
        FirestoreStore::from_config(&FirestoreConfig {
            project_id: "demo".into(),
            database: "(default)".into(),
            collection: "projects".into(),
            base_url: "http://localhost:8081".into(),
            token: Some("owner".into()),
            credentials_file: None,
            service_account: None,
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn urls_follow_rest_layout() {
        let store = store();
        assert_eq!(
            store.collection_url().as_str(),
            "http://localhost:8081/v1/projects/demo/databases/(default)/documents/projects"
        );
        assert_eq!(
            store.url(&["documents:commit"]).as_str(),
            "http://localhost:8081/v1/projects/demo/databases/(default)/documents:commit"
        );
        assert_eq!(
            store.document_url("a b?c").as_str(),
            "http://localhost:8081/v1/projects/demo/databases/(default)/documents/projects/a%20b%3Fc"
        );
    }

    #[test]
    fn decodes_typed_fields() {
        let document: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/demo/databases/(default)/documents/projects/xyz",
            "fields": {
                "nombre": { "stringValue": "Alpha" },
                "codigo": { "integerValue": "101" },
                "orden": { "doubleValue": 3.0 }
            },
            "createTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let record = decode_document(document).unwrap();
        assert_eq!(record.id, "xyz");
        assert_eq!(record.nombre, "Alpha");
        assert_eq!(record.codigo, "101");
        assert_eq!(record.descripcion, "");
        assert_eq!(record.orden, Some(3));
    }

    #[test]
    fn missing_orden_decodes_as_none() {
        let document: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/demo/databases/(default)/documents/projects/old",
            "fields": { "nombre": { "stringValue": "Legacy" } }
        }))
        .unwrap();
        assert_eq!(decode_document(document).unwrap().orden, None);
    }

    #[test]
    fn commit_body_uses_masks_and_preconditions() {
        let store = store();
        let mut batch = WriteBatch::new();
        batch
            .update(
                "a",
                ProjectPatch {
                    nombre: Some("Alpha".into()),
                    orden: Some(2),
                    ..ProjectPatch::default()
                },
            )
            .delete("b");
        let body = store.commit_body(&batch);
        let writes = body["writes"].as_array().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(
            writes[0]["update"]["name"],
            "projects/demo/databases/(default)/documents/projects/a"
        );
        assert_eq!(writes[0]["update"]["fields"]["orden"]["integerValue"], "2");
        assert_eq!(writes[0]["updateMask"]["fieldPaths"], json!(["nombre", "orden"]));
        assert_eq!(writes[0]["currentDocument"]["exists"], true);
        assert_eq!(
            writes[1]["delete"],
            "projects/demo/databases/(default)/documents/projects/b"
        );
    }

    #[test]
    fn aggregation_total_is_extracted() {
        let rows = vec![json!({
            "result": { "aggregateFields": { "total": { "integerValue": "7" } } },
            "readTime": "2024-01-01T00:00:00Z"
        })];
        assert_eq!(decode_count(&rows).unwrap(), 7);
        assert!(decode_count(&[]).is_err());
    }

    #[test]
    fn rejects_path_like_identifiers() {
        assert!(is_valid_document_id("abc123"));
        assert!(!is_valid_document_id(""));
        assert!(!is_valid_document_id(".."));
        assert!(!is_valid_document_id("other/doc"));
        assert!(!is_valid_document_id("__name__"));
    }

    #[test]
    fn remote_error_prefers_structured_message() {
        let body = r#"{"error":{"code":404,"message":"No document to update","status":"NOT_FOUND"}}"#;
        assert_eq!(remote_error_message(body), "No document to update");
        assert_eq!(remote_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn missing_document_id_is_read_from_the_message() {
        let store = store();
        let message =
            "No document to update: projects/demo/databases/(default)/documents/projects/gone";
        assert_eq!(store.missing_document_id(message), "gone");
        assert_eq!(store.missing_document_id("precondition failed"), "precondition failed");
    }

    mod remote {
        use super::*;
        use wiremock::matchers::{body_partial_json, header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const ROOT: &str = "/v1/projects/demo/databases/(default)/documents";

        fn config(server: &MockServer) -> FirestoreConfig {
            FirestoreConfig {
                project_id: "demo".into(),
                database: "(default)".into(),
                collection: "projects".into(),
                base_url: server.uri(),
                token: Some("owner".into()),
                credentials_file: None,
                service_account: None,
                timeout: Duration::from_secs(2),
            }
        }

        fn store_for(server: &MockServer) -> FirestoreStore {
            FirestoreStore::from_config(&config(server)).unwrap()
        }

        fn document(id: &str, orden: i64) -> Value {
            json!({
                "name": format!("projects/demo/databases/(default)/documents/projects/{id}"),
                "fields": {
                    "nombre": { "stringValue": id.to_uppercase() },
                    "codigo": { "stringValue": format!("C-{id}") },
                    "orden": { "integerValue": orden.to_string() }
                }
            })
        }

        fn failure(code: u16, message: &str) -> ResponseTemplate {
            ResponseTemplate::new(code).set_body_json(json!({
                "error": { "code": code, "message": message }
            }))
        }

        #[tokio::test]
        async fn list_follows_page_tokens() {
            let server = MockServer::start().await;
            let collection = format!("{ROOT}/projects");
            Mock::given(method("GET"))
                .and(path(collection.as_str()))
                .and(query_param("pageToken", "p2"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({ "documents": [document("b", 2)] })),
                )
                .with_priority(1)
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path(collection.as_str()))
                .and(query_param("pageSize", PAGE_SIZE))
                .and(header("authorization", "Bearer owner"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "documents": [document("a", 1)],
                    "nextPageToken": "p2"
                })))
                .expect(1)
                .mount(&server)
                .await;

            let records = store_for(&server).list().await.unwrap();
            let ids: Vec<_> = records.iter().map(|r| (r.id.as_str(), r.orden)).collect();
            assert_eq!(ids, vec![("a", Some(1)), ("b", Some(2))]);
        }

        #[tokio::test]
        async fn get_maps_not_found_to_none() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(format!("{ROOT}/projects/a")))
                .respond_with(ResponseTemplate::new(200).set_body_json(document("a", 4)))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path(format!("{ROOT}/projects/gone")))
                .respond_with(failure(404, "Document not found"))
                .mount(&server)
                .await;

            let store = store_for(&server);
            let found = store.get("a").await.unwrap().unwrap();
            assert_eq!((found.nombre.as_str(), found.orden), ("A", Some(4)));
            assert!(store.get("gone").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn server_errors_surface_as_remote() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(failure(500, "backend unavailable"))
                .mount(&server)
                .await;

            let store = store_for(&server);
            let err = store.list().await.unwrap_err();
            assert!(matches!(
                err,
                StoreError::Remote { status: 500, ref message } if message == "backend unavailable"
            ));
            assert!(matches!(
                store.get("a").await,
                Err(StoreError::Remote { status: 500, .. })
            ));
        }

        #[tokio::test]
        async fn commit_of_vanished_document_is_missing() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(format!("{ROOT}:commit")))
                .and(body_partial_json(json!({
                    "writes": [{ "currentDocument": { "exists": true } }]
                })))
                .respond_with(failure(
                    404,
                    "No document to update: projects/demo/databases/(default)/documents/projects/gone",
                ))
                .expect(1)
                .mount(&server)
                .await;

            let mut batch = WriteBatch::new();
            batch.delete("gone");
            let err = store_for(&server).commit(batch).await.unwrap_err();
            assert!(matches!(err, StoreError::Missing(ref id) if id == "gone"));
        }

        #[tokio::test]
        async fn count_runs_an_aggregation_query() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(format!("{ROOT}:runAggregationQuery")))
                .and(body_partial_json(json!({
                    "structuredAggregationQuery": {
                        "structuredQuery": { "from": [{ "collectionId": "projects" }] }
                    }
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                    "result": { "aggregateFields": { "total": { "integerValue": "12" } } },
                    "readTime": "2024-01-01T00:00:00Z"
                }])))
                .expect(1)
                .mount(&server)
                .await;

            assert_eq!(store_for(&server).count().await.unwrap(), 12);
        }

        #[tokio::test]
        async fn service_account_tokens_authorize_and_renew_after_401() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/token"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": "ya29.sa",
                    "expires_in": 3600
                })))
                .expect(2)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path(format!("{ROOT}/projects/a")))
                .respond_with(failure(401, "Request had invalid authentication credentials"))
                .up_to_n_times(1)
                .with_priority(1)
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path(format!("{ROOT}/projects/a")))
                .and(header("authorization", "Bearer ya29.sa"))
                .respond_with(ResponseTemplate::new(200).set_body_json(document("a", 1)))
                .mount(&server)
                .await;

            let mut config = config(&server);
            config.project_id = String::new();
            config.token = None;
            config.service_account = Some(crate::credentials::test_key_json(&format!(
                "{}/token",
                server.uri()
            )));
            let store = FirestoreStore::from_config(&config).unwrap();
            assert_eq!(store.project_id, "demo");

            assert!(matches!(
                store.get("a").await,
                Err(StoreError::Remote { status: 401, .. })
            ));
            assert_eq!(store.get("a").await.unwrap().unwrap().id, "a");
        }

        #[test]
        fn project_id_is_required_without_a_key() {
            let config = FirestoreConfig {
                project_id: String::new(),
                token: None,
                ..FirestoreConfig::default()
            };
            assert!(matches!(
                FirestoreStore::from_config(&config),
                Err(StoreError::Config(_))
            ));
        }
    }
}
