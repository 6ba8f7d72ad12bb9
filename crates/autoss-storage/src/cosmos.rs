//! Azure Cosmos DB (SQL API) record store over REST.
//!
//! Master-key auth: each request is signed with HMAC-SHA256 over
//! `verb\nresourceType\nresourceLink\ndate\n\n` using the base64-decoded
//! primary key.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use autoss_types::{CosmosTarget, FrameId};

use crate::error::StoreError;
use crate::store::DocumentStore;

/// REST API version sent with every request.
pub const API_VERSION: &str = "2018-12-31";

/// Upper bound on result pages followed by one query.
const MAX_QUERY_PAGES: usize = 64;

const FIND_QUERY: &str = "SELECT * FROM s WHERE s.video = @video \
     AND s.camera_no = @camera_no AND s.frame_no = @frame_no";

/// Build the URL-encoded master key authorization token.
pub fn master_key_token(
    key: &[u8],
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String, StoreError> {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );

    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).map_err(|e| StoreError::Auth(e.to_string()))?;
    mac.update(payload.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let token = format!("type=master&ver=1.0&sig={}", signature);
    Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
}

/// RFC 1123 date as required by `x-ms-date`.
fn request_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    #[serde(default, rename = "partitionKey")]
    partition_key: Option<PartitionKeyDef>,
}

#[derive(Debug, Deserialize)]
struct PartitionKeyDef {
    #[serde(default)]
    paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default, rename = "Documents")]
    documents: Vec<Value>,
}

/// One Cosmos DB container.
pub struct CosmosStore {
    client: Client,
    endpoint: String,
    database: String,
    container: String,
    key: Vec<u8>,
    /// Partition key path (e.g. "/video"), read once from the container
    partition_key_path: OnceCell<Option<String>>,
}

impl CosmosStore {
    pub fn new(target: CosmosTarget, timeout: Duration) -> Result<Self, StoreError> {
        let key = STANDARD
            .decode(target.primary_key.expose_secret().trim())
            .map_err(|e| StoreError::Auth(format!("primary key is not base64: {}", e)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: target.endpoint.trim_end_matches('/').to_string(),
            database: target.database,
            container: target.container,
            key,
            partition_key_path: OnceCell::new(),
        })
    }

    fn collection_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }

    fn signed(
        &self,
        builder: RequestBuilder,
        verb: &str,
        resource_type: &str,
    ) -> Result<RequestBuilder, StoreError> {
        let date = request_date();
        let token = master_key_token(
            &self.key,
            verb,
            resource_type,
            &self.collection_link(),
            &date,
        )?;
        Ok(builder
            .header(AUTHORIZATION, token)
            .header("x-ms-date", date)
            .header("x-ms-version", API_VERSION))
    }

    async fn partition_key_path(&self) -> Result<Option<&str>, StoreError> {
        let path = self
            .partition_key_path
            .get_or_try_init(|| async {
                let url = format!("{}/{}", self.endpoint, self.collection_link());
                let request = self.signed(self.client.get(url), "get", "colls")?;
                let response = check(request.send().await?).await?;
                let info: CollectionInfo = response.json().await?;
                let path = info
                    .partition_key
                    .and_then(|pk| pk.paths.into_iter().next());
                info!(container = %self.container, partition_key = ?path, "Read container metadata");
                Ok::<_, StoreError>(path)
            })
            .await?;
        Ok(path.as_deref())
    }
}

/// Partition key header value for `document` under `path`.
fn partition_key_header(document: &Value, path: &str) -> String {
    let value = document
        .pointer(path)
        .cloned()
        .unwrap_or_else(|| json!({}));
    json!([value]).to_string()
}

/// Turn non-success responses into errors.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or(body);
    Err(StoreError::Service {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for CosmosStore {
    fn name(&self) -> &str {
        &self.container
    }

    async fn insert(&self, id: &str, document: &Value) -> Result<Value, StoreError> {
        let partition_path = self.partition_key_path().await?;
        let url = format!("{}/{}/docs", self.endpoint, self.collection_link());

        let mut request = self
            .signed(self.client.post(url), "post", "docs")?
            .header(CONTENT_TYPE, "application/json")
            .json(document);
        if let Some(path) = partition_path {
            request = request.header("x-ms-documentdb-partitionkey", partition_key_header(document, path));
        }

        let response = request.send().await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(id.to_string()));
        }
        let stored: Value = check(response).await?.json().await?;
        debug!(container = %self.container, key = id, "Created document");
        Ok(stored)
    }

    async fn find(&self, frame: &FrameId) -> Result<Option<Value>, StoreError> {
        let url = format!("{}/{}/docs", self.endpoint, self.collection_link());
        let body = json!({
            "query": FIND_QUERY,
            "parameters": [
                {"name": "@video", "value": frame.video},
                {"name": "@camera_no", "value": frame.camera_str()},
                {"name": "@frame_no", "value": frame.frame_str()},
            ]
        });

        let mut continuation: Option<String> = None;
        for page in 0..MAX_QUERY_PAGES {
            let mut request = self
                .signed(self.client.post(&url), "post", "docs")?
                .header(CONTENT_TYPE, "application/query+json")
                .header("x-ms-documentdb-isquery", "True")
                .header("x-ms-documentdb-query-enablecrosspartition", "True")
                .header("x-ms-max-item-count", "1")
                .body(body.to_string());
            if let Some(token) = &continuation {
                request = request.header("x-ms-continuation", token.as_str());
            }

            let response = check(request.send().await?).await?;
            continuation = response
                .headers()
                .get("x-ms-continuation")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let result: QueryPage = response.json().await?;

            if let Some(document) = result.documents.into_iter().next() {
                debug!(key = %frame, page, "Query matched");
                return Ok(Some(document));
            }
            if continuation.is_none() {
                break;
            }
        }
        if continuation.is_some() {
            warn!(
                key = %frame,
                pages = MAX_QUERY_PAGES,
                "Query page limit reached with results pending, treating as not found"
            );
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("test-key")
    const KEY: &str = "dGVzdC1rZXk=";

    fn store_for(server: &MockServer) -> CosmosStore {
        let target = CosmosTarget {
            endpoint: server.uri(),
            primary_key: SecretString::from(KEY.to_string()),
            database: "autoss".to_string(),
            container: "vectors".to_string(),
        };
        CosmosStore::new(target, Duration::from_secs(5)).unwrap()
    }

    async fn mount_collection(server: &MockServer, partition_path: Option<&str>) {
        let body = match partition_path {
            Some(p) => json!({"id": "vectors", "partitionKey": {"paths": [p], "kind": "Hash"}}),
            None => json!({"id": "vectors"}),
        };
        Mock::given(method("GET"))
            .and(path("/dbs/autoss/colls/vectors"))
            .and(header("x-ms-version", API_VERSION))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn frame_doc() -> Value {
        json!({"id": "vid1_1_1", "video": "vid1", "camera_no": "1", "frame_no": "1", "sumvector": [1.0]})
    }

    #[test]
    fn test_master_key_token_shape() {
        let token = master_key_token(
            b"test-key",
            "POST",
            "docs",
            "dbs/autoss/colls/vectors",
            "Tue, 01 Oct 2024 10:00:00 GMT",
        )
        .unwrap();
        assert!(token.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        assert!(!token.contains('+') && !token.contains('/'));

        let again = master_key_token(
            b"test-key",
            "post",
            "DOCS",
            "dbs/autoss/colls/vectors",
            "tue, 01 oct 2024 10:00:00 gmt",
        )
        .unwrap();
        // Verb, resource type and date are case-normalized before signing
        assert_eq!(token, again);

        let other = master_key_token(
            b"test-key",
            "get",
            "docs",
            "dbs/autoss/colls/vectors",
            "Tue, 01 Oct 2024 10:00:00 GMT",
        )
        .unwrap();
        assert_ne!(token, other);
    }

    #[test]
    fn test_invalid_primary_key() {
        let target = CosmosTarget {
            endpoint: "https://db.example.com".to_string(),
            primary_key: SecretString::from("not base64!".to_string()),
            database: "d".to_string(),
            container: "c".to_string(),
        };
        assert!(matches!(
            CosmosStore::new(target, Duration::from_secs(1)),
            Err(StoreError::Auth(_))
        ));
    }

    #[test]
    fn test_partition_key_header() {
        let doc = frame_doc();
        assert_eq!(partition_key_header(&doc, "/video"), r#"["vid1"]"#);
        assert_eq!(partition_key_header(&doc, "/missing"), "[{}]");
    }

    #[tokio::test]
    async fn test_insert_sends_partition_key() {
        let server = MockServer::start().await;
        mount_collection(&server, Some("/video")).await;
        Mock::given(method("POST"))
            .and(path("/dbs/autoss/colls/vectors/docs"))
            .and(header("x-ms-documentdb-partitionkey", r#"["vid1"]"#))
            .and(header_exists("x-ms-date"))
            .respond_with(ResponseTemplate::new(201).set_body_json(frame_doc()))
            .expect(2)
            .mount(&server)
            .await;

        let store = store_for(&server);
        let stored = store.insert("vid1_1_1", &frame_doc()).await.unwrap();
        assert_eq!(stored["id"], "vid1_1_1");
        // Container metadata is only read once
        store.insert("vid1_1_1", &frame_doc()).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_conflict() {
        let server = MockServer::start().await;
        mount_collection(&server, None).await;
        Mock::given(method("POST"))
            .and(path("/dbs/autoss/colls/vectors/docs"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "Conflict",
                "message": "Entity with the specified id already exists in the system."
            })))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .insert("vid1_1_1", &frame_doc())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == "vid1_1_1"));
    }

    #[tokio::test]
    async fn test_insert_service_error() {
        let server = MockServer::start().await;
        mount_collection(&server, None).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "Unauthorized",
                "message": "The input authorization token can't serve the request."
            })))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .insert("vid1_1_1", &frame_doc())
            .await
            .unwrap_err();
        match err {
            StoreError::Service { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("authorization token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dbs/autoss/colls/vectors/docs"))
            .and(header("x-ms-documentdb-isquery", "True"))
            .and(header("x-ms-documentdb-query-enablecrosspartition", "True"))
            .and(header("content-type", "application/query+json"))
            .and(body_string_contains("@frame_no"))
            .and(body_string_contains(r#""value":"1""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_rid": "x",
                "Documents": [frame_doc()],
                "_count": 1
            })))
            .mount(&server)
            .await;

        let found = store_for(&server)
            .find(&FrameId::new("vid1", 1, 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["id"], "vid1_1_1");
    }

    #[tokio::test]
    async fn test_find_follows_continuation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-ms-continuation", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Documents": [frame_doc()],
                "_count": 1
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ms-continuation", "page-2")
                    .set_body_json(json!({"Documents": [], "_count": 0})),
            )
            .mount(&server)
            .await;

        let found = store_for(&server)
            .find(&FrameId::new("vid1", 1, 1))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_find_stops_at_page_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ms-continuation", "more")
                    .set_body_json(json!({"Documents": [], "_count": 0})),
            )
            .expect(MAX_QUERY_PAGES as u64)
            .mount(&server)
            .await;

        let found = store_for(&server)
            .find(&FrameId::new("vid1", 1, 3))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Documents": [], "_count": 0})),
            )
            .mount(&server)
            .await;

        let found = store_for(&server)
            .find(&FrameId::new("vid1", 1, 2))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
