//! CRUD engine for the PASS repository
//!
//! Every operation is one HTTP round trip. Response bodies go through the
//! codec first and then through the reconciler, whose stubs are merged into
//! whatever the codec left unset.

use crate::codec::{self, JsonApiCodec};
use crate::error::{PassClientError, Result};
use crate::model::{Cardinality, Entity, EntityType};
use crate::reconcile::{self, merge, merge_all};
use crate::selector::{PassClientResult, PassClientSelector};
use crate::stream::PassObjectIter;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pass_common::config::PassConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

// ============================================================================
// Client Constants
// ============================================================================

/// Media type of every request and response body
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Path segment under the base URL that holds the collections
const DATA_PATH: &str = "data/";

/// Client for the PASS JSON:API repository
///
/// Holds only fixed configuration, so one client can be cloned and shared
/// across tasks freely.
#[derive(Debug, Clone)]
pub struct PassClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PassClient {
    /// Create a client from explicit configuration
    pub fn new(config: &PassConfig) -> Result<Self> {
        config.validate()?;

        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().default_headers(default_headers(config)?);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    /// Create a client from `PASS_CORE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(&PassConfig::from_env()?)
    }

    /// Base URL, always ending in `/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Persist a new entity and set its server-assigned id
    pub async fn create_object<E: Entity>(&self, entity: &mut E) -> Result<()> {
        if let Some(id) = entity.id() {
            return Err(PassClientError::invalid_argument(format!(
                "cannot create {} '{}': the id is assigned by the repository",
                E::TYPE,
                id
            )));
        }

        let document = JsonApiCodec::new().encode(entity)?;
        let url = self.collection_url(E::TYPE)?;
        let response = self
            .execute(Method::POST, url, Some(to_body(&document)?))
            .await?
            .error_for_status()?;

        let id = codec::resource_id(&response.body)?;
        debug!(entity_type = %E::TYPE, id = %id, "Created PASS object");
        entity.set_id(Some(id));

        Ok(())
    }

    /// Replace every attribute of an existing entity
    ///
    /// Null attributes are sent as explicit nulls, and every unset to-one
    /// relationship is sent as `{"data": null}`. Whether the repository
    /// clears a relationship on that signal is up to the repository.
    pub async fn update_object<E: Entity>(&self, entity: &E) -> Result<()> {
        let Some(id) = entity.id() else {
            return Err(PassClientError::invalid_argument(format!(
                "cannot update {} without an id",
                E::TYPE
            )));
        };

        let mut document = JsonApiCodec::with_nulls().encode(entity)?;
        insert_null_relationships(entity, &mut document);

        let url = self.entity_url(E::TYPE, id)?;
        self.execute(Method::PATCH, url, Some(to_body(&document)?))
            .await?
            .error_for_status()?;

        debug!(entity_type = %E::TYPE, id = %id, "Updated PASS object");
        Ok(())
    }

    /// Fetch one entity, embedding the `include` relationships in full
    ///
    /// Returns `Ok(None)` on 404. Relationships that were not included come
    /// back as stubs carrying only an id.
    pub async fn get_object<E: Entity>(&self, id: &str, include: &[&str]) -> Result<Option<E>> {
        let mut url = self.entity_url(E::TYPE, id)?;
        if !include.is_empty() {
            url.query_pairs_mut().append_pair("include", &include.join(","));
        }

        let response = self.execute(Method::GET, url, None).await?;
        if response.status == StatusCode::NOT_FOUND {
            debug!(entity_type = %E::TYPE, id, "PASS object not found");
            return Ok(None);
        }
        let response = response.error_for_status()?;

        let Some(mut entity) = JsonApiCodec::new().decode_one::<E>(&response.body)? else {
            return Ok(None);
        };

        let reconciled = reconcile::reconcile(&response.body)?;
        if let Some(targets) = entity.id().and_then(|id| reconciled.get(id)) {
            merge(&mut entity, targets)?;
        }

        Ok(Some(entity))
    }

    /// Fetch the current state of `entity` from the repository
    pub async fn refresh_object<E: Entity>(&self, entity: &E, include: &[&str]) -> Result<Option<E>> {
        let id = entity.id().ok_or_else(|| {
            PassClientError::invalid_argument(format!("cannot refresh {} without an id", E::TYPE))
        })?;
        self.get_object(id, include).await
    }

    /// Delete the entity of type `E` with `id`
    pub async fn delete_object<E: Entity>(&self, id: &str) -> Result<()> {
        let url = self.entity_url(E::TYPE, id)?;
        self.execute(Method::DELETE, url, None)
            .await?
            .error_for_status()?;

        debug!(entity_type = %E::TYPE, id, "Deleted PASS object");
        Ok(())
    }

    /// Fetch one page of entities matching `selector`
    ///
    /// A 404 yields an empty result with a total of zero.
    pub async fn select_objects<E: Entity>(
        &self,
        selector: &PassClientSelector<E>,
    ) -> Result<PassClientResult<E>> {
        selector.validate()?;

        let mut url = self.collection_url(E::TYPE)?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in selector.query_pairs() {
                match value {
                    Some(value) => query.append_pair(key, &value),
                    None => query.append_key_only(key),
                };
            }
        }

        let response = self.execute(Method::GET, url, None).await?;
        if response.status == StatusCode::NOT_FOUND {
            debug!(entity_type = %E::TYPE, "Select matched no collection");
            return Ok(PassClientResult::empty());
        }
        let response = response.error_for_status()?;

        let mut objects = JsonApiCodec::new().decode_many::<E>(&response.body)?;
        let reconciled = reconcile::reconcile(&response.body)?;
        merge_all(&mut objects, &reconciled)?;
        let total = codec::total(&response.body)?;

        debug!(
            entity_type = %E::TYPE,
            offset = selector.offset_value(),
            count = objects.len(),
            total,
            "Selected PASS objects"
        );

        Ok(PassClientResult::new(objects, total))
    }

    /// Lazily walk every page matching `selector`, starting at its offset
    pub fn stream_objects<E: Entity>(&self, selector: PassClientSelector<E>) -> PassObjectIter<E> {
        PassObjectIter::new(self.clone(), selector)
    }

    fn collection_url(&self, entity_type: EntityType) -> Result<Url> {
        Ok(self.base_url.join(DATA_PATH)?.join(entity_type.json_type())?)
    }

    fn entity_url(&self, entity_type: EntityType, id: &str) -> Result<Url> {
        if id.is_empty() {
            return Err(PassClientError::invalid_argument(format!(
                "{} id cannot be empty",
                entity_type
            )));
        }

        let mut url = self.collection_url(entity_type)?;
        url.path_segments_mut()
            .map_err(|_| PassClientError::invalid_argument(format!("'{}' cannot be a base URL", self.base_url)))?
            .push(id);
        Ok(url)
    }

    async fn execute(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<RawResponse> {
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %method, url = %url, status = status.as_u16(), "PASS request");

        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { method, url, status, body })
    }
}

/// Status and body of a completed request
struct RawResponse {
    method: Method,
    url: Url,
    status: StatusCode,
    body: Vec<u8>,
}

impl RawResponse {
    fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }

        Err(PassClientError::RequestFailed {
            method: self.method.to_string(),
            url: self.url.to_string(),
            status: self.status.as_u16(),
            body: String::from_utf8_lossy(&self.body).into_owned(),
        })
    }
}

fn default_headers(config: &PassConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_API_MEDIA_TYPE));

    if let Some((user, password)) = config.credentials() {
        headers.insert(AUTHORIZATION, basic_auth(user, password)?);
    }

    Ok(headers)
}

fn basic_auth(user: &str, password: &str) -> Result<HeaderValue> {
    let token = STANDARD.encode(format!("{}:{}", user, password));
    let mut value = HeaderValue::from_str(&format!("Basic {}", token))
        .map_err(|e| PassClientError::invalid_argument(format!("invalid credentials: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}

fn to_body(document: &Value) -> Result<Vec<u8>> {
    serde_json::to_vec(document).map_err(PassClientError::Encode)
}

/// Add `"name": {"data": null}` for each unset to-one relationship the encoder dropped
fn insert_null_relationships<E: Entity>(entity: &E, document: &mut Value) {
    let unset: Vec<&'static str> = E::relationships()
        .iter()
        .filter(|rel| rel.cardinality == Cardinality::ToOne && rel.is_unset(entity))
        .map(|rel| rel.name)
        .collect();
    if unset.is_empty() {
        return;
    }

    let Some(resource) = document.get_mut("data").and_then(Value::as_object_mut) else {
        return;
    };
    let Some(relationships) = resource
        .entry("relationships")
        .or_insert_with(|| json!({}))
        .as_object_mut()
    else {
        return;
    };

    for name in unset {
        relationships
            .entry(name)
            .or_insert_with(|| json!({ "data": null }));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::{Funder, Grant, Journal, User};

    fn client(base_url: &str) -> PassClient {
        PassClient::new(&PassConfig::new(base_url)).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = client("http://localhost:8080/pass");
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/pass/");
    }

    #[test]
    fn test_collection_and_entity_urls() {
        let client = client("http://localhost:8080/");
        assert_eq!(
            client.collection_url(EntityType::RepositoryCopy).unwrap().as_str(),
            "http://localhost:8080/data/repositoryCopy"
        );
        assert_eq!(
            client.entity_url(EntityType::Grant, "42").unwrap().as_str(),
            "http://localhost:8080/data/grant/42"
        );
        assert_eq!(
            client.entity_url(EntityType::User, "a/b").unwrap().as_str(),
            "http://localhost:8080/data/user/a%2Fb"
        );
        assert!(client.entity_url(EntityType::User, "").is_err());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let err = PassClient::new(&PassConfig::new("ftp://example.org")).unwrap_err();
        assert!(matches!(err, PassClientError::Config(_)));
    }

    #[test]
    fn test_basic_auth_header() {
        let value = basic_auth("user", "moo").unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic dXNlcjptb28=");
        assert!(value.is_sensitive());

        let headers = default_headers(&PassConfig::new("http://localhost/")).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers[ACCEPT], JSON_API_MEDIA_TYPE);
        assert_eq!(headers[CONTENT_TYPE], JSON_API_MEDIA_TYPE);
    }

    #[test]
    fn test_insert_null_relationships() {
        let grant = Grant {
            id: Some("g1".to_string()),
            primary_funder: Some(Box::new(Funder::stub("f1"))),
            ..Grant::default()
        };
        let mut document = JsonApiCodec::with_nulls().encode(&grant).unwrap();
        insert_null_relationships(&grant, &mut document);

        let relationships = &document["data"]["relationships"];
        assert_eq!(relationships["directFunder"], json!({"data": null}));
        assert_eq!(relationships["pi"], json!({"data": null}));
        assert_eq!(
            relationships["primaryFunder"],
            json!({"data": {"type": "funder", "id": "f1"}})
        );
        assert_eq!(relationships["coPis"], json!({"data": []}));
    }

    #[test]
    fn test_insert_null_relationships_creates_member() {
        let funder = Funder::stub("f1");
        let mut document = JsonApiCodec::with_nulls().encode(&funder).unwrap();
        insert_null_relationships(&funder, &mut document);
        assert_eq!(document["data"]["relationships"], json!({"policy": {"data": null}}));

        let user = User::stub("u1");
        let mut document = JsonApiCodec::with_nulls().encode(&user).unwrap();
        insert_null_relationships(&user, &mut document);
        assert!(document["data"].get("relationships").is_none());

        let journal = Journal::stub("j1");
        let mut document = JsonApiCodec::with_nulls().encode(&journal).unwrap();
        insert_null_relationships(&journal, &mut document);
        assert!(document["data"].get("relationships").is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_existing_id() {
        let mut grant = Grant::stub("g1");
        let err = client("http://localhost:1/").create_object(&mut grant).await.unwrap_err();
        assert!(matches!(err, PassClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let err = client("http://localhost:1/")
            .update_object(&Grant::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PassClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_select_rejects_zero_limit() {
        let selector = PassClientSelector::<Grant>::new().limit(0);
        let err = client("http://localhost:1/").select_objects(&selector).await.unwrap_err();
        assert!(matches!(err, PassClientError::InvalidArgument(_)));
    }
}
