//! Generic remote resource
//!
//! An [`Entity`] is whatever the server returned for a record: an attribute
//! map plus the endpoint it lives under. There are no per-resource types;
//! relations are addressed by name as `{endpoint}/{id}/{relation}`.

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use super::client::Session;
use super::error::{ApiError, ApiResult};
use super::normalize::{self, Resource};
use super::page::Page;
use super::query::{ListQuery, search_endpoint};

/// A remote record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    #[serde(skip)]
    endpoint: String,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

/// Result of [`Entity::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// The attribute exists locally
    Value(Value),
    /// No such attribute; the name was fetched as a relation instead
    Related(Page),
}

impl Entity {
    pub fn new(attributes: Map<String, Value>, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            attributes,
        }
    }

    // === Remote operations ===

    /// POST `data` to `endpoint`
    ///
    /// `Ok(None)` means the server accepted the request but did not answer
    /// with a single record.
    pub async fn create(
        session: &Session,
        endpoint: &str,
        data: &Value,
        includes: &[String],
    ) -> ApiResult<Option<Entity>> {
        let query = ListQuery::with_includes(includes.iter().cloned());
        let response = session.post(endpoint, data, &query).await?;
        Ok(single(&response, endpoint))
    }

    /// GET `endpoint/id`
    pub async fn fetch_by_id(
        session: &Session,
        endpoint: &str,
        id: &str,
        includes: &[String],
    ) -> ApiResult<Option<Entity>> {
        let query = ListQuery::with_includes(includes.iter().cloned());
        let path = format!("{}/{}", endpoint.trim_end_matches('/'), id);
        let response = session.get(&path, &query).await?;
        Ok(single(&response, endpoint))
    }

    /// GET `endpoint` as a page of entities
    pub async fn fetch_all(session: &Session, endpoint: &str, query: &ListQuery) -> ApiResult<Page> {
        let response = session.get(endpoint, query).await?;
        Ok(normalize::to_page(&response, endpoint))
    }

    /// GET `search/endpoint?<params>` as a page of entities
    pub async fn search<K, V>(
        session: &Session,
        endpoint: &str,
        params: &[(K, V)],
        query: &ListQuery,
    ) -> ApiResult<Page>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let path = search_endpoint(endpoint, params);
        let response = session.get(&path, query).await?;
        Ok(normalize::to_page(&response, endpoint))
    }

    /// PATCH this entity with `data`.
    ///
    /// The local attributes are replaced with the unwrapped response, so they
    /// reflect what the server stored rather than what was sent. A fresh
    /// normalized entity is returned as well.
    pub async fn update(
        &mut self,
        session: &Session,
        data: &Value,
        includes: &[String],
    ) -> ApiResult<Option<Entity>> {
        let path = self.instance_path()?;
        let query = ListQuery::with_includes(includes.iter().cloned());
        let response = session.patch(&path, data, &query).await?;

        match normalize::unwrap_envelopes(&response) {
            Some(Value::Object(attributes)) => self.fill(attributes),
            _ => debug!("{}: update response carried no attributes", path),
        }

        Ok(single(&response, &self.endpoint))
    }

    /// DELETE this entity; returns the raw response body
    pub async fn delete(&self, session: &Session) -> ApiResult<Value> {
        let path = self.instance_path()?;
        session.delete(&path).await
    }

    /// Page through `{endpoint}/{id}/{relation}`
    pub async fn fetch_related(
        &self,
        session: &Session,
        relation: &str,
        query: &ListQuery,
    ) -> ApiResult<Page> {
        let path = self.relation_path(relation)?;
        let response = session.get(&path, query).await?;
        Ok(normalize::to_page(&response, &path))
    }

    /// GET `{endpoint}/{id}/{relation}/{related_id}`
    pub async fn fetch_related_by_id(
        &self,
        session: &Session,
        relation: &str,
        related_id: &str,
        includes: &[String],
    ) -> ApiResult<Option<Entity>> {
        let path = self.relation_path(relation)?;
        Entity::fetch_by_id(session, &path, related_id, includes).await
    }

    /// Read `name` as an attribute, falling back to fetching it as a relation.
    ///
    /// Attributes shadow relations of the same name.
    pub async fn resolve(&self, session: &Session, name: &str) -> ApiResult<Field> {
        if let Some(value) = self.attributes.get(name) {
            return Ok(Field::Value(value.clone()));
        }

        let page = self.fetch_related(session, name, &ListQuery::default()).await?;
        Ok(Field::Related(page))
    }

    // === Local state ===

    /// Replace the last endpoint segment, for polymorphic resources that
    /// share an id but live under different paths
    pub fn rebind(&mut self, segment: &str) -> &mut Self {
        self.endpoint = match self.endpoint.rsplit_once('/') {
            Some((parent, _)) => format!("{}/{}", parent, segment),
            None => segment.to_string(),
        };
        self
    }

    /// Server-assigned identifier; numeric ids are rendered as strings
    pub fn id(&self) -> Option<String> {
        match self.attributes.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// The `object` marker, e.g. `"customer"`
    pub fn object_type(&self) -> Option<&str> {
        self.get_str("object")
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn fill(&mut self, attributes: Map<String, Value>) {
        self.attributes = attributes;
    }

    pub fn into_attributes(self) -> Map<String, Value> {
        self.attributes
    }

    fn instance_path(&self) -> ApiResult<String> {
        let id = self.id().ok_or_else(|| ApiError::MissingId {
            endpoint: self.endpoint.clone(),
        })?;
        Ok(format!("{}/{}", self.endpoint, id))
    }

    fn relation_path(&self, relation: &str) -> ApiResult<String> {
        Ok(format!("{}/{}", self.instance_path()?, relation))
    }
}

fn single(response: &Value, endpoint: &str) -> Option<Entity> {
    match normalize::from_data(response, endpoint) {
        Some(Resource::Single(entity)) => Some(entity),
        Some(Resource::Collection(_)) => {
            debug!("{}: expected a single record, got a collection", endpoint);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::Session;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session(server: &MockServer) -> Session {
        Session::open_with_bearer_token(server.uri(), "test-token", Some("tenant-1".to_string()))
            .unwrap()
    }

    fn customer() -> Entity {
        let attributes = json!({"id": "42", "object": "customer", "name": "Acme"});
        match attributes {
            Value::Object(map) => Entity::new(map, "customers"),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_fetch_by_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customers/42"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("X-Tenant", "tenant-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "42", "object": "customer", "name": "Acme"}
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let entity = Entity::fetch_by_id(&session, "customers", "42", &[])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entity.id().as_deref(), Some("42"));
        assert_eq!(entity.get_str("name"), Some("Acme"));
        assert_eq!(entity.endpoint(), "customers");
    }

    #[tokio::test]
    async fn test_fetch_all_paginated() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/persons"))
            .and(query_param("limit", "15"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "1", "object": "person"}, {"id": "2", "object": "person"}],
                "meta": {"pagination": {"total": 2, "per_page": 15, "current_page": 1}}
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let page = Entity::fetch_all(&session, "persons", &ListQuery::default())
            .await
            .unwrap();

        assert!(page.is_paginated());
        assert_eq!(page.len(), 2);
        assert_eq!(page.total(), 2);
        assert_eq!(page.per_page(), 15);
        assert_eq!(page.current_page(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_with_includes_and_paging() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customers"))
            .and(query_param("include", "employees,addresses"))
            .and(query_param("limit", "5"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "6", "object": "customer"}]
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let query = ListQuery::with_includes(["employees", "addresses"])
            .per_page(5)
            .page(2);
        let page = Entity::fetch_all(&session, "customers", &query).await.unwrap();

        assert!(!page.is_paginated());
        assert_eq!(page.total(), 1);
        assert_eq!(page.last_page(), 1);
    }

    #[tokio::test]
    async fn test_search() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/persons"))
            .and(query_param("email", "jan@example.com"))
            .and(query_param("limit", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "3", "object": "person", "email": "jan@example.com"}],
                "meta": {"pagination": {"total": 1, "per_page": 15, "current_page": 1}}
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let page = Entity::search(
            &session,
            "persons",
            &[("email", "jan@example.com")],
            &ListQuery::default(),
        )
        .await
        .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page.items()[0].endpoint(), "persons");
    }

    #[tokio::test]
    async fn test_create() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/customers"))
            .and(body_json(json!({"name": "Acme", "status": "customer"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {"id": "42", "object": "customer", "name": "Acme", "status": "customer"}
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let created = Entity::create(
            &session,
            "customers",
            &json!({"name": "Acme", "status": "customer"}),
            &[],
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(created.id().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_create_with_unrecognized_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/customers/42/employees/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let pivot = Entity::create(&session, "customers/42/employees/7", &json!({}), &[])
            .await
            .unwrap();
        assert_eq!(pivot, None);
    }

    #[tokio::test]
    async fn test_update_replaces_local_attributes_with_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/customers/42"))
            .and(body_json(json!({"name": "  acme bv "})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "42", "object": "customer", "name": "Acme BV", "updated": true}
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let mut entity = customer();
        let returned = entity
            .update(&session, &json!({"name": "  acme bv "}), &[])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entity.get_str("name"), Some("Acme BV"));
        assert_eq!(entity.get("updated"), Some(&json!(true)));
        assert_eq!(returned.attributes(), entity.attributes());
    }

    #[tokio::test]
    async fn test_delete() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/customers/42"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let response = customer().delete(&session).await.unwrap();
        assert_eq!(response, Value::Null);
    }

    #[tokio::test]
    async fn test_resolve_prefers_attributes_over_relations() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customers/42/employees"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "7", "object": "person"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let entity = customer();

        match entity.resolve(&session, "name").await.unwrap() {
            Field::Value(value) => assert_eq!(value, json!("Acme")),
            other => panic!("expected attribute, got {:?}", other),
        }

        match entity.resolve(&session, "employees").await.unwrap() {
            Field::Related(page) => {
                assert_eq!(page.len(), 1);
                assert_eq!(page.items()[0].endpoint(), "customers/42/employees");
            }
            other => panic!("expected relation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_related_by_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customers/42/employees/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "7", "object": "person", "first_name": "Jan"}
            })))
            .mount(&mock_server)
            .await;

        let session = session(&mock_server);
        let person = customer()
            .fetch_related_by_id(&session, "employees", "7", &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(person.get_str("first_name"), Some("Jan"));
        assert_eq!(person.endpoint(), "customers/42/employees");
    }

    #[tokio::test]
    async fn test_instance_operations_need_an_id() {
        let mock_server = MockServer::start().await;
        let session = session(&mock_server);
        let entity = Entity::new(Map::new(), "customers");

        let err = entity.delete(&session).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingId { .. }));
    }

    #[test]
    fn test_rebind_replaces_last_segment() {
        let mut entity = Entity::new(Map::new(), "customers/42/contacts");
        entity.rebind("persons");
        assert_eq!(entity.endpoint(), "customers/42/persons");

        let mut entity = Entity::new(Map::new(), "contacts");
        entity.rebind("organisations");
        assert_eq!(entity.endpoint(), "organisations");
    }

    #[test]
    fn test_numeric_id_and_serialization() {
        let mut attributes = Map::new();
        attributes.insert("id".to_string(), json!(10105));
        attributes.insert("object".to_string(), json!("customer"));
        let entity = Entity::new(attributes, "customers");

        assert_eq!(entity.id().as_deref(), Some("10105"));
        assert_eq!(entity.object_type(), Some("customer"));
        assert_eq!(
            serde_json::to_value(&entity).unwrap(),
            json!({"id": 10105, "object": "customer"})
        );
    }
}
