/* 📖 # Why an explicit field table instead of serde derive?

Entities are filled from three places: creation payloads, persisted configuration
sections and partial update payloads. All of them use snake_case keys. The Field
table is the one place that maps those keys to struct fields, in both directions:

- `exchange_array` overlays a key/value map onto an entity
- `get_array_copy` turns the set fields back into a map

Unknown keys and wrongly typed values fail loudly with a validation error instead of
being silently dropped, so a typo in a hand-edited config file is reported at the
first fetch rather than discovered in production.
*/

use std::fmt;

use serde_json::{Map, Value};

use restadmin_base::{RestAdminError, RestAdminResult};

use crate::document::value_kind;

/// Hydrator used when none is configured.
pub const DEFAULT_HYDRATOR: &str = "ObjectProperty";

/// Appended to the resource class to name the default table service.
pub const TABLE_SERVICE_SUFFIX: &str = "\\Table";

/// Every configurable field of a REST service, generic or db-connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ResourceName,
    ControllerServiceName,
    ResourceClass,
    EntityClass,
    CollectionClass,
    RouteName,
    RouteMatch,
    RouteIdentifierName,
    TableService,
    AdapterName,
    TableName,
    HydratorName,
    ResourceHttpMethods,
    CollectionHttpMethods,
    CollectionQueryWhitelist,
    PageSize,
    PageSizeParam,
    Selector,
    AcceptWhitelist,
    ContentTypeWhitelist,
}

impl Field {
    /// Fields carried by every REST service.
    pub const GENERIC: [Field; 9] = [
        Field::ResourceName,
        Field::ControllerServiceName,
        Field::ResourceClass,
        Field::EntityClass,
        Field::CollectionClass,
        Field::RouteName,
        Field::RouteMatch,
        Field::RouteIdentifierName,
        Field::TableService,
    ];

    /// Fields only db-connected services carry.
    pub const DB_CONNECTED: [Field; 11] = [
        Field::AdapterName,
        Field::TableName,
        Field::HydratorName,
        Field::ResourceHttpMethods,
        Field::CollectionHttpMethods,
        Field::CollectionQueryWhitelist,
        Field::PageSize,
        Field::PageSizeParam,
        Field::Selector,
        Field::AcceptWhitelist,
        Field::ContentTypeWhitelist,
    ];

    /// The snake_case key used in payloads and configuration.
    pub fn key(self) -> &'static str {
        match self {
            Field::ResourceName => "resource_name",
            Field::ControllerServiceName => "controller_service_name",
            Field::ResourceClass => "resource_class",
            Field::EntityClass => "entity_class",
            Field::CollectionClass => "collection_class",
            Field::RouteName => "route_name",
            Field::RouteMatch => "route_match",
            Field::RouteIdentifierName => "route_identifier_name",
            Field::TableService => "table_service",
            Field::AdapterName => "adapter_name",
            Field::TableName => "table_name",
            Field::HydratorName => "hydrator_name",
            Field::ResourceHttpMethods => "resource_http_methods",
            Field::CollectionHttpMethods => "collection_http_methods",
            Field::CollectionQueryWhitelist => "collection_query_whitelist",
            Field::PageSize => "page_size",
            Field::PageSizeParam => "page_size_param",
            Field::Selector => "selector",
            Field::AcceptWhitelist => "accept_whitelist",
            Field::ContentTypeWhitelist => "content_type_whitelist",
        }
    }

    /// Look up a field by its snake_case key.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::GENERIC
            .into_iter()
            .chain(Field::DB_CONNECTED)
            .find(|field| field.key() == key)
    }

    pub fn is_generic(self) -> bool {
        Field::GENERIC.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn invalid_value(field: Field, expected: &str, value: &Value) -> Box<RestAdminError> {
    Box::new(RestAdminError::validation(format!(
        "field '{}' expects {}, found {}",
        field,
        expected,
        value_kind(value)
    )))
}

fn unknown_key(key: &str) -> Box<RestAdminError> {
    Box::new(RestAdminError::validation(format!("unknown field '{}'", key)))
}

fn string_value(field: Field, value: &Value) -> RestAdminResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(invalid_value(field, "a string", other)),
    }
}

fn string_list(field: Field, value: &Value) -> RestAdminResult<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid_value(field, "a sequence of strings", item))
            })
            .collect::<RestAdminResult<Vec<_>>>()
            .map(Some),
        other => Err(invalid_value(field, "a sequence of strings", other)),
    }
}

/// Like `string_list`, with duplicates dropped, keeping first occurrences.
fn string_set(field: Field, value: &Value) -> RestAdminResult<Option<Vec<String>>> {
    Ok(string_list(field, value)?.map(|items| {
        let mut unique: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        unique
    }))
}

fn page_size(value: &Value) -> RestAdminResult<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid_value(Field::PageSize, "a non-negative integer", value)),
        other => Err(invalid_value(Field::PageSize, "a non-negative integer", other)),
    }
}

fn list_value(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Identity record of a generated REST service.
///
/// All fields are optional: a creation payload carries only what the caller
/// chose, and the registry fills in the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestServiceEntity {
    pub resource_name: Option<String>,
    pub controller_service_name: Option<String>,
    pub resource_class: Option<String>,
    pub entity_class: Option<String>,
    pub collection_class: Option<String>,
    pub route_name: Option<String>,
    pub route_match: Option<String>,
    pub route_identifier_name: Option<String>,
    pub table_service: Option<String>,
}

impl RestServiceEntity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an entity from a snake_case key/value map.
    pub fn from_array(data: &Map<String, Value>) -> RestAdminResult<Self> {
        let mut entity = Self::new();
        entity.exchange_array(data)?;
        Ok(entity)
    }

    /// Overlay the keys of `data` onto this entity; a `null` value unsets a field.
    ///
    /// Fails on keys that are not generic fields.
    pub fn exchange_array(&mut self, data: &Map<String, Value>) -> RestAdminResult<()> {
        for (key, value) in data {
            let field = Field::from_key(key)
                .filter(|field| field.is_generic())
                .ok_or_else(|| unknown_key(key))?;
            self.set_field(field, value)?;
        }
        Ok(())
    }

    /// All set fields as a snake_case key/value map.
    pub fn get_array_copy(&self) -> Map<String, Value> {
        Field::GENERIC
            .into_iter()
            .filter_map(|field| Some((field.key().to_string(), self.field_value(field)?)))
            .collect()
    }

    /// Current value of a generic field, if set.
    pub fn field_value(&self, field: Field) -> Option<Value> {
        let slot = match field {
            Field::ResourceName => &self.resource_name,
            Field::ControllerServiceName => &self.controller_service_name,
            Field::ResourceClass => &self.resource_class,
            Field::EntityClass => &self.entity_class,
            Field::CollectionClass => &self.collection_class,
            Field::RouteName => &self.route_name,
            Field::RouteMatch => &self.route_match,
            Field::RouteIdentifierName => &self.route_identifier_name,
            Field::TableService => &self.table_service,
            _ => return None,
        };
        slot.clone().map(Value::String)
    }

    fn set_field(&mut self, field: Field, value: &Value) -> RestAdminResult<()> {
        let slot = match field {
            Field::ResourceName => &mut self.resource_name,
            Field::ControllerServiceName => &mut self.controller_service_name,
            Field::ResourceClass => &mut self.resource_class,
            Field::EntityClass => &mut self.entity_class,
            Field::CollectionClass => &mut self.collection_class,
            Field::RouteName => &mut self.route_name,
            Field::RouteMatch => &mut self.route_match,
            Field::RouteIdentifierName => &mut self.route_identifier_name,
            Field::TableService => &mut self.table_service,
            other => return Err(unknown_key(other.key())),
        };
        *slot = string_value(field, value)?;
        Ok(())
    }

    /// The resource class, or a validation error naming `operation`.
    pub fn require_resource_class(&self, operation: &str) -> RestAdminResult<&str> {
        self.resource_class.as_deref().ok_or_else(|| {
            Box::new(RestAdminError::validation(format!(
                "resource_class is required to {}",
                operation
            )))
        })
    }

    /// The controller service name, or a validation error naming `operation`.
    pub fn require_controller_service_name(&self, operation: &str) -> RestAdminResult<&str> {
        self.controller_service_name.as_deref().ok_or_else(|| {
            Box::new(RestAdminError::validation(format!(
                "controller_service_name is required to {}",
                operation
            )))
        })
    }
}

/// A REST service backed by a database table.
///
/// Embeds the generic identity record, so anything that works on a
/// `RestServiceEntity` works on `entity.as_ref()` unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbConnectedRestServiceEntity {
    pub base: RestServiceEntity,
    pub adapter_name: Option<String>,
    pub table_name: Option<String>,
    pub hydrator_name: Option<String>,
    pub resource_http_methods: Option<Vec<String>>,
    pub collection_http_methods: Option<Vec<String>>,
    pub collection_query_whitelist: Option<Vec<String>>,
    pub page_size: Option<u64>,
    pub page_size_param: Option<String>,
    pub selector: Option<String>,
    pub accept_whitelist: Option<Vec<String>>,
    pub content_type_whitelist: Option<Vec<String>>,
}

impl DbConnectedRestServiceEntity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a generic entity; db-connected fields are unset.
    pub fn from_base(base: RestServiceEntity) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    /// Build an entity from a snake_case key/value map.
    pub fn from_array(data: &Map<String, Value>) -> RestAdminResult<Self> {
        let mut entity = Self::new();
        entity.exchange_array(data)?;
        Ok(entity)
    }

    /// Overlay the keys of `data`, generic and db-connected alike.
    pub fn exchange_array(&mut self, data: &Map<String, Value>) -> RestAdminResult<()> {
        for (key, value) in data {
            let field = Field::from_key(key).ok_or_else(|| unknown_key(key))?;
            if field.is_generic() {
                self.base.set_field(field, value)?;
            } else {
                self.set_db_field(field, value)?;
            }
        }
        Ok(())
    }

    /// All set fields, generic and db-connected, as a snake_case map.
    pub fn get_array_copy(&self) -> Map<String, Value> {
        let mut data = self.base.get_array_copy();
        data.extend(self.db_fields());
        data
    }

    /// The section persisted under `zf-api-first.db-connected.<resource_class>`:
    /// every set db-connected field plus the controller service name and table service.
    pub fn db_connected_config(&self) -> Map<String, Value> {
        let mut section: Map<String, Value> = [Field::ControllerServiceName, Field::TableService]
            .into_iter()
            .filter_map(|field| Some((field.key().to_string(), self.base.field_value(field)?)))
            .collect();
        section.extend(self.db_fields());
        section
    }

    /// Hydrator name, falling back to the default hydrator.
    pub fn effective_hydrator_name(&self) -> &str {
        self.hydrator_name.as_deref().unwrap_or(DEFAULT_HYDRATOR)
    }

    fn db_fields(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        Field::DB_CONNECTED
            .into_iter()
            .filter_map(|field| Some((field.key().to_string(), self.db_field_value(field)?)))
    }

    fn db_field_value(&self, field: Field) -> Option<Value> {
        match field {
            Field::AdapterName => self.adapter_name.clone().map(Value::String),
            Field::TableName => self.table_name.clone().map(Value::String),
            Field::HydratorName => self.hydrator_name.clone().map(Value::String),
            Field::ResourceHttpMethods => self.resource_http_methods.as_deref().map(list_value),
            Field::CollectionHttpMethods => self.collection_http_methods.as_deref().map(list_value),
            Field::CollectionQueryWhitelist => {
                self.collection_query_whitelist.as_deref().map(list_value)
            }
            Field::PageSize => self.page_size.map(Value::from),
            Field::PageSizeParam => self.page_size_param.clone().map(Value::String),
            Field::Selector => self.selector.clone().map(Value::String),
            Field::AcceptWhitelist => self.accept_whitelist.as_deref().map(list_value),
            Field::ContentTypeWhitelist => self.content_type_whitelist.as_deref().map(list_value),
            generic => self.base.field_value(generic),
        }
    }

    fn set_db_field(&mut self, field: Field, value: &Value) -> RestAdminResult<()> {
        match field {
            Field::AdapterName => self.adapter_name = string_value(field, value)?,
            Field::TableName => self.table_name = string_value(field, value)?,
            Field::HydratorName => self.hydrator_name = string_value(field, value)?,
            Field::ResourceHttpMethods => self.resource_http_methods = string_list(field, value)?,
            Field::CollectionHttpMethods => {
                self.collection_http_methods = string_list(field, value)?
            }
            Field::CollectionQueryWhitelist => {
                self.collection_query_whitelist = string_set(field, value)?
            }
            Field::PageSize => self.page_size = page_size(value)?,
            Field::PageSizeParam => self.page_size_param = string_value(field, value)?,
            Field::Selector => self.selector = string_value(field, value)?,
            Field::AcceptWhitelist => self.accept_whitelist = string_list(field, value)?,
            Field::ContentTypeWhitelist => {
                self.content_type_whitelist = string_list(field, value)?
            }
            generic => self.base.set_field(generic, value)?,
        }
        Ok(())
    }
}

impl AsRef<RestServiceEntity> for DbConnectedRestServiceEntity {
    fn as_ref(&self) -> &RestServiceEntity {
        &self.base
    }
}

impl AsMut<RestServiceEntity> for DbConnectedRestServiceEntity {
    fn as_mut(&mut self) -> &mut RestServiceEntity {
        &mut self.base
    }
}

impl AsRef<RestServiceEntity> for RestServiceEntity {
    fn as_ref(&self) -> &RestServiceEntity {
        self
    }
}

/// The result of fetching a REST service: either the plain identity record or
/// the db-connected entity it was recast into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestService {
    Generic(RestServiceEntity),
    DbConnected(DbConnectedRestServiceEntity),
}

impl RestService {
    /// The generic view, available for both variants.
    pub fn base(&self) -> &RestServiceEntity {
        match self {
            RestService::Generic(entity) => entity,
            RestService::DbConnected(entity) => &entity.base,
        }
    }

    pub fn is_db_connected(&self) -> bool {
        matches!(self, RestService::DbConnected(_))
    }

    pub fn as_db_connected(&self) -> Option<&DbConnectedRestServiceEntity> {
        match self {
            RestService::DbConnected(entity) => Some(entity),
            RestService::Generic(_) => None,
        }
    }

    pub fn into_db_connected(self) -> Option<DbConnectedRestServiceEntity> {
        match self {
            RestService::DbConnected(entity) => Some(entity),
            RestService::Generic(_) => None,
        }
    }

    /// All set fields as a snake_case map.
    pub fn get_array_copy(&self) -> Map<String, Value> {
        match self {
            RestService::Generic(entity) => entity.get_array_copy(),
            RestService::DbConnected(entity) => entity.get_array_copy(),
        }
    }
}

impl AsRef<RestServiceEntity> for RestService {
    fn as_ref(&self) -> &RestServiceEntity {
        self.base()
    }
}

impl From<RestServiceEntity> for RestService {
    fn from(entity: RestServiceEntity) -> Self {
        RestService::Generic(entity)
    }
}

impl From<DbConnectedRestServiceEntity> for RestService {
    fn from(entity: DbConnectedRestServiceEntity) -> Self {
        RestService::DbConnected(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be a mapping"),
        }
    }

    #[test]
    fn test_field_table_is_bidirectional() {
        for field in Field::GENERIC.into_iter().chain(Field::DB_CONNECTED) {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("tableName"), None);
    }

    #[test]
    fn test_generic_exchange_and_copy() {
        let data = map(json!({
            "controller_service_name": "BarConf\\Rest\\Barbaz\\Controller",
            "resource_class": "BarConf\\Rest\\Barbaz\\BarbazResource",
            "route_name": "bar-conf.rest.barbaz",
            "route_match": "/api/barbaz",
            "entity_class": "BarConf\\Rest\\Barbaz\\BarbazEntity",
        }));
        let entity = RestServiceEntity::from_array(&data).unwrap();

        assert_eq!(entity.route_match.as_deref(), Some("/api/barbaz"));
        assert_eq!(entity.collection_class, None);
        assert_eq!(entity.get_array_copy(), data);
    }

    #[test]
    fn test_generic_rejects_db_connected_keys() {
        let err = RestServiceEntity::from_array(&map(json!({"table_name": "barbaz"}))).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation failed: unknown field 'table_name'");
    }

    #[test]
    fn test_null_unsets_field() {
        let mut entity = RestServiceEntity::from_array(&map(json!({"route_match": "/x"}))).unwrap();
        entity.exchange_array(&map(json!({"route_match": null}))).unwrap();
        assert_eq!(entity.route_match, None);
    }

    #[test]
    fn test_db_connected_exchange_array() {
        let entity = DbConnectedRestServiceEntity::from_array(&map(json!({
            "adapter_name": "DB\\Barbaz",
            "table_name": "barbaz",
            "resource_http_methods": ["GET", "PATCH"],
            "collection_query_whitelist": ["sort", "filter", "sort"],
            "page_size": 10,
            "route_match": "/barbaz",
        })))
        .unwrap();

        assert_eq!(entity.adapter_name.as_deref(), Some("DB\\Barbaz"));
        assert_eq!(entity.base.route_match.as_deref(), Some("/barbaz"));
        assert_eq!(
            entity.collection_query_whitelist,
            Some(vec!["sort".to_string(), "filter".to_string()])
        );
        assert_eq!(entity.page_size, Some(10));
        assert_eq!(entity.effective_hydrator_name(), DEFAULT_HYDRATOR);
    }

    #[test]
    fn test_db_connected_rejects_bad_values() {
        let negative = DbConnectedRestServiceEntity::from_array(&map(json!({"page_size": -1})));
        assert!(negative.unwrap_err().is_validation());

        let err = DbConnectedRestServiceEntity::from_array(&map(json!({"resource_http_methods": "GET"})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: field 'resource_http_methods' expects a sequence of strings, found a string"
        );

        let unknown = DbConnectedRestServiceEntity::from_array(&map(json!({"tableName": "x"})));
        assert!(unknown.unwrap_err().is_validation());
    }

    #[test]
    fn test_db_connected_config_section() {
        let mut entity = DbConnectedRestServiceEntity::from_array(&map(json!({
            "adapter_name": "DB\\Barbaz",
            "table_name": "barbaz",
            "hydrator_name": "ObjectProperty",
            "selector": "HalJson",
        })))
        .unwrap();
        entity.base.controller_service_name = Some("BarConf\\Rest\\Barbaz\\Controller".to_string());
        entity.base.resource_class = Some("BarConf\\Rest\\Barbaz\\BarbazResource".to_string());
        entity.base.table_service = Some("BarConf\\Rest\\Barbaz\\BarbazResource\\Table".to_string());

        expect![[r#"
            {
              "adapter_name": "DB\\Barbaz",
              "controller_service_name": "BarConf\\Rest\\Barbaz\\Controller",
              "hydrator_name": "ObjectProperty",
              "selector": "HalJson",
              "table_name": "barbaz",
              "table_service": "BarConf\\Rest\\Barbaz\\BarbazResource\\Table"
            }"#]]
        .assert_eq(&serde_json::to_string_pretty(&entity.db_connected_config()).unwrap());
    }

    #[test]
    fn test_rest_service_views() {
        let mut db = DbConnectedRestServiceEntity::new();
        db.base.resource_class = Some("A\\Rest\\B\\BResource".to_string());
        db.table_name = Some("b".to_string());

        let service = RestService::from(db.clone());
        assert!(service.is_db_connected());
        assert_eq!(service.base(), &db.base);
        assert_eq!(service.as_db_connected(), Some(&db));
        assert_eq!(service.get_array_copy().get("table_name"), Some(&json!("b")));

        let generic = RestService::from(db.base.clone());
        assert!(!generic.is_db_connected());
        assert_eq!(generic.into_db_connected(), None);
    }
}
