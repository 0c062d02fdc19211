/// Generic entity mapper.
///
/// Converts wire payloads into entity graphs and entities back into outbound
/// payloads, driven entirely by the schema registry. Nested entities and
/// entity lists are rebuilt recursively from each field's declared shape.
use log::debug;
use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::errors::InvoiceXpressError;
use crate::schema::{EntityKind, EntitySchema, FieldShape, SchemaRegistry};
use crate::value::{is_empty_payload, is_falsy, FieldValue};

#[derive(Debug, Clone, Copy)]
pub struct Mapper<'r> {
    registry: &'r SchemaRegistry,
}

impl Mapper<'static> {
    /// Mapper over the standard registry.
    pub fn standard() -> Self {
        Self {
            registry: SchemaRegistry::standard(),
        }
    }
}

impl<'r> Mapper<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Parse JSON text and populate an entity through [`Mapper::from_payload`].
    pub fn from_json(&self, kind: EntityKind, json: &str) -> Result<Entity, InvoiceXpressError> {
        let payload: Value = serde_json::from_str(json)
            .map_err(|e| InvoiceXpressError::MalformedPayload(e.to_string()))?;
        self.from_payload(kind, &payload)
    }

    /// Populate from a payload wrapped in the kind's container. A missing
    /// container yields an empty entity.
    pub fn from_payload(
        &self,
        kind: EntityKind,
        payload: &Value,
    ) -> Result<Entity, InvoiceXpressError> {
        let schema = self.registry.require(kind)?;
        match schema.container {
            Some(container) => match payload.get(container) {
                Some(inner) => self.from_fields(kind, inner),
                None => {
                    debug!(
                        "mapper.from_payload kind={} container={} missing",
                        kind, container
                    );
                    Ok(Entity::with_schema(schema))
                }
            },
            None => self.from_fields(kind, payload),
        }
    }

    /// Populate from an unwrapped field map. Non-object input yields an empty
    /// entity.
    pub fn from_fields(&self, kind: EntityKind, fields: &Value) -> Result<Entity, InvoiceXpressError> {
        let schema = self.registry.require(kind)?;
        let mut entity = Entity::with_schema(schema);
        if let Value::Object(map) = fields {
            self.populate(&mut entity, map)?;
        }
        Ok(entity)
    }

    /// Assign every key of `fields` onto `entity`.
    pub fn populate(
        &self,
        entity: &mut Entity,
        fields: &Map<String, Value>,
    ) -> Result<(), InvoiceXpressError> {
        let schema = entity.schema();
        for (key, value) in fields {
            let descriptor = schema.field(key);
            if let Some(setter) = descriptor.and_then(|d| d.setter) {
                setter(entity, value)?;
                continue;
            }
            match schema.shape_of(key) {
                FieldShape::Scalar => {
                    entity.set(key, value)?;
                }
                FieldShape::Nested(nested) => {
                    let built = self.build_nested(nested, value, false)?;
                    entity.store(key, built);
                }
                FieldShape::List(nested) => {
                    let built = self.build_nested(nested, value, true)?;
                    entity.store(key, built);
                }
            }
        }
        debug!(
            "mapper.populate kind={} fields={}",
            entity.kind(),
            entity.len()
        );
        Ok(())
    }

    fn build_nested(
        &self,
        kind: EntityKind,
        value: &Value,
        is_list: bool,
    ) -> Result<FieldValue, InvoiceXpressError> {
        if is_empty_payload(value) {
            return Ok(if is_list {
                FieldValue::List(Vec::new())
            } else {
                FieldValue::from(Entity::with_schema(self.registry.require(kind)?))
            });
        }
        match value {
            Value::Object(_) if is_list => {
                Ok(FieldValue::List(vec![self.from_fields(kind, value)?.into()]))
            }
            Value::Object(_) => Ok(self.from_fields(kind, value)?.into()),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    let element = match item {
                        Value::Object(_) | Value::Array(_) => self.from_fields(kind, item)?.into(),
                        scalar => FieldValue::from(scalar),
                    };
                    list.push(element);
                }
                Ok(FieldValue::List(list))
            }
            scalar => Ok(FieldValue::from(scalar)),
        }
    }

    /// Decode a list of unwrapped field maps.
    pub fn list_from(&self, kind: EntityKind, items: &Value) -> Result<Vec<Entity>, InvoiceXpressError> {
        match items {
            Value::Array(items) => items
                .iter()
                .map(|item| self.from_fields(kind, item))
                .collect(),
            Value::Object(_) => Ok(vec![self.from_fields(kind, items)?]),
            _ => Ok(Vec::new()),
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Every field of `entity` in wire form.
    pub fn to_array(entity: &Entity) -> Value {
        entity.to_value()
    }

    /// Whitelisted fields whose wire value is not falsy.
    ///
    /// Falsy values (null, false, 0, "", "0", []) are dropped even when set on
    /// purpose, so a field cannot be cleared to zero or false through this path.
    pub fn to_payload(entity: &Entity, whitelist: &[&str]) -> Map<String, Value> {
        let mut payload = entity.only(whitelist);
        payload.retain(|key, value| {
            let keep = !is_falsy(value);
            if !keep {
                debug!("mapper.to_payload dropped falsy key={}", key);
            }
            keep
        });
        payload
    }

    /// Wrap `fields` under `container`.
    pub fn wrap(container: &str, fields: Map<String, Value>) -> Value {
        let mut outer = Map::new();
        outer.insert(container.to_string(), Value::Object(fields));
        Value::Object(outer)
    }

    /// Create payload wrapped in the schema's create container.
    pub fn create_body(entity: &Entity) -> Value {
        let schema: &EntitySchema = entity.schema();
        let fields = Self::to_payload(entity, schema.create_keys);
        match schema.create_wrapper() {
            Some(container) => Self::wrap(container, fields),
            None => Value::Object(fields),
        }
    }

    /// Update payload wrapped in the schema's container.
    pub fn update_body(entity: &Entity) -> Value {
        let schema: &EntitySchema = entity.schema();
        let fields = Self::to_payload(entity, schema.update_keys);
        match schema.container {
            Some(container) => Self::wrap(container, fields),
            None => Value::Object(fields),
        }
    }
}

impl Default for Mapper<'static> {
    fn default() -> Self {
        Self::standard()
    }
}
