/// Generic entity storage and the [`Record`] trait implemented by typed models.
///
/// An [`Entity`] is a field map bound to the static schema of its kind. Every
/// assignment goes through the field's declared cast and records the raw
/// value it was given, so callers can always see what was originally set.
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::cast::{self, CastError};
use crate::errors::InvoiceXpressError;
use crate::mapper::Mapper;
use crate::schema::{EntityKind, EntitySchema};
use crate::value::FieldValue;

#[derive(Clone)]
pub struct Entity {
    schema: &'static EntitySchema,
    data: BTreeMap<String, FieldValue>,
    original: BTreeMap<String, FieldValue>,
}

impl Entity {
    /// An empty entity of the given kind, bound to the standard schema.
    pub fn new(kind: EntityKind) -> Self {
        Self::with_schema(kind.schema())
    }

    pub fn with_schema(schema: &'static EntitySchema) -> Self {
        Self {
            schema,
            data: BTreeMap::new(),
            original: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    // -----------------------------------------------------------------------
    // Assignment
    // -----------------------------------------------------------------------

    /// Assign `key`, applying its declared cast. Null removes the field.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<&mut Self, CastError> {
        let raw = value.into();
        self.original.insert(key.to_string(), raw.clone());
        if raw.is_null() {
            self.data.remove(key);
            return Ok(self);
        }
        let typed = match self.schema.cast_for(key) {
            Some(kind) => cast::cast(raw, kind)?,
            None => raw,
        };
        self.data.insert(key.to_string(), typed);
        Ok(self)
    }

    /// Like [`Entity::set`] but never fails: a value the cast rejects is kept raw.
    pub fn put(&mut self, key: &str, value: impl Into<FieldValue>) -> &mut Self {
        let raw = value.into();
        self.original.insert(key.to_string(), raw.clone());
        if raw.is_null() {
            self.data.remove(key);
            return self;
        }
        let typed = match self.schema.cast_for(key) {
            Some(kind) => cast::coerce(raw, kind),
            None => raw,
        };
        self.data.insert(key.to_string(), typed);
        self
    }

    /// Store without casting. Used for nested entities and setter output.
    pub(crate) fn store(&mut self, key: &str, value: FieldValue) -> &mut Self {
        self.original.insert(key.to_string(), value.clone());
        if value.is_null() {
            self.data.remove(key);
        } else {
            self.data.insert(key.to_string(), value);
        }
        self
    }

    pub fn unset(&mut self, key: &str) -> Option<FieldValue> {
        self.data.remove(key)
    }

    /// Copy every field of `other` over this entity, keeping fields it lacks.
    pub fn overlay(&mut self, other: &Entity) -> &mut Self {
        for (k, v) in &other.data {
            self.data.insert(k.clone(), v.clone());
        }
        for (k, v) in &other.original {
            self.original.insert(k.clone(), v.clone());
        }
        self
    }

    /// Replace this entity's fields with `other`'s, merging originals.
    pub fn absorb(&mut self, other: Entity) {
        self.data = other.data;
        self.original.extend(other.original);
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.data.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// The last raw value assigned to `key`, before any cast.
    pub fn original(&self, key: &str) -> Option<&FieldValue> {
        self.original.get(key)
    }

    /// Scalar field rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Entity(_) | FieldValue::List(_) | FieldValue::Json(_) => None,
            other => match other.to_json() {
                Value::String(s) => Some(s),
                Value::Null => None,
                v => Some(v.to_string()),
            },
        }
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(FieldValue::as_i64)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(FieldValue::as_f64)
    }

    /// Booleans, plus the service's 0/1 integer flags.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.data.get(key)? {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Integer(i) => Some(*i != 0),
            FieldValue::Text(s) => match s.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn entity(&self, key: &str) -> Option<&Entity> {
        self.data.get(key).and_then(FieldValue::as_entity)
    }

    pub fn entity_mut(&mut self, key: &str) -> Option<&mut Entity> {
        self.data.get_mut(key).and_then(FieldValue::as_entity_mut)
    }

    /// Entities held by a list field, in order. A single nested entity counts
    /// as a one-element list.
    pub fn entities(&self, key: &str) -> Vec<&Entity> {
        match self.data.get(key) {
            Some(FieldValue::List(items)) => items.iter().filter_map(FieldValue::as_entity).collect(),
            Some(FieldValue::Entity(e)) => vec![e],
            _ => Vec::new(),
        }
    }

    pub fn id(&self) -> Option<&FieldValue> {
        self.data.get(self.schema.id_field)
    }

    pub fn id_string(&self) -> Option<String> {
        self.text(self.schema.id_field)
    }

    pub fn set_id(&mut self, id: impl Into<FieldValue>) -> &mut Self {
        let id_field = self.schema.id_field;
        self.put(id_field, id)
    }

    /// A numeric id means the entity exists remotely.
    pub fn is_created(&self) -> bool {
        match self.id() {
            Some(FieldValue::Integer(_)) => true,
            Some(FieldValue::Float(f)) => f.is_finite(),
            Some(FieldValue::Text(s)) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
            _ => false,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    /// All fields rendered to wire JSON.
    pub fn to_map(&self) -> Map<String, Value> {
        self.data
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// The entity as a JSON object; `{}` when it has no fields.
    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Only the listed fields, in wire form.
    pub fn only(&self, keys: &[&str]) -> Map<String, Value> {
        self.data
            .iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// A new entity of the same kind holding only the listed fields.
    pub fn project(&self, keys: &[&str]) -> Entity {
        let mut projected = Entity::with_schema(self.schema);
        for (k, v) in &self.data {
            if keys.contains(&k.as_str()) {
                projected.store(k, v.clone());
            }
        }
        projected
    }

    /// Every field except the listed ones, in wire form.
    pub fn except(&self, keys: &[&str]) -> Map<String, Value> {
        self.data
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.schema.kind == other.schema.kind && self.data == other.data
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.schema.kind)
            .field("data", &self.data)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// A typed view over an [`Entity`] of a fixed kind.
pub trait Record: Sized {
    const KIND: EntityKind;

    /// Wrap an entity. The caller guarantees the kind matches.
    fn from_entity(entity: Entity) -> Self;
    fn entity(&self) -> &Entity;
    fn entity_mut(&mut self) -> &mut Entity;
    fn into_entity(self) -> Entity;

    fn empty() -> Self {
        Self::from_entity(Entity::new(Self::KIND))
    }

    /// Populate from a wire payload wrapped in this kind's container.
    fn from_payload(payload: &Value) -> Result<Self, InvoiceXpressError> {
        Mapper::standard()
            .from_payload(Self::KIND, payload)
            .map(Self::from_entity)
    }

    /// Populate from an already unwrapped field map.
    fn from_fields(fields: &Value) -> Result<Self, InvoiceXpressError> {
        Mapper::standard()
            .from_fields(Self::KIND, fields)
            .map(Self::from_entity)
    }

    /// Populate from JSON text, with the same container rules as `from_payload`.
    fn from_json(json: &str) -> Result<Self, InvoiceXpressError> {
        Mapper::standard()
            .from_json(Self::KIND, json)
            .map(Self::from_entity)
    }

    fn to_value(&self) -> Value {
        self.entity().to_value()
    }

    fn to_json(&self) -> String {
        self.entity().to_json()
    }

    /// Create-whitelisted, non-falsy fields.
    fn create_payload(&self) -> Map<String, Value> {
        Mapper::to_payload(self.entity(), self.entity().schema().create_keys)
    }

    /// Update-whitelisted, non-falsy fields.
    fn update_payload(&self) -> Map<String, Value> {
        Mapper::to_payload(self.entity(), self.entity().schema().update_keys)
    }

    fn id(&self) -> Option<String> {
        self.entity().id_string()
    }

    fn is_created(&self) -> bool {
        self.entity().is_created()
    }

    /// The last raw value assigned to `key`.
    fn original(&self, key: &str) -> Option<&FieldValue> {
        self.entity().original(key)
    }
}

/// Implements [`Record`] plus the conversions every typed model shares.
macro_rules! record {
    ($ty:ident, $kind:expr) => {
        impl $crate::entity::Record for $ty {
            const KIND: $crate::schema::EntityKind = $kind;

            fn from_entity(entity: $crate::entity::Entity) -> Self {
                Self(entity)
            }

            fn entity(&self) -> &$crate::entity::Entity {
                &self.0
            }

            fn entity_mut(&mut self) -> &mut $crate::entity::Entity {
                &mut self.0
            }

            fn into_entity(self) -> $crate::entity::Entity {
                self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                <Self as $crate::entity::Record>::empty()
            }
        }

        impl From<$ty> for $crate::value::FieldValue {
            fn from(record: $ty) -> Self {
                $crate::value::FieldValue::Entity(Box::new(record.0))
            }
        }

        impl $ty {
            pub fn new() -> Self {
                Self::default()
            }

            /// Assign an arbitrary field through its declared cast.
            pub fn set(
                &mut self,
                key: &str,
                value: impl Into<$crate::value::FieldValue>,
            ) -> Result<&mut Self, $crate::cast::CastError> {
                self.0.set(key, value)?;
                Ok(self)
            }

            pub fn get(&self, key: &str) -> Option<&$crate::value::FieldValue> {
                self.0.get(key)
            }

            pub fn set_id(&mut self, id: impl Into<$crate::value::FieldValue>) -> &mut Self {
                self.0.set_id(id);
                self
            }
        }
    };
}

pub(crate) use record;
