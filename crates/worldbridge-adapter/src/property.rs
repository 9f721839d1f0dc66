use crate::binding::{NativeAxisKind, NativeStates};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};
use worldbridge_common::{BridgeError, Direction, Result};

/// One typed axis of block state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Boolean { name: String },
    Integer { name: String, values: Vec<i32> },
    Enum { name: String, values: Vec<String> },
    Directional { name: String, values: Vec<Direction> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Enum(String),
    Direction(Direction),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::Enum(v) => f.write_str(v),
            PropertyValue::Direction(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered property set of one block type.
pub type PropertyMap = BTreeMap<String, Property>;

impl Property {
    pub fn name(&self) -> &str {
        match self {
            Property::Boolean { name }
            | Property::Integer { name, .. }
            | Property::Enum { name, .. }
            | Property::Directional { name, .. } => name,
        }
    }

    /// Legal values, in host order.
    pub fn values(&self) -> Vec<PropertyValue> {
        match self {
            Property::Boolean { .. } => vec![PropertyValue::Bool(false), PropertyValue::Bool(true)],
            Property::Integer { values, .. } => {
                values.iter().copied().map(PropertyValue::Int).collect()
            }
            Property::Enum { values, .. } => {
                values.iter().cloned().map(PropertyValue::Enum).collect()
            }
            Property::Directional { values, .. } => {
                values.iter().copied().map(PropertyValue::Direction).collect()
            }
        }
    }

    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (Property::Boolean { .. }, PropertyValue::Bool(_)) => true,
            (Property::Integer { values, .. }, PropertyValue::Int(v)) => values.contains(v),
            (Property::Enum { values, .. }, PropertyValue::Enum(v)) => values.contains(v),
            (Property::Directional { values, .. }, PropertyValue::Direction(v)) => {
                values.contains(v)
            }
            _ => false,
        }
    }

    fn from_native(block: &str, name: String, kind: NativeAxisKind) -> Result<Property> {
        Ok(match kind {
            NativeAxisKind::Boolean => Property::Boolean { name },
            NativeAxisKind::Integer(values) => Property::Integer { name, values },
            NativeAxisKind::Enum(values) => Property::Enum { name, values },
            NativeAxisKind::Direction(values) => Property::Directional { name, values },
            NativeAxisKind::Unrecognized(kind) => {
                return Err(BridgeError::UnsupportedPropertyKind {
                    block: block.to_owned(),
                    property: name,
                    kind,
                })
            }
        })
    }
}

/// Per block type property cache, filled on first use.
#[derive(Default)]
pub struct PropertyRegistry {
    cache: RwLock<HashMap<String, Arc<PropertyMap>>>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn properties_of<S: NativeStates>(&self, states: &S, block_type: &str) -> Result<Arc<PropertyMap>> {
        if let Some(cached) = self.cache.read().ok().and_then(|c| c.get(block_type).cloned()) {
            return Ok(cached);
        }

        let axes = states
            .state_axes(block_type)
            .ok_or_else(|| BridgeError::UnknownBlockType(block_type.to_owned()))?;
        let mut properties = PropertyMap::new();
        for axis in axes {
            let property = Property::from_native(block_type, axis.name, axis.kind)?;
            properties.insert(property.name().to_owned(), property);
        }

        let properties = Arc::new(properties);
        if let Ok(mut cache) = self.cache.write() {
            cache
                .entry(block_type.to_owned())
                .or_insert_with(|| properties.clone());
        }
        Ok(properties)
    }

    /// Folds `values` onto `state` one axis at a time.
    pub fn apply<S: NativeStates>(
        &self,
        states: &S,
        block_type: &str,
        mut state: S::State,
        values: &BTreeMap<String, PropertyValue>,
    ) -> Result<S::State> {
        let properties = self.properties_of(states, block_type)?;
        for (name, value) in values {
            let property = properties
                .get(name)
                .ok_or_else(|| BridgeError::UnknownProperty {
                    block: block_type.to_owned(),
                    property: name.clone(),
                })?;
            let illegal = || BridgeError::IllegalPropertyValue {
                property: name.clone(),
                value: value.to_string(),
            };
            if !property.accepts(value) {
                return Err(illegal());
            }
            state = states.with_property(&state, name, value).ok_or_else(illegal)?;
        }
        Ok(state)
    }

    pub fn read_back<S: NativeStates>(&self, states: &S, state: &S::State) -> BTreeMap<String, PropertyValue> {
        states.property_values(state).into_iter().collect()
    }
}
