use crate::property::PropertyValue;
use std::collections::BTreeMap;
use worldbridge_nbt::Tag;

/// A block in the stable model: type, property values and optional
/// block-entity metadata.
///
/// Blocks read from a world carry the host's numeric state id. Any change to
/// the type or properties drops it, so a cached id always matches the rest of
/// the holder.
#[derive(Debug, Clone)]
pub struct BlockStateHolder {
    block_type: String,
    properties: BTreeMap<String, PropertyValue>,
    nbt: Option<Tag>,
    internal_id: Option<u32>,
}

impl BlockStateHolder {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            properties: BTreeMap::new(),
            nbt: None,
            internal_id: None,
        }
    }

    pub(crate) fn from_host(
        block_type: String,
        properties: BTreeMap<String, PropertyValue>,
        internal_id: u32,
    ) -> Self {
        Self {
            block_type,
            properties,
            nbt: None,
            internal_id: Some(internal_id),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self.internal_id = None;
        self
    }

    /// Metadata must be a compound; anything else is ignored.
    pub fn with_nbt(mut self, nbt: Tag) -> Self {
        self.nbt = matches!(nbt, Tag::Compound(_)).then_some(nbt);
        self
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn nbt(&self) -> Option<&Tag> {
        self.nbt.as_ref()
    }

    pub fn internal_id(&self) -> Option<u32> {
        self.internal_id
    }

    /// Same type and properties, ignoring metadata and cached id.
    pub fn same_state(&self, other: &BlockStateHolder) -> bool {
        self.block_type == other.block_type && self.properties == other.properties
    }
}

/// The cached state id is not part of a block's identity.
impl PartialEq for BlockStateHolder {
    fn eq(&self, other: &Self) -> bool {
        self.same_state(other) && self.nbt == other.nbt
    }
}
