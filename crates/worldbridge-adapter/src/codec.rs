use crate::binding::{NativeTags, NativeValue, NativeView};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use worldbridge_common::{BridgeError, Result};
use worldbridge_logger::{log, LogSeverity::Warning};
use worldbridge_nbt::Tag;

/// What to do with a native list whose elements cannot be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListPolicy {
    /// Log a warning and substitute an empty list.
    #[default]
    Degrade,
    Fail,
}

/// Converts between the stable [`Tag`] model and a host's tag tree.
///
/// Holds no state of its own, so one codec may be shared across threads as
/// long as the native trees it reads are not being mutated meanwhile.
pub struct TagCodec<'a, T: NativeTags> {
    tags: &'a T,
    list_policy: ListPolicy,
}

impl<'a, T: NativeTags> TagCodec<'a, T> {
    pub fn new(tags: &'a T, list_policy: ListPolicy) -> Self {
        Self { tags, list_policy }
    }

    pub fn to_stable(&self, native: &T::Node) -> Result<Tag> {
        Ok(match self.tags.inspect(native) {
            NativeView::End => Tag::End,
            NativeView::Byte(v) => Tag::Byte(v),
            NativeView::Short(v) => Tag::Short(v),
            NativeView::Int(v) => Tag::Int(v),
            NativeView::Long(v) => Tag::Long(v),
            NativeView::Float(v) => Tag::Float(v),
            NativeView::Double(v) => Tag::Double(v),
            NativeView::ByteArray(v) => Tag::ByteArray(v.to_vec()),
            NativeView::IntArray(v) => Tag::IntArray(v.to_vec()),
            NativeView::LongArray(v) => Tag::LongArray(v.to_vec()),
            NativeView::String(v) => Tag::String(v.to_owned()),
            NativeView::List => self.list_to_stable(native)?,
            NativeView::Compound(entries) => {
                let mut values = HashMap::with_capacity(entries.len());
                for (key, child) in entries {
                    values.insert(key.to_owned(), self.to_stable(child)?);
                }
                Tag::Compound(values)
            }
            NativeView::Unrecognized(kind) => return Err(BridgeError::UnsupportedTagKind(kind)),
        })
    }

    fn list_to_stable(&self, native: &T::Node) -> Result<Tag> {
        let recovered = self.tags.list_elements(native).and_then(|elements| {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                match self.to_stable(element) {
                    Ok(tag) => values.push(tag),
                    // never downgrade a fatal error into a lossy list
                    Err(err @ BridgeError::UnsupportedTagKind(_)) => return Ok(Err(err)),
                    Err(err) => return Err(err.to_string()),
                }
            }
            Ok(Ok(Tag::list(values).ok_or_else(|| "elements differ in kind".to_owned())))
        });

        match recovered {
            Ok(Ok(Ok(list))) => Ok(list),
            Ok(Err(fatal)) => Err(fatal),
            Ok(Ok(Err(reason))) | Err(reason) => match self.list_policy {
                ListPolicy::Degrade => {
                    log(format!("Failed to convert native list tag: {}", reason), Warning);
                    Ok(Tag::List(Vec::new()))
                }
                ListPolicy::Fail => Err(BridgeError::MalformedList(reason)),
            },
        }
    }

    /// Refuses trees holding a list of mixed element kinds. Hosts store such a
    /// list without complaint and lose it on the next read.
    pub fn check_writable(&self, tag: &Tag) -> Result<()> {
        if tag.is_well_formed() {
            Ok(())
        } else {
            Err(BridgeError::MalformedList(
                "list elements differ in kind".to_owned(),
            ))
        }
    }

    pub fn from_stable(&self, tag: &Tag) -> T::Node {
        let value = match tag {
            Tag::End => NativeValue::End,
            Tag::Byte(v) => NativeValue::Byte(*v),
            Tag::Short(v) => NativeValue::Short(*v),
            Tag::Int(v) => NativeValue::Int(*v),
            Tag::Long(v) => NativeValue::Long(*v),
            Tag::Float(v) => NativeValue::Float(*v),
            Tag::Double(v) => NativeValue::Double(*v),
            Tag::ByteArray(v) => NativeValue::ByteArray(v.clone()),
            Tag::IntArray(v) => NativeValue::IntArray(v.clone()),
            Tag::LongArray(v) => NativeValue::LongArray(v.clone()),
            Tag::String(v) => NativeValue::String(v.clone()),
            Tag::List(elements) => {
                NativeValue::List(elements.iter().map(|e| self.from_stable(e)).collect())
            }
            Tag::Compound(map) => NativeValue::Compound(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.from_stable(v)))
                    .collect(),
            ),
        };
        self.tags.build(value)
    }
}
