use crate::binding::{NativeEntities, NativeTags};
use crate::codec::TagCodec;
use worldbridge_common::{Location, Result};
use worldbridge_nbt::Tag;

/// Identity keys that must not be copied onto a new entity.
pub const NO_COPY_KEYS: [&str; 7] = [
    "UUID",
    "UUIDMost",
    "UUIDLeast",
    "WorldUUIDMost",
    "WorldUUIDLeast",
    "PersistentIDMSB",
    "PersistentIDLSB",
];

/// Type id and saved tag of a live entity. `None` for entities the host
/// cannot name, such as players.
pub fn read_entity<T, E>(codec: &TagCodec<'_, T>, entities: &E, entity: &E::Entity) -> Result<Option<(String, Tag)>>
where
    T: NativeTags,
    E: NativeEntities<Node = T::Node>,
{
    let Some(type_id) = entities.entity_type(entity) else {
        return Ok(None);
    };
    let tag = codec.to_stable(&entities.save_entity(entity))?;
    Ok(Some((type_id, tag)))
}

/// Spawns a copy of `tag` as a fresh entity of `type_id` at `location`.
/// Returns `None` if the host does not know the type or refuses to add it.
/// A tag with mixed-kind lists is refused before anything is created.
pub fn create_entity<T, E>(
    codec: &TagCodec<'_, T>,
    entities: &mut E,
    location: &Location,
    type_id: &str,
    tag: Option<&Tag>,
) -> Result<Option<E::Entity>>
where
    T: NativeTags,
    E: NativeEntities<Node = T::Node>,
{
    if let Some(tag) = tag {
        codec.check_writable(tag)?;
    }
    let Some(entity) = entities.create_entity(type_id) else {
        return Ok(None);
    };

    if let Some(tag) = tag {
        let mut tag = tag.clone();
        if let Some(map) = tag.as_compound_mut() {
            for key in NO_COPY_KEYS {
                map.remove(key);
            }
        }
        entities.load_entity(&entity, codec.from_stable(&tag));
    }

    entities.place_entity(&entity, location);
    Ok(entities.add_entity(&entity).then_some(entity))
}
