//! Entity state as other clients see it, and the per-tick movement policy.

use bytes::Bytes;
use mcc_rs_proto::codec::{encode_packet, to_fixed};
use mcc_rs_proto::packets::{
    AddEntity, ChangeModel, EntityPropertyType, ExtAddEntity2, ExtAddPlayerName,
    ExtRemovePlayerName, OrientationUpdate, PositionOrientationUpdate, PositionUpdate,
    RemoveEntity, SetEntityProperty, Teleport,
};
use mcc_rs_proto::types::{EntityRef, Location};

use crate::broadcast::Variant;

/// Ticks a moving entity may go without an absolute position sync.
pub const SYNC_INTERVAL: u32 = 100;

/// Model every player starts with.
pub const DEFAULT_MODEL: &str = "humanoid";

/// Which packet carries one tick's worth of movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Teleport,
    PositionOrientation,
    Position,
    Orientation,
}

impl Movement {
    /// Pick the packet for a move from `last` to `location`, or `None` if
    /// nothing changed.
    pub fn classify(location: &Location, last: &Location, ticks_since_sync: u32) -> Option<Self> {
        let moved = !location.same_position(last);
        let turned = !location.same_orientation(last);
        if moved {
            let fits = fits_delta(location.x, last.x)
                && fits_delta(location.y, last.y)
                && fits_delta(location.z, last.z);
            if !fits || ticks_since_sync >= SYNC_INTERVAL {
                Some(Self::Teleport)
            } else if turned {
                Some(Self::PositionOrientation)
            } else {
                Some(Self::Position)
            }
        } else if turned {
            Some(Self::Orientation)
        } else {
            None
        }
    }
}

fn fits_delta(current: f32, last: f32) -> bool {
    let delta = to_fixed(current - last);
    (i8::MIN as i64..=i8::MAX as i64).contains(&delta)
}

/// One entity's move, ready to be encoded for each recipient.
#[derive(Debug, Clone, Copy)]
pub struct MovementUpdate {
    pub kind: Movement,
    pub entity_id: u8,
    pub location: Location,
    pub last_location: Location,
}

impl MovementUpdate {
    pub fn packet(&self, extended_positions: bool) -> Bytes {
        match self.kind {
            Movement::Teleport => encode_packet(&Teleport {
                entity: EntityRef::other(self.entity_id),
                location: self.location,
                extended_positions,
            }),
            Movement::PositionOrientation => encode_packet(&PositionOrientationUpdate {
                entity_id: self.entity_id,
                location: self.location,
                last_location: self.last_location,
            }),
            Movement::Position => encode_packet(&PositionUpdate {
                entity_id: self.entity_id,
                location: self.location,
                last_location: self.last_location,
            }),
            Movement::Orientation => encode_packet(&OrientationUpdate {
                entity_id: self.entity_id,
                location: self.location,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: u8,
    pub location: Location,
    /// Location last broadcast to other clients.
    pub last_location: Location,
    pub display_name: String,
    pub list_name: String,
    pub group_name: String,
    pub group_rank: u8,
    pub skin_name: String,
    pub model: String,
    /// Rotation about X, Y and Z in degrees (EntityProperty).
    pub rotation: [i32; 3],
    ticks_since_sync: u32,
}

impl Entity {
    pub fn new(id: u8, name: &str) -> Self {
        Self {
            id,
            location: Location::default(),
            last_location: Location::default(),
            display_name: name.to_string(),
            list_name: name.to_string(),
            group_name: String::new(),
            group_rank: 0,
            skin_name: name.to_string(),
            model: DEFAULT_MODEL.to_string(),
            rotation: [0; 3],
            ticks_since_sync: 0,
        }
    }

    /// Place the entity without producing movement.
    pub fn place(&mut self, location: Location) {
        self.location = location;
        self.last_location = location;
        self.ticks_since_sync = 0;
    }

    /// Advance one tick and return the movement peers have not seen yet.
    pub fn take_movement(&mut self) -> Option<MovementUpdate> {
        self.ticks_since_sync = self.ticks_since_sync.saturating_add(1);
        let kind = Movement::classify(&self.location, &self.last_location, self.ticks_since_sync)?;
        if kind == Movement::Teleport {
            self.ticks_since_sync = 0;
        }
        let update = MovementUpdate {
            kind,
            entity_id: self.id,
            location: self.location,
            last_location: self.last_location,
        };
        self.last_location = self.location;
        Some(update)
    }

    fn reference(&self, variant: Variant) -> EntityRef {
        EntityRef::new(self.id, variant.self_ref)
    }

    /// Spawn packet at the location peers last saw. For the entity's own
    /// client, `variant.self_ref` switches the ID to the self sentinel.
    pub fn spawn_packet(&self, variant: Variant) -> Bytes {
        let location = if variant.self_ref {
            self.location
        } else {
            self.last_location
        };
        if variant.player_list {
            encode_packet(&ExtAddEntity2 {
                entity: self.reference(variant),
                display_name: self.display_name.clone(),
                skin_name: self.skin_name.clone(),
                location,
                extended_positions: variant.extended_positions,
            })
        } else {
            encode_packet(&AddEntity {
                entity: self.reference(variant),
                display_name: self.display_name.clone(),
                location,
                extended_positions: variant.extended_positions,
            })
        }
    }

    pub fn despawn_packet(&self) -> Bytes {
        encode_packet(&RemoveEntity {
            entity: EntityRef::other(self.id),
        })
    }

    pub fn model_packet(&self, variant: Variant) -> Bytes {
        encode_packet(&ChangeModel {
            entity: self.reference(variant),
            model: self.model.clone(),
        })
    }

    pub fn property_packet(&self, variant: Variant, property: EntityPropertyType) -> Bytes {
        encode_packet(&SetEntityProperty {
            entity: self.reference(variant),
            property,
            value: self.rotation[property as usize],
        })
    }

    /// Properties that differ from the default, as a newcomer must see them.
    pub fn changed_properties(&self) -> impl Iterator<Item = EntityPropertyType> + '_ {
        [
            EntityPropertyType::RotationX,
            EntityPropertyType::RotationY,
            EntityPropertyType::RotationZ,
        ]
        .into_iter()
        .filter(|&p| self.rotation[p as usize] != 0)
    }

    /// Tab-list entry. The name ID is the entity ID, except for the
    /// player's own entry.
    pub fn list_add_packet(&self, variant: Variant) -> Bytes {
        encode_packet(&ExtAddPlayerName {
            entity: self.reference(variant),
            player_name: self.display_name.clone(),
            list_name: self.list_name.clone(),
            group_name: self.group_name.clone(),
            group_rank: self.group_rank,
        })
    }

    pub fn list_remove_packet(&self) -> Bytes {
        encode_packet(&ExtRemovePlayerName {
            entity: EntityRef::other(self.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_rs_proto::packets::id;

    fn at(x: f32, y: f32, z: f32) -> Location {
        Location::new(x, y, z)
    }

    #[test]
    fn no_change_no_movement() {
        let loc = at(1.0, 2.0, 3.0);
        assert_eq!(Movement::classify(&loc, &loc, 5), None);
    }

    #[test]
    fn small_move_is_delta() {
        let last = at(10.0, 10.0, 10.0);
        assert_eq!(
            Movement::classify(&at(10.5, 10.0, 10.0), &last, 1),
            Some(Movement::Position)
        );
        let turned = at(10.5, 10.0, 10.0).with_orientation(90.0, 0.0);
        assert_eq!(
            Movement::classify(&turned, &last, 1),
            Some(Movement::PositionOrientation)
        );
        let look = last.with_orientation(0.0, 45.0);
        assert_eq!(Movement::classify(&look, &last, 1), Some(Movement::Orientation));
    }

    #[test]
    fn large_move_teleports() {
        let last = at(10.0, 10.0, 10.0);
        // 4 units = 128/32, one past i8::MAX.
        assert_eq!(
            Movement::classify(&at(14.0, 10.0, 10.0), &last, 1),
            Some(Movement::Teleport)
        );
        assert_eq!(
            Movement::classify(&at(10.0, 10.0, 6.0), &last, 1),
            Some(Movement::Position)
        );
        assert_eq!(
            Movement::classify(&at(10.0, 10.0, 5.9), &last, 1),
            Some(Movement::Teleport)
        );
    }

    #[test]
    fn periodic_sync_teleports_only_when_moving() {
        let last = at(0.0, 0.0, 0.0);
        assert_eq!(
            Movement::classify(&at(0.5, 0.0, 0.0), &last, SYNC_INTERVAL),
            Some(Movement::Teleport)
        );
        let look = last.with_orientation(10.0, 0.0);
        assert_eq!(
            Movement::classify(&look, &last, SYNC_INTERVAL),
            Some(Movement::Orientation)
        );
    }

    #[test]
    fn take_movement_advances_last_location() {
        let mut entity = Entity::new(3, "alice");
        entity.place(at(5.0, 5.0, 5.0));
        assert!(entity.take_movement().is_none());

        entity.location = at(5.5, 5.0, 5.0);
        let update = entity.take_movement().unwrap();
        assert_eq!(update.kind, Movement::Position);
        assert_eq!(update.last_location, at(5.0, 5.0, 5.0));
        assert_eq!(entity.last_location, entity.location);
        assert!(entity.take_movement().is_none());
    }

    #[test]
    fn movement_packets_have_expected_shapes() {
        let update = MovementUpdate {
            kind: Movement::Teleport,
            entity_id: 9,
            location: at(1.0, 1.0, 1.0),
            last_location: at(0.0, 0.0, 0.0),
        };
        let classic = update.packet(false);
        let extended = update.packet(true);
        assert_eq!(classic[0], id::TELEPORT);
        assert_eq!(classic[1], 9);
        assert_eq!(classic.len(), 10);
        assert_eq!(extended.len(), 16);

        let delta = MovementUpdate {
            kind: Movement::Position,
            ..update
        };
        let bytes = delta.packet(true);
        assert_eq!(&bytes[..], &[id::POSITION_UPDATE, 9, 32, 32, 32]);
    }

    #[test]
    fn spawn_packet_for_self_uses_sentinel() {
        let mut entity = Entity::new(4, "bob");
        entity.place(at(8.0, 9.0, 8.0));
        let own = entity.spawn_packet(Variant {
            self_ref: true,
            ..Variant::default()
        });
        assert_eq!(own[0], id::ADD_ENTITY);
        assert_eq!(own[1], 0xFF);
        let other = entity.spawn_packet(Variant {
            player_list: true,
            ..Variant::default()
        });
        assert_eq!(other[0], id::EXT_ADD_ENTITY2);
        assert_eq!(other[1], 4);
    }

    #[test]
    fn only_changed_properties_are_replayed() {
        let mut entity = Entity::new(2, "dave");
        assert_eq!(entity.changed_properties().count(), 0);
        entity.rotation[1] = 90;
        let changed: Vec<_> = entity.changed_properties().collect();
        assert_eq!(changed, vec![EntityPropertyType::RotationY]);
        let packet = entity.property_packet(Variant::default(), EntityPropertyType::RotationY);
        assert_eq!(&packet[..], &[id::SET_ENTITY_PROPERTY, 2, 1, 0, 0, 0, 90]);
    }

    #[test]
    fn peers_spawn_at_last_broadcast_location() {
        let mut entity = Entity::new(1, "carol");
        entity.place(at(1.0, 1.0, 1.0));
        entity.location = at(2.0, 1.0, 1.0);
        let peer_view = entity.spawn_packet(Variant::default());
        let mut expected = Entity::new(1, "carol");
        expected.place(at(1.0, 1.0, 1.0));
        assert_eq!(peer_view, expected.spawn_packet(Variant::default()));
    }
}
