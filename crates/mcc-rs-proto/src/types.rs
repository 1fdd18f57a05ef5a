//! Value types shared by packets and the world layer.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

/// Entity ID meaning "the recipient's own entity".
pub const SELF_ID: u8 = 0xFF;

/// Highest entity ID that may be allocated to a real entity.
pub const MAX_ENTITY_ID: u8 = 254;

/// How a packet names an entity: its real ID, and whether the packet is
/// addressed to that entity's own client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: u8,
    pub self_ref: bool,
}

impl EntityRef {
    /// Reference to `id` as seen by other clients.
    pub const fn other(id: u8) -> Self {
        Self { id, self_ref: false }
    }

    /// Reference to `id` as seen by its own client.
    pub const fn own(id: u8) -> Self {
        Self { id, self_ref: true }
    }

    pub const fn new(id: u8, self_ref: bool) -> Self {
        Self { id, self_ref }
    }

    /// The byte written to the wire.
    pub const fn wire_id(&self) -> u8 {
        if self.self_ref {
            SELF_ID
        } else {
            self.id
        }
    }
}

/// A position in world units plus orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_orientation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// Whether X, Y and Z are identical.
    pub fn same_position(&self, other: &Location) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }

    /// Whether yaw and pitch are identical.
    pub fn same_orientation(&self, other: &Location) -> bool {
        self.yaw == other.yaw && self.pitch == other.pitch
    }
}

/// Block coordinates as carried by SetBlock packets (unsigned 16-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

impl BlockPos {
    pub const fn new(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z }
    }
}

impl ProtoEncode for BlockPos {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u16(self.x);
        buf.put_u16(self.y);
        buf.put_u16(self.z);
    }
}

impl ProtoDecode for BlockPos {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 6)?;
        Ok(Self {
            x: buf.get_u16(),
            y: buf.get_u16(),
            z: buf.get_u16(),
        })
    }
}

/// An RGBA color used by selection cuboids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// An axis-aligned box of block coordinates, inclusive of `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aabb {
    pub min: BlockPos,
    pub max: BlockPos,
}
