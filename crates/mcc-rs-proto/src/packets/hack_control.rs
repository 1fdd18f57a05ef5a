//! HackControl (0x20) — Server → Client.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;

/// Client-side movement permissions. A jump height of -1 restores the
/// client default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HackControl {
    pub flying: bool,
    pub no_clip: bool,
    pub speeding: bool,
    pub spawn_control: bool,
    pub third_person_view: bool,
    pub jump_height: i16,
}

impl Default for HackControl {
    fn default() -> Self {
        Self {
            flying: true,
            no_clip: true,
            speeding: true,
            spawn_control: true,
            third_person_view: true,
            jump_height: -1,
        }
    }
}

impl ProtoEncode for HackControl {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.flying as u8);
        buf.put_u8(self.no_clip as u8);
        buf.put_u8(self.speeding as u8);
        buf.put_u8(self.spawn_control as u8);
        buf.put_u8(self.third_person_view as u8);
        buf.put_i16(self.jump_height);
    }
}

impl Packet for HackControl {
    const ID: u8 = id::HACK_CONTROL;
}
