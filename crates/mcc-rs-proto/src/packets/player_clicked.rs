//! PlayerClicked (0x22) — Client → Server.

use bytes::Buf;

use crate::codec::{ensure_remaining, ProtoDecode};
use crate::error::ProtoError;
use crate::types::BlockPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerClicked {
    pub button: MouseButton,
    pub action: ClickAction,
    pub yaw: f32,
    pub pitch: f32,
    /// 255 when no entity is targeted.
    pub target_entity: u8,
    pub target_block: BlockPos,
    pub target_face: u8,
}

impl ProtoDecode for PlayerClicked {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 14)?;
        let button = match buf.get_u8() {
            0 => MouseButton::Left,
            1 => MouseButton::Right,
            2 => MouseButton::Middle,
            other => {
                return Err(ProtoError::InvalidData(format!(
                    "unknown mouse button {other}"
                )))
            }
        };
        let action = match buf.get_u8() {
            0 => ClickAction::Press,
            _ => ClickAction::Release,
        };
        // Angles are sent as 16-bit values where 65536 is a full turn.
        let yaw = buf.get_u16() as f32 * 360.0 / 65536.0;
        let pitch = buf.get_u16() as f32 * 360.0 / 65536.0;
        let target_entity = buf.get_u8();
        let target_block = BlockPos::proto_decode(buf)?;
        let target_face = buf.get_u8();
        Ok(Self {
            button,
            action,
            yaw,
            pitch,
            target_entity,
            target_block,
            target_face,
        })
    }
}
