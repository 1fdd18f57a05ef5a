//! SetPermission (0x0F) — Server → Client.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::identification::{USER_TYPE_NORMAL, USER_TYPE_OP};
use crate::packets::id;

/// Updates the client's user type (operators may break bedrock).
#[derive(Debug, Clone, Copy)]
pub struct SetPermission {
    pub operator: bool,
}

impl ProtoEncode for SetPermission {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(if self.operator {
            USER_TYPE_OP
        } else {
            USER_TYPE_NORMAL
        });
    }
}

impl Packet for SetPermission {
    const ID: u8 = id::SET_PERMISSION;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;

    #[test]
    fn encode_user_type() {
        assert_eq!(&encode_packet(&SetPermission { operator: true })[..], &[0x0F, 0x64]);
        assert_eq!(&encode_packet(&SetPermission { operator: false })[..], &[0x0F, 0x00]);
    }
}
