//! Classic and CPE packet definitions.

pub mod add_entity;
pub mod bulk_block_update;
pub mod change_model;
pub mod click_distance;
pub mod client;
pub mod custom_block_support_level;
pub mod entity_movement;
pub mod entity_property;
pub mod env;
pub mod ext_info;
pub mod hack_control;
pub mod hold_this;
pub mod identification;
pub mod kick;
pub mod level_data_chunk;
pub mod level_finalize;
pub mod level_initialize;
pub mod message;
pub mod ping;
pub mod player_clicked;
pub mod player_list;
pub mod remove_entity;
pub mod selection;
pub mod set_block;
pub mod set_permission;
pub mod teleport;
pub mod two_way_ping;

pub use add_entity::{AddEntity, ExtAddEntity2};
pub use bulk_block_update::{BulkBlockUpdate, MAX_BULK_BLOCKS};
pub use change_model::ChangeModel;
pub use click_distance::SetClickDistance;
pub use client::ClientPacket;
pub use custom_block_support_level::{CustomBlockSupportLevel, CUSTOM_BLOCKS_LEVEL};
pub use entity_movement::{OrientationUpdate, PositionOrientationUpdate, PositionUpdate};
pub use entity_property::{EntityPropertyType, SetEntityProperty};
pub use env::{EnvProperty, EnvSetWeatherType, SetMapEnvProperty, SetMapEnvUrl};
pub use ext_info::{ExtEntryPacket, ExtInfo};
pub use hack_control::HackControl;
pub use hold_this::HoldThis;
pub use identification::{ClientIdentification, ServerIdentification};
pub use kick::Kick;
pub use level_data_chunk::{LevelDataChunk, CHUNK_SIZE};
pub use level_finalize::LevelFinalize;
pub use level_initialize::LevelInitialize;
pub use message::{ClientMessage, Message, MessageType};
pub use ping::Ping;
pub use player_clicked::{ClickAction, MouseButton, PlayerClicked};
pub use player_list::{ExtAddPlayerName, ExtRemovePlayerName};
pub use remove_entity::RemoveEntity;
pub use selection::{MakeSelection, RemoveSelection};
pub use set_block::{BlockChangeMode, SetBlock, SetBlockClient};
pub use set_permission::SetPermission;
pub use teleport::{ClientPosition, Teleport};
pub use two_way_ping::{PingDirection, TwoWayPing};

/// Packet message-type tags. These values are fixed by the protocol.
pub mod id {
    pub const IDENTIFICATION: u8 = 0x00;
    pub const PING: u8 = 0x01;
    pub const LEVEL_INITIALIZE: u8 = 0x02;
    pub const LEVEL_DATA_CHUNK: u8 = 0x03;
    pub const LEVEL_FINALIZE: u8 = 0x04;
    pub const SET_BLOCK_CLIENT: u8 = 0x05;
    pub const SET_BLOCK: u8 = 0x06;
    pub const ADD_ENTITY: u8 = 0x07;
    pub const TELEPORT: u8 = 0x08;
    pub const POSITION_ORIENTATION_UPDATE: u8 = 0x09;
    pub const POSITION_UPDATE: u8 = 0x0A;
    pub const ORIENTATION_UPDATE: u8 = 0x0B;
    pub const REMOVE_ENTITY: u8 = 0x0C;
    pub const MESSAGE: u8 = 0x0D;
    pub const KICK: u8 = 0x0E;
    pub const SET_PERMISSION: u8 = 0x0F;

    pub const EXT_INFO: u8 = 0x10;
    pub const EXT_ENTRY: u8 = 0x11;
    pub const SET_CLICK_DISTANCE: u8 = 0x12;
    pub const CUSTOM_BLOCK_SUPPORT_LEVEL: u8 = 0x13;
    pub const HOLD_THIS: u8 = 0x14;
    pub const EXT_ADD_PLAYER_NAME: u8 = 0x16;
    pub const EXT_REMOVE_PLAYER_NAME: u8 = 0x18;
    pub const MAKE_SELECTION: u8 = 0x1A;
    pub const REMOVE_SELECTION: u8 = 0x1B;
    pub const CHANGE_MODEL: u8 = 0x1D;
    pub const ENV_SET_WEATHER_TYPE: u8 = 0x1F;
    pub const HACK_CONTROL: u8 = 0x20;
    pub const EXT_ADD_ENTITY2: u8 = 0x21;
    pub const PLAYER_CLICKED: u8 = 0x22;
    pub const BULK_BLOCK_UPDATE: u8 = 0x26;
    pub const SET_MAP_ENV_URL: u8 = 0x28;
    pub const SET_MAP_ENV_PROPERTY: u8 = 0x29;
    pub const SET_ENTITY_PROPERTY: u8 = 0x2A;
    pub const TWO_WAY_PING: u8 = 0x2B;
}

/// Classic protocol version spoken by this server.
pub const PROTOCOL_VERSION: u8 = 0x07;

/// Check whether a client protocol version is supported.
pub fn is_supported_version(v: u8) -> bool {
    v == PROTOCOL_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_version() {
        assert!(is_supported_version(7));
        assert!(!is_supported_version(6));
        assert!(!is_supported_version(8));
    }

    #[test]
    fn tag_values_are_stable() {
        assert_eq!(id::LEVEL_DATA_CHUNK, 0x03);
        assert_eq!(id::EXT_ADD_ENTITY2, 0x21);
        assert_eq!(id::BULK_BLOCK_UPDATE, 0x26);
        assert_eq!(id::TWO_WAY_PING, 0x2B);
    }
}
