//! Environment packets: EnvSetWeatherType (0x1F), SetMapEnvUrl (0x28) and
//! SetMapEnvProperty (0x29) — Server → Client.

use bytes::BufMut;

use crate::codec::{self, Packet, ProtoEncode};
use crate::packets::id;

#[derive(Debug, Clone, Copy)]
pub struct EnvSetWeatherType {
    /// 0 sunny, 1 raining, 2 snowing.
    pub weather: u8,
}

impl ProtoEncode for EnvSetWeatherType {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.weather);
    }
}

impl Packet for EnvSetWeatherType {
    const ID: u8 = id::ENV_SET_WEATHER_TYPE;
}

/// Texture pack URL; empty resets to the default textures.
#[derive(Debug, Clone)]
pub struct SetMapEnvUrl {
    pub url: String,
}

impl ProtoEncode for SetMapEnvUrl {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        codec::write_string(buf, &self.url);
    }
}

impl Packet for SetMapEnvUrl {
    const ID: u8 = id::SET_MAP_ENV_URL;
}

/// EnvMapAspect property selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EnvProperty {
    SideBlock = 0,
    EdgeBlock = 1,
    EdgeHeight = 2,
    CloudHeight = 3,
    MaxViewDistance = 4,
    CloudSpeed = 5,
    WeatherSpeed = 6,
    WeatherFade = 7,
    ExpFog = 8,
    SideOffset = 9,
}

#[derive(Debug, Clone, Copy)]
pub struct SetMapEnvProperty {
    pub property: EnvProperty,
    pub value: i32,
}

impl ProtoEncode for SetMapEnvProperty {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.property as u8);
        buf.put_i32(self.value);
    }
}

impl Packet for SetMapEnvProperty {
    const ID: u8 = id::SET_MAP_ENV_PROPERTY;
}
