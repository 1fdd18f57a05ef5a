use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub name: String,
    #[serde(default)]
    pub motd: String,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    /// Informational only; there is no heartbeat.
    #[serde(default)]
    pub public: bool,
}

fn default_address() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_max_players() -> u32 {
    32
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_main_level")]
    pub main_level: String,
    /// Directory holding `<level>.lvl` files.
    #[serde(default = "default_level_directory")]
    pub directory: String,
    /// Generator used when the main level does not exist yet.
    #[serde(default = "default_generator")]
    pub generator: String,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_length")]
    pub length: usize,
    /// Auto-save interval in seconds. 0 = disabled. Default: 300 (5 minutes).
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: u64,
    /// Largest block count `/newlvl` will generate.
    #[serde(default = "default_max_volume")]
    pub max_volume: usize,
}

fn default_main_level() -> String {
    "main".into()
}

fn default_level_directory() -> String {
    "levels".into()
}

fn default_generator() -> String {
    "flat".into()
}

fn default_width() -> usize {
    128
}

fn default_height() -> usize {
    64
}

fn default_length() -> usize {
    128
}

fn default_auto_save_interval() -> u64 {
    300
}

fn default_max_volume() -> usize {
    512 * 512 * 512
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            main_level: default_main_level(),
            directory: default_level_directory(),
            generator: default_generator(),
            width: default_width(),
            height: default_height(),
            length: default_length(),
            auto_save_interval: default_auto_save_interval(),
            max_volume: default_max_volume(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkSection {
    /// Seconds a client has to finish the handshake.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout: u64,
    /// Seconds between keep-alive pings.
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_ping_interval() -> u64 {
    1
}

fn default_tick_interval_ms() -> u64 {
    50
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            handshake_timeout: default_handshake_timeout(),
            ping_interval: default_ping_interval(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl NetworkSection {
    /// Ticks between keep-alive pings, never less than one.
    pub fn ping_ticks(&self) -> u64 {
        (self.ping_interval * 1000 / self.tick_interval_ms.max(1)).max(1)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// A config with every optional setting at its default.
    #[cfg(test)]
    pub fn with_name(name: &str) -> Self {
        Self {
            server: ServerSection {
                address: default_address(),
                port: default_port(),
                name: name.to_string(),
                motd: String::new(),
                max_players: default_max_players(),
                public: false,
            },
            world: WorldSection::default(),
            network: NetworkSection::default(),
            logging: LoggingSection::default(),
        }
    }
}
