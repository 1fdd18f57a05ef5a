//! Classic Protocol Extension (CPE) catalog and per-session negotiation.

use std::fmt;

/// Magic value in the last byte of a client Identification packet that
/// announces CPE support.
pub const CPE_MAGIC: u8 = 0x42;

/// A known protocol extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Extension {
    ClickDistance = 0,
    CustomBlocks,
    HeldBlock,
    ExtPlayerList,
    LongerMessages,
    SelectionCuboid,
    ChangeModel,
    EnvWeatherType,
    HackControl,
    MessageTypes,
    PlayerClick,
    BulkBlockUpdate,
    EnvMapAspect,
    EntityProperty,
    ExtEntityPositions,
    TwoWayPing,
    InstantMotd,
    FastMap,
}

/// Catalog entry: extension name and the version this server implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtEntry {
    pub name: &'static str,
    pub version: i32,
}

/// Number of extensions in the catalog.
pub const EXTENSION_COUNT: usize = 18;

/// Every extension this server implements, in catalog order.
pub const EXTENSIONS: [ExtEntry; EXTENSION_COUNT] = [
    ExtEntry { name: "ClickDistance", version: 1 },
    ExtEntry { name: "CustomBlocks", version: 1 },
    ExtEntry { name: "HeldBlock", version: 1 },
    ExtEntry { name: "ExtPlayerList", version: 2 },
    ExtEntry { name: "LongerMessages", version: 1 },
    ExtEntry { name: "SelectionCuboid", version: 1 },
    ExtEntry { name: "ChangeModel", version: 1 },
    ExtEntry { name: "EnvWeatherType", version: 1 },
    ExtEntry { name: "HackControl", version: 1 },
    ExtEntry { name: "MessageTypes", version: 1 },
    ExtEntry { name: "PlayerClick", version: 1 },
    ExtEntry { name: "BulkBlockUpdate", version: 1 },
    ExtEntry { name: "EnvMapAspect", version: 1 },
    ExtEntry { name: "EntityProperty", version: 1 },
    ExtEntry { name: "ExtEntityPositions", version: 1 },
    ExtEntry { name: "TwoWayPing", version: 1 },
    ExtEntry { name: "InstantMOTD", version: 1 },
    ExtEntry { name: "FastMap", version: 1 },
];

impl Extension {
    pub const ALL: [Extension; EXTENSION_COUNT] = [
        Extension::ClickDistance,
        Extension::CustomBlocks,
        Extension::HeldBlock,
        Extension::ExtPlayerList,
        Extension::LongerMessages,
        Extension::SelectionCuboid,
        Extension::ChangeModel,
        Extension::EnvWeatherType,
        Extension::HackControl,
        Extension::MessageTypes,
        Extension::PlayerClick,
        Extension::BulkBlockUpdate,
        Extension::EnvMapAspect,
        Extension::EntityProperty,
        Extension::ExtEntityPositions,
        Extension::TwoWayPing,
        Extension::InstantMotd,
        Extension::FastMap,
    ];

    /// Catalog entry for this extension.
    pub fn entry(self) -> &'static ExtEntry {
        &EXTENSIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    /// Look up an extension by its wire name (exact match).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ext| ext.name() == name)
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The extensions one session negotiated, fixed for the session's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet {
    versions: [Option<i32>; EXTENSION_COUNT],
}

impl ExtensionSet {
    /// A set with nothing negotiated (plain classic client).
    pub fn none() -> Self {
        Self::default()
    }

    /// A set with every extension at the catalog version.
    pub fn all() -> Self {
        let mut set = Self::default();
        for ext in Extension::ALL {
            set.versions[ext as usize] = Some(ext.entry().version);
        }
        set
    }

    /// Intersect the client's advertised `(name, version)` pairs with the catalog.
    ///
    /// Unknown names and non-positive versions are ignored; the negotiated
    /// version is the lower of the two sides.
    pub fn negotiate<'a, I>(advertised: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i32)>,
    {
        let mut set = Self::default();
        for (name, version) in advertised {
            let Some(ext) = Extension::from_name(name) else {
                continue;
            };
            if version < 1 {
                continue;
            }
            set.versions[ext as usize] = Some(version.min(ext.entry().version));
        }
        set
    }

    /// Negotiated version of `ext`, if any.
    pub fn version(&self, ext: Extension) -> Option<i32> {
        self.versions[ext as usize]
    }

    /// Whether packets gated by `ext` may be sent: negotiated at the version
    /// whose wire format this server implements.
    pub fn supports(&self, ext: Extension) -> bool {
        self.version(ext) == Some(ext.entry().version)
    }

    /// Number of negotiated extensions.
    pub fn len(&self) -> usize {
        self.versions.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate negotiated extensions with their versions.
    pub fn iter(&self) -> impl Iterator<Item = (Extension, i32)> + '_ {
        Extension::ALL
            .iter()
            .filter_map(|&ext| self.version(ext).map(|v| (ext, v)))
    }
}
