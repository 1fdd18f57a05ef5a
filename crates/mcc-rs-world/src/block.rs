//! Block catalog: classic IDs 0-49 and the CustomBlocks level 1 additions
//! 50-65, each with a classic fallback for clients that lack the extension.

/// A block type ID as stored in a level and sent on the wire.
pub type BlockId = u8;

pub const AIR: BlockId = 0;
pub const STONE: BlockId = 1;
pub const GRASS: BlockId = 2;
pub const DIRT: BlockId = 3;
pub const COBBLESTONE: BlockId = 4;
pub const WOOD: BlockId = 5;
pub const SAPLING: BlockId = 6;
pub const BEDROCK: BlockId = 7;
pub const ACTIVE_WATER: BlockId = 8;
pub const WATER: BlockId = 9;
pub const ACTIVE_LAVA: BlockId = 10;
pub const LAVA: BlockId = 11;
pub const SAND: BlockId = 12;
pub const GLASS: BlockId = 20;
pub const OBSIDIAN: BlockId = 49;

/// Highest classic block ID.
pub const MAX_CLASSIC_BLOCK: BlockId = 49;

/// Highest block ID with CustomBlocks level 1.
pub const MAX_CUSTOM_BLOCK: BlockId = 65;

/// Properties for a single block type.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub name: &'static str,
    /// Classic block shown to clients without CustomBlocks.
    pub fallback: BlockId,
}

const fn classic(name: &'static str, id: BlockId) -> BlockInfo {
    BlockInfo { name, fallback: id }
}

const fn custom(name: &'static str, fallback: BlockId) -> BlockInfo {
    BlockInfo { name, fallback }
}

static BLOCK_DATA: [BlockInfo; MAX_CUSTOM_BLOCK as usize + 1] = [
    classic("Air", 0),
    classic("Stone", 1),
    classic("Grass", 2),
    classic("Dirt", 3),
    classic("Cobblestone", 4),
    classic("Wood", 5),
    classic("Sapling", 6),
    classic("Bedrock", 7),
    classic("Active Water", 8),
    classic("Water", 9),
    classic("Active Lava", 10),
    classic("Lava", 11),
    classic("Sand", 12),
    classic("Gravel", 13),
    classic("Gold Ore", 14),
    classic("Iron Ore", 15),
    classic("Coal Ore", 16),
    classic("Log", 17),
    classic("Leaves", 18),
    classic("Sponge", 19),
    classic("Glass", 20),
    classic("Red", 21),
    classic("Orange", 22),
    classic("Yellow", 23),
    classic("Lime", 24),
    classic("Green", 25),
    classic("Teal", 26),
    classic("Aqua", 27),
    classic("Cyan", 28),
    classic("Blue", 29),
    classic("Indigo", 30),
    classic("Violet", 31),
    classic("Magenta", 32),
    classic("Pink", 33),
    classic("Black", 34),
    classic("Gray", 35),
    classic("White", 36),
    classic("Dandelion", 37),
    classic("Rose", 38),
    classic("Brown Mushroom", 39),
    classic("Red Mushroom", 40),
    classic("Gold", 41),
    classic("Iron", 42),
    classic("Double Slab", 43),
    classic("Slab", 44),
    classic("Brick", 45),
    classic("TNT", 46),
    classic("Bookshelf", 47),
    classic("Mossy Rocks", 48),
    classic("Obsidian", 49),
    custom("Cobblestone Slab", 44),
    custom("Rope", 39),
    custom("Sandstone", 12),
    custom("Snow", 0),
    custom("Fire", 10),
    custom("Light Pink", 33),
    custom("Forest Green", 25),
    custom("Brown", 3),
    custom("Deep Blue", 29),
    custom("Turquoise", 28),
    custom("Ice", 20),
    custom("Ceramic Tile", 42),
    custom("Magma", 49),
    custom("Pillar", 36),
    custom("Crate", 5),
    custom("Stone Brick", 1),
];

/// Look up a block's properties.
pub fn info(block: BlockId) -> Option<&'static BlockInfo> {
    BLOCK_DATA.get(block as usize)
}

/// Whether `block` is a known block ID.
pub fn is_valid(block: BlockId) -> bool {
    block <= MAX_CUSTOM_BLOCK
}

/// Classic block to show a client that supports custom blocks up to
/// `support_level` (0 = classic only, 1 = CustomBlocks level 1).
pub fn fallback(block: BlockId, support_level: u8) -> BlockId {
    if support_level >= 1 || block <= MAX_CLASSIC_BLOCK {
        return block;
    }
    info(block).map_or(AIR, |info| info.fallback)
}

/// Case-insensitive lookup by display name or numeric ID.
pub fn parse(name: &str) -> Option<BlockId> {
    if let Ok(id) = name.parse::<BlockId>() {
        return is_valid(id).then_some(id);
    }
    BLOCK_DATA
        .iter()
        .position(|info| info.name.eq_ignore_ascii_case(name))
        .map(|i| i as BlockId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_blocks_fall_back_to_themselves() {
        for id in 0..=MAX_CLASSIC_BLOCK {
            assert_eq!(fallback(id, 0), id);
        }
    }

    #[test]
    fn custom_block_fallbacks() {
        assert_eq!(fallback(50, 0), 44);
        assert_eq!(fallback(53, 0), AIR);
        assert_eq!(fallback(54, 0), ACTIVE_LAVA);
        assert_eq!(fallback(60, 0), GLASS);
        assert_eq!(fallback(65, 0), STONE);
        assert_eq!(fallback(65, 1), 65);
        assert!(BLOCK_DATA.iter().all(|b| b.fallback <= MAX_CLASSIC_BLOCK));
    }

    #[test]
    fn unknown_blocks_become_air() {
        assert!(!is_valid(66));
        assert_eq!(fallback(200, 0), AIR);
        assert!(info(66).is_none());
    }

    #[test]
    fn parse_by_name_or_number() {
        assert_eq!(parse("stone"), Some(STONE));
        assert_eq!(parse("Active Water"), Some(ACTIVE_WATER));
        assert_eq!(parse("49"), Some(OBSIDIAN));
        assert_eq!(parse("99"), None);
        assert_eq!(parse("diamond"), None);
    }
}
