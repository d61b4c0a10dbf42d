//! Arms Race points awarded per trained unit, by unit level.

pub const DEFAULT_UNIT_LEVEL: u8 = 7;

/// Points for `DEFAULT_UNIT_LEVEL`.
const DEFAULT_LEVEL_POINTS: u32 = 22;

const POINTS_PER_LEVEL: [(u8, u32); 11] = [
    (1, 5),
    (2, 6),
    (3, 7),
    (4, 13),
    (5, 15),
    (6, 19),
    (7, 22),
    (8, 25),
    (9, 28),
    (10, 31),
    (11, 34),
];

pub fn points_per_unit(level: u8) -> Option<u32> {
    POINTS_PER_LEVEL
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, points)| *points)
}

/// Unknown levels fall back to the default level's points.
pub fn points_per_unit_or_default(level: u8) -> u32 {
    points_per_unit(level).unwrap_or(DEFAULT_LEVEL_POINTS)
}
