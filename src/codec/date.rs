// Packed decimal date representation used by DATE fields
//
// A date is stored as the integer day * 1_000_000 + month * 10_000 + year,
// e.g. 4 March 2021 -> 4_032_021.

use crate::tree::PackedDate;

const DAY_FACTOR: u32 = 1_000_000;
const MONTH_FACTOR: u32 = 10_000;

/// Packs a date into its decimal integer form. Out-of-range components wrap.
pub fn pack_date(date: &PackedDate) -> u32 {
    u32::from(date.day)
        .wrapping_mul(DAY_FACTOR)
        .wrapping_add(u32::from(date.month).wrapping_mul(MONTH_FACTOR))
        .wrapping_add(u32::from(date.year))
}

/// Divides a packed integer back out into day, month and year.
pub fn unpack_date(packed: u32) -> PackedDate {
    let day = packed / DAY_FACTOR;
    let month = packed / MONTH_FACTOR - day * 100;
    let year = packed - day * DAY_FACTOR - month * MONTH_FACTOR;
    PackedDate::new(day as u16, month as u16, year as u16)
}
