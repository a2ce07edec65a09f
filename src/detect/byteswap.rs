//! Fixed-width reads from raw header bytes.
//!
//! Values are loaded in host order and swapped when the file's declared byte
//! order differs. Every function returns `None` when the field would run past
//! the end of the buffer, so callers can treat truncation as data.

use super::Endianness;

pub fn read_u16_swapped(bytes: &[u8], offset: usize, order: Endianness) -> Option<u16> {
    let raw: [u8; 2] = bytes.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
    let value = u16::from_ne_bytes(raw);
    Some(if order.needs_swap() {
        value.swap_bytes()
    } else {
        value
    })
}

pub fn read_u32_swapped(bytes: &[u8], offset: usize, order: Endianness) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    let value = u32::from_ne_bytes(raw);
    Some(if order.needs_swap() {
        value.swap_bytes()
    } else {
        value
    })
}

/// BigTIFF offsets and counts.
pub fn read_u64_swapped(bytes: &[u8], offset: usize, order: Endianness) -> Option<u64> {
    let raw: [u8; 8] = bytes.get(offset..offset.checked_add(8)?)?.try_into().ok()?;
    let value = u64::from_ne_bytes(raw);
    Some(if order.needs_swap() {
        value.swap_bytes()
    } else {
        value
    })
}
