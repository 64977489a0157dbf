// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Bit-packed cell storage for the Othello arrays.
//!
//! Array A and array B are stored compactly as consecutive fixed-width cells
//! inside a flat `Vec<u64>`; a cell may straddle a word boundary, in which
//! case reads and writes are split across two words. This is the only
//! shifted-mask arithmetic in the crate, so it lives behind a small typed
//! interface and is tested on its own.

/// A flat array of fixed-width cells packed into 64-bit words.
///
/// Cells are `cell_bits` wide (0 to 64). A field accessor additionally
/// addresses a sub-range of a cell, which the Othello control plane uses to
/// touch only the value bits of a cell while leaving digest bits intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitPackedStore {
    words: Vec<u64>,
    cell_bits: u8,
}

/// Lower `width` bits set.
#[inline]
fn low_mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl BitPackedStore {
    /// Creates an empty store of `cell_bits`-wide cells.
    pub fn new(cell_bits: u8) -> Self {
        debug_assert!(cell_bits <= 64);
        Self {
            words: Vec::new(),
            cell_bits,
        }
    }

    /// Cell width in bits.
    pub fn cell_bits(&self) -> u8 {
        self.cell_bits
    }

    /// Resizes the store to hold `cells` cells; new words are zeroed.
    pub fn resize(&mut self, cells: usize) {
        let words = (cells * usize::from(self.cell_bits) + 63) / 64;
        self.words.resize(words, 0);
    }

    /// Zeroes every word without changing capacity.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Reads the cell at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> u64 {
        self.get_field(index, 0, self.cell_bits)
    }

    /// Writes the cell at `index`.
    #[inline]
    pub fn set(&mut self, index: usize, value: u64) {
        self.set_field(index, 0, self.cell_bits, value);
    }

    /// Reads `width` bits starting `bit_offset` bits into the cell at
    /// `index`. The range must lie inside the cell.
    #[inline]
    pub fn get_field(&self, index: usize, bit_offset: u8, width: u8) -> u64 {
        debug_assert!(bit_offset + width <= self.cell_bits);
        if width == 0 {
            return 0;
        }

        let bit = index * usize::from(self.cell_bits) + usize::from(bit_offset);
        let word = bit / 64;
        let shift = (bit % 64) as u32;

        let mut result = self.words[word] >> shift;
        let taken = 64 - shift;
        if taken < u32::from(width) {
            result |= self.words[word + 1] << taken;
        }
        result & low_mask(width)
    }

    /// Writes `width` bits starting `bit_offset` bits into the cell at
    /// `index`. Bits of `value` above `width` are ignored.
    #[inline]
    pub fn set_field(&mut self, index: usize, bit_offset: u8, width: u8, value: u64) {
        debug_assert!(bit_offset + width <= self.cell_bits);
        if width == 0 {
            return;
        }

        let mask = low_mask(width);
        let value = value & mask;

        let bit = index * usize::from(self.cell_bits) + usize::from(bit_offset);
        let word = bit / 64;
        let shift = (bit % 64) as u32;

        self.words[word] &= !(mask << shift);
        self.words[word] |= value << shift;

        let taken = 64 - shift;
        if taken < u32::from(width) {
            let high_mask = low_mask(width - taken as u8);
            self.words[word + 1] &= !high_mask;
            self.words[word + 1] |= value >> taken;
        }
    }

    /// Heap bytes held by the store.
    pub fn memory_bytes(&self) -> usize {
        self.words.capacity() * std::mem::size_of::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1)]
    #[test_case(7)]
    #[test_case(16)]
    #[test_case(17)]
    #[test_case(33)]
    #[test_case(63)]
    #[test_case(64)]
    fn test_round_trip_all_cells(cell_bits: u8) {
        let mut store = BitPackedStore::new(cell_bits);
        store.resize(100);

        let mask = low_mask(cell_bits);
        for i in 0..100usize {
            let v = (0x9e37_79b9_7f4a_7c15u64.wrapping_mul(i as u64 + 1)) & mask;
            store.set(i, v);
        }
        for i in 0..100usize {
            let v = (0x9e37_79b9_7f4a_7c15u64.wrapping_mul(i as u64 + 1)) & mask;
            assert_eq!(store.get(i), v, "cell {i} at width {cell_bits}");
        }
    }

    #[test]
    fn test_word_straddling_write_is_isolated() {
        // 17-bit cells: cell 3 spans bits 51..68, crossing the word boundary.
        let mut store = BitPackedStore::new(17);
        store.resize(8);
        for i in 0..8 {
            store.set(i, 0x1_FFFF);
        }
        store.set(3, 0);
        for i in 0..8 {
            let expected = if i == 3 { 0 } else { 0x1_FFFF };
            assert_eq!(store.get(i), expected, "cell {i}");
        }
    }

    #[test]
    fn test_field_access_preserves_rest_of_cell() {
        // 20-bit cells: 4 digest bits then a 16-bit value field.
        let mut store = BitPackedStore::new(20);
        store.resize(16);

        store.set(5, 0xABCDE);
        assert_eq!(store.get_field(5, 0, 4), 0xE);
        assert_eq!(store.get_field(5, 4, 16), 0xABCD);

        store.set_field(5, 4, 16, 0x1234);
        assert_eq!(store.get(5), 0x1234E);
        assert_eq!(store.get_field(5, 0, 4), 0xE);
    }

    #[test]
    fn test_value_wider_than_field_is_truncated() {
        let mut store = BitPackedStore::new(8);
        store.resize(4);
        store.set(0, 0xFFFF);
        assert_eq!(store.get(0), 0xFF);
        assert_eq!(store.get(1), 0);
    }

    #[test]
    fn test_resize_zeroes_new_cells() {
        let mut store = BitPackedStore::new(13);
        store.resize(4);
        store.set(3, 0x1FFF);
        store.resize(32);
        assert_eq!(store.get(3), 0x1FFF);
        for i in 8..32 {
            assert_eq!(store.get(i), 0);
        }
    }

    #[test]
    fn test_clear() {
        let mut store = BitPackedStore::new(64);
        store.resize(3);
        store.set(1, u64::MAX);
        store.clear();
        assert_eq!(store.get(1), 0);
    }
}
