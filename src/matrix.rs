use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{FormError, FormResult};

/// Session-local identity of a size or color slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey(Uuid);

impl SlotKey {
    pub fn new() -> Self {
        SlotKey(Uuid::new_v4())
    }
}

impl Default for SlotKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One dimension of the matrix: an ordered list of slots.
pub trait Axis {
    fn len(&self) -> usize;
    fn key_at(&self, index: usize) -> Option<SlotKey>;
}

/// How matrix cells are addressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keying {
    /// Cells follow their size and color through removals.
    #[default]
    Stable,
    /// Cells are addressed by (size position, color position). A removal
    /// shifts every later row or column onto its old neighbour's values.
    Positional,
}

impl FromStr for Keying {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(Keying::Stable),
            "positional" => Ok(Keying::Positional),
            other => Err(format!("unknown matrix keying: {}", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum CellKey {
    Slots(SlotKey, SlotKey),
    Position(usize, usize),
}

/// Parses a quantity typed into a matrix cell.
///
/// Reads an optional sign and the leading digits and ignores the rest, so
/// `"12abc"` is 12 and `"3.7"` is 3. Text without leading digits becomes 0,
/// negatives clamp to 0 and oversized values clamp to `u32::MAX`.
pub fn parse_quantity(raw: &str) -> u32 {
    let text = raw.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    let digits = rest[..end].trim_start_matches('0');
    if negative || digits.is_empty() {
        return 0;
    }
    // more than ten digits cannot fit in a u32
    if digits.len() > 10 {
        return u32::MAX;
    }
    digits.parse::<u64>().map_or(u32::MAX, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Coerces a JSON cell value: numbers are truncated toward zero, strings go
/// through [`parse_quantity`] and anything else is 0.
pub fn quantity_from_json(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::String(text) => parse_quantity(text),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                u32::try_from(i.max(0)).unwrap_or(u32::MAX)
            } else if let Some(u) = n.as_u64() {
                u32::try_from(u).unwrap_or(u32::MAX)
            } else {
                // `as` saturates and maps NaN to 0
                n.as_f64().map_or(0, |f| f.trunc() as u32)
            }
        }
        _ => 0,
    }
}

/// Sparse size x color -> quantity map used while a product is edited.
///
/// Every operation leaves exactly one cell for each (size, color) pair of
/// the current registries and none outside them.
#[derive(Clone, Debug, Default)]
pub struct QuantityMatrix {
    keying: Keying,
    cells: HashMap<CellKey, u32>,
}

impl QuantityMatrix {
    pub fn new(keying: Keying) -> Self {
        QuantityMatrix {
            keying,
            cells: HashMap::new(),
        }
    }

    pub fn keying(&self) -> Keying {
        self.keying
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    fn key(&self, sizes: &impl Axis, colors: &impl Axis, size: usize, color: usize) -> Option<CellKey> {
        match self.keying {
            Keying::Stable => Some(CellKey::Slots(sizes.key_at(size)?, colors.key_at(color)?)),
            Keying::Positional => {
                (size < sizes.len() && color < colors.len()).then_some(CellKey::Position(size, color))
            }
        }
    }

    fn key_or_err(&self, sizes: &impl Axis, colors: &impl Axis, size: usize, color: usize) -> FormResult<CellKey> {
        if size >= sizes.len() {
            return Err(FormError::SizeIndex {
                index: size,
                len: sizes.len(),
            });
        }
        self.key(sizes, colors, size, color).ok_or(FormError::ColorIndex {
            index: color,
            len: colors.len(),
        })
    }

    /// Stored quantity, 0 when the cell is absent.
    pub fn get(&self, sizes: &impl Axis, colors: &impl Axis, size: usize, color: usize) -> u32 {
        self.key(sizes, colors, size, color)
            .and_then(|key| self.cells.get(&key).copied())
            .unwrap_or(0)
    }

    pub fn store(
        &mut self,
        sizes: &impl Axis,
        colors: &impl Axis,
        size: usize,
        color: usize,
        quantity: u32,
    ) -> FormResult<()> {
        let key = self.key_or_err(sizes, colors, size, color)?;
        self.cells.insert(key, quantity);
        Ok(())
    }

    /// Parses `raw` with [`parse_quantity`] and stores it. Returns the value
    /// actually stored.
    pub fn set(
        &mut self,
        sizes: &impl Axis,
        colors: &impl Axis,
        size: usize,
        color: usize,
        raw: &str,
    ) -> FormResult<u32> {
        let quantity = parse_quantity(raw);
        self.store(sizes, colors, size, color, quantity)?;
        Ok(quantity)
    }

    /// Adds a zero cell for every color at a newly appended size.
    pub fn extend_size(&mut self, sizes: &impl Axis, colors: &impl Axis, size: usize) {
        self.fill_size(sizes, colors, size, |_| 0);
    }

    /// Adds a cell for every color at a newly appended size, taking each
    /// quantity from `quantity_of(color_index)`.
    pub(crate) fn fill_size(
        &mut self,
        sizes: &impl Axis,
        colors: &impl Axis,
        size: usize,
        quantity_of: impl Fn(usize) -> u32,
    ) {
        for color in 0..colors.len() {
            if let Some(key) = self.key(sizes, colors, size, color) {
                self.cells.insert(key, quantity_of(color));
            }
        }
    }

    /// Adds a zero cell for every size at a newly appended color.
    pub fn extend_color(&mut self, sizes: &impl Axis, colors: &impl Axis, color: usize) {
        for size in 0..sizes.len() {
            if let Some(key) = self.key(sizes, colors, size, color) {
                self.cells.insert(key, 0);
            }
        }
    }

    /// Drops a size row. Must run before the size leaves its registry.
    pub fn discard_size(&mut self, sizes: &impl Axis, colors: &impl Axis, size: usize) {
        for color in 0..colors.len() {
            if let Some(key) = self.key(sizes, colors, size, color) {
                self.cells.remove(&key);
            }
        }
    }

    /// Drops a color column. Must run before the color leaves its registry.
    pub fn discard_color(&mut self, sizes: &impl Axis, colors: &impl Axis, color: usize) {
        for size in 0..sizes.len() {
            if let Some(key) = self.key(sizes, colors, size, color) {
                self.cells.remove(&key);
            }
        }
    }

    /// Regenerates the key space as the cross product of both registries.
    /// Each new cell takes the old value stored under the same key, or 0.
    pub fn rebuild(&mut self, sizes: &impl Axis, colors: &impl Axis) {
        let mut cells = HashMap::with_capacity(sizes.len() * colors.len());
        for size in 0..sizes.len() {
            for color in 0..colors.len() {
                if let Some(key) = self.key(sizes, colors, size, color) {
                    let value = self.cells.get(&key).copied().unwrap_or(0);
                    cells.insert(key, value);
                }
            }
        }
        self.cells = cells;
    }

    pub fn size_total(&self, sizes: &impl Axis, colors: &impl Axis, size: usize) -> u64 {
        (0..colors.len())
            .map(|color| u64::from(self.get(sizes, colors, size, color)))
            .sum()
    }

    pub fn color_total(&self, sizes: &impl Axis, colors: &impl Axis, color: usize) -> u64 {
        (0..sizes.len())
            .map(|size| u64::from(self.get(sizes, colors, size, color)))
            .sum()
    }

    /// Sum of every stored cell.
    pub fn grand_total(&self) -> u64 {
        self.cells.values().map(|&q| u64::from(q)).sum()
    }

    /// True when the cells are exactly the cross product of both registries.
    pub fn is_consistent(&self, sizes: &impl Axis, colors: &impl Axis) -> bool {
        if self.cells.len() != sizes.len() * colors.len() {
            return false;
        }
        (0..sizes.len()).all(|size| {
            (0..colors.len()).all(|color| {
                self.key(sizes, colors, size, color)
                    .is_some_and(|key| self.cells.contains_key(&key))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Keys(Vec<SlotKey>);

    impl Keys {
        fn with(n: usize) -> Self {
            Keys((0..n).map(|_| SlotKey::new()).collect())
        }
    }

    impl Axis for Keys {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn key_at(&self, index: usize) -> Option<SlotKey> {
            self.0.get(index).copied()
        }
    }

    fn filled(keying: Keying, sizes: &Keys, colors: &Keys) -> QuantityMatrix {
        let mut matrix = QuantityMatrix::new(keying);
        matrix.rebuild(sizes, colors);
        for s in 0..sizes.len() {
            for c in 0..colors.len() {
                let q = (10 * (s + 1) + c + 1) as u32;
                matrix.store(sizes, colors, s, c, q).unwrap();
            }
        }
        matrix
    }

    #[test]
    fn parse_quantity_coerces() {
        assert_eq!(parse_quantity("5"), 5);
        assert_eq!(parse_quantity(" 12 "), 12);
        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("abc"), 0);
        assert_eq!(parse_quantity("12abc"), 12);
        assert_eq!(parse_quantity("3.7"), 3);
        assert_eq!(parse_quantity("5 pairs"), 5);
        assert_eq!(parse_quantity("+8"), 8);
        assert_eq!(parse_quantity("007"), 7);
        assert_eq!(parse_quantity(".5"), 0);
        assert_eq!(parse_quantity("-4"), 0);
        assert_eq!(parse_quantity("4294967295"), u32::MAX);
        assert_eq!(parse_quantity("4294967296"), u32::MAX);
        assert_eq!(parse_quantity("99999999999"), u32::MAX);
        assert_eq!(parse_quantity("123456789012345678901234"), u32::MAX);
        assert_eq!(parse_quantity("-123456789012345678901234"), 0);
    }

    #[test]
    fn absent_cells_read_as_zero() {
        let sizes = Keys::with(2);
        let colors = Keys::with(2);
        let matrix = QuantityMatrix::new(Keying::Stable);
        assert_eq!(matrix.get(&sizes, &colors, 1, 1), 0);
        assert_eq!(matrix.get(&sizes, &colors, 7, 7), 0);
        assert!(!matrix.is_consistent(&sizes, &colors));
    }

    #[test]
    fn fill_size_takes_quantities_per_color() {
        for keying in [Keying::Stable, Keying::Positional] {
            let sizes = Keys::with(1);
            let colors = Keys::with(3);
            let mut matrix = QuantityMatrix::new(keying);
            matrix.fill_size(&sizes, &colors, 0, |c| [4, 0, 9][c]);

            assert!(matrix.is_consistent(&sizes, &colors));
            assert_eq!(matrix.get(&sizes, &colors, 0, 2), 9);
            assert_eq!(matrix.grand_total(), 13);
        }
    }

    #[test]
    fn json_quantities_are_truncated() {
        use serde_json::json;
        assert_eq!(quantity_from_json(&json!(4.0)), 4);
        assert_eq!(quantity_from_json(&json!(3.7)), 3);
        assert_eq!(quantity_from_json(&json!(-2)), 0);
        assert_eq!(quantity_from_json(&json!(1e12)), u32::MAX);
        assert_eq!(quantity_from_json(&json!(u64::MAX)), u32::MAX);
        assert_eq!(quantity_from_json(&json!("12abc")), 12);
        assert_eq!(quantity_from_json(&json!(null)), 0);
    }

    #[test]
    fn set_rejects_out_of_range_indices() {
        let sizes = Keys::with(1);
        let colors = Keys::with(1);
        let mut matrix = QuantityMatrix::new(Keying::Positional);
        matrix.rebuild(&sizes, &colors);
        assert!(matches!(
            matrix.set(&sizes, &colors, 1, 0, "3"),
            Err(FormError::SizeIndex { index: 1, len: 1 })
        ));
        assert!(matches!(
            matrix.set(&sizes, &colors, 0, 2, "3"),
            Err(FormError::ColorIndex { index: 2, len: 1 })
        ));
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn stable_rebuild_keeps_surviving_cells() {
        let mut sizes = Keys::with(3);
        let colors = Keys::with(2);
        let mut matrix = filled(Keying::Stable, &sizes, &colors);

        matrix.discard_size(&sizes, &colors, 0);
        sizes.0.remove(0);
        matrix.rebuild(&sizes, &colors);

        assert!(matrix.is_consistent(&sizes, &colors));
        assert_eq!(matrix.get(&sizes, &colors, 0, 0), 21);
        assert_eq!(matrix.get(&sizes, &colors, 1, 1), 32);
        assert_eq!(matrix.grand_total(), 21 + 22 + 31 + 32);
    }

    #[test]
    fn positional_rebuild_shifts_later_rows() {
        let mut sizes = Keys::with(3);
        let colors = Keys::with(2);
        let mut matrix = filled(Keying::Positional, &sizes, &colors);

        matrix.discard_size(&sizes, &colors, 0);
        sizes.0.remove(0);
        matrix.rebuild(&sizes, &colors);

        assert!(matrix.is_consistent(&sizes, &colors));
        // The slot that moved into position 0 reads the discarded row.
        assert_eq!(matrix.get(&sizes, &colors, 0, 0), 0);
        assert_eq!(matrix.get(&sizes, &colors, 0, 1), 0);
        // The last slot reads what used to sit one row up.
        assert_eq!(matrix.get(&sizes, &colors, 1, 0), 21);
        assert_eq!(matrix.get(&sizes, &colors, 1, 1), 22);
    }

    #[test]
    fn positional_removal_of_last_row_is_lossless() {
        let mut sizes = Keys::with(2);
        let colors = Keys::with(2);
        let mut matrix = filled(Keying::Positional, &sizes, &colors);

        matrix.discard_size(&sizes, &colors, 1);
        sizes.0.remove(1);
        matrix.rebuild(&sizes, &colors);

        assert_eq!(matrix.get(&sizes, &colors, 0, 0), 11);
        assert_eq!(matrix.get(&sizes, &colors, 0, 1), 12);
        assert_eq!(matrix.len(), 2);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let sizes = Keys::with(2);
        let colors = Keys::with(3);
        for keying in [Keying::Stable, Keying::Positional] {
            let mut matrix = filled(keying, &sizes, &colors);
            let before = matrix.grand_total();
            matrix.rebuild(&sizes, &colors);
            matrix.rebuild(&sizes, &colors);
            assert_eq!(matrix.grand_total(), before);
            assert!(matrix.is_consistent(&sizes, &colors));
        }
    }

    #[test]
    fn keying_parses_from_config_text() {
        assert_eq!("Positional".parse::<Keying>(), Ok(Keying::Positional));
        assert_eq!(" stable ".parse::<Keying>(), Ok(Keying::Stable));
        assert!("by-id".parse::<Keying>().is_err());
    }
}
