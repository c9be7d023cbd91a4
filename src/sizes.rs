use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::error::{FormError, FormResult};
use crate::matrix::{Axis, SlotKey};
use crate::product::ProductSize;

pub const MIN_SIZE: u32 = 35;
pub const MAX_SIZE: u32 = 45;

lazy_static! {
    static ref SIZE_REGEX: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Canonical form of a user-entered size, or `None` when it is not an
/// integer in `MIN_SIZE..=MAX_SIZE`.
///
/// ```
/// use shoegrid::sizes::normalize_size;
///
/// assert_eq!(normalize_size(" 036 ").as_deref(), Some("36"));
/// assert_eq!(normalize_size("46"), None);
/// ```
pub fn normalize_size(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !SIZE_REGEX.is_match(trimmed) {
        return None;
    }
    let value = trimmed.parse::<u32>().ok()?;
    if !(MIN_SIZE..=MAX_SIZE).contains(&value) {
        return None;
    }
    Some(value.to_string())
}

#[derive(Clone, Debug)]
pub struct SizeSlot {
    pub key: SlotKey,
    pub size: ProductSize,
}

/// Ordered, deduplicated sizes of the product being edited.
#[derive(Clone, Debug, Default)]
pub struct SizeRegistry {
    slots: Vec<SizeSlot>,
}

impl SizeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProductSize> {
        self.slots.get(index).map(|slot| &slot.size)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductSize> {
        self.slots.iter().map(|slot| &slot.size)
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.slots.iter().any(|slot| slot.size.size_value == value)
    }

    /// Normalizes `raw` and appends it. Returns the new size's position.
    pub fn add(&mut self, raw: &str) -> FormResult<usize> {
        let value = normalize_size(raw).ok_or_else(|| FormError::InvalidSize(raw.to_string()))?;
        if self.contains_value(&value) {
            return Err(FormError::DuplicateSize(value));
        }
        debug!("adding size {}", value);
        Ok(self.push(ProductSize::new(value)))
    }

    /// Appends an already-built size without validation. Used when loading
    /// a persisted product.
    pub(crate) fn push(&mut self, size: ProductSize) -> usize {
        self.slots.push(SizeSlot {
            key: SlotKey::new(),
            size,
        });
        self.slots.len() - 1
    }

    pub fn check_index(&self, index: usize) -> FormResult<()> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(FormError::SizeIndex {
                index,
                len: self.slots.len(),
            })
        }
    }

    pub fn remove(&mut self, index: usize) -> FormResult<SizeSlot> {
        self.check_index(index)?;
        let slot = self.slots.remove(index);
        debug!("removed size {} at {}", slot.size.size_value, index);
        Ok(slot)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl Axis for SizeRegistry {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn key_at(&self, index: usize) -> Option<SlotKey> {
        self.slots.get(index).map(|slot| slot.key)
    }
}
