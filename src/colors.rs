use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::error::{FormError, FormResult};
use crate::matrix::{Axis, SlotKey};
use crate::product::{ProductColor, ProductImage};

pub const DEFAULT_COLOR_CODE: &str = "#000000";

lazy_static! {
    static ref HEX_CODE_REGEX: Regex =
        Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap();
}

/// Blank codes fall back to black and hex codes are lower-cased. Other
/// codes are kept as given.
pub fn normalize_color_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_COLOR_CODE.to_string()
    } else if HEX_CODE_REGEX.is_match(trimmed) {
        trimmed.to_ascii_lowercase()
    } else {
        trimmed.to_string()
    }
}

#[derive(Clone, Debug)]
pub struct ColorSlot {
    pub key: SlotKey,
    pub color: ProductColor,
}

/// Ordered colors of the product being edited, each with its images.
#[derive(Clone, Debug, Default)]
pub struct ColorRegistry {
    slots: Vec<ColorSlot>,
}

impl ColorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProductColor> {
        self.slots.get(index).map(|slot| &slot.color)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductColor> {
        self.slots.iter().map(|slot| &slot.color)
    }

    pub fn position(&self, key: SlotKey) -> Option<usize> {
        self.slots.iter().position(|slot| slot.key == key)
    }

    pub fn add(&mut self, name: &str, code: &str) -> FormResult<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormError::EmptyColorName);
        }
        let code = normalize_color_code(code);
        debug!("adding color {} ({})", name, code);
        Ok(self.push(ProductColor::new(name, code)))
    }

    pub(crate) fn push(&mut self, color: ProductColor) -> usize {
        self.slots.push(ColorSlot {
            key: SlotKey::new(),
            color,
        });
        self.slots.len() - 1
    }

    pub fn check_index(&self, index: usize) -> FormResult<()> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(FormError::ColorIndex {
                index,
                len: self.slots.len(),
            })
        }
    }

    pub fn remove(&mut self, index: usize) -> FormResult<ColorSlot> {
        self.check_index(index)?;
        let slot = self.slots.remove(index);
        debug!("removed color {} at {}", slot.color.color_name, index);
        Ok(slot)
    }

    /// Appends an uploaded image to a color. `display_order` is the image's
    /// position at insertion time. Returns the new image's position.
    pub fn add_image(&mut self, color_index: usize, image_url: impl Into<String>) -> FormResult<usize> {
        self.check_index(color_index)?;
        let images = &mut self.slots[color_index].color.images;
        let order = images.len() as i32;
        images.push(ProductImage::new(image_url, order));
        Ok(images.len() - 1)
    }

    /// Removes an image. Remaining images keep their `display_order`.
    pub fn remove_image(&mut self, color_index: usize, image_index: usize) -> FormResult<ProductImage> {
        self.check_index(color_index)?;
        let images = &mut self.slots[color_index].color.images;
        if image_index >= images.len() {
            return Err(FormError::ImageIndex {
                index: image_index,
                len: images.len(),
            });
        }
        Ok(images.remove(image_index))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl Axis for ColorRegistry {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn key_at(&self, index: usize) -> Option<SlotKey> {
        self.slots.get(index).map(|slot| slot.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_trims_name_and_rejects_blank() {
        let mut colors = ColorRegistry::new();
        assert_eq!(colors.add("  ", "#fff"), Err(FormError::EmptyColorName));
        assert_eq!(colors.add(" Red ", "#FF0000"), Ok(0));
        let red = colors.get(0).unwrap();
        assert_eq!(red.color_name, "Red");
        assert_eq!(red.color_code, "#ff0000");
        assert!(red.images.is_empty());
    }

    #[test]
    fn color_code_defaults_and_keeps_named_codes() {
        assert_eq!(normalize_color_code(""), DEFAULT_COLOR_CODE);
        assert_eq!(normalize_color_code("  "), DEFAULT_COLOR_CODE);
        assert_eq!(normalize_color_code("#ABC"), "#abc");
        assert_eq!(normalize_color_code(" red "), "red");
        assert_eq!(normalize_color_code("#12345"), "#12345");

        let mut colors = ColorRegistry::new();
        assert_eq!(colors.add("Red", "red"), Ok(0));
        assert_eq!(colors.get(0).unwrap().color_code, "red");
    }

    #[test]
    fn images_keep_insertion_order_without_renumbering() {
        let mut colors = ColorRegistry::new();
        colors.add("Black", "").unwrap();
        colors.add_image(0, "a.jpg").unwrap();
        colors.add_image(0, "b.jpg").unwrap();
        colors.add_image(0, "c.jpg").unwrap();

        let removed = colors.remove_image(0, 0).unwrap();
        assert_eq!(removed.image_url, "a.jpg");

        let orders: Vec<i32> = colors.get(0).unwrap().images.iter().map(|i| i.display_order).collect();
        assert_eq!(orders, [1, 2]);

        assert_eq!(colors.add_image(0, "d.jpg"), Ok(2));
        assert_eq!(colors.get(0).unwrap().images[2].display_order, 2);
    }

    #[test]
    fn image_operations_check_indices() {
        let mut colors = ColorRegistry::new();
        colors.add("Black", "").unwrap();
        assert!(matches!(colors.add_image(1, "x"), Err(FormError::ColorIndex { .. })));
        assert!(matches!(colors.remove_image(0, 0), Err(FormError::ImageIndex { .. })));
        assert!(colors.get(0).unwrap().images.is_empty());
    }
}
