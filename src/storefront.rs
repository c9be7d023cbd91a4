//! Size and color selection on the product detail page.

use serde::Serialize;
use thiserror::Error;

use crate::product::{Product, ProductColor, ProductImage, ProductSize};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickError {
    #[error("Please choose a size")]
    NoSize,

    #[error("Please choose a color")]
    NoColor,

    #[error("This size and color is out of stock")]
    OutOfStock,

    #[error("No size at position {0}")]
    SizeIndex(usize),

    #[error("No color at position {0}")]
    ColorIndex(usize),
}

/// What goes into the cart for one confirmed pick.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Option<i64>,
    pub size_value: String,
    pub color_name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// Price after the product's percentage discount.
pub fn unit_price(product: &Product) -> f64 {
    product.price * (1.0 - f64::from(product.discount) / 100.0)
}

pub struct VariantPicker<'a> {
    product: &'a Product,
    size: Option<usize>,
    color: Option<usize>,
}

impl<'a> VariantPicker<'a> {
    /// Starts on the first size, with no color chosen.
    pub fn new(product: &'a Product) -> Self {
        VariantPicker {
            product,
            size: (!product.sizes.is_empty()).then_some(0),
            color: None,
        }
    }

    pub fn selected_size(&self) -> Option<&'a ProductSize> {
        self.size.and_then(|i| self.product.sizes.get(i))
    }

    pub fn selected_color(&self) -> Option<&'a ProductColor> {
        self.color.and_then(|i| self.product.colors.get(i))
    }

    /// Colors stocked for the selected size.
    pub fn available_colors(&self) -> Vec<&'a ProductColor> {
        let Some(size) = self.selected_size() else {
            return Vec::new();
        };
        size.color_variants
            .iter()
            .filter(|v| v.quantity > 0)
            .filter_map(|v| v.product_color.as_ref())
            .map(|variant_color| {
                self.product
                    .colors
                    .iter()
                    .find(|c| c.same_as(variant_color))
                    .unwrap_or(variant_color)
            })
            .collect()
    }

    fn is_available(&self, color: &ProductColor) -> bool {
        self.available_colors().iter().any(|c| c.same_as(color))
    }

    /// Switches size. The chosen color survives only if the new size still
    /// has it in stock.
    pub fn select_size(&mut self, index: usize) -> Result<(), PickError> {
        if index >= self.product.sizes.len() {
            return Err(PickError::SizeIndex(index));
        }
        self.size = Some(index);
        if let Some(color) = self.selected_color() {
            if !self.is_available(color) {
                self.color = None;
            }
        }
        Ok(())
    }

    pub fn select_color(&mut self, index: usize) -> Result<(), PickError> {
        if index >= self.product.colors.len() {
            return Err(PickError::ColorIndex(index));
        }
        self.color = Some(index);
        Ok(())
    }

    /// Stock of the selected (size, color), 0 when either is missing.
    pub fn variant_quantity(&self) -> u32 {
        match (self.selected_size(), self.selected_color()) {
            (Some(size), Some(color)) => size.variant_for(color).map_or(0, |v| v.quantity),
            _ => 0,
        }
    }

    pub fn confirm(&self) -> Result<CartLine, PickError> {
        let size = self.selected_size().ok_or(PickError::NoSize)?;
        let color = self.selected_color().ok_or(PickError::NoColor)?;
        if self.variant_quantity() == 0 {
            return Err(PickError::OutOfStock);
        }
        Ok(CartLine {
            product_id: self.product.product_id,
            size_value: size.size_value.clone(),
            color_name: color.color_name.clone(),
            quantity: 1,
            unit_price: unit_price(self.product),
        })
    }

    /// Gallery for a color. Empty means the page keeps the main image.
    pub fn images_for_color(&self, index: usize) -> &'a [ProductImage] {
        self.product
            .colors
            .get(index)
            .map_or(&[][..], |c| c.images.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::SizeColorVariant;

    fn product() -> Product {
        let mut product = Product::new(Some(3));
        product.price = 500_000.0;
        product.discount = 20;

        let mut black = ProductColor::new("Black", "#000000");
        black.color_id = Some(1);
        black.images.push(ProductImage::new("black.jpg", 0));
        let mut white = ProductColor::new("White", "#ffffff");
        white.color_id = Some(2);

        let mut s38 = ProductSize::new("38");
        s38.color_variants.push(SizeColorVariant::new(black.clone(), 2));
        s38.color_variants.push(SizeColorVariant::new(white.clone(), 5));
        let mut s39 = ProductSize::new("39");
        s39.color_variants.push(SizeColorVariant::new(black.clone(), 0));
        s39.color_variants.push(SizeColorVariant::new(white.clone(), 1));

        product.colors = vec![black, white];
        product.sizes = vec![s38, s39];
        product
    }

    #[test]
    fn starts_on_first_size_without_color() {
        let product = product();
        let picker = VariantPicker::new(&product);
        assert_eq!(picker.selected_size().unwrap().size_value, "38");
        assert_eq!(picker.confirm(), Err(PickError::NoColor));
        assert_eq!(picker.available_colors().len(), 2);
    }

    #[test]
    fn size_change_drops_unavailable_color() {
        let product = product();
        let mut picker = VariantPicker::new(&product);
        picker.select_color(0).unwrap();
        assert_eq!(picker.variant_quantity(), 2);

        picker.select_size(1).unwrap();
        assert!(picker.selected_color().is_none());
        let names: Vec<_> = picker.available_colors().iter().map(|c| c.color_name.as_str()).collect();
        assert_eq!(names, ["White"]);

        picker.select_color(1).unwrap();
        picker.select_size(0).unwrap();
        assert_eq!(picker.selected_color().unwrap().color_name, "White");
    }

    #[test]
    fn confirm_builds_discounted_line() {
        let product = product();
        let mut picker = VariantPicker::new(&product);
        picker.select_color(1).unwrap();

        let line = picker.confirm().unwrap();
        assert_eq!(line.size_value, "38");
        assert_eq!(line.color_name, "White");
        assert_eq!(line.quantity, 1);
        assert!((line.unit_price - 400_000.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_stock_and_missing_size() {
        let product = product();
        let mut picker = VariantPicker::new(&product);
        picker.select_size(1).unwrap();
        picker.select_color(0).unwrap();
        assert_eq!(picker.confirm(), Err(PickError::OutOfStock));

        let empty = Product::new(None);
        assert_eq!(VariantPicker::new(&empty).confirm(), Err(PickError::NoSize));
        assert_eq!(picker.select_size(9), Err(PickError::SizeIndex(9)));
    }

    #[test]
    fn images_fall_back_to_none() {
        let product = product();
        let picker = VariantPicker::new(&product);
        assert_eq!(picker.images_for_color(0).len(), 1);
        assert!(picker.images_for_color(1).is_empty());
        assert!(picker.images_for_color(7).is_empty());
    }
}
