//! Conversion between the edit-time registries + matrix and the persisted
//! per-size variant lists.

use log::debug;

use crate::colors::ColorRegistry;
use crate::matrix::{Keying, QuantityMatrix};
use crate::product::{Product, ProductColor, ProductImage, ProductSize, SizeColorVariant};
use crate::sizes::SizeRegistry;

/// Builds the persisted sizes: one variant per color, in color order, for
/// every size. Zero quantities are kept.
pub fn to_variants(sizes: &SizeRegistry, colors: &ColorRegistry, matrix: &QuantityMatrix) -> Vec<ProductSize> {
    sizes
        .iter()
        .enumerate()
        .map(|(size_idx, size)| ProductSize {
            size_id: size.size_id,
            size_value: size.size_value.clone(),
            color_variants: colors
                .iter()
                .enumerate()
                .map(|(color_idx, color)| {
                    SizeColorVariant::new(color.clone(), matrix.get(sizes, colors, size_idx, color_idx))
                })
                .collect(),
        })
        .collect()
}

/// Rebuilds registries and matrix from a persisted product.
///
/// Colors come first so every size row can look its quantities up by color.
/// Quantities that no variant accounts for start at 0.
pub fn from_product(product: &Product, keying: Keying) -> (SizeRegistry, ColorRegistry, QuantityMatrix) {
    let mut colors = ColorRegistry::new();
    for stored in &product.colors {
        let mut color = ProductColor::new(stored.color_name.clone(), stored.color_code.clone());
        color.color_id = stored.color_id;
        color.images = stored
            .images
            .iter()
            .map(|img| ProductImage {
                image_id: img.image_id,
                image_url: img.image_url.clone(),
                display_order: img.display_order,
            })
            .collect();
        colors.push(color);
    }

    let mut sizes = SizeRegistry::new();
    let mut matrix = QuantityMatrix::new(keying);
    for stored in &product.sizes {
        let mut size = ProductSize::new(stored.size_value.clone());
        size.size_id = stored.size_id;
        let size_idx = sizes.push(size);
        matrix.fill_size(&sizes, &colors, size_idx, |color_idx| {
            colors
                .get(color_idx)
                .and_then(|color| stored.variant_for(color))
                .map_or(0, |v| v.quantity)
        });
    }

    debug!(
        "loaded product {:?}: {} sizes x {} colors, {} in stock",
        product.product_id,
        sizes.len(),
        colors.len(),
        matrix.grand_total()
    );
    (sizes, colors, matrix)
}
