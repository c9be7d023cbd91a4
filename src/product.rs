use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An image attached to a single color, in display order.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub image_id: Option<i64>,
    pub image_url: String,
    #[serde(default)]
    pub display_order: i32,
}

impl ProductImage {
    pub fn new(image_url: impl Into<String>, display_order: i32) -> Self {
        ProductImage {
            image_id: None,
            image_url: image_url.into(),
            display_order,
        }
    }
}

/// A stocked color of a product, owning its own image set.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductColor {
    pub color_id: Option<i64>,
    pub color_name: String,
    pub color_code: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl ProductColor {
    pub fn new(color_name: impl Into<String>, color_code: impl Into<String>) -> Self {
        ProductColor {
            color_id: None,
            color_name: color_name.into(),
            color_code: color_code.into(),
            images: Vec::new(),
        }
    }

    /// Identifier match when both sides carry one, otherwise name match.
    pub fn same_as(&self, other: &ProductColor) -> bool {
        match (self.color_id, other.color_id) {
            (Some(a), Some(b)) if a == b => true,
            _ => self.color_name == other.color_name,
        }
    }
}

/// The persisted (size, color) -> quantity association, owned by a size.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SizeColorVariant {
    pub variant_id: Option<i64>,
    #[serde(default)]
    pub quantity: u32,
    pub product_color: Option<ProductColor>,
}

impl SizeColorVariant {
    pub fn new(color: ProductColor, quantity: u32) -> Self {
        SizeColorVariant {
            variant_id: None,
            quantity,
            product_color: Some(color),
        }
    }
}

/// A stocked shoe size and its per-color variants.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSize {
    pub size_id: Option<i64>,
    pub size_value: String,
    #[serde(default)]
    pub color_variants: Vec<SizeColorVariant>,
}

impl ProductSize {
    pub fn new(size_value: impl Into<String>) -> Self {
        ProductSize {
            size_id: None,
            size_value: size_value.into(),
            color_variants: Vec::new(),
        }
    }

    /// Finds the variant stocked for `color`.
    ///
    /// A variant whose color identifier equals the color's identifier wins;
    /// otherwise the first variant with the same color name is used. Colors
    /// that have not been persisted yet carry no identifier and can only be
    /// found by name.
    pub fn variant_for(&self, color: &ProductColor) -> Option<&SizeColorVariant> {
        let by_id = color.color_id.and_then(|id| {
            self.color_variants.iter().find(|v| {
                v.product_color
                    .as_ref()
                    .is_some_and(|c| c.color_id == Some(id))
            })
        });

        by_id.or_else(|| {
            self.color_variants.iter().find(|v| {
                v.product_color
                    .as_ref()
                    .is_some_and(|c| c.color_name == color.color_name)
            })
        })
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    #[serde(default)]
    pub category_name: String,
}

impl Category {
    pub fn new(category_id: i64, category_name: impl Into<String>) -> Self {
        Category {
            category_id,
            category_name: category_name.into(),
        }
    }
}

/// A product record as exchanged with the catalog service.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub quantity: u64,
    #[serde(default)]
    pub price: f64,
    /// Discount percentage, 0 to 80.
    #[serde(default)]
    pub discount: u8,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub entered_date: Option<NaiveDate>,
    pub category: Option<Category>,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub sold: u32,
    #[serde(default)]
    pub sizes: Vec<ProductSize>,
    #[serde(default)]
    pub colors: Vec<ProductColor>,
}

impl Product {
    pub fn new(product_id: Option<i64>) -> Self {
        Product {
            product_id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_json() {
        let json = r##"{
            "productId": 12,
            "name": "Runner",
            "quantity": 7,
            "price": 450000,
            "discount": 10,
            "image": "https://img/main.jpg",
            "description": "light",
            "enteredDate": "2024-03-01",
            "category": {"categoryId": 2, "categoryName": "Sneakers"},
            "status": true,
            "sold": 3,
            "sizes": [{"sizeId": 5, "sizeValue": "36", "colorVariants": [
                {"variantId": 9, "quantity": 7,
                 "productColor": {"colorId": 4, "colorName": "Black", "colorCode": "#000000", "images": []}}
            ]}],
            "colors": [{"colorId": 4, "colorName": "Black", "colorCode": "#000000",
                        "images": [{"imageId": 1, "imageUrl": "u", "displayOrder": 0}]}]
        }"##;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_id, Some(12));
        assert_eq!(product.entered_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(product.sizes[0].color_variants[0].quantity, 7);
        assert_eq!(product.colors[0].images[0].image_url, "u");
    }

    #[test]
    fn variant_lookup_prefers_identifier() {
        let mut black = ProductColor::new("Black", "#000000");
        black.color_id = Some(4);
        let mut renamed = ProductColor::new("Noir", "#000000");
        renamed.color_id = Some(4);
        let impostor = ProductColor::new("Black", "#111111");

        let mut size = ProductSize::new("38");
        size.color_variants.push(SizeColorVariant::new(impostor, 1));
        size.color_variants.push(SizeColorVariant::new(renamed, 2));

        assert_eq!(size.variant_for(&black).map(|v| v.quantity), Some(2));
    }

    #[test]
    fn variant_lookup_falls_back_to_name() {
        let white = ProductColor::new("White", "#ffffff");
        let mut size = ProductSize::new("40");
        size.color_variants.push(SizeColorVariant {
            variant_id: None,
            quantity: 3,
            product_color: None,
        });
        size.color_variants
            .push(SizeColorVariant::new(ProductColor::new("White", "#fff"), 5));

        assert_eq!(size.variant_for(&white).map(|v| v.quantity), Some(5));
        assert!(size.variant_for(&ProductColor::new("Red", "#f00")).is_none());
    }
}
