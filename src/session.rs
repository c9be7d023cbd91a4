use chrono::{Local, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::colors::ColorRegistry;
use crate::error::{FormError, FormResult, UploadError};
use crate::materialize;
use crate::matrix::{Axis, Keying, QuantityMatrix};
use crate::product::{Category, Product, ProductColor, ProductImage, ProductSize};
use crate::sizes::SizeRegistry;
use crate::upload::{MainImageTicket, UploadTicket, UploadTracker, UploadedImage};

pub const MIN_NAME_LEN: usize = 4;
pub const MIN_PRICE: f64 = 1000.0;
pub const MAX_DISCOUNT: u8 = 80;

/// Scalar fields of the product form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDetails {
    pub name: String,
    /// Quantity typed by hand. Ignored once sizes and colors are both set.
    pub quantity: u64,
    pub price: f64,
    pub discount: u8,
    pub description: String,
    pub entered_date: NaiveDate,
    pub category_id: i64,
    pub status: bool,
    pub sold: u32,
    pub image: String,
}

impl Default for ProductDetails {
    fn default() -> Self {
        ProductDetails {
            name: String::new(),
            quantity: 0,
            price: 0.0,
            discount: 0,
            description: String::new(),
            entered_date: Local::now().date_naive(),
            category_id: 1,
            status: true,
            sold: 0,
            image: String::new(),
        }
    }
}

impl ProductDetails {
    pub fn from_product(product: &Product) -> Self {
        let defaults = ProductDetails::default();
        ProductDetails {
            name: product.name.clone(),
            quantity: product.quantity,
            price: product.price,
            discount: product.discount,
            description: product.description.clone(),
            entered_date: product.entered_date.unwrap_or(defaults.entered_date),
            category_id: product.category.as_ref().map_or(defaults.category_id, |c| c.category_id),
            status: product.status,
            sold: product.sold,
            image: product.image.clone(),
        }
    }

    /// Form validators, checked against the quantity that would be saved.
    pub fn validate(&self, quantity: u64) -> FormResult<()> {
        let invalid = |field: &'static str, reason: &str| FormError::InvalidField {
            field,
            reason: reason.to_string(),
        };

        let name = self.name.trim();
        if name.is_empty() {
            return Err(invalid("name", "required"));
        }
        if name.chars().count() < MIN_NAME_LEN {
            return Err(invalid("name", "must be at least 4 characters"));
        }
        if quantity < 1 {
            return Err(invalid("quantity", "must be at least 1"));
        }
        if !(self.price >= MIN_PRICE) {
            return Err(invalid("price", "must be at least 1000"));
        }
        if self.discount > MAX_DISCOUNT {
            return Err(invalid("discount", "must be between 0 and 80"));
        }
        if self.description.trim().is_empty() {
            return Err(invalid("description", "required"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SessionMode {
    Create,
    Edit { product_id: i64 },
}

/// Everything the add/edit product form holds while it is open.
///
/// Registry and matrix changes only happen through this type, so the matrix
/// always has one cell per (size, color) pair of the current registries.
#[derive(Clone, Debug)]
pub struct EditSession {
    mode: SessionMode,
    pub details: ProductDetails,
    sizes: SizeRegistry,
    colors: ColorRegistry,
    matrix: QuantityMatrix,
    uploads: UploadTracker,
    placeholder_image: String,
    /// Changes whenever the form is reset; late upload results carry the
    /// generation they were started for.
    generation: Uuid,
}

impl EditSession {
    pub fn new(keying: Keying) -> Self {
        EditSession {
            mode: SessionMode::Create,
            details: ProductDetails::default(),
            sizes: SizeRegistry::new(),
            colors: ColorRegistry::new(),
            matrix: QuantityMatrix::new(keying),
            uploads: UploadTracker::new(),
            placeholder_image: String::new(),
            generation: Uuid::new_v4(),
        }
    }

    /// Main image used by new products until one is uploaded.
    pub fn with_placeholder_image(mut self, url: impl Into<String>) -> Self {
        self.placeholder_image = url.into();
        if matches!(self.mode, SessionMode::Create) && self.details.image.is_empty() {
            self.details.image = self.placeholder_image.clone();
        }
        self
    }

    /// Opens the edit flow for a persisted product.
    pub fn for_product(product: &Product, keying: Keying) -> Self {
        let (sizes, colors, matrix) = materialize::from_product(product, keying);
        let mode = match product.product_id {
            Some(product_id) => SessionMode::Edit { product_id },
            None => SessionMode::Create,
        };
        EditSession {
            mode,
            details: ProductDetails::from_product(product),
            sizes,
            colors,
            matrix,
            uploads: UploadTracker::new(),
            placeholder_image: String::new(),
            generation: Uuid::new_v4(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn keying(&self) -> Keying {
        self.matrix.keying()
    }

    pub fn sizes(&self) -> &SizeRegistry {
        &self.sizes
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    pub fn matrix(&self) -> &QuantityMatrix {
        &self.matrix
    }

    pub fn uploads(&self) -> &UploadTracker {
        &self.uploads
    }

    pub fn generation(&self) -> Uuid {
        self.generation
    }

    // --- sizes ---

    pub fn add_size(&mut self, raw: &str) -> FormResult<usize> {
        let index = self.sizes.add(raw)?;
        self.matrix.extend_size(&self.sizes, &self.colors, index);
        Ok(index)
    }

    pub fn remove_size(&mut self, index: usize) -> FormResult<ProductSize> {
        self.sizes.check_index(index)?;
        self.matrix.discard_size(&self.sizes, &self.colors, index);
        let slot = self.sizes.remove(index)?;
        self.matrix.rebuild(&self.sizes, &self.colors);
        Ok(slot.size)
    }

    // --- colors ---

    pub fn add_color(&mut self, name: &str, code: &str) -> FormResult<usize> {
        let index = self.colors.add(name, code)?;
        self.matrix.extend_color(&self.sizes, &self.colors, index);
        Ok(index)
    }

    pub fn remove_color(&mut self, index: usize) -> FormResult<ProductColor> {
        self.colors.check_index(index)?;
        self.matrix.discard_color(&self.sizes, &self.colors, index);
        let slot = self.colors.remove(index)?;
        self.matrix.rebuild(&self.sizes, &self.colors);
        Ok(slot.color)
    }

    pub fn add_image(&mut self, color_index: usize, image_url: &str) -> FormResult<usize> {
        self.colors.add_image(color_index, image_url)
    }

    pub fn remove_image(&mut self, color_index: usize, image_index: usize) -> FormResult<ProductImage> {
        self.colors.remove_image(color_index, image_index)
    }

    /// Marks a color slot as uploading. The ticket stays bound to that color
    /// even if other colors are added or removed meanwhile.
    pub fn begin_upload(&mut self, color_index: usize) -> Result<UploadTicket, UploadError> {
        let key = self
            .colors
            .key_at(color_index)
            .ok_or_else(|| UploadError::Failed(format!("no color at position {}", color_index)))?;
        self.uploads.begin(key)
    }

    /// Applies an upload result. On success returns the (color, image)
    /// position of the new image, or `None` when the color is gone.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadedImage, UploadError>,
    ) -> Result<Option<(usize, usize)>, UploadError> {
        self.uploads.finish(&ticket);
        let uploaded = result?;
        match self.colors.position(ticket.color) {
            Some(color_index) => {
                let image_index = self
                    .colors
                    .add_image(color_index, uploaded.secure_url)
                    .map_err(|e| UploadError::Failed(e.to_string()))?;
                Ok(Some((color_index, image_index)))
            }
            None => {
                warn!("color removed during upload, dropping {}", uploaded.secure_url);
                Ok(None)
            }
        }
    }

    /// Marks the main image as uploading for this form.
    pub fn begin_main_upload(&mut self) -> Result<MainImageTicket, UploadError> {
        self.uploads.begin_main(self.generation)
    }

    /// Applies a main image upload. A result for a form that was closed or
    /// reset meanwhile is dropped and gives `Ok(None)`.
    pub fn finish_main_upload(
        &mut self,
        ticket: MainImageTicket,
        result: Result<UploadedImage, UploadError>,
    ) -> Result<Option<String>, UploadError> {
        self.uploads.finish_main(&ticket);
        if ticket.generation != self.generation {
            warn!("form closed during main image upload, dropping result");
            return Ok(None);
        }
        let uploaded = result?;
        self.details.image = uploaded.secure_url.clone();
        Ok(Some(uploaded.secure_url))
    }

    // --- matrix ---

    pub fn quantity(&self, size_index: usize, color_index: usize) -> u32 {
        self.matrix.get(&self.sizes, &self.colors, size_index, color_index)
    }

    pub fn set_quantity(&mut self, size_index: usize, color_index: usize, raw: &str) -> FormResult<u32> {
        let stored = self
            .matrix
            .set(&self.sizes, &self.colors, size_index, color_index, raw)?;
        debug!("quantity[{}][{}] = {}", size_index, color_index, stored);
        Ok(stored)
    }

    pub fn size_total(&self, size_index: usize) -> u64 {
        self.matrix.size_total(&self.sizes, &self.colors, size_index)
    }

    pub fn color_total(&self, color_index: usize) -> u64 {
        self.matrix.color_total(&self.sizes, &self.colors, color_index)
    }

    pub fn grand_total(&self) -> u64 {
        self.matrix.grand_total()
    }

    pub fn has_variants(&self) -> bool {
        !self.sizes.is_empty() && !self.colors.is_empty()
    }

    /// The product's overall stock: the grand total once sizes and colors
    /// are both chosen, the hand-typed quantity otherwise.
    pub fn effective_quantity(&self) -> u64 {
        if self.has_variants() {
            self.grand_total()
        } else {
            self.details.quantity
        }
    }

    /// Sizes without colors (or the reverse) cannot be saved.
    pub fn check_consistency(&self) -> FormResult<()> {
        if self.sizes.is_empty() != self.colors.is_empty() {
            return Err(FormError::InconsistentVariants);
        }
        Ok(())
    }

    /// Validates the form and materializes the product to submit. The
    /// session itself is left unchanged.
    pub fn build_product(&self) -> FormResult<Product> {
        let quantity = self.effective_quantity();
        self.details.validate(quantity)?;
        self.check_consistency()?;

        let product_id = match self.mode {
            SessionMode::Edit { product_id } => Some(product_id),
            SessionMode::Create => None,
        };
        Ok(Product {
            product_id,
            name: self.details.name.trim().to_string(),
            quantity,
            price: self.details.price,
            discount: self.details.discount,
            image: self.details.image.clone(),
            description: self.details.description.clone(),
            entered_date: Some(self.details.entered_date),
            category: Some(Category::new(self.details.category_id, "")),
            status: self.details.status,
            sold: self.details.sold,
            sizes: materialize::to_variants(&self.sizes, &self.colors, &self.matrix),
            colors: self.colors.iter().cloned().collect(),
        })
    }

    /// Back to an empty create form.
    pub fn reset(&mut self) {
        self.mode = SessionMode::Create;
        self.details = ProductDetails {
            image: self.placeholder_image.clone(),
            ..ProductDetails::default()
        };
        self.sizes.clear();
        self.colors.clear();
        self.matrix.clear();
        self.uploads.clear();
        self.generation = Uuid::new_v4();
    }

    /// Serializable picture of the form, for display.
    pub fn view(&self) -> SessionView {
        let sizes = self
            .sizes
            .iter()
            .enumerate()
            .map(|(s, size)| SizeRow {
                value: size.size_value.clone(),
                quantities: (0..self.colors.len()).map(|c| self.quantity(s, c)).collect(),
                total: self.size_total(s),
            })
            .collect();
        let colors = self
            .colors
            .iter()
            .enumerate()
            .map(|(c, color)| ColorColumn {
                name: color.color_name.clone(),
                code: color.color_code.clone(),
                images: color.images.clone(),
                total: self.color_total(c),
                uploading: self
                    .colors
                    .key_at(c)
                    .is_some_and(|key| self.uploads.is_uploading(key)),
            })
            .collect();

        SessionView {
            mode: self.mode,
            details: self.details.clone(),
            sizes,
            colors,
            grand_total: self.grand_total(),
            effective_quantity: self.effective_quantity(),
            image_uploading: self.uploads.is_uploading_main(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeRow {
    pub value: String,
    pub quantities: Vec<u32>,
    pub total: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorColumn {
    pub name: String,
    pub code: String,
    pub images: Vec<ProductImage>,
    pub total: u64,
    pub uploading: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub mode: SessionMode,
    pub details: ProductDetails,
    pub sizes: Vec<SizeRow>,
    pub colors: Vec<ColorColumn>,
    pub grand_total: u64,
    pub effective_quantity: u64,
    pub image_uploading: bool,
}
