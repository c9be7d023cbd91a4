use log::{error, info, warn};
use std::sync::Arc;

use crate::catalog::{CategoryListing, ProductCatalog};
use crate::error::{EditorResult, FormError, UploadError};
use crate::matrix::Keying;
use crate::notify::Notifier;
use crate::product::{Category, Product, ProductImage};
use crate::session::{EditSession, ProductDetails, SessionMode};
use crate::upload::{ImageUploader, MainImageTicket, UploadFile, UploadTicket, UploadedImage};

const NOTICE: &str = "Notice";
const SYSTEM: &str = "System";
const ERROR: &str = "Error";

/// Toast text for a rejected form operation.
pub fn form_message(err: &FormError) -> &'static str {
    match err {
        FormError::InvalidSize(_) => "Size must be an integer from 35 to 45!",
        FormError::DuplicateSize(_) => "Size already exists!",
        FormError::EmptyColorName => "Please enter a color name!",
        FormError::InconsistentVariants => "Please choose both sizes and colors to keep stock in sync!",
        FormError::InvalidField { .. } => "Please check the form data!",
        FormError::SizeIndex { .. } | FormError::ColorIndex { .. } | FormError::ImageIndex { .. } => {
            "That entry no longer exists!"
        }
    }
}

/// Controller behind the add/edit product form.
///
/// Every operation reports its outcome through the notifier and also returns
/// it, so callers can render a toast or react programmatically.
pub struct ProductEditor {
    catalog: Arc<dyn ProductCatalog>,
    categories: Arc<dyn CategoryListing>,
    uploader: Arc<dyn ImageUploader>,
    notifier: Arc<dyn Notifier>,
    keying: Keying,
    placeholder_image: String,
    session: EditSession,
    category_options: Vec<Category>,
}

impl ProductEditor {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        categories: Arc<dyn CategoryListing>,
        uploader: Arc<dyn ImageUploader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        ProductEditor {
            catalog,
            categories,
            uploader,
            notifier,
            keying: Keying::default(),
            placeholder_image: String::new(),
            session: EditSession::new(Keying::default()),
            category_options: Vec::new(),
        }
    }

    pub fn with_keying(mut self, keying: Keying) -> Self {
        self.keying = keying;
        self.session = self.fresh_session();
        self
    }

    pub fn with_placeholder_image(mut self, url: impl Into<String>) -> Self {
        self.placeholder_image = url.into();
        self.session = self.fresh_session();
        self
    }

    fn fresh_session(&self) -> EditSession {
        EditSession::new(self.keying).with_placeholder_image(self.placeholder_image.clone())
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Catalog the form saves to, for read-only views outside the form.
    pub fn catalog(&self) -> Arc<dyn ProductCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn category_options(&self) -> &[Category] {
        &self.category_options
    }

    fn reject<T>(&self, err: FormError) -> EditorResult<T> {
        warn!("form operation rejected: {}", err);
        self.notifier.warning(NOTICE, form_message(&err));
        Err(err.into())
    }

    /// Starts a blank create form.
    pub fn open_new(&mut self) {
        self.session = self.fresh_session();
    }

    /// Loads a persisted product into the form. On failure the form falls
    /// back to an empty create session.
    pub async fn open_existing(&mut self, product_id: i64) -> EditorResult<()> {
        match self.catalog.fetch_one(product_id).await {
            Ok(product) => {
                info!(
                    "editing product {} ({} sizes, {} colors)",
                    product_id,
                    product.sizes.len(),
                    product.colors.len()
                );
                self.session = EditSession::for_product(&product, self.keying)
                    .with_placeholder_image(self.placeholder_image.clone());
                Ok(())
            }
            Err(e) => {
                error!("could not load product {}: {}", product_id, e);
                self.notifier.error(ERROR, "Could not load the product!");
                self.session = self.fresh_session();
                Err(e.into())
            }
        }
    }

    pub async fn load_categories(&mut self) -> EditorResult<&[Category]> {
        match self.categories.fetch_all().await {
            Ok(categories) => {
                self.category_options = categories;
                Ok(&self.category_options)
            }
            Err(e) => {
                error!("could not load categories: {}", e);
                self.notifier.error(ERROR, "Could not load categories!");
                Err(e.into())
            }
        }
    }

    pub fn set_details(&mut self, details: ProductDetails) {
        self.session.details = details;
    }

    pub fn add_size(&mut self, raw: &str) -> EditorResult<usize> {
        self.session.add_size(raw).or_else(|e| self.reject(e))
    }

    pub fn remove_size(&mut self, index: usize) -> EditorResult<()> {
        match self.session.remove_size(index) {
            Ok(_) => Ok(()),
            Err(e) => self.reject(e),
        }
    }

    pub fn add_color(&mut self, name: &str, code: &str) -> EditorResult<usize> {
        self.session.add_color(name, code).or_else(|e| self.reject(e))
    }

    pub fn remove_color(&mut self, index: usize) -> EditorResult<()> {
        match self.session.remove_color(index) {
            Ok(_) => Ok(()),
            Err(e) => self.reject(e),
        }
    }

    pub fn add_image(&mut self, color_index: usize, image_url: &str) -> EditorResult<usize> {
        self.session
            .add_image(color_index, image_url)
            .or_else(|e| self.reject(e))
    }

    pub fn remove_image(&mut self, color_index: usize, image_index: usize) -> EditorResult<ProductImage> {
        self.session
            .remove_image(color_index, image_index)
            .or_else(|e| self.reject(e))
    }

    pub fn set_quantity(&mut self, size_index: usize, color_index: usize, raw: &str) -> EditorResult<u32> {
        self.session
            .set_quantity(size_index, color_index, raw)
            .or_else(|e| self.reject(e))
    }

    /// First half of a color image upload. The editor can be released while
    /// the returned uploader runs, then [`finish_color_upload`] applies the
    /// result.
    ///
    /// [`finish_color_upload`]: ProductEditor::finish_color_upload
    pub fn begin_color_upload(
        &mut self,
        color_index: usize,
    ) -> EditorResult<(UploadTicket, Arc<dyn ImageUploader>)> {
        if let Err(e) = self.session.colors().check_index(color_index) {
            return self.reject(e);
        }
        match self.session.begin_upload(color_index) {
            Ok(ticket) => Ok((ticket, Arc::clone(&self.uploader))),
            Err(e) => {
                self.notifier.warning(NOTICE, "An upload is already running for this color!");
                Err(e.into())
            }
        }
    }

    pub fn finish_color_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<UploadedImage, UploadError>,
    ) -> EditorResult<Option<(usize, usize)>> {
        match self.session.finish_upload(ticket, result) {
            Ok(placed) => {
                if placed.is_some() {
                    self.notifier.success(SYSTEM, "Upload succeeded!");
                }
                Ok(placed)
            }
            Err(e) => {
                error!("color image upload failed: {}", e);
                self.notifier.error(ERROR, "Upload failed!");
                Err(e.into())
            }
        }
    }

    /// Uploads an image for one color and appends it to that color's list.
    pub async fn upload_color_image(
        &mut self,
        color_index: usize,
        file: UploadFile,
    ) -> EditorResult<Option<(usize, usize)>> {
        let (ticket, uploader) = self.begin_color_upload(color_index)?;
        let result = uploader.upload(file).await;
        self.finish_color_upload(ticket, result)
    }

    /// First half of a main image upload, like [`begin_color_upload`].
    ///
    /// [`begin_color_upload`]: ProductEditor::begin_color_upload
    pub fn begin_main_upload(&mut self) -> EditorResult<(MainImageTicket, Arc<dyn ImageUploader>)> {
        match self.session.begin_main_upload() {
            Ok(ticket) => Ok((ticket, Arc::clone(&self.uploader))),
            Err(e) => {
                self.notifier.warning(NOTICE, "An image upload is already running!");
                Err(e.into())
            }
        }
    }

    /// Stores the result of a main image upload in the form. Returns `None`
    /// when the form was closed while the upload ran.
    pub fn finish_main_upload(
        &mut self,
        ticket: MainImageTicket,
        result: Result<UploadedImage, UploadError>,
    ) -> EditorResult<Option<String>> {
        match self.session.finish_main_upload(ticket, result) {
            Ok(url) => {
                if url.is_some() {
                    self.notifier.success(SYSTEM, "Upload succeeded!");
                }
                Ok(url)
            }
            Err(e) => {
                error!("main image upload failed: {}", e);
                self.notifier.error(ERROR, "Upload failed!");
                Err(e.into())
            }
        }
    }

    pub async fn upload_main_image(&mut self, file: UploadFile) -> EditorResult<Option<String>> {
        let (ticket, uploader) = self.begin_main_upload()?;
        let result = uploader.upload(file).await;
        self.finish_main_upload(ticket, result)
    }

    /// Submits the form. Creates or updates depending on the session mode,
    /// then resets the form. Nothing changes when validation or the backend
    /// rejects the product.
    pub async fn save(&mut self) -> EditorResult<Product> {
        let product = match self.session.build_product() {
            Ok(product) => product,
            Err(e) => return self.reject(e),
        };

        let (result, done, failed) = match self.session.mode() {
            SessionMode::Create => (
                self.catalog.create(&product).await,
                "Added successfully!",
                "Failed to add!",
            ),
            SessionMode::Edit { product_id } => (
                self.catalog.update(product_id, &product).await,
                "Updated successfully!",
                "Update failed!",
            ),
        };

        match result {
            Ok(stored) => {
                info!(
                    "saved product {:?} with quantity {}",
                    stored.product_id, stored.quantity
                );
                self.notifier.success(SYSTEM, done);
                self.session = self.fresh_session();
                Ok(stored)
            }
            Err(e) => {
                error!("saving product failed: {}", e);
                self.notifier.error(ERROR, failed);
                Err(e.into())
            }
        }
    }
}
