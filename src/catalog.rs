use async_trait::async_trait;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::CatalogError;
use crate::product::{Category, Product, SizeColorVariant};
use crate::saving::{load_product, save_product};

/// Product catalog service consumed by the product forms.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn fetch_one(&self, id: i64) -> Result<Product, CatalogError>;
    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError>;
    async fn create(&self, product: &Product) -> Result<Product, CatalogError>;
    async fn update(&self, id: i64, product: &Product) -> Result<Product, CatalogError>;
}

/// Read-only category list for the category selector.
#[async_trait]
pub trait CategoryListing: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Category>, CatalogError>;
}

/// Gives a submitted product the shape the backend stores: fresh ids for the
/// product and everything nested in it, and every variant pointing at the
/// stored color with the same name. Variants naming no stored color are
/// dropped.
pub fn assign_ids(mut product: Product, product_id: i64) -> Product {
    product.product_id = Some(product_id);
    let mut next_id = 1;
    let mut take_id = || {
        let id = next_id;
        next_id += 1;
        Some(id)
    };

    for color in &mut product.colors {
        color.color_id = take_id();
        for image in &mut color.images {
            image.image_id = take_id();
        }
    }

    let stored_colors = product.colors.clone();
    for size in &mut product.sizes {
        size.size_id = take_id();
        let submitted = std::mem::take(&mut size.color_variants);
        for variant in submitted {
            let Some(name) = variant.product_color.as_ref().map(|c| c.color_name.as_str()) else {
                continue;
            };
            let Some(color) = stored_colors.iter().find(|c| c.color_name == name) else {
                debug!("dropping variant for unknown color {}", name);
                continue;
            };
            size.color_variants.push(SizeColorVariant {
                variant_id: take_id(),
                quantity: variant.quantity,
                product_color: Some(color.clone()),
            });
        }
    }
    product
}

/// Offline catalog keeping one gzip-compressed snapshot per product in a
/// directory, plus `categories.json`.
pub struct FileCatalog {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

const CATEGORIES_FILE: &str = "categories.json";

impl FileCatalog {
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileCatalog {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn product_path(&self, id: i64) -> PathBuf {
        self.dir.join(format!("product-{}.bin.gz", id))
    }

    fn product_ids(&self) -> std::io::Result<Vec<i64>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let id = name
                .to_str()
                .and_then(|n| n.strip_prefix("product-"))
                .and_then(|n| n.strip_suffix(".bin.gz"))
                .and_then(|n| n.parse::<i64>().ok());
            if let Some(id) = id {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn put_categories(&self, categories: &[Category]) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(categories).map_err(|e| CatalogError::Decode(e.to_string()))?;
        fs::write(self.dir.join(CATEGORIES_FILE), json)?;
        Ok(())
    }

    fn store(&self, product: &Product, id: i64) -> Result<Product, CatalogError> {
        let stored = assign_ids(product.clone(), id);
        save_product(&stored, self.product_path(id))?;
        info!("stored product {} ({} sizes, {} colors)", id, stored.sizes.len(), stored.colors.len());
        Ok(stored)
    }
}

#[async_trait]
impl ProductCatalog for FileCatalog {
    async fn fetch_one(&self, id: i64) -> Result<Product, CatalogError> {
        let path = self.product_path(id);
        if !path.exists() {
            return Err(CatalogError::NotFound(id));
        }
        Ok(load_product(path)?)
    }

    async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
        let mut products = Vec::new();
        for id in self.product_ids()? {
            products.push(load_product(self.product_path(id))?);
        }
        Ok(products)
    }

    async fn create(&self, product: &Product) -> Result<Product, CatalogError> {
        let _guard = self.write_lock.lock().map_err(|e| CatalogError::Transport(e.to_string()))?;
        let ids = self.product_ids()?;
        if let Some(id) = product.product_id.filter(|id| *id > 0) {
            if ids.contains(&id) {
                return Err(CatalogError::Status {
                    status: 400,
                    body: format!("product {} already exists", id),
                });
            }
        }
        let id = ids.last().copied().unwrap_or(0) + 1;
        self.store(product, id)
    }

    async fn update(&self, id: i64, product: &Product) -> Result<Product, CatalogError> {
        let _guard = self.write_lock.lock().map_err(|e| CatalogError::Transport(e.to_string()))?;
        if !self.product_path(id).exists() {
            return Err(CatalogError::NotFound(id));
        }
        self.store(product, id)
    }
}

#[async_trait]
impl CategoryListing for FileCatalog {
    async fn fetch_all(&self) -> Result<Vec<Category>, CatalogError> {
        let path = self.dir.join(CATEGORIES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[cfg(feature = "web")]
pub use rest::RestCatalog;

#[cfg(feature = "web")]
mod rest {
    use super::*;
    use serde::de::DeserializeOwned;
    use std::time::Duration;

    /// Client for the shop's REST backend.
    pub struct RestCatalog {
        client: reqwest::Client,
        base_url: String,
    }

    impl RestCatalog {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new());
            RestCatalog {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}/{}", self.base_url, path)
        }

        async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CatalogError> {
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            response
                .json::<T>()
                .await
                .map_err(|e| CatalogError::Decode(e.to_string()))
        }
    }

    fn transport(e: reqwest::Error) -> CatalogError {
        CatalogError::Transport(e.to_string())
    }

    #[async_trait]
    impl ProductCatalog for RestCatalog {
        async fn fetch_one(&self, id: i64) -> Result<Product, CatalogError> {
            let response = self
                .client
                .get(self.url(&format!("products/{}", id)))
                .send()
                .await
                .map_err(transport)?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(CatalogError::NotFound(id));
            }
            Self::read(response).await
        }

        async fn fetch_all(&self) -> Result<Vec<Product>, CatalogError> {
            let response = self.client.get(self.url("products")).send().await.map_err(transport)?;
            Self::read(response).await
        }

        async fn create(&self, product: &Product) -> Result<Product, CatalogError> {
            let response = self
                .client
                .post(self.url("products"))
                .json(product)
                .send()
                .await
                .map_err(transport)?;
            Self::read(response).await
        }

        async fn update(&self, id: i64, product: &Product) -> Result<Product, CatalogError> {
            let response = self
                .client
                .put(self.url(&format!("products/{}", id)))
                .json(product)
                .send()
                .await
                .map_err(transport)?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(CatalogError::NotFound(id));
            }
            Self::read(response).await
        }
    }

    #[async_trait]
    impl CategoryListing for RestCatalog {
        async fn fetch_all(&self) -> Result<Vec<Category>, CatalogError> {
            let response = self.client.get(self.url("categories")).send().await.map_err(transport)?;
            Self::read(response).await
        }
    }
}
