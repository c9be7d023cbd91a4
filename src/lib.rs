/*!
# Shoegrid

Inventory editor for a shoe store's product catalog, built in Rust.

## Overview

A shoe product is stocked per (size, color) pair. The admin form lets a
merchant pick the sizes (35 to 45) and colors a product comes in, type a
quantity for every pair, attach images to each color, and save the product
to the shop's catalog service. The same quantities drive the storefront's
size and color picker and the sales dashboards.

## Architecture

### Editing core
- **Size Registry** / **Color Registry** - ordered, validated lists of the
  sizes and colors being edited, each slot with a session-local key
- **Quantity Matrix** - sparse size x color -> quantity map with row,
  column and grand totals, kept in step with both registries
- **Variant Materializer** - converts between the matrix and the nested
  size -> variants records the catalog stores
- **Edit Session** - the whole form: details, registries, matrix, uploads

### Collaborators
- Product catalog and category listing (REST backend, or gzip snapshots on
  disk for offline use)
- Image uploader (HTTP multipart, or a local media directory)
- Toast notifier

### Surfaces
- Admin HTTP API over one shared editor (`web` feature)
- Interactive command line editor
- CSV / XLSX stock sheet export
- Storefront variant picker and dashboard statistics, with PNG charts
  behind the `charts` feature

## Modules

- **product**: catalog records (product, size, color, variant, image, category)
- **sizes**, **colors**: registries
- **matrix**: quantity matrix and quantity parsing
- **materialize**: matrix <-> variant records
- **session**: edit session and form validation
- **editor**: form controller with toasts and save flow
- **catalog**: catalog traits, file catalog, REST client
- **upload**: uploader trait, upload tracking, uploaders
- **saving**: product snapshots with compression
- **export**: stock sheet export (CSV, XLSX)
- **storefront**: size/color picker for the product page
- **stats**, **chart**: dashboard figures and charts
- **config**: environment configuration
- **app**: routing and middleware
*/

pub mod catalog;
pub mod colors;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod materialize;
pub mod matrix;
pub mod notify;
pub mod product;
pub mod saving;
pub mod session;
pub mod sizes;
pub mod stats;
pub mod storefront;
pub mod upload;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "charts")]
pub mod chart;

pub use editor::ProductEditor;
pub use error::{CatalogError, EditorError, FormError, UploadError};
pub use matrix::{Keying, QuantityMatrix, SlotKey};
pub use product::{Category, Product, ProductColor, ProductImage, ProductSize, SizeColorVariant};
pub use session::{EditSession, ProductDetails, SessionMode};
