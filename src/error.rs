use thiserror::Error;

/// Validation failures raised while editing a product form.
///
/// These are always recovered locally: the operation that produced one made
/// no change to the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Size must be an integer from 35 to 45: {0:?}")]
    InvalidSize(String),

    #[error("Size already exists: {0}")]
    DuplicateSize(String),

    #[error("Color name must not be empty")]
    EmptyColorName,

    #[error("Size index {index} out of range (have {len})")]
    SizeIndex { index: usize, len: usize },

    #[error("Color index {index} out of range (have {len})")]
    ColorIndex { index: usize, len: usize },

    #[error("Image index {index} out of range (have {len})")]
    ImageIndex { index: usize, len: usize },

    #[error("Sizes and colors must both be chosen to keep stock in sync")]
    InconsistentVariants,

    #[error("Invalid product field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Failures from the image upload collaborator.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("An upload is already running for this image slot")]
    Busy,

    #[error("Upload failed: {0}")]
    Failed(String),

    #[error("Upload IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures from the product catalog or category listing.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(i64),

    #[error("Request rejected by backend (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Backend transport error: {0}")]
    Transport(String),

    #[error("Could not decode backend data: {0}")]
    Decode(String),

    #[error("Catalog storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything a product editor operation can fail with.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type FormResult<T> = Result<T, FormError>;
pub type EditorResult<T> = Result<T, EditorError>;

/// Failures while drawing a dashboard chart.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Nothing to draw: the series is empty")]
    Empty,

    #[error("Chart drawing failed: {0}")]
    Draw(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
