use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::product::Product;

/// Writes a product snapshot as gzip-compressed bincode.
pub fn save_product(product: &Product, path: impl AsRef<Path>) -> std::io::Result<()> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, product)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?.flush()?;
    Ok(())
}

pub fn load_product(path: impl AsRef<Path>) -> std::io::Result<Product> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let product: Product = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{ProductColor, ProductSize, SizeColorVariant};
    use chrono::NaiveDate;

    #[test]
    fn snapshot_survives_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product-1.bin.gz");

        let mut product = Product::new(Some(1));
        product.name = "Trail Runner".into();
        product.entered_date = NaiveDate::from_ymd_opt(2025, 1, 31);
        let red = ProductColor::new("Red", "#ff0000");
        let mut size = ProductSize::new("41");
        size.color_variants.push(SizeColorVariant::new(red.clone(), 6));
        product.colors.push(red);
        product.sizes.push(size);

        save_product(&product, &path).unwrap();
        assert_eq!(load_product(&path).unwrap(), product);
    }

    #[test]
    fn garbage_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin.gz");
        std::fs::write(&path, b"not gzip").unwrap();
        assert!(load_product(&path).is_err());
    }
}
