#![cfg(not(tarpaulin_include))]

use shoegrid::catalog::{FileCatalog, ProductCatalog};
use shoegrid::config::AppConfig;
use shoegrid::editor::ProductEditor;
use shoegrid::export;
use shoegrid::notify::RecordingNotifier;
use shoegrid::product::Product;
use shoegrid::session::{EditSession, ProductDetails};
use shoegrid::stats;
use shoegrid::storefront::VariantPicker;
use shoegrid::upload::{DirectoryUploader, UploadFile};

use std::env;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

fn display(session: &EditSession) {
    let view = session.view();
    println!(
        "{:?} | {} | price {} | -{}% | category {}",
        view.mode, view.details.name, view.details.price, view.details.discount, view.details.category_id
    );

    print!("{:>6}", "");
    for color in &view.colors {
        let busy = if color.uploading { "*" } else { "" };
        print!("{:>10}", format!("{}{}", color.name, busy));
    }
    println!("{:>8}", "Total");

    for row in &view.sizes {
        print!("{:>6}", row.value);
        for quantity in &row.quantities {
            print!("{:>10}", quantity);
        }
        println!("{:>8}", row.total);
    }

    print!("{:>6}", "Total");
    for color in &view.colors {
        print!("{:>10}", color.total);
    }
    println!("{:>8}", view.grand_total);

    for (c, color) in view.colors.iter().enumerate() {
        if !color.images.is_empty() {
            println!("  images[{}] {}: {}", c, color.name, color.images.len());
        }
    }
    println!("stock: {}", view.effective_quantity);
}

fn help() {
    println!("Commands:");
    println!("  q: Quit");
    println!("  new: Start a blank product");
    println!("  open <id>: Edit a saved product");
    println!("  list: List saved products");
    println!("  categories: List categories");
    println!("  size <value> | rmsize <i>");
    println!("  color <name> [#code] | rmcolor <i>");
    println!("  top: Best sellers of the catalog");
    println!("  pick <id> <size> <color>: Try the product page picker");
    println!("  set <size> <color> <quantity>");
    println!("  img <color> <file> | rmimg <color> <image>");
    println!("  main <file>: Upload the main image");
    println!("  name|price|discount|desc|qty|category <value>");
    println!("  save: Create or update the product");
    println!("  csv <file>: Export the stock sheet");
    println!("  disable_output / enable_output");
}

/// Splits `color <name> [#code]`. The name may contain spaces; the last
/// word is the code only when it starts with `#`.
fn split_color(rest: &str) -> (&str, &str) {
    let rest = rest.trim();
    match rest.rsplit_once(char::is_whitespace) {
        Some((name, code)) if code.starts_with('#') => (name.trim_end(), code),
        _ if rest.starts_with('#') => ("", rest),
        _ => (rest, ""),
    }
}

/// Prints what the product page would offer for one size and color.
fn pick(product: &Product, size: usize, color: usize) -> bool {
    let mut picker = VariantPicker::new(product);
    if let Err(e) = picker.select_size(size) {
        eprintln!("{}", e);
        return false;
    }
    let available: Vec<&str> = picker
        .available_colors()
        .iter()
        .map(|c| c.color_name.as_str())
        .collect();
    println!("in stock: {}", available.join(", "));

    match picker.select_color(color).and_then(|()| picker.confirm()) {
        Ok(line) => {
            println!(
                "{} / {}: {} left at {:.0}",
                line.size_value,
                line.color_name,
                picker.variant_quantity(),
                line.unit_price
            );
            true
        }
        Err(e) => {
            eprintln!("{}", e);
            false
        }
    }
}

fn index(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|a| a.trim().parse().ok())
}

/// Applies a `field value` command to the form details.
fn edit_details(details: &mut ProductDetails, field: &str, value: &str) -> bool {
    match field {
        "name" => details.name = value.to_string(),
        "desc" => details.description = value.to_string(),
        "price" => match value.parse() {
            Ok(price) => details.price = price,
            Err(_) => return false,
        },
        "discount" => match value.parse() {
            Ok(discount) => details.discount = discount,
            Err(_) => return false,
        },
        "qty" => match value.parse() {
            Ok(quantity) => details.quantity = quantity,
            Err(_) => return false,
        },
        "category" => match value.parse() {
            Ok(id) => details.category_id = id,
            Err(_) => return false,
        },
        _ => return false,
    }
    true
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let s = Instant::now();

    let mut config = AppConfig::from_env();
    if let Some(dir) = env::args().nth(1) {
        config.data_dir = dir.into();
    }

    let catalog = Arc::new(FileCatalog::open(&config.data_dir)?);
    let toasts = Arc::new(RecordingNotifier::new());
    let mut editor = ProductEditor::new(
        catalog.clone(),
        catalog.clone(),
        Arc::new(DirectoryUploader::new(&config.media_dir)),
        toasts.clone(),
    )
    .with_keying(config.keying)
    .with_placeholder_image(config.default_image.clone());

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    let mut show = true;
    loop {
        if show {
            display(editor.session());
        }

        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        start_time = Instant::now();

        if line.is_empty() {
            status = String::from("invalid command");
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let ok = match command {
            "q" => break,
            "help" => {
                help();
                true
            }
            "disable_output" => {
                show = false;
                true
            }
            "enable_output" => {
                show = true;
                true
            }
            "new" => {
                editor.open_new();
                true
            }
            "open" => match index(args.first().copied()) {
                Some(id) => editor.open_existing(id as i64).await.is_ok(),
                None => false,
            },
            "list" => match ProductCatalog::fetch_all(catalog.as_ref()).await {
                Ok(products) => {
                    for product in products {
                        println!(
                            "{:>4}  {:<24} stock {:>5}  sold {:>4}",
                            product.product_id.unwrap_or_default(),
                            product.name,
                            product.quantity,
                            product.sold
                        );
                    }
                    true
                }
                Err(e) => {
                    eprintln!("{}", e);
                    false
                }
            },
            "top" => match ProductCatalog::fetch_all(catalog.as_ref()).await {
                Ok(products) => {
                    let series = stats::best_seller_series(&products);
                    for (label, value) in series.labels.iter().zip(&series.values) {
                        println!("{:<20} {:>6}", label, value);
                    }
                    true
                }
                Err(e) => {
                    eprintln!("{}", e);
                    false
                }
            },
            "pick" => match (index(args.first().copied()), index(args.get(1).copied()), index(args.get(2).copied())) {
                (Some(id), Some(size), Some(color)) => match catalog.fetch_one(id as i64).await {
                    Ok(product) => pick(&product, size, color),
                    Err(e) => {
                        eprintln!("{}", e);
                        false
                    }
                },
                _ => false,
            },
            "categories" => match editor.load_categories().await {
                Ok(categories) => {
                    for category in categories {
                        println!("{:>4}  {}", category.category_id, category.category_name);
                    }
                    true
                }
                Err(_) => false,
            },
            "size" => editor.add_size(rest).is_ok(),
            "rmsize" => index(args.first().copied()).is_some_and(|i| editor.remove_size(i).is_ok()),
            "color" => {
                let (name, code) = split_color(rest);
                editor.add_color(name, code).is_ok()
            }
            "rmcolor" => index(args.first().copied()).is_some_and(|i| editor.remove_color(i).is_ok()),
            "set" => match (index(args.first().copied()), index(args.get(1).copied()), args.get(2)) {
                (Some(size), Some(color), Some(value)) => editor.set_quantity(size, color, value).is_ok(),
                _ => false,
            },
            "img" => match (index(args.first().copied()), args.get(1)) {
                (Some(color), Some(path)) => match UploadFile::from_path(path) {
                    Ok(file) => editor.upload_color_image(color, file).await.is_ok(),
                    Err(e) => {
                        eprintln!("{}", e);
                        false
                    }
                },
                _ => false,
            },
            "rmimg" => match (index(args.first().copied()), index(args.get(1).copied())) {
                (Some(color), Some(image)) => editor.remove_image(color, image).is_ok(),
                _ => false,
            },
            "main" => match UploadFile::from_path(rest) {
                Ok(file) => editor.upload_main_image(file).await.is_ok(),
                Err(e) => {
                    eprintln!("{}", e);
                    false
                }
            },
            "save" => editor.save().await.is_ok(),
            "csv" if !rest.is_empty() => match std::fs::write(rest, export::to_csv(editor.session())) {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("{}", e);
                    false
                }
            },
            field @ ("name" | "price" | "discount" | "desc" | "qty" | "category") => {
                let mut details = editor.session().details.clone();
                let changed = edit_details(&mut details, field, rest);
                if changed {
                    editor.set_details(details);
                }
                changed
            }
            _ => false,
        };

        status = match toasts.drain().pop() {
            Some(toast) => toast.message,
            None if ok => String::from("ok"),
            None => String::from("invalid command"),
        };
    }

    let e = s.elapsed().as_secs_f64();
    println!("Total elapsed time: {:.1} seconds", e);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_names_may_contain_spaces() {
        assert_eq!(split_color("Sky Blue"), ("Sky Blue", ""));
        assert_eq!(split_color("Sky Blue #87CEEB"), ("Sky Blue", "#87CEEB"));
        assert_eq!(split_color("  Red   #f00 "), ("Red", "#f00"));
        assert_eq!(split_color("Red"), ("Red", ""));
        assert_eq!(split_color("#fff"), ("", "#fff"));
    }
}
