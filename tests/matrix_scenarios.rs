use shoegrid::materialize::{from_product, to_variants};
use shoegrid::sizes::normalize_size;
use shoegrid::{EditSession, FormError, Keying, Product, ProductColor, ProductSize, SizeColorVariant};

/// Sizes 38, 40 and colors Red, Blue with
/// (38,Red)=5, (38,Blue)=3, (40,Red)=2, (40,Blue)=0.
fn stocked(keying: Keying) -> EditSession {
    let mut session = EditSession::new(keying);
    session.add_size("38").unwrap();
    session.add_size("40").unwrap();
    session.add_color("Red", "#ff0000").unwrap();
    session.add_color("Blue", "#0000ff").unwrap();
    session.set_quantity(0, 0, "5").unwrap();
    session.set_quantity(0, 1, "3").unwrap();
    session.set_quantity(1, 0, "2").unwrap();
    session.set_quantity(1, 1, "0").unwrap();
    session
}

fn assert_consistent(session: &EditSession) {
    let (sizes, colors) = (session.sizes(), session.colors());
    assert!(session.matrix().is_consistent(sizes, colors));
    assert_eq!(session.matrix().len(), sizes.len() * colors.len());

    let by_size: u64 = (0..sizes.len()).map(|s| session.size_total(s)).sum();
    let by_color: u64 = (0..colors.len()).map(|c| session.color_total(c)).sum();
    assert_eq!(session.grand_total(), by_size);
    assert_eq!(session.grand_total(), by_color);
}

#[test]
fn size_normalization() {
    for raw in ["36", " 36 ", "036"] {
        assert_eq!(normalize_size(raw).as_deref(), Some("36"));
    }
    for raw in ["34", "46", "abc", ""] {
        assert_eq!(normalize_size(raw), None);
    }
}

#[test]
fn totals_of_stocked_grid() {
    for keying in [Keying::Stable, Keying::Positional] {
        let session = stocked(keying);
        assert_eq!(session.grand_total(), 10);
        assert_eq!(session.size_total(0), 8);
        assert_eq!(session.color_total(1), 3);
        assert_consistent(&session);
    }
}

#[test]
fn removing_red_keeps_blue_quantities() {
    let mut session = stocked(Keying::Stable);
    session.remove_color(0).unwrap();

    assert_eq!(session.colors().len(), 1);
    assert_eq!(session.colors().get(0).unwrap().color_name, "Blue");
    assert_eq!(session.quantity(0, 0), 3);
    assert_eq!(session.quantity(1, 0), 0);
    assert_eq!(session.grand_total(), 3);
    assert_consistent(&session);
}

#[test]
fn positional_keying_loses_shifted_column() {
    let mut session = stocked(Keying::Positional);
    session.remove_color(0).unwrap();

    // Blue now sits where Red was, and Red's cells were discarded first.
    assert_eq!(session.colors().get(0).unwrap().color_name, "Blue");
    assert_eq!(session.grand_total(), 0);
    assert_consistent(&session);
}

#[test]
fn positional_keying_keeps_cells_before_removed_size() {
    let mut session = EditSession::new(Keying::Positional);
    for size in ["38", "39", "40"] {
        session.add_size(size).unwrap();
    }
    session.add_color("Red", "").unwrap();
    session.set_quantity(0, 0, "4").unwrap();
    session.set_quantity(1, 0, "6").unwrap();
    session.set_quantity(2, 0, "8").unwrap();

    session.remove_size(1).unwrap();
    assert_eq!(session.quantity(0, 0), 4);
    assert_eq!(session.quantity(1, 0), 0);
    assert_consistent(&session);
}

#[test]
fn invariants_hold_over_operation_sequences() {
    for keying in [Keying::Stable, Keying::Positional] {
        let mut session = EditSession::new(keying);
        let mut seed: u64 = 0x5eed;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        for step in 0..400 {
            match next() % 6 {
                0 => {
                    let _ = session.add_size(&(35 + next() % 11).to_string());
                }
                1 => {
                    let _ = session.add_color(&format!("C{}", step), "");
                }
                2 if !session.sizes().is_empty() => {
                    let index = next() % session.sizes().len();
                    session.remove_size(index).unwrap();
                }
                3 if !session.colors().is_empty() => {
                    let index = next() % session.colors().len();
                    session.remove_color(index).unwrap();
                }
                _ if session.has_variants() => {
                    let s = next() % session.sizes().len();
                    let c = next() % session.colors().len();
                    session.set_quantity(s, c, &(next() % 50).to_string()).unwrap();
                }
                _ => {}
            }
            assert_consistent(&session);
        }
    }
}

#[test]
fn rejected_operations_change_nothing() {
    let mut session = stocked(Keying::Stable);

    assert!(matches!(session.add_size("38"), Err(FormError::DuplicateSize(_))));
    assert!(matches!(session.add_size("50"), Err(FormError::InvalidSize(_))));
    assert!(matches!(session.add_color("  ", ""), Err(FormError::EmptyColorName)));
    assert!(matches!(session.remove_color(5), Err(FormError::ColorIndex { .. })));
    assert!(matches!(session.set_quantity(2, 0, "1"), Err(FormError::SizeIndex { .. })));

    assert_eq!(session.sizes().len(), 2);
    assert_eq!(session.colors().len(), 2);
    assert_eq!(session.grand_total(), 10);
}

#[test]
fn typed_cells_keep_leading_integer() {
    let mut session = EditSession::new(Keying::Stable);
    session.add_size("41").unwrap();
    session.add_color("Sand", "beige").unwrap();

    assert_eq!(session.set_quantity(0, 0, "5 pairs"), Ok(5));
    assert_eq!(session.set_quantity(0, 0, "3.7"), Ok(3));
    assert_eq!(session.set_quantity(0, 0, "pairs"), Ok(0));
    assert_eq!(session.colors().get(0).unwrap().color_code, "beige");
}

#[test]
fn materialize_round_trip() {
    let session = stocked(Keying::Stable);
    let sizes = to_variants(session.sizes(), session.colors(), session.matrix());
    assert!(sizes.iter().all(|s| s.color_variants.len() == 2));

    let product = Product {
        sizes,
        colors: session.colors().iter().cloned().collect(),
        ..Product::new(Some(1))
    };
    let reopened = EditSession::for_product(&product, Keying::Stable);

    for (s, size) in session.sizes().iter().enumerate() {
        for (c, color) in session.colors().iter().enumerate() {
            let s2 = reopened.sizes().iter().position(|x| x.size_value == size.size_value).unwrap();
            let c2 = reopened.colors().iter().position(|x| x.color_name == color.color_name).unwrap();
            assert_eq!(reopened.quantity(s2, c2), session.quantity(s, c));
        }
    }
}

#[test]
fn loading_sparse_product_fills_zeros() {
    let mut black = ProductColor::new("Black", "#000000");
    black.color_id = Some(1);
    let mut white = ProductColor::new("White", "#ffffff");
    white.color_id = Some(2);

    let mut s36 = ProductSize::new("36");
    s36.color_variants.push(SizeColorVariant::new(black.clone(), 7));
    let s38 = ProductSize::new("38");

    let product = Product {
        sizes: vec![s36, s38],
        colors: vec![black, white],
        ..Product::new(Some(9))
    };

    let (sizes, colors, matrix) = from_product(&product, Keying::Stable);
    assert_eq!(matrix.get(&sizes, &colors, 0, 0), 7);
    assert_eq!(matrix.get(&sizes, &colors, 0, 1), 0);
    assert_eq!(matrix.get(&sizes, &colors, 1, 0), 0);
    assert_eq!(matrix.get(&sizes, &colors, 1, 1), 0);
    assert_eq!(matrix.len(), 4);
    assert_eq!(matrix.grand_total(), 7);
}
