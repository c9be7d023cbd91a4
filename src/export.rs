use crate::session::EditSession;

fn push_field(out: &mut String, value: &str) {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

fn push_row<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field.as_ref());
    }
    out.push('\n');
}

/// Stock sheet of the form as CSV.
///
/// One row per size with a per-size total, then a `Total` row holding the
/// color totals and the grand total.
///
/// # Examples
/// ```
/// use shoegrid::export::to_csv;
/// use shoegrid::matrix::Keying;
/// use shoegrid::session::EditSession;
///
/// let mut session = EditSession::new(Keying::Stable);
/// session.add_size("40").unwrap();
/// session.add_color("Red", "#f00").unwrap();
/// session.set_quantity(0, 0, "3").unwrap();
/// assert_eq!(to_csv(&session), "Size,Red,Total\n40,3,3\nTotal,3,3\n");
/// ```
pub fn to_csv(session: &EditSession) -> String {
    let colors = session.colors();
    let mut csv = String::new();

    let mut header = vec!["Size".to_string()];
    header.extend(colors.iter().map(|c| c.color_name.clone()));
    header.push("Total".to_string());
    push_row(&mut csv, header);

    for (s, size) in session.sizes().iter().enumerate() {
        let mut row = vec![size.size_value.clone()];
        row.extend((0..colors.len()).map(|c| session.quantity(s, c).to_string()));
        row.push(session.size_total(s).to_string());
        push_row(&mut csv, row);
    }

    let mut footer = vec!["Total".to_string()];
    footer.extend((0..colors.len()).map(|c| session.color_total(c).to_string()));
    footer.push(session.grand_total().to_string());
    push_row(&mut csv, footer);

    csv
}

/// Same grid as [`to_csv`], as an XLSX workbook.
#[cfg(feature = "web")]
pub fn to_xlsx(session: &EditSession) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    use rust_xlsxwriter::{Format, Workbook};

    let colors = session.colors();
    let sizes = session.sizes();
    let last_col = colors.len() as u16 + 1;
    let footer = sizes.len() as u32 + 1;
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string_with_format(0, 0, "Size", &bold)?;
    for (c, color) in colors.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16 + 1, &color.color_name, &bold)?;
    }
    sheet.write_string_with_format(0, last_col, "Total", &bold)?;

    for (s, size) in sizes.iter().enumerate() {
        let row = s as u32 + 1;
        sheet.write_string(row, 0, &size.size_value)?;
        for c in 0..colors.len() {
            sheet.write_number(row, c as u16 + 1, f64::from(session.quantity(s, c)))?;
        }
        sheet.write_number(row, last_col, session.size_total(s) as f64)?;
    }

    sheet.write_string_with_format(footer, 0, "Total", &bold)?;
    for c in 0..colors.len() {
        sheet.write_number(footer, c as u16 + 1, session.color_total(c) as f64)?;
    }
    sheet.write_number(footer, last_col, session.grand_total() as f64)?;

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Keying;

    #[test]
    fn csv_has_totals_and_quotes_names() {
        let mut session = EditSession::new(Keying::Stable);
        session.add_size("38").unwrap();
        session.add_size("39").unwrap();
        session.add_color("Black, matte", "").unwrap();
        session.add_color("Sky \"blue\"", "#87ceeb").unwrap();
        session.set_quantity(0, 0, "2").unwrap();
        session.set_quantity(1, 1, "5").unwrap();

        let csv = to_csv(&session);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], r#"Size,"Black, matte","Sky ""blue""",Total"#);
        assert_eq!(lines[1], "38,2,0,2");
        assert_eq!(lines[2], "39,0,5,5");
        assert_eq!(lines[3], "Total,2,5,7");
    }

    #[test]
    fn csv_of_empty_form() {
        let session = EditSession::new(Keying::Stable);
        assert_eq!(to_csv(&session), "Size,Total\nTotal,0\n");
    }

    #[cfg(feature = "web")]
    #[test]
    fn xlsx_is_a_zip() {
        let mut session = EditSession::new(Keying::Stable);
        session.add_size("42").unwrap();
        session.add_color("Red", "").unwrap();
        let bytes = to_xlsx(&session).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
