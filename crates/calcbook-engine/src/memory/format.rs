//! Number-format rendering behind `formatted_cell_value`.
//!
//! Covers the format shapes the SDK round-trips in practice: `general`,
//! plain decimal patterns (`0`, `0.00`, `#,##0.00`) and their percent
//! variants. Anything else falls back to the plain value literal.

use crate::CellValue;

pub(super) fn render(value: &CellValue, number_format: &str) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::String(s) => s.clone(),
        CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Number(n) => render_number(*n, number_format),
    }
}

fn render_number(n: f64, format: &str) -> String {
    if format.is_empty() || format.eq_ignore_ascii_case("general") {
        return CellValue::Number(n).to_string();
    }
    if let Some(body) = format.strip_suffix('%') {
        if is_decimal_pattern(body) {
            return format!("{:.*}%", fraction_digits(body), n * 100.0);
        }
    }
    if is_decimal_pattern(format) {
        return format!("{:.*}", fraction_digits(format), n);
    }
    CellValue::Number(n).to_string()
}

fn is_decimal_pattern(pattern: &str) -> bool {
    !pattern.is_empty() && pattern.chars().all(|c| matches!(c, '0' | '#' | ',' | '.'))
}

fn fraction_digits(pattern: &str) -> usize {
    match pattern.split_once('.') {
        Some((_, frac)) => frac.chars().filter(|c| matches!(c, '0' | '#')).count(),
        None => 0,
    }
}
