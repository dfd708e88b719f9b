//! Price and change formatting

use crate::instrument::PriceFormat;

/// Render a price according to its display class
pub fn format_price(price: f64, format: PriceFormat) -> String {
    match format {
        PriceFormat::Grouped => group_thousands(&format!("{:.2}", price)),
        PriceFormat::Plain => format!("{:.2}", price),
    }
}

/// Insert `,` separators into the integer part of a decimal string
fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Percent change from `previous` to `current`
///
/// A zero `previous` (or any non-finite result) reports `0.0`.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        tracing::debug!(current, "Zero previous price, reporting flat change");
        return 0.0;
    }
    let change = (current - previous) / previous * 100.0;
    if change.is_finite() {
        change
    } else {
        0.0
    }
}

/// Round a percentage to two decimal places
pub fn round_change(change: f64) -> f64 {
    let rounded = (change * 100.0).round() / 100.0;
    // avoid "-0.00" leaking out as a down move
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
