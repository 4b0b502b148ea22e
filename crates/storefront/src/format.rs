//! Display formatting for prices and counters.

use rust_decimal::{Decimal, RoundingStrategy};

use shoplet_core::Price;

/// Compact-notation units, smallest first.
const COMPACT_UNITS: [(u128, &str); 4] = [
    (1_000, "k"),
    (1_000_000, "m"),
    (1_000_000_000, "b"),
    (1_000_000_000_000, "t"),
];

/// Format an amount with `.` thousands separators and `,` decimals.
///
/// At most three fraction digits are kept; trailing zeros are dropped.
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut out = String::with_capacity(text.len() + whole.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(digit);
    }
    if !fraction.is_empty() {
        out.push(',');
        out.push_str(fraction);
    }
    out
}

/// Format a counter compactly: `1234` → `1,2k`, `2500000` → `2,5m`.
///
/// Values below one thousand are printed as is.
#[must_use]
pub fn format_number_to_social_style(value: u64) -> String {
    let n = u128::from(value);
    if n < 1_000 {
        return value.to_string();
    }

    let scaled = |&(divisor, unit): &(u128, &'static str)| ((n * 10 + divisor / 2) / divisor, unit);
    // 999_950 rounds to 1000k; promote it to 1m instead.
    let (tenths, suffix) = COMPACT_UNITS
        .iter()
        .map(scaled)
        .find(|(tenths, _)| *tenths < 10_000)
        .unwrap_or_else(|| scaled(&COMPACT_UNITS[3]));

    let (whole, fraction) = (tenths / 10, tenths % 10);
    if fraction == 0 {
        format!("{whole}{suffix}")
    } else {
        format!("{whole},{fraction}{suffix}")
    }
}

/// Discount from `original` to `sale` as a rounded percentage, e.g. `"17%"`.
#[must_use]
pub fn rate_sale(original: Price, sale: Price) -> String {
    let original = original.amount();
    if original.is_zero() {
        return "0%".to_string();
    }
    let percent = ((original - sale.amount()) / original * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    if percent.is_zero() {
        return "0%".to_string();
    }
    format!("{percent}%")
}
