//! Parsing of the numeric part of human-written values: prices such as
//! `"10 triệu"` and spec strings such as `"8 GB"` or `"4000 mAh"`.
//!
//! Every function here returns `None` instead of failing: a value that cannot
//! be read simply contributes no bound.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const MAX_WHOLE_DIGITS: usize = 19;
const MAX_FRACTION_DIGITS: usize = 9;

/// Magnitude words written directly after a number.
const ATTACHED_UNITS: &[(&str, u64)] = &[
    ("triệu", 1_000_000),
    ("trieu", 1_000_000),
    ("tr", 1_000_000),
    ("nghìn", 1_000),
    ("nghin", 1_000),
    ("ngàn", 1_000),
    ("ngan", 1_000),
    ("k", 1_000),
    ("tỷ", 1_000_000_000),
    ("tỉ", 1_000_000_000),
    ("ty", 1_000_000_000),
];

/// Magnitude words recognised anywhere in the text. Short forms are left out
/// because they collide with ordinary Vietnamese words.
const FREE_UNITS: &[(&str, u64)] = &[
    ("triệu", 1_000_000),
    ("nghìn", 1_000),
    ("ngàn", 1_000),
    ("tỷ", 1_000_000_000),
    ("tỉ", 1_000_000_000),
];

#[derive(Clone, Debug, PartialEq, Eq)]
struct NumericToken {
    value: Decimal,
    /// Byte offset just past the token in the source text.
    end: usize,
}

/// First number in `text`, truncated to an integer. `"8 GB"` → 8,
/// `"RAM 12GB / 256GB"` → 12, `"8.5 GB"` → 8.
pub fn extract_number(text: &str) -> Option<u64> {
    first_numeric_token(text)?.value.trunc().to_u64()
}

/// Price in VND from free text. The first number is scaled by the magnitude
/// word that follows it (`"10tr"`, `"1,5 triệu"`, `"500k"`) or, failing that,
/// by a long-form magnitude word elsewhere in the text (`"tầm 7 mấy triệu"`).
pub fn parse_price(text: &str) -> Option<u64> {
    let token = first_numeric_token(text)?;
    let lowered = text.to_lowercase();
    let rest = text.get(token.end..).map(str::to_lowercase).unwrap_or_default();

    let multiplier = attached_unit(&rest).or_else(|| free_unit(&lowered)).unwrap_or(1);
    (token.value * Decimal::from(multiplier)).trunc().to_u64()
}

/// Storage size in GB. A `TB` unit after the number is converted at 1024 GB.
pub fn parse_storage_gb(text: &str) -> Option<u64> {
    let token = first_numeric_token(text)?;
    let rest = text.get(token.end..).unwrap_or_default().trim_start().to_lowercase();
    let value = if rest.starts_with("tb") { token.value * Decimal::from(1024) } else { token.value };
    value.trunc().to_u64()
}

fn attached_unit(rest: &str) -> Option<u64> {
    let word: String = rest.trim_start().chars().take_while(|ch| ch.is_alphabetic()).collect();
    if word.is_empty() {
        return None;
    }
    ATTACHED_UNITS.iter().find(|(unit, _)| *unit == word).map(|(_, multiplier)| *multiplier)
}

fn free_unit(lowered: &str) -> Option<u64> {
    lowered
        .split(|ch: char| !ch.is_alphanumeric())
        .find_map(|word| FREE_UNITS.iter().find(|(unit, _)| *unit == word))
        .map(|(_, multiplier)| *multiplier)
}

fn first_numeric_token(text: &str) -> Option<NumericToken> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let start = chars.iter().position(|(_, ch)| ch.is_ascii_digit())?;

    let mut whole = String::new();
    let mut index = start;
    loop {
        while let Some((_, ch)) = chars.get(index).filter(|(_, ch)| ch.is_ascii_digit()) {
            whole.push(*ch);
            index += 1;
        }
        if is_group_separator(&chars, index) {
            index += 1;
            continue;
        }
        break;
    }
    let whole = whole.trim_start_matches('0');
    if whole.len() > MAX_WHOLE_DIGITS {
        return None;
    }

    let mut fraction = String::new();
    let decimal_mark = chars.get(index).is_some_and(|(_, ch)| *ch == '.' || *ch == ',');
    let digit_follows = chars.get(index + 1).is_some_and(|(_, ch)| ch.is_ascii_digit());
    if decimal_mark && digit_follows {
        index += 1;
        while let Some((_, ch)) = chars.get(index).filter(|(_, ch)| ch.is_ascii_digit()) {
            if fraction.len() < MAX_FRACTION_DIGITS {
                fraction.push(*ch);
            }
            index += 1;
        }
    }

    let literal = match (whole.is_empty(), fraction.is_empty()) {
        (true, true) => "0".to_string(),
        (true, false) => format!("0.{fraction}"),
        (false, true) => whole.to_string(),
        (false, false) => format!("{whole}.{fraction}"),
    };
    let value = Decimal::from_str(&literal).ok()?;
    let end = chars.get(index).map(|(offset, _)| *offset).unwrap_or(text.len());

    Some(NumericToken { value, end })
}

/// `.` or `,` followed by exactly three digits is a thousands separator
/// (`1.000.000`), anything else is a decimal mark.
fn is_group_separator(chars: &[(usize, char)], index: usize) -> bool {
    let is_mark = chars.get(index).is_some_and(|(_, ch)| *ch == '.' || *ch == ',');
    if !is_mark {
        return false;
    }
    let three_digits =
        (1..=3).all(|offset| chars.get(index + offset).is_some_and(|(_, ch)| ch.is_ascii_digit()));
    let fourth_is_digit = chars.get(index + 4).is_some_and(|(_, ch)| ch.is_ascii_digit());
    three_digits && !fourth_is_digit
}
