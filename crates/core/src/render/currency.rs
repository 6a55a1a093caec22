use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Price after the product-level percentage discount, rounded to whole VND.
/// Discounts above 100 are clamped.
pub fn final_price(price: i64, discount: u8) -> i64 {
    let discount = Decimal::from(discount.min(100));
    let hundred = Decimal::ONE_HUNDRED;
    let discounted = Decimal::from(price) * (hundred - discount) / hundred;
    discounted.round().to_i64().unwrap_or(price)
}

/// `8000000` → `"8.000.000 VNĐ"`.
pub fn format_vnd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} VNĐ")
}
