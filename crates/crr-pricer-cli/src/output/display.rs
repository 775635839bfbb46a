use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use super::minimal;

/// Print the option price the way a pricing form shows it: `Option Price: 7.48`.
///
/// Falls back to the minimal formatter when the output carries no price.
pub fn print_display(value: &Value) {
    let price = value
        .get("result")
        .and_then(|r| r.get("price"))
        .and_then(Value::as_f64);
    match price {
        Some(p) => println!("Option Price: {}", format_price(p)),
        None => minimal::print_minimal(value),
    }
}

/// Round a price to cents, half away from zero.
pub fn round_price(price: f64) -> Option<Decimal> {
    Decimal::from_f64(price).map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub fn format_price(price: f64) -> String {
    match round_price(price) {
        Some(d) => format!("{:.2}", d),
        None => format!("{:.2}", price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_price_to_cents() {
        assert_eq!(round_price(11.043871091951113), Some(dec!(11.04)));
        assert_eq!(round_price(6.166813542022532), Some(dec!(6.17)));
    }

    #[test]
    fn test_format_pads_two_decimals() {
        assert_eq!(format_price(7.0), "7.00");
        assert_eq!(format_price(7.4812), "7.48");
        assert_eq!(format_price(0.0), "0.00");
    }

    #[test]
    fn test_non_finite_falls_back_to_float_formatting() {
        assert_eq!(format_price(f64::INFINITY), "inf");
    }
}
