use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One discounted item as observed at one retailer.
///
/// Prices decode from either JSON strings (`"7.50"`, the shape the scraper
/// services emit) or JSON numbers, and always encode as strings so no
/// precision is lost on the way back out.
///
/// Derived fields are taken verbatim from the upstream and may disagree with
/// `current_price` / `rrp`; nothing here reconciles them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Display name. Also the identity key used for de-duplication.
    pub item_name: String,
    pub retailer: String,
    pub product_link: String,
    pub image_link: String,
    pub current_price: Decimal,
    /// Recommended retail price.
    pub rrp: Decimal,
    /// Conventionally `rrp - current_price`.
    pub discount_amount: Decimal,
    /// Fraction in `[0, 1]`, conventionally `1 - current_price / rrp`.
    pub discount_percentage: Decimal,
}

impl ProductRecord {
    /// Builds a record whose discount fields are derived from `current_price`
    /// and `rrp`, rounded to two decimal places.
    ///
    /// A zero `rrp` yields a zero discount percentage.
    #[must_use]
    pub fn with_derived_discount(
        item_name: impl Into<String>,
        retailer: impl Into<String>,
        current_price: Decimal,
        rrp: Decimal,
    ) -> Self {
        let discount_amount = rrp - current_price;
        let discount_percentage = if rrp.is_zero() {
            Decimal::ZERO
        } else {
            (Decimal::ONE - current_price / rrp).round_dp(2)
        };
        Self {
            item_name: item_name.into(),
            retailer: retailer.into(),
            product_link: String::new(),
            image_link: String::new(),
            current_price,
            rrp,
            discount_amount,
            discount_percentage,
        }
    }
}
