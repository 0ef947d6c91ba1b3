use std::cmp::Ordering;

use crate::products::ProductRecord;

/// Ordering applied to the catalog at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Ascending current price.
    LowestPrice,
    /// Descending discount amount.
    BiggestDiscountAmount,
    /// Descending discount percentage.
    #[default]
    HighestPercentage,
}

impl SortKey {
    /// Maps a query-string value onto a sort key.
    ///
    /// Missing or unrecognized values fall back to [`SortKey::HighestPercentage`].
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("lowest-price") => SortKey::LowestPrice,
            Some("biggest-discount-amount") => SortKey::BiggestDiscountAmount,
            _ => SortKey::HighestPercentage,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::LowestPrice => "lowest-price",
            SortKey::BiggestDiscountAmount => "biggest-discount-amount",
            SortKey::HighestPercentage => "highest-percentage",
        }
    }

    /// Compares two records numerically on this key's field.
    #[must_use]
    pub fn compare(self, a: &ProductRecord, b: &ProductRecord) -> Ordering {
        match self {
            SortKey::LowestPrice => a.current_price.cmp(&b.current_price),
            SortKey::BiggestDiscountAmount => b.discount_amount.cmp(&a.discount_amount),
            SortKey::HighestPercentage => b.discount_percentage.cmp(&a.discount_percentage),
        }
    }

    /// Sorts `products` in place.
    pub fn apply(self, products: &mut [ProductRecord]) {
        products.sort_by(|a, b| self.compare(a, b));
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
