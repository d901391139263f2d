//! Nutrient aggregation: scale catalog values to a quantity, sum line items,
//! and compare consumption against a target.
//!
//! Every view of the plan or log goes through these functions; nothing else
//! in the crate multiplies or sums macros.

use serde::Serialize;

use crate::catalog::FoodCatalog;
use crate::error::{DietError, Result};
use crate::models::{LineItem, Totals};

/// Upper bound on a single line item's quantity unless configured otherwise.
pub const DEFAULT_MAX_GRAMS: f64 = 2000.0;

/// Round to one decimal place.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scale a catalog entry to `grams` and build the resulting line item.
///
/// Each macro is `catalog value × grams / 100`, rounded to one decimal.
pub fn compute_line_item(
    catalog: &FoodCatalog,
    food: &str,
    grams: f64,
    max_grams: f64,
) -> Result<LineItem> {
    let entry = catalog
        .get(food)
        .ok_or_else(|| DietError::UnknownFood(food.to_string()))?;

    if !grams.is_finite() || grams <= 0.0 || grams > max_grams {
        return Err(DietError::InvalidQuantity {
            grams,
            max: max_grams,
        });
    }

    let factor = grams / 100.0;
    Ok(LineItem {
        food: entry.name.clone(),
        grams,
        kcal: round1(entry.kcal * factor),
        protein: round1(entry.protein * factor),
        carb: round1(entry.carb * factor),
        fat: round1(entry.fat * factor),
    })
}

/// Elementwise sum of a list of line items. Empty input yields zero.
#[must_use]
pub fn sum_totals(items: &[LineItem]) -> Totals {
    items.iter().map(LineItem::totals).sum()
}

/// `target - consumed` per field. Negative values mean the target was exceeded
/// and are returned as-is.
#[must_use]
pub fn compute_delta(target: Totals, consumed: Totals) -> Totals {
    target - consumed
}

/// Like [`compute_delta`], but `None` when there is no target to compare against.
#[must_use]
pub fn target_delta(target: Totals, consumed: Totals) -> Option<Totals> {
    if target.is_zero() {
        None
    } else {
        Some(compute_delta(target, consumed))
    }
}

/// How one delta field reads to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroStatus {
    Remaining,
    Met,
    Over,
}

impl MacroStatus {
    /// Classify a delta at the precision it is displayed with.
    #[must_use]
    pub fn classify(delta: f64, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        let shown = (delta * scale).round();
        if shown > 0.0 {
            MacroStatus::Remaining
        } else if shown < 0.0 {
            MacroStatus::Over
        } else {
            MacroStatus::Met
        }
    }
}
