//! Volume discount policies.
//!
//! Two distinct policies exist and must not be merged: the single-item
//! policy used by direct single-SKU purchases, and the whole-cart policy
//! used at pricing and checkout. They differ on the `action` category: the
//! single-item rule discounts action alone, the cart rule requires a joint
//! sports + action threshold.

use std::collections::HashMap;

/// Category key that triggers the 20% tier.
pub const PUZZLE: &str = "puzzle";
/// Category key for the joint 15% cart tier.
pub const SPORTS: &str = "sports";
/// Category key for the joint 15% cart tier (alone in the single-item rule).
pub const ACTION: &str = "action";

/// Per-category quantity totals for a cart, keyed by lowercased category.
#[derive(Debug, Clone, Default)]
pub struct CategoryTotals(HashMap<String, u32>);

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a line's quantity under its category.
    pub fn add(&mut self, category: &str, quantity: u32) {
        *self.0.entry(category.to_lowercase()).or_insert(0) += quantity;
    }

    pub fn get(&self, category: &str) -> u32 {
        self.0.get(category).copied().unwrap_or(0)
    }
}

/// A volume discount policy, tagged by where it applies.
#[derive(Debug, Clone, Copy)]
pub enum DiscountPolicy<'a> {
    /// Direct single-SKU purchase: one category, one quantity.
    SingleItem { category: &'a str, quantity: u32 },
    /// Whole-cart checkout: totals summed per category across all lines.
    Cart(&'a CategoryTotals),
}

impl DiscountPolicy<'_> {
    /// Discount percentage for this policy. Rules are evaluated in fixed
    /// priority order, first match wins, never cumulative. Categories
    /// outside {puzzle, sports, action} never trigger a tier.
    pub fn percentage(&self) -> u8 {
        match self {
            DiscountPolicy::SingleItem { category, quantity } => {
                match category.to_lowercase().as_str() {
                    PUZZLE if *quantity >= 25 => 20,
                    SPORTS if *quantity >= 20 => 15,
                    ACTION if *quantity >= 15 => 15,
                    _ => 0,
                }
            }
            DiscountPolicy::Cart(totals) => {
                if totals.get(PUZZLE) >= 25 {
                    20
                } else if totals.get(SPORTS) >= 20 && totals.get(ACTION) >= 15 {
                    15
                } else {
                    0
                }
            }
        }
    }
}
