//! Core domain types for the license store engine.

use chrono::{DateTime, Utc};

use crate::Amount;

/// Catalog item identifier.
pub type GameId = u32;

/// User identifier, supplied by the identity layer.
pub type UserId = u32;

/// Transaction identifier, assigned by the engine.
pub type TxId = u32;

/// One sellable game license line in the catalog.
///
/// `available + sold` is conserved across purchases and refunds: a purchase
/// moves units available -> sold, a refund moves them back. Both counters
/// stay non-negative.
#[derive(Debug, Clone)]
pub struct Game {
    pub id: GameId,
    /// Unique across the catalog, case-insensitive for lookup.
    pub name: String,
    /// Free text; the discount policies recognize specific keys.
    pub category: String,
    pub price: Amount,
    pub available: u32,
    pub sold: u32,
    /// Advisory restock threshold, informational only.
    pub min_stock: u32,
    pub image_url: Option<String>,
}

/// Transient cart input: one item and a requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub game: GameId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(game: GameId, quantity: u32) -> Self {
        Self { game, quantity }
    }
}

/// Direction of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Purchase,
    Refund,
}

impl TxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Purchase => "purchase",
            TxKind::Refund => "refund",
        }
    }
}

/// Immutable record of a completed settlement, returned to the caller.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: TxId,
    pub user: UserId,
    pub timestamp: DateTime<Utc>,
    /// Post-discount total, rounded to cents.
    pub total: Amount,
    pub discount_pct: u8,
    pub kind: TxKind,
}

/// One catalog item's contribution to a transaction. The unit price is
/// captured at settlement time so later price changes never rewrite history.
#[derive(Debug, Clone, Copy)]
pub struct TransactionLine {
    pub game: GameId,
    pub quantity: u32,
    pub unit_price: Amount,
}

/// Advisory pricing breakdown for a cart. Never authoritative for checkout;
/// settlement re-validates and re-prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingResult {
    pub subtotal: Amount,
    pub discount_pct: u8,
    pub discount_amount: Amount,
    /// `subtotal - discount_amount`, rounded to cents.
    pub total: Amount,
}

/// A transaction joined with its line detail for history reads.
#[derive(Debug, Clone)]
pub struct TransactionView {
    pub id: TxId,
    pub timestamp: DateTime<Utc>,
    pub total: Amount,
    pub discount_pct: u8,
    pub kind: TxKind,
    pub items: Vec<LineView>,
}

/// One history line, joined with the item's current name.
#[derive(Debug, Clone)]
pub struct LineView {
    pub game_name: String,
    pub quantity: u32,
    pub unit_price: Amount,
    pub line_subtotal: Amount,
}
