//! Pricing and settlement engine.
//!
//! The engine prices carts against the injected catalog, settles checkouts
//! and refunds as all-or-nothing stock batches, and records every settlement
//! in an append-only ledger. Operations can also be fed as an async stream.
//!
//! Pricing is advisory and side-effect free; settlement re-validates against
//! current stock inside the same call that mutates it, so a stale preview
//! can never overdraw a counter.

use chrono::Utc;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::catalog::{CatalogStore, StockChange, StockDelta};
use crate::discount::{CategoryTotals, DiscountPolicy};
use crate::model::{
    CartLine, Game, GameId, LineView, PricingResult, TransactionLine, TransactionRecord, TxId,
    TxKind, TransactionView, UserId,
};
use crate::Amount;

mod ledger;
pub use ledger::{Ledger, LedgerEntry};

mod error;
pub use error::{CheckoutError, EngineError, PricingError, RefundError};

/// A settlement request, as fed to [`Engine::apply`] or [`Engine::run`].
#[derive(Debug, Clone)]
pub enum Operation {
    /// Settle a whole cart as a purchase.
    Checkout { user: UserId, lines: Vec<CartLine> },
    /// Return previously sold licenses across one or more items.
    Refund { user: UserId, lines: Vec<CartLine> },
    /// Direct single-SKU purchase, addressed by game name.
    Purchase {
        user: UserId,
        game: String,
        quantity: u32,
    },
    /// Direct single-SKU return, addressed by game name.
    Return {
        user: UserId,
        game: String,
        quantity: u32,
    },
}

/// A cart line resolved against the catalog, with the unit price and
/// category captured at resolution time.
#[derive(Debug, Clone)]
struct PricedLine {
    game: GameId,
    category: String,
    quantity: u32,
    unit_price: Amount,
}

/// The pricing and settlement engine.
///
/// Owns the catalog store, the transaction ledger, and the transaction id
/// counter. Operations apply sequentially; the re-check inside
/// [`CatalogStore::update_stock`] runs in the same call that mutates, which
/// is what keeps concurrent checkouts from overdrawing stock.
pub struct Engine<S: CatalogStore> {
    store: S,
    ledger: Ledger,
    next_tx: TxId,
}

/// Public API
impl<S: CatalogStore> Engine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ledger: Ledger::new(),
            next_tx: 0,
        }
    }

    /// Read access to the underlying catalog.
    pub fn catalog(&self) -> &S {
        &self.store
    }

    /// Run the engine over a stream of operations. Failed operations are
    /// logged and skipped; the stream keeps going.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Operation> + Unpin) {
        while let Some(op) = stream.next().await {
            let _ = self.apply(op);
        }
    }

    /// Apply a single operation on top of the current state.
    pub fn apply(&mut self, op: Operation) -> Result<TransactionRecord, EngineError> {
        match op {
            Operation::Checkout { user, lines } => {
                let result = self.checkout(user, &lines);
                Self::log_result("checkout", user, &result);
                Ok(result?)
            }
            Operation::Refund { user, lines } => {
                let result = self.refund(user, &lines);
                Self::log_result("refund", user, &result);
                Ok(result?)
            }
            Operation::Purchase {
                user,
                game,
                quantity,
            } => {
                let result = self.purchase_direct(user, &game, quantity);
                Self::log_result("purchase", user, &result);
                Ok(result?)
            }
            Operation::Return {
                user,
                game,
                quantity,
            } => {
                let result = self.return_direct(user, &game, quantity);
                Self::log_result("return", user, &result);
                Ok(result?)
            }
        }
    }

    /// Price a cart without touching stock. The result is advisory: stock
    /// may change before checkout, which re-validates on its own.
    pub fn price_cart(&self, lines: &[CartLine]) -> Result<PricingResult, PricingError> {
        let priced = self.resolve_cart(lines)?;
        Ok(Self::price_resolved(&priced))
    }

    /// Settle a cart as a purchase. Re-prices from current catalog state
    /// (client-supplied totals are never trusted) and commits stock moves,
    /// transaction, and line items as one atomic unit.
    pub fn checkout(
        &mut self,
        user: UserId,
        lines: &[CartLine],
    ) -> Result<TransactionRecord, CheckoutError> {
        let priced = self.resolve_cart(lines)?;
        let pricing = Self::price_resolved(&priced);
        let record = self.settle(
            user,
            TxKind::Purchase,
            &priced,
            pricing.total,
            pricing.discount_pct,
        )?;
        Ok(record)
    }

    /// Return previously sold licenses. Each line's quantity is checked
    /// against the item's `sold` count; refunds carry no volume discount
    /// and are valued at the current unit price.
    pub fn refund(
        &mut self,
        user: UserId,
        lines: &[CartLine],
    ) -> Result<TransactionRecord, RefundError> {
        let priced = self.resolve_refund(lines)?;
        let total = priced
            .iter()
            .fold(Amount::default(), |acc, line| {
                acc + line.unit_price.times(line.quantity)
            })
            .round_to_cents();
        let record = self.settle(user, TxKind::Refund, &priced, total, 0)?;
        Ok(record)
    }

    /// Direct single-SKU purchase, addressed by name as the storefront's
    /// quick-buy path does. Applies the single-item discount policy, then
    /// funnels into the same settlement as cart checkout.
    pub fn purchase_direct(
        &mut self,
        user: UserId,
        name: &str,
        quantity: u32,
    ) -> Result<TransactionRecord, CheckoutError> {
        let line = self.resolve_by_name(name, quantity)?;
        let discount_pct = DiscountPolicy::SingleItem {
            category: &line.category,
            quantity,
        }
        .percentage();

        let subtotal = line.unit_price.times(quantity);
        let total = (subtotal - subtotal.percent(discount_pct)).round_to_cents();
        let record = self.settle(user, TxKind::Purchase, &[line], total, discount_pct)?;
        Ok(record)
    }

    /// Direct single-SKU return, the symmetric counterpart of
    /// [`purchase_direct`](Self::purchase_direct).
    pub fn return_direct(
        &mut self,
        user: UserId,
        name: &str,
        quantity: u32,
    ) -> Result<TransactionRecord, RefundError> {
        let game = self
            .store
            .find_by_name(name)
            .ok_or_else(|| RefundError::NameNotFound(name.to_string()))?;
        if quantity == 0 {
            return Err(RefundError::ZeroQuantity(game.id));
        }
        if quantity > game.sold {
            return Err(RefundError::InvalidReturn {
                game: game.id,
                name: game.name.clone(),
                requested: quantity,
                sold: game.sold,
            });
        }

        let line = PricedLine {
            game: game.id,
            category: game.category.clone(),
            quantity,
            unit_price: game.price,
        };
        let total = line.unit_price.times(quantity).round_to_cents();
        let record = self.settle(user, TxKind::Refund, &[line], total, 0)?;
        Ok(record)
    }

    /// A user's transaction history, newest first, with line items joined
    /// against current game names. Empty history is an empty vec.
    pub fn list_transactions(&self, user: UserId) -> Vec<TransactionView> {
        self.ledger
            .for_user(user)
            .map(|entry| TransactionView {
                id: entry.record.id,
                timestamp: entry.record.timestamp,
                total: entry.record.total,
                discount_pct: entry.record.discount_pct,
                kind: entry.record.kind,
                items: entry
                    .lines
                    .iter()
                    .map(|line| LineView {
                        game_name: self
                            .store
                            .find_by_id(line.game)
                            .map(|g| g.name.clone())
                            .unwrap_or_default(),
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        line_subtotal: line.unit_price.times(line.quantity),
                    })
                    .collect(),
            })
            .collect()
    }

    /// The game with the highest cumulative `sold` count, if any.
    pub fn best_seller(&self) -> Option<&Game> {
        self.store.games().max_by_key(|game| game.sold)
    }
}

/// Private API
impl<S: CatalogStore> Engine<S> {
    /// Small helper to log `apply` results
    fn log_result<E: std::fmt::Display>(
        op: &str,
        user: UserId,
        result: &Result<TransactionRecord, E>,
    ) {
        match result {
            Ok(record) => {
                info!(
                    user = %user,
                    tx = %record.id,
                    total = %record.total,
                    discount_pct = record.discount_pct,
                    "{op} settled"
                );
            }
            Err(e) => {
                info!(
                    user = %user,
                    reason = %e,
                    "{op} skipped"
                );
            }
        }
    }

    /// Resolve cart lines against the catalog, checking quantity and
    /// current availability per line.
    fn resolve_cart(&self, lines: &[CartLine]) -> Result<Vec<PricedLine>, PricingError> {
        if lines.is_empty() {
            return Err(PricingError::EmptyCart);
        }

        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let game = self
                .store
                .find_by_id(line.game)
                .ok_or(PricingError::ItemNotFound(line.game))?;
            if line.quantity == 0 {
                return Err(PricingError::ZeroQuantity(game.id));
            }
            if line.quantity > game.available {
                return Err(PricingError::InsufficientStock {
                    game: game.id,
                    name: game.name.clone(),
                    requested: line.quantity,
                    available: game.available,
                });
            }
            priced.push(PricedLine {
                game: game.id,
                category: game.category.clone(),
                quantity: line.quantity,
                unit_price: game.price,
            });
        }

        Ok(priced)
    }

    /// Resolve refund lines, checking quantity against `sold` per line.
    fn resolve_refund(&self, lines: &[CartLine]) -> Result<Vec<PricedLine>, RefundError> {
        if lines.is_empty() {
            return Err(RefundError::EmptyRefund);
        }

        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let game = self
                .store
                .find_by_id(line.game)
                .ok_or(RefundError::ItemNotFound(line.game))?;
            if line.quantity == 0 {
                return Err(RefundError::ZeroQuantity(game.id));
            }
            if line.quantity > game.sold {
                return Err(RefundError::InvalidReturn {
                    game: game.id,
                    name: game.name.clone(),
                    requested: line.quantity,
                    sold: game.sold,
                });
            }
            priced.push(PricedLine {
                game: game.id,
                category: game.category.clone(),
                quantity: line.quantity,
                unit_price: game.price,
            });
        }

        Ok(priced)
    }

    /// Resolve a single name-addressed purchase line.
    fn resolve_by_name(&self, name: &str, quantity: u32) -> Result<PricedLine, PricingError> {
        let game = self
            .store
            .find_by_name(name)
            .ok_or_else(|| PricingError::NameNotFound(name.to_string()))?;
        if quantity == 0 {
            return Err(PricingError::ZeroQuantity(game.id));
        }
        if quantity > game.available {
            return Err(PricingError::InsufficientStock {
                game: game.id,
                name: game.name.clone(),
                requested: quantity,
                available: game.available,
            });
        }

        Ok(PricedLine {
            game: game.id,
            category: game.category.clone(),
            quantity,
            unit_price: game.price,
        })
    }

    /// Price resolved lines with the whole-cart discount policy. Only the
    /// final total is rounded; intermediate amounts keep full precision.
    fn price_resolved(priced: &[PricedLine]) -> PricingResult {
        let mut totals = CategoryTotals::new();
        let mut subtotal = Amount::default();
        for line in priced {
            totals.add(&line.category, line.quantity);
            subtotal += line.unit_price.times(line.quantity);
        }

        let discount_pct = DiscountPolicy::Cart(&totals).percentage();
        let discount_amount = subtotal.percent(discount_pct);
        PricingResult {
            subtotal,
            discount_pct,
            discount_amount,
            total: (subtotal - discount_amount).round_to_cents(),
        }
    }

    /// The single settlement path shared by cart and direct operations:
    /// commit the stock batch, then record the transaction with its lines.
    /// The batch re-validates cumulatively and applies all-or-nothing, so a
    /// failure here leaves no partial effect.
    fn settle(
        &mut self,
        user: UserId,
        kind: TxKind,
        priced: &[PricedLine],
        total: Amount,
        discount_pct: u8,
    ) -> Result<TransactionRecord, crate::catalog::CatalogError> {
        let changes: Vec<StockChange> = priced
            .iter()
            .map(|line| StockChange {
                game: line.game,
                delta: match kind {
                    TxKind::Purchase => StockDelta::Sell(line.quantity),
                    TxKind::Refund => StockDelta::Return(line.quantity),
                },
            })
            .collect();

        self.store.update_stock(&changes)?;

        for line in priced {
            if let Some(game) = self.store.find_by_id(line.game)
                && game.available < game.min_stock
            {
                warn!(
                    game = %game.name,
                    available = game.available,
                    min_stock = game.min_stock,
                    "stock below advisory minimum"
                );
            }
        }

        self.next_tx += 1;
        let record = TransactionRecord {
            id: self.next_tx,
            user,
            timestamp: Utc::now(),
            total,
            discount_pct,
            kind,
        };
        let lines = priced
            .iter()
            .map(|line| TransactionLine {
                game: line.game,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        self.ledger.push(record.clone(), lines);

        Ok(record)
    }
}
