//! Error types for pricing and settlement.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::model::GameId;

/// Top-level error returned by [`Engine::apply`](super::Engine::apply).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("pricing failed: {0}")]
    Pricing(#[from] PricingError),

    #[error("checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("refund failed: {0}")]
    Refund(#[from] RefundError),
}

/// Error while validating and pricing a cart. Pricing never mutates stock,
/// so these carry no rollback implications.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("the cart is empty")]
    EmptyCart,

    #[error("cart line for game {0} has zero quantity")]
    ZeroQuantity(GameId),

    #[error("game {0} not found")]
    ItemNotFound(GameId),

    #[error("no game named '{0}'")]
    NameNotFound(String),

    #[error(
        "insufficient licenses for '{name}': requested {requested}, available {available}"
    )]
    InsufficientStock {
        game: GameId,
        name: String,
        requested: u32,
        available: u32,
    },
}

/// Error during checkout settlement. Any failure leaves stock counters and
/// the ledger exactly as they were.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Pricing(#[from] PricingError),

    #[error("{0}")]
    Commit(CatalogError),
}

/// Error during refund settlement, symmetric to [`CheckoutError`] with the
/// quantity check running against `sold` instead of `available`.
#[derive(Debug, Error)]
pub enum RefundError {
    #[error("no lines to refund")]
    EmptyRefund,

    #[error("refund line for game {0} has zero quantity")]
    ZeroQuantity(GameId),

    #[error("game {0} not found")]
    ItemNotFound(GameId),

    #[error("no game named '{0}'")]
    NameNotFound(String),

    #[error("invalid return quantity for '{name}': requested {requested}, sold {sold}")]
    InvalidReturn {
        game: GameId,
        name: String,
        requested: u32,
        sold: u32,
    },

    #[error("{0}")]
    Commit(CatalogError),
}

impl From<CatalogError> for CheckoutError {
    /// Stock conflicts surfaced by the commit batch fold back into the
    /// pricing taxonomy; everything else is a commit fault.
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => CheckoutError::Pricing(PricingError::ItemNotFound(id)),
            CatalogError::InsufficientStock {
                game,
                name,
                requested,
                available,
            } => CheckoutError::Pricing(PricingError::InsufficientStock {
                game,
                name,
                requested,
                available,
            }),
            other => CheckoutError::Commit(other),
        }
    }
}

impl From<CatalogError> for RefundError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => RefundError::ItemNotFound(id),
            CatalogError::InvalidReturn {
                game,
                name,
                requested,
                sold,
            } => RefundError::InvalidReturn {
                game,
                name,
                requested,
                sold,
            },
            other => RefundError::Commit(other),
        }
    }
}
