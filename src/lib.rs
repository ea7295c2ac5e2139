pub mod amount;
pub mod catalog;
pub mod csv;
pub mod discount;
pub mod engine;
pub mod model;

pub use amount::Amount;
pub use engine::{Engine, Operation};
pub use model::{CartLine, GameId, TxId, UserId};
