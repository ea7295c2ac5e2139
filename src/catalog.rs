//! Catalog storage behind a capability trait.
//!
//! The engine never touches catalog state directly; it goes through
//! [`CatalogStore`], which any durable backend can implement. Stock counters
//! (`available`/`sold`) are engine-owned and only move through
//! [`CatalogStore::update_stock`], an all-or-nothing batch. Descriptive
//! fields move through the admin-facing `insert`/`update` paths and never
//! touch the counters.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Game, GameId};
use crate::Amount;

/// Catalog access errors, shared by all store implementations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("game {0} not found")]
    NotFound(GameId),

    #[error("a game named '{0}' already exists")]
    DuplicateName(String),

    #[error(
        "insufficient licenses for '{name}': requested {requested}, available {available}"
    )]
    InsufficientStock {
        game: GameId,
        name: String,
        requested: u32,
        available: u32,
    },

    #[error("invalid return quantity for '{name}': requested {requested}, sold {sold}")]
    InvalidReturn {
        game: GameId,
        name: String,
        requested: u32,
        sold: u32,
    },

    /// The backing store failed mid-commit; nothing was applied.
    #[error("catalog commit failed: {0}")]
    CommitFailure(String),
}

/// One stock mutation within a settlement batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub game: GameId,
    pub delta: StockDelta,
}

/// Direction of a stock move. `Sell` shifts units available -> sold,
/// `Return` shifts them back. `available + sold` is conserved either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDelta {
    Sell(u32),
    Return(u32),
}

/// Input for creating a catalog entry. Stock counters start from the given
/// values and afterwards belong to the settlement engine.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub name: String,
    pub category: String,
    pub price: Amount,
    pub available: u32,
    pub sold: u32,
    pub min_stock: u32,
    pub image_url: Option<String>,
}

/// Admin-side update of descriptive fields. `None` leaves a field alone;
/// stock counters are deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Amount>,
    pub min_stock: Option<u32>,
    pub image_url: Option<String>,
}

/// Capability interface over the catalog.
pub trait CatalogStore {
    fn find_by_id(&self, id: GameId) -> Option<&Game>;

    /// Case-insensitive name lookup.
    fn find_by_name(&self, name: &str) -> Option<&Game>;

    fn games(&self) -> impl Iterator<Item = &Game>;

    /// Create a catalog entry, rejecting case-insensitive name collisions.
    fn insert(&mut self, game: NewGame) -> Result<GameId, CatalogError>;

    /// Update descriptive fields of an existing entry.
    fn update(&mut self, id: GameId, update: GameUpdate) -> Result<(), CatalogError>;

    /// Apply a settlement batch atomically: every change is validated
    /// against a working view (cumulative across the batch) before any is
    /// applied. A failure names the offending game and leaves all counters
    /// untouched.
    fn update_stock(&mut self, changes: &[StockChange]) -> Result<(), CatalogError>;
}

/// In-memory catalog, the reference [`CatalogStore`] implementation.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    games: HashMap<GameId, Game>,
    /// Lowercased name -> id, backing the unique-name constraint.
    by_name: HashMap<String, GameId>,
    next_id: GameId,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryCatalog {
    fn find_by_id(&self, id: GameId) -> Option<&Game> {
        self.games.get(&id)
    }

    fn find_by_name(&self, name: &str) -> Option<&Game> {
        let id = self.by_name.get(&name.to_lowercase())?;
        self.games.get(id)
    }

    fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    fn insert(&mut self, game: NewGame) -> Result<GameId, CatalogError> {
        let key = game.name.to_lowercase();
        if self.by_name.contains_key(&key) {
            return Err(CatalogError::DuplicateName(game.name));
        }

        self.next_id += 1;
        let id = self.next_id;
        self.by_name.insert(key, id);
        self.games.insert(
            id,
            Game {
                id,
                name: game.name,
                category: game.category,
                price: game.price,
                available: game.available,
                sold: game.sold,
                min_stock: game.min_stock,
                image_url: game.image_url,
            },
        );

        Ok(id)
    }

    fn update(&mut self, id: GameId, update: GameUpdate) -> Result<(), CatalogError> {
        // Validate a rename against the name index before mutating anything.
        if let Some(new_name) = &update.name {
            let key = new_name.to_lowercase();
            if self.by_name.get(&key).is_some_and(|owner| *owner != id) {
                return Err(CatalogError::DuplicateName(new_name.clone()));
            }
        }

        let game = self.games.get_mut(&id).ok_or(CatalogError::NotFound(id))?;

        if let Some(new_name) = update.name {
            self.by_name.remove(&game.name.to_lowercase());
            self.by_name.insert(new_name.to_lowercase(), id);
            game.name = new_name;
        }
        if let Some(category) = update.category {
            game.category = category;
        }
        if let Some(price) = update.price {
            game.price = price;
        }
        if let Some(min_stock) = update.min_stock {
            game.min_stock = min_stock;
        }
        if let Some(image_url) = update.image_url {
            game.image_url = Some(image_url);
        }

        Ok(())
    }

    fn update_stock(&mut self, changes: &[StockChange]) -> Result<(), CatalogError> {
        // Validate the whole batch against a working view first. Cumulative
        // deltas per game mean two lines that individually fit but jointly
        // overdraw a counter abort the batch.
        let mut working: HashMap<GameId, (u32, u32)> = HashMap::new();

        for change in changes {
            let game = self
                .games
                .get(&change.game)
                .ok_or(CatalogError::NotFound(change.game))?;
            let (available, sold) = working
                .entry(change.game)
                .or_insert((game.available, game.sold));

            match change.delta {
                StockDelta::Sell(quantity) => {
                    if quantity > *available {
                        return Err(CatalogError::InsufficientStock {
                            game: game.id,
                            name: game.name.clone(),
                            requested: quantity,
                            available: *available,
                        });
                    }
                    *available -= quantity;
                    *sold += quantity;
                }
                StockDelta::Return(quantity) => {
                    if quantity > *sold {
                        return Err(CatalogError::InvalidReturn {
                            game: game.id,
                            name: game.name.clone(),
                            requested: quantity,
                            sold: *sold,
                        });
                    }
                    *sold -= quantity;
                    *available += quantity;
                }
            }
        }

        // Every change validated; apply the settled view.
        for (id, (available, sold)) in working {
            if let Some(game) = self.games.get_mut(&id) {
                game.available = available;
                game.sold = sold;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_game(name: &str, category: &str, available: u32, sold: u32) -> NewGame {
        NewGame {
            name: name.to_string(),
            category: category.to_string(),
            price: Amount::from_float(10.0),
            available,
            sold,
            min_stock: 10,
            image_url: None,
        }
    }

    fn seeded() -> (MemoryCatalog, GameId, GameId) {
        let mut catalog = MemoryCatalog::new();
        let a = catalog.insert(new_game("Tetra Twist", "puzzle", 30, 5)).unwrap();
        let b = catalog.insert(new_game("Goal Rush", "sports", 50, 0)).unwrap();
        (catalog, a, b)
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let (catalog, a, b) = seeded();
        assert!(b > a);
        assert_eq!(catalog.games().count(), 2);
    }

    #[test]
    fn insert_rejects_duplicate_name_case_insensitively() {
        let (mut catalog, _, _) = seeded();
        let result = catalog.insert(new_game("TETRA TWIST", "puzzle", 1, 0));
        assert!(matches!(result, Err(CatalogError::DuplicateName(_))));
        assert_eq!(catalog.games().count(), 2);
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let (catalog, a, _) = seeded();
        assert_eq!(catalog.find_by_name("tetra twist").map(|g| g.id), Some(a));
        assert_eq!(catalog.find_by_name("Goal RUSH").map(|g| g.name.as_str()), Some("Goal Rush"));
        assert!(catalog.find_by_name("missing").is_none());
    }

    #[test]
    fn update_changes_descriptive_fields_only() {
        let (mut catalog, a, _) = seeded();
        catalog
            .update(
                a,
                GameUpdate {
                    price: Some(Amount::from_float(12.5)),
                    min_stock: Some(3),
                    ..GameUpdate::default()
                },
            )
            .unwrap();

        let game = catalog.find_by_id(a).unwrap();
        assert_eq!(game.price, Amount::from_float(12.5));
        assert_eq!(game.min_stock, 3);
        // Counters untouched.
        assert_eq!(game.available, 30);
        assert_eq!(game.sold, 5);
    }

    #[test]
    fn update_rename_moves_name_index() {
        let (mut catalog, a, _) = seeded();
        catalog
            .update(
                a,
                GameUpdate {
                    name: Some("Tetra Twist DX".to_string()),
                    ..GameUpdate::default()
                },
            )
            .unwrap();

        assert!(catalog.find_by_name("Tetra Twist").is_none());
        assert_eq!(catalog.find_by_name("tetra twist dx").map(|g| g.id), Some(a));
    }

    #[test]
    fn update_rename_to_taken_name_fails() {
        let (mut catalog, a, _) = seeded();
        let result = catalog.update(
            a,
            GameUpdate {
                name: Some("goal rush".to_string()),
                ..GameUpdate::default()
            },
        );
        assert!(matches!(result, Err(CatalogError::DuplicateName(_))));
        // Original name still resolves.
        assert_eq!(catalog.find_by_name("Tetra Twist").map(|g| g.id), Some(a));
    }

    #[test]
    fn update_rename_to_own_name_is_allowed() {
        let (mut catalog, a, _) = seeded();
        catalog
            .update(
                a,
                GameUpdate {
                    name: Some("tetra twist".to_string()),
                    ..GameUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(catalog.find_by_name("Tetra Twist").map(|g| g.id), Some(a));
    }

    #[test]
    fn update_missing_game_fails() {
        let (mut catalog, _, _) = seeded();
        let result = catalog.update(999, GameUpdate::default());
        assert!(matches!(result, Err(CatalogError::NotFound(999))));
    }

    #[test]
    fn sell_moves_available_to_sold() {
        let (mut catalog, a, _) = seeded();
        catalog
            .update_stock(&[StockChange {
                game: a,
                delta: StockDelta::Sell(10),
            }])
            .unwrap();

        let game = catalog.find_by_id(a).unwrap();
        assert_eq!(game.available, 20);
        assert_eq!(game.sold, 15);
    }

    #[test]
    fn return_moves_sold_to_available() {
        let (mut catalog, a, _) = seeded();
        catalog
            .update_stock(&[StockChange {
                game: a,
                delta: StockDelta::Return(5),
            }])
            .unwrap();

        let game = catalog.find_by_id(a).unwrap();
        assert_eq!(game.available, 35);
        assert_eq!(game.sold, 0);
    }

    #[test]
    fn oversell_fails_with_counts() {
        let (mut catalog, a, _) = seeded();
        let result = catalog.update_stock(&[StockChange {
            game: a,
            delta: StockDelta::Sell(31),
        }]);
        assert!(matches!(
            result,
            Err(CatalogError::InsufficientStock {
                requested: 31,
                available: 30,
                ..
            })
        ));
    }

    #[test]
    fn over_return_fails_with_counts() {
        let (mut catalog, a, _) = seeded();
        let result = catalog.update_stock(&[StockChange {
            game: a,
            delta: StockDelta::Return(6),
        }]);
        assert!(matches!(
            result,
            Err(CatalogError::InvalidReturn {
                requested: 6,
                sold: 5,
                ..
            })
        ));
    }

    #[test]
    fn failed_batch_applies_nothing() {
        let (mut catalog, a, b) = seeded();
        let result = catalog.update_stock(&[
            StockChange {
                game: b,
                delta: StockDelta::Sell(10),
            },
            StockChange {
                game: a,
                delta: StockDelta::Sell(31), // over available
            },
        ]);
        assert!(result.is_err());

        // The earlier, valid change was not applied either.
        let game_b = catalog.find_by_id(b).unwrap();
        assert_eq!(game_b.available, 50);
        assert_eq!(game_b.sold, 0);
    }

    #[test]
    fn batch_validates_duplicate_lines_cumulatively() {
        let (mut catalog, a, _) = seeded();
        // 20 + 20 individually fit within 30, jointly they do not.
        let result = catalog.update_stock(&[
            StockChange {
                game: a,
                delta: StockDelta::Sell(20),
            },
            StockChange {
                game: a,
                delta: StockDelta::Sell(20),
            },
        ]);
        assert!(matches!(
            result,
            Err(CatalogError::InsufficientStock {
                requested: 20,
                available: 10,
                ..
            })
        ));

        let game = catalog.find_by_id(a).unwrap();
        assert_eq!(game.available, 30);
        assert_eq!(game.sold, 5);
    }

    #[test]
    fn batch_with_unknown_game_fails() {
        let (mut catalog, _, _) = seeded();
        let result = catalog.update_stock(&[StockChange {
            game: 999,
            delta: StockDelta::Sell(1),
        }]);
        assert!(matches!(result, Err(CatalogError::NotFound(999))));
    }

    #[test]
    fn sell_then_return_in_one_batch_round_trips() {
        let (mut catalog, a, _) = seeded();
        catalog
            .update_stock(&[
                StockChange {
                    game: a,
                    delta: StockDelta::Sell(30),
                },
                StockChange {
                    game: a,
                    delta: StockDelta::Return(30),
                },
            ])
            .unwrap();

        let game = catalog.find_by_id(a).unwrap();
        assert_eq!(game.available, 30);
        assert_eq!(game.sold, 5);
    }
}
