//! CSV input and output for the storefront binary.
//!
//! Two inputs: a catalog snapshot (`name,category,price,available[,sold][,min_stock]`)
//! and an operations log (`type,user,game,quantity` with `type` one of
//! `purchase`/`return`, game addressed by name). Output is the settled
//! catalog (`id,name,category,price,available,sold`).

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::catalog::NewGame;
use crate::engine::Operation;
use crate::model::{Game, GameId, UserId};
use crate::Amount;

/// Errors that can occur when parsing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized operation type '{op_type}'")]
    UnrecognizedType { line: usize, op_type: String },

    #[error("line {line}: game '{name}' has negative price {price}")]
    NegativePrice {
        line: usize,
        name: String,
        price: f64,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: String,
    category: String,
    price: f64,
    available: u32,
    sold: Option<u32>,
    min_stock: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OperationRow {
    r#type: String,
    user: UserId,
    game: String,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    id: GameId,
    name: String,
    category: String,
    price: String,
    available: u32,
    sold: u32,
}

/// Read catalog entries from a csv file
pub fn read_catalog(path: impl AsRef<Path>) -> impl Iterator<Item = Result<NewGame, CsvError>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .expect("failed to open catalog csv file");

    reader
        .into_deserialize::<CatalogRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            if row.price < 0.0 {
                return Err(CsvError::NegativePrice {
                    line,
                    name: row.name,
                    price: row.price,
                });
            }
            Ok(NewGame {
                name: row.name,
                category: row.category,
                price: Amount::from_float(row.price),
                available: row.available,
                sold: row.sold.unwrap_or(0),
                min_stock: row.min_stock.unwrap_or(10),
                image_url: None,
            })
        })
}

/// Read settlement operations from a csv file
pub fn read_operations(
    path: impl AsRef<Path>,
) -> impl Iterator<Item = Result<Operation, CsvError>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .expect("failed to open operations csv file");

    reader
        .into_deserialize::<OperationRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            match row.r#type.as_str() {
                "purchase" => Ok(Operation::Purchase {
                    user: row.user,
                    game: row.game,
                    quantity: row.quantity,
                }),
                "return" => Ok(Operation::Return {
                    user: row.user,
                    game: row.game,
                    quantity: row.quantity,
                }),
                other => Err(CsvError::UnrecognizedType {
                    line,
                    op_type: other.to_string(),
                }),
            }
        })
}

/// Write the settled catalog to stdout in csv format, ordered by id
pub fn write_catalog<'a>(games: impl IntoIterator<Item = &'a Game>) {
    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());

    let mut games: Vec<&Game> = games.into_iter().collect();
    games.sort_by_key(|game| game.id);

    for game in games {
        let row = OutputRow {
            id: game.id,
            name: game.name.clone(),
            category: game.category.clone(),
            price: game.price.to_string(),
            available: game.available,
            sold: game.sold,
        };
        writer.serialize(&row).expect("failed to write csv row");
    }

    writer.flush().expect("failed to flush csv writer");
}
