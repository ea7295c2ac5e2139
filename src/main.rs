use std::env;

use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use store_eng::catalog::{CatalogStore, MemoryCatalog};
use store_eng::csv::{read_catalog, read_operations, write_catalog};
use store_eng::Engine;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let usage = "usage: store-eng <catalog.csv> <operations.csv>";
    let catalog_path = args.next().expect(usage);
    let ops_path = args.next().expect(usage);

    let mut catalog = MemoryCatalog::new();
    for result in read_catalog(&catalog_path) {
        match result {
            Ok(game) => {
                if let Err(e) = catalog.insert(game) {
                    warn!("{e}");
                }
            }
            Err(e) => {
                warn!("{e}");
            }
        }
    }

    let mut engine = Engine::new(catalog);
    let (op_sender, op_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in read_operations(&ops_path) {
            match result {
                Ok(op) => {
                    op_sender.send(op).await.unwrap();
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    engine.run(ReceiverStream::new(op_receiver)).await;

    write_catalog(engine.catalog().games());
}
