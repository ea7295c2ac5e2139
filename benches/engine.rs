use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use store_eng::catalog::{MemoryCatalog, NewGame};
use store_eng::{Amount, CartLine, Engine, Operation, UserId};

const GAMES: &[(&str, &str, f64)] = &[
    ("Tetra Twist", "puzzle", 2.0),
    ("Goal Rush", "sports", 1.0),
    ("Blast Lane", "action", 1.5),
    ("Hex Empire", "strategy", 5.0),
];

fn seeded_engine() -> Engine<MemoryCatalog> {
    let mut catalog = MemoryCatalog::new();
    for (name, category, price) in GAMES {
        catalog
            .insert(NewGame {
                name: name.to_string(),
                category: category.to_string(),
                price: Amount::from_float(*price),
                available: 10_000_000,
                sold: 0,
                min_stock: 0,
                image_url: None,
            })
            .expect("seed catalog");
    }
    Engine::new(catalog)
}

/// Generates valid operation sequences for benchmarking.
///
/// Pattern per game (repeating):
/// 1. Purchase 2
/// 2. Purchase 1
/// 3. Return 3
///
/// Net-zero stock movement, so returns never exceed sold and stock never
/// runs out regardless of sequence length.
struct OpGenerator {
    next: u64,
    total: u64,
}

impl OpGenerator {
    fn new(total: u64) -> Self {
        Self { next: 0, total }
    }
}

impl Iterator for OpGenerator {
    type Item = Operation;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }

        let i = self.next;
        self.next += 1;

        let game = GAMES[(i % GAMES.len() as u64) as usize].0.to_string();
        let user = (i % 50) as UserId + 1;
        let op = match (i / GAMES.len() as u64) % 3 {
            0 => Operation::Purchase {
                user,
                game,
                quantity: 2,
            },
            1 => Operation::Purchase {
                user,
                game,
                quantity: 1,
            },
            _ => Operation::Return {
                user,
                game,
                quantity: 3,
            },
        };

        Some(op)
    }
}

fn bench_settlement(c: &mut Criterion) {
    let mut group = c.benchmark_group("settlement");

    for count in [1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut engine = seeded_engine();
                for op in OpGenerator::new(count) {
                    let _ = black_box(engine.apply(op));
                }
                engine
            });
        });
    }

    group.finish();
}

fn bench_cart_checkout(c: &mut Criterion) {
    let mut group = c.benchmark_group("cart_checkout");

    // Carts that hit the joint sports + action discount tier.
    group.bench_function("discounted_3_line_cart", |b| {
        b.iter(|| {
            let mut engine = seeded_engine();
            for user in 1..=1_000u32 {
                let cart = [
                    CartLine::new(2, 20),
                    CartLine::new(3, 15),
                    CartLine::new(1, 5),
                ];
                let _ = black_box(engine.checkout(user, &cart));
            }
            engine
        });
    });

    group.finish();
}

fn bench_pricing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");

    let engine = seeded_engine();
    let cart = [
        CartLine::new(1, 13),
        CartLine::new(1, 12),
        CartLine::new(2, 20),
        CartLine::new(3, 15),
    ];

    group.bench_function("preview_4_line_cart", |b| {
        b.iter(|| black_box(engine.price_cart(black_box(&cart))));
    });

    group.finish();
}

criterion_group!(benches, bench_settlement, bench_cart_checkout, bench_pricing);
criterion_main!(benches);
