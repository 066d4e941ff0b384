//! # Seed Data Generator
//!
//! Populates a development database with categories, products, users
//! and a handful of orders.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p bazaar-db --bin bazaar-seed
//!
//! # Generate custom amount
//! cargo run -p bazaar-db --bin bazaar-seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p bazaar-db --bin bazaar-seed -- --db ./data/bazaar.db
//! ```
//!
//! Without `--db` the path comes from `BAZAAR_DB_PATH`.
//!
//! ## Generated Data
//! - One category per entry in [`CATALOG`]
//! - Products: `{name} {variant}`, $4.99 - $49.98, zero to two images each
//! - An admin and a customer account
//! - Orders for the customer across every status

use std::env;

use bazaar_core::filter::ProductFilter;
use bazaar_core::types::{
    Category, NewImage, NewOrder, NewProduct, NewUser, OrderLine, ProductRef, Role,
    UpdateOrderRequest,
};
use bazaar_core::Money;
use bazaar_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Category title and the product names filed under it.
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Apparel",
        &["T-Shirt", "Hoodie", "Denim Jacket", "Wool Socks", "Rain Coat", "Linen Shirt"],
    ),
    (
        "Kitchen",
        &["Chef Knife", "Cast Iron Pan", "Coffee Mug", "Cutting Board", "Tea Kettle"],
    ),
    (
        "Books",
        &["Field Guide", "Cookbook", "Travel Journal", "Sketchbook", "Atlas"],
    ),
    (
        "Garden",
        &["Trowel", "Watering Can", "Seed Tray", "Pruning Shears", "Planter"],
    ),
    (
        "Toys",
        &["Wooden Blocks", "Kite", "Puzzle", "Yo-Yo", "Board Game"],
    ),
];

/// Variant suffixes; each one adds to the base price.
const VARIANTS: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 300),
    ("Large", 600),
    ("Deluxe", 1500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut config = DbConfig::from_env()?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: bazaar-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: $BAZAAR_DB_PATH)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), count, "Seeding database");

    let db = Database::new(config).await?;

    let existing = db.products().count(&ProductFilter::default()).await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut categories: Vec<Category> = CATALOG
        .iter()
        .map(|(title, _)| Category {
            id: 0,
            title: title.to_string(),
        })
        .collect();
    db.categories().insert(&mut categories).await?;
    info!(count = categories.len(), "Categories created");

    let mut product_ids = Vec::new();
    'catalog: for round in 0.. {
        let before = product_ids.len();
        for (category, (_, names)) in categories.iter().zip(CATALOG) {
            for (name_idx, name) in names.iter().enumerate() {
                for (variant_idx, (variant, addon)) in VARIANTS.iter().enumerate() {
                    if product_ids.len() >= count {
                        break 'catalog;
                    }
                    let seed = round * 1000 + name_idx * 10 + variant_idx;
                    let product = generate_product(category.id, name, variant, *addon, round, seed);
                    match db.products().insert(&product).await {
                        Ok(inserted) => product_ids.push(inserted.id),
                        Err(e) => warn!(title = %product.title, error = %e, "Failed to insert product"),
                    }
                }
            }
        }
        if product_ids.len() == before {
            break;
        }
    }
    info!(count = product_ids.len(), "Products created");

    let users = db.users();
    let admin = users
        .insert(&NewUser {
            email: "admin@bazaar.test".to_string(),
            password_hash: "seed-not-a-real-hash".to_string(),
            username: "admin".to_string(),
            role: Role::Admin,
        })
        .await?;
    let customer = users
        .insert(&NewUser {
            email: "customer@bazaar.test".to_string(),
            password_hash: "seed-not-a-real-hash".to_string(),
            username: "customer".to_string(),
            role: Role::Customer,
        })
        .await?;
    info!(admin = %admin.id, customer = %customer.id, "Users created");

    let service = db.order_service();
    let statuses = ["waiting", "shipping", "completed", "canceled"];
    for (n, chunk) in product_ids.chunks(3).take(8).enumerate() {
        let order = service
            .place_order(&NewOrder {
                user_id: customer.id.clone(),
                address: format!("{} Market Street", 10 + n),
                contact: format!("555-01{n:02}"),
                products: chunk
                    .iter()
                    .enumerate()
                    .map(|(q, id)| OrderLine {
                        qty: q as i64 + 1,
                        product: ProductRef {
                            id: id.clone(),
                            price: None,
                        },
                    })
                    .collect(),
            })
            .await?;

        let status = statuses[n % statuses.len()];
        if status != "waiting" {
            service
                .update_order(
                    Role::Admin,
                    &UpdateOrderRequest {
                        order_id: order.id.clone(),
                        status: Some(status.to_string()),
                        transfer_slip: None,
                    },
                )
                .await?;
        }
    }

    let elapsed = start.elapsed();
    info!(elapsed = ?elapsed, "Seed complete");

    Ok(())
}

/// Reads `RUST_LOG`, falling back to info with debug output for bazaar crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bazaar=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds one product with deterministic price and images.
fn generate_product(
    category_id: i64,
    name: &str,
    variant: &str,
    price_addon: i64,
    round: usize,
    seed: usize,
) -> NewProduct {
    // $4.99 - $34.98 before the variant addon
    let base_price = 499 + ((seed * 37) % 3000) as i64;

    let title = if round == 0 {
        format!("{name} {variant}")
    } else {
        format!("{name} {variant} #{}", round + 1)
    };
    let slug = title.to_lowercase().replace([' ', '#'], "-");

    let images = (0..seed % 3)
        .map(|n| NewImage {
            filename: format!("{slug}-{n}.jpg"),
            url: format!("https://cdn.bazaar.test/products/{slug}-{n}.jpg"),
        })
        .collect();

    NewProduct {
        title,
        description: format!("{name} in {} size.", variant.to_lowercase()),
        price: Money::from_cents(base_price + price_addon),
        category_id,
        images,
    }
}
