//! Emporium CLI - drive the cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart and its totals
//! emporium cart show
//!
//! # Add a product by id (looked up on the backend)
//! emporium cart add 64f1c0ffee
//!
//! # Adjust quantities
//! emporium cart inc 64f1c0ffee
//! emporium cart dec 64f1c0ffee
//!
//! # Try coupon codes; each one replaces the last, only the final code counts
//! emporium coupon SAVE SAVE10
//!
//! # Draft the order
//! emporium checkout --address "221B Baker St" --city Mumbai --state MH \
//!     --country India --pin-code 400001
//!
//! # Clear the cart once the order is placed
//! emporium order complete
//! ```
//!
//! Configuration comes from the environment; see
//! [`emporium_storefront::config`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use emporium_core::ShippingInfo;
use emporium_core::cart::CartStore;
use emporium_storefront::{FileStorage, StorefrontConfig};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Validate coupon codes, applying the last one entered
    Coupon {
        /// Successive values of the coupon field
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Draft an order from the cart
    Checkout {
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        pin_code: String,
    },
    /// Order lifecycle
    Order {
        #[command(subcommand)]
        action: OrderCommand,
    },
}

#[derive(Subcommand)]
enum CartCommand {
    /// Print items and totals
    Show,
    /// Add one unit of a product
    Add { id: String },
    /// Increase a line item's quantity
    Inc { id: String },
    /// Decrease a line item's quantity
    Dec { id: String },
    /// Remove a line item
    Remove { id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrderCommand {
    /// Mark the order as placed and clear the cart
    Complete,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Target prefixes match, so this covers emporium_core and emporium_storefront
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emporium=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be up before the tracing layer that feeds it
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = CartStore::rehydrate(FileStorage::open(&config.cart_path));

    match cli.command {
        Commands::Cart { action } => match action {
            CartCommand::Show => render::cart(&store),
            CartCommand::Add { id } => commands::cart::add(&mut store, config, &id).await?,
            CartCommand::Inc { id } => commands::cart::increment(&mut store, &id)?,
            CartCommand::Dec { id } => commands::cart::decrement(&mut store, &id)?,
            CartCommand::Remove { id } => commands::cart::remove(&mut store, &id)?,
            CartCommand::Clear => commands::cart::clear(&mut store),
        },
        Commands::Coupon { codes } => commands::coupon::apply(&mut store, config, &codes).await?,
        Commands::Checkout {
            address,
            city,
            state,
            country,
            pin_code,
        } => {
            let info = ShippingInfo {
                address,
                city,
                state,
                country,
                pin_code,
            };
            commands::checkout::draft(&mut store, info)?;
        }
        Commands::Order { action } => match action {
            OrderCommand::Complete => commands::checkout::complete(&mut store),
        },
    }
    Ok(())
}
