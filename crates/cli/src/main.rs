//! Shoplet CLI - storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in SHOPLET_STORAGE_PATH)
//! shoplet auth login -e lan@shop.vn
//!
//! # Browse
//! shoplet products list --category 60aba4e24efcc70f8892e1c6 --sort-by sold
//! shoplet products show Dien-thoai-Apple-iPhone-12-i,60afb2c76ef5b902180aacba
//!
//! # Cart
//! shoplet cart add 60afb2c76ef5b902180aacba 2
//! shoplet cart set 0 3
//! shoplet cart check 0 2
//! shoplet cart checkout
//! ```
//!
//! # Commands
//!
//! - `products` - List and show products
//! - `categories` - List categories
//! - `cart` - Show and edit the cart, check out
//! - `auth` - Register, log in, log out, show the signed-in user

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shoplet_storefront::config::StorefrontConfig;
use shoplet_storefront::error::AppError;
use shoplet_storefront::state::AppState;

mod commands;

use commands::products::ListArgs;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "shoplet_storefront=info,shoplet=info";

#[derive(Parser)]
#[command(name = "shoplet")]
#[command(author, version, about = "Shoplet storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List product categories
    Categories,
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List one page of products
    List(ListArgs),
    /// Show one product by slug or id
    Show {
        /// Product slug (`name-i,id`) or bare id
        slug: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with selections and totals
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        product_id: String,
        /// Quantity to add
        #[arg(default_value_t = 1)]
        count: u32,
    },
    /// Set the quantity of a row
    Set {
        /// Row number as shown by `cart show`
        row: usize,
        /// New quantity
        count: u32,
    },
    /// Toggle the checkbox of one or more rows
    Check {
        /// Row numbers as shown by `cart show`
        #[arg(required = true)]
        rows: Vec<usize>,
    },
    /// Check every row, or uncheck all when all are checked
    CheckAll,
    /// Delete one or more rows
    Remove {
        /// Row numbers as shown by `cart show`
        #[arg(required = true)]
        rows: Vec<usize>,
    },
    /// Delete every checked row
    RemoveChecked,
    /// Buy the checked rows
    Checkout,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Create an account and sign in
    Register {
        /// Email address
        #[arg(short, long)]
        email: String,
        /// Password
        #[arg(short, long, env = "SHOPLET_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password again
        #[arg(long, env = "SHOPLET_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: String,
    },
    /// Sign in
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,
        /// Password
        #[arg(short, long, env = "SHOPLET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = StorefrontConfig::from_env()?;
    let state = AppState::open(config)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List(args) => commands::products::list(&state, args).await?,
            ProductsAction::Show { slug } => commands::products::show(&state, &slug).await?,
        },
        Commands::Categories => commands::products::categories(&state).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await?,
            CartAction::Add { product_id, count } => {
                commands::cart::add(&state, &product_id, count).await?;
            }
            CartAction::Set { row, count } => commands::cart::set(&state, row, count).await?,
            CartAction::Check { rows } => commands::cart::check(&state, &rows).await?,
            CartAction::CheckAll => commands::cart::check_all(&state).await?,
            CartAction::Remove { rows } => commands::cart::remove(&state, &rows).await?,
            CartAction::RemoveChecked => commands::cart::remove_checked(&state).await?,
            CartAction::Checkout => commands::cart::checkout(&state).await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Register {
                email,
                password,
                confirm_password,
            } => commands::auth::register(&state, &email, &password, &confirm_password).await?,
            AuthAction::Login { email, password } => {
                commands::auth::login(&state, &email, &password).await?;
            }
            AuthAction::Logout => commands::auth::logout(&state).await?,
            AuthAction::Whoami => commands::auth::whoami(&state),
        },
    }
    Ok(())
}
