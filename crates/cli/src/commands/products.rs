//! Catalog commands.

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use shoplet_core::{CategoryId, ProductId};
use shoplet_storefront::api::types::{Order, Product, ProductListConfig, SortBy};
use shoplet_storefront::error::Result;
use shoplet_storefront::format::{format_currency, format_number_to_social_style, rate_sale};
use shoplet_storefront::slug::generate_name_id;
use shoplet_storefront::state::AppState;

/// Filters for `products list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Products per page
    #[arg(long, default_value_t = 20)]
    limit: u32,
    /// Sort key
    #[arg(long, value_enum)]
    sort_by: Option<SortKey>,
    /// Sort direction (price sorts only)
    #[arg(long, value_enum)]
    order: Option<Direction>,
    /// Category id
    #[arg(long)]
    category: Option<String>,
    /// Product id to leave out
    #[arg(long)]
    exclude: Option<String>,
    /// Minimum rating (1-5)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating: Option<u8>,
    /// Lowest price
    #[arg(long)]
    price_min: Option<Decimal>,
    /// Highest price
    #[arg(long)]
    price_max: Option<Decimal>,
    /// Name search
    #[arg(long)]
    name: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortKey {
    CreatedAt,
    View,
    Sold,
    Price,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    Asc,
    Desc,
}

impl From<ListArgs> for ProductListConfig {
    fn from(args: ListArgs) -> Self {
        Self {
            page: args.page,
            limit: args.limit,
            order: args.order.map(|order| match order {
                Direction::Asc => Order::Asc,
                Direction::Desc => Order::Desc,
            }),
            sort_by: args.sort_by.map(|key| match key {
                SortKey::CreatedAt => SortBy::CreatedAt,
                SortKey::View => SortBy::View,
                SortKey::Sold => SortBy::Sold,
                SortKey::Price => SortBy::Price,
            }),
            category: args.category.map(CategoryId::from),
            exclude: args.exclude.map(ProductId::from),
            rating_filter: args.rating,
            price_max: args.price_max,
            price_min: args.price_min,
            name: args.name,
        }
    }
}

fn print_summary(product: &Product) {
    println!(
        "{}  {}₫  (was {}₫, -{})  {} sold  ★{:.1}",
        product.name,
        format_currency(product.price.amount()),
        format_currency(product.price_before_discount.amount()),
        rate_sale(product.price_before_discount, product.price),
        format_number_to_social_style(product.sold),
        product.rating,
    );
    println!("    {}", generate_name_id(&product.name, product.id.as_str()));
}

/// List one page of products.
pub async fn list(state: &AppState, args: ListArgs) -> Result<()> {
    let config = ProductListConfig::from(args);
    let page = state.catalog_service().list(&config).await?;

    for product in &page.products {
        print_summary(product);
    }
    println!(
        "Page {} of {} ({} per page)",
        page.pagination.page, page.pagination.page_size, page.pagination.limit
    );
    Ok(())
}

/// Show one product.
pub async fn show(state: &AppState, slug: &str) -> Result<()> {
    let product = state.catalog_service().product(slug).await?;

    print_summary(&product);
    println!("    In stock: {}", product.quantity);
    println!("    Views: {}", format_number_to_social_style(product.view));
    if let Some(category) = &product.category {
        println!("    Category: {}", category.name);
    }
    Ok(())
}

/// List every category.
pub async fn categories(state: &AppState) -> Result<()> {
    for category in state.catalog_service().categories().await?.iter() {
        println!("{}  {}", category.id, category.name);
    }
    Ok(())
}
