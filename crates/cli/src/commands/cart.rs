//! Cart commands.
//!
//! Every command starts from a fresh fetch of the in-cart purchases. Row
//! selections are kept in durable storage between invocations.

use std::sync::PoisonError;

use shoplet_core::{ProductId, PurchaseId};
use shoplet_storefront::cart::QuantityState;
use shoplet_storefront::error::Result;
use shoplet_storefront::format::format_currency;
use shoplet_storefront::state::AppState;
use shoplet_storefront::storage::{StorageError, keys};

/// Fetch the cart and re-apply the stored selection.
async fn load(state: &AppState) -> Result<()> {
    state.cart_service().refresh(None).await?;

    let saved: Vec<PurchaseId> = state
        .storage()
        .get(keys::CART_SELECTION)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable cart selection");
            None
        })
        .unwrap_or_default();

    state
        .cart()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .set_checked_ids(&saved);
    Ok(())
}

/// Store the current selection.
fn save(state: &AppState) -> Result<()> {
    let checked = state
        .cart()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .checked_ids();
    let raw = serde_json::to_string(&checked).map_err(StorageError::from)?;
    state.storage().set(keys::CART_SELECTION, &raw)?;
    Ok(())
}

fn print_cart(state: &AppState) {
    let cart = state.cart_service().snapshot();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for (index, row) in cart.rows().iter().enumerate() {
        let mark = if row.checked { "[x]" } else { "[ ]" };
        let pending = match cart.quantity_state(index) {
            Ok(QuantityState::Submitting { .. }) => "  (updating)",
            _ => "",
        };
        println!(
            "{index:>3} {mark} {}  {} × {}₫ = {}₫  (stock {}){pending}",
            row.purchase.product.name,
            row.purchase.buy_count,
            format_currency(row.purchase.product.price.amount()),
            format_currency(row.line_total().amount()),
            row.purchase.product.quantity,
        );
    }
    println!(
        "Checked {} of {}. Total: {}₫  Saved: {}₫",
        cart.checked_count(),
        cart.len(),
        format_currency(cart.total_price().amount()),
        format_currency(cart.total_price_sale().amount()),
    );
}

/// Show the cart.
pub async fn show(state: &AppState) -> Result<()> {
    load(state).await?;
    print_cart(state);
    Ok(())
}

/// Add a product and select its line.
pub async fn add(state: &AppState, product_id: &str, count: u32) -> Result<()> {
    load(state).await?;
    let purchase = state
        .cart_service()
        .add_to_cart(&ProductId::new(product_id), count)
        .await?;
    save(state)?;
    println!("Added {} to the cart.", purchase.product.name);
    print_cart(state);
    Ok(())
}

/// Set the quantity of one row.
pub async fn set(state: &AppState, row: usize, count: u32) -> Result<()> {
    load(state).await?;
    let sent = state.cart_service().set_quantity(row, count).await?;
    if !sent {
        println!("Quantity unchanged (must be between 1 and the stock, and differ from the current one).");
    }
    save(state)?;
    print_cart(state);
    Ok(())
}

/// Toggle rows.
pub async fn check(state: &AppState, rows: &[usize]) -> Result<()> {
    load(state).await?;
    {
        let mut cart = state.cart().lock().unwrap_or_else(PoisonError::into_inner);
        for &row in rows {
            cart.toggle(row)?;
        }
    }
    save(state)?;
    print_cart(state);
    Ok(())
}

/// Check all rows, or uncheck all.
pub async fn check_all(state: &AppState) -> Result<()> {
    load(state).await?;
    state
        .cart()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .toggle_all();
    save(state)?;
    print_cart(state);
    Ok(())
}

/// Delete rows by number.
pub async fn remove(state: &AppState, rows: &[usize]) -> Result<()> {
    load(state).await?;
    let deleted = state.cart_service().delete_rows(rows).await?;
    save(state)?;
    println!("Removed {deleted} item(s).");
    print_cart(state);
    Ok(())
}

/// Delete every checked row.
pub async fn remove_checked(state: &AppState) -> Result<()> {
    load(state).await?;
    let deleted = state.cart_service().delete_checked().await?;
    save(state)?;
    println!("Removed {deleted} item(s).");
    print_cart(state);
    Ok(())
}

/// Buy the checked rows.
pub async fn checkout(state: &AppState) -> Result<()> {
    load(state).await?;
    match state.cart_service().checkout().await? {
        Some(message) => println!("{message}"),
        None => println!("Nothing checked. Use `shoplet cart check <row>` first."),
    }
    save(state)?;
    print_cart(state);
    Ok(())
}
