//! Client-side shopping cart.
//!
//! The backend owns cart lines; [`Cart`] keeps the client's view of them:
//! which rows are selected, which have an update in flight, and any
//! optimistic quantity edits. It performs no I/O; the cart service drives it
//! from API responses.
//!
//! Rows are addressed by index, the way the UI lists them. Every
//! index-addressed operation fails with [`CartError::RowNotFound`] when the
//! index is out of range.

mod quantity;
mod reconcile;

pub use quantity::{CommitTrigger, QuantityState, should_commit};
pub use reconcile::{ExtendedPurchase, reconcile};

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use shoplet_core::{Price, PurchaseId};

use crate::api::types::{Purchase, PurchaseLine};

/// Errors from cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// No row at the given index.
    #[error("no cart row at index {0}")]
    RowNotFound(usize),
}

/// The client's view of the in-cart purchases.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    rows: Vec<ExtendedPurchase>,
    /// `buy_count` last reported by the server, by purchase id.
    server_counts: HashMap<PurchaseId, u32>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rows, in server order.
    #[must_use]
    pub fn rows(&self) -> &[ExtendedPurchase] {
        &self.rows
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Adopt a fresh server fetch, keeping selections (see [`reconcile`]).
    pub fn reconcile(&mut self, fetched: &[Purchase], highlight: Option<&PurchaseId>) {
        self.rows = reconcile(&self.rows, fetched, highlight);
        self.server_counts = fetched
            .iter()
            .map(|p| (p.id.clone(), p.buy_count))
            .collect();
        debug!(rows = self.rows.len(), "Cart reconciled");
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.server_counts.clear();
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut ExtendedPurchase, CartError> {
        self.rows.get_mut(index).ok_or(CartError::RowNotFound(index))
    }

    fn row(&self, index: usize) -> Result<&ExtendedPurchase, CartError> {
        self.rows.get(index).ok_or(CartError::RowNotFound(index))
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Set the checkbox of one row.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn set_checked(&mut self, index: usize, checked: bool) -> Result<(), CartError> {
        self.row_mut(index)?.checked = checked;
        Ok(())
    }

    /// Flip the checkbox of one row.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn toggle(&mut self, index: usize) -> Result<(), CartError> {
        let row = self.row_mut(index)?;
        row.checked = !row.checked;
        Ok(())
    }

    /// Check exactly the rows whose id is in `ids`.
    pub fn set_checked_ids(&mut self, ids: &[PurchaseId]) {
        for row in &mut self.rows {
            row.checked = ids.contains(row.id());
        }
    }

    /// Whether every row is checked. An empty cart is never "all checked".
    #[must_use]
    pub fn is_all_checked(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|row| row.checked)
    }

    /// Check every row, or uncheck every row when all are already checked.
    pub fn toggle_all(&mut self) {
        let checked = !self.is_all_checked();
        for row in &mut self.rows {
            row.checked = checked;
        }
    }

    /// Checked rows, in display order.
    pub fn checked(&self) -> impl Iterator<Item = &ExtendedPurchase> {
        self.rows.iter().filter(|row| row.checked)
    }

    /// Number of checked rows.
    #[must_use]
    pub fn checked_count(&self) -> usize {
        self.checked().count()
    }

    /// Sum of `buy_count × price` over checked rows.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.checked().map(ExtendedPurchase::line_total).sum()
    }

    /// Sum of `buy_count × (price_before_discount − price)` over checked rows.
    #[must_use]
    pub fn total_price_sale(&self) -> Price {
        self.checked().map(ExtendedPurchase::line_savings).sum()
    }

    // =========================================================================
    // Bulk Actions
    // =========================================================================

    /// Id of one row, for a single delete.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn id_at(&self, index: usize) -> Result<PurchaseId, CartError> {
        Ok(self.row(index)?.id().clone())
    }

    /// Ids of the checked rows, for a bulk delete.
    #[must_use]
    pub fn checked_ids(&self) -> Vec<PurchaseId> {
        self.checked().map(|row| row.id().clone()).collect()
    }

    /// Checkout body for the checked rows. Empty when nothing is checked.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<PurchaseLine> {
        self.checked()
            .map(|row| PurchaseLine {
                product_id: row.purchase.product.id.clone(),
                buy_count: row.purchase.buy_count,
            })
            .collect()
    }

    // =========================================================================
    // Quantity Editing
    // =========================================================================

    /// Quantity state of a row.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn quantity_state(&self, index: usize) -> Result<QuantityState, CartError> {
        let row = self.row(index)?;
        let server = self.server_count(row.id()).unwrap_or(row.purchase.buy_count);
        Ok(QuantityState::of(row.purchase.buy_count, server, row.disabled))
    }

    fn server_count(&self, id: &PurchaseId) -> Option<u32> {
        self.server_counts.get(id).copied()
    }

    /// Record a typed quantity without contacting the server.
    ///
    /// Ignored while the row is submitting.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn type_quantity(&mut self, index: usize, value: u32) -> Result<(), CartError> {
        let row = self.row_mut(index)?;
        if !row.disabled {
            row.purchase.buy_count = value;
        }
        Ok(())
    }

    /// Try to commit `value` as the row's quantity.
    ///
    /// When allowed (see [`should_commit`]) the row takes the value, becomes
    /// disabled, and the update body is returned for the caller to send.
    /// Returns `None` when the row is already submitting or the value is not
    /// committable; the local value is left as typed in that case.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn commit(&mut self, index: usize, value: u32) -> Result<Option<PurchaseLine>, CartError> {
        let server = {
            let row = self.row(index)?;
            self.server_count(row.id()).unwrap_or(row.purchase.buy_count)
        };
        let row = self.row_mut(index)?;

        if row.disabled || !should_commit(value, row.purchase.product.quantity, server) {
            return Ok(None);
        }

        row.purchase.buy_count = value;
        row.disabled = true;
        Ok(Some(PurchaseLine {
            product_id: row.purchase.product.id.clone(),
            buy_count: value,
        }))
    }

    /// Commit in response to a `+`, `-` or blur on a row.
    ///
    /// `+`/`-` step the current local value by one; blur commits it as is.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn commit_trigger(
        &mut self,
        index: usize,
        trigger: CommitTrigger,
    ) -> Result<Option<PurchaseLine>, CartError> {
        let current = self.row(index)?.purchase.buy_count;
        let value = match trigger {
            CommitTrigger::Increase => current.saturating_add(1),
            CommitTrigger::Decrease => current.saturating_sub(1),
            CommitTrigger::Blur => current,
        };
        self.commit(index, value)
    }

    /// Settle an in-flight commit for `id` with the quantity the server accepted.
    pub fn confirm_commit(&mut self, id: &PurchaseId, buy_count: u32) {
        self.server_counts.insert(id.clone(), buy_count);
        if let Some(row) = self.rows.iter_mut().find(|row| row.id() == id) {
            row.disabled = false;
            row.purchase.buy_count = buy_count;
        }
    }

    /// Undo an in-flight commit for `id` after its update failed.
    ///
    /// Clears `disabled` and restores the last server quantity. Unknown ids
    /// are ignored (the row may have been removed by a later fetch).
    pub fn abort_commit(&mut self, id: &PurchaseId) {
        let server = self.server_count(id);
        if let Some(row) = self.rows.iter_mut().find(|row| row.id() == id) {
            row.disabled = false;
            if let Some(count) = server {
                row.purchase.buy_count = count;
            }
        }
    }
}
