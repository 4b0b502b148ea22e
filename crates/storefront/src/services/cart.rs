//! Cart service.
//!
//! Drives the in-memory [`Cart`] from backend calls. The cart lock is never
//! held across an await.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use shoplet_core::{ProductId, PurchaseId, PurchaseStatus};

use crate::api::ApiClient;
use crate::api::types::{Purchase, PurchaseLine};
use crate::cart::{Cart, CommitTrigger};
use crate::error::Result;

/// Cart service.
pub struct CartService<'a> {
    api: &'a ApiClient,
    cart: &'a Mutex<Cart>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(api: &'a ApiClient, cart: &'a Mutex<Cart>) -> Self {
        Self { api, cart }
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    /// Refetch the in-cart purchases and reconcile them into the cart.
    ///
    /// `highlight` is checked after the merge. A fetch that completes after
    /// the session was cleared or replaced is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails; the cart is left untouched.
    #[instrument(skip(self))]
    pub async fn refresh(&self, highlight: Option<&PurchaseId>) -> Result<()> {
        self.reconcile_fetched(highlight).await?;
        Ok(())
    }

    /// Fetch and reconcile. Returns whether the result was applied.
    async fn reconcile_fetched(&self, highlight: Option<&PurchaseId>) -> Result<bool> {
        let generation = self.api.session_generation();
        let purchases = self.api.get_purchases(PurchaseStatus::InCart).await?;

        // Checked under the cart lock: a clear bumps the generation before
        // its listeners lock the cart to empty it.
        let mut cart = self.lock();
        if self.api.session_generation() != generation {
            debug!("Session changed during fetch, discarding purchases");
            return Ok(false);
        }
        cart.reconcile(&purchases, highlight);
        Ok(true)
    }

    /// Add a product to the cart and select its line.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend call fails.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: &ProductId, buy_count: u32) -> Result<Purchase> {
        let line = PurchaseLine {
            product_id: product_id.clone(),
            buy_count,
        };
        let purchase = self.api.add_to_cart(&line).await?;
        info!(purchase_id = %purchase.id, "Added to cart");
        self.refresh(Some(&purchase.id)).await?;
        Ok(purchase)
    }

    /// Record a typed quantity locally.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index.
    pub fn type_quantity(&self, index: usize, value: u32) -> Result<()> {
        Ok(self.lock().type_quantity(index, value)?)
    }

    /// Commit `value` as the quantity of row `index`.
    ///
    /// Returns whether an update was sent. When the update fails the cart is
    /// refetched, or the row restored to its last server quantity if the
    /// refetch fails too.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index, or the
    /// update error.
    #[instrument(skip(self))]
    pub async fn set_quantity(&self, index: usize, value: u32) -> Result<bool> {
        let pending = {
            let mut cart = self.lock();
            let id = cart.id_at(index)?;
            cart.commit(index, value)?.map(|line| (id, line))
        };
        self.commit_line(pending).await
    }

    /// Commit in response to `+`, `-` or blur on row `index`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_quantity`].
    #[instrument(skip(self))]
    pub async fn step_quantity(&self, index: usize, trigger: CommitTrigger) -> Result<bool> {
        let pending = {
            let mut cart = self.lock();
            let id = cart.id_at(index)?;
            cart.commit_trigger(index, trigger)?.map(|line| (id, line))
        };
        self.commit_line(pending).await
    }

    /// Send a committed quantity and settle the row.
    ///
    /// On success the row takes the server's answer and the cart is
    /// refetched. On failure a refetch is still attempted; if that fails too
    /// or is discarded, the row is restored to its last server quantity. The
    /// update error is returned either way.
    async fn commit_line(&self, pending: Option<(PurchaseId, PurchaseLine)>) -> Result<bool> {
        let Some((id, line)) = pending else {
            debug!("Quantity unchanged or row busy, nothing sent");
            return Ok(false);
        };

        match self.api.update_purchase(&line).await {
            Ok(updated) => {
                self.lock().confirm_commit(&id, updated.buy_count);
                self.refresh(None).await?;
                Ok(true)
            }
            Err(update_error) => {
                warn!(error = %update_error, purchase_id = %id, "Quantity update failed");
                match self.reconcile_fetched(None).await {
                    Ok(true) => {}
                    Ok(false) => self.lock().abort_commit(&id),
                    Err(e) => {
                        warn!(error = %e, "Refetch after failed update also failed");
                        self.lock().abort_commit(&id);
                    }
                }
                Err(update_error.into())
            }
        }
    }

    /// Delete the row at `index`. Returns how many purchases were removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` for an out-of-range index, or an
    /// error if a backend call fails.
    #[instrument(skip(self))]
    pub async fn delete_at(&self, index: usize) -> Result<u64> {
        let id = self.lock().id_at(index)?;
        self.delete(&[id]).await
    }

    /// Delete several rows in one request.
    ///
    /// # Errors
    ///
    /// Returns `CartError::RowNotFound` if any index is out of range (nothing
    /// is deleted then), or an error if a backend call fails.
    #[instrument(skip(self))]
    pub async fn delete_rows(&self, indices: &[usize]) -> Result<u64> {
        let ids = {
            let cart = self.lock();
            let mut ids = indices
                .iter()
                .map(|&index| cart.id_at(index))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        if ids.is_empty() {
            return Ok(0);
        }
        self.delete(&ids).await
    }

    /// Delete every checked row. Sends nothing when none are checked.
    ///
    /// # Errors
    ///
    /// Returns an error if a backend call fails.
    #[instrument(skip(self))]
    pub async fn delete_checked(&self) -> Result<u64> {
        let ids = self.lock().checked_ids();
        if ids.is_empty() {
            return Ok(0);
        }
        self.delete(&ids).await
    }

    async fn delete(&self, ids: &[PurchaseId]) -> Result<u64> {
        let deleted = self.api.delete_purchases(ids).await?;
        info!(deleted, "Deleted purchases");
        self.refresh(None).await?;
        Ok(deleted)
    }

    /// Buy the checked rows. Returns the backend message, or `None` when
    /// nothing is checked (no request is sent).
    ///
    /// # Errors
    ///
    /// Returns an error if a backend call fails.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<Option<String>> {
        let lines = self.lock().checkout_lines();
        if lines.is_empty() {
            debug!("Nothing checked, skipping checkout");
            return Ok(None);
        }

        let response = self.api.buy_products(&lines).await?;
        info!(lines = lines.len(), "Checked out");
        // Bought lines move to other status lists.
        self.api.cache().invalidate_purchases().await;
        self.refresh(None).await?;
        Ok(Some(response.message))
    }
}
