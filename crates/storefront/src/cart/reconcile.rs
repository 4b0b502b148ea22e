//! Merging freshly fetched cart lines with client-side selection state.

use std::collections::HashMap;

use shoplet_core::{Price, PurchaseId};

use crate::api::types::Purchase;

/// A cart line plus the transient flags the client keeps for it.
///
/// Neither flag is ever sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedPurchase {
    /// Server record. `buy_count` may hold an optimistic local edit.
    pub purchase: Purchase,
    /// Selected for bulk delete and checkout.
    pub checked: bool,
    /// A quantity update for this row is in flight.
    pub disabled: bool,
}

impl ExtendedPurchase {
    /// Identifier of the underlying purchase.
    #[must_use]
    pub const fn id(&self) -> &PurchaseId {
        &self.purchase.id
    }

    /// `buy_count × price` for this row.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.purchase.product.price * self.purchase.buy_count
    }

    /// `buy_count × (price_before_discount − price)` for this row.
    #[must_use]
    pub fn line_savings(&self) -> Price {
        let product = &self.purchase.product;
        (product.price_before_discount - product.price) * self.purchase.buy_count
    }
}

/// Project `fetched` into extended rows, carrying selections over from `previous`.
///
/// - one output row per fetched purchase, in fetched order;
/// - `checked` is forced on for `highlight`, otherwise copied from the
///   previous row with the same id, otherwise off;
/// - `disabled` is always reset.
#[must_use]
pub fn reconcile(
    previous: &[ExtendedPurchase],
    fetched: &[Purchase],
    highlight: Option<&PurchaseId>,
) -> Vec<ExtendedPurchase> {
    let previously_checked: HashMap<&PurchaseId, bool> = previous
        .iter()
        .map(|row| (row.id(), row.checked))
        .collect();

    fetched
        .iter()
        .map(|purchase| {
            let highlighted = highlight == Some(&purchase.id);
            let carried = previously_checked
                .get(&purchase.id)
                .copied()
                .unwrap_or(false);
            ExtendedPurchase {
                purchase: purchase.clone(),
                checked: highlighted || carried,
                disabled: false,
            }
        })
        .collect()
}
