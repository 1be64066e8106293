//! Position bookkeeping for line items. After every operation here the items carry
//! `sheet_no` values `1..=n` in vector order.

use std::collections::HashSet;

use super::domain::{EstimateItem, ItemId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("line item {0} not found")]
    UnknownItem(ItemId),
    #[error("line item {0} listed more than once")]
    DuplicateItem(ItemId),
    #[error("new order lists {given} items but the estimate has {expected}")]
    CountMismatch { given: usize, expected: usize },
}

pub(crate) fn renumber(items: &mut [EstimateItem]) {
    for (position, item) in items.iter_mut().enumerate() {
        item.sheet_no = position as u32 + 1;
    }
}

/// Rearranges `items` to follow `order`, which must name every item exactly once.
pub(crate) fn reorder(items: &mut Vec<EstimateItem>, order: &[ItemId]) -> Result<(), OrderingError> {
    if order.len() != items.len() {
        return Err(OrderingError::CountMismatch {
            given: order.len(),
            expected: items.len(),
        });
    }

    let mut seen = HashSet::new();
    for id in order {
        if !seen.insert(id) {
            return Err(OrderingError::DuplicateItem(id.clone()));
        }
        if !items.iter().any(|item| &item.item_id == id) {
            return Err(OrderingError::UnknownItem(id.clone()));
        }
    }

    let mut remaining = std::mem::take(items);
    for id in order {
        if let Some(index) = remaining.iter().position(|item| &item.item_id == id) {
            items.push(remaining.swap_remove(index));
        }
    }
    renumber(items);
    Ok(())
}

/// Moves one item to the 1-based `position`, clamped into `1..=n`.
pub(crate) fn move_to(
    items: &mut Vec<EstimateItem>,
    item_id: &ItemId,
    position: u32,
) -> Result<(), OrderingError> {
    let from = items
        .iter()
        .position(|item| &item.item_id == item_id)
        .ok_or_else(|| OrderingError::UnknownItem(item_id.clone()))?;

    let target = (position.max(1) as usize - 1).min(items.len() - 1);
    let item = items.remove(from);
    items.insert(target, item);
    renumber(items);
    Ok(())
}

/// Removes an item and closes the gap it leaves in the numbering.
pub(crate) fn remove(items: &mut Vec<EstimateItem>, item_id: &ItemId) -> Result<EstimateItem, OrderingError> {
    let index = items
        .iter()
        .position(|item| &item.item_id == item_id)
        .ok_or_else(|| OrderingError::UnknownItem(item_id.clone()))?;
    let removed = items.remove(index);
    renumber(items);
    Ok(removed)
}
