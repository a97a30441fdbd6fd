//! Non-repeating rotation over the normal message pool.
//!
//! A shuffled permutation of `0..N` is consumed one slot per tick. When it
//! runs out a new permutation is drawn; if that permutation would open with
//! the message shown last, its first two slots are swapped.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::{KEY_INDEX, KEY_LAST_MESSAGE, KEY_ORDER};
use crate::store::{PersistedStore, StoreValue};

/// Persisted rotation cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    /// Current shuffle, `None` when absent or unreadable.
    pub order: Option<Vec<usize>>,
    /// Next unconsumed position in `order`.
    pub index: usize,
    /// Pool index emitted by the previous rotation tick.
    pub last_message_index: Option<usize>,
}

impl RotationState {
    /// Read the rotation keys from `store`.
    ///
    /// Unparsable orders and negative cursors come back as `order: None`,
    /// which forces a reshuffle on the next step.
    ///
    /// # Errors
    ///
    /// Returns the store error if any key cannot be read.
    pub fn load<S: PersistedStore + ?Sized>(store: &S) -> Result<Self, S::Error> {
        let raw_order = store.get_string(KEY_ORDER)?;
        let raw_index = store.get_int(KEY_INDEX)?;
        let raw_last = store.get_int(KEY_LAST_MESSAGE)?;

        let mut order = raw_order.as_deref().and_then(order_from_csv);
        let index = match raw_index {
            Some(value) if value < 0 => {
                order = None;
                0
            }
            Some(value) => usize::try_from(value).unwrap_or(usize::MAX),
            None => 0,
        };
        let last_message_index = raw_last
            .filter(|value| *value >= 0)
            .and_then(|value| usize::try_from(value).ok());

        Ok(Self {
            order,
            index,
            last_message_index,
        })
    }

    /// Entries that persist this state. `order: None` is stored as an empty
    /// string and `last_message_index: None` as `-1`.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(String, StoreValue)> {
        let order = self.order.as_deref().map(order_to_csv).unwrap_or_default();
        vec![
            (KEY_ORDER.to_string(), StoreValue::Str(order)),
            (KEY_INDEX.to_string(), StoreValue::Int(to_i64(self.index))),
            (
                KEY_LAST_MESSAGE.to_string(),
                StoreValue::Int(self.last_message_index.map_or(-1, to_i64)),
            ),
        ]
    }

    /// Positions left before the current cycle is exhausted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.order
            .as_ref()
            .map_or(0, |order| order.len().saturating_sub(self.index))
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Result of one rotation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationStep {
    /// Pool index to show.
    pub emitted: usize,
    /// State to persist after showing it.
    pub next: RotationState,
    /// A fresh permutation was drawn on this step.
    pub reshuffled: bool,
    /// The stored order was present but unusable and got replaced.
    pub healed: bool,
}

/// Advance the rotation for a pool of `pool_len` messages.
///
/// Returns `None` for an empty pool.
pub fn advance<R: Rng + ?Sized>(
    state: &RotationState,
    pool_len: usize,
    rng: &mut R,
) -> Option<RotationStep> {
    if pool_len == 0 {
        return None;
    }
    let last = state.last_message_index.filter(|idx| *idx < pool_len);

    let usable = state
        .order
        .as_ref()
        .filter(|order| is_permutation(order, pool_len));
    let healed = state.order.is_some() && usable.is_none();

    let (mut order, mut index, mut reshuffled) = match usable {
        Some(order) => (order.clone(), state.index, false),
        None => (shuffled_order(pool_len, last, rng), 0, true),
    };

    if index >= order.len() {
        order = shuffled_order(pool_len, last, rng);
        index = 0;
        reshuffled = true;
    }

    let emitted = order[index];
    Some(RotationStep {
        emitted,
        next: RotationState {
            order: Some(order),
            index: index + 1,
            last_message_index: Some(emitted),
        },
        reshuffled,
        healed,
    })
}

/// Draw a uniform permutation of `0..len`, then break an immediate repeat of `last`.
pub fn shuffled_order<R: Rng + ?Sized>(len: usize, last: Option<usize>, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    if order.len() > 1 && last.is_some_and(|last| order[0] == last) {
        order.swap(0, 1);
    }
    order
}

/// `true` when `order` holds every index in `0..len` exactly once.
#[must_use]
pub fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &idx in order {
        match seen.get_mut(idx) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

#[must_use]
pub fn order_to_csv(order: &[usize]) -> String {
    order
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a comma-separated order. Blank or malformed input yields `None`.
#[must_use]
pub fn order_from_csv(csv: &str) -> Option<Vec<usize>> {
    if csv.trim().is_empty() {
        return None;
    }
    csv.split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect()
}
