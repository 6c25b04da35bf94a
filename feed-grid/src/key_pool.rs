//! Render key recycling.
//!
//! ## Usage
//!
//! Hand the live items of each frame to [`reconcile`] together with the pool
//! state returned by the previous call. Every live item comes back with a
//! [`RenderKey`]; the host keys its heavyweight surface (image view, video
//! decoder) by that key instead of by item id, so a surface is handed from an
//! item leaving the screen to an item entering it rather than being torn down
//! and rebuilt.
//!
//! ## Policy
//!
//! 1. An item that stays live keeps its key.
//! 2. An item that (re-)enters reclaims its own former key if that key is
//!    still free.
//! 3. Otherwise it takes the oldest free key of its media kind.
//! 4. Only when no free key of its kind exists is a new key minted.
//!
//! Released keys stay in the pool as free keys; the key inventory never
//! shrinks unless a per-kind free cap is configured.
//!
//! ```
//! use feed_grid::{ItemId, MediaKind, key_pool::{LiveItem, PoolState, reconcile}};
//!
//! let a = LiveItem::new(ItemId(1), MediaKind::Image);
//! let b = LiveItem::new(ItemId(2), MediaKind::Video);
//! let c = LiveItem::new(ItemId(3), MediaKind::Image);
//!
//! let first = reconcile(&[a, b], PoolState::default(), None);
//! let key_a = first.assignments[0].key;
//! let key_b = first.assignments[1].key;
//!
//! let second = reconcile(&[b, c], first.state, None);
//! assert_eq!(second.assignments[0].key, key_b);
//! assert_eq!(second.assignments[1].key, key_a);
//! assert_eq!(second.stats.minted, 0);
//! ```
use std::collections::VecDeque;

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use slotmap::SlotMap;
use tracing::debug;

use crate::{ItemId, MediaKind, masonry::Placement};

slotmap::new_key_type! {
    /// Opaque identity of a reusable rendering surface.
    ///
    /// Keys are unique across media kinds and stay valid for as long as the
    /// pool keeps them in its inventory.
    pub struct RenderKey;
}

/// An item that should hold a key this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveItem {
    /// Item identity.
    pub item_id: ItemId,
    /// Pool the key is drawn from.
    pub kind: MediaKind,
}

impl LiveItem {
    /// Creates a live item.
    pub const fn new(item_id: ItemId, kind: MediaKind) -> Self {
        Self { item_id, kind }
    }
}

impl From<&Placement> for LiveItem {
    fn from(placement: &Placement) -> Self {
        Self::new(placement.item_id, placement.kind)
    }
}

/// A key currently owned by a live item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyAssignment {
    /// Owning item.
    pub item_id: ItemId,
    /// Media kind of the item and of the key.
    pub kind: MediaKind,
    /// The assigned key.
    pub key: RenderKey,
}

/// A released key waiting to be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FreeKey {
    /// The released key.
    pub key: RenderKey,
    /// Item that owned the key when it was released.
    pub last_owner: ItemId,
}

/// Free keys of one media kind, oldest release first.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FreeList {
    queue: VecDeque<FreeKey>,
}

impl FreeList {
    /// Creates an empty free list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `key` to the list as the newest free entry.
    pub fn release(&mut self, key: RenderKey, last_owner: ItemId) {
        self.queue.push_back(FreeKey { key, last_owner });
    }

    /// Takes back the key last owned by `owner`, if it is still free.
    pub fn reclaim(&mut self, owner: ItemId) -> Option<RenderKey> {
        let position = self
            .queue
            .iter()
            .position(|free| free.last_owner == owner)?;
        self.queue.remove(position).map(|free| free.key)
    }

    /// Takes the key that has been free the longest.
    pub fn pop_oldest(&mut self) -> Option<FreeKey> {
        self.queue.pop_front()
    }

    /// Drops the oldest entries until at most `max` remain and returns them.
    pub fn trim_to(&mut self, max: usize) -> Vec<FreeKey> {
        let excess = self.queue.len().saturating_sub(max);
        self.queue.drain(..excess).collect()
    }

    /// Number of free keys.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when no key is free.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Free keys, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FreeKey> {
        self.queue.iter()
    }
}

/// Everything the pool remembers between two reconciliations.
///
/// Owned by exactly one grid. Thread it through successive [`reconcile`]
/// calls; it is never shared between grids.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolState {
    inventory: SlotMap<RenderKey, MediaKind>,
    owned: Vec<KeyAssignment>,
    free: [FreeList; MediaKind::COUNT],
}

impl PoolState {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys owned by live items, in the order of the last reconciliation.
    pub fn owned(&self) -> &[KeyAssignment] {
        &self.owned
    }

    /// Key currently owned by `item_id`.
    pub fn key_of(&self, item_id: ItemId) -> Option<RenderKey> {
        self.owned
            .iter()
            .find(|assignment| assignment.item_id == item_id)
            .map(|assignment| assignment.key)
    }

    /// Free keys of `kind`.
    pub fn free_list(&self, kind: MediaKind) -> &FreeList {
        &self.free[kind.index()]
    }

    /// Number of keys of `kind` ever minted and not retired.
    pub fn key_count(&self, kind: MediaKind) -> usize {
        self.inventory.values().filter(|&&owner| owner == kind).count()
    }

    /// Number of keys across all kinds.
    pub fn total_keys(&self) -> usize {
        self.inventory.len()
    }

    /// Media kind a key was minted for.
    pub fn kind_of(&self, key: RenderKey) -> Option<MediaKind> {
        self.inventory.get(key).copied()
    }

    /// Checks the pool bookkeeping.
    ///
    /// Every inventory key is either owned by exactly one item or free in the
    /// list of its own kind, never both, and no item owns two keys.
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::default();
        let mut owners = HashSet::default();
        for assignment in &self.owned {
            if !seen.insert(assignment.key)
                || !owners.insert(assignment.item_id)
                || self.kind_of(assignment.key) != Some(assignment.kind)
            {
                return false;
            }
        }
        for kind in MediaKind::ALL {
            for free in self.free_list(kind).iter() {
                if !seen.insert(free.key) || self.kind_of(free.key) != Some(kind) {
                    return false;
                }
            }
        }
        seen.len() == self.inventory.len()
    }
}

/// Counters describing one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    /// Live items that kept the key they already owned.
    pub kept: usize,
    /// Re-entering items that got their own former key back.
    pub reclaimed: usize,
    /// Items that took another item's free key.
    pub reused: usize,
    /// Keys created because no free key of the right kind existed.
    pub minted: usize,
    /// Keys released by items that left the live set.
    pub released: usize,
    /// Free keys dropped by the free cap.
    pub retired: usize,
}

/// Output of [`reconcile`].
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// One assignment per live item, in live order.
    pub assignments: Vec<KeyAssignment>,
    /// Pool state to pass to the next reconciliation.
    pub state: PoolState,
    /// What happened to the keys.
    pub stats: PoolStats,
}

/// Assigns a render key to every item in `live`.
///
/// `live` must not contain the same id twice. `max_free_per_kind` caps the
/// free list of every kind after the assignment; `None` keeps all keys.
#[tracing::instrument(level = "debug", skip_all, fields(live = live.len()))]
pub fn reconcile(
    live: &[LiveItem],
    previous: PoolState,
    max_free_per_kind: Option<usize>,
) -> Reconciliation {
    let mut state = previous;
    let mut stats = PoolStats::default();

    let live_kinds: HashMap<ItemId, MediaKind> = live
        .iter()
        .map(|item| (item.item_id, item.kind))
        .collect();
    debug_assert_eq!(live_kinds.len(), live.len(), "duplicate item in live set");

    // Split the previous owners into those still live and those now free.
    let mut kept: HashMap<ItemId, RenderKey> = HashMap::default();
    for assignment in std::mem::take(&mut state.owned) {
        match live_kinds.get(&assignment.item_id) {
            Some(&kind) if kind == assignment.kind => {
                kept.insert(assignment.item_id, assignment.key);
            }
            _ => {
                state.free[assignment.kind.index()].release(assignment.key, assignment.item_id);
                stats.released += 1;
            }
        }
    }

    let mut keys: Vec<Option<RenderKey>> = live
        .iter()
        .map(|item| kept.get(&item.item_id).copied())
        .collect();
    stats.kept = kept.len();

    // Own former keys first, so an earlier item cannot pop a key its former
    // owner is about to reclaim.
    for (slot, item) in keys.iter_mut().zip(live) {
        if slot.is_none() {
            *slot = state.free[item.kind.index()].reclaim(item.item_id);
            if slot.is_some() {
                stats.reclaimed += 1;
            }
        }
    }

    for (slot, item) in keys.iter_mut().zip(live) {
        if slot.is_some() {
            continue;
        }
        let key = match state.free[item.kind.index()].pop_oldest() {
            Some(free) => {
                stats.reused += 1;
                free.key
            }
            None => {
                stats.minted += 1;
                state.inventory.insert(item.kind)
            }
        };
        *slot = Some(key);
    }

    let assignments: Vec<KeyAssignment> = live
        .iter()
        .zip(keys)
        .filter_map(|(item, key)| {
            key.map(|key| KeyAssignment {
                item_id: item.item_id,
                kind: item.kind,
                key,
            })
        })
        .collect();
    state.owned = assignments.clone();

    if let Some(max) = max_free_per_kind {
        for kind in MediaKind::ALL {
            for retired in state.free[kind.index()].trim_to(max) {
                state.inventory.remove(retired.key);
                stats.retired += 1;
            }
        }
    }

    debug!(
        kept = stats.kept,
        reclaimed = stats.reclaimed,
        reused = stats.reused,
        minted = stats.minted,
        released = stats.released,
        retired = stats.retired,
        inventory = state.inventory.len(),
        "Reconciled render keys"
    );
    debug_assert!(state.is_consistent());

    Reconciliation {
        assignments,
        state,
        stats,
    }
}
