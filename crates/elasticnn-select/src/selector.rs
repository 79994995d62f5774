//! The bounded, draw-aware selector.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::error::SelectError;
use crate::selection::Selection;

/// Which end of the key order is retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Retain {
    /// Keep the items with the smallest keys (nearest neighbours).
    #[default]
    Smallest,
    /// Keep the items with the largest keys.
    Largest,
}

/// How [`BestKSelector::finalize`] trims the worst draw group down to the limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscardPolicy {
    /// Remove uniformly random items (default).
    #[default]
    Random,
    /// Remove the earliest inserted items first.
    Oldest,
    /// Remove the most recently inserted items first.
    Newest,
}

/// Retains the `limit` best items seen via [`add`](Self::add).
///
/// Items are bucketed by key. While streaming, the worst bucket is evicted
/// whole as soon as the remaining buckets alone hold at least `limit` items,
/// so the selector may transiently hold more than `limit` items when the
/// worst bucket is a draw group straddling the boundary. [`finalize`](Self::finalize)
/// trims that bucket to reach exactly `limit`.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `retain`  | [`Retain::Smallest`] |
/// | `discard` | [`DiscardPolicy::Random`] |
#[derive(Debug, Clone)]
pub struct BestKSelector<K, V, R = ChaCha8Rng> {
    buckets: BTreeMap<K, Vec<V>>,
    len: usize,
    limit: usize,
    retain: Retain,
    discard: DiscardPolicy,
    rng: R,
}

impl<K: Ord, V> BestKSelector<K, V, ChaCha8Rng> {
    /// Create a selector with a [`ChaCha8Rng`] seeded from `seed`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::InvalidLimit`] | `limit` is zero |
    pub fn seeded(limit: usize, seed: u64) -> Result<Self, SelectError> {
        Self::new(limit, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<K: Ord, V, R: Rng> BestKSelector<K, V, R> {
    /// Create a selector retaining at most `limit` items, breaking ties with `rng`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SelectError::InvalidLimit`] | `limit` is zero |
    pub fn new(limit: usize, rng: R) -> Result<Self, SelectError> {
        if limit == 0 {
            return Err(SelectError::InvalidLimit { limit });
        }
        Ok(Self {
            buckets: BTreeMap::new(),
            len: 0,
            limit,
            retain: Retain::Smallest,
            discard: DiscardPolicy::Random,
            rng,
        })
    }

    /// Set which end of the key order is retained.
    #[must_use]
    pub fn with_retain(mut self, retain: Retain) -> Self {
        self.retain = retain;
        self
    }

    /// Set how the worst draw group is trimmed on finalization.
    #[must_use]
    pub fn with_discard(mut self, discard: DiscardPolicy) -> Self {
        self.discard = discard;
        self
    }

    /// Return the retention limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Return the number of items currently held, including draw overflow.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return true if no item is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return true once at least `limit` items are held.
    ///
    /// From then on [`worst_key`](Self::worst_key) is a sound pruning bound.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len >= self.limit
    }

    /// Return the worst retained key, if any.
    #[must_use]
    pub fn worst_key(&self) -> Option<&K> {
        match self.retain {
            Retain::Smallest => self.buckets.keys().next_back(),
            Retain::Largest => self.buckets.keys().next(),
        }
    }

    /// Return the best retained key, if any.
    #[must_use]
    pub fn best_key(&self) -> Option<&K> {
        match self.retain {
            Retain::Smallest => self.buckets.keys().next(),
            Retain::Largest => self.buckets.keys().next_back(),
        }
    }

    /// Return true if a bucket exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.buckets.contains_key(key)
    }

    /// Offer `item` under `key`. Returns whether the item is retained afterwards.
    ///
    /// Once full, a key strictly worse than the worst retained key is rejected
    /// without being stored. A key equal to it joins the draw group.
    pub fn add(&mut self, item: V, key: K) -> bool {
        if self.is_full()
            && let Some(worst) = self.worst_key()
            && self.is_worse(&key, worst)
        {
            return false;
        }

        // The new item's bucket is evicted exactly when the strictly better
        // buckets alone already reach the limit.
        let retained = self.count_better(&key) < self.limit;

        self.buckets.entry(key).or_default().push(item);
        self.len += 1;
        self.evict_surplus_buckets();
        retained
    }

    /// Drop everything held. The random source keeps its state.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// Trim the worst draw group to reach exactly `min(limit, len)` items and
    /// move the retained buckets out, best first.
    ///
    /// The selector is left empty and can be reused.
    pub fn finalize(&mut self) -> Selection<K, V> {
        if self.len > self.limit {
            let surplus = self.len - self.limit;
            let discard = self.discard;
            let worst = match self.retain {
                Retain::Smallest => self.buckets.iter_mut().next_back(),
                Retain::Largest => self.buckets.iter_mut().next(),
            };
            if let Some((_, bucket)) = worst {
                trace!(surplus, draw_size = bucket.len(), ?discard, "trimming worst draw group");
                for _ in 0..surplus {
                    match discard {
                        DiscardPolicy::Random => {
                            let idx = self.rng.gen_range(0..bucket.len());
                            bucket.remove(idx);
                        }
                        DiscardPolicy::Oldest => {
                            bucket.remove(0);
                        }
                        DiscardPolicy::Newest => {
                            bucket.pop();
                        }
                    }
                }
            }
            self.len = self.limit;
        }

        let buckets = std::mem::take(&mut self.buckets);
        self.len = 0;
        let ordered: Vec<(K, Vec<V>)> = match self.retain {
            Retain::Smallest => buckets.into_iter().collect(),
            Retain::Largest => buckets.into_iter().rev().collect(),
        };
        Selection::new(ordered)
    }

    /// Evict whole worst buckets while the rest still hold at least `limit` items.
    fn evict_surplus_buckets(&mut self) {
        loop {
            let worst_len = match self.retain {
                Retain::Smallest => self.buckets.values().next_back(),
                Retain::Largest => self.buckets.values().next(),
            }
            .map_or(0, Vec::len);
            if worst_len == 0 || self.len - worst_len < self.limit {
                break;
            }
            match self.retain {
                Retain::Smallest => self.buckets.pop_last(),
                Retain::Largest => self.buckets.pop_first(),
            };
            self.len -= worst_len;
            trace!(evicted = worst_len, remaining = self.len, "evicted worst draw group");
        }
    }

    /// Number of held items whose key is strictly better than `key`.
    fn count_better(&self, key: &K) -> usize {
        let better = match self.retain {
            Retain::Smallest => self.buckets.range(..key),
            Retain::Largest => self.buckets.range((Excluded(key), Unbounded)),
        };
        better.map(|(_, bucket)| bucket.len()).sum()
    }

    fn is_worse(&self, key: &K, than: &K) -> bool {
        match self.retain {
            Retain::Smallest => key > than,
            Retain::Largest => key < than,
        }
    }
}
