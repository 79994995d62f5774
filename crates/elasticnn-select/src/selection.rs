/// The finalized output of a [`BestKSelector`](crate::BestKSelector).
///
/// Buckets are ordered best first; each holds the items that share its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<K, V> {
    buckets: Vec<(K, Vec<V>)>,
}

impl<K, V> Selection<K, V> {
    pub(crate) fn new(buckets: Vec<(K, Vec<V>)>) -> Self {
        Self { buckets }
    }

    /// Return the key buckets, best first.
    #[must_use]
    pub fn buckets(&self) -> &[(K, Vec<V>)] {
        &self.buckets
    }

    /// Return the total number of retained items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|(_, items)| items.len()).sum()
    }

    /// Return true if nothing was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterate over `(key, item)` pairs, best first.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flat_map(|(key, items)| items.iter().map(move |item| (key, item)))
    }

    /// Consume into the key buckets, best first.
    #[must_use]
    pub fn into_buckets(self) -> Vec<(K, Vec<V>)> {
        self.buckets
    }
}

impl<K: Clone, V> Selection<K, V> {
    /// Consume into flat `(key, item)` pairs, best first.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(K, V)> {
        self.buckets
            .into_iter()
            .flat_map(|(key, items)| items.into_iter().map(move |item| (key.clone(), item)))
            .collect()
    }
}
