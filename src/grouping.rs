use std::collections::HashMap;

/// Buckets keyed by dimension label, kept in the order each key was first seen.
#[derive(Debug, Clone)]
pub struct OrderedGroups<A> {
    index: HashMap<String, usize>,
    entries: Vec<(String, A)>,
}

impl<A> Default for OrderedGroups<A> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<A> OrderedGroups<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&A> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &A)> {
        self.entries.iter().map(|(key, acc)| (key.as_str(), acc))
    }

    /// Returns the bucket for `key`, creating it with `init` at the end of
    /// the order if it does not exist yet.
    pub fn entry_or_insert_with(&mut self, key: String, init: impl FnOnce() -> A) -> &mut A {
        let slot = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(key.clone(), i);
                self.entries.push((key, init()));
                i
            }
        };

        &mut self.entries[slot].1
    }

    pub fn into_entries(self) -> Vec<(String, A)> {
        self.entries
    }
}

/// Partitions `records` by `key_fn` and folds each record into its bucket.
///
/// Every record lands in exactly one bucket. `key_fn` owns the fallback label
/// policy for records missing the grouping field; the grouper never drops or
/// renames anything.
pub fn group_by<R, A>(
    records: &[R],
    key_fn: impl Fn(&R) -> String,
    init: impl Fn() -> A,
    mut fold: impl FnMut(&mut A, &R),
) -> OrderedGroups<A> {
    let mut groups = OrderedGroups::new();

    for record in records {
        let acc = groups.entry_or_insert_with(key_fn(record), &init);
        fold(acc, record);
    }

    groups
}
