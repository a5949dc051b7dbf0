use serde::{Deserialize, Serialize};

use crate::document::DocId;

/// Strictly ascending, duplicate-free list of document ids.
///
/// Every constructor and mutator keeps the ordering invariant, so the merge
/// operations can rely on it without re-checking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<DocId>", into = "Vec<DocId>")]
pub struct PostingList(Vec<DocId>);

impl PostingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates that `ids` is strictly ascending.
    pub fn from_sorted(ids: Vec<DocId>) -> Result<Self, String> {
        if let Some(w) = ids.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!("postings not strictly ascending: {} followed by {}", w[0], w[1]));
        }
        Ok(Self(ids))
    }

    /// Inserts `id`, keeping order. Returns false if it was already present.
    ///
    /// Appending a larger id is O(1); anything else falls back to a binary
    /// search insert.
    pub fn insert(&mut self, id: DocId) -> bool {
        match self.0.last() {
            None => {
                self.0.push(id);
                true
            }
            Some(&last) if id > last => {
                self.0.push(id);
                true
            }
            Some(_) => match self.0.binary_search(&id) {
                Ok(_) => false,
                Err(pos) => {
                    self.0.insert(pos, id);
                    true
                }
            },
        }
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn last(&self) -> Option<DocId> {
        self.0.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        self.0.iter().copied()
    }

    /// Two-pointer intersection.
    pub fn intersect(&self, other: &PostingList) -> PostingList {
        let (a, b) = (&self.0, &other.0);
        if a.is_empty() || b.is_empty() {
            return PostingList::new();
        }
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        PostingList(out)
    }

    /// Two-pointer union; ties are emitted once.
    pub fn union(&self, other: &PostingList) -> PostingList {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        PostingList(out)
    }

    /// Every id in `0..universe` that is not in this list.
    pub fn complement(&self, universe: usize) -> PostingList {
        let mut out = Vec::with_capacity(universe.saturating_sub(self.len()));
        let mut excluded = self.0.iter().copied().peekable();
        for id in (0..universe).map(|i| i as DocId) {
            while excluded.next_if(|&e| e < id).is_some() {}
            if excluded.next_if_eq(&id).is_none() {
                out.push(id);
            }
        }
        PostingList(out)
    }
}

impl TryFrom<Vec<DocId>> for PostingList {
    type Error = String;

    fn try_from(ids: Vec<DocId>) -> Result<Self, Self::Error> {
        PostingList::from_sorted(ids)
    }
}

impl From<PostingList> for Vec<DocId> {
    fn from(list: PostingList) -> Self {
        list.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn list(ids: &[DocId]) -> PostingList {
        PostingList::from_sorted(ids.to_vec()).unwrap()
    }

    #[test]
    fn insert_keeps_order_and_dedups() {
        let mut p = PostingList::new();
        assert!(p.insert(3));
        assert!(p.insert(5));
        assert!(!p.insert(5));
        assert!(p.insert(1));
        assert!(!p.insert(3));
        assert_eq!(p.as_slice(), &[1, 3, 5]);
    }

    #[test]
    fn from_sorted_rejects_duplicates_and_disorder() {
        assert!(PostingList::from_sorted(vec![1, 1]).is_err());
        assert!(PostingList::from_sorted(vec![2, 1]).is_err());
        assert!(PostingList::from_sorted(vec![]).is_ok());
    }

    #[test]
    fn merge_edge_cases() {
        let empty = PostingList::new();
        let a = list(&[0, 2, 4]);
        assert!(a.intersect(&empty).is_empty());
        assert_eq!(empty.union(&a), a);
        assert_eq!(a.union(&empty), a);
        assert_eq!(a.union(&list(&[1, 2, 9])).as_slice(), &[0, 1, 2, 4, 9]);
        assert_eq!(a.intersect(&list(&[2, 3, 4])).as_slice(), &[2, 4]);
    }

    #[test]
    fn complement_of_empty_is_universe() {
        assert_eq!(PostingList::new().complement(3).as_slice(), &[0, 1, 2]);
        assert!(list(&[0, 1, 2]).complement(3).is_empty());
        assert!(PostingList::new().complement(0).is_empty());
    }

    #[test]
    fn deserializing_unsorted_ids_fails() {
        let bytes = bincode::serialize(&vec![3u32, 1]).unwrap();
        assert!(bincode::deserialize::<PostingList>(&bytes).is_err());
    }

    fn sorted_set() -> impl Strategy<Value = BTreeSet<DocId>> {
        proptest::collection::btree_set(0u32..64, 0..40)
    }

    fn from_set(s: &BTreeSet<DocId>) -> PostingList {
        list(&s.iter().copied().collect::<Vec<_>>())
    }

    proptest! {
        #[test]
        fn intersect_is_set_intersection(a in sorted_set(), b in sorted_set()) {
            let got = from_set(&a).intersect(&from_set(&b));
            let want: Vec<DocId> = a.intersection(&b).copied().collect();
            prop_assert_eq!(got.as_slice(), want.as_slice());
        }

        #[test]
        fn union_is_set_union(a in sorted_set(), b in sorted_set()) {
            let got = from_set(&a).union(&from_set(&b));
            let want: Vec<DocId> = a.union(&b).copied().collect();
            prop_assert_eq!(got.as_slice(), want.as_slice());
        }

        #[test]
        fn complement_is_universe_minus_list(a in sorted_set()) {
            let universe = 64usize;
            let got = from_set(&a).complement(universe);
            let want: Vec<DocId> = (0..universe as DocId).filter(|id| !a.contains(id)).collect();
            prop_assert_eq!(got.as_slice(), want.as_slice());
        }

        #[test]
        fn merges_are_idempotent(a in sorted_set()) {
            let p = from_set(&a);
            prop_assert_eq!(p.union(&p), p.clone());
            prop_assert_eq!(p.intersect(&p), p.clone());
            prop_assert_eq!(p.complement(64).complement(64), p);
        }
    }
}
