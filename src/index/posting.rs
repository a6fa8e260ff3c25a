use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use crate::core::types::DocId;

/// Sorted, duplicate-free set of document ids for one field-value pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    ids: Vec<DocId>,  // Sorted by DocId ordering
}

impl PostingList {
    pub fn new() -> Self {
        PostingList { ids: Vec::new() }
    }

    pub fn from_unsorted(mut ids: Vec<DocId>) -> Self {
        ids.sort();
        ids.dedup();
        PostingList { ids }
    }

    /// Returns false when the id was already present.
    pub fn insert(&mut self, id: DocId) -> bool {
        match self.ids.binary_search(&id) {
            Ok(_) => false,
            Err(pos) => {
                self.ids.insert(pos, id);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &DocId) -> bool {
        match self.ids.binary_search(id) {
            Ok(pos) => {
                self.ids.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.ids.binary_search(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.ids
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocId> {
        self.ids.iter()
    }
}

impl<'a> IntoIterator for &'a PostingList {
    type Item = &'a DocId;
    type IntoIter = std::slice::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Look-ahead window used to skip runs that cannot intersect.
const GALLOP_THRESHOLD: usize = 8;

/// Intersection of two sorted id slices.
pub fn intersect_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(a.len().min(b.len()));
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        // Skip a whole window when its last element is still behind the other side
        if i + GALLOP_THRESHOLD <= a.len() && a[i + GALLOP_THRESHOLD - 1] < b[j] {
            i += GALLOP_THRESHOLD;
            continue;
        }
        if j + GALLOP_THRESHOLD <= b.len() && b[j + GALLOP_THRESHOLD - 1] < a[i] {
            j += GALLOP_THRESHOLD;
            continue;
        }

        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                result.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }

    result
}

/// Union of two sorted id slices; shared ids appear once.
pub fn union_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut result = Vec::with_capacity(a.len() + b.len());
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                result.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                result.push(b[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                result.push(a[i].clone());
                i += 1;
                j += 1;
            }
        }
    }

    result.extend_from_slice(&a[i..]);
    result.extend_from_slice(&b[j..]);
    result
}

/// Ids of `a` that are not in `b`.
pub fn difference_sorted(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    if b.is_empty() {
        return a.to_vec();
    }

    let mut result = Vec::with_capacity(a.len());
    let mut i = 0;
    let mut j = 0;

    while i < a.len() {
        if j >= b.len() {
            result.extend_from_slice(&a[i..]);
            break;
        }
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                result.push(a[i].clone());
                i += 1;
            }
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[u64]) -> PostingList {
        PostingList::from_unsorted(ids.iter().map(|&id| DocId::from(id)).collect())
    }

    fn raw(list: &PostingList) -> Vec<String> {
        strings(list.as_slice())
    }

    fn strings(ids: &[DocId]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn from_unsorted_sorts_and_dedups() {
        let l = list(&[5, 1, 5, 3, 10]);
        assert_eq!(raw(&l), vec!["1", "3", "5", "10"]);
    }

    #[test]
    fn insert_and_remove_keep_order() {
        let mut l = list(&[2, 8]);
        assert!(l.insert(DocId::from(4u64)));
        assert!(!l.insert(DocId::from(4u64)));
        assert_eq!(raw(&l), vec!["2", "4", "8"]);
        assert!(l.remove(&DocId::from(2u64)));
        assert!(!l.remove(&DocId::from(2u64)));
        assert_eq!(raw(&l), vec!["4", "8"]);
    }

    #[test]
    fn set_operations() {
        let a = list(&[1, 3, 5, 7, 9]);
        let b = list(&[3, 4, 5, 10]);
        let (a, b) = (a.as_slice(), b.as_slice());
        assert_eq!(strings(&intersect_sorted(a, b)), vec!["3", "5"]);
        assert_eq!(strings(&union_sorted(a, b)), vec!["1", "3", "4", "5", "7", "9", "10"]);
        assert_eq!(strings(&difference_sorted(a, b)), vec!["1", "7", "9"]);
        assert_eq!(strings(&difference_sorted(b, a)), vec!["4", "10"]);
    }

    #[test]
    fn intersection_skips_long_runs() {
        let a = list(&(0..100).collect::<Vec<_>>());
        let b = list(&[3, 50, 97, 150]);
        let (a, b) = (a.as_slice(), b.as_slice());
        assert_eq!(strings(&intersect_sorted(a, b)), vec!["3", "50", "97"]);
        assert_eq!(strings(&intersect_sorted(b, a)), vec!["3", "50", "97"]);
    }

    #[test]
    fn empty_operands() {
        let a = list(&[1, 2]);
        let (a, empty) = (a.as_slice(), &[][..]);
        assert!(intersect_sorted(a, empty).is_empty());
        assert_eq!(union_sorted(a, empty), a);
        assert_eq!(difference_sorted(a, empty), a);
        assert!(difference_sorted(empty, a).is_empty());
    }
}
