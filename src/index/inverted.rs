use std::collections::BTreeMap;
use std::ops::Bound;
use serde::{Deserialize, Serialize};
use crate::core::types::{DocId, ValueRange};
use crate::index::posting::PostingList;

/// One (field, value) posting resolved by a lookup.
#[derive(Debug, Clone, Copy)]
pub struct PostingHit<'a> {
    pub field: &'a str,
    pub value: &'a str,
    pub postings: &'a PostingList,
}

/// Field -> normalized value -> posting list.
///
/// Both levels are ordered maps, so field and value enumeration come out
/// sorted without any extra work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    fields: BTreeMap<String, BTreeMap<String, PostingList>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            fields: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, field: &str, value: &str, doc_id: DocId) -> bool {
        self.fields
            .entry(field.to_string())
            .or_default()
            .entry(value.to_string())
            .or_default()
            .insert(doc_id)
    }

    /// Removes `doc_id` from one posting, pruning postings and fields left empty.
    pub fn remove(&mut self, field: &str, value: &str, doc_id: &DocId) -> bool {
        let Some(values) = self.fields.get_mut(field) else {
            return false;
        };
        let Some(postings) = values.get_mut(value) else {
            return false;
        };

        let removed = postings.remove(doc_id);
        if postings.is_empty() {
            values.remove(value);
        }
        if values.is_empty() {
            self.fields.remove(field);
        }
        removed
    }

    pub fn postings(&self, field: &str, value: &str) -> Option<&PostingList> {
        self.fields.get(field).and_then(|values| values.get(value))
    }

    /// Ids for a (field, value) pair; unknown pairs yield an empty slice.
    pub fn lookup(&self, field: &str, value: &str) -> &[DocId] {
        self.postings(field, value)
            .map(PostingList::as_slice)
            .unwrap_or(&[])
    }

    /// Every posting of `field` whose value lies inside `range`, in value order.
    pub fn lookup_range<'a>(&'a self, field: &str, range: &ValueRange) -> Vec<PostingHit<'a>> {
        let Some((field, values)) = self.fields.get_key_value(field) else {
            return Vec::new();
        };

        if range.is_exact() {
            return values.get_key_value(range.low.as_str())
                .map(|(value, postings)| PostingHit { field, value, postings })
                .into_iter()
                .collect();
        }
        if range.is_empty() {
            return Vec::new();
        }

        values
            .range::<str, _>((Bound::Included(range.low.as_str()), Bound::Included(range.high.as_str())))
            .map(|(value, postings)| PostingHit { field, value, postings })
            .collect()
    }

    /// Resolve a term against one field or, when `field` is `None`, against
    /// every field. Hits come out ordered by field name, then value.
    pub fn resolve<'a>(&'a self, field: Option<&str>, range: &ValueRange) -> Vec<PostingHit<'a>> {
        match field {
            Some(field) => self.lookup_range(field, range),
            None => self.fields
                .keys()
                .flat_map(|field| self.lookup_range(field, range))
                .collect(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Distinct values of a field in ascending order.
    pub fn values<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|values| values.keys().map(String::as_str))
    }

    /// Every (field, value) posting in field then value order.
    pub fn iter(&self) -> impl Iterator<Item = PostingHit<'_>> {
        self.fields.iter().flat_map(|(field, values)| {
            values.iter().map(move |(value, postings)| PostingHit { field, value, postings })
        })
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn posting_count(&self) -> usize {
        self.fields.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.insert("make", "volvo", DocId::from(8u64));
        index.insert("make", "volvo", DocId::from(4u64));
        index.insert("make", "bmw", DocId::from(1u64));
        index.insert("make", "tesla", DocId::from(0u64));
        index.insert("brand", "volvo", DocId::from(4u64));
        index
    }

    #[test]
    fn lookup_returns_sorted_ids() {
        let index = index();
        let ids: Vec<&str> = index.lookup("make", "volvo").iter().map(DocId::as_str).collect();
        assert_eq!(ids, vec!["4", "8"]);
        assert!(index.lookup("make", "saab").is_empty());
        assert!(index.lookup("color", "red").is_empty());
    }

    #[test]
    fn range_lookup_walks_values_in_order() {
        let index = index();
        let hits = index.lookup_range("make", &ValueRange::between("a", "tz"));
        let values: Vec<&str> = hits.iter().map(|h| h.value).collect();
        assert_eq!(values, vec!["bmw", "tesla"]);
        assert!(index.lookup_range("make", &ValueRange::between("z", "a")).is_empty());
    }

    #[test]
    fn fieldless_resolution_spans_fields_in_name_order() {
        let index = index();
        let hits = index.resolve(None, &ValueRange::exact("volvo"));
        let fields: Vec<&str> = hits.iter().map(|h| h.field).collect();
        assert_eq!(fields, vec!["brand", "make"]);
    }

    #[test]
    fn remove_prunes_empty_entries() {
        let mut index = index();
        assert!(index.remove("brand", "volvo", &DocId::from(4u64)));
        assert!(!index.has_field("brand"));
        assert!(!index.remove("brand", "volvo", &DocId::from(4u64)));
        assert_eq!(index.field_count(), 1);
        assert_eq!(index.posting_count(), 3);
    }

    #[test]
    fn values_are_sorted() {
        let index = index();
        let values: Vec<&str> = index.values("make").collect();
        assert_eq!(values, vec!["bmw", "tesla", "volvo"]);
        assert_eq!(index.values("missing").count(), 0);
    }
}
