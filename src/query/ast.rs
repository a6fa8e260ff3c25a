use crate::core::types::ValueRange;

/// Main query enum: one variant per operator.
///
/// Values inside the tree are already normalized. Builders take them as
/// given; `QueryParser` is the boundary that normalizes raw JSON input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Literal(TermQuery),                 // "field:value" shorthand
    And(Vec<Query>),                    // Intersection, matches concatenated
    Or(Vec<Query>),                     // Union, matches concatenated
    Not(NotQuery),                      // Include minus exclude
    Get(TermQuery),                     // Explicit GET
    Bucket(BucketSpec),                 // One facet bucket
    BucketFilter(BucketFilterQuery),    // Buckets intersected with a filter
    Dictionary(DictionaryQuery),        // Sorted distinct values, no field
    Distinct(DistinctQuery),            // Sorted distinct values of one field
    Search(SearchQuery),                // Scored full-text match
}

/// Field-value lookup. `field: None` matches the value in every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TermQuery {
    pub field: Option<String>,
    pub range: ValueRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotQuery {
    pub include: Box<Query>,
    pub exclude: Box<Query>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketSpec {
    pub field: String,
    pub range: ValueRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketSource {
    Literal(Vec<BucketSpec>),   // Emitted in declaration order
    Query(Box<Query>),          // Must evaluate to buckets or field values
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketFilterQuery {
    pub buckets: BucketSource,
    pub filter: Box<Query>,
}

/// Empty `fields` means every indexed field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DictionaryQuery {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistinctQuery {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTerm {
    pub field: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub terms: Vec<SearchTerm>,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        TermQuery {
            field: Some(field.into()),
            range: ValueRange::exact(value),
        }
    }

    pub fn any_field(value: impl Into<String>) -> Self {
        TermQuery {
            field: None,
            range: ValueRange::exact(value),
        }
    }

    pub fn range(field: impl Into<String>, low: impl Into<String>, high: impl Into<String>) -> Self {
        TermQuery {
            field: Some(field.into()),
            range: ValueRange::between(low, high),
        }
    }
}

impl BucketSpec {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        BucketSpec {
            field: field.into(),
            range: ValueRange::exact(value),
        }
    }
}

impl SearchTerm {
    pub fn new(value: impl Into<String>) -> Self {
        SearchTerm { field: None, value: value.into() }
    }

    pub fn in_field(field: impl Into<String>, value: impl Into<String>) -> Self {
        SearchTerm { field: Some(field.into()), value: value.into() }
    }
}

impl Query {
    pub fn literal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Literal(TermQuery::new(field, value))
    }

    pub fn get(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Get(TermQuery::new(field, value))
    }

    pub fn and(children: Vec<Query>) -> Self {
        Query::And(children)
    }

    pub fn or(children: Vec<Query>) -> Self {
        Query::Or(children)
    }

    pub fn not(include: Query, exclude: Query) -> Self {
        Query::Not(NotQuery {
            include: Box::new(include),
            exclude: Box::new(exclude),
        })
    }

    pub fn bucket(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Bucket(BucketSpec::new(field, value))
    }

    pub fn bucket_filter(buckets: BucketSource, filter: Query) -> Self {
        Query::BucketFilter(BucketFilterQuery {
            buckets,
            filter: Box::new(filter),
        })
    }

    pub fn dictionary<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Query::Dictionary(DictionaryQuery {
            fields: fields.into_iter().map(Into::into).collect(),
        })
    }

    pub fn distinct(field: impl Into<String>) -> Self {
        Query::Distinct(DistinctQuery { field: field.into() })
    }

    pub fn search<S: Into<String>>(terms: impl IntoIterator<Item = S>) -> Self {
        Query::Search(SearchQuery {
            terms: terms.into_iter().map(SearchTerm::new).collect(),
        })
    }

    /// Operator name as it appears in JSON queries.
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Literal(_) => "LITERAL",
            Query::And(_) => "AND",
            Query::Or(_) => "OR",
            Query::Not(_) => "NOT",
            Query::Get(_) => "GET",
            Query::Bucket(_) => "BUCKET",
            Query::BucketFilter(_) => "BUCKETFILTER",
            Query::Dictionary(_) => "DICTIONARY",
            Query::Distinct(_) => "DISTINCT",
            Query::Search(_) => "SEARCH",
        }
    }

    /// Direct sub-queries, in evaluation order.
    pub fn children(&self) -> Vec<&Query> {
        match self {
            Query::And(children) | Query::Or(children) => children.iter().collect(),
            Query::Not(not) => vec![&*not.include, &*not.exclude],
            Query::BucketFilter(bf) => match &bf.buckets {
                BucketSource::Query(source) => vec![&**source, &*bf.filter],
                BucketSource::Literal(_) => vec![&*bf.filter],
            },
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_produce_exact_ranges() {
        let Query::Get(term) = Query::get("make", "volvo") else {
            panic!("expected GET");
        };
        assert_eq!(term.field.as_deref(), Some("make"));
        assert!(term.range.is_exact());
    }

    #[test]
    fn children_follow_evaluation_order() {
        let q = Query::bucket_filter(
            BucketSource::Query(Box::new(Query::distinct("make"))),
            Query::get("brand", "tesla"),
        );
        let kinds: Vec<&str> = q.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec!["DISTINCT", "GET"]);
        assert!(Query::distinct("make").children().is_empty());
    }
}
