use std::sync::Arc;
use serde_json::{Map, Value};
use crate::analysis::analyzer::Analyzer;
use crate::core::error::{Error, Result};
use crate::core::types::ValueRange;
use crate::query::ast::{
    BucketFilterQuery, BucketSource, BucketSpec, DictionaryQuery, DistinctQuery, NotQuery, Query,
    SearchQuery, SearchTerm, TermQuery,
};

/// Upper bound used when a range omits `lte`.
const RANGE_MAX: &str = "\u{10FFFF}";

/// Converts JSON query trees into the `Query` AST.
///
/// Accepted shapes:
/// - `"make:volvo"` or `{"field": "make", "value": "volvo"}` -> literal
/// - `{"GET": term}`, `{"AND": [..]}`, `{"OR": [..]}`
/// - `{"NOT": {"INCLUDE": q, "EXCLUDE": q}}`
/// - `{"BUCKET": {"field": f, "value": v}}`
/// - `{"BUCKETFILTER": {"BUCKETS": [..] | q, "FILTER": q}}`
/// - `{"DICTIONARY": {"fields": [..]}}`, `{"DISTINCT": {"field": f}}`
/// - `{"SEARCH": [terms]}`
///
/// Values may be strings, numbers, booleans or `{"gte": .., "lte": ..}`.
#[derive(Clone)]
pub struct QueryParser {
    analyzer: Arc<Analyzer>,
}

impl QueryParser {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        QueryParser { analyzer }
    }

    pub fn parse(&self, value: &Value) -> Result<Query> {
        match value {
            Value::String(shorthand) => Ok(Query::Literal(self.parse_shorthand(shorthand)?)),
            Value::Object(map) => self.parse_object(map),
            other => Err(Error::malformed(format!("cannot interpret {} as a query", other))),
        }
    }

    fn parse_object(&self, map: &Map<String, Value>) -> Result<Query> {
        if map.contains_key("field") || map.contains_key("value") {
            return Ok(Query::Literal(self.parse_term_object(map)?));
        }

        let mut entries = map.iter();
        let (op, operand) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(Error::malformed("empty query object")),
            (Some(_), Some(_)) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                return Err(Error::malformed(format!(
                    "query object must hold exactly one operator, found {:?}", keys
                )));
            }
        };

        match op.as_str() {
            "AND" => Ok(Query::And(self.parse_children(op, operand)?)),
            "OR" => Ok(Query::Or(self.parse_children(op, operand)?)),
            "NOT" => self.parse_not(operand),
            "GET" => Ok(Query::Get(self.parse_term(operand)?)),
            "BUCKET" => Ok(Query::Bucket(self.parse_bucket_spec(operand)?)),
            "BUCKETFILTER" => self.parse_bucket_filter(operand),
            "DICTIONARY" => self.parse_dictionary(operand),
            "DISTINCT" => self.parse_distinct(operand),
            "SEARCH" => self.parse_search(operand),
            unknown => Err(Error::malformed(format!("unknown query operator '{}'", unknown))),
        }
    }

    fn parse_children(&self, op: &str, operand: &Value) -> Result<Vec<Query>> {
        let Value::Array(items) = operand else {
            return Err(Error::malformed(format!("{} expects an array of clauses", op)));
        };
        items.iter().map(|item| self.parse(item)).collect()
    }

    fn parse_not(&self, operand: &Value) -> Result<Query> {
        let Value::Object(map) = operand else {
            return Err(Error::malformed("NOT expects an object with INCLUDE and EXCLUDE"));
        };
        let include = map.get("INCLUDE")
            .ok_or_else(|| Error::malformed("NOT is missing INCLUDE"))?;
        let exclude = map.get("EXCLUDE")
            .ok_or_else(|| Error::malformed("NOT is missing EXCLUDE"))?;

        Ok(Query::Not(NotQuery {
            include: Box::new(self.parse(include)?),
            exclude: Box::new(self.parse(exclude)?),
        }))
    }

    fn parse_bucket_filter(&self, operand: &Value) -> Result<Query> {
        let Value::Object(map) = operand else {
            return Err(Error::malformed("BUCKETFILTER expects an object with BUCKETS and FILTER"));
        };
        let buckets = map.get("BUCKETS")
            .ok_or_else(|| Error::malformed("BUCKETFILTER is missing BUCKETS"))?;
        let filter = map.get("FILTER")
            .ok_or_else(|| Error::malformed("BUCKETFILTER is missing FILTER"))?;

        let buckets = match buckets {
            Value::Array(specs) => BucketSource::Literal(
                specs.iter().map(|spec| self.parse_bucket_spec(spec)).collect::<Result<_>>()?,
            ),
            nested => BucketSource::Query(Box::new(self.parse(nested)?)),
        };

        Ok(Query::BucketFilter(BucketFilterQuery {
            buckets,
            filter: Box::new(self.parse(filter)?),
        }))
    }

    fn parse_dictionary(&self, operand: &Value) -> Result<Query> {
        let fields = match operand {
            Value::Null => Vec::new(),
            Value::String(field) => vec![field.trim().to_string()],
            Value::Array(_) => self.parse_field_list(operand)?,
            Value::Object(map) => match map.get("fields").or_else(|| map.get("FIELDS")) {
                Some(list) => self.parse_field_list(list)?,
                None => Vec::new(),
            },
            other => return Err(Error::malformed(format!("DICTIONARY cannot take {}", other))),
        };
        Ok(Query::Dictionary(DictionaryQuery { fields }))
    }

    fn parse_field_list(&self, value: &Value) -> Result<Vec<String>> {
        match value {
            Value::String(field) => Ok(vec![field.trim().to_string()]),
            Value::Array(items) => items.iter()
                .map(|item| match item {
                    Value::String(field) => Ok(field.trim().to_string()),
                    other => Err(Error::malformed(format!("field names must be strings, got {}", other))),
                })
                .collect(),
            other => Err(Error::malformed(format!("expected a field list, got {}", other))),
        }
    }

    fn parse_distinct(&self, operand: &Value) -> Result<Query> {
        let field = match operand {
            Value::String(field) => field,
            Value::Object(map) => match map.get("field").or_else(|| map.get("FIELD")) {
                Some(Value::String(field)) => field,
                _ => return Err(Error::malformed("DISTINCT requires a string field")),
            },
            other => return Err(Error::malformed(format!("DISTINCT cannot take {}", other))),
        };
        Ok(Query::Distinct(DistinctQuery { field: non_empty_field(field)? }))
    }

    fn parse_search(&self, operand: &Value) -> Result<Query> {
        let items: Vec<&Value> = match operand {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };

        let mut terms = Vec::new();
        for item in items {
            let (field, text) = match item {
                Value::String(text) => match text.split_once(':') {
                    Some((field, value)) => (Some(non_empty_field(field)?), value.to_string()),
                    None => (None, text.clone()),
                },
                Value::Object(map) => self.parse_search_object(map)?,
                Value::Number(_) | Value::Bool(_) => (None, item.to_string()),
                other => return Err(Error::malformed(format!("cannot use {} as a search term", other))),
            };
            let tokens = self.analyzer.terms(&text);
            if tokens.is_empty() {
                return Err(Error::malformed(format!("search term '{}' has no tokens", text)));
            }
            terms.extend(tokens.into_iter().map(|value| SearchTerm { field: field.clone(), value }));
        }
        Ok(Query::Search(SearchQuery { terms }))
    }

    /// `{field?, value}` inside SEARCH; the value is tokenized like free text.
    fn parse_search_object(&self, map: &Map<String, Value>) -> Result<(Option<String>, String)> {
        let field = match map.get("field").or_else(|| map.get("FIELD")) {
            Some(Value::String(field)) => Some(non_empty_field(field)?),
            Some(Value::Null) | None => None,
            Some(other) => return Err(Error::malformed(format!("field must be a string, got {}", other))),
        };
        match map.get("value").or_else(|| map.get("VALUE")) {
            Some(Value::Object(_)) => Err(Error::malformed("SEARCH terms cannot be ranges")),
            Some(value) => Ok((field, scalar_text(value)?)),
            None => Err(Error::malformed("term is missing a value")),
        }
    }

    fn parse_term(&self, operand: &Value) -> Result<TermQuery> {
        match operand {
            Value::String(shorthand) => self.parse_shorthand(shorthand),
            Value::Object(map) => self.parse_term_object(map),
            other => Err(Error::malformed(format!("cannot interpret {} as a field:value term", other))),
        }
    }

    fn parse_bucket_spec(&self, operand: &Value) -> Result<BucketSpec> {
        let term = self.parse_term(operand)?;
        let field = term.field
            .ok_or_else(|| Error::malformed("buckets need a field"))?;
        Ok(BucketSpec { field, range: term.range })
    }

    /// `"field:value"`; without a colon the value applies to every field.
    fn parse_shorthand(&self, shorthand: &str) -> Result<TermQuery> {
        match shorthand.split_once(':') {
            Some((field, value)) => Ok(TermQuery {
                field: Some(non_empty_field(field)?),
                range: ValueRange::exact(self.normalize(value)?),
            }),
            None => Ok(TermQuery {
                field: None,
                range: ValueRange::exact(self.normalize(shorthand)?),
            }),
        }
    }

    fn parse_term_object(&self, map: &Map<String, Value>) -> Result<TermQuery> {
        let field = match map.get("field").or_else(|| map.get("FIELD")) {
            Some(Value::String(field)) => Some(non_empty_field(field)?),
            Some(Value::Null) | None => None,
            Some(other) => return Err(Error::malformed(format!("field must be a string, got {}", other))),
        };
        let value = map.get("value").or_else(|| map.get("VALUE"))
            .ok_or_else(|| Error::malformed("term is missing a value"))?;

        Ok(TermQuery { field, range: self.parse_range(value)? })
    }

    fn parse_range(&self, value: &Value) -> Result<ValueRange> {
        match value {
            Value::Object(bounds) => {
                let low = match bounds.get("gte").or_else(|| bounds.get("GTE")) {
                    Some(bound) => self.normalize(&scalar_text(bound)?)?,
                    None => String::new(),
                };
                let high = match bounds.get("lte").or_else(|| bounds.get("LTE")) {
                    Some(bound) => self.normalize(&scalar_text(bound)?)?,
                    None => RANGE_MAX.to_string(),
                };
                Ok(ValueRange::between(low, high))
            }
            scalar => Ok(ValueRange::exact(self.normalize(&scalar_text(scalar)?)?)),
        }
    }

    fn normalize(&self, value: &str) -> Result<String> {
        self.analyzer.normalize(value)
            .ok_or_else(|| Error::malformed(format!("value '{}' is empty after normalization", value)))
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        QueryParser::new(Arc::new(Analyzer::standard()))
    }
}

fn non_empty_field(field: &str) -> Result<String> {
    let field = field.trim();
    if field.is_empty() {
        return Err(Error::malformed("field name is empty"));
    }
    Ok(field.to_string())
}

fn scalar_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::malformed(format!("expected a scalar value, got {}", other))),
    }
}
