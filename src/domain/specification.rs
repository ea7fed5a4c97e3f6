//! Composable record filters.
//!
//! A [`Specification`] is an immutable AND-chain of [`Predicate`]s. It is
//! checked against a [`Record`] type's schema when compiled into a
//! [`Filter`], which can then be evaluated in memory or rendered as a query
//! fragment for a store that evaluates it itself.

use crate::error::{BankError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Id,
    Integer,
    Decimal,
    Bool,
    Timestamp,
    Date,
}

impl ValueKind {
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Decimal | Self::Timestamp | Self::Date
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Id => "id",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
            Self::Date => "date",
        };
        f.write_str(name)
    }
}

/// A field value as seen by predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    /// Reference to another record, compared by id.
    Id(u64),
    Integer(i64),
    Decimal(Decimal),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Id(_) => ValueKind::Id,
            Self::Integer(_) => ValueKind::Integer,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Bool(_) => ValueKind::Bool,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Date(_) => ValueKind::Date,
        }
    }

    /// Ordering between values of the same orderable kind.
    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Id(id) => write!(f, "{id}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Timestamp(ts) => write!(f, "'{}'", ts.to_rfc3339()),
            Self::Date(d) => write!(f, "'{d}'"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    /// Matches when the attribute is absent. The predicate's value is ignored.
    EqualNull,
}

/// A single `attribute <operator> value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub attribute: String,
    pub operator: Operator,
    pub value: Option<Value>,
}

impl Predicate {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: Option<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value,
        }
    }

    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::Equal, Some(value.into()))
    }

    pub fn not_equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::NotEqual, Some(value.into()))
    }

    pub fn less_than(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::LessThan, Some(value.into()))
    }

    pub fn is_null(attribute: impl Into<String>) -> Self {
        Self::new(attribute, Operator::EqualNull, None)
    }

    /// Evaluates the predicate against an already extracted field value.
    pub fn test(&self, field: Option<&Value>) -> bool {
        match self.operator {
            Operator::Equal => field == self.value.as_ref(),
            Operator::NotEqual => field != self.value.as_ref(),
            Operator::LessThan => match (field, &self.value) {
                (Some(actual), Some(bound)) => actual.compare(bound) == Some(Ordering::Less),
                _ => false,
            },
            Operator::EqualNull => field.is_none(),
        }
    }

    fn render(&self) -> String {
        let value = |v: &Option<Value>| match v {
            Some(v) => v.to_string(),
            None => "NULL".to_string(),
        };
        match self.operator {
            Operator::Equal if self.value.is_none() => format!("{} IS NULL", self.attribute),
            Operator::NotEqual if self.value.is_none() => {
                format!("{} IS NOT NULL", self.attribute)
            }
            Operator::Equal => format!("{} = {}", self.attribute, value(&self.value)),
            // An absent field is not equal to any value, as in `test`.
            Operator::NotEqual => format!(
                "({attr} <> {} OR {attr} IS NULL)",
                value(&self.value),
                attr = self.attribute
            ),
            Operator::LessThan => format!("{} < {}", self.attribute, value(&self.value)),
            Operator::EqualNull => format!("{} IS NULL", self.attribute),
        }
    }
}

/// A named, typed field exposed by a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: ValueKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind }
    }
}

/// A persisted entity that specifications can be compiled against.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection the records are stored in.
    const COLLECTION: &'static str;

    /// Id of the record, `0` until a store assigns one.
    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    fn schema() -> &'static [Field];

    /// Current value of `attribute`, `None` when the field is null.
    fn value_of(&self, attribute: &str) -> Option<Value>;
}

struct Link {
    predicate: Predicate,
    prev: Option<Arc<Link>>,
}

impl Drop for Link {
    // Unlinks iteratively so dropping a long chain does not recurse.
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(link) = prev {
            prev = match Arc::try_unwrap(link) {
                Ok(mut link) => link.prev.take(),
                Err(_) => None,
            };
        }
    }
}

/// An immutable AND-chain of predicates.
///
/// [`Specification::add`] returns a new specification that shares every
/// predicate of its base, so callers can branch freely from a common base
/// (including from different threads) without affecting each other.
#[derive(Clone, Default)]
pub struct Specification {
    tail: Option<Arc<Link>>,
    len: usize,
}

impl Specification {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(&self, predicate: Predicate) -> Self {
        Self {
            tail: Some(Arc::new(Link {
                predicate,
                prev: self.tail.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Predicates in insertion order.
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut predicates = Vec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(link) = cursor {
            predicates.push(&link.predicate);
            cursor = link.prev.as_deref();
        }
        predicates.reverse();
        predicates
    }

    /// Validates every predicate against `R`'s schema.
    pub fn compile<R: Record>(&self) -> Result<Filter<R>> {
        let mut predicates = Vec::with_capacity(self.len);
        for predicate in self.predicates() {
            let field = R::schema()
                .iter()
                .find(|f| f.name == predicate.attribute)
                .ok_or_else(|| BankError::InvalidAttribute {
                    attribute: predicate.attribute.clone(),
                    record: R::COLLECTION,
                })?;

            if predicate.operator == Operator::EqualNull {
                // The comparison value plays no part in a null test.
                predicates.push(Predicate::is_null(field.name));
                continue;
            }

            if predicate.operator == Operator::LessThan && !field.kind.is_orderable() {
                return Err(BankError::UnorderableType {
                    attribute: predicate.attribute.clone(),
                    kind: field.kind,
                });
            }

            match &predicate.value {
                Some(value) if value.kind() != field.kind => {
                    return Err(BankError::ValueKindMismatch {
                        attribute: predicate.attribute.clone(),
                        expected: field.kind,
                        found: value.kind(),
                    });
                }
                None if predicate.operator == Operator::LessThan => {
                    return Err(BankError::UnorderableType {
                        attribute: predicate.attribute.clone(),
                        kind: field.kind,
                    });
                }
                _ => predicates.push(predicate.clone()),
            }
        }
        Ok(Filter {
            predicates,
            _record: PhantomData,
        })
    }
}

impl fmt::Debug for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.predicates()).finish()
    }
}

/// A specification validated against one record type.
pub struct Filter<R> {
    predicates: Vec<Predicate>,
    _record: PhantomData<fn(&R)>,
}

impl<R: Record> Filter<R> {
    pub fn matches(&self, record: &R) -> bool {
        self.predicates
            .iter()
            .all(|p| p.test(record.value_of(&p.attribute).as_ref()))
    }

    pub fn to_store_query(&self) -> StoreQuery {
        StoreQuery {
            collection: R::COLLECTION,
            clauses: self.predicates.iter().map(Predicate::render).collect(),
        }
    }
}

/// A `WHERE`-style rendering of a compiled filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub collection: &'static str,
    pub clauses: Vec<String>,
}

impl fmt::Display for StoreQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            write!(f, "{}: TRUE", self.collection)
        } else {
            write!(f, "{}: {}", self.collection, self.clauses.join(" AND "))
        }
    }
}
