use corestack_model::AttributeValue;
use corestack_store::Record;

/// A fetch filter evaluated against a record's attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The attribute exists and equals the value.
    Eq {
        attribute: String,
        value: AttributeValue,
    },
    /// All sub-predicates match.
    All(Vec<Predicate>),
}

impl Predicate {
    /// Shorthand for an attribute-equality predicate.
    #[must_use]
    pub fn eq(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::Eq {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Shorthand for a conjunction.
    #[must_use]
    pub fn all(predicates: Vec<Predicate>) -> Self {
        Self::All(predicates)
    }

    /// Evaluates the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq { attribute, value } => record.get(attribute) == Some(value),
            Self::All(predicates) => predicates.iter().all(|p| p.matches(record)),
        }
    }
}
