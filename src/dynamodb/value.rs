use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_smithy_types::Blob;

use super::json::JsonConversionError;

/// A single item: attribute name to typed value.
pub type Record = HashMap<String, TypedValue>;

/// Every value shape an attribute can hold.
///
/// Numbers are kept as their decimal text so no precision is lost between the
/// backend and the editor. Set members keep the order they were read in; use
/// [`TypedValue::equivalent`] when order should not matter.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    S(String),
    N(String),
    Bool(bool),
    Null,
    L(Vec<TypedValue>),
    M(Record),
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Vec<u8>>),
    B(Vec<u8>),
}

impl TypedValue {
    /// The DynamoDB type descriptor of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::S(_) => "S",
            TypedValue::N(_) => "N",
            TypedValue::Bool(_) => "BOOL",
            TypedValue::Null => "NULL",
            TypedValue::L(_) => "L",
            TypedValue::M(_) => "M",
            TypedValue::Ss(_) => "SS",
            TypedValue::Ns(_) => "NS",
            TypedValue::Bs(_) => "BS",
            TypedValue::B(_) => "B",
        }
    }

    /// Structural equality that ignores set member order.
    pub fn equivalent(&self, other: &TypedValue) -> bool {
        match (self, other) {
            (TypedValue::L(left), TypedValue::L(right)) => {
                left.len() == right.len()
                    && left.iter().zip(right).all(|(l, r)| l.equivalent(r))
            }
            (TypedValue::M(left), TypedValue::M(right)) => records_equivalent(left, right),
            (TypedValue::Ss(left), TypedValue::Ss(right))
            | (TypedValue::Ns(left), TypedValue::Ns(right)) => same_members(left, right),
            (TypedValue::Bs(left), TypedValue::Bs(right)) => same_members(left, right),
            _ => self == other,
        }
    }
}

/// [`TypedValue::equivalent`] lifted to whole records.
pub fn records_equivalent(left: &Record, right: &Record) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|(name, value)| right.get(name).is_some_and(|other| value.equivalent(other)))
}

fn same_members<T: Ord + Clone>(left: &[T], right: &[T]) -> bool {
    let mut left = left.to_vec();
    let mut right = right.to_vec();
    left.sort();
    right.sort();
    left == right
}

impl From<TypedValue> for AttributeValue {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::S(text) => AttributeValue::S(text),
            TypedValue::N(number) => AttributeValue::N(number),
            TypedValue::Bool(value) => AttributeValue::Bool(value),
            TypedValue::Null => AttributeValue::Null(true),
            TypedValue::L(list) => AttributeValue::L(list.into_iter().map(Into::into).collect()),
            TypedValue::M(map) => AttributeValue::M(to_item(map)),
            TypedValue::Ss(set) => AttributeValue::Ss(set),
            TypedValue::Ns(set) => AttributeValue::Ns(set),
            TypedValue::Bs(set) => AttributeValue::Bs(set.into_iter().map(Blob::new).collect()),
            TypedValue::B(bytes) => AttributeValue::B(Blob::new(bytes)),
        }
    }
}

impl TryFrom<AttributeValue> for TypedValue {
    type Error = JsonConversionError;

    fn try_from(value: AttributeValue) -> Result<Self, Self::Error> {
        let typed = match value {
            AttributeValue::S(text) => TypedValue::S(text),
            AttributeValue::N(number) => TypedValue::N(number),
            AttributeValue::Bool(value) => TypedValue::Bool(value),
            AttributeValue::Null(_) => TypedValue::Null,
            AttributeValue::L(list) => TypedValue::L(
                list.into_iter()
                    .map(TypedValue::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            AttributeValue::M(map) => TypedValue::M(from_item(map)?),
            AttributeValue::Ss(set) => TypedValue::Ss(set),
            AttributeValue::Ns(set) => TypedValue::Ns(set),
            AttributeValue::Bs(set) => {
                TypedValue::Bs(set.into_iter().map(Blob::into_inner).collect())
            }
            AttributeValue::B(blob) => TypedValue::B(blob.into_inner()),
            _ => {
                return Err(JsonConversionError::UnsupportedType {
                    attribute_type: "Unknown".to_string(),
                });
            }
        };
        Ok(typed)
    }
}

/// Converts an SDK item into a [`Record`].
pub fn from_item(item: HashMap<String, AttributeValue>) -> Result<Record, JsonConversionError> {
    item.into_iter()
        .map(|(name, value)| TypedValue::try_from(value).map(|value| (name, value)))
        .collect()
}

/// Converts a [`Record`] into an SDK item.
pub fn to_item(record: Record) -> HashMap<String, AttributeValue> {
    record
        .into_iter()
        .map(|(name, value)| (name, value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_sets_and_binary_through_sdk_values() {
        let record: Record = [
            ("tags".to_string(), TypedValue::Ss(vec!["a".into(), "b".into()])),
            ("blob".to_string(), TypedValue::B(b"raw".to_vec())),
            (
                "chunks".to_string(),
                TypedValue::Bs(vec![b"x".to_vec(), b"y".to_vec()]),
            ),
        ]
        .into_iter()
        .collect();

        let item = to_item(record.clone());
        assert_eq!(item.get("blob"), Some(&AttributeValue::B(Blob::new("raw"))));
        assert_eq!(from_item(item).unwrap(), record);
    }

    #[test]
    fn equivalence_ignores_set_order_only() {
        let left = TypedValue::Ns(vec!["1".into(), "2".into()]);
        let right = TypedValue::Ns(vec!["2".into(), "1".into()]);
        assert!(left.equivalent(&right));
        assert_ne!(left, right);

        let list_left = TypedValue::L(vec![TypedValue::N("1".into()), TypedValue::N("2".into())]);
        let list_right = TypedValue::L(vec![TypedValue::N("2".into()), TypedValue::N("1".into())]);
        assert!(!list_left.equivalent(&list_right));
    }

    #[test]
    fn null_flag_is_ignored_on_read() {
        let typed = TypedValue::try_from(AttributeValue::Null(false)).unwrap();
        assert_eq!(typed, TypedValue::Null);
    }
}
