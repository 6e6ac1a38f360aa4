use aws_sdk_dynamodb::types::{KeySchemaElement, KeyType, TableDescription};

use super::value::{Record, TypedValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub global_indexes: Vec<IndexSchema>,
    pub local_indexes: Vec<IndexSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl TableSchema {
    pub fn from_table_description(table_desc: &TableDescription) -> Result<Self, String> {
        let name = table_desc.table_name().unwrap_or_default().to_string();
        let (partition_key, sort_key) = extract_hash_range(table_desc.key_schema());
        let partition_key =
            partition_key.ok_or_else(|| format!("table {name} has no partition key"))?;

        let global_indexes = table_desc
            .global_secondary_indexes()
            .iter()
            .map(|gsi| {
                let (hash, range) = extract_hash_range(gsi.key_schema());
                IndexSchema {
                    name: gsi.index_name().unwrap_or_default().to_string(),
                    partition_key: hash.unwrap_or_default(),
                    sort_key: range,
                }
            })
            .collect();

        // LSIs share the table's partition key
        let local_indexes = table_desc
            .local_secondary_indexes()
            .iter()
            .map(|lsi| {
                let (_, range) = extract_hash_range(lsi.key_schema());
                IndexSchema {
                    name: lsi.index_name().unwrap_or_default().to_string(),
                    partition_key: partition_key.clone(),
                    sort_key: range,
                }
            })
            .collect();

        Ok(Self {
            name,
            partition_key,
            sort_key,
            global_indexes,
            local_indexes,
        })
    }

    /// Key description for the header and table picker, e.g. `PK: pk, SK: sk`.
    pub fn key_summary(&self) -> String {
        match &self.sort_key {
            Some(sort_key) => format!("PK: {}, SK: {sort_key}", self.partition_key),
            None => format!("PK: {}", self.partition_key),
        }
    }

    /// Builds a key from command arguments. Key values are always strings and
    /// the sort value is ignored for tables without a sort key.
    pub fn key_from_args(&self, partition: &str, sort: Option<&str>) -> Record {
        let mut key = Record::new();
        key.insert(
            self.partition_key.clone(),
            TypedValue::S(partition.to_string()),
        );
        if let (Some(sort_key), Some(sort)) = (&self.sort_key, sort) {
            key.insert(sort_key.clone(), TypedValue::S(sort.to_string()));
        }
        key
    }

    /// Restricts `record` to its primary key attributes.
    pub fn key_of(&self, record: &Record) -> Result<Record, String> {
        let mut key = Record::new();
        for name in std::iter::once(&self.partition_key).chain(&self.sort_key) {
            let value = record
                .get(name)
                .ok_or_else(|| format!("item is missing key attribute {name}"))?;
            key.insert(name.clone(), value.clone());
        }
        Ok(key)
    }
}

fn extract_hash_range(schema: &[KeySchemaElement]) -> (Option<String>, Option<String>) {
    let mut hash = None;
    let mut range = None;

    for KeySchemaElement {
        attribute_name,
        key_type,
        ..
    } in schema
    {
        match key_type {
            KeyType::Hash => hash = Some(attribute_name.clone()),
            KeyType::Range => range = Some(attribute_name.clone()),
            _ => {}
        }
    }

    (hash, range)
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::types::{
        GlobalSecondaryIndexDescription, LocalSecondaryIndexDescription,
    };

    use super::*;

    fn key_element(name: &str, key_type: KeyType) -> KeySchemaElement {
        KeySchemaElement::builder()
            .attribute_name(name)
            .key_type(key_type)
            .build()
            .unwrap()
    }

    fn orders_table() -> TableDescription {
        TableDescription::builder()
            .table_name("orders")
            .key_schema(key_element("pk", KeyType::Hash))
            .key_schema(key_element("sk", KeyType::Range))
            .global_secondary_indexes(
                GlobalSecondaryIndexDescription::builder()
                    .index_name("by-status")
                    .key_schema(key_element("status", KeyType::Hash))
                    .build(),
            )
            .local_secondary_indexes(
                LocalSecondaryIndexDescription::builder()
                    .index_name("by-date")
                    .key_schema(key_element("pk", KeyType::Hash))
                    .key_schema(key_element("date", KeyType::Range))
                    .build(),
            )
            .build()
    }

    #[test]
    fn extracts_keys_and_indexes() {
        let schema = TableSchema::from_table_description(&orders_table()).unwrap();
        assert_eq!(schema.name, "orders");
        assert_eq!(schema.partition_key, "pk");
        assert_eq!(schema.sort_key.as_deref(), Some("sk"));
        assert_eq!(schema.key_summary(), "PK: pk, SK: sk");
        assert_eq!(schema.global_indexes[0].partition_key, "status");
        assert_eq!(schema.local_indexes[0].partition_key, "pk");
        assert_eq!(schema.local_indexes[0].sort_key.as_deref(), Some("date"));
    }

    #[test]
    fn table_without_partition_key_is_rejected() {
        let desc = TableDescription::builder().table_name("broken").build();
        assert!(TableSchema::from_table_description(&desc).is_err());
    }

    #[test]
    fn key_args_are_strings_and_respect_the_sort_key() {
        let schema = TableSchema::from_table_description(&orders_table()).unwrap();
        let key = schema.key_from_args("42", Some("a"));
        assert_eq!(key["pk"], TypedValue::S("42".into()));
        assert_eq!(key["sk"], TypedValue::S("a".into()));
        assert_eq!(schema.key_from_args("42", None).len(), 1);

        let hash_only = TableSchema {
            sort_key: None,
            ..schema
        };
        assert_eq!(hash_only.key_from_args("42", Some("ignored")).len(), 1);
        assert_eq!(hash_only.key_summary(), "PK: pk");
    }

    #[test]
    fn key_of_keeps_only_key_attributes() {
        let schema = TableSchema::from_table_description(&orders_table()).unwrap();
        let record: Record = [
            ("pk".to_string(), TypedValue::N("1".into())),
            ("sk".to_string(), TypedValue::S("x".into())),
            ("other".to_string(), TypedValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        let key = schema.key_of(&record).unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(key["pk"], TypedValue::N("1".into()));

        let mut partial = record;
        partial.remove("sk");
        assert!(schema.key_of(&partial).unwrap_err().contains("sk"));
    }
}
