//! In-memory [`Backend`] for session and dispatch tests.

use std::{collections::BTreeMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use dui::dynamodb::{Backend, Page, QueryRequest, Record, TableSchema, TypedValue};

const PAGE_SIZE: usize = 2;

pub fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), TypedValue::S(value.to_string())))
        .collect()
}

pub fn schema(name: &str) -> TableSchema {
    TableSchema {
        name: name.to_string(),
        partition_key: "pk".to_string(),
        sort_key: None,
        global_indexes: Vec::new(),
        local_indexes: Vec::new(),
    }
}

pub fn users(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let pk = format!("user-{i}");
            let name = format!("User {i}");
            record(&[("pk", pk.as_str()), ("name", name.as_str())])
        })
        .collect()
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<BTreeMap<String, Vec<Record>>>,
    delay: Option<Duration>,
    failing_delete: Option<String>,
}

impl MemoryBackend {
    pub fn with_table(name: &str, count: usize) -> Self {
        let backend = Self::default();
        backend
            .tables
            .lock()
            .unwrap()
            .insert(name.to_string(), users(count));
        backend
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_delete_of(mut self, pk: &str) -> Self {
        self.failing_delete = Some(pk.to_string());
        self
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.lock().unwrap().get(table).map_or(0, Vec::len)
    }

    pub fn get(&self, table: &str, pk: &str) -> Option<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)?
            .iter()
            .find(|record| pk_of(record) == Some(pk))
            .cloned()
    }

    fn page(
        &self,
        table: &str,
        start: Option<Record>,
        filter: impl Fn(&Record) -> bool,
    ) -> Result<Page<Record, Record>, String> {
        let tables = self.tables.lock().unwrap();
        let records: Vec<&Record> = tables
            .get(table)
            .ok_or_else(|| format!("ResourceNotFoundException: table {table} not found"))?
            .iter()
            .filter(|record| filter(record))
            .collect();
        let offset = match start.as_ref().and_then(pk_of) {
            Some(last) => records
                .iter()
                .position(|record| pk_of(record) == Some(last))
                .map_or(records.len(), |index| index + 1),
            None => 0,
        };
        let items: Vec<Record> = records
            .iter()
            .skip(offset)
            .take(PAGE_SIZE)
            .map(|record| (*record).clone())
            .collect();
        let next = if offset + PAGE_SIZE < records.len() {
            items.last().map(key_of)
        } else {
            None
        };
        Ok(Page { items, next })
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn pk_of(record: &Record) -> Option<&str> {
    match record.get("pk") {
        Some(TypedValue::S(value)) => Some(value),
        _ => None,
    }
}

fn key_of(record: &Record) -> Record {
    record
        .iter()
        .filter(|(name, _)| name.as_str() == "pk")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_tables_page(&self, _start: Option<String>) -> Result<Page<String, String>, String> {
        Ok(Page {
            items: self.tables.lock().unwrap().keys().cloned().collect(),
            next: None,
        })
    }

    async fn describe_table(&self, table: &str) -> Result<TableSchema, String> {
        Ok(schema(table))
    }

    async fn scan_page(
        &self,
        table: &str,
        _index: Option<&str>,
        start: Option<Record>,
    ) -> Result<Page<Record, Record>, String> {
        self.pause().await;
        self.page(table, start, |_| true)
    }

    async fn query_page(
        &self,
        request: &QueryRequest,
        start: Option<Record>,
    ) -> Result<Page<Record, Record>, String> {
        self.pause().await;
        self.page(&request.table, start, |record| {
            record.get(&request.key_name) == Some(&request.value)
        })
    }

    async fn get_item(&self, table: &str, key: Record) -> Result<Option<Record>, String> {
        Ok(pk_of(&key).and_then(|pk| self.get(table, pk)))
    }

    async fn put_item(&self, table: &str, record: Record) -> Result<(), String> {
        let mut tables = self.tables.lock().unwrap();
        let records = tables.entry(table.to_string()).or_default();
        records.retain(|existing| pk_of(existing) != pk_of(&record));
        records.push(record);
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: Record) -> Result<(), String> {
        let pk = pk_of(&key).map(str::to_string);
        if pk.is_some() && pk == self.failing_delete {
            return Err("ConditionalCheckFailedException: refused".to_string());
        }
        if let Some(records) = self.tables.lock().unwrap().get_mut(table) {
            records.retain(|existing| pk_of(existing).map(str::to_string) != pk);
        }
        Ok(())
    }
}
