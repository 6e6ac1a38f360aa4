use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::RequestId,
};

use super::{
    debug::send_dynamo_request,
    schema::TableSchema,
    value::{Record, TypedValue, from_item, to_item},
};

/// One page of results plus the cursor to continue from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    pub next: Option<C>,
}

/// Equality query on a partition key, against the table or one of its indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub key_name: String,
    pub value: TypedValue,
}

/// The store operations the client needs, one request per call. Errors are
/// already rendered for display.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_tables_page(&self, start: Option<String>) -> Result<Page<String, String>, String>;

    async fn describe_table(&self, table: &str) -> Result<TableSchema, String>;

    async fn scan_page(
        &self,
        table: &str,
        index: Option<&str>,
        start: Option<Record>,
    ) -> Result<Page<Record, Record>, String>;

    async fn query_page(
        &self,
        request: &QueryRequest,
        start: Option<Record>,
    ) -> Result<Page<Record, Record>, String>;

    async fn get_item(&self, table: &str, key: Record) -> Result<Option<Record>, String>;

    async fn put_item(&self, table: &str, record: Record) -> Result<(), String>;

    async fn delete_item(&self, table: &str, key: Record) -> Result<(), String>;
}

pub async fn list_all_tables(backend: &dyn Backend) -> Result<Vec<String>, String> {
    let mut table_names = Vec::new();
    let mut last_evaluated_table_name = None;

    loop {
        let page = backend.list_tables_page(last_evaluated_table_name).await?;
        table_names.extend(page.items);
        match page.next {
            Some(next) => last_evaluated_table_name = Some(next),
            None => break,
        }
    }

    tracing::debug!(count = table_names.len(), "listed tables");
    Ok(table_names)
}

/// Lists every table and describes each one, in listing order.
pub async fn load_schemas(backend: &dyn Backend) -> Result<Vec<TableSchema>, String> {
    let names = list_all_tables(backend).await?;
    let mut schemas = Vec::with_capacity(names.len());
    for name in names {
        schemas.push(backend.describe_table(&name).await?);
    }
    Ok(schemas)
}

pub async fn scan_all(
    backend: &dyn Backend,
    table: &str,
    index: Option<&str>,
) -> Result<Vec<Record>, String> {
    let mut records = Vec::new();
    let mut start = None;
    let mut pages = 0usize;

    loop {
        let page = backend.scan_page(table, index, start).await?;
        pages += 1;
        records.extend(page.items);
        match page.next {
            Some(next) => start = Some(next),
            None => break,
        }
    }

    tracing::debug!(table, index, pages, count = records.len(), "scan finished");
    Ok(records)
}

pub async fn query_all(backend: &dyn Backend, request: &QueryRequest) -> Result<Vec<Record>, String> {
    let mut records = Vec::new();
    let mut start = None;
    let mut pages = 0usize;

    loop {
        let page = backend.query_page(request, start).await?;
        pages += 1;
        records.extend(page.items);
        match page.next {
            Some(next) => start = Some(next),
            None => break,
        }
    }

    tracing::debug!(
        table = %request.table,
        index = ?request.index,
        pages,
        count = records.len(),
        "query finished"
    );
    Ok(records)
}

/// [`Backend`] over the AWS SDK client.
pub struct DynamoBackend {
    client: Client,
}

impl DynamoBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Backend for DynamoBackend {
    async fn list_tables_page(&self, start: Option<String>) -> Result<Page<String, String>, String> {
        let span = tracing::trace_span!("ListTables", start_table = ?start.as_deref());
        let output = send_dynamo_request(
            span,
            || {
                self.client
                    .list_tables()
                    .set_exclusive_start_table_name(start)
                    .send()
            },
            format_sdk_error,
        )
        .await
        .map_err(|err| format_sdk_error(&err))?;

        Ok(Page {
            items: output.table_names().to_vec(),
            next: output.last_evaluated_table_name().map(str::to_string),
        })
    }

    async fn describe_table(&self, table: &str) -> Result<TableSchema, String> {
        let span = tracing::trace_span!("DescribeTable", table = %table);
        let output = send_dynamo_request(
            span,
            || self.client.describe_table().table_name(table).send(),
            format_sdk_error,
        )
        .await
        .map_err(|err| format!("failed to describe table {table}: {}", format_sdk_error(&err)))?;
        let table_desc = output
            .table()
            .ok_or_else(|| "DescribeTable: missing table".to_string())?;
        TableSchema::from_table_description(table_desc)
    }

    async fn scan_page(
        &self,
        table: &str,
        index: Option<&str>,
        start: Option<Record>,
    ) -> Result<Page<Record, Record>, String> {
        let span = tracing::trace_span!(
            "Scan",
            table = %table,
            index = ?index,
            start_key_present = start.is_some()
        );
        let output = send_dynamo_request(
            span,
            || {
                self.client
                    .scan()
                    .table_name(table)
                    .set_index_name(index.map(str::to_string))
                    .set_exclusive_start_key(start.map(to_item))
                    .send()
            },
            format_sdk_error,
        )
        .await
        .map_err(|err| format!("scan failed: {}", format_sdk_error(&err)))?;

        records_page(output.items, output.last_evaluated_key)
    }

    async fn query_page(
        &self,
        request: &QueryRequest,
        start: Option<Record>,
    ) -> Result<Page<Record, Record>, String> {
        let span = tracing::trace_span!(
            "Query",
            table = %request.table,
            index = ?request.index,
            key = %request.key_name,
            start_key_present = start.is_some()
        );
        let names = HashMap::from([("#pk".to_string(), request.key_name.clone())]);
        let values = HashMap::from([(":pk".to_string(), request.value.clone().into())]);
        let output = send_dynamo_request(
            span,
            || {
                self.client
                    .query()
                    .table_name(&request.table)
                    .set_index_name(request.index.clone())
                    .key_condition_expression("#pk = :pk")
                    .set_expression_attribute_names(Some(names))
                    .set_expression_attribute_values(Some(values))
                    .set_exclusive_start_key(start.map(to_item))
                    .send()
            },
            format_sdk_error,
        )
        .await
        .map_err(|err| format!("query failed: {}", format_sdk_error(&err)))?;

        records_page(output.items, output.last_evaluated_key)
    }

    async fn get_item(&self, table: &str, key: Record) -> Result<Option<Record>, String> {
        let span = tracing::trace_span!("GetItem", table = %table);
        let output = send_dynamo_request(
            span,
            || {
                self.client
                    .get_item()
                    .table_name(table)
                    .set_key(Some(to_item(key)))
                    .send()
            },
            format_sdk_error,
        )
        .await
        .map_err(|err| format!("get item failed: {}", format_sdk_error(&err)))?;

        output
            .item
            .map(|item| from_item(item).map_err(|err| err.to_string()))
            .transpose()
    }

    async fn put_item(&self, table: &str, record: Record) -> Result<(), String> {
        let span = tracing::trace_span!("PutItem", table = %table, attributes = record.len());
        send_dynamo_request(
            span,
            || {
                self.client
                    .put_item()
                    .table_name(table)
                    .set_item(Some(to_item(record)))
                    .send()
            },
            format_sdk_error,
        )
        .await
        .map(|_| ())
        .map_err(|err| format!("put item failed: {}", format_sdk_error(&err)))
    }

    async fn delete_item(&self, table: &str, key: Record) -> Result<(), String> {
        let span = tracing::trace_span!("DeleteItem", table = %table);
        send_dynamo_request(
            span,
            || {
                self.client
                    .delete_item()
                    .table_name(table)
                    .set_key(Some(to_item(key)))
                    .send()
            },
            format_sdk_error,
        )
        .await
        .map(|_| ())
        .map_err(|err| format!("delete item failed: {}", format_sdk_error(&err)))
    }
}

fn records_page(
    items: Option<Vec<HashMap<String, aws_sdk_dynamodb::types::AttributeValue>>>,
    last_evaluated_key: Option<HashMap<String, aws_sdk_dynamodb::types::AttributeValue>>,
) -> Result<Page<Record, Record>, String> {
    let items = items
        .unwrap_or_default()
        .into_iter()
        .map(from_item)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| err.to_string())?;
    let next = last_evaluated_key
        .filter(|key| !key.is_empty())
        .map(from_item)
        .transpose()
        .map_err(|err| err.to_string())?;
    Ok(Page { items, next })
}

pub fn format_sdk_error<E>(err: &SdkError<E>) -> String
where
    E: ProvideErrorMetadata + RequestId + std::error::Error + 'static,
{
    if let Some(service_err) = err.as_service_error() {
        let code = service_err.code().unwrap_or("ServiceError");
        let message = service_err.message().unwrap_or("").trim();
        let mut summary = if message.is_empty() {
            code.to_string()
        } else {
            format!("{code}: {message}")
        };
        if let Some(request_id) = service_err.request_id() {
            summary.push_str(&format!(" (request id: {request_id})"));
        }
        return summary;
    }
    DisplayErrorContext(err).to_string()
}
