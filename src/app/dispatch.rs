use std::{future::Future, sync::Arc, time::Duration};

use dui::dynamodb::{Backend, Record, load_schemas, query_all, scan_all};
use tokio::sync::mpsc::UnboundedSender;

use super::message::{Message, Operation};

/// Runs backend operations off the event loop. Every operation becomes one
/// task that sends exactly one [`Message`] back.
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    tx: UnboundedSender<Message>,
    listing_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<dyn Backend>,
        tx: UnboundedSender<Message>,
        listing_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            tx,
            listing_timeout,
        }
    }

    pub fn dispatch(&self, operation: Operation) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let listing_timeout = self.listing_timeout;
        tokio::spawn(async move {
            let message = execute(backend.as_ref(), operation, listing_timeout).await;
            // the receiver only goes away when the app is shutting down
            let _ = tx.send(message);
        });
    }
}

pub async fn execute(
    backend: &dyn Backend,
    operation: Operation,
    listing_timeout: Duration,
) -> Message {
    match operation {
        Operation::LoadTables => Message::TablesLoaded(load_schemas(backend).await),
        Operation::LoadItems { table, index } => Message::ItemsLoaded {
            result: bounded(
                "scan",
                listing_timeout,
                scan_all(backend, &table, index.as_deref()),
            )
            .await,
            no_match: false,
        },
        Operation::Query(request) => Message::ItemsLoaded {
            result: bounded("query", listing_timeout, query_all(backend, &request)).await,
            no_match: false,
        },
        Operation::GetItem { table, key } => match backend.get_item(&table, key).await {
            Ok(Some(record)) => Message::ItemsLoaded {
                result: Ok(vec![record]),
                no_match: false,
            },
            Ok(None) => Message::ItemsLoaded {
                result: Ok(Vec::new()),
                no_match: true,
            },
            Err(err) => Message::ItemsLoaded {
                result: Err(err),
                no_match: false,
            },
        },
        Operation::FetchForEdit { table, key } => {
            Message::ItemFetchedForEdit(backend.get_item(&table, key).await)
        }
        Operation::PutItem { table, record } => Message::OperationDone(
            backend
                .put_item(&table, record)
                .await
                .map(|()| "Item saved".to_string()),
        ),
        Operation::DeleteItem { table, key } => Message::OperationDone(
            backend
                .delete_item(&table, key)
                .await
                .map(|()| "Item deleted".to_string()),
        ),
        Operation::DeleteItems { table, keys } => {
            Message::OperationDone(delete_batch(backend, &table, keys).await)
        }
    }
}

async fn bounded<T>(
    what: &str,
    limit: Duration,
    work: impl Future<Output = Result<T, String>>,
) -> Result<T, String> {
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(what, limit_ms = limit.as_millis(), "listing timed out");
            Err(format!("{what} timed out after {} ms", limit.as_millis()))
        }
    }
}

/// Deletes keys in order, stopping at the first failure.
async fn delete_batch(
    backend: &dyn Backend,
    table: &str,
    keys: Vec<Record>,
) -> Result<String, String> {
    let total = keys.len();
    let mut deleted = 0usize;
    for key in keys {
        if let Err(err) = backend.delete_item(table, key).await {
            return Err(if deleted == 0 {
                err
            } else {
                format!("deleted {deleted} of {total} item(s): {err}")
            });
        }
        deleted += 1;
    }
    Ok(format!("Deleted {deleted} item(s)"))
}
