use dui::dynamodb::{QueryRequest, Record, TableSchema};

/// Result of background work, applied by the session in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    TablesLoaded(Result<Vec<TableSchema>, String>),
    ItemsLoaded {
        result: Result<Vec<Record>, String>,
        /// Set when a point lookup found nothing.
        no_match: bool,
    },
    /// Success carries the status line text.
    OperationDone(Result<String, String>),
    /// The edited buffer text, read back after the editor exits.
    EditorFinished(Result<String, String>),
    ItemFetchedForEdit(Result<Option<Record>, String>),
}

/// What the session asks the event loop to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Backend(Operation),
    OpenEditor { content: String },
    Quit,
}

/// Backend work, each run as one background task.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    LoadTables,
    LoadItems { table: String, index: Option<String> },
    Query(QueryRequest),
    GetItem { table: String, key: Record },
    FetchForEdit { table: String, key: Record },
    PutItem { table: String, record: Record },
    DeleteItem { table: String, key: Record },
    DeleteItems { table: String, keys: Vec<Record> },
}

impl From<Operation> for Action {
    fn from(operation: Operation) -> Self {
        Action::Backend(operation)
    }
}
