use std::collections::BTreeSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dui::{
    command::{Command, KeyArgs, parse_command},
    dynamodb::{QueryRequest, Record, TableSchema, json},
};

use super::{
    input::Input,
    message::{Action, Message, Operation},
};

/// Errors longer than this are cut on the status line and opened in full.
pub const STATUS_LIMIT: usize = 50;
const STATUS_CUT: usize = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Command,
    TableSelect,
    ItemView,
    ConfirmDelete,
    Help,
    ErrorView,
}

/// Editor text that could not be saved. It is reopened by the next edit of
/// the same item, or by the next new item when `key` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsavedEdit {
    /// What the editor was opened with, used to detect "no changes".
    pub original: String,
    pub edited: String,
    /// Key of the edited record. `None` for a new item.
    pub key: Option<Record>,
}

/// All interaction state. Mutated only by [`Session::handle_key`] and
/// [`Session::apply`], which return the follow-up work for the event loop.
#[derive(Debug)]
pub struct Session {
    mode: Mode,
    tables: Vec<TableSchema>,
    active_table: usize,
    table_cursor: usize,
    records: Vec<Record>,
    cursor: usize,
    selected: BTreeSet<usize>,
    status: String,
    status_is_error: bool,
    last_error: Option<String>,
    chord: Option<char>,
    input: Input,
    show_types: bool,
    error_text: String,
    requested_table: Option<String>,
    preserve_status: bool,
    edit_baseline: Option<String>,
    edit_key: Option<Record>,
    pending_save: Option<UnsavedEdit>,
    unsaved_edit: Option<UnsavedEdit>,
}

impl Session {
    pub fn new(requested_table: Option<String>) -> Self {
        Self {
            mode: Mode::Normal,
            tables: Vec::new(),
            active_table: 0,
            table_cursor: 0,
            records: Vec::new(),
            cursor: 0,
            selected: BTreeSet::new(),
            status: "Loading tables...".to_string(),
            status_is_error: false,
            last_error: None,
            chord: None,
            input: Input::default(),
            show_types: false,
            error_text: String::new(),
            requested_table,
            preserve_status: false,
            edit_baseline: None,
            edit_key: None,
            pending_save: None,
            unsaved_edit: None,
        }
    }

    /// The first thing to do after start-up.
    pub fn init(&self) -> Action {
        Operation::LoadTables.into()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn active_schema(&self) -> Option<&TableSchema> {
        self.tables.get(self.active_table)
    }

    pub fn table_cursor(&self) -> usize {
        self.table_cursor
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_record(&self) -> Option<&Record> {
        self.records.get(self.cursor)
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Records a confirmed delete would remove: the selection, else the
    /// cursor record.
    pub fn delete_count(&self) -> usize {
        if self.selected.is_empty() {
            self.records.len().min(1)
        } else {
            self.selected.len()
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn status_is_error(&self) -> bool {
        self.status_is_error
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn show_types(&self) -> bool {
        self.show_types
    }

    pub fn error_text(&self) -> &str {
        &self.error_text
    }

    pub fn unsaved_edit(&self) -> Option<&UnsavedEdit> {
        self.unsaved_edit.as_ref()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Command => self.handle_command_key(key),
            Mode::TableSelect => self.handle_table_select_key(key),
            Mode::ItemView => self.handle_item_view_key(key),
            Mode::ConfirmDelete => self.handle_confirm_delete_key(key),
            Mode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q' | '?')) {
                    self.mode = Mode::Normal;
                }
                None
            }
            Mode::ErrorView => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.mode = Mode::Normal;
                    self.error_text.clear();
                }
                None
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<Action> {
        let chord = self.chord.take();
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.cursor + 1 < self.records.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char('g') => {
                if chord == Some('g') {
                    self.cursor = 0;
                } else {
                    self.chord = Some('g');
                }
            }
            KeyCode::Char('G') => {
                self.cursor = self.records.len().saturating_sub(1);
            }
            KeyCode::Char('d') => {
                if chord == Some('d') {
                    self.mode = Mode::ConfirmDelete;
                } else {
                    self.chord = Some('d');
                }
            }
            KeyCode::Enter => {
                if !self.records.is_empty() {
                    self.mode = Mode::ItemView;
                }
            }
            KeyCode::Char(' ') => {
                if !self.records.is_empty() && !self.selected.remove(&self.cursor) {
                    self.selected.insert(self.cursor);
                }
            }
            KeyCode::Char('e') => {
                if self.selected.len() <= 1 {
                    return self.edit_current();
                }
            }
            KeyCode::Char('i' | 'a') => return self.edit_new(),
            KeyCode::Char('t') => {
                self.table_cursor = self.active_table;
                self.mode = Mode::TableSelect;
            }
            KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Char(prefix @ (':' | '/')) => self.enter_command(prefix),
            KeyCode::Esc => self.input.clear(),
            _ => {}
        }
        None
    }

    fn enter_command(&mut self, prefix: char) {
        self.mode = Mode::Command;
        self.input.set_value(&prefix.to_string());
        if self.status_is_error {
            self.status_is_error = false;
            self.status = format!("{} items", self.records.len());
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => {
                self.input.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Enter => {
                let line = self.input.take();
                self.mode = Mode::Normal;
                return self.execute(&line);
            }
            // the prefix char only goes away together with the whole line
            KeyCode::Backspace if self.input.cursor() <= 1 => {
                if self.input.value().chars().count() <= 1 {
                    self.input.clear();
                    self.mode = Mode::Normal;
                }
            }
            _ => {
                self.input.handle_key(&key);
                if self.input.cursor() == 0 {
                    self.input.set_cursor(1);
                }
            }
        }
        None
    }

    fn handle_table_select_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Char('k') | KeyCode::Up => {
                self.table_cursor = self.table_cursor.saturating_sub(1);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.table_cursor + 1 < self.tables.len() {
                    self.table_cursor += 1;
                }
            }
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let table = self.tables.get(self.table_cursor)?.name.clone();
                if self.table_cursor != self.active_table {
                    self.unsaved_edit = None;
                }
                self.active_table = self.table_cursor;
                return Some(Operation::LoadItems { table, index: None }.into());
            }
            _ => {}
        }
        None
    }

    fn handle_item_view_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => self.mode = Mode::Normal,
            KeyCode::Char('x') => self.show_types = !self.show_types,
            KeyCode::Char('e') if self.selected.len() <= 1 => {
                self.mode = Mode::Normal;
                return self.edit_current();
            }
            _ => {}
        }
        None
    }

    fn handle_confirm_delete_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('y' | 'Y') => {
                self.mode = Mode::Normal;
                self.delete_selection()
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.mode = Mode::Normal;
                None
            }
            _ => None,
        }
    }

    /// Runs one entered command line.
    fn execute(&mut self, line: &str) -> Option<Action> {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(err) if err.is_usage() => {
                self.set_status(err.to_string());
                return None;
            }
            Err(err) => {
                self.record_error(err.to_string(), false);
                return None;
            }
        };
        tracing::debug!(?command, "executing command");

        match command {
            Command::Quit => return Some(Action::Quit),
            Command::Help => self.mode = Mode::Help,
            Command::ShowError => match self.last_error.clone() {
                Some(error) => {
                    self.error_text = error;
                    self.mode = Mode::ErrorView;
                }
                None => self.set_status("No errors"),
            },
            Command::Put => return self.edit_new(),
            Command::Delete(None) => self.mode = Mode::ConfirmDelete,
            Command::Scan { index } => {
                let table = self.require_table()?.name.clone();
                return Some(Operation::LoadItems { table, index }.into());
            }
            Command::Query { index, key } => {
                let table = self.require_table()?.name.clone();
                return Some(
                    Operation::Query(QueryRequest {
                        table,
                        index,
                        key_name: key.name,
                        value: key.value,
                    })
                    .into(),
                );
            }
            Command::Get(args) => {
                let (table, key) = self.key_request(&args)?;
                return Some(Operation::GetItem { table, key }.into());
            }
            Command::Update(args) => {
                let (table, key) = self.key_request(&args)?;
                return Some(Operation::FetchForEdit { table, key }.into());
            }
            Command::Delete(Some(args)) => {
                let (table, key) = self.key_request(&args)?;
                return Some(Operation::DeleteItem { table, key }.into());
            }
        }
        None
    }

    fn require_table(&mut self) -> Option<&TableSchema> {
        if self.tables.get(self.active_table).is_none() {
            self.set_status("No table selected");
            return None;
        }
        self.tables.get(self.active_table)
    }

    fn key_request(&mut self, args: &KeyArgs) -> Option<(String, Record)> {
        let schema = self.require_table()?;
        let key = schema.key_from_args(&args.partition, args.sort.as_deref());
        Some((schema.name.clone(), key))
    }

    fn delete_selection(&mut self) -> Option<Action> {
        if self.records.is_empty() {
            self.set_status("No item selected");
            return None;
        }
        let schema = self.require_table()?.clone();
        let table = schema.name.clone();
        let indices: Vec<usize> = if self.selected.is_empty() {
            vec![self.cursor]
        } else {
            self.selected.iter().copied().collect()
        };
        let keys = indices
            .iter()
            .filter_map(|index| self.records.get(*index))
            .map(|record| schema.key_of(record))
            .collect::<Result<Vec<_>, _>>();

        match keys {
            Ok(keys) => Some(Operation::DeleteItems { table, keys }.into()),
            Err(err) => {
                self.set_error(err);
                None
            }
        }
    }

    fn edit_current(&mut self) -> Option<Action> {
        let key = self.cursor_key();
        let unsaved = self.unsaved_edit.clone();
        if let Some(unsaved) = unsaved.filter(|unsaved| key.is_some() && unsaved.key == key) {
            return self.reopen(unsaved);
        }
        self.edit_record_at(self.cursor)
    }

    fn cursor_key(&self) -> Option<Record> {
        let record = self.records.get(self.cursor)?;
        self.active_schema()?.key_of(record).ok()
    }

    fn edit_record_at(&mut self, index: usize) -> Option<Action> {
        let Some(record) = self.records.get(index) else {
            self.set_status("No item selected");
            return None;
        };
        let key = self
            .active_schema()
            .and_then(|schema| schema.key_of(record).ok());
        match json::to_editable_json_string(record) {
            Ok(content) => self.open_editor(content, key),
            Err(err) => {
                self.set_error(err.to_string());
                None
            }
        }
    }

    fn edit_new(&mut self) -> Option<Action> {
        let unsaved = self.unsaved_edit.clone();
        if let Some(unsaved) = unsaved.filter(|unsaved| unsaved.key.is_none()) {
            return self.reopen(unsaved);
        }
        let content = match self.active_schema() {
            Some(schema) => new_item_template(schema),
            None => "{}".to_string(),
        };
        self.open_editor(content, None)
    }

    /// Opens fresh editor content. An unsaved edit of another item is dropped.
    fn open_editor(&mut self, content: String, key: Option<Record>) -> Option<Action> {
        if self
            .unsaved_edit
            .as_ref()
            .is_some_and(|unsaved| unsaved.key != key)
        {
            tracing::debug!("discarding unsaved edit of another item");
            self.unsaved_edit = None;
        }
        self.edit_baseline = Some(content.clone());
        self.edit_key = key;
        Some(Action::OpenEditor { content })
    }

    fn reopen(&mut self, unsaved: UnsavedEdit) -> Option<Action> {
        self.edit_baseline = Some(unsaved.original);
        self.edit_key = unsaved.key;
        self.set_status("Reopened unsaved edit");
        Some(Action::OpenEditor {
            content: unsaved.edited,
        })
    }

    /// Applies the result of background work.
    pub fn apply(&mut self, message: Message) -> Option<Action> {
        match message {
            Message::TablesLoaded(Ok(tables)) => self.tables_loaded(tables),
            Message::ItemsLoaded {
                result: Ok(records),
                no_match,
            } => {
                self.records = records;
                self.cursor = 0;
                self.selected.clear();
                if no_match {
                    self.set_status("No matching item");
                } else if self.preserve_status {
                    self.preserve_status = false;
                } else {
                    self.set_status(format!("Loaded {} items", self.records.len()));
                }
                None
            }
            Message::OperationDone(Ok(status)) => {
                self.pending_save = None;
                self.set_status(status);
                self.preserve_status = true;
                let table = self.active_schema()?.name.clone();
                Some(Operation::LoadItems { table, index: None }.into())
            }
            Message::OperationDone(Err(err)) => {
                if let Some(pending) = self.pending_save.take() {
                    self.unsaved_edit = Some(pending);
                }
                self.set_error(err);
                None
            }
            Message::EditorFinished(Ok(edited)) => self.editor_finished(edited),
            Message::ItemFetchedForEdit(Ok(Some(record))) => {
                self.records = vec![record];
                self.cursor = 0;
                self.selected.clear();
                self.edit_record_at(0)
            }
            Message::ItemFetchedForEdit(Ok(None)) => {
                self.set_status("Item not found");
                None
            }
            Message::EditorFinished(Err(err)) => {
                self.edit_baseline = None;
                self.edit_key = None;
                self.set_error(err);
                None
            }
            Message::TablesLoaded(Err(err))
            | Message::ItemsLoaded { result: Err(err), .. }
            | Message::ItemFetchedForEdit(Err(err)) => {
                self.preserve_status = false;
                self.set_error(err);
                None
            }
        }
    }

    fn tables_loaded(&mut self, tables: Vec<TableSchema>) -> Option<Action> {
        self.tables = tables;
        self.active_table = 0;
        self.table_cursor = 0;
        let requested = self.requested_table.take();

        let Some(first) = self.tables.first() else {
            self.records.clear();
            self.cursor = 0;
            self.selected.clear();
            self.set_status("No tables found");
            return None;
        };
        let first = first.name.clone();

        match requested {
            Some(name) => match self.tables.iter().position(|table| table.name == name) {
                Some(index) => {
                    self.active_table = index;
                    self.set_status(format!("Loaded {} tables", self.tables.len()));
                }
                None => {
                    self.set_status(format!("Table '{name}' not found, using {first}"));
                    self.preserve_status = true;
                }
            },
            None => self.set_status(format!("Loaded {} tables", self.tables.len())),
        }

        let table = self.active_schema()?.name.clone();
        Some(Operation::LoadItems { table, index: None }.into())
    }

    fn editor_finished(&mut self, edited: String) -> Option<Action> {
        let original = self.edit_baseline.take().unwrap_or_default();
        let key = self.edit_key.take();
        if edited.trim_end() == original.trim_end() {
            self.unsaved_edit = None;
            self.set_status("No changes made");
            return None;
        }

        let edit = UnsavedEdit {
            original,
            edited,
            key,
        };
        let Some(table) = self.active_schema().map(|schema| schema.name.clone()) else {
            self.unsaved_edit = Some(edit);
            self.set_error("No table selected");
            return None;
        };
        match json::from_json_string(&edit.edited) {
            Ok(record) => {
                self.unsaved_edit = None;
                self.pending_save = Some(edit);
                Some(Operation::PutItem { table, record }.into())
            }
            Err(err) => {
                self.unsaved_edit = Some(edit);
                self.set_error(err.to_string());
                None
            }
        }
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = false;
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.record_error(message.into(), true);
    }

    /// Stores `message` for `/err` and puts it on the status line, cut to
    /// fit. When `open_view` is set a cut message is also shown in full.
    fn record_error(&mut self, message: String, open_view: bool) {
        tracing::debug!(error = %message, "operation failed");
        self.last_error = Some(message.clone());
        self.status_is_error = true;
        if message.chars().count() > STATUS_LIMIT {
            let cut: String = message.chars().take(STATUS_CUT).collect();
            self.status = format!("{cut}... (/err)");
            if open_view {
                self.error_text = message;
                self.mode = Mode::ErrorView;
            }
        } else {
            self.status = message;
        }
    }
}

/// Editor content for a new item: the key attributes with empty values.
fn new_item_template(schema: &TableSchema) -> String {
    let keys: Vec<String> = std::iter::once(&schema.partition_key)
        .chain(&schema.sort_key)
        .map(|name| format!("  {}: \"\"", serde_json::Value::from(name.as_str())))
        .collect();
    format!("{{\n{}\n}}", keys.join(",\n"))
}
