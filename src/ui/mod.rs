mod theme;

pub use theme::Theme;

use std::iter;

use dui::dynamodb::{Record, estimate_item_size_bytes, json};
use humansize::{BINARY, format_size};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, BorderType, Borders, HighlightSpacing, Padding, Paragraph, Row, Table, TableState,
        Wrap,
    },
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::session::{Mode, Session},
    util::{pad, truncate},
};

/// Widest a key column gets before values are cut.
const MAX_KEY_WIDTH: usize = 32;

const HELP: &[(&str, &str)] = &[
    ("j / k, Down / Up", "move cursor"),
    ("g g / G", "first / last item"),
    ("Enter", "view item"),
    ("Space", "select item"),
    ("e", "edit item in $EDITOR"),
    ("i / a", "new item"),
    ("d d", "delete selected items"),
    ("t", "switch table"),
    ("/scan [index]", "scan table or index"),
    ("/query [index] key=value", "query by partition key"),
    ("/get pk [sk]", "fetch one item"),
    ("/put", "new item"),
    ("/update pk [sk]", "fetch and edit one item"),
    ("/delete [pk [sk]], /rm", "delete by key or selection"),
    ("/err", "show last error"),
    (":q, Ctrl+C", "quit"),
];

pub fn render(frame: &mut Frame, session: &Session, theme: &Theme) {
    let area = frame.area();
    frame.render_widget(
        Block::new().style(Style::default().bg(theme.panel_bg()).fg(theme.text())),
        area,
    );
    let layout = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]);
    let [header_area, body_area, bottom_area] = area.layout(&layout);

    render_header(frame, header_area, session, theme);
    match session.mode() {
        Mode::TableSelect => render_tables(frame, body_area, session, theme),
        Mode::ItemView => render_item(frame, body_area, session, theme),
        Mode::Help => render_help(frame, body_area, theme),
        Mode::ErrorView => render_error(frame, body_area, session, theme),
        Mode::Normal | Mode::Command | Mode::ConfirmDelete => {
            render_records(frame, body_area, session, theme)
        }
    }
    render_bottom(frame, bottom_area, session, theme);
}

fn render_header(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let mut spans = vec![Span::styled(
        " dui ",
        Style::default()
            .fg(theme.accent())
            .add_modifier(Modifier::BOLD),
    )];
    match session.active_schema() {
        Some(schema) => {
            spans.push(Span::styled(
                schema.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" ({})", schema.key_summary()),
                Style::default().fg(theme.text_muted()),
            ));
        }
        None => spans.push(Span::styled("no table", Style::default().fg(theme.text_muted()))),
    }
    spans.push(Span::styled(" │ ", Style::default().fg(theme.border())));
    let status_style = if session.status_is_error() {
        Style::default().fg(theme.error())
    } else {
        Style::default().fg(theme.text_muted())
    };
    spans.push(Span::styled(session.status().to_string(), status_style));
    frame.render_widget(Line::from(spans), area);
}

fn panel(title: String, theme: &Theme) -> Block<'static> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .title(Line::styled(
            pad(title, 1),
            Style::default()
                .fg(theme.accent())
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(theme.border()))
}

/// Compact JSON of everything but the key attributes.
fn other_attributes(record: &Record, key_names: &[&str]) -> String {
    let rest: Record = record
        .iter()
        .filter(|(name, _)| !key_names.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    json::to_compact_json_string(&rest).unwrap_or_else(|err| err.to_string())
}

fn render_records(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let records = session.records();
    let block = panel(format!("{} items", records.len()), theme);
    let Some(schema) = session.active_schema() else {
        frame.render_widget(Paragraph::new("No table selected").block(block), area);
        return;
    };
    if records.is_empty() {
        frame.render_widget(
            Paragraph::new("No items")
                .style(Style::default().fg(theme.text_muted()))
                .block(block),
            area,
        );
        return;
    }

    let key_names: Vec<&str> = iter::once(schema.partition_key.as_str())
        .chain(schema.sort_key.as_deref())
        .collect();
    let key_cells = |record: &Record| -> Vec<String> {
        key_names
            .iter()
            .map(|name| {
                record
                    .get(*name)
                    .map(json::display_value)
                    .unwrap_or_default()
            })
            .collect()
    };

    let mut widths = vec![Constraint::Length(2)];
    for (column, name) in key_names.iter().enumerate() {
        let widest = records
            .iter()
            .map(|record| key_cells(record)[column].width())
            .max()
            .unwrap_or(0)
            .max(name.width())
            .min(MAX_KEY_WIDTH);
        widths.push(Constraint::Length(widest as u16));
    }
    widths.push(Constraint::Fill(1));

    let header = Row::new(
        iter::once(String::new())
            .chain(key_names.iter().map(|name| name.to_string()))
            .chain(iter::once("attributes".to_string())),
    )
    .style(Style::default().fg(theme.text_muted()).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let marker = format!(
                "{}{}",
                if index == session.cursor() { "▶" } else { " " },
                if session.is_selected(index) { "●" } else { " " },
            );
            let style = if session.is_selected(index) {
                Style::default().fg(theme.accent_alt())
            } else {
                Style::default()
            };
            let cells = iter::once(marker)
                .chain(
                    key_cells(record)
                        .into_iter()
                        .map(|value| truncate(&value, MAX_KEY_WIDTH)),
                )
                .chain(iter::once(other_attributes(record, &key_names)));
            Row::new(cells).style(style)
        })
        .collect();

    let table = Table::new(rows, widths)
        .block(block)
        .header(header)
        .row_highlight_style(
            Style::default()
                .bg(theme.selection_bg())
                .fg(theme.selection_fg()),
        );
    let mut state = TableState::default().with_selected(Some(session.cursor()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_tables(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let active = session.active_schema().map(|schema| schema.name.as_str());
    let rows: Vec<Row> = session
        .tables()
        .iter()
        .map(|schema| {
            let marker = if Some(schema.name.as_str()) == active { "*" } else { " " };
            Row::new([
                format!("{marker} {}", schema.name),
                schema.key_summary(),
                format!(
                    "{} GSI · {} LSI",
                    schema.global_indexes.len(),
                    schema.local_indexes.len()
                ),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(16),
        ],
    )
    .block(
        panel(format!("Tables ({})", session.tables().len()), theme).title_bottom(Line::styled(
            pad("enter: open · esc: back", 1),
            Style::default().fg(theme.text_muted()),
        )),
    )
    .highlight_spacing(HighlightSpacing::Always)
    .highlight_symbol("> ")
    .row_highlight_style(
        Style::default()
            .bg(theme.selection_bg())
            .fg(theme.selection_fg()),
    );
    let mut state = TableState::default().with_selected(Some(session.table_cursor()));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_item(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let Some(record) = session.current_record() else {
        frame.render_widget(
            Paragraph::new("No item selected").block(panel("Item".to_string(), theme)),
            area,
        );
        return;
    };
    let size = format_size(estimate_item_size_bytes(record) as u64, BINARY);
    let hint = if session.show_types() {
        "x: values only · e: edit · esc: close"
    } else {
        "x: show types · e: edit · esc: close"
    };
    let block = panel(format!("Item · ~{size}"), theme).title_bottom(Line::styled(
        pad(hint, 1),
        Style::default().fg(theme.text_muted()),
    ));
    let values = json::to_json_string(record).unwrap_or_else(|err| err.to_string());

    if !session.show_types() {
        frame.render_widget(Paragraph::new(values).block(block), area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let layout = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).spacing(1);
    let [values_area, types_area] = inner.layout(&layout);
    let types = json::to_type_json_string(record).unwrap_or_else(|err| err.to_string());
    frame.render_widget(Paragraph::new(values), values_area);
    frame.render_widget(
        Paragraph::new(types)
            .style(Style::default().fg(theme.text_muted()))
            .block(
                Block::new()
                    .borders(Borders::LEFT)
                    .border_style(Style::default().fg(theme.border())),
            ),
        types_area,
    );
}

fn render_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let key_width = HELP.iter().map(|(keys, _)| keys.width()).max().unwrap_or(0);
    let rows: Vec<Row> = HELP
        .iter()
        .map(|(keys, description)| {
            Row::new([
                Span::styled(*keys, Style::default().fg(theme.accent())),
                Span::raw(*description),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Length(key_width as u16 + 2), Constraint::Fill(1)],
    )
    .block(
        panel("Help".to_string(), theme)
            .padding(Padding::new(2, 2, 1, 1))
            .title_bottom(Line::styled(
                pad("esc: close", 1),
                Style::default().fg(theme.text_muted()),
            )),
    );
    frame.render_widget(table, area);
}

fn render_error(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .title(Line::styled(
            pad("Error", 1),
            Style::default()
                .fg(theme.error())
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Line::styled(
            pad("esc: close", 1),
            Style::default().fg(theme.text_muted()),
        ))
        .border_style(Style::default().fg(theme.error()))
        .padding(Padding::horizontal(1));
    let paragraph = Paragraph::new(Text::from(session.error_text().to_string()))
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_bottom(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let muted = Style::default().fg(theme.text_muted());
    let mut line = match session.mode() {
        Mode::Command => {
            let input = session.input();
            let before: String = input.value().chars().take(input.cursor()).collect();
            let x = area.x.saturating_add(before.width() as u16);
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
            Line::from(input.value().to_string())
        }
        Mode::ConfirmDelete => Line::styled(
            format!("Delete {} item(s)? (y/n)", session.delete_count()),
            Style::default()
                .fg(theme.warning())
                .add_modifier(Modifier::BOLD),
        ),
        Mode::Normal => Line::styled("~~ ITEMS ~~  ? for help", muted),
        Mode::TableSelect => Line::styled("~~ TABLES ~~", muted),
        Mode::ItemView => Line::styled("~~ ITEM ~~", muted),
        Mode::Help => Line::styled("~~ HELP ~~", muted),
        Mode::ErrorView => Line::styled("~~ ERROR ~~", muted),
    };
    if let Some(unsaved) = session.unsaved_edit().filter(|_| session.mode() != Mode::Command) {
        let hint = match unsaved.key {
            Some(_) => "  [unsaved edit: e to reopen]",
            None => "  [unsaved item: i to reopen]",
        };
        line.push_span(Span::styled(hint, Style::default().fg(theme.warning())));
    }
    frame.render_widget(line, area);
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::app::{
        message::Message,
        testing::{schema, users},
    };

    fn screen(session: &Session) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|frame| render(frame, session, &Theme::dark()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn loaded(count: usize) -> Session {
        let mut session = Session::new(None);
        session.apply(Message::TablesLoaded(Ok(vec![schema("users")])));
        session.apply(Message::ItemsLoaded {
            result: Ok(users(count)),
            no_match: false,
        });
        session
    }

    fn press(session: &mut Session, c: char) {
        session.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }

    #[test]
    fn lists_records_under_the_table_header() {
        let mut session = loaded(3);
        press(&mut session, ' ');
        let screen = screen(&session);
        assert!(screen.contains("users (PK: pk)"), "{screen}");
        assert!(screen.contains("Loaded 3 items"), "{screen}");
        assert!(screen.contains("▶● user-0"), "{screen}");
        assert!(screen.contains("{\"name\":\"User 2\"}"), "{screen}");
        assert!(screen.contains("~~ ITEMS ~~"), "{screen}");
    }

    #[test]
    fn confirm_line_counts_the_cursor_record() {
        let mut session = loaded(2);
        press(&mut session, 'd');
        press(&mut session, 'd');
        assert!(screen(&session).contains("Delete 1 item(s)? (y/n)"));
    }

    #[test]
    fn confirm_line_on_an_empty_list_counts_nothing() {
        let mut session = loaded(0);
        press(&mut session, 'd');
        press(&mut session, 'd');
        assert!(screen(&session).contains("Delete 0 item(s)? (y/n)"));
    }

    #[test]
    fn unsaved_new_item_hint_names_insert() {
        let mut session = loaded(1);
        press(&mut session, 'i');
        session.apply(Message::EditorFinished(Ok("{\"pk\": 1".to_string())));
        let screen = screen(&session);
        assert!(screen.contains("[unsaved item: i to reopen]"), "{screen}");
    }

    #[test]
    fn command_line_shows_the_buffer() {
        let mut session = loaded(1);
        for c in "/get user-0".chars() {
            press(&mut session, c);
        }
        assert!(screen(&session).contains("/get user-0"));
    }

    #[test]
    fn error_view_wraps_the_full_message() {
        let mut session = loaded(1);
        let message = format!("ValidationException: {}", "bad key ".repeat(12));
        session.apply(Message::OperationDone(Err(message)));
        let screen = screen(&session);
        assert!(screen.contains("Error"), "{screen}");
        assert!(screen.contains("... (/err)"), "{screen}");
        assert!(screen.contains("~~ ERROR ~~"), "{screen}");
    }
}
