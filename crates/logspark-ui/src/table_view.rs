//! Cluster table view.
//!
//! Renders one row per cluster: the trend sparkline, the record count and the
//! sample's value for every display field. Rows come from a
//! [`StoreSnapshot`], so rendering never holds the store lock.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use logspark_core::sparkline;
use logspark_core::store::StoreSnapshot;

use crate::themes::Theme;

const TREND_HEADER: &str = "trend";
const COUNT_HEADER: &str = "count";

/// Field columns wider than this are clipped by the terminal.
const MAX_COLUMN_WIDTH: usize = 48;

/// Column widths in display cells: trend, count, then one per field.
pub fn column_widths(snapshot: &StoreSnapshot) -> Vec<u16> {
    let trend = snapshot
        .rows
        .iter()
        .map(|r| r.trend.len())
        .max()
        .unwrap_or(0)
        .max(TREND_HEADER.len());
    let count = snapshot
        .rows
        .iter()
        .map(|r| r.count.to_string().len())
        .max()
        .unwrap_or(0)
        .max(COUNT_HEADER.len());

    let mut widths = vec![trend as u16, count as u16];
    for (i, field) in snapshot.fields.iter().enumerate() {
        let widest = snapshot
            .rows
            .iter()
            .filter_map(|r| r.values.get(i))
            .map(|v| cell_text(v).width())
            .max()
            .unwrap_or(0)
            .max(field.width())
            .min(MAX_COLUMN_WIDTH);
        widths.push(widest as u16);
    }
    widths
}

/// Flatten control characters so a value stays on one table line.
pub fn cell_text(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Render the cluster table into `area`, highlighting `selected` if set.
pub fn render_cluster_table(
    frame: &mut Frame,
    area: Rect,
    snapshot: &StoreSnapshot,
    selected: Option<usize>,
    theme: &Theme,
) {
    let header_cells = [TREND_HEADER, COUNT_HEADER]
        .into_iter()
        .chain(snapshot.fields.iter().map(String::as_str))
        .map(|h| Cell::from(h.to_string()).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = snapshot
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = vec![
                Cell::from(sparkline::render(&row.trend)).style(theme.sparkline),
                Cell::from(row.count.to_string()).style(theme.count),
            ];
            cells.extend(row.values.iter().map(|v| Cell::from(cell_text(v))));
            Row::new(cells).style(theme.row_style(i))
        })
        .collect();

    let widths = column_widths(snapshot);
    let last = widths.len() - 1;
    let constraints: Vec<Constraint> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            if i == last {
                Constraint::Min(w)
            } else {
                Constraint::Length(w)
            }
        })
        .collect();

    let table = Table::new(rows, constraints)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} clusters ", snapshot.rows.len())),
        )
        .row_highlight_style(theme.table_selected)
        .style(theme.text);

    let mut state = TableState::default().with_selected(selected);
    frame.render_stateful_widget(table, area, &mut state);
}

/// Render a placeholder while no record has arrived yet.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Waiting for records on stdin", theme.warning)),
        Line::from(""),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text))
            .block(Block::default().borders(Borders::ALL).title(" logspark ")),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
