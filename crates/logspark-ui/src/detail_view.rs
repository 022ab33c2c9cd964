//! Detail panel: the selected cluster's sample record as pretty JSON.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use logspark_core::Record;

use crate::themes::Theme;

/// Pretty-print `sample` and colour it line by line.
pub fn highlight_record(sample: &Record, theme: &Theme) -> Text<'static> {
    let pretty = match serde_json::to_string_pretty(sample) {
        Ok(s) => s,
        Err(e) => return Text::from(Span::styled(e.to_string(), theme.error)),
    };
    Text::from(
        pretty
            .lines()
            .map(|line| highlight_line(line, theme))
            .collect::<Vec<_>>(),
    )
}

/// Colour one line of `to_string_pretty` output.
///
/// Lines of the form `  "key": value` get key and value styles; braces and
/// array elements get the value style only.
fn highlight_line(line: &str, theme: &Theme) -> Line<'static> {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];

    if let Some(rest) = body.strip_prefix('"') {
        if let Some(split) = key_end(rest) {
            let key = &body[..split + 2];
            if let Some(value) = body[split + 2..].strip_prefix(": ") {
                return Line::from(vec![
                    Span::raw(indent.to_string()),
                    Span::styled(key.to_string(), theme.json_key),
                    Span::raw(": "),
                    Span::styled(value.to_string(), value_style(value, theme)),
                ]);
            }
        }
    }

    Line::from(vec![
        Span::raw(indent.to_string()),
        Span::styled(body.to_string(), value_style(body, theme)),
    ])
}

/// Byte offset of the closing quote of a JSON string whose opening quote was
/// already stripped.
fn key_end(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn value_style(value: &str, theme: &Theme) -> Style {
    let v = value.trim_end_matches(',');
    match v.chars().next() {
        Some('"') => theme.json_string,
        Some(c) if c == '-' || c.is_ascii_digit() => theme.json_number,
        Some('t' | 'f' | 'n') => theme.json_literal,
        _ => theme.text,
    }
}

/// Render the detail panel. `sample` is `None` while nothing is selected.
pub fn render_detail(frame: &mut Frame, area: Rect, sample: Option<&Record>, theme: &Theme) {
    let text = match sample {
        Some(record) => highlight_record(record, theme),
        None => Text::from(Span::styled("No cluster selected", theme.dim)),
    };

    frame.render_widget(
        Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(" sample "),
            ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
