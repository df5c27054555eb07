use crate::ui::text::{cursor_row_col, truncate_with_ellipsis, wrap_input_lines};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatPanes {
    pub header: Rect,
    pub transcript: Rect,
    pub input: Rect,
}

/// Status line on top, transcript in the middle, input pinned to the bottom
/// with a height that follows its wrapped content.
pub fn split_chat_layout(area: Rect, input_rows: u16) -> ChatPanes {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(input_rows.max(1)),
        ])
        .split(area);

    ChatPanes {
        header: chunks[0],
        transcript: chunks[1],
        input: chunks[2],
    }
}

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_input_lines(input, width).len().max(1)
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let input_width = area.width.saturating_sub(2).max(1) as usize;
    let lines = wrap_input_lines(input, input_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, input_width);
    let visible_rows = area.height as usize;
    let window_start = cursor_row.saturating_add(1).saturating_sub(visible_rows);

    let mut rendered = Vec::with_capacity(visible_rows);
    for offset in 0..visible_rows {
        let row_index = window_start + offset;
        let prefix = if row_index == 0 { "> " } else { "  " };
        let line = lines.get(row_index).cloned().unwrap_or_default();
        rendered.push(Line::from(format!("{prefix}{line}")));
    }

    frame.render_widget(
        Paragraph::new(rendered)
            .style(Style::default().fg(Color::Gray).bg(Color::Rgb(24, 24, 24)))
            .wrap(Wrap { trim: false }),
        area,
    );

    let cursor_y = area
        .y
        .saturating_add(cursor_row.saturating_sub(window_start) as u16);
    let cursor_x = area
        .x
        .saturating_add(2 + cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}

pub fn render_transcript(frame: &mut Frame<'_>, area: Rect, lines: &[String], scroll: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let body = lines.join("\n");
    let paragraph = Paragraph::new(body)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_with_ellipsis(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Display data for the answer modal, prepared by the app layer so rendering
/// stays free of draft bookkeeping.
pub struct QuestionModalView {
    pub header: String,
    pub question: String,
    pub progress: String,
    pub multi_select: bool,
    pub options: Vec<QuestionOptionRow>,
    pub custom_text: String,
    pub custom_active: bool,
    pub custom_focused: bool,
    pub editing_custom: bool,
    pub complete: bool,
}

pub struct QuestionOptionRow {
    pub label: String,
    pub description: String,
    pub selected: bool,
    pub focused: bool,
}

pub fn render_question_modal(frame: &mut Frame<'_>, view: &QuestionModalView) {
    let size = frame.area();
    let width = size.width.clamp(44, 96);
    let height = size
        .height
        .clamp(10, (view.options.len() as u16 + 12).min(24));
    let x = size.x + (size.width.saturating_sub(width)) / 2;
    let y = size.y + (size.height.saturating_sub(height)) / 2;
    let area = Rect::new(x, y, width, height);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Agent question: {}", view.header))
        .style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();
    lines.push(Line::styled(
        view.progress.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::from(view.question.clone()));
    if view.multi_select {
        lines.push(Line::styled(
            "select all that apply",
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(""));

    for option in &view.options {
        let mark = if option.selected { "[x]" } else { "[ ]" };
        let pointer = if option.focused { ">" } else { " " };
        let mut style = Style::default();
        if option.focused {
            style = style.add_modifier(Modifier::BOLD);
        }
        let row = if option.description.is_empty() {
            format!("{pointer} {mark} {}", option.label)
        } else {
            format!("{pointer} {mark} {} - {}", option.label, option.description)
        };
        lines.push(Line::styled(row, style));
    }

    let custom_mark = if view.custom_active { "[x]" } else { "[ ]" };
    let custom_pointer = if view.custom_focused { ">" } else { " " };
    let custom_body = if view.editing_custom {
        format!("{}_", view.custom_text)
    } else if view.custom_text.is_empty() {
        "Other (custom answer)".to_string()
    } else {
        format!("Other: {}", view.custom_text)
    };
    let mut custom_style = Style::default();
    if view.custom_focused {
        custom_style = custom_style.add_modifier(Modifier::BOLD);
    }
    lines.push(Line::styled(
        format!("{custom_pointer} {custom_mark} {custom_body}"),
        custom_style,
    ));

    lines.push(Line::from(""));
    let footer = if view.complete {
        "space select   tab next question   enter submit"
    } else {
        "space select   tab next question   answer every question to submit"
    };
    lines.push(Line::styled(footer, Style::default().fg(Color::DarkGray)));

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        inner,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_layout_splits_into_three_panes() {
        let area = Rect::new(0, 0, 80, 20);
        let panes = split_chat_layout(area, 4);

        assert_eq!(panes.header.height, 1);
        assert_eq!(panes.transcript.height, 15);
        assert_eq!(panes.input.height, 4);
        assert_eq!(panes.header.y, 0);
        assert_eq!(panes.transcript.y, 1);
        assert_eq!(panes.input.y, 16);
    }

    #[test]
    fn test_input_visual_rows_tracks_wrapping() {
        assert_eq!(input_visual_rows("", 10), 1);
        assert_eq!(input_visual_rows("abcdefghij", 5), 2);
        assert_eq!(input_visual_rows("a\nb\nc", 5), 3);
    }
}
