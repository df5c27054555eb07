use unicode_width::UnicodeWidthChar;

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Soft-wrap input text into display rows of at most `width` columns.
/// Hard newlines always start a new row; `\r` is dropped.
pub fn wrap_input_lines(input: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![String::new()];
    let mut current_width = 0usize;

    for ch in input.chars() {
        match ch {
            '\r' => {}
            '\n' => {
                lines.push(String::new());
                current_width = 0;
            }
            _ => {
                let ch_width = char_display_width(ch);
                if current_width + ch_width > width && current_width > 0 {
                    lines.push(String::new());
                    current_width = 0;
                }
                if let Some(line) = lines.last_mut() {
                    line.push(ch);
                }
                current_width += ch_width;
            }
        }
    }
    lines
}

/// Display row/column of a byte cursor inside soft-wrapped input, matching
/// the wrapping of [`wrap_input_lines`].
pub fn cursor_row_col(input: &str, cursor_byte: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let cursor_byte = clamp_to_char_boundary_left(input, cursor_byte);
    let mut row = 0usize;
    let mut col = 0usize;

    for (idx, ch) in input.char_indices() {
        if idx >= cursor_byte {
            break;
        }
        match ch {
            '\r' => {}
            '\n' => {
                row += 1;
                col = 0;
            }
            _ => {
                let ch_width = char_display_width(ch);
                if col + ch_width > width && col > 0 {
                    row += 1;
                    col = 0;
                }
                col += ch_width;
            }
        }
    }

    if col >= width {
        row += 1;
        col = 0;
    }
    (row, col)
}

/// Truncate to `max_width` display columns, appending "..." when content was
/// dropped and the width allows it.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    let max_width = max_width.max(1);
    let mut out = String::new();
    let mut used = 0usize;
    let mut truncated = false;

    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width {
            truncated = true;
            break;
        }
        out.push(ch);
        used += ch_width;
    }

    if truncated && max_width >= 4 {
        while used + 3 > max_width {
            if let Some(ch) = out.pop() {
                used -= char_display_width(ch);
            } else {
                break;
            }
        }
        out.push_str("...");
    }
    out
}

pub fn clamp_to_char_boundary_left(input: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(input.len());
    while cursor > 0 && !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width_and_hard_newlines() {
        let lines = wrap_input_lines("abcd\nef", 3);
        assert_eq!(lines, vec!["abc", "d", "ef"]);
    }

    #[test]
    fn test_wrap_counts_wide_characters_by_display_width() {
        // Each CJK character is two columns wide.
        let lines = wrap_input_lines("你好吗", 4);
        assert_eq!(lines, vec!["你好", "吗"]);
    }

    #[test]
    fn test_cursor_row_col_follows_wrapping() {
        let input = "abcdef";
        assert_eq!(cursor_row_col(input, 0, 4), (0, 0));
        assert_eq!(cursor_row_col(input, 4, 4), (1, 0));
        assert_eq!(cursor_row_col(input, 6, 4), (1, 2));
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("a longer line", 8), "a lon...");
    }
}
