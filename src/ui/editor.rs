use crate::ui::text::clamp_to_char_boundary_left;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Single-line-with-soft-wrap input editor for the chat prompt: cursor
/// movement on char boundaries, multi-line via shift-enter, and a recall
/// history of submitted prompts.
#[derive(Default, Debug)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
}

pub enum InputAction {
    None,
    Submit(String),
    Interrupt,
    NewChat,
    Quit,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        if i == 0 {
            return 0;
        }
        let mut j = i - 1;
        while j > 0 && !self.buffer.is_char_boundary(j) {
            j -= 1;
        }
        j
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let i = clamp_to_char_boundary_left(&self.buffer, idx);
        match self.buffer[i..].chars().next() {
            Some(ch) => i + ch.len_utf8(),
            None => self.buffer.len(),
        }
    }

    pub fn insert_str(&mut self, value: &str) {
        self.history_index = None;
        let cursor = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        self.buffer.insert_str(cursor, value);
        self.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if end == 0 {
            return;
        }
        self.history_index = None;
        let start = self.prev_char_boundary(end);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = clamp_to_char_boundary_left(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        self.history_index = None;
        let end = self.next_char_boundary(start);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn submit(&mut self) -> Option<String> {
        let value = self.buffer.trim().to_string();
        if value.is_empty() {
            return None;
        }
        self.history.push(self.buffer.clone());
        self.history_index = None;
        self.buffer.clear();
        self.cursor = 0;
        Some(value)
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next_index = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.history_index = Some(next_index);
        self.buffer = self.history[next_index].clone();
        self.cursor = self.buffer.len();
    }

    pub fn history_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 >= self.history.len() {
            self.history_index = None;
            self.buffer.clear();
            self.cursor = 0;
        } else {
            self.history_index = Some(idx + 1);
            self.buffer = self.history[idx + 1].clone();
            self.cursor = self.buffer.len();
        }
    }

    pub fn apply_event(&mut self, event: Event) -> InputAction {
        match event {
            Event::Paste(text) => {
                self.insert_str(&text);
                InputAction::None
            }
            Event::Key(key) => self.apply_key(key),
            _ => InputAction::None,
        }
    }

    pub fn apply_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return InputAction::Interrupt;
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.buffer.is_empty() {
                    return InputAction::Quit;
                }
            }
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return InputAction::NewChat;
            }
            KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_str("\n");
            }
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.insert_str("\n");
            }
            KeyCode::Enter => {
                if let Some(value) = self.submit() {
                    return InputAction::Submit(value);
                }
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.prev_char_boundary(self.cursor),
            KeyCode::Right => self.cursor = self.next_char_boundary(self.cursor),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::Char(ch)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.insert_str(&ch.to_string());
            }
            _ => {}
        }

        InputAction::None
    }
}
