use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

/// Single-line text field with a character cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInput {
    value: String,
    /// Cursor position in characters, 0..=len
    cursor: usize,
}

impl LineInput {
    /// Field holding `text`, cursor at the end
    pub fn new(text: &str) -> Self {
        Self {
            value: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Spans for display; a focused field shows the cursor as a reversed cell
    pub fn spans(&self, focused: bool, style: Style) -> Vec<Span<'static>> {
        if !focused {
            return vec![Span::styled(self.value.clone(), style)];
        }
        let at = self.byte_index(self.cursor);
        let (before, rest) = self.value.split_at(at);
        let mut chars = rest.chars();
        let under_cursor = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
        vec![
            Span::styled(before.to_string(), style),
            Span::styled(under_cursor, style.add_modifier(Modifier::REVERSED)),
            Span::styled(chars.as_str().to_string(), style),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor() {
        let mut input = LineInput::new("0830");
        input.move_left();
        input.move_left();
        input.insert(':');
        assert_eq!(input.value(), "08:30");
        assert_eq!(input.cursor(), 3);
        input.backspace();
        assert_eq!(input.value(), "0830");
        input.move_home();
        input.delete();
        assert_eq!(input.value(), "830");
    }

    #[test]
    fn cursor_is_bounded() {
        let mut input = LineInput::new("ab");
        input.move_right();
        assert_eq!(input.cursor(), 2);
        input.move_home();
        input.move_left();
        input.backspace();
        assert_eq!(input.value(), "ab");
        input.move_end();
        input.delete();
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn multibyte_text() {
        let mut input = LineInput::new("crèche");
        input.move_home();
        input.move_right();
        input.move_right();
        input.delete();
        assert_eq!(input.value(), "crche");
        assert_eq!(input.len(), 5);
    }

    #[test]
    fn focused_spans_mark_cursor() {
        let input = LineInput::new("12");
        let spans = input.spans(true, Style::default());
        assert_eq!(spans[0].content, "12");
        assert_eq!(spans[1].content, " ");
        assert_eq!(input.spans(false, Style::default()).len(), 1);
    }
}
