use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Single-line text buffer for the command line. The cursor counts
/// characters, not bytes.
#[derive(Debug, Default)]
pub struct Input {
    input: String,
    character_index: usize,
}

impl Input {
    pub fn value(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.character_index
    }

    /// Moves the cursor, clamped to the end of the text.
    pub fn set_cursor(&mut self, index: usize) {
        self.character_index = index.min(self.input.chars().count());
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = value.to_string();
        self.character_index = self.input.chars().count();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.character_index = 0;
    }

    pub fn take(&mut self) -> String {
        self.character_index = 0;
        std::mem::take(&mut self.input)
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.character_index)
            .map(|(index, _)| index)
            .unwrap_or(self.input.len())
    }

    /// Applies an editing key. Returns false when the key is not an edit.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let len = self.input.chars().count();
        match key.code {
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.character_index = 0;
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.character_index = len;
            }
            KeyCode::Char(c) => {
                let index = self.byte_index();
                self.input.insert(index, c);
                self.character_index += 1;
            }
            KeyCode::Backspace => {
                if self.character_index > 0 {
                    self.character_index -= 1;
                    let index = self.byte_index();
                    self.input.remove(index);
                }
            }
            KeyCode::Delete => {
                if self.character_index < len {
                    let index = self.byte_index();
                    self.input.remove(index);
                }
            }
            KeyCode::Left => {
                self.character_index = self.character_index.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.character_index < len {
                    self.character_index += 1;
                }
            }
            KeyCode::Home => {
                self.character_index = 0;
            }
            KeyCode::End => {
                self.character_index = len;
            }
            _ => {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut Input, code: KeyCode) {
        input.handle_key(&KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn edits_at_the_cursor_with_multibyte_text() {
        let mut input = Input::default();
        input.set_value("/get é");
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Char('x'));
        assert_eq!(input.value(), "/get xé");
        press(&mut input, KeyCode::End);
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.value(), "/get x");
        press(&mut input, KeyCode::Home);
        press(&mut input, KeyCode::Delete);
        assert_eq!(input.value(), "get x");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn cursor_is_clamped_to_the_text() {
        let mut input = Input::default();
        input.set_value("/ab");
        input.set_cursor(1);
        press(&mut input, KeyCode::Char('x'));
        assert_eq!(input.value(), "/xab");
        input.set_cursor(99);
        assert_eq!(input.cursor(), 4);
    }

    #[test]
    fn non_edit_keys_are_not_consumed() {
        let mut input = Input::default();
        assert!(!input.handle_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!input.handle_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
    }
}
