//! Comment lexing.
//!
//! This language has only one comment form: `--` to end of line.

use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Skips whitespace and `--` line comments.
    ///
    /// Called before lexing each token.
    pub fn skip_whitespace_and_comments(&mut self) {
        if !self.bom_checked {
            self.bom_checked = true;
            if self.cursor.rest().starts_with("\u{FEFF}") {
                self.cursor.bump();
            }
        }

        loop {
            if self.cursor.at_end() {
                return;
            }

            match self.cursor.peek() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.cursor.bump();
                },
                '-' if self.cursor.peek_at(1) == '-' => {
                    self.skip_line_comment();
                },
                _ => return,
            }
        }
    }

    fn skip_line_comment(&mut self) {
        self.cursor.bump();
        self.cursor.bump();

        while !self.cursor.at_end() && self.cursor.peek() != '\n' {
            self.cursor.bump();
        }
    }
}
