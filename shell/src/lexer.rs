//! Splits a command line into words.
//!
//! Words are separated by unquoted whitespace. Single quotes keep their
//! content literally, double quotes allow `\"` and `\\` escapes, and a
//! backslash outside quotes escapes the next character. Quoted and unquoted
//! segments that touch form a single word, so `a'b c'd` is one word `ab cd`.

use thiserror::Error;

/// Errors that can occur while splitting a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unterminated quote")]
    UnfinishedQuote,
    /// The line ended right after a backslash.
    #[error("line ends with an escape character")]
    TrailingEscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    /// A word has been opened, possibly by an empty pair of quotes.
    in_word: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            in_word: false,
        }
    }

    /// Runs the state machine over the whole input and returns the words found.
    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start | LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            _ => {}
        }

        self.finish_word(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), LexingError> {
        match ch {
            c if c.is_whitespace() => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '\'' => {
                self.in_word = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.in_word = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => {
                let escaped = self.read_char().ok_or(LexingError::TrailingEscape)?;
                self.push(escaped);
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => match self.read_char() {
                Some(c @ ('"' | '\\')) => self.buffer.push(c),
                Some(c) => {
                    self.buffer.push('\\');
                    self.buffer.push(c);
                }
                None => return Err(LexingError::UnfinishedQuote),
            },
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn push(&mut self, ch: char) {
        self.in_word = true;
        self.buffer.push(ch);
    }

    fn finish_word(&mut self, out: &mut Vec<String>) {
        if self.in_word {
            out.push(std::mem::take(&mut self.buffer));
            self.in_word = false;
        }
    }
}

/// Split `line` into words. An empty or blank line yields no words.
pub fn split_into_words(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}
