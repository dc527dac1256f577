//! Word motion state machines, for skipping over a word at a time in each of the supported
//! styles. The machines are decoupled from direction: the caller feeds characters in the order
//! it walks (reversed when moving left), and stops on the first character the machine refuses.

use crate::tokenizer::tok_is_string_character;
use crate::wchar::prelude::*;

/// Our supported word motion styles.
#[derive(Clone, Copy, Eq, PartialEq)]
pub enum MoveWordStyle {
    /// stop at punctuation
    Punctuation,
    /// stops at path components
    PathComponents,
    /// stops at whitespace only
    Whitespace,
}

/// A state machine for a word motion. A new machine consumes at least one character; after the
/// machine refuses a character it refuses every further one until reset.
pub struct MoveWordStateMachine {
    state: u8,
    style: MoveWordStyle,
}

impl MoveWordStateMachine {
    pub fn new(style: MoveWordStyle) -> Self {
        MoveWordStateMachine { state: 0, style }
    }

    /// Try to consume a character. Returns true if the character extends the current word.
    pub fn consume_char(&mut self, c: char) -> bool {
        match self.style {
            MoveWordStyle::Punctuation => self.consume_char_punctuation(c),
            MoveWordStyle::PathComponents => self.consume_char_path_components(c),
            MoveWordStyle::Whitespace => self.consume_char_whitespace(c),
        }
    }

    /// Reset, so that the machine can be used anew for the next word.
    pub fn reset(&mut self) {
        self.state = 0;
    }

    fn consume_char_punctuation(&mut self, c: char) -> bool {
        const S_ALWAYS_ONE: u8 = 0;
        const S_WHITESPACE: u8 = 1;
        const S_ALPHANUMERIC: u8 = 2;
        const S_END: u8 = 3;

        let mut consumed = false;
        while self.state != S_END && !consumed {
            match self.state {
                S_ALWAYS_ONE => {
                    // Always consume the first character.
                    consumed = true;
                    self.state = S_WHITESPACE;
                }
                S_WHITESPACE => {
                    if c.is_whitespace() {
                        // Consumed whitespace.
                        consumed = true;
                    } else {
                        self.state = S_ALPHANUMERIC;
                    }
                }
                S_ALPHANUMERIC => {
                    if c.is_alphanumeric() {
                        // Consumed alphanumeric.
                        consumed = true;
                    } else {
                        self.state = S_END;
                    }
                }
                _ => unreachable!(),
            }
        }
        consumed
    }

    fn consume_char_path_components(&mut self, c: char) -> bool {
        const S_INITIAL_PUNCTUATION: u8 = 0;
        const S_WHITESPACE: u8 = 1;
        const S_SEPARATOR: u8 = 2;
        const S_SLASH: u8 = 3;
        const S_PATH_COMPONENT_CHARACTERS: u8 = 4;
        const S_END: u8 = 5;

        let mut consumed = false;
        while self.state != S_END && !consumed {
            match self.state {
                S_INITIAL_PUNCTUATION => {
                    if !is_path_component_character(c) {
                        consumed = true;
                    }
                    self.state = S_WHITESPACE;
                }
                S_WHITESPACE => {
                    if c.is_whitespace() {
                        // Consumed whitespace.
                        consumed = true;
                    } else if c == '/' || is_path_component_character(c) {
                        // Path component.
                        self.state = S_SLASH;
                    } else {
                        // Path separator.
                        self.state = S_SEPARATOR;
                    }
                }
                S_SEPARATOR => {
                    if !c.is_whitespace() && !is_path_component_character(c) {
                        // Consumed separator.
                        consumed = true;
                    } else {
                        self.state = S_END;
                    }
                }
                S_SLASH => {
                    if c == '/' {
                        // Consumed slash.
                        consumed = true;
                    } else {
                        self.state = S_PATH_COMPONENT_CHARACTERS;
                    }
                }
                S_PATH_COMPONENT_CHARACTERS => {
                    if is_path_component_character(c) {
                        // Consumed string character except slash.
                        consumed = true;
                    } else {
                        self.state = S_END;
                    }
                }
                _ => unreachable!(),
            }
        }
        consumed
    }

    fn consume_char_whitespace(&mut self, c: char) -> bool {
        const S_ALWAYS_ONE: u8 = 0;
        const S_BLANK: u8 = 1;
        const S_GRAPH: u8 = 2;
        const S_END: u8 = 3;

        let mut consumed = false;
        while self.state != S_END && !consumed {
            match self.state {
                S_ALWAYS_ONE => {
                    // Always consume the first character.
                    consumed = true;
                    self.state = S_BLANK;
                }
                S_BLANK => {
                    if c.is_whitespace() {
                        // Consumed whitespace.
                        consumed = true;
                    } else {
                        self.state = S_GRAPH;
                    }
                }
                S_GRAPH => {
                    if !c.is_whitespace() {
                        // Consumed printable non-space.
                        consumed = true;
                    } else {
                        self.state = S_END;
                    }
                }
                _ => unreachable!(),
            }
        }
        consumed
    }
}

/// Characters which make up a path component: string characters that are not path separators or
/// expansion punctuation.
fn is_path_component_character(c: char) -> bool {
    tok_is_string_character(c, true) && !L!("/={,}'\"").contains(c)
}
