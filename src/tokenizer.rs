//! A specialized tokenizer for the coral language: splits a source buffer into string, pipe,
//! redirection, background, terminator and comment tokens, reporting scan errors with precise
//! offsets.

use crate::wchar::prelude::*;
use libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use std::ops::{BitAnd, BitOr, BitOrAssign, Range};
use std::os::fd::RawFd;

/// Token types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenType {
    /// Error reading token
    Error,
    /// String token
    String,
    /// Pipe token
    Pipe,
    /// Input redirection token, like <
    RedirectIn,
    /// Output redirection token, like >
    RedirectOut,
    /// Appending redirection token, like >> or ^^
    RedirectAppend,
    /// Fd duplication redirection token, like 2>&
    RedirectFd,
    /// Noclobber redirection token, like >?
    RedirectNoclob,
    /// send job to bg token
    Background,
    /// End token (semicolon or newline, not literal end)
    End,
    /// comment token
    Comment,
}

impl TokenType {
    /// Return true if this is one of the redirection token types.
    pub fn is_redirection(self) -> bool {
        matches!(
            self,
            TokenType::RedirectIn
                | TokenType::RedirectOut
                | TokenType::RedirectAppend
                | TokenType::RedirectFd
                | TokenType::RedirectNoclob
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TokenizerError {
    None,
    UnterminatedQuote,
    UnterminatedSubshell,
    UnterminatedSlice,
    UnterminatedEscape,
    InvalidRedirect,
    InvalidPipe,
}

impl From<TokenizerError> for &'static wstr {
    fn from(err: TokenizerError) -> Self {
        match err {
            TokenizerError::None => L!(""),
            TokenizerError::UnterminatedQuote => {
                L!("Unexpected end of string, quotes are not balanced")
            }
            TokenizerError::UnterminatedSubshell => {
                L!("Unexpected end of string, parenthesis do not match")
            }
            TokenizerError::UnterminatedSlice => {
                L!("Unexpected end of string, square brackets do not match")
            }
            TokenizerError::UnterminatedEscape => {
                L!("Unexpected end of string, incomplete escape sequence")
            }
            TokenizerError::InvalidRedirect => L!("Invalid input/output redirection"),
            TokenizerError::InvalidPipe => L!("Cannot use stdin (fd 0) as pipe output"),
        }
    }
}

/// One token of the input stream.
#[derive(Clone, Debug)]
pub struct Tok {
    /// The text of the token. For strings and comments this is the raw matched slice; for
    /// redirections and pipes it is the decoded fd as a decimal string; for statement
    /// terminators it is the single matched character; for errors it is the diagnostic
    /// message, or empty under TOK_SQUASH_ERRORS.
    pub text: WString,

    /// Offset of the token within the source.
    pub offset: u32,
    /// Length of the token.
    pub length: u32,

    /// If an error, this is the offset of the error within the token. A value of 0 means it
    /// occurred at 'offset'.
    pub error_offset_within_token: u32,

    /// If an error, this is the error code.
    pub error: TokenizerError,

    /// The type of the token.
    pub type_: TokenType,
}

impl Tok {
    fn new(r#type: TokenType) -> Tok {
        Tok {
            text: WString::new(),
            offset: 0,
            length: 0,
            error_offset_within_token: 0,
            error: TokenizerError::None,
            type_: r#type,
        }
    }
    pub fn offset(&self) -> usize {
        self.offset as usize
    }
    pub fn length(&self) -> usize {
        self.length as usize
    }
    pub fn end(&self) -> usize {
        self.offset() + self.length()
    }
    pub fn range(&self) -> Range<usize> {
        self.offset()..self.end()
    }
    pub fn get_source<'a>(&self, src: &'a wstr) -> &'a wstr {
        &src[self.range()]
    }
}

#[derive(Clone, Copy, Default)]
pub struct TokFlags(pub u8);

impl BitAnd for TokFlags {
    type Output = bool;
    fn bitand(self, rhs: Self) -> Self::Output {
        (self.0 & rhs.0) != 0
    }
}
impl BitOr for TokFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}
impl BitOrAssign for TokFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

/// Flag telling the tokenizer to accept incomplete parameters, i.e. parameters with mismatching
/// parenthesis, etc. This is useful for tab-completion.
pub const TOK_ACCEPT_UNFINISHED: TokFlags = TokFlags(1);

/// Flag telling the tokenizer not to remove comments. Useful for syntax highlighting.
pub const TOK_SHOW_COMMENTS: TokFlags = TokFlags(2);

/// Flag telling the tokenizer to not generate error messages, which we need to do when tokenizing
/// off of the main thread (since wgettext is not thread safe).
pub const TOK_SQUASH_ERRORS: TokFlags = TokFlags(4);

/// Ordinarily, the tokenizer ignores newlines following a newline, or a semicolon. This flag tells
/// the tokenizer to return each of them as a separate END.
pub const TOK_SHOW_BLANK_LINES: TokFlags = TokFlags(8);

/// The tokenizer struct.
pub struct Tokenizer<'c> {
    /// A position into the original string, showing where the next token begins.
    token_cursor: usize,
    /// The original string.
    start: &'c wstr,
    /// Whether we have additional tokens.
    has_next: bool,
    /// Whether incomplete tokens are accepted.
    accept_unfinished: bool,
    /// Whether comments should be returned.
    show_comments: bool,
    /// Whether error tokens carry a descriptive message.
    squash_errors: bool,
    /// Whether all blank lines are returned.
    show_blank_lines: bool,
    /// Whether to continue the previous line after the comment.
    continue_line_after_comment: bool,
}

impl<'c> Tokenizer<'c> {
    /// Constructor for a tokenizer. `start` is the string to tokenize; it is borrowed, not
    /// copied, and must outlive the tokenizer.
    ///
    /// Setting TOK_ACCEPT_UNFINISHED will cause the tokenizer to accept incomplete tokens, such
    /// as a subshell without a closing parenthesis, as valid tokens. Setting TOK_SHOW_COMMENTS
    /// will return comments as tokens.
    pub fn new(start: &'c wstr, flags: TokFlags) -> Self {
        Tokenizer {
            token_cursor: 0,
            start,
            has_next: true,
            accept_unfinished: flags & TOK_ACCEPT_UNFINISHED,
            show_comments: flags & TOK_SHOW_COMMENTS,
            squash_errors: flags & TOK_SQUASH_ERRORS,
            show_blank_lines: flags & TOK_SHOW_BLANK_LINES,
            continue_line_after_comment: false,
        }
    }
}

impl<'c> Iterator for Tokenizer<'c> {
    type Item = Tok;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next {
            return None;
        }

        // Consume non-newline whitespace. If we get an escaped newline, mark it and continue past
        // it.
        loop {
            let i = self.token_cursor;
            if self.start.get(i..i + 2) == Some(L!("\\\n")) {
                self.token_cursor += 2;
                self.continue_line_after_comment = true;
            } else if i < self.start.len() && iswspace_not_nl(self.start.char_at(i)) {
                self.token_cursor += 1;
            } else {
                break;
            }
        }

        while self.start.char_at(self.token_cursor) == '#' {
            // We have a comment, walk over the comment.
            let comment_start = self.token_cursor;
            self.token_cursor = comment_end(self.start, self.token_cursor);
            let comment_len = self.token_cursor - comment_start;

            // If we are going to continue after the comment, skip any trailing newline.
            if self.start.as_char_slice().get(self.token_cursor) == Some(&'\n')
                && self.continue_line_after_comment
            {
                self.token_cursor += 1;
            }

            // Maybe return the comment.
            if self.show_comments {
                let mut result = Tok::new(TokenType::Comment);
                result.offset = comment_start as u32;
                result.length = comment_len as u32;
                result.text = self.start[comment_start..comment_start + comment_len].to_owned();
                return Some(result);
            }

            while self.token_cursor < self.start.len()
                && iswspace_not_nl(self.start.char_at(self.token_cursor))
            {
                self.token_cursor += 1;
            }
        }

        // We made it past the comments and ate any trailing newlines we wanted to ignore.
        self.continue_line_after_comment = false;
        let start_pos = self.token_cursor;

        let this_char = self.start.char_at(self.token_cursor);
        let buff = &self.start[self.token_cursor..];
        match this_char {
            '\0' => {
                self.has_next = false;
                None
            }
            '\r' |  // carriage-return
            '\n' |  // newline
            ';' => {
                let mut result = Tok::new(TokenType::End);
                result.offset = start_pos as u32;
                result.length = 1;
                result.text = WString::from_chars([this_char]);
                self.token_cursor += 1;
                // Hack: when we get a newline, swallow as many as we can. This compresses multiple
                // subsequent newlines into a single one.
                if !self.show_blank_lines {
                    while self.token_cursor < self.start.len() {
                        let c = self.start.char_at(self.token_cursor);
                        if c != '\n' && c != '\r' && c != ' ' && c != '\t' {
                            break;
                        }
                        self.token_cursor += 1;
                    }
                }
                Some(result)
            }
            '&' => {
                let mut result = Tok::new(TokenType::Background);
                result.offset = start_pos as u32;
                result.length = 1;
                result.text = L!("&").to_owned();
                self.token_cursor += 1;
                Some(result)
            }
            '|' => {
                let mut result = Tok::new(TokenType::Pipe);
                result.offset = start_pos as u32;
                result.length = 1;
                // A bare pipe always redirects stdout.
                result.text = L!("1").to_owned();
                self.token_cursor += 1;
                Some(result)
            }
            '>' | '<' | '^' => {
                // There's some duplication with the code in the default case below. The key
                // difference here is that we must never parse these as a string; a failed
                // redirection is an error!
                match PipeOrRedir::try_from(buff) {
                    Ok(redir_or_pipe) if redir_or_pipe.fd >= 0 => {
                        let mut result = Tok::new(redir_or_pipe.mode);
                        result.offset = start_pos as u32;
                        result.length = redir_or_pipe.consumed as u32;
                        result.text = WString::from_str(&redir_or_pipe.fd.to_string());
                        self.token_cursor += redir_or_pipe.consumed;
                        Some(result)
                    }
                    _ => Some(self.call_error(
                        TokenizerError::InvalidRedirect,
                        self.token_cursor,
                        self.token_cursor,
                    )),
                }
            }
            _ => {
                // Maybe a redirection like '2>', maybe a pipe like 2>|, maybe just a string.
                let error_location = self.token_cursor;
                let redir_or_pipe = if this_char.is_ascii_digit() {
                    PipeOrRedir::try_from(buff).ok()
                } else {
                    None
                };

                match redir_or_pipe {
                    Some(redir_or_pipe) => {
                        // It looks like a redirection or a pipe. But we don't support piping fd 0.
                        // Note that fd 0 may be -1, indicating overflow; but we don't treat that as
                        // a tokenizer error.
                        if redir_or_pipe.mode == TokenType::Pipe && redir_or_pipe.fd == 0 {
                            Some(self.call_error(
                                TokenizerError::InvalidPipe,
                                error_location,
                                error_location,
                            ))
                        } else {
                            let mut result = Tok::new(redir_or_pipe.mode);
                            result.offset = start_pos as u32;
                            result.length = redir_or_pipe.consumed as u32;
                            result.text = WString::from_str(&redir_or_pipe.fd.to_string());
                            self.token_cursor += redir_or_pipe.consumed;
                            Some(result)
                        }
                    }
                    None => {
                        // Not a redirection or pipe, so just a string.
                        Some(self.read_string())
                    }
                }
            }
        }
    }
}

impl<'c> Tokenizer<'c> {
    /// Return an error token and mark that we no longer have a next token. The error offset is
    /// clamped to 0 when `error_loc` falls before the token, which happens when the exact
    /// location was lost (deeply nested parens past the bookkeeping cap).
    fn call_error(
        &mut self,
        error_type: TokenizerError,
        token_start: usize,
        error_loc: usize,
    ) -> Tok {
        assert!(
            error_type != TokenizerError::None,
            "TokenizerError::None passed to call_error"
        );
        debug_assert!(self.token_cursor >= token_start, "Invalid cursor location");

        self.has_next = false;

        let mut result = Tok::new(TokenType::Error);
        result.offset = token_start as u32;
        result.length = (self.token_cursor - token_start) as u32;
        result.error = error_type;
        result.error_offset_within_token = error_loc.saturating_sub(token_start) as u32;
        if !self.squash_errors {
            result.text = <&'static wstr>::from(error_type).to_owned();
        }
        result
    }

    /// Read the next token as a string.
    fn read_string(&mut self) -> Tok {
        #[derive(Clone, Copy, Eq, PartialEq)]
        enum TokMode {
            RegularText,              // regular text
            Subshell,                 // inside of subshell
            ArrayBrackets,            // inside of array brackets
            ArrayBracketsAndSubshell, // inside of array brackets and subshell, like in '$foo[(ech'
        }
        use TokMode::*;

        let mut mode = RegularText;
        let mut paran_count = 0usize;
        // Stack of open paren offsets, capped so a pathological document cannot grow it without
        // bound. Past the cap we degrade to reporting offset 0.
        let mut paran_offsets: Vec<usize> = Vec::new();
        // Where the open bracket is.
        let mut offset_of_bracket = 0usize;
        let buff_start = self.token_cursor;
        let mut is_first = true;
        let mut do_loop = true;

        while do_loop {
            let c = self.start.char_at(self.token_cursor);
            if !myal(c) {
                if c == '\\' {
                    let error_location = self.token_cursor;
                    self.token_cursor += 1;
                    if self.start.char_at(self.token_cursor) == '\0' {
                        if !self.accept_unfinished {
                            return self.call_error(
                                TokenizerError::UnterminatedEscape,
                                buff_start,
                                error_location,
                            );
                        }
                        // Since we are about to increment the cursor, decrement it first so the
                        // increment doesn't go past the end of the buffer.
                        self.token_cursor -= 1;
                        do_loop = false;
                    }
                    self.token_cursor += 1;
                    continue;
                }

                match mode {
                    RegularText => match c {
                        '(' => {
                            paran_count = 1;
                            paran_offsets.clear();
                            paran_offsets.push(self.token_cursor);
                            mode = Subshell;
                        }
                        '[' => {
                            if self.token_cursor != buff_start {
                                mode = ArrayBrackets;
                                offset_of_bracket = self.token_cursor;
                            }
                        }
                        '\'' | '"' => match quote_end(self.start, self.token_cursor, c) {
                            Some(end) => self.token_cursor = end,
                            None => {
                                let error_loc = self.token_cursor;
                                self.token_cursor = self.start.len();
                                if !self.accept_unfinished {
                                    return self.call_error(
                                        TokenizerError::UnterminatedQuote,
                                        buff_start,
                                        error_loc,
                                    );
                                }
                                do_loop = false;
                            }
                        },
                        _ => {
                            if !tok_is_string_character(c, is_first) {
                                do_loop = false;
                            }
                        }
                    },
                    Subshell | ArrayBracketsAndSubshell => match c {
                        '\'' | '"' => match quote_end(self.start, self.token_cursor, c) {
                            Some(end) => self.token_cursor = end,
                            None => {
                                let error_loc = self.token_cursor;
                                self.token_cursor = self.start.len();
                                if !self.accept_unfinished {
                                    return self.call_error(
                                        TokenizerError::UnterminatedQuote,
                                        buff_start,
                                        error_loc,
                                    );
                                }
                                do_loop = false;
                            }
                        },
                        '(' => {
                            if paran_offsets.len() < PARAN_OFFSETS_MAX {
                                paran_offsets.push(self.token_cursor);
                            }
                            paran_count += 1;
                        }
                        ')' => {
                            debug_assert!(paran_count > 0, "unbalanced paren count");
                            paran_count -= 1;
                            paran_offsets.truncate(paran_count.min(PARAN_OFFSETS_MAX));
                            if paran_count == 0 {
                                mode = if mode == ArrayBracketsAndSubshell {
                                    ArrayBrackets
                                } else {
                                    RegularText
                                };
                            }
                        }
                        '\0' => do_loop = false,
                        _ => {} // ignore other chars
                    },
                    ArrayBrackets => match c {
                        '(' => {
                            paran_count = 1;
                            paran_offsets.clear();
                            paran_offsets.push(self.token_cursor);
                            mode = ArrayBracketsAndSubshell;
                        }
                        ']' => mode = RegularText,
                        '\0' => do_loop = false,
                        _ => {} // ignore other chars
                    },
                }
            }

            if !do_loop {
                break;
            }
            self.token_cursor += 1;
            is_first = false;
        }

        if !self.accept_unfinished && mode != RegularText {
            return match mode {
                Subshell => {
                    // Determine the innermost opening paren offset. If the paren stack overflowed
                    // its cap, the exact offset is gone; report 0.
                    debug_assert!(paran_count > 0, "paran_count should be positive");
                    let offset_of_open_paran = if paran_count <= PARAN_OFFSETS_MAX {
                        paran_offsets.last().copied().unwrap_or(0)
                    } else {
                        0
                    };
                    self.call_error(
                        TokenizerError::UnterminatedSubshell,
                        buff_start,
                        offset_of_open_paran,
                    )
                }
                ArrayBrackets | ArrayBracketsAndSubshell => self.call_error(
                    TokenizerError::UnterminatedSlice,
                    buff_start,
                    offset_of_bracket,
                ),
                RegularText => unreachable!(),
            };
        }

        let mut result = Tok::new(TokenType::String);
        result.offset = buff_start as u32;
        result.length = (self.token_cursor - buff_start) as u32;
        result.text = self.start[buff_start..self.token_cursor].to_owned();
        result
    }
}

/// Up to 96 open parens, before we give up on good error reporting.
const PARAN_OFFSETS_MAX: usize = 96;

/// Struct wrapping up a parsed pipe or redirection.
#[derive(Clone, Copy, Debug)]
pub struct PipeOrRedir {
    /// The redirected fd, or -1 on overflow.
    /// For example, in the case of "3>&1" this will be 3.
    pub fd: RawFd,

    /// The token type: TokenType::Pipe, or one of the redirection token types.
    pub mode: TokenType,

    /// Number of characters consumed when parsing the string.
    pub consumed: usize,
}

impl TryFrom<&wstr> for PipeOrRedir {
    type Error = ();

    /// Parse a redirection or an "fd pipe" (like 2>|) from the start of a string. Examples of
    /// supported syntaxes. Note we are only responsible for parsing the redirection part, not
    /// 'cmd' or 'file'.
    ///
    /// ```text
    ///     cmd < file       stdin redirection
    ///     cmd > file       redirection
    ///     cmd >> file      appending redirection
    ///     cmd >? file      noclobber redirection
    ///     cmd 2> file      file redirection with explicit fd
    ///     cmd ^ file       caret (stderr) redirection
    ///     cmd ^^ file      appending caret redirection
    ///     cmd 2>& 1        fd redirection with an explicit src fd
    ///     cmd >| cmd       pipe with explicit fd
    ///     cmd 2>| cmd      pipe with explicit fd
    /// ```
    ///
    /// Returns Err when the operator position holds none of '<', '>' and '^' - this signals "not
    /// a redirection here" to the caller without raising an error.
    fn try_from(buff: &wstr) -> Result<PipeOrRedir, ()> {
        // Determine the fd. This may be specified as a prefix like '2>...' or it may be implicit
        // like '>' or '^'. Try parsing out a number; if we did not get any digits then infer it
        // from the operator. Watch out for overflow: all digits are consumed, even if the decoded
        // value saturates to the invalid fd -1, so that the cursor stays correct.
        let mut idx = 0;
        let mut big_fd: i64 = 0;
        while buff.char_at(idx).is_ascii_digit() {
            if big_fd <= i32::MAX as i64 {
                big_fd = big_fd * 10 + i64::from(buff.char_at(idx).to_digit(10).unwrap());
            }
            idx += 1;
        }
        let mut fd: RawFd = if big_fd > i32::MAX as i64 {
            -1
        } else {
            big_fd as RawFd
        };

        if idx == 0 {
            // We did not find a leading digit, so there's no explicit fd. Infer it from the
            // operator.
            fd = match buff.char_at(idx) {
                '>' => STDOUT_FILENO,
                '<' => STDIN_FILENO,
                '^' => STDERR_FILENO,
                _ => return Err(()),
            };
        }

        // Either way we should have ended on the redirection character itself like '>'.
        // Don't allow an fd with a caret redirection - see #1873.
        let redirect_char = buff.char_at(idx);
        idx += 1;
        let mut mode;
        if redirect_char == '>' || (redirect_char == '^' && idx == 1) {
            mode = TokenType::RedirectOut;
            if buff.char_at(idx) == redirect_char {
                // Doubled up like ^^ or >>. That means append.
                mode = TokenType::RedirectAppend;
                idx += 1;
            }
        } else if redirect_char == '<' {
            mode = TokenType::RedirectIn;
        } else {
            // Something else.
            return Err(());
        }

        // Optional characters like & or ?, or the pipe char |.
        match buff.char_at(idx) {
            '&' => {
                mode = TokenType::RedirectFd;
                idx += 1;
            }
            '?' => {
                mode = TokenType::RedirectNoclob;
                idx += 1;
            }
            '|' => {
                // So the string looked like '2>|'. This is not a redirection - it's a pipe! That
                // gets handled elsewhere.
                mode = TokenType::Pipe;
                idx += 1;
            }
            _ => {}
        }

        Ok(PipeOrRedir {
            fd,
            mode,
            consumed: idx,
        })
    }
}

/// Decode the redirection primitive at the start of `s`, like "2>". Pipes and overflowed fds do
/// not decode: redirections only.
pub fn redirection_type_for_string(s: &wstr) -> Option<(TokenType, RawFd)> {
    let redir = PipeOrRedir::try_from(s).ok()?;
    if redir.mode == TokenType::Pipe || redir.fd < 0 {
        return None;
    }
    Some((redir.mode, redir.fd))
}

/// Return the fd redirected by a pipe token's text, or -1 if the text is not a pipe or decodes to
/// a negative fd.
pub fn fd_redirected_by_pipe(s: &wstr) -> RawFd {
    // Hack for the common case.
    if s == L!("|") {
        return STDOUT_FILENO;
    }
    match PipeOrRedir::try_from(s) {
        Ok(pipe) if pipe.mode == TokenType::Pipe && pipe.fd >= 0 => pipe.fd,
        _ => -1,
    }
}

/// Return the text of the first string token of `input`, or empty.
pub fn tok_first(input: &wstr) -> WString {
    let mut t = Tokenizer::new(input, TOK_SQUASH_ERRORS);
    match t.next() {
        Some(token) if token.type_ == TokenType::String => token.text,
        _ => WString::new(),
    }
}

/// Return the position one past the quote matching the one at `pos`, if any.
pub fn quote_end(s: &wstr, mut pos: usize, quote: char) -> Option<usize> {
    loop {
        pos += 1;
        if pos >= s.len() {
            return None;
        }
        let c = s.char_at(pos);
        if c == '\\' {
            pos += 1;
            if pos >= s.len() {
                return None;
            }
        } else if c == quote {
            return Some(pos);
        }
    }
}

/// Return the position one past the end of the comment starting at `pos`.
pub fn comment_end(s: &wstr, mut pos: usize) -> usize {
    loop {
        pos += 1;
        if pos == s.len() || s.char_at(pos) == '\n' {
            return pos;
        }
    }
}

/// Tests if this character can be a part of a string. The redirect ^ is allowed unless it's the
/// first character. Hash (#) starts a comment if it's the first character in a token; otherwise
/// it is considered a string character.
pub fn tok_is_string_character(c: char, is_first: bool) -> bool {
    match c {
        // Unconditional separators.
        '\0' | ' ' | '\n' | '|' | '\t' | ';' | '\r' | '<' | '>' | '&' => false,
        // Conditional separator.
        '^' => !is_first,
        _ => true,
    }
}

/// Quick test to catch the most common 'non-magical' characters, makes read_string slightly faster
/// by adding a fast path for the most common characters. This is obviously not a suitable
/// replacement for iswalpha.
fn myal(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Test if a character is whitespace. Differs from iswspace in that it does not consider a
/// newline to be whitespace.
fn iswspace_not_nl(c: char) -> bool {
    match c {
        ' ' | '\t' | '\r' => true,
        '\n' => false,
        _ => c.is_whitespace(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wchar::prelude::*;

    #[test]
    fn test_tokenizer_strings() {
        let s = L!("echo 'a b' c");
        let mut t = Tokenizer::new(s, TokFlags(0));

        let token = t.next().unwrap(); // echo
        assert_eq!(token.type_, TokenType::String);
        assert_eq!(token.offset, 0);
        assert_eq!(token.length, 4);
        assert_eq!(token.text, "echo");

        let token = t.next().unwrap(); // 'a b'
        assert_eq!(token.type_, TokenType::String);
        assert_eq!(token.offset, 5);
        assert_eq!(token.length, 5);
        assert_eq!(token.text, "'a b'");

        let token = t.next().unwrap(); // c
        assert_eq!(token.type_, TokenType::String);
        assert_eq!(token.offset, 11);
        assert_eq!(token.length, 1);
        assert_eq!(token.text, "c");

        assert!(t.next().is_none());
        // The tokenizer stays exhausted.
        assert!(t.next().is_none());
    }

    #[test]
    fn test_tokenizer_operators() {
        let s = L!("cmd <in >out 2>&1 2>| ^err ^^err2 & ; next");
        type Tt = TokenType;
        let expected: &[(Tt, &str)] = &[
            (Tt::String, "cmd"),
            (Tt::RedirectIn, "0"),
            (Tt::String, "in"),
            (Tt::RedirectOut, "1"),
            (Tt::String, "out"),
            (Tt::RedirectFd, "2"),
            (Tt::String, "1"),
            (Tt::Pipe, "2"),
            (Tt::RedirectOut, "2"),
            (Tt::String, "err"),
            (Tt::RedirectAppend, "2"),
            (Tt::String, "err2"),
            (Tt::Background, "&"),
            (Tt::End, ";"),
            (Tt::String, "next"),
        ];
        let actual: Vec<Tok> = Tokenizer::new(s, TokFlags(0)).collect();
        assert_eq!(actual.len(), expected.len());
        for (tok, &(typ, text)) in actual.iter().zip(expected.iter()) {
            assert_eq!(tok.type_, typ);
            assert_eq!(tok.text, text);
        }
    }

    #[test]
    fn test_tokenizer_fd_dup_is_two_tokens() {
        // "2>&1" is a 3-character fd-duplication token; the target is a separate string.
        let mut t = Tokenizer::new(L!("2>&1"), TokFlags(0));
        let token = t.next().unwrap();
        assert_eq!(token.type_, TokenType::RedirectFd);
        assert_eq!(token.text, "2");
        assert_eq!(token.length, 3);
        let token = t.next().unwrap();
        assert_eq!(token.type_, TokenType::String);
        assert_eq!(token.text, "1");
        assert!(t.next().is_none());
    }

    #[test]
    fn test_tokenizer_ranges_reconstruct_source() {
        // For balanced input, the token ranges plus the gaps between them give back the source.
        let s = L!("echo (nested (subshell)) $foo[1] 'qu\"ot\"ed' # comment");
        let mut reconstructed = WString::new();
        let mut cursor = 0;
        for token in Tokenizer::new(s, TOK_SHOW_COMMENTS) {
            assert!(token.offset() >= cursor, "tokens must not overlap");
            reconstructed.push_utfstr(&s[cursor..token.offset()]);
            reconstructed.push_utfstr(token.get_source(s));
            cursor = token.end();
        }
        reconstructed.push_utfstr(&s[cursor..]);
        assert_eq!(reconstructed.as_utfstr(), s);
    }

    #[test]
    fn test_tokenizer_errors() {
        {
            let mut t = Tokenizer::new(L!("abc\\"), TokFlags(0));
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::Error);
            assert_eq!(token.error, TokenizerError::UnterminatedEscape);
            assert_eq!(token.error_offset_within_token, 3);
            assert!(t.next().is_none());
        }

        {
            // Unterminated quote reported at the offset of the opening quote.
            let mut t = Tokenizer::new(L!("echo 'abc"), TokFlags(0));
            let _token = t.next().unwrap();
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::Error);
            assert_eq!(token.error, TokenizerError::UnterminatedQuote);
            assert_eq!(token.offset, 5);
            assert_eq!(token.error_offset_within_token, 0);
            assert!(t.next().is_none());
        }

        {
            // With TOK_ACCEPT_UNFINISHED the same input is a plain string.
            let mut t = Tokenizer::new(L!("echo 'abc"), TOK_ACCEPT_UNFINISHED);
            let _token = t.next().unwrap();
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::String);
            assert_eq!(token.text, "'abc");
            assert_eq!(token.error, TokenizerError::None);
            assert!(t.next().is_none());
        }

        {
            // The unmatched outer paren is the reported error location.
            let mut t = Tokenizer::new(L!("(echo (ls)"), TokFlags(0));
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::Error);
            assert_eq!(token.error, TokenizerError::UnterminatedSubshell);
            assert_eq!(token.error_offset_within_token, 0);
        }

        {
            let mut t = Tokenizer::new(L!("abc defg(hij (klm)"), TokFlags(0));
            let _token = t.next().unwrap();
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::Error);
            assert_eq!(token.error, TokenizerError::UnterminatedSubshell);
            assert_eq!(token.error_offset_within_token, 4);
        }

        {
            let mut t = Tokenizer::new(L!("abc defg[hij (klm)"), TokFlags(0));
            let _token = t.next().unwrap();
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::Error);
            assert_eq!(token.error, TokenizerError::UnterminatedSlice);
            assert_eq!(token.error_offset_within_token, 4);
        }

        {
            // An overflowed fd saturates to -1 but is not a tokenizer error.
            let mut t = Tokenizer::new(L!("echo 99999999999999>foo"), TokFlags(0));
            let _token = t.next().unwrap();
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::RedirectOut);
            assert_eq!(token.text, "-1");
            let token = t.next().unwrap();
            assert_eq!(token.text, "foo");
        }

        {
            // Piping from fd 0 is a fatal error even with TOK_ACCEPT_UNFINISHED.
            let mut t = Tokenizer::new(L!("echo 0>| cat"), TOK_ACCEPT_UNFINISHED);
            let _token = t.next().unwrap();
            let token = t.next().unwrap();
            assert_eq!(token.type_, TokenType::Error);
            assert_eq!(token.error, TokenizerError::InvalidPipe);
            assert!(t.next().is_none());
        }

        {
            // Squashed errors keep the kind but drop the message.
            let mut t = Tokenizer::new(L!("abc\\"), TOK_SQUASH_ERRORS);
            let token = t.next().unwrap();
            assert_eq!(token.error, TokenizerError::UnterminatedEscape);
            assert!(token.text.is_empty());
            let mut t = Tokenizer::new(L!("abc\\"), TokFlags(0));
            let token = t.next().unwrap();
            assert!(!token.text.is_empty());
        }
    }

    #[test]
    fn test_tokenizer_comments() {
        {
            // Comments are skipped by default.
            let toks: Vec<Tok> = Tokenizer::new(L!("echo hi # comment"), TokFlags(0)).collect();
            assert_eq!(toks.len(), 2);
            assert!(toks.iter().all(|t| t.type_ == TokenType::String));
        }

        {
            // With TOK_SHOW_COMMENTS, the comment run is its own token.
            let toks: Vec<Tok> =
                Tokenizer::new(L!("echo hi # comment"), TOK_SHOW_COMMENTS).collect();
            assert_eq!(toks.len(), 3);
            assert_eq!(toks[2].type_, TokenType::Comment);
            assert_eq!(toks[2].text, "# comment");
            assert_eq!(toks[2].offset, 8);
        }

        {
            // An escaped newline continues the line past a following comment's newline.
            let toks: Vec<Tok> = Tokenizer::new(L!("echo a \\\n# comment\nb"), TokFlags(0)).collect();
            let types: Vec<TokenType> = toks.iter().map(|t| t.type_).collect();
            assert_eq!(
                types,
                vec![TokenType::String, TokenType::String, TokenType::String]
            );
            assert_eq!(toks[2].text, "b");
        }

        {
            // A hash inside a token is a string character.
            let toks: Vec<Tok> = Tokenizer::new(L!("echo a#b"), TokFlags(0)).collect();
            assert_eq!(toks.len(), 2);
            assert_eq!(toks[1].text, "a#b");
        }
    }

    #[test]
    fn test_tokenizer_blank_lines() {
        {
            // Newline runs coalesce into a single End token.
            let types: Vec<TokenType> = Tokenizer::new(L!("a\n  \n\t\n   \nb"), TokFlags(0))
                .map(|t| t.type_)
                .collect();
            assert_eq!(
                types,
                vec![TokenType::String, TokenType::End, TokenType::String]
            );
        }

        {
            // With TOK_SHOW_BLANK_LINES every terminator is returned.
            let types: Vec<TokenType> = Tokenizer::new(L!("a;\n\nb"), TOK_SHOW_BLANK_LINES)
                .map(|t| t.type_)
                .collect();
            assert_eq!(
                types,
                vec![
                    TokenType::String,
                    TokenType::End,
                    TokenType::End,
                    TokenType::End,
                    TokenType::String,
                ]
            );
        }

        {
            // Each semicolon is its own terminator; only newlines and blanks coalesce.
            let types: Vec<TokenType> = Tokenizer::new(L!("a;; b"), TokFlags(0))
                .map(|t| t.type_)
                .collect();
            assert_eq!(
                types,
                vec![
                    TokenType::String,
                    TokenType::End,
                    TokenType::End,
                    TokenType::String,
                ]
            );
        }
    }

    #[test]
    fn test_tokenizer_deeply_nested_parens() {
        // Past the bounded open-paren bookkeeping, an unterminated subshell is still reported;
        // only the offset degrades, to the start of the token.
        let src = WString::from_str(&format!("a {}b", "(".repeat(97)));
        let mut t = Tokenizer::new(&src, TokFlags(0));
        let _token = t.next().unwrap();
        let token = t.next().unwrap();
        assert_eq!(token.type_, TokenType::Error);
        assert_eq!(token.error, TokenizerError::UnterminatedSubshell);
        assert_eq!(token.offset, 2);
        assert_eq!(token.error_offset_within_token, 0);
        assert!(t.next().is_none());

        // At the cap exactly, the innermost unmatched paren is still located.
        let src = WString::from_str(&format!("a {}b", "(".repeat(96)));
        let mut t = Tokenizer::new(&src, TokFlags(0));
        let _token = t.next().unwrap();
        let token = t.next().unwrap();
        assert_eq!(token.error, TokenizerError::UnterminatedSubshell);
        assert_eq!(token.error_offset_within_token, 95);

        // Deep nesting at the very start of the source.
        let src = WString::from_str(&"(".repeat(100));
        let mut t = Tokenizer::new(&src, TokFlags(0));
        let token = t.next().unwrap();
        assert_eq!(token.error, TokenizerError::UnterminatedSubshell);
        assert_eq!(token.offset, 0);
        assert_eq!(token.error_offset_within_token, 0);
    }

    #[test]
    fn test_tokenizer_accept_unfinished() {
        // Unterminated subshells and slices terminate the token early instead of erroring.
        let mut t = Tokenizer::new(L!("(echo (ls)"), TOK_ACCEPT_UNFINISHED);
        let token = t.next().unwrap();
        assert_eq!(token.type_, TokenType::String);
        assert_eq!(token.text, "(echo (ls)");
        assert!(t.next().is_none());

        let mut t = Tokenizer::new(L!("$foo[1"), TOK_ACCEPT_UNFINISHED);
        let token = t.next().unwrap();
        assert_eq!(token.type_, TokenType::String);
        assert_eq!(token.text, "$foo[1");

        // A trailing backslash just ends the token.
        let mut t = Tokenizer::new(L!("abc\\"), TOK_ACCEPT_UNFINISHED);
        let token = t.next().unwrap();
        assert_eq!(token.type_, TokenType::String);
        assert_eq!(token.text, "abc\\");
    }

    #[test]
    fn test_pipe_or_redir() {
        macro_rules! pipe_or_redir {
            ($s:literal) => {
                PipeOrRedir::try_from(L!($s)).unwrap()
            };
        }

        assert_eq!(pipe_or_redir!("2>|").mode, TokenType::Pipe);
        assert_eq!(pipe_or_redir!("2>|").fd, 2);
        assert_eq!(pipe_or_redir!("2>|").consumed, 3);
        assert_eq!(pipe_or_redir!("0>|").fd, 0);
        assert_eq!(pipe_or_redir!(">|").fd, libc::STDOUT_FILENO);
        assert_eq!(pipe_or_redir!(">").mode, TokenType::RedirectOut);
        assert_eq!(pipe_or_redir!(">").fd, libc::STDOUT_FILENO);
        assert_eq!(pipe_or_redir!("<").mode, TokenType::RedirectIn);
        assert_eq!(pipe_or_redir!("<").fd, libc::STDIN_FILENO);
        assert_eq!(pipe_or_redir!("^").mode, TokenType::RedirectOut);
        assert_eq!(pipe_or_redir!("^").fd, libc::STDERR_FILENO);
        assert_eq!(pipe_or_redir!("^^").mode, TokenType::RedirectAppend);
        assert_eq!(pipe_or_redir!(">>").mode, TokenType::RedirectAppend);
        assert_eq!(pipe_or_redir!("2>").fd, 2);
        assert_eq!(pipe_or_redir!("2>&").mode, TokenType::RedirectFd);
        assert_eq!(pipe_or_redir!("2>&").consumed, 3);
        assert_eq!(pipe_or_redir!(">?").mode, TokenType::RedirectNoclob);
        assert_eq!(pipe_or_redir!("9999999999999>").fd, -1);

        // A bare pipe is not handled by the scanner.
        assert!(PipeOrRedir::try_from(L!("|")).is_err());
        // An explicit fd is not allowed before a caret (#1873).
        assert!(PipeOrRedir::try_from(L!("2^")).is_err());
        // Not redirections at all.
        assert!(PipeOrRedir::try_from(L!("abc")).is_err());
        assert!(PipeOrRedir::try_from(L!("123")).is_err());
        assert!(PipeOrRedir::try_from(L!("")).is_err());
    }

    #[test]
    fn test_redirection_type_for_string() {
        assert_eq!(
            redirection_type_for_string(L!("2>")),
            Some((TokenType::RedirectOut, 2))
        );
        assert_eq!(
            redirection_type_for_string(L!("2>&")),
            Some((TokenType::RedirectFd, 2))
        );
        assert_eq!(
            redirection_type_for_string(L!("^")),
            Some((TokenType::RedirectOut, 2))
        );
        // Pipes and overflows only decode as Nothing.
        assert_eq!(redirection_type_for_string(L!("2>|")), None);
        assert_eq!(redirection_type_for_string(L!("9999999999999>")), None);
        assert_eq!(redirection_type_for_string(L!("abc")), None);
    }

    #[test]
    fn test_fd_redirected_by_pipe() {
        assert_eq!(fd_redirected_by_pipe(L!("|")), libc::STDOUT_FILENO);
        assert_eq!(fd_redirected_by_pipe(L!("2>|")), 2);
        assert_eq!(fd_redirected_by_pipe(L!(">|")), 1);
        assert_eq!(fd_redirected_by_pipe(L!("2>")), -1);
        assert_eq!(fd_redirected_by_pipe(L!("abc")), -1);
        assert_eq!(fd_redirected_by_pipe(L!("9999999999999>|")), -1);
    }

    #[test]
    fn test_tok_first() {
        assert_eq!(tok_first(L!("echo hi > /dev/null")), "echo");
        assert_eq!(tok_first(L!("  ls")), "ls");
        assert_eq!(tok_first(L!("| cat")), "");
        assert_eq!(tok_first(L!("")), "");
    }
}
