//! Tokenizer for configuration files and expression strings.
//!
//! The scanner produces a flat stream of [`Token`]s with one token of
//! lookahead. It remembers the last consumed token, which the value expression
//! reader needs to decide whether an identifier continues the current value or
//! starts the next directive.
//!
//! Lexical rules:
//! - whitespace, `# ...` line comments and `/* ... */` block comments are skipped;
//! - identifiers are `[A-Za-z_$][A-Za-z0-9_$]*`; in config mode, identifiers that
//!   name a [`Keyword`] (ignoring case) become keyword tokens;
//! - every number is lexed as a float (`12`, `1.5`, `.5`, `2e3`, `0x1f`);
//! - `"..."` strings understand backslash escapes, `'...'` strings are raw;
//! - any other character is returned as a single-character token.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{Error, Keyword, error::excerpt_at};

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// End of input.
    Eof,
    /// Bare word that is not a keyword.
    Identifier(String),
    /// Quoted string with escapes already resolved.
    String(String),
    /// Any numeric literal.
    Float(f64),
    /// Reserved directive word (config mode only).
    Keyword(Keyword),
    /// Any other single character.
    Char(char),
}

impl Token {
    /// True when this token is the punctuation character `c`.
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Self::Char(t) if *t == c)
    }

    /// Word text for identifiers and keywords.
    pub fn word(&self) -> Option<&str> {
        match self {
            Self::Identifier(s) => Some(s),
            Self::Keyword(kw) => Some(kw.name()),
            _ => None,
        }
    }

    /// Keyword symbols sit above the threshold that value expressions accept.
    pub fn is_keyword(&self) -> bool {
        matches!(self, Self::Keyword(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => f.write_str("end of file"),
            Self::Identifier(s) => write!(f, "identifier '{}'", s),
            Self::String(s) => write!(f, "string \"{}\"", s),
            Self::Float(v) => write!(f, "number {}", v),
            Self::Keyword(kw) => write!(f, "keyword '{}'", kw),
            Self::Char(c) => write!(f, "'{}'", c),
        }
    }
}

/// A token together with the location of its first character.
#[derive(Debug, Clone)]
struct Spanned {
    /// The token itself.
    token: Token,
    /// 1-based line.
    line: usize,
    /// 1-based column.
    col: usize,
}

/// Streaming tokenizer with single-token lookahead.
pub struct Scanner<'a> {
    /// Full source text, kept for error excerpts.
    source: &'a str,
    /// Byte offset of the next unread character.
    offset: usize,
    /// Current 1-based line.
    line: usize,
    /// Current 1-based column.
    col: usize,
    /// Whether identifiers are checked against the keyword table.
    keywords: bool,
    /// Path of the file being scanned, for diagnostics.
    path: Option<PathBuf>,
    /// Token produced by `peek` and not yet consumed.
    peeked: Option<Spanned>,
    /// Most recently consumed token.
    last: Spanned,
}

impl<'a> Scanner<'a> {
    /// Scanner for expression strings: keywords are plain identifiers.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            col: 1,
            keywords: false,
            path: None,
            peeked: None,
            last: Spanned {
                token: Token::Eof,
                line: 1,
                col: 1,
            },
        }
    }

    /// Scanner for configuration files, recognising directive keywords.
    pub fn for_config(source: &'a str, path: Option<&Path>) -> Self {
        let mut scanner = Self::new(source);
        scanner.keywords = true;
        scanner.path = path.map(Path::to_path_buf);
        scanner
    }

    /// Path of the file being scanned, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Result<&Token, Error> {
        let sp = match self.peeked.take() {
            Some(sp) => sp,
            None => self.lex()?,
        };
        Ok(&self.peeked.insert(sp).token)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token, Error> {
        let sp = match self.peeked.take() {
            Some(sp) => sp,
            None => self.lex()?,
        };
        let token = sp.token.clone();
        self.last = sp;
        Ok(token)
    }

    /// The most recently consumed token (`Eof` before the first).
    pub fn last(&self) -> &Token {
        &self.last.token
    }

    /// Consume the next token when it is `c`. Returns whether it was consumed.
    pub fn eat_char(&mut self, c: char) -> Result<bool, Error> {
        if self.peek()?.is_char(c) {
            self.next_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Swallow a `;` if one follows.
    pub fn optional_semicolon(&mut self) -> Result<(), Error> {
        self.eat_char(';').map(|_| ())
    }

    /// Location of the token an error should point at: the pending lookahead
    /// when there is one, otherwise the last consumed token.
    pub fn position(&self) -> (usize, usize) {
        match &self.peeked {
            Some(sp) => (sp.line, sp.col),
            None => (self.last.line, self.last.col),
        }
    }

    /// Build a parse error located at [`Self::position`].
    pub fn error(&self, message: impl Into<String>) -> Error {
        let (line, col) = self.position();
        self.error_at(line, col, message.into())
    }

    /// Build a parse error at an explicit location.
    fn error_at(&self, line: usize, col: usize, message: String) -> Error {
        Error::Parse {
            path: self.path.clone(),
            line,
            col,
            message,
            excerpt: excerpt_at(self.source, line, col),
        }
    }

    /// Character at the read position.
    fn cur(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    /// Character one past the read position.
    fn ahead(&self) -> Option<char> {
        let mut it = self.source[self.offset..].chars();
        it.next();
        it.next()
    }

    /// Advance past one character, tracking line and column.
    fn bump(&mut self) -> Option<char> {
        let c = self.cur()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), Error> {
        loop {
            match (self.cur(), self.ahead()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('#'), _) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let (line, col) = (self.line, self.col);
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.cur() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.error_at(
                                    line,
                                    col,
                                    "unterminated comment".to_string(),
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Produce the next token from the source.
    fn lex(&mut self) -> Result<Spanned, Error> {
        self.skip_trivia()?;
        let (line, col) = (self.line, self.col);
        let token = match self.cur() {
            None => Token::Eof,
            Some(c) if is_ident_first(c) => self.lex_word(),
            Some(c) if c.is_ascii_digit() => self.lex_number(line, col)?,
            Some('.') if self.ahead().is_some_and(|c| c.is_ascii_digit()) => {
                self.lex_number(line, col)?
            }
            Some('"') => self.lex_dq_string(line, col)?,
            Some('\'') => self.lex_sq_string(line, col)?,
            Some(c) => {
                self.bump();
                Token::Char(c)
            }
        };
        Ok(Spanned { token, line, col })
    }

    /// Identifier or keyword.
    fn lex_word(&mut self) -> Token {
        let start = self.offset;
        while self.cur().is_some_and(is_ident_nth) {
            self.bump();
        }
        let word = &self.source[start..self.offset];
        if self.keywords
            && let Some(kw) = Keyword::lookup(word)
        {
            return Token::Keyword(kw);
        }
        Token::Identifier(word.to_string())
    }

    /// Decimal or hexadecimal literal, always as a float.
    fn lex_number(&mut self, line: usize, col: usize) -> Result<Token, Error> {
        let start = self.offset;
        if self.cur() == Some('0')
            && matches!(self.ahead(), Some('x' | 'X'))
            && self.source[self.offset + 2..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.bump();
            self.bump();
            let digits = self.offset;
            while self.cur().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            return u64::from_str_radix(&self.source[digits..self.offset], 16)
                .map(|v| Token::Float(v as f64))
                .map_err(|e| self.error_at(line, col, format!("invalid number: {}", e)));
        }

        while self.cur().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.cur() == Some('.') {
            self.bump();
            while self.cur().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.cur(), Some('e' | 'E')) {
            let rest = &self.source[self.offset + 1..];
            let mut it = rest.chars();
            let exp_ok = match it.next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => it.next().is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if exp_ok {
                self.bump();
                if matches!(self.cur(), Some('+' | '-')) {
                    self.bump();
                }
                while self.cur().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        self.source[start..self.offset]
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|e| self.error_at(line, col, format!("invalid number: {}", e)))
    }

    /// Double-quoted string with escapes.
    fn lex_dq_string(&mut self, line: usize, col: usize) -> Result<Token, Error> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error_at(line, col, "unterminated string".to_string())),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None => {
                        return Err(self.error_at(line, col, "unterminated string".to_string()));
                    }
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('b') => out.push('\u{8}'),
                    Some('f') => out.push('\u{c}'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(d @ '0'..='7') => {
                        let mut code = d.to_digit(8).unwrap_or(0);
                        for _ in 0..2 {
                            match self.cur().and_then(|c| c.to_digit(8)) {
                                Some(v) => {
                                    code = code * 8 + v;
                                    self.bump();
                                }
                                None => break,
                            }
                        }
                        out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                    }
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                Some(c) => out.push(c),
            }
        }
        Ok(Token::String(out))
    }

    /// Single-quoted raw string.
    fn lex_sq_string(&mut self, line: usize, col: usize) -> Result<Token, Error> {
        self.bump();
        let start = self.offset;
        loop {
            match self.cur() {
                None => return Err(self.error_at(line, col, "unterminated string".to_string())),
                Some('\'') => break,
                Some(_) => {
                    self.bump();
                }
            }
        }
        let text = self.source[start..self.offset].to_string();
        self.bump();
        Ok(Token::String(text))
    }
}

/// First character of an identifier.
fn is_ident_first(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

/// Subsequent identifier characters.
fn is_ident_nth(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
