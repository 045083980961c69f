//! Hand-written scanner.
//!
//! Tokens carry byte spans into the source plus 1-based line/column of
//! their first character. String and backtick tokens span the whole
//! literal; their contents are re-processed at AST construction through
//! `exclaim_ast::literal`, so the scanner only needs to find their extent.

use std::sync::Arc;

use exclaim_ast::literal::{self, StringError};
use exclaim_common::{Diagnostic, ErrorKind, SourceInfo};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    Str,
    JsEscape,

    // Keywords
    Import,
    From,
    Data,
    Temp,
    Group,
    Command,
    Function,
    On,
    Set,
    To,
    For,
    Each,
    In,
    While,
    If,
    Then,
    Else,
    Fail,
    Pick,
    Parse,
    As,
    Send,
    React,
    With,
    Is,
    Not,
    Of,
    And,
    Or,
    True,
    False,
    Add,
    Remove,
    Get,
    Size,

    // Punctuation
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Colon,
    Semicolon,
    Equals,
    EqualsEquals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    Plus,
    Minus,
    Star,
    Slash,
    Ellipsis,

    Eof,
}

#[derive(Copy, Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

fn keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "data" => TokenKind::Data,
        "temp" => TokenKind::Temp,
        "group" => TokenKind::Group,
        "command" => TokenKind::Command,
        "function" => TokenKind::Function,
        "on" => TokenKind::On,
        "set" => TokenKind::Set,
        "to" => TokenKind::To,
        "for" => TokenKind::For,
        "each" => TokenKind::Each,
        "in" => TokenKind::In,
        "while" => TokenKind::While,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "fail" => TokenKind::Fail,
        "pick" => TokenKind::Pick,
        "parse" => TokenKind::Parse,
        "as" => TokenKind::As,
        "send" => TokenKind::Send,
        "react" => TokenKind::React,
        "with" => TokenKind::With,
        "is" => TokenKind::Is,
        "not" => TokenKind::Not,
        "of" => TokenKind::Of,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "add" => TokenKind::Add,
        "remove" => TokenKind::Remove,
        "get" => TokenKind::Get,
        "size" => TokenKind::Size,
        _ => return None,
    })
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct Scanner<'a> {
    source: &'a str,
    file: Arc<str>,
    pos: usize,
    line: u32,
    column: u32,
}

/// Tokenize a source file. Lexical failure is fatal: the first error is
/// returned and no tokens are produced.
pub fn scan(source: &str, file: Arc<str>) -> Result<Vec<Token>, Diagnostic> {
    let mut scanner = Scanner {
        source,
        file,
        pos: 0,
        line: 1,
        column: 1,
    };
    scanner.run()
}

impl<'a> Scanner<'a> {
    fn run(&mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.column);
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    start,
                    end: start,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let kind = if is_identifier_start(c) {
                self.advance();
                while self.peek().is_some_and(is_identifier_part) {
                    self.advance();
                }
                let text = &self.source[start..self.pos];
                keyword(text).unwrap_or(TokenKind::Identifier)
            } else if c.is_ascii_digit() {
                self.scan_number();
                TokenKind::Number
            } else if c == '"' {
                self.scan_string(line, column)?;
                TokenKind::Str
            } else if c == '`' {
                self.scan_js_escape(line, column)?;
                TokenKind::JsEscape
            } else {
                self.scan_punctuation(line, column)?
            };

            tokens.push(Token {
                kind,
                start,
                end: self.pos,
                line,
                column,
            });
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_number(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' || c == '.' {
                self.advance();
            } else if c == 'e' || c == 'E' {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn scan_string(&mut self, line: u32, column: u32) -> Result<(), Diagnostic> {
        let rest = &self.source[self.pos..];
        match literal::scan_string(rest, column.saturating_sub(1)) {
            Ok(scanned) => {
                for _ in rest[..scanned.len].chars() {
                    self.advance();
                }
                Ok(())
            }
            Err(StringError::Unterminated) => Err(self.error(line, column, "unterminated string")),
            Err(StringError::UnterminatedEmbedded) => Err(self.error(
                line,
                column,
                "unterminated embedded JavaScript fragment in string (escape literal braces as \\{)",
            )),
        }
    }

    fn scan_js_escape(&mut self, line: u32, column: u32) -> Result<(), Diagnostic> {
        self.advance(); // opening backtick
        loop {
            match self.peek() {
                None => return Err(self.error(line, column, "unterminated JavaScript escape")),
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some('`') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn scan_punctuation(&mut self, line: u32, column: u32) -> Result<TokenKind, Diagnostic> {
        let c = self.peek().expect("caller checked for end of input");
        let kind = match c {
            '{' => TokenKind::OpenBrace,
            '}' => TokenKind::CloseBrace,
            '[' => TokenKind::OpenBracket,
            ']' => TokenKind::CloseBracket,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => {
                if self.peek_at(1) == Some('=') {
                    self.advance();
                    TokenKind::EqualsEquals
                } else {
                    TokenKind::Equals
                }
            }
            '!' => {
                if self.peek_at(1) == Some('=') {
                    self.advance();
                    TokenKind::NotEquals
                } else {
                    return Err(self.error(line, column, "unexpected character `!`"));
                }
            }
            '<' => {
                if self.peek_at(1) == Some('=') {
                    self.advance();
                    TokenKind::LessEquals
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.peek_at(1) == Some('=') {
                    self.advance();
                    TokenKind::GreaterEquals
                } else {
                    TokenKind::Greater
                }
            }
            '.' => {
                if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    return Err(self.error(line, column, "unexpected character `.`"));
                }
            }
            other => {
                return Err(self.error(line, column, format!("unexpected character `{other}`")));
            }
        };
        self.advance();
        Ok(kind)
    }

    fn error(&self, line: u32, column: u32, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(
            ErrorKind::Lex,
            SourceInfo::new(self.file.clone(), line, column),
            message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source, Arc::from("test.exclm"))
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        assert_eq!(
            kinds("command greet name { send name }"),
            vec![
                TokenKind::Command,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::OpenBrace,
                TokenKind::Send,
                TokenKind::Identifier,
                TokenKind::CloseBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_operators_and_rest_markers() {
        assert_eq!(
            kinds("... == != <= >= = < >"),
            vec![
                TokenKind::Ellipsis,
                TokenKind::EqualsEquals,
                TokenKind::NotEquals,
                TokenKind::LessEquals,
                TokenKind::GreaterEquals,
                TokenKind::Equals,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_tokens_span_embedded_fragments() {
        let source = r#"send "You got {score} points!""#;
        let tokens = scan(source, Arc::from("t.exclm")).unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].text(source), r#""You got {score} points!""#);
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = scan("send x\n  send y", Arc::from("t.exclm")).unwrap();
        let second_send = &tokens[2];
        assert_eq!((second_send.line, second_send.column), (2, 3));
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(
            kinds("fail // not parsed: \"unterminated\n fail"),
            vec![TokenKind::Fail, TokenKind::Fail, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = scan("send \"oops", Arc::from("t.exclm")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
    }
}
