use std::fmt;
use std::str::Chars;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Identifier(String),
    Keyword(Keyword),

    NumericLiteral(f64),
    /// `010`-style literal; the parser rejects it in strict code.
    LegacyOctalLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,

    LeftBrace,          // {
    RightBrace,         // }
    LeftParen,          // (
    RightParen,         // )
    LeftBracket,        // [
    RightBracket,       // ]
    Dot,                // .
    Ellipsis,           // ...
    Semicolon,          // ;
    Comma,              // ,
    LessThan,           // <
    GreaterThan,        // >
    LessThanEqual,      // <=
    GreaterThanEqual,   // >=
    Equal,              // ==
    NotEqual,           // !=
    StrictEqual,        // ===
    StrictNotEqual,     // !==
    Plus,               // +
    Minus,              // -
    Star,               // *
    Slash,              // /
    Percent,            // %
    Increment,          // ++
    Decrement,          // --
    Bang,               // !
    LogicalAnd,         // &&
    LogicalOr,          // ||
    NullishCoalescing,  // ??
    Question,           // ?
    Colon,              // :
    Hash,               // #
    Assign,             // =
    PlusAssign,         // +=
    MinusAssign,        // -=
    StarAssign,         // *=
    SlashAssign,        // /=
    PercentAssign,      // %=
    LogicalAndAssign,   // &&=
    LogicalOrAssign,    // ||=
    NullishAssign,      // ??=
    Arrow,              // =>

    LineTerminator,
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Async,
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Return,
    Static,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("async", Keyword::Async),
    ("await", Keyword::Await),
    ("break", Keyword::Break),
    ("case", Keyword::Case),
    ("catch", Keyword::Catch),
    ("class", Keyword::Class),
    ("const", Keyword::Const),
    ("continue", Keyword::Continue),
    ("debugger", Keyword::Debugger),
    ("default", Keyword::Default),
    ("delete", Keyword::Delete),
    ("do", Keyword::Do),
    ("else", Keyword::Else),
    ("enum", Keyword::Enum),
    ("export", Keyword::Export),
    ("extends", Keyword::Extends),
    ("finally", Keyword::Finally),
    ("for", Keyword::For),
    ("function", Keyword::Function),
    ("if", Keyword::If),
    ("import", Keyword::Import),
    ("in", Keyword::In),
    ("instanceof", Keyword::Instanceof),
    ("let", Keyword::Let),
    ("new", Keyword::New),
    ("return", Keyword::Return),
    ("static", Keyword::Static),
    ("super", Keyword::Super),
    ("switch", Keyword::Switch),
    ("this", Keyword::This),
    ("throw", Keyword::Throw),
    ("try", Keyword::Try),
    ("typeof", Keyword::Typeof),
    ("var", Keyword::Var),
    ("void", Keyword::Void),
    ("while", Keyword::While),
    ("with", Keyword::With),
    ("yield", Keyword::Yield),
];

impl Keyword {
    pub fn lookup(s: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find_map(|(text, kw)| (*text == s).then_some(*kw))
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find_map(|(text, kw)| (*kw == self).then_some(*text))
            .unwrap_or("")
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{}:{}: {message}", location.line, location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

pub struct Lexer<'a> {
    chars: Chars<'a>,
    current: Option<char>,
    offset: usize,
    token_start: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            chars,
            current,
            offset: 0,
            token_start: 0,
            line: 1,
            column: 0,
        }
    }

    /// Byte offset of the first character of the most recently returned token.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Byte offset just past the most recently returned token.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current;
        if let Some(c) = ch {
            self.offset += c.len_utf8();
            self.column += 1;
            self.current = self.chars.next();
        }
        ch
    }

    fn eat_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            location: SourceLocation {
                line: self.line,
                column: self.column,
                offset: self.offset,
            },
        }
    }

    fn is_line_terminator(ch: char) -> bool {
        matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    fn is_whitespace(ch: char) -> bool {
        matches!(ch, '\t' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}')
            || ch.is_whitespace() && !Self::is_line_terminator(ch)
    }

    fn is_identifier_start(ch: char) -> bool {
        ch == '_'
            || ch == '$'
            || ch.is_ascii_alphabetic()
            || (!ch.is_ascii() && unicode_ident::is_xid_start(ch))
    }

    fn is_identifier_continue(ch: char) -> bool {
        ch == '_'
            || ch == '$'
            || ch.is_ascii_alphanumeric()
            || ch == '\u{200C}'
            || ch == '\u{200D}'
            || (!ch.is_ascii() && unicode_ident::is_xid_continue(ch))
    }

    fn handle_newline(&mut self, ch: char) {
        if ch == '\r' && self.peek() == Some('\n') {
            self.advance();
        }
        self.line += 1;
        self.column = 0;
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if Self::is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    /// Returns whether the comment spanned a line terminator.
    fn skip_block_comment(&mut self) -> Result<bool, LexError> {
        let mut crossed_line = false;
        loop {
            match self.advance() {
                Some('*') if self.eat_if('/') => return Ok(crossed_line),
                Some(ch) if Self::is_line_terminator(ch) => {
                    crossed_line = true;
                    self.handle_newline(ch);
                }
                Some(_) => {}
                None => return Err(self.error("Unterminated block comment")),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            while self.peek().is_some_and(Self::is_whitespace) {
                self.advance();
            }
            self.token_start = self.offset;

            let Some(ch) = self.peek() else {
                return Ok(Token::Eof);
            };

            if Self::is_line_terminator(ch) {
                self.advance();
                self.handle_newline(ch);
                return Ok(Token::LineTerminator);
            }

            if ch == '/' && self.peek_next() == Some('/') {
                self.skip_line_comment();
                continue;
            }
            if ch == '/' && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                if self.skip_block_comment()? {
                    return Ok(Token::LineTerminator);
                }
                continue;
            }
            if ch == '#' && self.offset == 0 && self.peek_next() == Some('!') {
                self.skip_line_comment();
                continue;
            }

            self.advance();

            if ch == '\'' || ch == '"' {
                return self.read_string(ch).map(Token::StringLiteral);
            }
            if ch == '`' {
                return Err(self.error("Template literals are not supported"));
            }
            if ch.is_ascii_digit() || (ch == '.' && self.peek().is_some_and(|c| c.is_ascii_digit()))
            {
                return self.read_numeric_literal(ch);
            }
            if Self::is_identifier_start(ch) || ch == '\\' {
                return self.read_identifier(ch);
            }
            return self.read_punctuator(ch);
        }
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("Unterminated string literal")),
                Some(ch) if ch == quote => return Ok(s),
                Some(ch) if Self::is_line_terminator(ch) => {
                    return Err(self.error("Unterminated string literal"));
                }
                Some('\\') => self.read_escape_sequence(&mut s)?,
                Some(ch) => s.push(ch),
            }
        }
    }

    fn read_escape_sequence(&mut self, out: &mut String) -> Result<(), LexError> {
        let Some(ch) = self.advance() else {
            return Err(self.error("Unterminated escape sequence"));
        };
        match ch {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let value = self.read_hex_digits(2)?;
                out.push(self.code_point(value)?);
            }
            'u' => {
                let c = self.read_unicode_escape()?;
                out.push(c);
            }
            c if Self::is_line_terminator(c) => self.handle_newline(c),
            c => out.push(c),
        }
        Ok(())
    }

    fn read_hex_digits(&mut self, count: usize) -> Result<u32, LexError> {
        let mut value = 0;
        for _ in 0..count {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid hexadecimal escape sequence"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn code_point(&self, value: u32) -> Result<char, LexError> {
        char::from_u32(value).ok_or_else(|| self.error("Invalid Unicode code point"))
    }

    fn read_unicode_escape(&mut self) -> Result<char, LexError> {
        if !self.eat_if('{') {
            let value = self.read_hex_digits(4)?;
            return self.code_point(value);
        }
        let mut value: u32 = 0;
        let mut digits = 0;
        loop {
            match self.advance() {
                Some('}') if digits > 0 => return self.code_point(value),
                Some(c) if c.is_ascii_hexdigit() => {
                    value = value * 16 + c.to_digit(16).unwrap_or(0);
                    if value > 0x10FFFF {
                        return Err(self.error("Unicode code point out of range"));
                    }
                    digits += 1;
                }
                _ => return Err(self.error("Invalid Unicode escape sequence")),
            }
        }
    }

    fn read_numeric_literal(&mut self, first: char) -> Result<Token, LexError> {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                return self.read_radix_literal(radix);
            }
        }

        let mut s = String::new();
        s.push(first);
        if first == '0' && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return self.read_legacy_octal_or_decimal(s);
        }
        self.read_decimal_digits(&mut s);
        self.read_decimal_tail(s)
    }

    fn read_legacy_octal_or_decimal(&mut self, mut s: String) -> Result<Token, LexError> {
        let mut is_octal = true;
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            is_octal &= ch < '8';
            s.push(ch);
            self.advance();
        }
        if !is_octal {
            // 08, 09.5: decimal with a redundant leading zero
            return self.read_decimal_tail(s);
        }
        if self.peek().is_some_and(Self::is_identifier_start) {
            return Err(self.error("Identifier starts immediately after numeric literal"));
        }
        let value = s
            .chars()
            .filter_map(|c| c.to_digit(8))
            .fold(0f64, |acc, d| acc * 8.0 + f64::from(d));
        Ok(Token::LegacyOctalLiteral(value))
    }

    fn read_decimal_tail(&mut self, mut s: String) -> Result<Token, LexError> {
        if !s.starts_with('.') && self.peek() == Some('.') {
            s.push('.');
            self.advance();
            self.read_decimal_digits(&mut s);
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            s.push(e);
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                s.push(sign);
                self.advance();
            }
            self.read_decimal_digits(&mut s);
        }
        if self.peek() == Some('n') {
            return Err(self.error("BigInt literals are not supported"));
        }
        if self.peek().is_some_and(Self::is_identifier_start) {
            return Err(self.error("Identifier starts immediately after numeric literal"));
        }

        let clean: String = s.chars().filter(|&c| c != '_').collect();
        clean
            .parse::<f64>()
            .map(Token::NumericLiteral)
            .map_err(|_| self.error("Invalid numeric literal"))
    }

    fn read_decimal_digits(&mut self, s: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_radix_literal(&mut self, radix: u32) -> Result<Token, LexError> {
        let mut value = 0f64;
        let mut digits = 0;
        while let Some(ch) = self.peek() {
            if ch == '_' {
                self.advance();
                continue;
            }
            let Some(d) = ch.to_digit(radix) else {
                break;
            };
            value = value * f64::from(radix) + f64::from(d);
            digits += 1;
            self.advance();
        }
        if digits == 0 {
            return Err(self.error("Missing digits after radix prefix"));
        }
        if self.peek() == Some('n') {
            return Err(self.error("BigInt literals are not supported"));
        }
        Ok(Token::NumericLiteral(value))
    }

    fn read_identifier(&mut self, first: char) -> Result<Token, LexError> {
        let mut name = String::new();
        let mut escaped = false;
        if first == '\\' {
            escaped = true;
            name.push(self.read_identifier_escape()?);
        } else {
            name.push(first);
        }
        while let Some(ch) = self.peek() {
            if Self::is_identifier_continue(ch) {
                name.push(ch);
                self.advance();
            } else if ch == '\\' {
                self.advance();
                escaped = true;
                name.push(self.read_identifier_escape()?);
            } else {
                break;
            }
        }

        // Escaped keywords are plain identifiers for property-name purposes.
        if escaped {
            return Ok(Token::Identifier(name));
        }
        Ok(match name.as_str() {
            "true" => Token::BooleanLiteral(true),
            "false" => Token::BooleanLiteral(false),
            "null" => Token::NullLiteral,
            _ => match Keyword::lookup(&name) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(name),
            },
        })
    }

    fn read_identifier_escape(&mut self) -> Result<char, LexError> {
        if self.advance() != Some('u') {
            return Err(self.error("Invalid escape in identifier"));
        }
        self.read_unicode_escape()
    }

    fn read_punctuator(&mut self, ch: char) -> Result<Token, LexError> {
        let token = match ch {
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '#' => Token::Hash,
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    Token::Ellipsis
                } else {
                    Token::Dot
                }
            }
            '?' => {
                if self.eat_if('?') {
                    if self.eat_if('=') {
                        Token::NullishAssign
                    } else {
                        Token::NullishCoalescing
                    }
                } else {
                    Token::Question
                }
            }
            '<' => {
                if self.eat_if('=') {
                    Token::LessThanEqual
                } else {
                    Token::LessThan
                }
            }
            '>' => {
                if self.eat_if('=') {
                    Token::GreaterThanEqual
                } else {
                    Token::GreaterThan
                }
            }
            '=' => {
                if self.eat_if('=') {
                    if self.eat_if('=') {
                        Token::StrictEqual
                    } else {
                        Token::Equal
                    }
                } else if self.eat_if('>') {
                    Token::Arrow
                } else {
                    Token::Assign
                }
            }
            '!' => {
                if self.eat_if('=') {
                    if self.eat_if('=') {
                        Token::StrictNotEqual
                    } else {
                        Token::NotEqual
                    }
                } else {
                    Token::Bang
                }
            }
            '+' => {
                if self.eat_if('+') {
                    Token::Increment
                } else if self.eat_if('=') {
                    Token::PlusAssign
                } else {
                    Token::Plus
                }
            }
            '-' => {
                if self.eat_if('-') {
                    Token::Decrement
                } else if self.eat_if('=') {
                    Token::MinusAssign
                } else {
                    Token::Minus
                }
            }
            '*' => {
                if self.eat_if('=') {
                    Token::StarAssign
                } else {
                    Token::Star
                }
            }
            '/' => {
                if self.eat_if('=') {
                    Token::SlashAssign
                } else {
                    Token::Slash
                }
            }
            '%' => {
                if self.eat_if('=') {
                    Token::PercentAssign
                } else {
                    Token::Percent
                }
            }
            '&' if self.eat_if('&') => {
                if self.eat_if('=') {
                    Token::LogicalAndAssign
                } else {
                    Token::LogicalAnd
                }
            }
            '|' if self.eat_if('|') => {
                if self.eat_if('=') {
                    Token::LogicalOrAssign
                } else {
                    Token::LogicalOr
                }
            }
            _ => return Err(self.error(format!("Unexpected character: {ch}"))),
        };
        Ok(token)
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_no_lt(src: &str) -> Vec<Token> {
        Lexer::new(src)
            .tokenize_all()
            .unwrap()
            .into_iter()
            .filter(|t| !matches!(t, Token::LineTerminator))
            .collect()
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex_no_lt(""), vec![Token::Eof]);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            lex_no_lt("let f = function() {};"),
            vec![
                Token::Keyword(Keyword::Let),
                Token::Identifier("f".into()),
                Token::Assign,
                Token::Keyword(Keyword::Function),
                Token::LeftParen,
                Token::RightParen,
                Token::LeftBrace,
                Token::RightBrace,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn get_and_set_are_identifiers() {
        assert_eq!(
            lex_no_lt("get set"),
            vec![
                Token::Identifier("get".into()),
                Token::Identifier("set".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn escaped_keyword_is_identifier() {
        assert_eq!(
            lex_no_lt(r"\u0063lass"),
            vec![Token::Identifier("class".into()), Token::Eof]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            lex_no_lt(r"'he\nllo' '\x41\u{1F600}'"),
            vec![
                Token::StringLiteral("he\nllo".into()),
                Token::StringLiteral("A\u{1F600}".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(
            lex_no_lt("42 4.2 .5 0xff 0b1010 0o17 1_000 1e3"),
            vec![
                Token::NumericLiteral(42.0),
                Token::NumericLiteral(4.2),
                Token::NumericLiteral(0.5),
                Token::NumericLiteral(255.0),
                Token::NumericLiteral(10.0),
                Token::NumericLiteral(15.0),
                Token::NumericLiteral(1000.0),
                Token::NumericLiteral(1000.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn legacy_octal_literals() {
        assert_eq!(
            lex_no_lt("010 0777 08 09.5 0"),
            vec![
                Token::LegacyOctalLiteral(8.0),
                Token::LegacyOctalLiteral(511.0),
                Token::NumericLiteral(8.0),
                Token::NumericLiteral(9.5),
                Token::NumericLiteral(0.0),
                Token::Eof,
            ]
        );
        assert!(Lexer::new("017n").tokenize_all().is_err());
    }

    #[test]
    fn bigint_is_rejected() {
        assert!(Lexer::new("42n").tokenize_all().is_err());
    }

    #[test]
    fn punctuators() {
        assert_eq!(
            lex_no_lt("=== => ... ??= ||= &&= #"),
            vec![
                Token::StrictEqual,
                Token::Arrow,
                Token::Ellipsis,
                Token::NullishAssign,
                Token::LogicalOrAssign,
                Token::LogicalAndAssign,
                Token::Hash,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_line_terminators() {
        let tokens = Lexer::new("a // x\n/* multi\nline */ b /* same */ c")
            .tokenize_all()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a".into()),
                Token::LineTerminator,
                Token::LineTerminator,
                Token::Identifier("b".into()),
                Token::Identifier("c".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn token_offsets() {
        let mut lexer = Lexer::new("  foo(");
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("foo".into()));
        assert_eq!((lexer.token_start(), lexer.offset()), (2, 5));
        assert_eq!(lexer.next_token().unwrap(), Token::LeftParen);
        assert_eq!((lexer.token_start(), lexer.offset()), (5, 6));
    }

    #[test]
    fn error_reports_location() {
        let err = Lexer::new("a\n  @").tokenize_all().unwrap_err();
        assert_eq!(err.location.line, 2);
        assert_eq!(err.to_string(), "2:3: Unexpected character: @");
    }
}
