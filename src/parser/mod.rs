use crate::ast::*;
use crate::lexer::{Keyword, LexError, Lexer, Token};

mod declarations;
mod expressions;
mod statements;

#[derive(Clone, Debug, thiserror::Error)]
#[error("SyntaxError: {message}")]
pub struct ParseError {
    pub message: String,
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            message: e.to_string(),
        }
    }
}

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    current_token_start: usize,
    current_token_end: usize,
    prev_token_end: usize,
    prev_line_terminator: bool,
    pushback: Option<(Token, bool, usize, usize)>, // (token, had_line_terminator_before, token_start, token_end)
    in_function: u32,
    in_generator: bool,
    in_async: bool,
    in_class_constructor: bool,
    strict: bool,
}

/// Parses a whole script.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source)?.parse_program()
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let mut had_lt = false;
        let current = loop {
            let tok = lexer.next_token()?;
            if tok == Token::LineTerminator {
                had_lt = true;
                continue;
            }
            break tok;
        };
        let token_start = lexer.token_start();
        let token_end = lexer.offset();
        Ok(Self {
            source,
            lexer,
            current,
            current_token_start: token_start,
            current_token_end: token_end,
            prev_token_end: 0,
            prev_line_terminator: had_lt,
            pushback: None,
            in_function: 0,
            in_generator: false,
            in_async: false,
            in_class_constructor: false,
            strict: false,
        })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        self.prev_token_end = self.current_token_end;
        let old = std::mem::replace(&mut self.current, Token::Eof);
        if let Some((tok, lt, ts, te)) = self.pushback.take() {
            self.current = tok;
            self.prev_line_terminator = lt;
            self.current_token_start = ts;
            self.current_token_end = te;
        } else {
            self.prev_line_terminator = false;
            loop {
                let tok = self.lexer.next_token()?;
                if tok == Token::LineTerminator {
                    self.prev_line_terminator = true;
                    continue;
                }
                self.current_token_start = self.lexer.token_start();
                self.current_token_end = self.lexer.offset();
                self.current = tok;
                break;
            }
        }
        Ok(old)
    }

    fn push_back(&mut self, token: Token, had_lt: bool, start: usize, end: usize) {
        let old_current = std::mem::replace(&mut self.current, token);
        let old_lt = std::mem::replace(&mut self.prev_line_terminator, had_lt);
        let old_ts = std::mem::replace(&mut self.current_token_start, start);
        let old_te = std::mem::replace(&mut self.current_token_end, end);
        self.pushback = Some((old_current, old_lt, old_ts, old_te));
    }

    /// One token of lookahead past `current`, with its line-terminator flag.
    fn peek_next(&mut self) -> Result<(Token, bool), ParseError> {
        let prev_end = self.prev_token_end;
        let lt = self.prev_line_terminator;
        let (start, end) = (self.current_token_start, self.current_token_end);
        let tok = self.advance()?;
        let next = (self.current.clone(), self.prev_line_terminator);
        self.push_back(tok, lt, start, end);
        self.prev_token_end = prev_end;
        Ok(next)
    }

    fn eat(&mut self, expected: &Token) -> Result<(), ParseError> {
        if &self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(format!("Expected {expected:?}, got {:?}", self.current)))
        }
    }

    fn eat_semicolon(&mut self) -> Result<(), ParseError> {
        if self.current == Token::Semicolon {
            self.advance()?;
            return Ok(());
        }
        // ASI
        if self.prev_line_terminator
            || self.current == Token::RightBrace
            || self.current == Token::Eof
        {
            return Ok(());
        }
        Err(self.error(format!("Expected semicolon, got {:?}", self.current)))
    }

    fn eat_star(&mut self) -> Result<bool, ParseError> {
        if self.current == Token::Star {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError {
            message: msg.into(),
        }
    }

    fn source_since(&self, start: usize) -> String {
        self.source[start..self.prev_token_end].to_string()
    }

    /// Keywords that are contextual and may still name a binding here.
    fn current_identifier_name(&self) -> Option<String> {
        match &self.current {
            Token::Identifier(name) => Some(name.clone()),
            Token::Keyword(Keyword::Async) | Token::Keyword(Keyword::Static) => {
                Some(self.current_keyword_text())
            }
            Token::Keyword(Keyword::Yield) if !self.in_generator => Some("yield".to_string()),
            Token::Keyword(Keyword::Await) if !self.in_async => Some("await".to_string()),
            _ => None,
        }
    }

    fn current_keyword_text(&self) -> String {
        match &self.current {
            Token::Keyword(kw) => kw.as_str().to_string(),
            _ => String::new(),
        }
    }

    fn is_directive_prologue(stmt: &Statement) -> Option<&str> {
        match stmt {
            Statement::Expression(Expression::Literal(Literal::String(s))) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Parses statements up to `end`, switching to strict mode when the
    /// directive prologue holds `"use strict"`.
    fn parse_directive_body(&mut self, end: &Token) -> Result<Vec<Statement>, ParseError> {
        let mut body = Vec::new();
        let mut in_prologue = true;
        while &self.current != end {
            if self.current == Token::Eof {
                return Err(self.error("Unexpected end of input"));
            }
            let stmt = self.parse_statement_or_declaration()?;
            if in_prologue {
                match Self::is_directive_prologue(&stmt) {
                    Some("use strict") => self.strict = true,
                    Some(_) => {}
                    None => in_prologue = false,
                }
            }
            body.push(stmt);
        }
        Ok(body)
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let body = self.parse_directive_body(&Token::Eof)?;
        Ok(Program { body })
    }

    fn check_legacy_octal(&self) -> Result<(), ParseError> {
        if self.strict {
            return Err(self.error("Octal literals are not allowed in strict mode"));
        }
        Ok(())
    }
}

/// Reinterprets an expression parsed as a literal or reference as an
/// assignment target (the cover grammar for destructuring and arrow
/// parameters).
fn expr_to_pattern(expr: Expression) -> Result<Pattern, ParseError> {
    match expr {
        Expression::Identifier(name) => Ok(Pattern::Identifier(name)),
        Expression::Member(..) => Ok(Pattern::Member(Box::new(expr))),
        Expression::Parenthesized(inner) => match *inner {
            e @ (Expression::Identifier(_)
            | Expression::Member(..)
            | Expression::Parenthesized(_)) => {
                Ok(Pattern::Parenthesized(Box::new(expr_to_pattern(e)?)))
            }
            _ => Err(invalid_target()),
        },
        Expression::Assign(AssignOp::Assign, left, right) => Ok(Pattern::Assign(left, right)),
        Expression::Array(elements) => {
            let pats = elements
                .into_iter()
                .map(|e| {
                    e.map(|e| {
                        if let Expression::Spread(inner) = e {
                            expr_to_pattern(*inner).map(ArrayPatternElement::Rest)
                        } else {
                            expr_to_pattern(e).map(ArrayPatternElement::Pattern)
                        }
                    })
                    .transpose()
                })
                .collect::<Result<_, _>>()?;
            Ok(Pattern::Array(pats))
        }
        Expression::Object(props) => {
            let mut pat_props = Vec::new();
            for prop in props {
                if prop.kind != PropertyKind::Init || prop.method {
                    return Err(invalid_target());
                }
                if let Expression::Spread(inner) = prop.value {
                    pat_props.push(ObjectPatternProperty::Rest(expr_to_pattern(*inner)?));
                } else if prop.shorthand {
                    let PropertyKey::Identifier(name) = &prop.key else {
                        return Err(invalid_target());
                    };
                    if let Expression::Assign(AssignOp::Assign, left, right) = prop.value {
                        pat_props.push(ObjectPatternProperty::KeyValue(
                            prop.key,
                            Pattern::Assign(left, right),
                        ));
                    } else {
                        pat_props.push(ObjectPatternProperty::Shorthand(name.clone()));
                    }
                } else {
                    let val_pat = expr_to_pattern(prop.value)?;
                    pat_props.push(ObjectPatternProperty::KeyValue(prop.key, val_pat));
                }
            }
            Ok(Pattern::Object(pat_props))
        }
        Expression::Spread(inner) => Ok(Pattern::Rest(Box::new(expr_to_pattern(*inner)?))),
        _ => Err(invalid_target()),
    }
}

/// Left-hand side of a compound or logical assignment.
fn simple_target(expr: Expression) -> Result<Pattern, ParseError> {
    match expr {
        Expression::Identifier(_) | Expression::Member(..) | Expression::Parenthesized(_) => {
            expr_to_pattern(expr)
        }
        _ => Err(ParseError {
            message: "Invalid left-hand side in assignment".to_string(),
        }),
    }
}

fn invalid_target() -> ParseError {
    ParseError {
        message: "Invalid destructuring assignment target".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        parse(src).unwrap()
    }

    fn first_expr(prog: &Program) -> &Expression {
        match &prog.body[0] {
            Statement::Expression(e) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn first_init(prog: &Program) -> &Expression {
        match &prog.body[0] {
            Statement::Variable(decl) => decl.declarations[0].init.as_ref().unwrap(),
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn parse_empty() {
        assert!(parse_ok("").body.is_empty());
    }

    #[test]
    fn parse_var_declaration() {
        let prog = parse_ok("var x = 42;");
        assert!(matches!(&prog.body[0], Statement::Variable(_)));
    }

    #[test]
    fn parse_if_statement() {
        let prog = parse_ok("if (true) { x; } else { y; }");
        assert!(matches!(&prog.body[0], Statement::If(_)));
    }

    #[test]
    fn parse_for_loop() {
        let prog = parse_ok("for (var i = 0; i < 10; i++) { x; }");
        assert!(matches!(&prog.body[0], Statement::For(_)));
    }

    #[test]
    fn parse_try_catch() {
        let prog = parse_ok("try { x; } catch (e) { y; } finally { z; }");
        assert!(matches!(&prog.body[0], Statement::Try(_)));
    }

    #[test]
    fn parentheses_are_kept_as_nodes() {
        let prog = parse_ok("const c = ((function(){}));");
        let Expression::Parenthesized(inner) = first_init(&prog) else {
            panic!("expected parenthesized initializer");
        };
        assert!(matches!(&**inner, Expression::Parenthesized(_)));
        assert!(matches!(
            first_init(&prog).without_parens(),
            Expression::Function(_)
        ));
    }

    #[test]
    fn arrow_source_text_is_exact() {
        let prog = parse_ok("var f = (a, b) => a + b;");
        let Expression::ArrowFunction(af) = first_init(&prog) else {
            panic!("expected arrow");
        };
        assert_eq!(af.source_text, "(a, b) => a + b");
        assert_eq!(af.params.len(), 2);
    }

    #[test]
    fn async_arrow_forms() {
        let prog = parse_ok("var f = async x => x, g = async () => {};");
        let Statement::Variable(decl) = &prog.body[0] else {
            panic!("expected declaration");
        };
        for d in &decl.declarations {
            assert!(matches!(
                d.init,
                Some(Expression::ArrowFunction(ArrowFunction { is_async: true, .. }))
            ));
        }
    }

    #[test]
    fn parenthesized_identifier_target() {
        let prog = parse_ok("(a) = function(){};");
        let Expression::Assign(AssignOp::Assign, target, _) = first_expr(&prog) else {
            panic!("expected assignment");
        };
        assert!(matches!(&**target, Pattern::Parenthesized(_)));
    }

    #[test]
    fn object_assignment_pattern_with_defaults() {
        let prog = parse_ok("({ foo: bar = function(){}, baz = () => {} } = {});");
        let Expression::Parenthesized(inner) = first_expr(&prog) else {
            panic!("expected parenthesized expression");
        };
        let Expression::Assign(_, target, _) = &**inner else {
            panic!("expected assignment");
        };
        let Pattern::Object(props) = &**target else {
            panic!("expected object pattern");
        };
        assert!(matches!(
            &props[0],
            ObjectPatternProperty::KeyValue(PropertyKey::Identifier(k), Pattern::Assign(p, _))
                if k == "foo" && p.as_identifier() == Some("bar")
        ));
        assert!(matches!(
            &props[1],
            ObjectPatternProperty::KeyValue(PropertyKey::Identifier(k), Pattern::Assign(p, _))
                if k == "baz" && p.as_identifier() == Some("baz")
        ));
    }

    #[test]
    fn cover_initialized_name_outside_pattern_is_rejected() {
        assert!(parse("({ a = 1 });").is_err());
        assert!(parse("var o = { a = 1 };").is_err());
    }

    #[test]
    fn object_literal_forms() {
        let prog = parse_ok(
            "var o = { a: 1, b, c() {}, get d() {}, set d(v) {}, *e() {}, async f() {}, \
             [k]: 2, 42: 3, 'str': 4, get: 5, set() {}, async: 6 };",
        );
        let Expression::Object(props) = first_init(&prog) else {
            panic!("expected object literal");
        };
        let kinds: Vec<_> = props.iter().map(|p| (p.kind, p.method, p.shorthand)).collect();
        assert_eq!(
            kinds,
            vec![
                (PropertyKind::Init, false, false),
                (PropertyKind::Init, false, true),
                (PropertyKind::Init, true, false),
                (PropertyKind::Get, true, false),
                (PropertyKind::Set, true, false),
                (PropertyKind::Init, true, false),
                (PropertyKind::Init, true, false),
                (PropertyKind::Init, false, false),
                (PropertyKind::Init, false, false),
                (PropertyKind::Init, false, false),
                (PropertyKind::Init, false, false),
                (PropertyKind::Init, true, false),
                (PropertyKind::Init, false, false),
            ]
        );
        assert!(props[7].computed);
        assert!(matches!(props[8].key, PropertyKey::Number(n) if n == 42.0));
        assert!(matches!(&props[10].key, PropertyKey::Identifier(k) if k == "get"));
    }

    #[test]
    fn method_source_text_starts_at_key() {
        let prog = parse_ok("var o = { get d() { return 1; } };");
        let Expression::Object(props) = first_init(&prog) else {
            panic!("expected object literal");
        };
        let Expression::Function(f) = &props[0].value else {
            panic!("expected function value");
        };
        assert_eq!(f.source_text, "get d() { return 1; }");
    }

    #[test]
    fn class_elements() {
        let prog = parse_ok(
            "class C extends B { constructor() { super(); } static name() {} get x() {} \
             static #p = 1; y = () => {}; static { } 'lit'() {} }",
        );
        let Statement::ClassDeclaration(c) = &prog.body[0] else {
            panic!("expected class");
        };
        assert!(c.super_class.is_some());
        assert_eq!(c.body.len(), 7);
        assert!(matches!(
            &c.body[0],
            ClassElement::Method(m) if m.kind == ClassMethodKind::Constructor
        ));
        assert!(matches!(
            &c.body[1],
            ClassElement::Method(m) if m.is_static && matches!(&m.key, PropertyKey::Identifier(k) if k == "name")
        ));
        assert!(matches!(&c.body[2], ClassElement::Method(m) if m.kind == ClassMethodKind::Get));
        assert!(matches!(
            &c.body[3],
            ClassElement::Field(f) if f.is_static && matches!(&f.key, PropertyKey::Private(k) if k == "p")
        ));
        assert!(matches!(&c.body[4], ClassElement::Field(f) if !f.is_static && f.value.is_some()));
        assert!(matches!(&c.body[5], ClassElement::StaticBlock(_)));
        assert!(matches!(&c.body[6], ClassElement::Method(m) if matches!(&m.key, PropertyKey::String(_))));
    }

    #[test]
    fn legacy_octal_keys_are_sloppy_only() {
        let prog = parse_ok("var o = { 010: 1 };");
        let Expression::Object(props) = first_init(&prog) else {
            panic!("expected object literal");
        };
        assert!(matches!(props[0].key, PropertyKey::Number(n) if n == 8.0));

        for src in [
            "'use strict'; var o = { 010: 1 };",
            "function f() { 'use strict'; return 07; }",
            "class C { 010() {} }",
        ] {
            let err = parse(src).unwrap_err();
            assert!(err.message.contains("Octal"), "{src}: {err}");
        }
        assert!(parse("function f() { 'use strict'; } var x = 07;").is_ok());
    }

    #[test]
    fn asi_after_line_terminator() {
        let prog = parse_ok("var a = 1\nvar b = function() {}\nb()");
        assert_eq!(prog.body.len(), 3);
    }

    #[test]
    fn generator_body_allows_yield() {
        let prog = parse_ok("var g = function*() { yield 1; yield; };");
        assert!(matches!(
            first_init(&prog),
            Expression::Function(FunctionExpr { is_generator: true, .. })
        ));
    }

    #[test]
    fn return_outside_function_is_rejected() {
        let err = parse("return 1;").unwrap_err();
        assert!(err.to_string().starts_with("SyntaxError:"));
    }

    #[test]
    fn invalid_assignment_targets() {
        assert!(parse("1 = 2;").is_err());
        assert!(parse("a.b += function(){};").is_ok());
        assert!(parse("[a] += 1;").is_err());
    }
}
