use super::*;

impl<'a> Parser<'a> {
    pub(super) fn parse_variable_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // var
        let declarations = self.parse_variable_declaration_list()?;
        self.eat_semicolon()?;
        Ok(Statement::Variable(VariableDeclaration {
            kind: VarKind::Var,
            declarations,
        }))
    }

    pub(super) fn parse_lexical_declaration(&mut self) -> Result<Statement, ParseError> {
        let kind = match &self.current {
            Token::Keyword(Keyword::Let) => VarKind::Let,
            Token::Keyword(Keyword::Const) => VarKind::Const,
            _ => return Err(self.error("Expected let or const")),
        };
        self.advance()?;
        let declarations = self.parse_variable_declaration_list()?;
        if kind == VarKind::Const && declarations.iter().any(|d| d.init.is_none()) {
            return Err(self.error("Missing initializer in const declaration"));
        }
        self.eat_semicolon()?;
        Ok(Statement::Variable(VariableDeclaration {
            kind,
            declarations,
        }))
    }

    pub(super) fn parse_variable_declaration_list(
        &mut self,
    ) -> Result<Vec<VariableDeclarator>, ParseError> {
        let mut decls = Vec::new();
        loop {
            let pattern = self.parse_binding_pattern()?;
            let init = if self.current == Token::Assign {
                self.advance()?;
                let init = self.parse_assignment_expression()?;
                self.check_no_cover_initialized_name(&init)?;
                Some(init)
            } else {
                if !matches!(pattern, Pattern::Identifier(_)) {
                    return Err(self.error("Missing initializer in destructuring declaration"));
                }
                None
            };
            decls.push(VariableDeclarator { pattern, init });
            if self.current == Token::Comma {
                self.advance()?;
            } else {
                break;
            }
        }
        Ok(decls)
    }

    pub(super) fn parse_binding_pattern(&mut self) -> Result<Pattern, ParseError> {
        if let Some(name) = self.current_identifier_name() {
            self.advance()?;
            return Ok(Pattern::Identifier(name));
        }
        match &self.current {
            Token::LeftBracket => self.parse_array_pattern(),
            Token::LeftBrace => self.parse_object_pattern(),
            _ => Err(self.error(format!("Expected binding pattern, got {:?}", self.current))),
        }
    }

    /// A binding pattern with an optional `= default`.
    fn parse_binding_element(&mut self) -> Result<Pattern, ParseError> {
        let pat = self.parse_binding_pattern()?;
        if self.current == Token::Assign {
            self.advance()?;
            let default = self.parse_assignment_expression()?;
            Ok(Pattern::Assign(Box::new(pat), Box::new(default)))
        } else {
            Ok(pat)
        }
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.eat(&Token::LeftBracket)?;
        let mut elements = Vec::new();
        while self.current != Token::RightBracket {
            if self.current == Token::Comma {
                elements.push(None);
                self.advance()?;
                continue;
            }
            if self.current == Token::Ellipsis {
                self.advance()?;
                let rest = self.parse_binding_pattern()?;
                elements.push(Some(ArrayPatternElement::Rest(rest)));
                break;
            }
            let pat = self.parse_binding_element()?;
            elements.push(Some(ArrayPatternElement::Pattern(pat)));
            if self.current == Token::Comma {
                self.advance()?;
            }
        }
        self.eat(&Token::RightBracket)?;
        Ok(Pattern::Array(elements))
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern, ParseError> {
        self.eat(&Token::LeftBrace)?;
        let mut props = Vec::new();
        while self.current != Token::RightBrace {
            if self.current == Token::Ellipsis {
                self.advance()?;
                let rest = self.parse_binding_pattern()?;
                props.push(ObjectPatternProperty::Rest(rest));
                break;
            }
            let shorthand_name = self.current_identifier_name();
            let (key, _) = self.parse_property_name()?;
            if matches!(key, PropertyKey::Private(_)) {
                return Err(self.error("Unexpected private name in object pattern"));
            }
            if self.current == Token::Colon {
                self.advance()?;
                let pat = self.parse_binding_element()?;
                props.push(ObjectPatternProperty::KeyValue(key, pat));
            } else {
                // Shorthand: { x } or { x = default }
                let Some(name) = shorthand_name else {
                    return Err(self.error("Expected identifier for shorthand pattern"));
                };
                if self.current == Token::Assign {
                    self.advance()?;
                    let default = self.parse_assignment_expression()?;
                    let pat =
                        Pattern::Assign(Box::new(Pattern::Identifier(name)), Box::new(default));
                    props.push(ObjectPatternProperty::KeyValue(key, pat));
                } else {
                    props.push(ObjectPatternProperty::Shorthand(name));
                }
            }
            if self.current == Token::Comma {
                self.advance()?;
            }
        }
        self.eat(&Token::RightBrace)?;
        Ok(Pattern::Object(props))
    }

    pub(super) fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        let source_start = self.current_token_start;
        let is_async = self.current == Token::Keyword(Keyword::Async);
        if is_async {
            self.advance()?;
        }
        self.eat(&Token::Keyword(Keyword::Function))?;
        let is_generator = self.eat_star()?;
        let Some(name) = self.current_identifier_name() else {
            return Err(self.error("Function statements require a function name"));
        };
        self.advance()?;
        let (params, body) = self.parse_function_rest(is_async, is_generator, false)?;
        Ok(Statement::FunctionDeclaration(FunctionDecl {
            name,
            params,
            body,
            is_async,
            is_generator,
            source_text: self.source_since(source_start),
        }))
    }

    /// Parameters and body of any non-arrow function, parsed in the
    /// generator/async context the function itself establishes.
    pub(super) fn parse_function_rest(
        &mut self,
        is_async: bool,
        is_generator: bool,
        is_constructor: bool,
    ) -> Result<(Vec<Pattern>, Vec<Statement>), ParseError> {
        let saved = (self.in_generator, self.in_async, self.in_class_constructor);
        self.in_generator = is_generator;
        self.in_async = is_async;
        self.in_class_constructor = is_constructor;
        let params = self.parse_formal_parameters()?;
        let body = self.parse_function_body()?;
        (self.in_generator, self.in_async, self.in_class_constructor) = saved;
        Ok((params, body))
    }

    pub(super) fn parse_formal_parameters(&mut self) -> Result<Vec<Pattern>, ParseError> {
        self.eat(&Token::LeftParen)?;
        let mut params = Vec::new();
        while self.current != Token::RightParen {
            if self.current == Token::Ellipsis {
                self.advance()?;
                let pat = self.parse_binding_pattern()?;
                params.push(Pattern::Rest(Box::new(pat)));
                break;
            }
            params.push(self.parse_binding_element()?);
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RightParen {
                return Err(self.error(format!(
                    "Expected ',' or ')' in parameter list, got {:?}",
                    self.current
                )));
            }
        }
        self.eat(&Token::RightParen)?;
        Ok(params)
    }

    pub(super) fn parse_function_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.in_function += 1;
        let saved_strict = self.strict;
        self.eat(&Token::LeftBrace)?;
        let body = self.parse_directive_body(&Token::RightBrace)?;
        self.eat(&Token::RightBrace)?;
        self.strict = saved_strict;
        self.in_function -= 1;
        Ok(body)
    }

    pub(super) fn parse_arrow_body(&mut self, is_async: bool) -> Result<ArrowBody, ParseError> {
        let saved = (self.in_generator, self.in_async);
        self.in_generator = false;
        self.in_async = is_async;
        let body = if self.current == Token::LeftBrace {
            ArrowBody::Block(self.parse_function_body()?)
        } else {
            ArrowBody::Expression(Box::new(self.parse_assignment_expression()?))
        };
        (self.in_generator, self.in_async) = saved;
        Ok(body)
    }

    pub(super) fn parse_class_declaration(&mut self) -> Result<Statement, ParseError> {
        let source_start = self.current_token_start;
        self.advance()?; // class
        let Some(name) = self.current_identifier_name() else {
            return Err(self.error("Class statements require a class name"));
        };
        self.advance()?;
        let (super_class, body) = self.parse_class_tail()?;
        Ok(Statement::ClassDeclaration(ClassDecl {
            name,
            super_class,
            body,
            source_text: self.source_since(source_start),
        }))
    }

    pub(super) fn parse_class_tail(
        &mut self,
    ) -> Result<(Option<Box<Expression>>, Vec<ClassElement>), ParseError> {
        let super_class = if self.current == Token::Keyword(Keyword::Extends) {
            self.advance()?;
            Some(Box::new(self.parse_left_hand_side_expression()?))
        } else {
            None
        };
        let body = self.parse_class_body()?;
        Ok((super_class, body))
    }

    fn parse_class_body(&mut self) -> Result<Vec<ClassElement>, ParseError> {
        let saved_strict = std::mem::replace(&mut self.strict, true);
        let elements = self.parse_class_elements();
        self.strict = saved_strict;
        elements
    }

    fn parse_class_elements(&mut self) -> Result<Vec<ClassElement>, ParseError> {
        self.eat(&Token::LeftBrace)?;
        let mut elements = Vec::new();
        let mut has_constructor = false;
        while self.current != Token::RightBrace {
            if self.current == Token::Semicolon {
                self.advance()?;
                continue;
            }
            if self.current == Token::Eof {
                return Err(self.error("Unexpected end of input in class body"));
            }
            let element = self.parse_class_element()?;
            if let ClassElement::Method(m) = &element
                && m.kind == ClassMethodKind::Constructor
            {
                if has_constructor {
                    return Err(self.error("A class may only have one constructor"));
                }
                has_constructor = true;
            }
            elements.push(element);
        }
        self.eat(&Token::RightBrace)?;
        Ok(elements)
    }

    fn key_is_constructor(key: &PropertyKey) -> bool {
        matches!(key, PropertyKey::Identifier(n) | PropertyKey::String(n) if n == "constructor")
    }

    /// `(`, `=`, `;` or `}` right after a modifier word means the word was
    /// itself the element name.
    fn at_class_element_name_end(&self) -> bool {
        matches!(
            self.current,
            Token::LeftParen | Token::Assign | Token::Semicolon | Token::RightBrace
        )
    }

    fn parse_class_element(&mut self) -> Result<ClassElement, ParseError> {
        let element_start = self.current_token_start;
        let mut is_static = false;
        let mut preset_key = None;
        if self.current == Token::Keyword(Keyword::Static) {
            self.advance()?;
            if self.current == Token::LeftBrace {
                let saved = (self.in_generator, self.in_async, self.in_class_constructor);
                (self.in_generator, self.in_async, self.in_class_constructor) =
                    (false, false, false);
                let body = self.parse_block_body()?;
                (self.in_generator, self.in_async, self.in_class_constructor) = saved;
                return Ok(ClassElement::StaticBlock(body));
            }
            if self.at_class_element_name_end() {
                preset_key = Some(PropertyKey::Identifier("static".to_string()));
            } else {
                is_static = true;
            }
        }

        let member_start = if is_static {
            self.current_token_start
        } else {
            element_start
        };
        let mut is_async = false;
        let mut kind = ClassMethodKind::Method;

        if preset_key.is_none() && self.current == Token::Keyword(Keyword::Async) {
            self.advance()?;
            if self.at_class_element_name_end() || self.prev_line_terminator {
                preset_key = Some(PropertyKey::Identifier("async".to_string()));
            } else {
                is_async = true;
            }
        }
        let is_generator = preset_key.is_none() && self.eat_star()?;
        if preset_key.is_none()
            && !is_async
            && !is_generator
            && let Token::Identifier(word) = &self.current
            && (word == "get" || word == "set")
        {
            let word = word.clone();
            self.advance()?;
            if self.at_class_element_name_end() {
                preset_key = Some(PropertyKey::Identifier(word));
            } else {
                kind = if word == "get" {
                    ClassMethodKind::Get
                } else {
                    ClassMethodKind::Set
                };
            }
        }

        let (key, computed) = match preset_key {
            Some(key) => (key, false),
            None => self.parse_property_name()?,
        };
        let names_constructor = !computed && Self::key_is_constructor(&key);

        if self.current == Token::LeftParen {
            let is_constructor = !is_static && names_constructor;
            if is_constructor && (kind != ClassMethodKind::Method || is_async || is_generator) {
                return Err(self.error("Class constructor may not be a special method"));
            }
            let (params, body) = self.parse_function_rest(is_async, is_generator, is_constructor)?;
            if kind == ClassMethodKind::Get && !params.is_empty() {
                return Err(self.error("Getter must not have any formal parameters"));
            }
            if kind == ClassMethodKind::Set && params.len() != 1 {
                return Err(self.error("Setter must have exactly one formal parameter"));
            }
            return Ok(ClassElement::Method(ClassMethod {
                key,
                kind: if is_constructor {
                    ClassMethodKind::Constructor
                } else {
                    kind
                },
                value: Expression::Function(FunctionExpr {
                    name: None,
                    params,
                    body,
                    is_async,
                    is_generator,
                    source_text: self.source_since(member_start),
                }),
                is_static,
                computed,
            }));
        }

        if kind != ClassMethodKind::Method || is_async || is_generator {
            return Err(self.error(format!(
                "Expected '(' after method name, got {:?}",
                self.current
            )));
        }
        if names_constructor {
            return Err(self.error("Classes may not have a field named 'constructor'"));
        }
        let value = if self.current == Token::Assign {
            self.advance()?;
            let saved = (self.in_generator, self.in_async, self.in_class_constructor);
            (self.in_generator, self.in_async, self.in_class_constructor) = (false, false, false);
            let expr = self.parse_assignment_expression()?;
            (self.in_generator, self.in_async, self.in_class_constructor) = saved;
            Some(expr)
        } else {
            None
        };
        self.eat_semicolon()?;
        Ok(ClassElement::Field(ClassField {
            key,
            value,
            is_static,
            computed,
        }))
    }

    pub(super) fn parse_property_name(&mut self) -> Result<(PropertyKey, bool), ParseError> {
        match &self.current {
            Token::LeftBracket => {
                self.advance()?;
                let expr = self.parse_assignment_expression()?;
                self.eat(&Token::RightBracket)?;
                Ok((PropertyKey::Computed(Box::new(expr)), true))
            }
            Token::Hash => {
                self.advance()?;
                let name = match &self.current {
                    Token::Identifier(name) => name.clone(),
                    Token::Keyword(kw) => kw.as_str().to_string(),
                    _ => return Err(self.error("Expected private name after '#'")),
                };
                self.advance()?;
                Ok((PropertyKey::Private(name), false))
            }
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok((PropertyKey::Identifier(name), false))
            }
            Token::StringLiteral(s) => {
                let s = s.clone();
                self.advance()?;
                Ok((PropertyKey::String(s), false))
            }
            Token::NumericLiteral(n) => {
                let n = *n;
                self.advance()?;
                Ok((PropertyKey::Number(n), false))
            }
            Token::LegacyOctalLiteral(n) => {
                self.check_legacy_octal()?;
                let n = *n;
                self.advance()?;
                Ok((PropertyKey::Number(n), false))
            }
            Token::Keyword(kw) => {
                // Keywords can be property names
                let name = kw.as_str().to_string();
                self.advance()?;
                Ok((PropertyKey::Identifier(name), false))
            }
            Token::BooleanLiteral(b) => {
                let name = if *b { "true" } else { "false" }.to_string();
                self.advance()?;
                Ok((PropertyKey::Identifier(name), false))
            }
            Token::NullLiteral => {
                self.advance()?;
                Ok((PropertyKey::Identifier("null".to_string()), false))
            }
            _ => Err(self.error(format!("Expected property name, got {:?}", self.current))),
        }
    }
}
