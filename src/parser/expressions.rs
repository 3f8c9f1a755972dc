use super::*;

impl<'a> Parser<'a> {
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_assignment_expression()?;
        if self.current == Token::Comma {
            let mut exprs = vec![expr];
            while self.current == Token::Comma {
                self.advance()?;
                exprs.push(self.parse_assignment_expression()?);
            }
            Ok(Expression::Sequence(exprs))
        } else {
            Ok(expr)
        }
    }

    fn parse_yield_expression(&mut self) -> Result<Expression, ParseError> {
        self.advance()?;
        if self.prev_line_terminator
            || matches!(
                self.current,
                Token::RightBrace
                    | Token::Semicolon
                    | Token::RightParen
                    | Token::RightBracket
                    | Token::Colon
                    | Token::Comma
                    | Token::Eof
            )
        {
            return Ok(Expression::Yield(None, false));
        }
        let delegate = self.eat_star()?;
        let expr = self.parse_assignment_expression()?;
        Ok(Expression::Yield(Some(Box::new(expr)), delegate))
    }

    pub(super) fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        if self.in_generator && self.current == Token::Keyword(Keyword::Yield) {
            return self.parse_yield_expression();
        }

        let left = self.parse_conditional_expression()?;

        let op = match &self.current {
            Token::Assign => AssignOp::Assign,
            Token::PlusAssign => AssignOp::AddAssign,
            Token::MinusAssign => AssignOp::SubAssign,
            Token::StarAssign => AssignOp::MulAssign,
            Token::SlashAssign => AssignOp::DivAssign,
            Token::PercentAssign => AssignOp::ModAssign,
            Token::LogicalAndAssign => AssignOp::LogicalAndAssign,
            Token::LogicalOrAssign => AssignOp::LogicalOrAssign,
            Token::NullishAssign => AssignOp::NullishAssign,
            _ => return Ok(left),
        };

        let target = match left {
            Expression::Object(_) | Expression::Array(_) if op == AssignOp::Assign => {
                expr_to_pattern(left)?
            }
            other => simple_target(other)?,
        };
        self.advance()?;
        let right = self.parse_assignment_expression()?;
        Ok(Expression::Assign(op, Box::new(target), Box::new(right)))
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_nullish_coalescing()?;
        if self.current == Token::Question {
            self.advance()?;
            let consequent = self.parse_assignment_expression()?;
            self.eat(&Token::Colon)?;
            let alternate = self.parse_assignment_expression()?;
            Ok(Expression::Conditional(
                Box::new(expr),
                Box::new(consequent),
                Box::new(alternate),
            ))
        } else {
            Ok(expr)
        }
    }

    fn parse_nullish_coalescing(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_logical_or()?;
        while self.current == Token::NullishCoalescing {
            self.advance()?;
            let right = self.parse_logical_or()?;
            left = Expression::Logical(
                LogicalOp::NullishCoalescing,
                Box::new(left),
                Box::new(right),
            );
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.current == Token::LogicalOr {
            self.advance()?;
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_equality()?;
        while self.current == Token::LogicalAnd {
            self.advance()?;
            let right = self.parse_equality()?;
            left = Expression::Logical(LogicalOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current {
                Token::Equal => BinaryOp::Eq,
                Token::NotEqual => BinaryOp::NotEq,
                Token::StrictEqual => BinaryOp::StrictEq,
                Token::StrictNotEqual => BinaryOp::StrictNotEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match &self.current {
                Token::LessThan => BinaryOp::Lt,
                Token::GreaterThan => BinaryOp::Gt,
                Token::LessThanEqual => BinaryOp::LtEq,
                Token::GreaterThanEqual => BinaryOp::GtEq,
                Token::Keyword(Keyword::In) => BinaryOp::In,
                Token::Keyword(Keyword::Instanceof) => BinaryOp::Instanceof,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        match &self.current {
            Token::Bang => {
                self.advance()?;
                let arg = self.parse_unary()?;
                Ok(Expression::Unary(UnaryOp::Not, Box::new(arg)))
            }
            Token::Minus => {
                self.advance()?;
                let arg = self.parse_unary()?;
                Ok(Expression::Unary(UnaryOp::Minus, Box::new(arg)))
            }
            Token::Plus => {
                self.advance()?;
                let arg = self.parse_unary()?;
                Ok(Expression::Unary(UnaryOp::Plus, Box::new(arg)))
            }
            Token::Keyword(Keyword::Typeof) => {
                self.advance()?;
                Ok(Expression::Typeof(Box::new(self.parse_unary()?)))
            }
            Token::Keyword(Keyword::Void) => {
                self.advance()?;
                Ok(Expression::Void(Box::new(self.parse_unary()?)))
            }
            Token::Keyword(Keyword::Delete) => {
                self.advance()?;
                Ok(Expression::Delete(Box::new(self.parse_unary()?)))
            }
            Token::Keyword(Keyword::Await) if self.in_async => {
                self.advance()?;
                Ok(Expression::Await(Box::new(self.parse_unary()?)))
            }
            Token::Increment | Token::Decrement => {
                let op = if self.current == Token::Increment {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance()?;
                let arg = self.parse_unary()?;
                self.check_update_target(&arg)?;
                Ok(Expression::Update(op, true, Box::new(arg)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn check_update_target(&self, expr: &Expression) -> Result<(), ParseError> {
        match expr.without_parens() {
            Expression::Identifier(_) | Expression::Member(..) => Ok(()),
            _ => Err(self.error("Invalid left-hand side expression in update operation")),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_left_hand_side_expression()?;
        if !self.prev_line_terminator
            && matches!(self.current, Token::Increment | Token::Decrement)
        {
            let op = if self.current == Token::Increment {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.check_update_target(&expr)?;
            self.advance()?;
            return Ok(Expression::Update(op, false, Box::new(expr)));
        }
        Ok(expr)
    }

    fn parse_dot_member_property(&mut self) -> Result<MemberProperty, ParseError> {
        let prop = match &self.current {
            Token::Hash => {
                self.advance()?;
                match &self.current {
                    Token::Identifier(name) => MemberProperty::Private(name.clone()),
                    Token::Keyword(kw) => MemberProperty::Private(kw.as_str().to_string()),
                    _ => return Err(self.error("Expected private name after '#'")),
                }
            }
            Token::Identifier(name) => MemberProperty::Dot(name.clone()),
            Token::Keyword(kw) => MemberProperty::Dot(kw.as_str().to_string()),
            Token::BooleanLiteral(b) => MemberProperty::Dot(b.to_string()),
            Token::NullLiteral => MemberProperty::Dot("null".to_string()),
            _ => {
                return Err(self.error(format!(
                    "Expected property name after '.', got {:?}",
                    self.current
                )));
            }
        };
        self.advance()?;
        Ok(prop)
    }

    pub(super) fn parse_left_hand_side_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = match &self.current {
            Token::Keyword(Keyword::New) => self.parse_new_expression()?,
            Token::Keyword(Keyword::Super) => self.parse_super_call()?,
            _ => self.parse_primary_expression()?,
        };
        loop {
            match &self.current {
                Token::Dot => {
                    self.advance()?;
                    let prop = self.parse_dot_member_property()?;
                    expr = Expression::Member(Box::new(expr), prop);
                }
                Token::LeftBracket => {
                    self.advance()?;
                    let prop = self.parse_expression()?;
                    self.eat(&Token::RightBracket)?;
                    expr = Expression::Member(Box::new(expr), MemberProperty::Computed(Box::new(prop)));
                }
                Token::LeftParen => {
                    let args = self.parse_arguments()?;
                    expr = Expression::Call(Box::new(expr), args);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_new_expression(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // new
        let mut callee = if self.current == Token::Keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        loop {
            match &self.current {
                Token::Dot => {
                    self.advance()?;
                    let prop = self.parse_dot_member_property()?;
                    callee = Expression::Member(Box::new(callee), prop);
                }
                Token::LeftBracket => {
                    self.advance()?;
                    let prop = self.parse_expression()?;
                    self.eat(&Token::RightBracket)?;
                    callee =
                        Expression::Member(Box::new(callee), MemberProperty::Computed(Box::new(prop)));
                }
                _ => break,
            }
        }
        let args = if self.current == Token::LeftParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New(Box::new(callee), args))
    }

    fn parse_super_call(&mut self) -> Result<Expression, ParseError> {
        if !self.in_class_constructor {
            return Err(self.error("'super' keyword unexpected here"));
        }
        self.advance()?; // super
        if self.current != Token::LeftParen {
            return Err(self.error("Only 'super(...)' calls are supported"));
        }
        let args = self.parse_arguments()?;
        Ok(Expression::SuperCall(args))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let args = self.parse_argument_list()?;
        for arg in &args {
            self.check_no_cover_initialized_name(arg)?;
        }
        Ok(args)
    }

    /// `( a, ...b, )` without the shorthand-initializer check, so that
    /// async arrow heads can reuse it.
    fn parse_argument_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.eat(&Token::LeftParen)?;
        let mut args = Vec::new();
        while self.current != Token::RightParen {
            if self.current == Token::Ellipsis {
                self.advance()?;
                let expr = self.parse_assignment_expression()?;
                args.push(Expression::Spread(Box::new(expr)));
            } else {
                args.push(self.parse_assignment_expression()?);
            }
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RightParen {
                return Err(self.error(format!(
                    "Expected ',' or ')' in argument list, got {:?}",
                    self.current
                )));
            }
        }
        self.eat(&Token::RightParen)?;
        Ok(args)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        match &self.current {
            Token::Keyword(Keyword::This) => {
                self.advance()?;
                Ok(Expression::This)
            }
            Token::Keyword(Keyword::Async) => self.parse_async_primary(),
            Token::Keyword(Keyword::Function) => {
                let start = self.current_token_start;
                self.parse_function_expression(start, false)
            }
            Token::Keyword(Keyword::Class) => self.parse_class_expression(),
            Token::NullLiteral => {
                self.advance()?;
                Ok(Expression::Literal(Literal::Null))
            }
            Token::BooleanLiteral(b) => {
                let b = *b;
                self.advance()?;
                Ok(Expression::Literal(Literal::Boolean(b)))
            }
            Token::NumericLiteral(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expression::Literal(Literal::Number(n)))
            }
            Token::LegacyOctalLiteral(n) => {
                self.check_legacy_octal()?;
                let n = *n;
                self.advance()?;
                Ok(Expression::Literal(Literal::Number(n)))
            }
            Token::StringLiteral(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expression::Literal(Literal::String(s)))
            }
            Token::LeftParen => self.parse_parenthesized_or_arrow(),
            Token::LeftBracket => self.parse_array_literal(),
            Token::LeftBrace => self.parse_object_literal(),
            _ => {
                let Some(name) = self.current_identifier_name() else {
                    return Err(self.error(format!("Unexpected token: {:?}", self.current)));
                };
                let ident_start = self.current_token_start;
                self.advance()?;
                // Arrow function: ident => body
                if self.current == Token::Arrow && !self.prev_line_terminator {
                    self.advance()?;
                    let body = self.parse_arrow_body(false)?;
                    return Ok(Expression::ArrowFunction(ArrowFunction {
                        params: vec![Pattern::Identifier(name)],
                        body,
                        is_async: false,
                        source_text: self.source_since(ident_start),
                    }));
                }
                Ok(Expression::Identifier(name))
            }
        }
    }

    /// `async function`, `async x => ...`, `async (...) => ...`, or a plain
    /// reference to something named `async`.
    fn parse_async_primary(&mut self) -> Result<Expression, ParseError> {
        let source_start = self.current_token_start;
        self.advance()?; // async
        if self.prev_line_terminator {
            return Ok(Expression::Identifier("async".to_string()));
        }
        if self.current == Token::Keyword(Keyword::Function) {
            return self.parse_function_expression(source_start, true);
        }
        if self.current == Token::LeftParen {
            let args = self.parse_argument_list()?;
            if self.current == Token::Arrow && !self.prev_line_terminator {
                self.advance()?;
                let params = args
                    .into_iter()
                    .map(expr_to_pattern)
                    .collect::<Result<Vec<_>, _>>()?;
                let body = self.parse_arrow_body(true)?;
                return Ok(Expression::ArrowFunction(ArrowFunction {
                    params,
                    body,
                    is_async: true,
                    source_text: self.source_since(source_start),
                }));
            }
            for arg in &args {
                self.check_no_cover_initialized_name(arg)?;
            }
            return Ok(Expression::Call(
                Box::new(Expression::Identifier("async".to_string())),
                args,
            ));
        }
        if let Some(name) = self.current_identifier_name() {
            self.advance()?;
            if self.current != Token::Arrow || self.prev_line_terminator {
                return Err(self.error(format!("Unexpected identifier '{name}' after 'async'")));
            }
            self.advance()?;
            let body = self.parse_arrow_body(true)?;
            return Ok(Expression::ArrowFunction(ArrowFunction {
                params: vec![Pattern::Identifier(name)],
                body,
                is_async: true,
                source_text: self.source_since(source_start),
            }));
        }
        Ok(Expression::Identifier("async".to_string()))
    }

    fn parse_parenthesized_or_arrow(&mut self) -> Result<Expression, ParseError> {
        let paren_start = self.current_token_start;
        self.advance()?; // (
        let mut items = Vec::new();
        let mut rest = None;
        let mut trailing_comma = false;
        while self.current != Token::RightParen {
            if self.current == Token::Ellipsis {
                self.advance()?;
                rest = Some(self.parse_binding_pattern()?);
                break;
            }
            items.push(self.parse_assignment_expression()?);
            trailing_comma = false;
            if self.current == Token::Comma {
                self.advance()?;
                trailing_comma = true;
            } else if self.current != Token::RightParen {
                return Err(self.error(format!("Expected ')', got {:?}", self.current)));
            }
        }
        self.eat(&Token::RightParen)?;

        if self.current == Token::Arrow && !self.prev_line_terminator {
            self.advance()?;
            let mut params = items
                .into_iter()
                .map(expr_to_pattern)
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(r) = rest {
                params.push(Pattern::Rest(Box::new(r)));
            }
            let body = self.parse_arrow_body(false)?;
            return Ok(Expression::ArrowFunction(ArrowFunction {
                params,
                body,
                is_async: false,
                source_text: self.source_since(paren_start),
            }));
        }

        if items.is_empty() || rest.is_some() || trailing_comma {
            return Err(self.error("Unexpected token ')'"));
        }
        for item in &items {
            self.check_no_cover_initialized_name(item)?;
        }
        let inner = if items.len() == 1 {
            items.remove(0)
        } else {
            Expression::Sequence(items)
        };
        Ok(Expression::Parenthesized(Box::new(inner)))
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // [
        let mut elements = Vec::new();
        while self.current != Token::RightBracket {
            if self.current == Token::Comma {
                elements.push(None);
                self.advance()?;
                continue;
            }
            if self.current == Token::Ellipsis {
                self.advance()?;
                let expr = self.parse_assignment_expression()?;
                elements.push(Some(Expression::Spread(Box::new(expr))));
            } else {
                elements.push(Some(self.parse_assignment_expression()?));
            }
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RightBracket {
                return Err(self.error(format!("Expected ']', got {:?}", self.current)));
            }
        }
        self.eat(&Token::RightBracket)?;
        Ok(Expression::Array(elements))
    }

    fn has_cover_initialized_name(expr: &Expression) -> bool {
        match expr {
            Expression::Object(props) => props.iter().any(|p| {
                if p.shorthand {
                    matches!(p.value, Expression::Assign(..))
                } else {
                    !p.method && Self::has_cover_initialized_name(&p.value)
                }
            }),
            Expression::Array(elems) => elems.iter().flatten().any(Self::has_cover_initialized_name),
            Expression::Parenthesized(inner) | Expression::Spread(inner) => {
                Self::has_cover_initialized_name(inner)
            }
            Expression::Sequence(exprs) => exprs.iter().any(Self::has_cover_initialized_name),
            Expression::Assign(_, _, value) => Self::has_cover_initialized_name(value),
            _ => false,
        }
    }

    /// `{ a = 1 }` is only valid once it has been reinterpreted as a pattern.
    pub(super) fn check_no_cover_initialized_name(
        &self,
        expr: &Expression,
    ) -> Result<(), ParseError> {
        if Self::has_cover_initialized_name(expr) {
            Err(self.error("Invalid shorthand property initializer"))
        } else {
            Ok(())
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // {
        let mut props = Vec::new();
        while self.current != Token::RightBrace {
            if self.current == Token::Ellipsis {
                self.advance()?;
                let expr = self.parse_assignment_expression()?;
                props.push(Property {
                    key: PropertyKey::Identifier(String::new()),
                    value: Expression::Spread(Box::new(expr)),
                    kind: PropertyKind::Init,
                    computed: false,
                    shorthand: false,
                    method: false,
                });
            } else {
                props.push(self.parse_object_property()?);
            }
            if self.current == Token::Comma {
                self.advance()?;
            } else if self.current != Token::RightBrace {
                return Err(self.error(format!(
                    "Expected ',' or '}}' in object literal, got {:?}",
                    self.current
                )));
            }
        }
        self.eat(&Token::RightBrace)?;
        Ok(Expression::Object(props))
    }

    fn at_property_name_end(&self) -> bool {
        matches!(
            self.current,
            Token::Comma | Token::Colon | Token::LeftParen | Token::RightBrace | Token::Assign
        )
    }

    fn parse_object_property(&mut self) -> Result<Property, ParseError> {
        let method_source_start = self.current_token_start;
        let mut preset_key = None;
        let mut is_async = false;
        let mut kind = PropertyKind::Init;

        // { async method() {} } or { async *method() {} }, but { async: 1 } and { async }
        if self.current == Token::Keyword(Keyword::Async) {
            self.advance()?;
            if self.at_property_name_end() || self.prev_line_terminator {
                preset_key = Some("async".to_string());
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
            if self.at_property_name_end() {
                preset_key = Some(word);
            } else {
                kind = if word == "get" {
                    PropertyKind::Get
                } else {
                    PropertyKind::Set
                };
            }
        }

        let shorthand_name = match &preset_key {
            Some(word) => Some(word.clone()),
            None => self.current_identifier_name(),
        };
        let (key, computed) = match preset_key {
            Some(word) => (PropertyKey::Identifier(word), false),
            None => self.parse_property_name()?,
        };
        if matches!(key, PropertyKey::Private(_)) {
            return Err(self.error("Private names are not valid in object literals"));
        }

        // Method: { foo() {} }, accessors, generator and async methods
        if self.current == Token::LeftParen {
            let (params, body) = self.parse_function_rest(is_async, is_generator, false)?;
            if kind == PropertyKind::Get && !params.is_empty() {
                return Err(self.error("Getter must not have any formal parameters"));
            }
            if kind == PropertyKind::Set && params.len() != 1 {
                return Err(self.error("Setter must have exactly one formal parameter"));
            }
            return Ok(Property {
                key,
                value: Expression::Function(FunctionExpr {
                    name: None,
                    params,
                    body,
                    is_async,
                    is_generator,
                    source_text: self.source_since(method_source_start),
                }),
                kind,
                computed,
                shorthand: false,
                method: true,
            });
        }
        if is_async || is_generator || kind != PropertyKind::Init {
            return Err(self.error(format!(
                "Expected '(' after method name, got {:?}",
                self.current
            )));
        }

        // Regular: { key: value }
        if self.current == Token::Colon {
            self.advance()?;
            let value = self.parse_assignment_expression()?;
            return Ok(Property {
                key,
                value,
                kind: PropertyKind::Init,
                computed,
                shorthand: false,
                method: false,
            });
        }

        // Shorthand { x } and CoverInitializedName { x = default }
        let (Some(name), false) = (shorthand_name, computed) else {
            return Err(self.error(format!(
                "Unexpected token in object literal: {:?}",
                self.current
            )));
        };
        let value = if self.current == Token::Assign {
            self.advance()?;
            let default_value = self.parse_assignment_expression()?;
            Expression::Assign(
                AssignOp::Assign,
                Box::new(Pattern::Identifier(name)),
                Box::new(default_value),
            )
        } else {
            Expression::Identifier(name)
        };
        Ok(Property {
            key,
            value,
            kind: PropertyKind::Init,
            computed: false,
            shorthand: true,
            method: false,
        })
    }

    fn parse_function_expression(
        &mut self,
        source_start: usize,
        is_async: bool,
    ) -> Result<Expression, ParseError> {
        self.eat(&Token::Keyword(Keyword::Function))?;
        let is_generator = self.eat_star()?;
        let name = if let Some(n) = self.current_identifier_name() {
            self.advance()?;
            Some(n)
        } else {
            None
        };
        let (params, body) = self.parse_function_rest(is_async, is_generator, false)?;
        Ok(Expression::Function(FunctionExpr {
            name,
            params,
            body,
            is_async,
            is_generator,
            source_text: self.source_since(source_start),
        }))
    }

    fn parse_class_expression(&mut self) -> Result<Expression, ParseError> {
        let source_start = self.current_token_start;
        self.advance()?; // class
        let name = if let Some(n) = self.current_identifier_name() {
            self.advance()?;
            Some(n)
        } else {
            None
        };
        let (super_class, body) = self.parse_class_tail()?;
        Ok(Expression::Class(ClassExpr {
            name,
            super_class,
            body,
            source_text: self.source_since(source_start),
        }))
    }
}
