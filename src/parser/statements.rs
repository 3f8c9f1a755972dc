use super::*;

impl<'a> Parser<'a> {
    pub(super) fn parse_statement_or_declaration(&mut self) -> Result<Statement, ParseError> {
        if self.current == Token::Keyword(Keyword::Async) && self.is_async_function()? {
            return self.parse_function_declaration();
        }
        match &self.current {
            Token::Keyword(Keyword::Function) => self.parse_function_declaration(),
            Token::Keyword(Keyword::Class) => self.parse_class_declaration(),
            Token::Keyword(Keyword::Let) | Token::Keyword(Keyword::Const) => {
                self.parse_lexical_declaration()
            }
            _ => self.parse_statement(),
        }
    }

    /// `async function` with no line break between the two words.
    pub(super) fn is_async_function(&mut self) -> Result<bool, ParseError> {
        let (next, lt) = self.peek_next()?;
        Ok(next == Token::Keyword(Keyword::Function) && !lt)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match &self.current {
            Token::LeftBrace => self.parse_block_statement(),
            Token::Semicolon => {
                self.advance()?;
                Ok(Statement::Empty)
            }
            Token::Keyword(Keyword::Var) => self.parse_variable_statement(),
            Token::Keyword(Keyword::If) => self.parse_if_statement(),
            Token::Keyword(Keyword::While) => self.parse_while_statement(),
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::Return) => self.parse_return_statement(),
            Token::Keyword(Keyword::Throw) => self.parse_throw_statement(),
            Token::Keyword(Keyword::Try) => self.parse_try_statement(),
            Token::Keyword(
                kw @ (Keyword::Break
                | Keyword::Continue
                | Keyword::Switch
                | Keyword::Do
                | Keyword::With
                | Keyword::Import
                | Keyword::Export
                | Keyword::Debugger),
            ) => Err(self.error(format!("Unsupported statement '{kw}'"))),
            _ => self.parse_expression_statement(),
        }
    }

    pub(super) fn parse_block_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.eat(&Token::LeftBrace)?;
        let mut stmts = Vec::new();
        while self.current != Token::RightBrace {
            if self.current == Token::Eof {
                return Err(self.error("Unexpected end of input"));
            }
            stmts.push(self.parse_statement_or_declaration()?);
        }
        self.eat(&Token::RightBrace)?;
        Ok(stmts)
    }

    fn parse_block_statement(&mut self) -> Result<Statement, ParseError> {
        Ok(Statement::Block(self.parse_block_body()?))
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // if
        self.eat(&Token::LeftParen)?;
        let test = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.current == Token::Keyword(Keyword::Else) {
            self.advance()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // while
        self.eat(&Token::LeftParen)?;
        let test = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // for
        self.eat(&Token::LeftParen)?;
        let init = match &self.current {
            Token::Semicolon => None,
            Token::Keyword(Keyword::Var) => {
                self.advance()?;
                Some(ForInit::Variable(VariableDeclaration {
                    kind: VarKind::Var,
                    declarations: self.parse_variable_declaration_list()?,
                }))
            }
            Token::Keyword(Keyword::Let) | Token::Keyword(Keyword::Const) => {
                let kind = if self.current == Token::Keyword(Keyword::Let) {
                    VarKind::Let
                } else {
                    VarKind::Const
                };
                self.advance()?;
                Some(ForInit::Variable(VariableDeclaration {
                    kind,
                    declarations: self.parse_variable_declaration_list()?,
                }))
            }
            _ => Some(ForInit::Expression(self.parse_expression()?)),
        };
        if self.current != Token::Semicolon {
            return Err(self.error("Only C-style for loops are supported"));
        }
        self.advance()?;
        let test = if self.current == Token::Semicolon {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat(&Token::Semicolon)?;
        let update = if self.current == Token::RightParen {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat(&Token::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        if self.in_function == 0 {
            return Err(self.error("Illegal return statement"));
        }
        self.advance()?; // return
        if self.current == Token::Semicolon
            || self.current == Token::RightBrace
            || self.current == Token::Eof
            || self.prev_line_terminator
        {
            self.eat_semicolon()?;
            return Ok(Statement::Return(None));
        }
        let expr = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(Statement::Return(Some(expr)))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // throw
        if self.prev_line_terminator {
            return Err(self.error("Illegal newline after throw"));
        }
        let expr = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(Statement::Throw(expr))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // try
        let block = self.parse_block_body()?;
        let handler = if self.current == Token::Keyword(Keyword::Catch) {
            self.advance()?;
            let param = if self.current == Token::LeftParen {
                self.advance()?;
                let p = self.parse_binding_pattern()?;
                self.eat(&Token::RightParen)?;
                Some(p)
            } else {
                None
            };
            let body = self.parse_block_body()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.current == Token::Keyword(Keyword::Finally) {
            self.advance()?;
            Some(self.parse_block_body()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expr = self.parse_expression()?;
        self.check_no_cover_initialized_name(&expr)?;
        self.eat_semicolon()?;
        Ok(Statement::Expression(expr))
    }
}
