use super::exec::BindMode;
use super::*;
use crate::naming::{ParentSyntax, Role};

/// Borrowed view of a class definition, shared by declarations and
/// expressions.
pub(crate) struct ClassParts<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) super_class: Option<&'a Expression>,
    pub(crate) body: &'a [ClassElement],
    pub(crate) source_text: &'a str,
}

/// A resolved assignment target.
enum Reference {
    Binding(String),
    Property(JsValue, String),
    Private(JsValue, String),
}

enum StaticElement<'a> {
    Field(FieldRecord),
    Block(&'a [Statement]),
}

impl Interpreter {
    pub(crate) fn eval_expression(&mut self, expr: &Expression, env: &EnvRef) -> Completion {
        match expr {
            Expression::Literal(lit) => Completion::Normal(match lit {
                Literal::Null => JsValue::Null,
                Literal::Boolean(b) => JsValue::Boolean(*b),
                Literal::Number(n) => JsValue::Number(*n),
                Literal::String(s) => JsValue::String(s.clone()),
            }),
            Expression::Identifier(name) => self.lookup_identifier(name, env),
            Expression::This => {
                Completion::Normal(env.borrow().get("this").unwrap_or(JsValue::Undefined))
            }
            Expression::Array(elements) => self.eval_array_literal(elements, env),
            Expression::Object(props) => self.eval_object_literal(props, env),
            Expression::Function(_) | Expression::ArrowFunction(_) | Expression::Class(_) => {
                self.eval_named(expr, &ParentSyntax::Other, env)
            }
            Expression::Parenthesized(inner) => self.eval_expression(inner, env),
            Expression::Unary(op, operand) => {
                let val = match self.eval_expression(operand, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                if *op == UnaryOp::Not {
                    return Completion::Normal(JsValue::Boolean(!to_boolean(&val)));
                }
                match self.to_number(&val) {
                    Ok(n) if *op == UnaryOp::Minus => Completion::Normal(JsValue::Number(-n)),
                    Ok(n) => Completion::Normal(JsValue::Number(n)),
                    Err(e) => Completion::Throw(e),
                }
            }
            Expression::Typeof(operand) => {
                if let Expression::Identifier(name) = operand.without_parens()
                    && !env.borrow().has(name)
                {
                    return Completion::Normal(JsValue::str("undefined"));
                }
                let val = match self.eval_expression(operand, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                Completion::Normal(JsValue::str(self.typeof_value(&val)))
            }
            Expression::Void(operand) => match self.eval_expression(operand, env) {
                Completion::Normal(_) => Completion::Normal(JsValue::Undefined),
                other => other,
            },
            Expression::Delete(target) => self.eval_delete(target, env),
            Expression::Update(op, prefix, arg) => self.eval_update(*op, *prefix, arg, env),
            Expression::Binary(op, left, right) => {
                let lval = match self.eval_expression(left, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                let rval = match self.eval_expression(right, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                match self.eval_binary(*op, &lval, &rval) {
                    Ok(v) => Completion::Normal(v),
                    Err(e) => Completion::Throw(e),
                }
            }
            Expression::Logical(op, left, right) => {
                let lval = match self.eval_expression(left, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                let short_circuit = match op {
                    LogicalOp::And => !to_boolean(&lval),
                    LogicalOp::Or => to_boolean(&lval),
                    LogicalOp::NullishCoalescing => !lval.is_nullish(),
                };
                if short_circuit {
                    Completion::Normal(lval)
                } else {
                    self.eval_expression(right, env)
                }
            }
            Expression::Assign(op, target, value) => self.eval_assign(*op, target, value, env),
            Expression::Conditional(test, cons, alt) => {
                let test_val = match self.eval_expression(test, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                if to_boolean(&test_val) {
                    self.eval_expression(cons, env)
                } else {
                    self.eval_expression(alt, env)
                }
            }
            Expression::Call(callee, args) => self.eval_call(callee, args, env),
            Expression::SuperCall(args) => self.eval_super_call(args, env),
            Expression::New(callee, args) => {
                let func = match self.eval_expression(callee, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                let args = match self.eval_arguments(args, env) {
                    Ok(args) => args,
                    Err(comp) => return comp,
                };
                self.construct(&func, &args)
            }
            Expression::Member(..) => match self.eval_reference(expr, env) {
                Ok(reference) => self.get_reference(&reference, env),
                Err(comp) => comp,
            },
            Expression::Sequence(exprs) => {
                let mut result = JsValue::Undefined;
                for e in exprs {
                    match self.eval_expression(e, env) {
                        Completion::Normal(v) => result = v,
                        other => return other,
                    }
                }
                Completion::Normal(result)
            }
            Expression::Spread(_) => {
                Completion::Throw(self.create_error("SyntaxError", "Unexpected spread element"))
            }
            Expression::Yield(..) | Expression::Await(_) => Completion::Throw(
                self.create_type_error("Generator and async function bodies cannot be evaluated"),
            ),
        }
    }

    fn lookup_identifier(&mut self, name: &str, env: &EnvRef) -> Completion {
        let result = env.borrow().get(name);
        match result {
            Ok(v) => Completion::Normal(v),
            Err(BindingError::Uninitialized) => {
                let msg = format!("Cannot access '{name}' before initialization");
                Completion::Throw(self.create_reference_error(&msg))
            }
            Err(_) => {
                let msg = format!("{name} is not defined");
                Completion::Throw(self.create_reference_error(&msg))
            }
        }
    }

    /// Evaluates `expr` as the direct child of `parent`. Nameable constructs
    /// are created with the name inferred from `parent`; anything else
    /// evaluates normally and is never renamed.
    pub(crate) fn eval_named(&mut self, expr: &Expression, parent: &ParentSyntax<'_>, env: &EnvRef) -> Completion {
        self.eval_named_value(expr, parent, env, false)
    }

    fn eval_named_value(
        &mut self,
        expr: &Expression,
        parent: &ParentSyntax<'_>,
        env: &EnvRef,
        is_method: bool,
    ) -> Completion {
        match naming::on_construct(expr, parent) {
            Some(value) => self.instantiate(naming::strip_parens(expr), &value, env, is_method),
            None => self.eval_expression(expr, env),
        }
    }

    fn instantiate(&mut self, expr: &Expression, value: &NameableValue, env: &EnvRef, is_method: bool) -> Completion {
        match expr {
            Expression::Function(f) => {
                let strict = env.borrow().strict || Self::is_strict_mode_body(&f.body);
                // A named function expression sees its own name.
                let own_scope = match &f.name {
                    Some(name) if !is_method => {
                        let scope = Environment::new(Some(env.clone()));
                        scope.borrow_mut().declare(name, BindingKind::Const);
                        Some((scope, name))
                    }
                    _ => None,
                };
                let closure = own_scope
                    .as_ref()
                    .map_or_else(|| env.clone(), |(scope, _)| scope.clone());
                let func = self.create_function(JsFunction::User {
                    kind: value.kind,
                    params: f.params.clone(),
                    body: FunctionBody::Block(f.body.clone()),
                    closure,
                    is_arrow: false,
                    is_async: f.is_async,
                    is_method,
                    is_strict: strict,
                    source_text: f.source_text.clone(),
                    class: None,
                });
                if let Some((scope, name)) = own_scope {
                    scope
                        .borrow_mut()
                        .initialize(name, BindingKind::Const, func.clone());
                }
                self.install_function_name(&func, value, &f.source_text);
                Completion::Normal(func)
            }
            Expression::ArrowFunction(a) => {
                let (body, strict) = match &a.body {
                    ArrowBody::Expression(e) => (FunctionBody::Expression((**e).clone()), env.borrow().strict),
                    ArrowBody::Block(stmts) => (
                        FunctionBody::Block(stmts.clone()),
                        env.borrow().strict || Self::is_strict_mode_body(stmts),
                    ),
                };
                let func = self.create_function(JsFunction::User {
                    kind: value.kind,
                    params: a.params.clone(),
                    body,
                    closure: env.clone(),
                    is_arrow: true,
                    is_async: a.is_async,
                    is_method: false,
                    is_strict: strict,
                    source_text: a.source_text.clone(),
                    class: None,
                });
                self.install_function_name(&func, value, &a.source_text);
                Completion::Normal(func)
            }
            Expression::Class(c) => {
                let parts = ClassParts {
                    name: c.name.as_deref(),
                    super_class: c.super_class.as_deref(),
                    body: &c.body,
                    source_text: &c.source_text,
                };
                self.eval_class(parts, value, env)
            }
            _ => self.eval_expression(expr, env),
        }
    }

    /// Evaluates a literal or computed key once, yielding the property key
    /// string and the key as inference sees it.
    fn eval_property_key(
        &mut self,
        key: &PropertyKey,
        env: &EnvRef,
    ) -> Result<(String, naming::PropertyKey), JsValue> {
        match key {
            PropertyKey::Identifier(s) => Ok((s.clone(), naming::PropertyKey::Identifier(s.clone()))),
            PropertyKey::String(s) => Ok((s.clone(), naming::PropertyKey::String(s.clone()))),
            PropertyKey::Number(n) => Ok((number_ops::to_string(*n), naming::PropertyKey::Number(*n))),
            PropertyKey::Computed(expr) => match self.eval_expression(expr, env) {
                Completion::Normal(v) => self.evaluated_key(&v),
                Completion::Throw(e) | Completion::Return(e) => Err(e),
            },
            PropertyKey::Private(name) => Ok((name.clone(), naming::PropertyKey::Private(name.clone()))),
        }
    }

    fn eval_array_literal(&mut self, elements: &[Option<Expression>], env: &EnvRef) -> Completion {
        let mut values = Vec::new();
        let mut holes = Vec::new();
        for element in elements {
            match element {
                None => {
                    holes.push(values.len());
                    values.push(JsValue::Undefined);
                }
                Some(Expression::Spread(inner)) => {
                    let v = match self.eval_expression(inner, env) {
                        Completion::Normal(v) => v,
                        other => return other,
                    };
                    match self.collect_elements(&v, None) {
                        Ok(items) => values.extend(items),
                        Err(e) => return Completion::Throw(e),
                    }
                }
                Some(e) => match self.eval_expression(e, env) {
                    Completion::Normal(v) => values.push(v),
                    other => return other,
                },
            }
        }
        let arr = self.create_array(values);
        if let Some(obj) = self.object_of(&arr) {
            let mut o = obj.borrow_mut();
            for i in holes {
                o.remove_property(&i.to_string());
            }
        }
        Completion::Normal(arr)
    }

    fn eval_object_literal(&mut self, props: &[Property], env: &EnvRef) -> Completion {
        let obj = self.create_object();
        for prop in props {
            if let Expression::Spread(inner) = &prop.value {
                let source = match self.eval_expression(inner, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                let copy = self.copy_own_enumerable(&source, &[]);
                if let Some(copied) = self.object_of(&copy) {
                    let copied = copied.borrow();
                    let mut o = obj.borrow_mut();
                    for key in &copied.property_order {
                        if let Some(desc) = copied.properties.get(key) {
                            o.insert_property(key.clone(), desc.clone());
                        }
                    }
                }
                continue;
            }
            let (key, naming_key) = match self.eval_property_key(&prop.key, env) {
                Ok(k) => k,
                Err(e) => return Completion::Throw(e),
            };
            let parent = ParentSyntax::Property {
                property: prop,
                key: &naming_key,
            };
            let value = match self.eval_named_value(&prop.value, &parent, env, prop.method) {
                Completion::Normal(v) => v,
                other => return other,
            };
            if naming::is_proto_setter(prop) {
                match &value {
                    JsValue::Object(_) => obj.borrow_mut().prototype = self.object_of(&value),
                    JsValue::Null => obj.borrow_mut().prototype = None,
                    _ => {}
                }
                continue;
            }
            let mut o = obj.borrow_mut();
            match prop.kind {
                PropertyKind::Init => o.insert_value(key, value),
                PropertyKind::Get | PropertyKind::Set => {
                    let desc = merge_accessor(o.get_own_property(&key), prop.kind == PropertyKind::Get, value, true);
                    o.insert_property(key, desc);
                }
            }
        }
        Completion::Normal(Self::value_of(&obj))
    }

    fn eval_reference(&mut self, expr: &Expression, env: &EnvRef) -> Result<Reference, Completion> {
        match expr {
            Expression::Identifier(name) => Ok(Reference::Binding(name.clone())),
            Expression::Parenthesized(inner) => self.eval_reference(inner, env),
            Expression::Member(object, property) => {
                let base = match self.eval_expression(object, env) {
                    Completion::Normal(v) => v,
                    other => return Err(other),
                };
                match property {
                    MemberProperty::Dot(name) => Ok(Reference::Property(base, name.clone())),
                    MemberProperty::Private(name) => Ok(Reference::Private(base, name.clone())),
                    MemberProperty::Computed(key_expr) => {
                        let key_val = match self.eval_expression(key_expr, env) {
                            Completion::Normal(v) => v,
                            other => return Err(other),
                        };
                        if base.is_nullish() {
                            let msg = format!("Cannot read properties of {base}");
                            return Err(Completion::Throw(self.create_type_error(&msg)));
                        }
                        match self.to_property_key(&key_val) {
                            Ok(key) => Ok(Reference::Property(base, key)),
                            Err(e) => Err(Completion::Throw(e)),
                        }
                    }
                }
            }
            _ => Err(Completion::Throw(
                self.create_error("SyntaxError", "Invalid left-hand side in assignment"),
            )),
        }
    }

    fn pattern_reference(&mut self, target: &Pattern, env: &EnvRef) -> Result<Reference, Completion> {
        match target {
            Pattern::Identifier(name) => Ok(Reference::Binding(name.clone())),
            Pattern::Parenthesized(inner) => self.pattern_reference(inner, env),
            Pattern::Member(expr) => self.eval_reference(expr, env),
            _ => Err(Completion::Throw(
                self.create_error("SyntaxError", "Invalid left-hand side in assignment"),
            )),
        }
    }

    fn get_reference(&mut self, reference: &Reference, env: &EnvRef) -> Completion {
        match reference {
            Reference::Binding(name) => self.lookup_identifier(name, env),
            Reference::Property(base, key) => self.get_member(base, key),
            Reference::Private(base, name) => self.get_private(base, name),
        }
    }

    fn put_reference(&mut self, reference: &Reference, value: JsValue, env: &EnvRef) -> Completion {
        match reference {
            Reference::Binding(name) => self.assign_identifier(name, value, env),
            Reference::Property(base, key) => {
                let strict = env.borrow().strict;
                self.set_member(base, key, value, strict)
            }
            Reference::Private(base, name) => self.set_private(base, name, value),
        }
    }

    /// Assigns through a member-expression target inside a destructuring
    /// pattern.
    pub(crate) fn assign_to_member(&mut self, target: &Expression, value: JsValue, env: &EnvRef) -> Completion {
        match self.eval_reference(target, env) {
            Ok(reference) => self.put_reference(&reference, value, env),
            Err(comp) => comp,
        }
    }

    fn eval_assign(&mut self, op: AssignOp, target: &Pattern, value: &Expression, env: &EnvRef) -> Completion {
        let parent = ParentSyntax::Assignment { op, target };
        if op == AssignOp::Assign && matches!(target, Pattern::Array(_) | Pattern::Object(_)) {
            let v = match self.eval_named(value, &parent, env) {
                Completion::Normal(v) => v,
                other => return other,
            };
            let comp = self.bind_pattern(target, v.clone(), env, BindMode::Assign);
            if comp.is_abrupt() {
                return comp;
            }
            return Completion::Normal(v);
        }

        let reference = match self.pattern_reference(target, env) {
            Ok(r) => r,
            Err(comp) => return comp,
        };
        let result = if op == AssignOp::Assign {
            match self.eval_named(value, &parent, env) {
                Completion::Normal(v) => v,
                other => return other,
            }
        } else {
            let current = match self.get_reference(&reference, env) {
                Completion::Normal(v) => v,
                other => return other,
            };
            let short_circuit = match op {
                AssignOp::LogicalAndAssign => Some(!to_boolean(&current)),
                AssignOp::LogicalOrAssign => Some(to_boolean(&current)),
                AssignOp::NullishAssign => Some(!current.is_nullish()),
                _ => None,
            };
            match short_circuit {
                Some(true) => return Completion::Normal(current),
                Some(false) => match self.eval_named(value, &parent, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                },
                None => {
                    let rhs = match self.eval_named(value, &parent, env) {
                        Completion::Normal(v) => v,
                        other => return other,
                    };
                    let bin_op = match op {
                        AssignOp::AddAssign => BinaryOp::Add,
                        AssignOp::SubAssign => BinaryOp::Sub,
                        AssignOp::MulAssign => BinaryOp::Mul,
                        AssignOp::DivAssign => BinaryOp::Div,
                        _ => BinaryOp::Mod,
                    };
                    match self.eval_binary(bin_op, &current, &rhs) {
                        Ok(v) => v,
                        Err(e) => return Completion::Throw(e),
                    }
                }
            }
        };
        match self.put_reference(&reference, result.clone(), env) {
            Completion::Throw(e) => Completion::Throw(e),
            _ => Completion::Normal(result),
        }
    }

    fn eval_update(&mut self, op: UpdateOp, prefix: bool, arg: &Expression, env: &EnvRef) -> Completion {
        let reference = match self.eval_reference(arg, env) {
            Ok(r) => r,
            Err(comp) => return comp,
        };
        let old = match self.get_reference(&reference, env) {
            Completion::Normal(v) => v,
            other => return other,
        };
        let old = match self.to_number(&old) {
            Ok(n) => n,
            Err(e) => return Completion::Throw(e),
        };
        let new = match op {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        if let Completion::Throw(e) = self.put_reference(&reference, JsValue::Number(new), env) {
            return Completion::Throw(e);
        }
        Completion::Normal(JsValue::Number(if prefix { new } else { old }))
    }

    fn eval_delete(&mut self, target: &Expression, env: &EnvRef) -> Completion {
        match target.without_parens() {
            Expression::Member(..) => {
                let (base, key) = match self.eval_reference(target, env) {
                    Ok(Reference::Property(base, key)) => (base, key),
                    Ok(_) => {
                        return Completion::Throw(
                            self.create_error("SyntaxError", "Private fields can not be deleted"),
                        );
                    }
                    Err(comp) => return comp,
                };
                let Some(obj) = self.object_of(&base) else {
                    return Completion::Normal(JsValue::Boolean(true));
                };
                let configurable = obj
                    .borrow()
                    .get_own_property(&key)
                    .map(|d| d.configurable != Some(false));
                match configurable {
                    None => Completion::Normal(JsValue::Boolean(true)),
                    Some(true) => {
                        obj.borrow_mut().remove_property(&key);
                        Completion::Normal(JsValue::Boolean(true))
                    }
                    Some(false) if env.borrow().strict => {
                        let msg = format!(
                            "Cannot delete property '{}' of {}",
                            helpers::display_key(&key),
                            self.format_value(&base)
                        );
                        Completion::Throw(self.create_type_error(&msg))
                    }
                    Some(false) => Completion::Normal(JsValue::Boolean(false)),
                }
            }
            Expression::Identifier(_) => Completion::Normal(JsValue::Boolean(false)),
            _ => match self.eval_expression(target, env) {
                Completion::Normal(_) => Completion::Normal(JsValue::Boolean(true)),
                other => other,
            },
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &JsValue, right: &JsValue) -> Result<JsValue, JsValue> {
        Ok(match op {
            BinaryOp::Add => {
                let l = self.to_primitive(left, false)?;
                let r = self.to_primitive(right, false)?;
                if matches!(l, JsValue::String(_)) || matches!(r, JsValue::String(_)) {
                    let mut s = self.to_string_value(&l)?;
                    s.push_str(&self.to_string_value(&r)?);
                    JsValue::String(s)
                } else {
                    JsValue::Number(self.to_number(&l)? + self.to_number(&r)?)
                }
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.to_number(left)?;
                let r = self.to_number(right)?;
                JsValue::Number(match op {
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    _ => l % r,
                })
            }
            BinaryOp::Eq => JsValue::Boolean(self.loose_equals(left, right)?),
            BinaryOp::NotEq => JsValue::Boolean(!self.loose_equals(left, right)?),
            BinaryOp::StrictEq => JsValue::Boolean(strict_equality(left, right)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!strict_equality(left, right)),
            BinaryOp::Lt => JsValue::Boolean(self.less_than(left, right)?.unwrap_or(false)),
            BinaryOp::Gt => JsValue::Boolean(self.less_than(right, left)?.unwrap_or(false)),
            BinaryOp::LtEq => JsValue::Boolean(self.less_than(right, left)?.is_some_and(|lt| !lt)),
            BinaryOp::GtEq => JsValue::Boolean(self.less_than(left, right)?.is_some_and(|lt| !lt)),
            BinaryOp::In => {
                let Some(obj) = self.object_of(right) else {
                    let msg = format!("Cannot use 'in' operator to search for '{left}' in {right}");
                    return Err(self.create_type_error(&msg));
                };
                let key = self.to_property_key(left)?;
                JsValue::Boolean(obj.borrow().has_property(&key))
            }
            BinaryOp::Instanceof => JsValue::Boolean(self.instance_of(left, right)?),
        })
    }

    // §7.2.13 IsLessThan
    fn less_than(&mut self, left: &JsValue, right: &JsValue) -> Result<Option<bool>, JsValue> {
        let l = self.to_primitive(left, false)?;
        let r = self.to_primitive(right, false)?;
        if let (JsValue::String(a), JsValue::String(b)) = (&l, &r) {
            return Ok(Some(a.encode_utf16().lt(b.encode_utf16())));
        }
        let a = self.to_number(&l)?;
        let b = self.to_number(&r)?;
        Ok(number_ops::less_than(a, b))
    }

    fn eval_arguments(&mut self, args: &[Expression], env: &EnvRef) -> Result<Vec<JsValue>, Completion> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Expression::Spread(inner) => {
                    let v = match self.eval_expression(inner, env) {
                        Completion::Normal(v) => v,
                        other => return Err(other),
                    };
                    match self.collect_elements(&v, None) {
                        Ok(items) => values.extend(items),
                        Err(e) => return Err(Completion::Throw(e)),
                    }
                }
                _ => match self.eval_expression(arg, env) {
                    Completion::Normal(v) => values.push(v),
                    other => return Err(other),
                },
            }
        }
        Ok(values)
    }

    fn eval_call(&mut self, callee: &Expression, args: &[Expression], env: &EnvRef) -> Completion {
        let (func, this) = if let Expression::Member(..) = callee.without_parens() {
            let reference = match self.eval_reference(callee, env) {
                Ok(r) => r,
                Err(comp) => return comp,
            };
            let func = match self.get_reference(&reference, env) {
                Completion::Normal(v) => v,
                other => return other,
            };
            let this = match reference {
                Reference::Property(base, _) | Reference::Private(base, _) => base,
                Reference::Binding(_) => JsValue::Undefined,
            };
            (func, this)
        } else {
            match self.eval_expression(callee, env) {
                Completion::Normal(v) => (v, JsValue::Undefined),
                other => return other,
            }
        };
        let args = match self.eval_arguments(args, env) {
            Ok(args) => args,
            Err(comp) => return comp,
        };
        if !self.is_callable(&func) {
            let msg = format!("{} is not a function", describe_callee(callee));
            return Completion::Throw(self.create_type_error(&msg));
        }
        self.call_function(&func, &this, &args)
    }

    fn eval_super_call(&mut self, args: &[Expression], env: &EnvRef) -> Completion {
        let class = env.borrow().get("%class");
        let Ok(class) = class else {
            return Completion::Throw(self.create_error("SyntaxError", "'super' keyword unexpected here"));
        };
        let this = env.borrow().get("this").unwrap_or(JsValue::Undefined);
        let args = match self.eval_arguments(args, env) {
            Ok(args) => args,
            Err(comp) => return comp,
        };
        self.super_call(&class, &this, &args)
    }

    /// ClassDefinitionEvaluation. The constructor receives its name before
    /// any element is defined, so a static `name` member replaces it.
    pub(crate) fn eval_class(&mut self, class: ClassParts<'_>, value: &NameableValue, env: &EnvRef) -> Completion {
        trace!(
            binding = class.name.unwrap_or(""),
            elements = class.body.len(),
            derived = class.super_class.is_some(),
            "defining class"
        );
        let class_env = Environment::new(Some(env.clone()));
        class_env.borrow_mut().strict = true;
        if let Some(name) = class.name {
            class_env.borrow_mut().declare(name, BindingKind::Const);
        }

        let (heritage, proto_parent, ctor_parent) = match class.super_class {
            None => (None, self.object_prototype.clone(), self.function_prototype.clone()),
            Some(expr) => {
                let parent = match self.eval_expression(expr, &class_env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                if let JsValue::Null = parent {
                    (Some(JsValue::Null), None, self.function_prototype.clone())
                } else if self.is_constructor(&parent) {
                    let proto = match self.get_member(&parent, "prototype") {
                        Completion::Normal(p) => p,
                        other => return other,
                    };
                    let proto_parent = match &proto {
                        JsValue::Null => None,
                        JsValue::Object(_) => self.object_of(&proto),
                        _ => {
                            return Completion::Throw(self.create_type_error(
                                "Class extends value does not have valid prototype property",
                            ));
                        }
                    };
                    let ctor_parent = self.object_of(&parent);
                    (Some(parent), proto_parent, ctor_parent)
                } else {
                    let msg = format!(
                        "Class extends value {} is not a constructor or null",
                        self.format_value(&parent)
                    );
                    return Completion::Throw(self.create_type_error(&msg));
                }
            }
        };

        let proto = self.create_object_with_proto(proto_parent);
        let proto_val = Self::value_of(&proto);
        let ctor_method = class.body.iter().find_map(|element| match element {
            ClassElement::Method(m) if m.kind == ClassMethodKind::Constructor => Some(m),
            _ => None,
        });
        let (params, body) = match ctor_method.map(|m| &m.value) {
            Some(Expression::Function(f)) => (f.params.clone(), f.body.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        let ctor = self.create_function(JsFunction::User {
            kind: NameableKind::Class,
            params,
            body: FunctionBody::Block(body),
            closure: class_env.clone(),
            is_arrow: false,
            is_async: false,
            is_method: false,
            is_strict: true,
            source_text: class.source_text.to_string(),
            class: Some(ClassData {
                heritage,
                default_constructor: ctor_method.is_none(),
                fields: Vec::new(),
                private_methods: Vec::new(),
                scope: class_env.clone(),
            }),
        });
        let Some(ctor_obj) = self.object_of(&ctor) else {
            return Completion::Normal(ctor);
        };
        {
            let mut c = ctor_obj.borrow_mut();
            c.prototype = ctor_parent;
            c.insert_property(
                "prototype".to_string(),
                PropertyDescriptor::data(proto_val, false, false, false),
            );
        }
        proto
            .borrow_mut()
            .insert_builtin("constructor".to_string(), ctor.clone());
        self.install_function_name(&ctor, value, class.source_text);

        let mut static_elements = Vec::new();
        let mut instance_fields = Vec::new();
        let mut private_methods: Vec<(String, PropertyDescriptor)> = Vec::new();
        for element in class.body {
            match element {
                ClassElement::Method(m) if m.kind == ClassMethodKind::Constructor => {}
                ClassElement::Method(m) => {
                    let (key, naming_key) = match self.eval_property_key(&m.key, &class_env) {
                        Ok(k) => k,
                        Err(e) => return Completion::Throw(e),
                    };
                    let role = match m.kind {
                        ClassMethodKind::Get => Role::Get,
                        ClassMethodKind::Set => Role::Set,
                        _ => Role::Init,
                    };
                    let parent = ParentSyntax::ClassElement {
                        key: &naming_key,
                        role,
                    };
                    let func = match self.eval_named_value(&m.value, &parent, &class_env, true) {
                        Completion::Normal(v) => v,
                        other => return other,
                    };
                    let is_private = matches!(m.key, PropertyKey::Private(_));
                    if is_private && !m.is_static {
                        let existing = private_methods
                            .iter()
                            .position(|(name, _)| *name == key);
                        let desc = private_method_descriptor(
                            existing.map(|i| &private_methods[i].1),
                            role,
                            func,
                        );
                        match existing {
                            Some(i) => private_methods[i].1 = desc,
                            None => private_methods.push((key, desc)),
                        }
                        continue;
                    }
                    let target = if m.is_static { &ctor_obj } else { &proto };
                    let mut t = target.borrow_mut();
                    if is_private {
                        let desc = private_method_descriptor(t.private_fields.get(&key), role, func);
                        t.private_fields.insert(key, desc);
                    } else if role == Role::Init {
                        t.insert_property(key, PropertyDescriptor::data(func, true, false, true));
                    } else {
                        let desc = merge_accessor(t.get_own_property(&key), role == Role::Get, func, false);
                        t.insert_property(key, desc);
                    }
                }
                ClassElement::Field(f) => {
                    let (key, naming_key) = match self.eval_property_key(&f.key, &class_env) {
                        Ok(k) => k,
                        Err(e) => return Completion::Throw(e),
                    };
                    let record = FieldRecord {
                        key: match &f.key {
                            PropertyKey::Private(name) => FieldKey::Private(name.clone()),
                            _ => FieldKey::Public(key),
                        },
                        naming_key,
                        initializer: f.value.clone(),
                    };
                    if f.is_static {
                        static_elements.push(StaticElement::Field(record));
                    } else {
                        instance_fields.push(record);
                    }
                }
                ClassElement::StaticBlock(stmts) => static_elements.push(StaticElement::Block(stmts)),
            }
        }

        if let Some(name) = class.name {
            class_env
                .borrow_mut()
                .initialize(name, BindingKind::Const, ctor.clone());
        }
        if let Some(JsFunction::User {
            class: Some(data), ..
        }) = &mut ctor_obj.borrow_mut().callable
        {
            data.fields = instance_fields;
            data.private_methods = private_methods;
        }

        for element in static_elements {
            let comp = match element {
                StaticElement::Field(record) => self.define_field(&ctor, &record, &class_env),
                StaticElement::Block(stmts) => {
                    let block_env = Environment::new(Some(class_env.clone()));
                    block_env
                        .borrow_mut()
                        .initialize("this", BindingKind::Const, ctor.clone());
                    self.hoist_var_declarations(stmts, &block_env);
                    self.exec_statements(stmts, &block_env)
                }
            };
            if comp.is_abrupt() {
                return comp;
            }
        }
        Completion::Normal(ctor)
    }

    /// Runs one field initializer against `this` and defines the field.
    pub(crate) fn define_field(&mut self, this: &JsValue, field: &FieldRecord, scope: &EnvRef) -> Completion {
        let env = Environment::new(Some(scope.clone()));
        env.borrow_mut()
            .initialize("this", BindingKind::Const, this.clone());
        let value = match &field.initializer {
            Some(init) => {
                let parent = ParentSyntax::ClassElement {
                    key: &field.naming_key,
                    role: Role::Init,
                };
                match self.eval_named(init, &parent, &env) {
                    Completion::Normal(v) => v,
                    other => return other,
                }
            }
            None => JsValue::Undefined,
        };
        let Some(obj) = self.object_of(this) else {
            return Completion::Normal(JsValue::Undefined);
        };
        match &field.key {
            FieldKey::Public(key) => {
                let defined = obj
                    .borrow_mut()
                    .define_own_property(key.clone(), PropertyDescriptor::data_default(value));
                if !defined {
                    let msg = format!("Cannot redefine property: {}", helpers::display_key(key));
                    return Completion::Throw(self.create_type_error(&msg));
                }
            }
            FieldKey::Private(name) => {
                let mut o = obj.borrow_mut();
                if o.private_fields.contains_key(name) {
                    drop(o);
                    let msg = format!("Cannot initialize #{name} twice on the same object");
                    return Completion::Throw(self.create_type_error(&msg));
                }
                o.private_fields
                    .insert(name.clone(), PropertyDescriptor::data(value, true, false, false));
            }
        }
        Completion::Normal(JsValue::Undefined)
    }
}

/// A getter or setter joined with the other half of an existing accessor
/// pair, if there is one.
fn merge_accessor(
    existing: Option<&PropertyDescriptor>,
    is_getter: bool,
    func: JsValue,
    enumerable: bool,
) -> PropertyDescriptor {
    let (get, set) = match existing {
        Some(d) if d.is_accessor_descriptor() => (d.get.clone(), d.set.clone()),
        _ => (None, None),
    };
    if is_getter {
        PropertyDescriptor::accessor(Some(func), set, enumerable, true)
    } else {
        PropertyDescriptor::accessor(get, Some(func), enumerable, true)
    }
}

fn private_method_descriptor(
    existing: Option<&PropertyDescriptor>,
    role: Role,
    func: JsValue,
) -> PropertyDescriptor {
    match role {
        Role::Init => PropertyDescriptor::data(func, false, false, false),
        Role::Get => merge_accessor(existing, true, func, false),
        Role::Set => merge_accessor(existing, false, func, false),
    }
}

fn describe_callee(callee: &Expression) -> String {
    match callee.without_parens() {
        Expression::Identifier(name) => name.clone(),
        Expression::Member(object, MemberProperty::Dot(name)) => {
            format!("{}.{name}", describe_callee(object))
        }
        Expression::Member(object, MemberProperty::Private(name)) => {
            format!("{}.#{name}", describe_callee(object))
        }
        Expression::This => "this".to_string(),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Result<String, String> {
        let program = crate::parser::parse(source).map_err(|e| e.to_string())?;
        let mut interp = Interpreter::new();
        match interp.run(&program) {
            Completion::Throw(e) => Err(interp.format_value(&e)),
            Completion::Normal(v) | Completion::Return(v) => Ok(interp.format_value(&v)),
        }
    }

    #[test]
    fn class_elements_evaluate_in_order() {
        let source = "var log = [];
            function k(x) { log[log.length] = x; return x; }
            class C { [k('a')]() {} static [k('b')] = 1; [k('c')] = 2; static { log[log.length] = 'block'; } }
            log;";
        assert_eq!(eval(source), Ok("a,b,c,block".to_string()));
    }

    #[test]
    fn static_field_sees_class_as_this() {
        assert_eq!(eval("class C { static self = this; } C.self === C;"), Ok("true".to_string()));
    }

    #[test]
    fn class_binding_is_immutable_inside() {
        let result = eval("class C { static f() { C = 1; } } C.f();");
        assert_eq!(result, Err("TypeError: Assignment to constant variable.".to_string()));
    }

    #[test]
    fn constructor_prototype_is_not_writable() {
        assert_eq!(
            eval("class C {} var p = C.prototype; C.prototype = {}; C.prototype === p;"),
            Ok("true".to_string())
        );
    }

    #[test]
    fn logical_assignment_short_circuits_before_evaluating() {
        let source = "var hits = 0; var x = 1; x ||= (hits = 1); hits;";
        assert_eq!(eval(source), Ok("0".to_string()));
    }

    #[test]
    fn member_target_is_evaluated_before_value() {
        let source = "var order = ''; var o = {};
            function t() { order += 't'; return o; }
            function v() { order += 'v'; return 1; }
            t().p = v(); order;";
        assert_eq!(eval(source), Ok("tv".to_string()));
    }

    #[test]
    fn typeof_unresolvable_is_undefined() {
        assert_eq!(eval("typeof nowhere;"), Ok("undefined".to_string()));
        assert_eq!(eval("nowhere;"), Err("ReferenceError: nowhere is not defined".to_string()));
    }

    #[test]
    fn derived_class_extends_non_constructor_throws() {
        let result = eval("class A extends 1 {}");
        assert_eq!(result, Err("TypeError: Class extends value 1 is not a constructor or null".to_string()));
    }

    #[test]
    fn delete_respects_configurability() {
        assert_eq!(eval("var o = { a: 1 }; delete o.a; o.a;"), Ok("undefined".to_string()));
        let strict = eval("'use strict'; var f = function() {}; delete f.prototype;");
        assert!(strict.is_err());
    }

    #[test]
    fn array_pattern_rejects_array_like_objects() {
        let result = eval("var [a] = { length: 4294967295 };");
        assert!(result.as_ref().is_err_and(|e| e.starts_with("TypeError")), "{result:?}");
    }

    #[test]
    fn array_pattern_reads_only_the_elements_it_binds() {
        let source = "var big = [1, 2]; big.length = 4294967295;
            var [first, second = function() {}] = big; first + second;";
        assert_eq!(eval(source), Ok("3".to_string()));
    }

    #[test]
    fn apply_spreads_array_likes_within_bounds() {
        assert_eq!(
            eval("(function(a, b) { return a + b; }).apply(null, { length: 2, 0: 1, 1: 2 });"),
            Ok("3".to_string())
        );
        let result = eval("(function() {}).apply(null, { length: 4294967295 });");
        assert!(result.as_ref().is_err_and(|e| e.starts_with("RangeError")), "{result:?}");
    }
}
