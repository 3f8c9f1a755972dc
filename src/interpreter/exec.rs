use super::eval::ClassParts;
use super::*;

/// How `bind_pattern` stores each bound name.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum BindMode {
    /// Create (or complete) the binding in the given environment.
    Initialize(BindingKind),
    /// Plain assignment through the scope chain.
    Assign,
}

impl Interpreter {
    /// Declares lexical bindings and instantiates function declarations for
    /// a statement list, then runs it.
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement], env: &EnvRef) -> Completion {
        for stmt in stmts {
            match stmt {
                Statement::Variable(decl) if decl.kind != VarKind::Var => {
                    let kind = if decl.kind == VarKind::Const {
                        BindingKind::Const
                    } else {
                        BindingKind::Let
                    };
                    for d in &decl.declarations {
                        Self::declare_pattern_names(&d.pattern, env, kind);
                    }
                }
                Statement::ClassDeclaration(c) => {
                    env.borrow_mut().declare(&c.name, BindingKind::Let);
                }
                _ => {}
            }
        }
        for stmt in stmts {
            if let Statement::FunctionDeclaration(f) = stmt {
                let func = self.instantiate_function_declaration(f, env);
                env.borrow_mut().initialize(&f.name, BindingKind::Var, func);
            }
        }

        let mut result = JsValue::Undefined;
        for stmt in stmts {
            match self.exec_statement(stmt, env) {
                Completion::Normal(val) => result = val,
                other => return other,
            }
        }
        Completion::Normal(result)
    }

    fn instantiate_function_declaration(&mut self, f: &FunctionDecl, env: &EnvRef) -> JsValue {
        let kind = function_kind(f.is_async, f.is_generator);
        let func = self.create_function(JsFunction::User {
            kind,
            params: f.params.clone(),
            body: FunctionBody::Block(f.body.clone()),
            closure: env.clone(),
            is_arrow: false,
            is_async: f.is_async,
            is_method: false,
            is_strict: env.borrow().strict || Self::is_strict_mode_body(&f.body),
            source_text: f.source_text.clone(),
            class: None,
        });
        let value = NameableValue::new(kind, Some(&f.name), false);
        self.install_function_name(&func, &value, &f.source_text);
        func
    }

    /// `var` names anywhere in a function body (blocks included, nested
    /// functions excluded) live in the function's environment.
    pub(crate) fn hoist_var_declarations(&mut self, stmts: &[Statement], env: &EnvRef) {
        for stmt in stmts {
            match stmt {
                Statement::Variable(decl) if decl.kind == VarKind::Var => {
                    for d in &decl.declarations {
                        Self::declare_pattern_names(&d.pattern, env, BindingKind::Var);
                    }
                }
                Statement::Block(body) => self.hoist_var_declarations(body, env),
                Statement::If(s) => {
                    self.hoist_var_declarations(std::slice::from_ref(&*s.consequent), env);
                    if let Some(alt) = &s.alternate {
                        self.hoist_var_declarations(std::slice::from_ref(&**alt), env);
                    }
                }
                Statement::While(w) => {
                    self.hoist_var_declarations(std::slice::from_ref(&*w.body), env)
                }
                Statement::For(f) => {
                    if let Some(ForInit::Variable(decl)) = &f.init
                        && decl.kind == VarKind::Var
                    {
                        for d in &decl.declarations {
                            Self::declare_pattern_names(&d.pattern, env, BindingKind::Var);
                        }
                    }
                    self.hoist_var_declarations(std::slice::from_ref(&*f.body), env);
                }
                Statement::Try(t) => {
                    self.hoist_var_declarations(&t.block, env);
                    if let Some(handler) = &t.handler {
                        self.hoist_var_declarations(&handler.body, env);
                    }
                    if let Some(finalizer) = &t.finalizer {
                        self.hoist_var_declarations(finalizer, env);
                    }
                }
                _ => {}
            }
        }
    }

    fn declare_pattern_names(pat: &Pattern, env: &EnvRef, kind: BindingKind) {
        match pat {
            Pattern::Identifier(name) => {
                let exists = env.borrow().bindings.contains_key(name);
                if kind != BindingKind::Var || !exists {
                    env.borrow_mut().declare(name, kind);
                }
            }
            Pattern::Array(elems) => {
                for elem in elems.iter().flatten() {
                    match elem {
                        ArrayPatternElement::Pattern(p) | ArrayPatternElement::Rest(p) => {
                            Self::declare_pattern_names(p, env, kind);
                        }
                    }
                }
            }
            Pattern::Object(props) => {
                for prop in props {
                    match prop {
                        ObjectPatternProperty::KeyValue(_, p) | ObjectPatternProperty::Rest(p) => {
                            Self::declare_pattern_names(p, env, kind);
                        }
                        ObjectPatternProperty::Shorthand(name) => {
                            Self::declare_pattern_names(&Pattern::Identifier(name.clone()), env, kind);
                        }
                    }
                }
            }
            Pattern::Assign(inner, _) | Pattern::Rest(inner) | Pattern::Parenthesized(inner) => {
                Self::declare_pattern_names(inner, env, kind);
            }
            Pattern::Member(_) => {}
        }
    }

    pub(crate) fn exec_statement(&mut self, stmt: &Statement, env: &EnvRef) -> Completion {
        match stmt {
            Statement::Empty | Statement::FunctionDeclaration(_) => {
                Completion::Normal(JsValue::Undefined)
            }
            Statement::Expression(expr) => self.eval_expression(expr, env),
            Statement::Block(stmts) => {
                let block_env = Environment::new(Some(env.clone()));
                self.exec_statements(stmts, &block_env)
            }
            Statement::Variable(decl) => self.exec_variable_declaration(decl, env),
            Statement::If(if_stmt) => {
                let test = match self.eval_expression(&if_stmt.test, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                if to_boolean(&test) {
                    self.exec_statement(&if_stmt.consequent, env)
                } else if let Some(alt) = &if_stmt.alternate {
                    self.exec_statement(alt, env)
                } else {
                    Completion::Normal(JsValue::Undefined)
                }
            }
            Statement::While(w) => self.exec_while(w, env),
            Statement::For(f) => self.exec_for(f, env),
            Statement::Return(expr) => {
                let val = if let Some(e) = expr {
                    match self.eval_expression(e, env) {
                        Completion::Normal(v) => v,
                        other => return other,
                    }
                } else {
                    JsValue::Undefined
                };
                Completion::Return(val)
            }
            Statement::Throw(expr) => {
                let val = match self.eval_expression(expr, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                Completion::Throw(val)
            }
            Statement::Try(t) => self.exec_try(t, env),
            Statement::ClassDeclaration(c) => {
                let value =
                    NameableValue::new(NameableKind::Class, Some(&c.name), naming::class_defines_static_name(&c.body));
                let parts = ClassParts {
                    name: Some(&c.name),
                    super_class: c.super_class.as_deref(),
                    body: &c.body,
                    source_text: &c.source_text,
                };
                let class = match self.eval_class(parts, &value, env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                env.borrow_mut()
                    .initialize(&c.name, BindingKind::Let, class);
                Completion::Normal(JsValue::Undefined)
            }
        }
    }

    fn exec_variable_declaration(&mut self, decl: &VariableDeclaration, env: &EnvRef) -> Completion {
        let mode = match decl.kind {
            VarKind::Var => BindMode::Assign,
            VarKind::Let => BindMode::Initialize(BindingKind::Let),
            VarKind::Const => BindMode::Initialize(BindingKind::Const),
        };
        for d in &decl.declarations {
            let val = match &d.init {
                Some(init) => {
                    let parent = naming::ParentSyntax::VariableDeclarator { target: &d.pattern };
                    match self.eval_named(init, &parent, env) {
                        Completion::Normal(v) => v,
                        other => return other,
                    }
                }
                // `var x;` leaves an existing value alone
                None if decl.kind == VarKind::Var => continue,
                None => JsValue::Undefined,
            };
            let comp = self.bind_pattern(&d.pattern, val, env, mode);
            if comp.is_abrupt() {
                return comp;
            }
        }
        Completion::Normal(JsValue::Undefined)
    }

    fn exec_while(&mut self, w: &WhileStatement, env: &EnvRef) -> Completion {
        let mut result = JsValue::Undefined;
        loop {
            let test = match self.eval_expression(&w.test, env) {
                Completion::Normal(v) => v,
                other => return other,
            };
            if !to_boolean(&test) {
                return Completion::Normal(result);
            }
            match self.exec_statement(&w.body, env) {
                Completion::Normal(v) => result = v,
                other => return other,
            }
        }
    }

    fn exec_for(&mut self, f: &ForStatement, env: &EnvRef) -> Completion {
        let mut loop_env = Environment::new(Some(env.clone()));
        let mut per_iteration: Vec<String> = Vec::new();
        match &f.init {
            Some(ForInit::Variable(decl)) => {
                if decl.kind != VarKind::Var {
                    let kind = if decl.kind == VarKind::Const {
                        BindingKind::Const
                    } else {
                        BindingKind::Let
                    };
                    for d in &decl.declarations {
                        Self::declare_pattern_names(&d.pattern, &loop_env, kind);
                    }
                    if decl.kind == VarKind::Let {
                        per_iteration = loop_env.borrow().bindings.keys().cloned().collect();
                    }
                }
                let comp = self.exec_variable_declaration(decl, &loop_env);
                if comp.is_abrupt() {
                    return comp;
                }
            }
            Some(ForInit::Expression(e)) => {
                if let comp @ (Completion::Throw(_) | Completion::Return(_)) =
                    self.eval_expression(e, &loop_env)
                {
                    return comp;
                }
            }
            None => {}
        }
        let mut result = JsValue::Undefined;
        loop {
            loop_env = self.copy_iteration_env(&loop_env, &per_iteration, env);
            if let Some(test) = &f.test {
                let val = match self.eval_expression(test, &loop_env) {
                    Completion::Normal(v) => v,
                    other => return other,
                };
                if !to_boolean(&val) {
                    return Completion::Normal(result);
                }
            }
            match self.exec_statement(&f.body, &loop_env) {
                Completion::Normal(v) => result = v,
                other => return other,
            }
            if let Some(update) = &f.update {
                loop_env = self.copy_iteration_env(&loop_env, &per_iteration, env);
                if let comp @ (Completion::Throw(_) | Completion::Return(_)) =
                    self.eval_expression(update, &loop_env)
                {
                    return comp;
                }
            }
        }
    }

    // §14.7.4.4 CreatePerIterationEnvironment
    fn copy_iteration_env(&mut self, current: &EnvRef, names: &[String], outer: &EnvRef) -> EnvRef {
        if names.is_empty() {
            return current.clone();
        }
        let next = Environment::new(Some(outer.clone()));
        {
            let cur = current.borrow();
            let mut n = next.borrow_mut();
            for name in names {
                if let Some(binding) = cur.bindings.get(name) {
                    n.bindings.insert(name.clone(), binding.clone());
                }
            }
        }
        next
    }

    fn exec_try(&mut self, t: &TryStatement, env: &EnvRef) -> Completion {
        let block_env = Environment::new(Some(env.clone()));
        let mut result = self.exec_statements(&t.block, &block_env);
        if let Some(handler) = &t.handler
            && let Completion::Throw(err) = result
        {
            let catch_env = Environment::new(Some(env.clone()));
            result = match &handler.param {
                Some(param) => {
                    let comp = self.bind_pattern(
                        param,
                        err,
                        &catch_env,
                        BindMode::Initialize(BindingKind::Let),
                    );
                    if comp.is_abrupt() {
                        comp
                    } else {
                        self.exec_statements(&handler.body, &catch_env)
                    }
                }
                None => self.exec_statements(&handler.body, &catch_env),
            };
        }
        if let Some(finalizer) = &t.finalizer {
            let fin_env = Environment::new(Some(env.clone()));
            let fin = self.exec_statements(finalizer, &fin_env);
            if fin.is_abrupt() {
                return fin;
            }
        }
        result
    }

    /// Binds `value` to `pattern`, destructuring as needed. Defaults are
    /// evaluated only when the incoming value is `undefined`, as the default
    /// of the binding they sit on.
    pub(crate) fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: JsValue,
        env: &EnvRef,
        mode: BindMode,
    ) -> Completion {
        match pattern {
            Pattern::Identifier(name) => self.bind_identifier(name, value, env, mode),
            Pattern::Parenthesized(inner) => self.bind_pattern(inner, value, env, mode),
            Pattern::Member(target) => self.assign_to_member(target, value, env),
            Pattern::Assign(target, default) => {
                let value = if value.is_undefined() {
                    let parent = naming::ParentSyntax::DefaultValue {
                        target: target.as_ref(),
                    };
                    match self.eval_named(default, &parent, env) {
                        Completion::Normal(v) => v,
                        other => return other,
                    }
                } else {
                    value
                };
                self.bind_pattern(target, value, env, mode)
            }
            Pattern::Rest(inner) => self.bind_pattern(inner, value, env, mode),
            Pattern::Array(elems) => {
                let needed = match elems.last() {
                    Some(Some(ArrayPatternElement::Rest(_))) => None,
                    _ => Some(elems.len()),
                };
                let items = match self.collect_elements(&value, needed) {
                    Ok(items) => items,
                    Err(e) => return Completion::Throw(e),
                };
                for (i, elem) in elems.iter().enumerate() {
                    let comp = match elem {
                        None => continue,
                        Some(ArrayPatternElement::Pattern(p)) => {
                            let item = items.get(i).cloned().unwrap_or(JsValue::Undefined);
                            self.bind_pattern(p, item, env, mode)
                        }
                        Some(ArrayPatternElement::Rest(p)) => {
                            let rest = items.get(i..).map(<[JsValue]>::to_vec).unwrap_or_default();
                            let arr = self.create_array(rest);
                            self.bind_pattern(p, arr, env, mode)
                        }
                    };
                    if comp.is_abrupt() {
                        return comp;
                    }
                }
                Completion::Normal(JsValue::Undefined)
            }
            Pattern::Object(props) => {
                if value.is_nullish() {
                    let msg = format!("Cannot destructure '{value}' as it is {value}.");
                    return Completion::Throw(self.create_type_error(&msg));
                }
                let mut used: Vec<String> = Vec::new();
                for prop in props {
                    let comp = match prop {
                        ObjectPatternProperty::Shorthand(name) => {
                            used.push(name.clone());
                            let v = match self.get_member(&value, name) {
                                Completion::Normal(v) => v,
                                other => return other,
                            };
                            self.bind_identifier(name, v, env, mode)
                        }
                        ObjectPatternProperty::KeyValue(key, target) => {
                            let key = match self.eval_pattern_key(key, env) {
                                Ok(k) => k,
                                Err(e) => return Completion::Throw(e),
                            };
                            let v = match self.get_member(&value, &key) {
                                Completion::Normal(v) => v,
                                other => return other,
                            };
                            used.push(key);
                            self.bind_pattern(target, v, env, mode)
                        }
                        ObjectPatternProperty::Rest(target) => {
                            let rest = self.copy_own_enumerable(&value, &used);
                            self.bind_pattern(target, rest, env, mode)
                        }
                    };
                    if comp.is_abrupt() {
                        return comp;
                    }
                }
                Completion::Normal(JsValue::Undefined)
            }
        }
    }

    fn eval_pattern_key(&mut self, key: &PropertyKey, env: &EnvRef) -> Result<String, JsValue> {
        match key {
            PropertyKey::Identifier(s) | PropertyKey::String(s) => Ok(s.clone()),
            PropertyKey::Number(n) => Ok(number_ops::to_string(*n)),
            PropertyKey::Computed(expr) => match self.eval_expression(expr, env) {
                Completion::Normal(v) => self.to_property_key(&v),
                Completion::Throw(e) | Completion::Return(e) => Err(e),
            },
            PropertyKey::Private(name) => {
                Err(self.create_type_error(&format!("Unexpected private name #{name} in pattern")))
            }
        }
    }

    /// A fresh object holding `source`'s own enumerable properties minus
    /// `excluded`.
    pub(crate) fn copy_own_enumerable(&mut self, source: &JsValue, excluded: &[String]) -> JsValue {
        let entries: Vec<(String, JsValue)> = match self.object_of(source) {
            Some(obj) => {
                let o = obj.borrow();
                o.property_order
                    .iter()
                    .filter(|k| !excluded.contains(k))
                    .filter_map(|k| {
                        let d = o.properties.get(k)?;
                        if d.enumerable != Some(true) {
                            return None;
                        }
                        Some((k.clone(), d.value.clone().unwrap_or(JsValue::Undefined)))
                    })
                    .collect()
            }
            None => Vec::new(),
        };
        let target = self.create_object();
        {
            let mut t = target.borrow_mut();
            for (k, v) in entries {
                t.insert_value(k, v);
            }
        }
        Self::value_of(&target)
    }

    fn bind_identifier(&mut self, name: &str, value: JsValue, env: &EnvRef, mode: BindMode) -> Completion {
        match mode {
            BindMode::Initialize(kind) => {
                env.borrow_mut().initialize(name, kind, value);
                Completion::Normal(JsValue::Undefined)
            }
            BindMode::Assign => self.assign_identifier(name, value, env),
        }
    }

    pub(crate) fn assign_identifier(&mut self, name: &str, value: JsValue, env: &EnvRef) -> Completion {
        let result = env.borrow_mut().set(name, value);
        match result {
            Ok(()) => Completion::Normal(JsValue::Undefined),
            Err(BindingError::ConstAssignment) => {
                Completion::Throw(self.create_type_error("Assignment to constant variable."))
            }
            Err(BindingError::Uninitialized) => {
                let msg = format!("Cannot access '{name}' before initialization");
                Completion::Throw(self.create_reference_error(&msg))
            }
            Err(BindingError::Unresolvable) => {
                let msg = format!("{name} is not defined");
                Completion::Throw(self.create_reference_error(&msg))
            }
        }
    }

    pub(crate) fn call_function(&mut self, func_val: &JsValue, this: &JsValue, args: &[JsValue]) -> Completion {
        let func = self
            .object_of(func_val)
            .and_then(|o| o.borrow().callable.clone());
        match func {
            Some(JsFunction::Native(_, _, f)) => f(self, this, args),
            Some(JsFunction::User { class: Some(_), .. }) => {
                let msg = "Class constructor cannot be invoked without 'new'";
                Completion::Throw(self.create_type_error(msg))
            }
            Some(func @ JsFunction::User { .. }) => self.call_user_function(func_val, &func, this, args),
            None => {
                let msg = format!("{} is not a function", self.format_value(func_val));
                Completion::Throw(self.create_type_error(&msg))
            }
        }
    }

    fn call_user_function(
        &mut self,
        func_val: &JsValue,
        func: &JsFunction,
        this: &JsValue,
        args: &[JsValue],
    ) -> Completion {
        let JsFunction::User {
            kind,
            params,
            body,
            closure,
            is_arrow,
            is_async,
            is_strict,
            class,
            ..
        } = func
        else {
            return Completion::Normal(JsValue::Undefined);
        };
        trace!(%kind, args = args.len(), "calling function");
        if *kind == NameableKind::Generator || *is_async {
            return Completion::Throw(
                self.create_type_error("Calling generator and async functions is not supported"),
            );
        }
        let env = Environment::new(Some(closure.clone()));
        {
            let mut e = env.borrow_mut();
            e.strict = *is_strict;
            if !is_arrow {
                e.initialize("this", BindingKind::Const, this.clone());
            }
            if class.is_some() {
                e.initialize("%class", BindingKind::Const, func_val.clone());
            }
        }
        for (i, param) in params.iter().enumerate() {
            let comp = match param {
                Pattern::Rest(inner) => {
                    let rest = self.create_array(args.get(i..).map(<[JsValue]>::to_vec).unwrap_or_default());
                    self.bind_pattern(inner, rest, &env, BindMode::Initialize(BindingKind::Var))
                }
                _ => {
                    let arg = args.get(i).cloned().unwrap_or(JsValue::Undefined);
                    self.bind_pattern(param, arg, &env, BindMode::Initialize(BindingKind::Var))
                }
            };
            if comp.is_abrupt() {
                return comp;
            }
        }
        match body {
            FunctionBody::Expression(expr) => self.eval_expression(expr, &env),
            FunctionBody::Block(stmts) => {
                self.hoist_var_declarations(stmts, &env);
                match self.exec_statements(stmts, &env) {
                    Completion::Normal(_) => Completion::Normal(JsValue::Undefined),
                    Completion::Return(v) => Completion::Normal(v),
                    Completion::Throw(e) => Completion::Throw(e),
                }
            }
        }
    }

    // §7.3.14 Construct
    pub(crate) fn construct(&mut self, func_val: &JsValue, args: &[JsValue]) -> Completion {
        if !self.is_constructor(func_val) {
            let msg = format!("{} is not a constructor", self.format_value(func_val));
            return Completion::Throw(self.create_type_error(&msg));
        }
        let proto = match self.get_member(func_val, "prototype") {
            Completion::Normal(p) => self.object_of(&p).or_else(|| self.object_prototype.clone()),
            other => return other,
        };
        let this_obj = self.create_object_with_proto(proto);
        let this_val = Self::value_of(&this_obj);
        match self.initialize_instance(func_val, &this_val, args) {
            Completion::Normal(v) | Completion::Return(v) if v.is_object() => Completion::Normal(v),
            Completion::Throw(e) => Completion::Throw(e),
            _ => Completion::Normal(this_val),
        }
    }

    /// Runs a constructor against an already allocated `this`: the class
    /// chain's field initializers and constructor bodies, or an ordinary
    /// function call.
    pub(crate) fn initialize_instance(&mut self, func_val: &JsValue, this: &JsValue, args: &[JsValue]) -> Completion {
        let func = self
            .object_of(func_val)
            .and_then(|o| o.borrow().callable.clone());
        match &func {
            Some(JsFunction::Native(_, _, f)) => f(self, this, args),
            Some(user @ JsFunction::User {
                class: Some(data), ..
            }) => {
                if !data.is_derived() {
                    let comp = self.initialize_fields(func_val, this);
                    if comp.is_abrupt() {
                        return comp;
                    }
                } else if data.default_constructor {
                    return self.super_call(func_val, this, args);
                }
                self.call_user_function(func_val, user, this, args)
            }
            Some(user) => self.call_user_function(func_val, user, this, args),
            None => Completion::Normal(JsValue::Undefined),
        }
    }

    /// `super(...args)` from the class `class_val`: the parent constructor
    /// runs against `this`, then `class_val`'s own fields are initialized.
    pub(crate) fn super_call(&mut self, class_val: &JsValue, this: &JsValue, args: &[JsValue]) -> Completion {
        let heritage = self.object_of(class_val).and_then(|o| match &o.borrow().callable {
            Some(JsFunction::User {
                class: Some(data), ..
            }) => data.heritage.clone(),
            _ => None,
        });
        let parent = match heritage {
            Some(parent) if self.is_constructor(&parent) => parent,
            _ => {
                return Completion::Throw(self.create_type_error("Super constructor is not a constructor"));
            }
        };
        let comp = self.initialize_instance(&parent, this, args);
        if let Completion::Throw(e) = comp {
            return Completion::Throw(e);
        }
        let comp = self.initialize_fields(class_val, this);
        if comp.is_abrupt() {
            return comp;
        }
        Completion::Normal(JsValue::Undefined)
    }

    /// Installs a class's private methods and runs its instance field
    /// initializers, in declaration order, against `this`.
    pub(crate) fn initialize_fields(&mut self, class_val: &JsValue, this: &JsValue) -> Completion {
        let data = self.object_of(class_val).and_then(|o| match &o.borrow().callable {
            Some(JsFunction::User {
                class: Some(data), ..
            }) => Some(data.clone()),
            _ => None,
        });
        let Some(data) = data else {
            return Completion::Normal(JsValue::Undefined);
        };
        if let Some(obj) = self.object_of(this) {
            let mut o = obj.borrow_mut();
            for (name, desc) in &data.private_methods {
                o.private_fields.insert(name.clone(), desc.clone());
            }
        }
        for field in &data.fields {
            let comp = self.define_field(this, field, &data.scope);
            if comp.is_abrupt() {
                return comp;
            }
        }
        Completion::Normal(JsValue::Undefined)
    }
}
