use super::*;

const ERROR_KINDS: [&str; 5] = ["Error", "TypeError", "ReferenceError", "SyntaxError", "RangeError"];

impl Interpreter {
    pub(crate) fn setup_globals(&mut self) {
        // Intrinsic prototypes come first: every function allocated below
        // inherits from %Function.prototype%.
        let object_proto = self.create_object_with_proto(None);
        self.object_prototype = Some(object_proto.clone());
        let function_proto = self.create_object_with_proto(Some(object_proto.clone()));
        {
            let mut f = function_proto.borrow_mut();
            f.insert_property(
                "name".to_string(),
                PropertyDescriptor::data(JsValue::str(""), false, false, true),
            );
            f.insert_property(
                "length".to_string(),
                PropertyDescriptor::data(JsValue::Number(0.0), false, false, true),
            );
        }
        self.function_prototype = Some(function_proto.clone());
        let array_proto = self.create_object_with_proto(Some(object_proto.clone()));
        self.array_prototype = Some(array_proto);

        self.setup_object_prototype(&object_proto);
        self.setup_function_prototype(&function_proto);
        self.setup_object_statics(&object_proto);
        self.setup_symbol();
        self.setup_errors(&object_proto);
        self.setup_assertions();
    }

    fn define_method(
        &mut self,
        target: &ObjectRef,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) {
        let func = self.create_native_function(name, arity, f);
        target.borrow_mut().insert_builtin(name.to_string(), func);
    }

    fn define_global(&mut self, name: &str, value: JsValue) {
        self.global_env
            .borrow_mut()
            .initialize(name, BindingKind::Var, value);
    }

    fn define_global_fn(
        &mut self,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) {
        let func = self.create_native_function(name, arity, f);
        self.define_global(name, func);
    }

    fn setup_object_prototype(&mut self, proto: &ObjectRef) {
        // §20.1.3.2 Object.prototype.hasOwnProperty
        self.define_method(proto, "hasOwnProperty", 1, |interp, this, args| {
            let key = match interp.to_property_key(&arg(args, 0)) {
                Ok(k) => k,
                Err(e) => return Completion::Throw(e),
            };
            let has = interp
                .object_of(this)
                .is_some_and(|o| o.borrow().has_own_property(&key));
            Completion::Normal(JsValue::Boolean(has))
        });
        // §20.1.3.6 Object.prototype.toString
        self.define_method(proto, "toString", 0, |interp, this, _args| {
            let tag = match this {
                JsValue::Undefined => "Undefined".to_string(),
                JsValue::Null => "Null".to_string(),
                _ => match interp.object_of(this) {
                    Some(o) if o.borrow().callable.is_some() => "Function".to_string(),
                    Some(o) => o.borrow().class_name.clone(),
                    None => "Object".to_string(),
                },
            };
            Completion::Normal(JsValue::String(format!("[object {tag}]")))
        });

        // §B.2.2.1 Object.prototype.__proto__
        let getter = self.create_native_function("get __proto__", 0, |interp, this, _args| {
            let proto = interp.object_of(this).and_then(|o| o.borrow().prototype.clone());
            Completion::Normal(proto.as_ref().map_or(JsValue::Null, Interpreter::value_of))
        });
        let setter = self.create_native_function("set __proto__", 1, |interp, this, args| {
            let Some(obj) = interp.object_of(this) else {
                return Completion::Normal(JsValue::Undefined);
            };
            match arg(args, 0) {
                JsValue::Null => obj.borrow_mut().prototype = None,
                proto @ JsValue::Object(_) => obj.borrow_mut().prototype = interp.object_of(&proto),
                _ => {}
            }
            Completion::Normal(JsValue::Undefined)
        });
        proto.borrow_mut().insert_property(
            "__proto__".to_string(),
            PropertyDescriptor::accessor(Some(getter), Some(setter), false, true),
        );
    }

    fn setup_function_prototype(&mut self, proto: &ObjectRef) {
        // §20.2.3.5 Function.prototype.toString
        self.define_method(proto, "toString", 0, |interp, this, _args| {
            let func = interp.object_of(this).and_then(|o| o.borrow().callable.clone());
            match func {
                Some(func) => Completion::Normal(JsValue::String(func.source_text())),
                None => Completion::Throw(interp.create_type_error(
                    "Function.prototype.toString requires that 'this' be a Function",
                )),
            }
        });
        // §20.2.3.3 Function.prototype.call
        self.define_method(proto, "call", 1, |interp, this, args| {
            let rest = args.get(1..).unwrap_or_default();
            interp.call_function(this, &arg(args, 0), rest)
        });
        // §20.2.3.1 Function.prototype.apply
        self.define_method(proto, "apply", 2, |interp, this, args| {
            let list = match arg(args, 1) {
                JsValue::Undefined | JsValue::Null => Vec::new(),
                array => match interp.list_from_array_like(&array) {
                    Ok(items) => items,
                    Err(e) => return Completion::Throw(e),
                },
            };
            interp.call_function(this, &arg(args, 0), &list)
        });
    }

    fn setup_object_statics(&mut self, object_proto: &ObjectRef) {
        let object_ctor = self.create_native_function("Object", 1, |interp, _this, args| {
            match arg(args, 0) {
                value @ JsValue::Object(_) => Completion::Normal(value),
                _ => {
                    let obj = interp.create_object();
                    Completion::Normal(Interpreter::value_of(&obj))
                }
            }
        });
        let Some(ctor) = self.object_of(&object_ctor) else {
            return;
        };
        ctor.borrow_mut().insert_property(
            "prototype".to_string(),
            PropertyDescriptor::data(Self::value_of(object_proto), false, false, false),
        );
        object_proto
            .borrow_mut()
            .insert_builtin("constructor".to_string(), object_ctor.clone());

        // §20.1.2.8 Object.getOwnPropertyDescriptor
        self.define_method(&ctor, "getOwnPropertyDescriptor", 2, |interp, _this, args| {
            let key = match interp.to_property_key(&arg(args, 1)) {
                Ok(k) => k,
                Err(e) => return Completion::Throw(e),
            };
            let desc = interp
                .object_of(&arg(args, 0))
                .and_then(|o| o.borrow().get_own_property(&key).cloned());
            match desc {
                Some(desc) => Completion::Normal(interp.from_property_descriptor(&desc)),
                None => Completion::Normal(JsValue::Undefined),
            }
        });
        // §20.1.2.10 Object.getOwnPropertyNames
        self.define_method(&ctor, "getOwnPropertyNames", 1, |interp, _this, args| {
            let keys: Vec<JsValue> = interp
                .object_of(&arg(args, 0))
                .map(|o| o.borrow().own_string_keys().cloned().map(JsValue::String).collect())
                .unwrap_or_default();
            Completion::Normal(interp.create_array(keys))
        });
        // §20.1.2.18 Object.keys
        self.define_method(&ctor, "keys", 1, |interp, _this, args| {
            let keys: Vec<JsValue> = interp
                .object_of(&arg(args, 0))
                .map(|o| {
                    let o = o.borrow();
                    o.own_string_keys()
                        .filter(|k| o.properties.get(*k).is_some_and(|d| d.enumerable != Some(false)))
                        .cloned()
                        .map(JsValue::String)
                        .collect()
                })
                .unwrap_or_default();
            Completion::Normal(interp.create_array(keys))
        });
        // §20.1.2.4 Object.defineProperty
        self.define_method(&ctor, "defineProperty", 3, |interp, _this, args| {
            let target = arg(args, 0);
            let Some(obj) = interp.object_of(&target) else {
                return Completion::Throw(interp.create_type_error("Object.defineProperty called on non-object"));
            };
            let key = match interp.to_property_key(&arg(args, 1)) {
                Ok(k) => k,
                Err(e) => return Completion::Throw(e),
            };
            let desc = match interp.to_property_descriptor(&arg(args, 2)) {
                Ok(d) => d,
                Err(e) => return Completion::Throw(e),
            };
            if !obj.borrow_mut().define_own_property(key.clone(), desc) {
                let msg = format!("Cannot redefine property: {}", helpers::display_key(&key));
                return Completion::Throw(interp.create_type_error(&msg));
            }
            Completion::Normal(target)
        });
        // §20.1.2.12 Object.getPrototypeOf
        self.define_method(&ctor, "getPrototypeOf", 1, |interp, _this, args| {
            let target = arg(args, 0);
            let Some(obj) = interp.object_of(&target) else {
                let msg = format!("Object.getPrototypeOf called on {target}");
                return Completion::Throw(interp.create_type_error(&msg));
            };
            let proto = obj.borrow().prototype.clone();
            Completion::Normal(proto.as_ref().map_or(JsValue::Null, Interpreter::value_of))
        });
        // §20.1.2.2 Object.create
        self.define_method(&ctor, "create", 2, |interp, _this, args| {
            let proto = match arg(args, 0) {
                JsValue::Null => None,
                value @ JsValue::Object(_) => interp.object_of(&value),
                other => {
                    let msg = format!("Object prototype may only be an Object or null: {other}");
                    return Completion::Throw(interp.create_type_error(&msg));
                }
            };
            let obj = interp.create_object_with_proto(proto);
            Completion::Normal(Interpreter::value_of(&obj))
        });

        self.define_global("Object", object_ctor);
    }

    fn setup_symbol(&mut self) {
        // §20.4.1.1 Symbol([description]); no `prototype`, so `new Symbol` throws.
        self.define_global_fn("Symbol", 0, |interp, _this, args| {
            let description = match arg(args, 0) {
                JsValue::Undefined => None,
                value => match interp.to_string_value(&value) {
                    Ok(s) => Some(s),
                    Err(e) => return Completion::Throw(e),
                },
            };
            Completion::Normal(interp.new_symbol(description))
        });
    }

    fn setup_errors(&mut self, object_proto: &ObjectRef) {
        for kind in ERROR_KINDS {
            let parent = match kind {
                "Error" => Some(object_proto.clone()),
                _ => self.error_prototypes.get("Error").cloned(),
            };
            let proto = self.create_object_with_proto(parent);
            {
                let mut p = proto.borrow_mut();
                p.insert_builtin("name".to_string(), JsValue::str(kind));
                p.insert_builtin("message".to_string(), JsValue::str(""));
            }
            if kind == "Error" {
                // §20.5.3.4 Error.prototype.toString
                self.define_method(&proto, "toString", 0, |interp, this, _args| {
                    if !this.is_object() {
                        return Completion::Throw(
                            interp.create_type_error("Error.prototype.toString requires that 'this' be an Object"),
                        );
                    }
                    let mut text = |key: &str, default: &str| match interp.get_member(this, key) {
                        Completion::Normal(JsValue::Undefined) => Ok(default.to_string()),
                        Completion::Normal(v) => interp.to_string_value(&v),
                        Completion::Throw(e) | Completion::Return(e) => Err(e),
                    };
                    let name = match text("name", "Error") {
                        Ok(s) => s,
                        Err(e) => return Completion::Throw(e),
                    };
                    let message = match text("message", "") {
                        Ok(s) => s,
                        Err(e) => return Completion::Throw(e),
                    };
                    let rendered = match (name.is_empty(), message.is_empty()) {
                        (_, true) => name,
                        (true, false) => message,
                        (false, false) => format!("{name}: {message}"),
                    };
                    Completion::Normal(JsValue::String(rendered))
                });
            }

            let ctor = self.create_native_function(kind, 1, move |interp, this, args| {
                let message = match arg(args, 0) {
                    JsValue::Undefined => None,
                    value => match interp.to_string_value(&value) {
                        Ok(s) => Some(s),
                        Err(e) => return Completion::Throw(e),
                    },
                };
                // `new` hands over a freshly allocated object; a plain call
                // allocates one itself.
                match interp.object_of(this) {
                    Some(obj) => {
                        let mut o = obj.borrow_mut();
                        o.class_name = "Error".to_string();
                        if let Some(message) = message {
                            o.insert_builtin("message".to_string(), JsValue::String(message));
                        }
                        Completion::Normal(this.clone())
                    }
                    None => Completion::Normal(interp.create_error(kind, message.as_deref().unwrap_or(""))),
                }
            });
            if let Some(c) = self.object_of(&ctor) {
                c.borrow_mut().insert_property(
                    "prototype".to_string(),
                    PropertyDescriptor::data(Self::value_of(&proto), false, false, false),
                );
                if kind != "Error"
                    && let Some(base) = self.global_env.borrow().get("Error").ok()
                {
                    c.borrow_mut().prototype = self.object_of(&base);
                }
            }
            proto
                .borrow_mut()
                .insert_builtin("constructor".to_string(), ctor.clone());
            self.error_prototypes.insert(kind, proto);
            self.define_global(kind, ctor);
        }
    }

    /// The assertion helpers test scripts call: `assertEquals`,
    /// `assertTrue`, `assertFalse`, `assertThrows`, and `print`.
    fn setup_assertions(&mut self) {
        self.define_global_fn("assertEquals", 2, |interp, _this, args| {
            let (expected, found) = (arg(args, 0), arg(args, 1));
            if interp.deep_equals(&expected, &found) {
                return Completion::Normal(JsValue::Undefined);
            }
            let msg = interp.failure_message(&expected, &found, &arg(args, 2));
            Completion::Throw(interp.create_error("Error", &msg))
        });
        self.define_global_fn("assertTrue", 1, |interp, _this, args| {
            interp.assert_same(JsValue::Boolean(true), &arg(args, 0), &arg(args, 1))
        });
        self.define_global_fn("assertFalse", 1, |interp, _this, args| {
            interp.assert_same(JsValue::Boolean(false), &arg(args, 0), &arg(args, 1))
        });
        self.define_global_fn("assertThrows", 2, |interp, _this, args| {
            let code = arg(args, 0);
            let expected_type = arg(args, 1);
            match interp.call_function(&code, &JsValue::Undefined, &[]) {
                Completion::Throw(e) => {
                    if interp.is_callable(&expected_type) {
                        match interp.instance_of(&e, &expected_type) {
                            Ok(true) => {}
                            Ok(false) => {
                                let msg = format!(
                                    "Fail: expected exception of type {}, found <{}>",
                                    interp.format_value(&expected_type),
                                    interp.format_value(&e)
                                );
                                return Completion::Throw(interp.create_error("Error", &msg));
                            }
                            Err(err) => return Completion::Throw(err),
                        }
                    }
                    Completion::Normal(JsValue::Undefined)
                }
                _ => Completion::Throw(interp.create_error("Error", "Fail: Did not throw exception")),
            }
        });
        self.define_global_fn("print", 0, |interp, _this, args| {
            let parts: Vec<String> = args.iter().map(|v| interp.format_value(v)).collect();
            println!("{}", parts.join(" "));
            Completion::Normal(JsValue::Undefined)
        });
    }

    fn assert_same(&mut self, expected: JsValue, found: &JsValue, name: &JsValue) -> Completion {
        if same_value(&expected, found) {
            return Completion::Normal(JsValue::Undefined);
        }
        let msg = self.failure_message(&expected, found, name);
        Completion::Throw(self.create_error("Error", &msg))
    }

    /// SameValue for primitives and identity for objects, except arrays,
    /// which compare element-wise.
    fn deep_equals(&self, a: &JsValue, b: &JsValue) -> bool {
        if same_value(a, b) {
            return true;
        }
        let (Some(x), Some(y)) = (self.object_of(a), self.object_of(b)) else {
            return false;
        };
        let (x, y) = (x.borrow(), y.borrow());
        if x.class_name != "Array" || y.class_name != "Array" {
            return false;
        }
        let len = x.get_property_value("length");
        if !matches!((&len, &y.get_property_value("length")), (Some(l), Some(r)) if same_value(l, r)) {
            return false;
        }
        let len = match len {
            Some(JsValue::Number(n)) => n as usize,
            _ => 0,
        };
        (0..len).all(|i| {
            let key = i.to_string();
            let left = x.get_property_value(&key).unwrap_or(JsValue::Undefined);
            let right = y.get_property_value(&key).unwrap_or(JsValue::Undefined);
            self.deep_equals(&left, &right)
        })
    }

    fn failure_message(&self, expected: &JsValue, found: &JsValue, name: &JsValue) -> String {
        let shown = |v: &JsValue| match v {
            JsValue::String(s) => format!("\"{s}\""),
            _ => self.format_value(v),
        };
        let prefix = match name {
            JsValue::Undefined => String::new(),
            other => format!("{}: ", self.format_value(other)),
        };
        format!("Fail: {prefix}expected <{}> found <{}>", shown(expected), shown(found))
    }
}

fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Result<Interpreter, String> {
        let program = crate::parser::parse(source).map_err(|e| e.to_string())?;
        let mut interp = Interpreter::new();
        match interp.run(&program) {
            Completion::Throw(e) => Err(interp.format_value(&e)),
            _ => Ok(interp),
        }
    }

    #[test]
    fn assertions_pass_and_fail() {
        assert!(run("assertEquals('a', 'a'); assertTrue(true); assertFalse(false);").is_ok());
        let err = run("assertEquals('a', 'b');").err().unwrap_or_default();
        assert_eq!(err, "Error: Fail: expected <\"a\"> found <\"b\">");
    }

    #[test]
    fn assert_equals_compares_arrays_elementwise() {
        assert!(run("assertEquals(['x', 1], ['x', 1]);").is_ok());
        assert!(run("assertEquals([1], [2]);").is_err());
    }

    #[test]
    fn assert_throws_checks_error_type() {
        assert!(run("assertThrows(() => { null.x }, TypeError);").is_ok());
        assert!(run("assertThrows(() => { undefinedName }, TypeError);").is_err());
        assert!(run("assertThrows(() => 1);").is_err());
    }

    #[test]
    fn error_constructors_chain_to_error() {
        assert!(
            run("var e = new TypeError('bad'); assertTrue(e instanceof Error); \
                 assertEquals('TypeError: bad', e.toString()); \
                 assertEquals('RangeError', RangeError('x').name);")
            .is_ok()
        );
    }

    #[test]
    fn proto_accessor_reads_and_writes_prototype() {
        assert!(
            run("var p = {}; var o = {}; o.__proto__ = p; \
                 assertTrue(Object.getPrototypeOf(o) === p); \
                 assertTrue(o.__proto__ === p);")
            .is_ok()
        );
    }

    #[test]
    fn symbols_are_not_constructors() {
        assert!(run("assertThrows(() => new Symbol('x'), TypeError);").is_ok());
    }
}
