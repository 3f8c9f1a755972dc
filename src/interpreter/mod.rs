use crate::ast::*;
use crate::naming::{self, NAME_ATTRIBUTES, NameableKind, NameableValue};
use crate::types::{JsObject, JsSymbol, JsValue, number_ops, same_value, strict_equality, to_boolean};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

mod types;
pub use types::*;

mod builtins;
mod eval;
mod exec;
mod helpers;

pub(crate) type ObjectRef = Rc<RefCell<JsObjectData>>;

pub struct Interpreter {
    global_env: EnvRef,
    objects: Vec<Option<ObjectRef>>,
    object_prototype: Option<ObjectRef>,
    function_prototype: Option<ObjectRef>,
    array_prototype: Option<ObjectRef>,
    error_prototypes: FxHashMap<&'static str, ObjectRef>,
    next_symbol_id: u64,
    name_log: Option<Vec<NameRecord>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let global = Environment::new(None);
        {
            let mut env = global.borrow_mut();
            for (name, value) in [
                ("undefined", JsValue::Undefined),
                ("NaN", JsValue::Number(f64::NAN)),
                ("Infinity", JsValue::Number(f64::INFINITY)),
            ] {
                env.initialize(name, BindingKind::Const, value);
            }
            env.initialize("this", BindingKind::Const, JsValue::Undefined);
        }

        let mut interp = Self {
            global_env: global,
            objects: Vec::new(),
            object_prototype: None,
            function_prototype: None,
            array_prototype: None,
            error_prototypes: FxHashMap::default(),
            next_symbol_id: 1,
            name_log: None,
        };
        interp.setup_globals();
        interp
    }

    /// Start keeping a `NameRecord` for every nameable value created.
    pub fn record_names(&mut self) {
        self.name_log.get_or_insert_with(Vec::new);
    }

    pub fn take_name_log(&mut self) -> Vec<NameRecord> {
        self.name_log.take().unwrap_or_default()
    }

    pub fn run(&mut self, program: &Program) -> Completion {
        let env = self.global_env.clone();
        if Self::is_strict_mode_body(&program.body) {
            env.borrow_mut().strict = true;
        }
        self.hoist_var_declarations(&program.body, &env);
        self.exec_statements(&program.body, &env)
    }

    pub(crate) fn get_object(&self, id: u64) -> Option<ObjectRef> {
        self.objects.get(id as usize).and_then(|slot| slot.clone())
    }

    pub(crate) fn object_of(&self, val: &JsValue) -> Option<ObjectRef> {
        match val {
            JsValue::Object(o) => self.get_object(o.id),
            _ => None,
        }
    }

    fn allocate_object(&mut self, prototype: Option<ObjectRef>) -> ObjectRef {
        let id = self.objects.len() as u64;
        let mut data = JsObjectData::new(id);
        data.prototype = prototype;
        let obj = Rc::new(RefCell::new(data));
        self.objects.push(Some(obj.clone()));
        obj
    }

    pub(crate) fn create_object(&mut self) -> ObjectRef {
        self.allocate_object(self.object_prototype.clone())
    }

    pub(crate) fn create_object_with_proto(&mut self, prototype: Option<ObjectRef>) -> ObjectRef {
        self.allocate_object(prototype)
    }

    pub(crate) fn value_of(obj: &ObjectRef) -> JsValue {
        JsValue::Object(JsObject {
            id: obj.borrow().id,
        })
    }

    pub(crate) fn create_array(&mut self, values: Vec<JsValue>) -> JsValue {
        let obj = self.allocate_object(self.array_prototype.clone());
        {
            let mut o = obj.borrow_mut();
            o.class_name = "Array".to_string();
            let len = values.len();
            for (i, v) in values.into_iter().enumerate() {
                o.insert_value(i.to_string(), v);
            }
            o.insert_property(
                "length".to_string(),
                PropertyDescriptor::data(JsValue::Number(len as f64), true, false, false),
            );
        }
        Self::value_of(&obj)
    }

    pub(crate) fn new_symbol(&mut self, description: Option<String>) -> JsValue {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsValue::Symbol(JsSymbol { id, description })
    }

    pub(crate) fn is_strict_mode_body(body: &[Statement]) -> bool {
        for stmt in body {
            if let Statement::Expression(Expression::Literal(Literal::String(s))) = stmt {
                if s == "use strict" {
                    return true;
                }
            } else {
                break;
            }
        }
        false
    }

    /// Allocates a function object. User functions come out without a
    /// `name` property; `install_function_name` supplies it. Natives are
    /// named on the spot.
    pub(crate) fn create_function(&mut self, func: JsFunction) -> JsValue {
        let (fn_length, native_name) = match &func {
            JsFunction::User { params, .. } => (expected_argument_count(params), None),
            JsFunction::Native(name, arity, _) => (*arity, Some(name.clone())),
        };
        let constructor = func.is_user_constructor();
        let obj = self.allocate_object(self.function_prototype.clone());
        {
            let mut o = obj.borrow_mut();
            o.callable = Some(func);
            o.class_name = "Function".to_string();
            o.insert_property(
                "length".to_string(),
                PropertyDescriptor::data(JsValue::Number(fn_length as f64), false, false, true),
            );
            if let Some(name) = native_name {
                o.insert_property(
                    "name".to_string(),
                    PropertyDescriptor::data(JsValue::String(name), false, false, true),
                );
            }
        }
        let func_val = Self::value_of(&obj);
        if constructor {
            let proto = self.create_object();
            proto
                .borrow_mut()
                .insert_builtin("constructor".to_string(), func_val.clone());
            obj.borrow_mut().insert_property(
                "prototype".to_string(),
                PropertyDescriptor::data(Self::value_of(&proto), true, false, false),
            );
        }
        func_val
    }

    pub(crate) fn create_native_function(
        &mut self,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) -> JsValue {
        self.create_function(JsFunction::native(name, arity, f))
    }

    /// Writes the name decided for `value` onto `func` unless the object
    /// already has an own `name` property, and logs the outcome.
    pub(crate) fn install_function_name(
        &mut self,
        func: &JsValue,
        value: &NameableValue,
        source_text: &str,
    ) {
        if let (Some(name), Some(obj)) = (&value.name, self.object_of(func)) {
            let mut o = obj.borrow_mut();
            if o.has_own_property("name") {
                trace!(name = name.as_str(), "own name property kept");
            } else {
                o.insert_property(
                    "name".to_string(),
                    PropertyDescriptor::data(
                        JsValue::String(name.clone()),
                        NAME_ATTRIBUTES.writable,
                        NAME_ATTRIBUTES.enumerable,
                        NAME_ATTRIBUTES.configurable,
                    ),
                );
            }
        }
        if let Some(log) = &mut self.name_log {
            log.push(NameRecord {
                kind: value.kind,
                name: value.name.clone(),
                source_text: source_text.to_string(),
            });
        }
    }

    pub(crate) fn create_error(&mut self, kind: &str, message: &str) -> JsValue {
        let proto = self
            .error_prototypes
            .get(kind)
            .or_else(|| self.error_prototypes.get("Error"))
            .cloned();
        let obj = self.allocate_object(proto);
        {
            let mut o = obj.borrow_mut();
            o.class_name = "Error".to_string();
            o.insert_builtin("message".to_string(), JsValue::str(message));
        }
        Self::value_of(&obj)
    }

    pub(crate) fn create_type_error(&mut self, message: &str) -> JsValue {
        self.create_error("TypeError", message)
    }

    pub(crate) fn create_reference_error(&mut self, message: &str) -> JsValue {
        self.create_error("ReferenceError", message)
    }

    pub(crate) fn create_range_error(&mut self, message: &str) -> JsValue {
        self.create_error("RangeError", message)
    }

    pub(crate) fn to_property_descriptor(
        &mut self,
        val: &JsValue,
    ) -> Result<PropertyDescriptor, JsValue> {
        let Some(desc_obj) = self.object_of(val) else {
            return Err(self.create_type_error("Property description must be an object"));
        };
        let mut desc = PropertyDescriptor::default();
        for field in ["value", "writable", "get", "set", "enumerable", "configurable"] {
            if !desc_obj.borrow().has_property(field) {
                continue;
            }
            let v = match self.get_member(val, field) {
                Completion::Normal(v) => v,
                Completion::Throw(e) | Completion::Return(e) => return Err(e),
            };
            match field {
                "value" => desc.value = Some(v),
                "writable" => desc.writable = Some(to_boolean(&v)),
                "enumerable" => desc.enumerable = Some(to_boolean(&v)),
                "configurable" => desc.configurable = Some(to_boolean(&v)),
                "get" | "set" => {
                    if !v.is_undefined() && !self.is_callable(&v) {
                        let msg = format!("{} must be a function", capitalize(field));
                        return Err(self.create_type_error(&msg));
                    }
                    if field == "get" {
                        desc.get = Some(v);
                    } else {
                        desc.set = Some(v);
                    }
                }
                _ => {}
            }
        }
        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(self.create_type_error(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
            ));
        }
        Ok(desc)
    }

    pub(crate) fn from_property_descriptor(&mut self, desc: &PropertyDescriptor) -> JsValue {
        let result = self.create_object();
        {
            let mut r = result.borrow_mut();
            if let Some(ref val) = desc.value {
                r.insert_value("value".to_string(), val.clone());
            }
            if let Some(w) = desc.writable {
                r.insert_value("writable".to_string(), JsValue::Boolean(w));
            }
            if let Some(ref g) = desc.get {
                r.insert_value("get".to_string(), g.clone());
            }
            if let Some(ref s) = desc.set {
                r.insert_value("set".to_string(), s.clone());
            }
            if let Some(e) = desc.enumerable {
                r.insert_value("enumerable".to_string(), JsValue::Boolean(e));
            }
            if let Some(c) = desc.configurable {
                r.insert_value("configurable".to_string(), JsValue::Boolean(c));
            }
        }
        Self::value_of(&result)
    }

    /// Human-readable rendering used by `print` and for uncaught exceptions.
    pub fn format_value(&self, val: &JsValue) -> String {
        let JsValue::Object(o) = val else {
            return format!("{val}");
        };
        let Some(obj) = self.get_object(o.id) else {
            return format!("{val}");
        };
        let obj = obj.borrow();
        if let Some(func) = &obj.callable {
            return func.source_text();
        }
        if obj.class_name == "Array" {
            let len = match obj.get_property_value("length") {
                Some(JsValue::Number(n)) => n as usize,
                _ => 0,
            };
            return (0..len)
                .map(|i| match obj.get_property_value(&i.to_string()) {
                    Some(v) if !v.is_nullish() => self.format_value(&v),
                    _ => String::new(),
                })
                .collect::<Vec<_>>()
                .join(",");
        }
        if obj.class_name == "Error" {
            let text = |key: &str| match obj.get_property_descriptor(key).and_then(|d| d.value) {
                Some(JsValue::String(s)) => s,
                _ => String::new(),
            };
            let (name, message) = (text("name"), text("message"));
            return match (name.is_empty(), message.is_empty()) {
                (_, true) => name,
                (true, false) => message,
                (false, false) => format!("{name}: {message}"),
            };
        }
        format!("{val}")
    }
}

/// The `length` of a function: parameters before the first default or rest.
fn expected_argument_count(params: &[Pattern]) -> usize {
    params
        .iter()
        .take_while(|p| !matches!(p, Pattern::Assign(..) | Pattern::Rest(_)))
        .count()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn function_kind(is_async: bool, is_generator: bool) -> NameableKind {
    if is_generator {
        NameableKind::Generator
    } else if is_async {
        NameableKind::AsyncFunction
    } else {
        NameableKind::Function
    }
}
