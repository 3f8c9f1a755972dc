use crate::ast::*;
use crate::naming::{self, NameableKind};
use crate::types::JsValue;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub enum Completion {
    Normal(JsValue),
    Return(JsValue),
    Throw(JsValue),
}

impl Completion {
    pub(crate) fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }
}

pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug)]
pub struct Environment {
    pub(crate) bindings: FxHashMap<String, Binding>,
    pub(crate) parent: Option<EnvRef>,
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) value: JsValue,
    pub(crate) kind: BindingKind,
    pub(crate) initialized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BindingKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BindingError {
    Unresolvable,
    Uninitialized,
    ConstAssignment,
}

impl Environment {
    pub fn new(parent: Option<EnvRef>) -> EnvRef {
        let strict = parent.as_ref().is_some_and(|p| p.borrow().strict);
        Rc::new(RefCell::new(Environment {
            bindings: FxHashMap::default(),
            parent,
            strict,
        }))
    }

    /// Creates the binding; `let`/`const` stay uninitialized (TDZ) until
    /// `initialize` runs.
    pub(crate) fn declare(&mut self, name: &str, kind: BindingKind) {
        self.bindings.insert(
            name.to_string(),
            Binding {
                value: JsValue::Undefined,
                kind,
                initialized: kind == BindingKind::Var,
            },
        );
    }

    pub(crate) fn initialize(&mut self, name: &str, kind: BindingKind, value: JsValue) {
        self.bindings.insert(
            name.to_string(),
            Binding {
                value,
                kind,
                initialized: true,
            },
        );
    }

    pub(crate) fn set(&mut self, name: &str, value: JsValue) -> Result<(), BindingError> {
        if let Some(binding) = self.bindings.get_mut(name) {
            if !binding.initialized {
                return Err(BindingError::Uninitialized);
            }
            if binding.kind == BindingKind::Const {
                return Err(BindingError::ConstAssignment);
            }
            binding.value = value;
            Ok(())
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().set(name, value)
        } else if self.strict {
            Err(BindingError::Unresolvable)
        } else {
            // Sloppy-mode implicit global
            self.initialize(name, BindingKind::Var, value);
            Ok(())
        }
    }

    pub(crate) fn get(&self, name: &str) -> Result<JsValue, BindingError> {
        if let Some(binding) = self.bindings.get(name) {
            if !binding.initialized {
                return Err(BindingError::Uninitialized);
            }
            Ok(binding.value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            Err(BindingError::Unresolvable)
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
            || self.parent.as_ref().is_some_and(|p| p.borrow().has(name))
    }
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Concise arrow body.
    Expression(Expression),
}

pub type NativeFn = Rc<dyn Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> Completion>;

#[derive(Clone)]
pub enum JsFunction {
    User {
        kind: NameableKind,
        params: Vec<Pattern>,
        body: FunctionBody,
        closure: EnvRef,
        is_arrow: bool,
        is_async: bool,
        is_method: bool,
        is_strict: bool,
        source_text: String,
        class: Option<ClassData>,
    },
    Native(String, usize, NativeFn),
}

impl JsFunction {
    pub fn native(
        name: &str,
        arity: usize,
        f: impl Fn(&mut super::Interpreter, &JsValue, &[JsValue]) -> Completion + 'static,
    ) -> Self {
        JsFunction::Native(name.to_string(), arity, Rc::new(f))
    }

    /// Ordinary functions and classes; arrows, methods, generators and async
    /// functions are not constructors.
    pub(crate) fn is_user_constructor(&self) -> bool {
        match self {
            JsFunction::User {
                kind,
                is_arrow,
                is_method,
                class,
                ..
            } => class.is_some() || (*kind == NameableKind::Function && !is_arrow && !is_method),
            JsFunction::Native(..) => false,
        }
    }

    pub(crate) fn source_text(&self) -> String {
        match self {
            JsFunction::User { source_text, .. } => source_text.clone(),
            JsFunction::Native(name, _, _) => format!("function {name}() {{ [native code] }}"),
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::User { kind, params, .. } => {
                write!(f, "JsFunction::User({kind}, {} params)", params.len())
            }
            JsFunction::Native(name, arity, _) => {
                write!(f, "JsFunction::Native({name:?}, {arity})")
            }
        }
    }
}

/// What a class constructor carries beyond an ordinary function.
#[derive(Debug, Clone)]
pub struct ClassData {
    /// `None` for a base class; the evaluated `extends` value otherwise.
    pub heritage: Option<JsValue>,
    /// No `constructor` element was written.
    pub default_constructor: bool,
    pub fields: Vec<FieldRecord>,
    pub private_methods: Vec<(String, PropertyDescriptor)>,
    pub scope: EnvRef,
}

impl ClassData {
    pub(crate) fn is_derived(&self) -> bool {
        self.heritage.is_some()
    }
}

#[derive(Debug, Clone)]
pub enum FieldKey {
    Public(String),
    Private(String),
}

/// A class field with its key already evaluated.
#[derive(Debug, Clone)]
pub struct FieldRecord {
    pub key: FieldKey,
    pub naming_key: naming::PropertyKey,
    pub initializer: Option<Expression>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<JsValue>,
    pub set: Option<JsValue>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            get: None,
            set: None,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }

    pub fn accessor(
        get: Option<JsValue>,
        set: Option<JsValue>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            value: None,
            writable: None,
            get: Some(get.unwrap_or(JsValue::Undefined)),
            set: Some(set.unwrap_or(JsValue::Undefined)),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }
}

/// One entry of the name log: a nameable value and the name it was given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameRecord {
    pub kind: NameableKind,
    /// `None` when the class body supplies its own `name`.
    pub name: Option<String>,
    pub source_text: String,
}

pub struct JsObjectData {
    pub id: u64,
    pub properties: FxHashMap<String, PropertyDescriptor>,
    pub property_order: Vec<String>,
    pub prototype: Option<Rc<RefCell<JsObjectData>>>,
    pub callable: Option<JsFunction>,
    pub class_name: String,
    pub extensible: bool,
    pub private_fields: FxHashMap<String, PropertyDescriptor>,
}

impl JsObjectData {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype: None,
            callable: None,
            class_name: "Object".to_string(),
            extensible: true,
            private_fields: FxHashMap::default(),
        }
    }

    /// Looks `key` up along the prototype chain.
    pub fn get_property_descriptor(&self, key: &str) -> Option<PropertyDescriptor> {
        if let Some(desc) = self.properties.get(key) {
            return Some(desc.clone());
        }
        self.prototype
            .as_ref()
            .and_then(|proto| proto.borrow().get_property_descriptor(key))
    }

    pub fn get_own_property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
            || self
                .prototype
                .as_ref()
                .is_some_and(|proto| proto.borrow().has_property(key))
    }

    /// Own string keys in insertion order, symbol keys excluded.
    pub fn own_string_keys(&self) -> impl Iterator<Item = &String> {
        self.property_order
            .iter()
            .filter(|k| !crate::types::is_symbol_key(k))
    }

    /// ValidateAndApplyPropertyDescriptor: absent fields of `desc` keep
    /// their current values, and a non-configurable property only accepts
    /// compatible changes.
    pub fn define_own_property(&mut self, key: String, desc: PropertyDescriptor) -> bool {
        let merged = match self.properties.get(&key) {
            Some(current) => {
                if current.configurable == Some(false) {
                    if desc.configurable == Some(true) {
                        return false;
                    }
                    if desc.enumerable.is_some() && desc.enumerable != current.enumerable {
                        return false;
                    }
                    if desc.is_accessor_descriptor() != current.is_accessor_descriptor()
                        && (desc.is_accessor_descriptor() || desc.is_data_descriptor())
                    {
                        return false;
                    }
                    if current.is_data_descriptor() && current.writable == Some(false) {
                        if desc.writable == Some(true) {
                            return false;
                        }
                        if let (Some(new), Some(old)) = (&desc.value, &current.value)
                            && !crate::types::same_value(new, old)
                        {
                            return false;
                        }
                    }
                }
                merge_descriptor(current, desc)
            }
            None => {
                if !self.extensible {
                    return false;
                }
                complete_descriptor(desc)
            }
        };
        self.insert_property(key, merged);
        true
    }

    pub fn insert_value(&mut self, key: String, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data_default(value));
    }

    pub fn insert_builtin(&mut self, key: String, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data(value, true, false, true));
    }

    pub fn insert_property(&mut self, key: String, desc: PropertyDescriptor) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, desc);
    }

    pub fn remove_property(&mut self, key: &str) {
        if self.properties.remove(key).is_some() {
            self.property_order.retain(|k| k != key);
        }
    }

    pub fn get_property_value(&self, key: &str) -> Option<JsValue> {
        self.properties.get(key).and_then(|d| d.value.clone())
    }
}

fn merge_descriptor(current: &PropertyDescriptor, desc: PropertyDescriptor) -> PropertyDescriptor {
    let switching_to_accessor = desc.is_accessor_descriptor() && current.is_data_descriptor();
    let switching_to_data = desc.is_data_descriptor() && current.is_accessor_descriptor();
    let enumerable = desc.enumerable.or(current.enumerable);
    let configurable = desc.configurable.or(current.configurable);
    if switching_to_accessor {
        return PropertyDescriptor {
            enumerable,
            configurable,
            ..complete_descriptor(desc)
        };
    }
    if switching_to_data {
        return PropertyDescriptor {
            enumerable,
            configurable,
            ..complete_descriptor(desc)
        };
    }
    if current.is_accessor_descriptor() {
        PropertyDescriptor {
            value: None,
            writable: None,
            get: desc.get.or_else(|| current.get.clone()),
            set: desc.set.or_else(|| current.set.clone()),
            enumerable,
            configurable,
        }
    } else {
        PropertyDescriptor {
            value: desc.value.or_else(|| current.value.clone()),
            writable: desc.writable.or(current.writable),
            get: None,
            set: None,
            enumerable,
            configurable,
        }
    }
}

fn complete_descriptor(desc: PropertyDescriptor) -> PropertyDescriptor {
    if desc.is_accessor_descriptor() {
        PropertyDescriptor {
            value: None,
            writable: None,
            get: Some(desc.get.unwrap_or(JsValue::Undefined)),
            set: Some(desc.set.unwrap_or(JsValue::Undefined)),
            enumerable: Some(desc.enumerable.unwrap_or(false)),
            configurable: Some(desc.configurable.unwrap_or(false)),
        }
    } else {
        PropertyDescriptor {
            value: Some(desc.value.unwrap_or(JsValue::Undefined)),
            writable: Some(desc.writable.unwrap_or(false)),
            get: None,
            set: None,
            enumerable: Some(desc.enumerable.unwrap_or(false)),
            configurable: Some(desc.configurable.unwrap_or(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tdz_and_const() {
        let env = Environment::new(None);
        env.borrow_mut().declare("a", BindingKind::Let);
        assert_eq!(env.borrow().get("a").unwrap_err(), BindingError::Uninitialized);
        env.borrow_mut()
            .initialize("a", BindingKind::Const, JsValue::Number(1.0));
        assert_eq!(
            env.borrow_mut().set("a", JsValue::Null).unwrap_err(),
            BindingError::ConstAssignment
        );
        assert_eq!(env.borrow().get("b").unwrap_err(), BindingError::Unresolvable);
    }

    #[test]
    fn sloppy_global_assignment_creates_binding() {
        let global = Environment::new(None);
        let inner = Environment::new(Some(global.clone()));
        inner.borrow_mut().set("x", JsValue::Number(2.0)).unwrap();
        assert!(global.borrow().has("x"));

        global.borrow_mut().strict = true;
        let strict_inner = Environment::new(Some(global.clone()));
        assert!(strict_inner.borrow().strict);
        assert_eq!(
            strict_inner
                .borrow_mut()
                .set("y", JsValue::Undefined)
                .unwrap_err(),
            BindingError::Unresolvable
        );
    }

    #[test]
    fn define_merges_partial_descriptor() {
        let mut obj = JsObjectData::new(0);
        obj.insert_property(
            "name".into(),
            PropertyDescriptor::data(JsValue::str("f"), false, false, true),
        );
        let ok = obj.define_own_property(
            "name".into(),
            PropertyDescriptor {
                value: Some(JsValue::str("g")),
                ..Default::default()
            },
        );
        assert!(ok);
        let desc = obj.get_own_property("name").unwrap();
        assert!(matches!(&desc.value, Some(JsValue::String(s)) if s == "g"));
        assert_eq!(desc.writable, Some(false));
        assert_eq!(desc.configurable, Some(true));
    }

    #[test]
    fn non_configurable_rejects_changes() {
        let mut obj = JsObjectData::new(0);
        obj.insert_property(
            "k".into(),
            PropertyDescriptor::data(JsValue::Number(1.0), false, false, false),
        );
        assert!(!obj.define_own_property(
            "k".into(),
            PropertyDescriptor {
                value: Some(JsValue::Number(2.0)),
                ..Default::default()
            }
        ));
        assert!(obj.define_own_property(
            "k".into(),
            PropertyDescriptor {
                value: Some(JsValue::Number(1.0)),
                ..Default::default()
            }
        ));
    }

    #[test]
    fn symbol_keys_hidden_from_string_keys() {
        let mut obj = JsObjectData::new(0);
        obj.insert_value("a".into(), JsValue::Null);
        obj.insert_value("@@Symbol(s)#1".into(), JsValue::Null);
        obj.insert_value("b".into(), JsValue::Null);
        let keys: Vec<&String> = obj.own_string_keys().collect();
        assert_eq!(keys, ["a", "b"]);
        obj.remove_property("a");
        assert_eq!(obj.property_order, ["@@Symbol(s)#1", "b"]);
    }
}
