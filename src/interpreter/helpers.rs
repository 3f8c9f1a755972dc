use super::*;

/// Largest argument list `Function.prototype.apply` will spread.
const MAX_ARGUMENTS: usize = 65535;

// §7.2.14 IsLooselyEqual, for operands already reduced to primitives
pub(crate) fn abstract_equality(left: &JsValue, right: &JsValue) -> bool {
    if std::mem::discriminant(left) == std::mem::discriminant(right) {
        return strict_equality(left, right);
    }
    match (left, right) {
        (l, r) if l.is_nullish() && r.is_nullish() => true,
        (JsValue::Number(_), JsValue::String(s)) => {
            abstract_equality(left, &JsValue::Number(number_ops::from_str(s)))
        }
        (JsValue::String(s), JsValue::Number(_)) => {
            abstract_equality(&JsValue::Number(number_ops::from_str(s)), right)
        }
        (JsValue::Boolean(b), _) => abstract_equality(&JsValue::Number(bool_number(*b)), right),
        (_, JsValue::Boolean(b)) => abstract_equality(left, &JsValue::Number(bool_number(*b))),
        _ => false,
    }
}

fn bool_number(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl Interpreter {
    pub(crate) fn is_callable(&self, val: &JsValue) -> bool {
        self.object_of(val)
            .is_some_and(|o| o.borrow().callable.is_some())
    }

    pub(crate) fn is_constructor(&self, val: &JsValue) -> bool {
        self.object_of(val).is_some_and(|o| {
            let o = o.borrow();
            match &o.callable {
                Some(JsFunction::Native(..)) => o.has_own_property("prototype"),
                Some(func) => func.is_user_constructor(),
                None => false,
            }
        })
    }

    pub(crate) fn typeof_value(&self, val: &JsValue) -> &'static str {
        if self.is_callable(val) {
            "function"
        } else {
            val.type_of()
        }
    }

    // §7.1.1 ToPrimitive
    pub(crate) fn to_primitive(&mut self, val: &JsValue, prefer_string: bool) -> Result<JsValue, JsValue> {
        if !val.is_object() {
            return Ok(val.clone());
        }
        let order = if prefer_string {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for method in order {
            let f = match self.get_member(val, method) {
                Completion::Normal(f) => f,
                Completion::Throw(e) | Completion::Return(e) => return Err(e),
            };
            if !self.is_callable(&f) {
                continue;
            }
            match self.call_function(&f, val, &[]) {
                Completion::Normal(result) | Completion::Return(result) => {
                    if !result.is_object() {
                        return Ok(result);
                    }
                }
                Completion::Throw(e) => return Err(e),
            }
        }
        Err(self.create_type_error("Cannot convert object to primitive value"))
    }

    // §7.1.4 ToNumber
    pub(crate) fn to_number(&mut self, val: &JsValue) -> Result<f64, JsValue> {
        Ok(match self.to_primitive(val, false)? {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(b) => bool_number(b),
            JsValue::Number(n) => n,
            JsValue::String(s) => number_ops::from_str(&s),
            JsValue::Symbol(_) => {
                return Err(self.create_type_error("Cannot convert a Symbol value to a number"));
            }
            JsValue::Object(_) => f64::NAN,
        })
    }

    // §7.1.17 ToString
    pub(crate) fn to_string_value(&mut self, val: &JsValue) -> Result<String, JsValue> {
        match self.to_primitive(val, true)? {
            JsValue::Symbol(_) => {
                Err(self.create_type_error("Cannot convert a Symbol value to a string"))
            }
            prim => Ok(prim.to_string()),
        }
    }

    // §7.1.19 ToPropertyKey
    pub(crate) fn to_property_key(&mut self, val: &JsValue) -> Result<String, JsValue> {
        match self.to_primitive(val, true)? {
            JsValue::Symbol(sym) => Ok(sym.to_property_key()),
            prim => self.to_string_value(&prim),
        }
    }

    /// Converts an evaluated computed key, keeping what inference needs to
    /// know about it: a symbol's description, or the key's string form.
    pub(crate) fn evaluated_key(
        &mut self,
        val: &JsValue,
    ) -> Result<(String, naming::PropertyKey), JsValue> {
        match self.to_primitive(val, true)? {
            JsValue::Symbol(sym) => Ok((
                sym.to_property_key(),
                naming::PropertyKey::Symbol(sym.description.clone()),
            )),
            prim => {
                let key = self.to_string_value(&prim)?;
                Ok((key.clone(), naming::PropertyKey::String(key)))
            }
        }
    }

    pub(crate) fn loose_equals(&mut self, left: &JsValue, right: &JsValue) -> Result<bool, JsValue> {
        if left.is_object() && right.is_object() {
            return Ok(strict_equality(left, right));
        }
        if left.is_nullish() || right.is_nullish() {
            return Ok(left.is_nullish() && right.is_nullish());
        }
        let l = self.to_primitive(left, false)?;
        let r = self.to_primitive(right, false)?;
        Ok(abstract_equality(&l, &r))
    }

    /// `[[Get]]` on any value, running getters with `base` as receiver.
    pub(crate) fn get_member(&mut self, base: &JsValue, key: &str) -> Completion {
        match base {
            JsValue::Object(o) => {
                let desc = self
                    .get_object(o.id)
                    .and_then(|obj| obj.borrow().get_property_descriptor(key));
                match desc {
                    Some(PropertyDescriptor { get: Some(getter), .. }) => {
                        if getter.is_undefined() {
                            Completion::Normal(JsValue::Undefined)
                        } else {
                            self.call_function(&getter, base, &[])
                        }
                    }
                    Some(desc) => Completion::Normal(desc.value.unwrap_or(JsValue::Undefined)),
                    None => Completion::Normal(JsValue::Undefined),
                }
            }
            JsValue::String(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                if key == "length" {
                    return Completion::Normal(JsValue::Number(units.len() as f64));
                }
                match key.parse::<usize>() {
                    Ok(i) if i < units.len() => Completion::Normal(JsValue::String(
                        String::from_utf16_lossy(&units[i..=i]),
                    )),
                    _ => Completion::Normal(JsValue::Undefined),
                }
            }
            JsValue::Symbol(sym) if key == "description" => Completion::Normal(
                sym.description
                    .clone()
                    .map_or(JsValue::Undefined, JsValue::String),
            ),
            JsValue::Undefined | JsValue::Null => {
                let msg = format!("Cannot read properties of {base} (reading '{}')", display_key(key));
                Completion::Throw(self.create_type_error(&msg))
            }
            _ => Completion::Normal(JsValue::Undefined),
        }
    }

    /// `[[Set]]`. Failed writes throw in strict code and are silently
    /// dropped otherwise.
    pub(crate) fn set_member(
        &mut self,
        base: &JsValue,
        key: &str,
        value: JsValue,
        strict: bool,
    ) -> Completion {
        let Some(obj) = self.object_of(base) else {
            if base.is_nullish() {
                let msg = format!("Cannot set properties of {base} (setting '{}')", display_key(key));
                return Completion::Throw(self.create_type_error(&msg));
            }
            return Completion::Normal(JsValue::Undefined);
        };
        let (desc, is_own) = {
            let o = obj.borrow();
            match o.get_own_property(key) {
                Some(d) => (Some(d.clone()), true),
                None => (o.get_property_descriptor(key), false),
            }
        };
        let failure = match desc {
            Some(d) if d.is_accessor_descriptor() => match d.set {
                Some(setter) if !setter.is_undefined() => {
                    return match self.call_function(&setter, base, &[value]) {
                        Completion::Throw(e) => Completion::Throw(e),
                        _ => Completion::Normal(JsValue::Undefined),
                    };
                }
                _ => Some(format!(
                    "Cannot set property {} of {} which has only a getter",
                    display_key(key),
                    self.format_value(base)
                )),
            },
            Some(d) if d.writable == Some(false) => Some(format!(
                "Cannot assign to read only property '{}' of {}",
                display_key(key),
                self.typeof_value(base)
            )),
            Some(_) if is_own => {
                if let Some(d) = obj.borrow_mut().properties.get_mut(key) {
                    d.value = Some(value);
                }
                None
            }
            _ => {
                let mut o = obj.borrow_mut();
                if o.extensible {
                    o.insert_value(key.to_string(), value);
                    None
                } else {
                    Some(format!(
                        "Cannot add property {}, object is not extensible",
                        display_key(key)
                    ))
                }
            }
        };
        match failure {
            Some(msg) if strict => Completion::Throw(self.create_type_error(&msg)),
            Some(_) => Completion::Normal(JsValue::Undefined),
            None => {
                grow_array_length(&mut obj.borrow_mut(), key);
                Completion::Normal(JsValue::Undefined)
            }
        }
    }

    pub(crate) fn get_private(&mut self, base: &JsValue, name: &str) -> Completion {
        let desc = self
            .object_of(base)
            .and_then(|o| o.borrow().private_fields.get(name).cloned());
        match desc {
            Some(PropertyDescriptor { get: Some(getter), .. }) if !getter.is_undefined() => {
                self.call_function(&getter, base, &[])
            }
            Some(d) if d.is_data_descriptor() => {
                Completion::Normal(d.value.unwrap_or(JsValue::Undefined))
            }
            Some(_) => {
                let msg = format!("'#{name}' was defined without a getter");
                Completion::Throw(self.create_type_error(&msg))
            }
            None => {
                let msg = format!("Cannot read private member #{name} from an object whose class did not declare it");
                Completion::Throw(self.create_type_error(&msg))
            }
        }
    }

    pub(crate) fn set_private(&mut self, base: &JsValue, name: &str, value: JsValue) -> Completion {
        let Some(obj) = self.object_of(base) else {
            let msg = format!("Cannot write private member #{name} to a non-object");
            return Completion::Throw(self.create_type_error(&msg));
        };
        let desc = obj.borrow().private_fields.get(name).cloned();
        match desc {
            Some(d) if d.is_accessor_descriptor() => match d.set {
                Some(setter) if !setter.is_undefined() => {
                    match self.call_function(&setter, base, &[value]) {
                        Completion::Throw(e) => Completion::Throw(e),
                        _ => Completion::Normal(JsValue::Undefined),
                    }
                }
                _ => {
                    let msg = format!("'#{name}' was defined without a setter");
                    Completion::Throw(self.create_type_error(&msg))
                }
            },
            Some(d) if d.writable == Some(false) => {
                let msg = format!("Private method #{name} is not writable");
                Completion::Throw(self.create_type_error(&msg))
            }
            Some(_) => {
                if let Some(d) = obj.borrow_mut().private_fields.get_mut(name) {
                    d.value = Some(value);
                }
                Completion::Normal(JsValue::Undefined)
            }
            None => {
                let msg = format!("Cannot write private member #{name} to an object whose class did not declare it");
                Completion::Throw(self.create_type_error(&msg))
            }
        }
    }

    /// Reads the elements of an array or string for destructuring and
    /// spread. Only arrays and strings are iterable here; `limit` stops the
    /// read once a pattern has all the elements it binds.
    pub(crate) fn collect_elements(&mut self, val: &JsValue, limit: Option<usize>) -> Result<Vec<JsValue>, JsValue> {
        let limit = limit.unwrap_or(usize::MAX);
        match val {
            JsValue::String(s) => Ok(s.chars().take(limit).map(|c| JsValue::String(c.to_string())).collect()),
            JsValue::Object(_) if self.is_array(val) => {
                let len = self.length_of(val)?;
                let mut items = Vec::new();
                for i in 0..len.min(limit) {
                    match self.get_member(val, &i.to_string()) {
                        Completion::Normal(v) => items.push(v),
                        Completion::Throw(e) | Completion::Return(e) => return Err(e),
                    }
                }
                Ok(items)
            }
            _ => {
                let msg = format!("{} is not iterable", self.format_value(val));
                Err(self.create_type_error(&msg))
            }
        }
    }

    // §7.3.18 CreateListFromArrayLike
    pub(crate) fn list_from_array_like(&mut self, val: &JsValue) -> Result<Vec<JsValue>, JsValue> {
        if !matches!(val, JsValue::Object(_)) {
            return Err(self.create_type_error("CreateListFromArrayLike called on non-object"));
        }
        let len = self.length_of(val)?;
        if len > MAX_ARGUMENTS {
            return Err(self.create_range_error("Too many arguments in function call"));
        }
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            match self.get_member(val, &i.to_string()) {
                Completion::Normal(v) => items.push(v),
                Completion::Throw(e) | Completion::Return(e) => return Err(e),
            }
        }
        Ok(items)
    }

    fn is_array(&self, val: &JsValue) -> bool {
        self.object_of(val).is_some_and(|o| o.borrow().class_name == "Array")
    }

    fn length_of(&mut self, val: &JsValue) -> Result<usize, JsValue> {
        let len = match self.get_member(val, "length") {
            Completion::Normal(v) => self.to_number(&v)?,
            Completion::Throw(e) | Completion::Return(e) => return Err(e),
        };
        Ok(if len.is_finite() && len > 0.0 { len as usize } else { 0 })
    }

    // §7.3.21 OrdinaryHasInstance
    pub(crate) fn instance_of(&mut self, val: &JsValue, ctor: &JsValue) -> Result<bool, JsValue> {
        if !self.is_callable(ctor) {
            return Err(self.create_type_error("Right-hand side of 'instanceof' is not callable"));
        }
        let proto = match self.get_member(ctor, "prototype") {
            Completion::Normal(p) => p,
            Completion::Throw(e) | Completion::Return(e) => return Err(e),
        };
        let (Some(target), Some(obj)) = (self.object_of(&proto), self.object_of(val)) else {
            return Ok(false);
        };
        let mut current = obj.borrow().prototype.clone();
        while let Some(p) = current {
            if Rc::ptr_eq(&p, &target) {
                return Ok(true);
            }
            current = p.borrow().prototype.clone();
        }
        Ok(false)
    }
}

/// Property keys as they read in messages; symbol keys drop their id.
/// Writing index `key` of an array extends its `length` past it.
fn grow_array_length(obj: &mut JsObjectData, key: &str) {
    if obj.class_name != "Array" {
        return;
    }
    let Ok(index) = key.parse::<u32>() else {
        return;
    };
    if index.to_string() != key {
        return;
    }
    let len = match obj.get_property_value("length") {
        Some(JsValue::Number(n)) => n,
        _ => 0.0,
    };
    if f64::from(index) >= len
        && let Some(d) = obj.properties.get_mut("length")
    {
        d.value = Some(JsValue::Number(f64::from(index) + 1.0));
    }
}

pub(crate) fn display_key(key: &str) -> String {
    if crate::types::is_symbol_key(key) {
        match key.rfind('#') {
            Some(i) => key[2..i].to_string(),
            None => key.to_string(),
        }
    } else {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_equality_of_primitives() {
        assert!(abstract_equality(&JsValue::Null, &JsValue::Undefined));
        assert!(abstract_equality(&JsValue::Number(1.0), &JsValue::str("1")));
        assert!(abstract_equality(&JsValue::Boolean(true), &JsValue::Number(1.0)));
        assert!(!abstract_equality(&JsValue::Null, &JsValue::Number(0.0)));
        assert!(!abstract_equality(&JsValue::str("a"), &JsValue::str("b")));
    }

    #[test]
    fn index_writes_grow_arrays() {
        let mut interp = Interpreter::new();
        let arr = interp.create_array(vec![JsValue::Number(1.0)]);
        interp.set_member(&arr, "3", JsValue::Number(2.0), true);
        interp.set_member(&arr, "07", JsValue::Number(3.0), true);
        let len = match interp.get_member(&arr, "length") {
            Completion::Normal(v) => v,
            other => panic!("unexpected {other:?}"),
        };
        assert!(matches!(len, JsValue::Number(n) if n == 4.0));
    }

    #[test]
    fn symbol_keys_display_without_id() {
        assert_eq!(display_key("@@Symbol(foo)#3"), "Symbol(foo)");
        assert_eq!(display_key("plain"), "plain");
    }
}
