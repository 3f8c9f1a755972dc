use super::{Classified, NameableKind};

/// Attributes of an installed `name` property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

pub const NAME_ATTRIBUTES: NameAttributes = NameAttributes {
    writable: false,
    enumerable: false,
    configurable: true,
};

/// Naming state of one constructed function or class value.
#[derive(Clone, Debug, PartialEq)]
pub struct NameableValue {
    pub kind: NameableKind,
    /// The name to install, once there is one.
    pub name: Option<String>,
    pub has_own_or_explicit_name: bool,
    named: bool,
}

impl NameableValue {
    pub fn new(kind: NameableKind, explicit_name: Option<&str>, has_own_name_member: bool) -> Self {
        Self {
            kind,
            name: explicit_name.map(str::to_string),
            has_own_or_explicit_name: explicit_name.is_some() || has_own_name_member,
            named: explicit_name.is_some(),
        }
    }

    pub fn from_classified(classified: &Classified<'_>) -> Self {
        Self::new(
            classified.kind,
            classified.explicit_name,
            classified.has_own_name_member,
        )
    }

    pub fn is_named(&self) -> bool {
        self.named
    }
}

/// Gives `value` its inferred name. Returns false, leaving the value alone,
/// when it already has an explicit or own name or was named before.
pub fn assign(value: &mut NameableValue, name: String) -> bool {
    if value.has_own_or_explicit_name || value.named {
        return false;
    }
    value.name = Some(name);
    value.named = true;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_once() {
        let mut value = NameableValue::new(NameableKind::Arrow, None, false);
        assert!(!value.is_named());
        assert!(assign(&mut value, "first".into()));
        assert!(!assign(&mut value, "second".into()));
        assert_eq!(value.name.as_deref(), Some("first"));
        assert!(value.is_named());
    }

    #[test]
    fn empty_name_still_counts() {
        let mut value = NameableValue::new(NameableKind::Function, None, false);
        assert!(assign(&mut value, String::new()));
        assert!(!assign(&mut value, "late".into()));
        assert_eq!(value.name.as_deref(), Some(""));
    }

    #[test]
    fn explicit_name_wins() {
        let mut value = NameableValue::new(NameableKind::Function, Some("foo"), false);
        assert!(!assign(&mut value, "bar".into()));
        assert_eq!(value.name.as_deref(), Some("foo"));
    }

    #[test]
    fn own_name_member_leaves_name_unset() {
        let mut value = NameableValue::new(NameableKind::Class, None, true);
        assert!(!assign(&mut value, "C".into()));
        assert_eq!(value.name, None);
    }

    #[test]
    fn attributes() {
        assert!(!NAME_ATTRIBUTES.writable);
        assert!(!NAME_ATTRIBUTES.enumerable);
        assert!(NAME_ATTRIBUTES.configurable);
    }
}
