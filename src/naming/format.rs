use super::{NamingContext, PropertyKey, Role};
use crate::types::number_ops;

/// Renders the name a context gives. `NamingContext::None` gives the empty
/// string, which is the name an anonymous function ends up with.
pub fn format(context: &NamingContext) -> String {
    match context {
        NamingContext::VariableDeclarator(name)
        | NamingContext::SimpleAssignmentTarget(name)
        | NamingContext::DefaultValuePosition(name) => name.clone(),
        NamingContext::PropertyDefinition(key, role) | NamingContext::ClassElement(key, role) => {
            with_role(key_text(key), *role)
        }
        NamingContext::None => String::new(),
    }
}

fn key_text(key: &PropertyKey) -> String {
    match key {
        PropertyKey::Identifier(s) | PropertyKey::String(s) => s.clone(),
        PropertyKey::Number(n) => number_ops::to_string(*n),
        PropertyKey::Symbol(Some(description)) => format!("[{description}]"),
        PropertyKey::Symbol(None) => String::new(),
        PropertyKey::Private(name) => format!("#{name}"),
    }
}

fn with_role(text: String, role: Role) -> String {
    match role {
        Role::Init => text,
        Role::Get => format!("get {text}"),
        Role::Set => format!("set {text}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(key: PropertyKey, role: Role) -> String {
        format(&NamingContext::PropertyDefinition(key, role))
    }

    #[test]
    fn binding_names_pass_through() {
        assert_eq!(format(&NamingContext::VariableDeclarator("a".into())), "a");
        assert_eq!(format(&NamingContext::SimpleAssignmentTarget("b".into())), "b");
        assert_eq!(format(&NamingContext::DefaultValuePosition("c".into())), "c");
        assert_eq!(format(&NamingContext::None), "");
    }

    #[test]
    fn property_keys() {
        assert_eq!(prop(PropertyKey::Identifier("a".into()), Role::Init), "a");
        assert_eq!(prop(PropertyKey::String("b c".into()), Role::Init), "b c");
        assert_eq!(prop(PropertyKey::String("".into()), Role::Init), "");
        assert_eq!(prop(PropertyKey::Number(1.0), Role::Init), "1");
        assert_eq!(prop(PropertyKey::Number(1.5), Role::Init), "1.5");
        assert_eq!(prop(PropertyKey::Number(1e21), Role::Init), "1e+21");
    }

    #[test]
    fn symbol_keys_are_bracketed() {
        assert_eq!(prop(PropertyKey::Symbol(Some("foo".into())), Role::Init), "[foo]");
        assert_eq!(prop(PropertyKey::Symbol(Some("".into())), Role::Init), "[]");
        assert_eq!(prop(PropertyKey::Symbol(None), Role::Init), "");
    }

    #[test]
    fn accessor_prefixes() {
        assert_eq!(prop(PropertyKey::Identifier("d".into()), Role::Get), "get d");
        assert_eq!(prop(PropertyKey::Number(2.0), Role::Set), "set 2");
        assert_eq!(
            prop(PropertyKey::Symbol(Some("s".into())), Role::Get),
            "get [s]"
        );
        assert_eq!(prop(PropertyKey::Symbol(None), Role::Get), "get ");
    }

    #[test]
    fn class_elements_and_private_names() {
        assert_eq!(
            format(&NamingContext::ClassElement(
                PropertyKey::Private("x".into()),
                Role::Init
            )),
            "#x"
        );
        assert_eq!(
            format(&NamingContext::ClassElement(
                PropertyKey::Private("p".into()),
                Role::Get
            )),
            "get #p"
        );
    }
}
