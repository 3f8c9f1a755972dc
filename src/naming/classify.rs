use super::NameableKind;
use crate::ast::{ClassElement, Expression};

/// A nameable construct found at the top of an expression.
#[derive(Clone, Copy, Debug)]
pub struct Classified<'a> {
    pub kind: NameableKind,
    /// The construct itself, parentheses removed.
    pub expr: &'a Expression,
    pub explicit_name: Option<&'a str>,
    /// A class whose body defines a static member literally named `name`.
    pub has_own_name_member: bool,
}

impl Classified<'_> {
    pub fn is_eligible(&self) -> bool {
        self.explicit_name.is_none() && !self.has_own_name_member
    }
}

pub fn strip_parens(expr: &Expression) -> &Expression {
    expr.without_parens()
}

/// Recognizes the constructs that take part in name inference. Anything
/// else, including calls and identifiers that merely evaluate to a function,
/// yields `None`.
pub fn classify(expr: &Expression) -> Option<Classified<'_>> {
    let inner = strip_parens(expr);
    let (kind, explicit_name, has_own_name_member) = match inner {
        Expression::Function(f) => {
            let kind = if f.is_generator {
                NameableKind::Generator
            } else if f.is_async {
                NameableKind::AsyncFunction
            } else {
                NameableKind::Function
            };
            (kind, f.name.as_deref(), false)
        }
        Expression::ArrowFunction(_) => (NameableKind::Arrow, None, false),
        Expression::Class(c) => (
            NameableKind::Class,
            c.name.as_deref(),
            class_defines_static_name(&c.body),
        ),
        _ => return None,
    };
    Some(Classified {
        kind,
        expr: inner,
        explicit_name,
        has_own_name_member,
    })
}

/// `static name() {}`, `static get name() {}`, `static name = ...` and the
/// string-literal and computed string-literal spellings of those keys.
pub fn class_defines_static_name(body: &[ClassElement]) -> bool {
    body.iter().any(|element| {
        element.is_static()
            && element
                .key()
                .and_then(|key| key.literal_name())
                .is_some_and(|name| name == "name")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::parser::parse;

    fn expr(source: &str) -> Expression {
        let program = parse(source).unwrap();
        match program.body.into_iter().next() {
            Some(Statement::Expression(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn kind_of(source: &str) -> Option<NameableKind> {
        classify(&expr(source)).map(|c| c.kind)
    }

    #[test]
    fn kinds() {
        assert_eq!(kind_of("(function() {})"), Some(NameableKind::Function));
        assert_eq!(kind_of("(function*() {})"), Some(NameableKind::Generator));
        assert_eq!(kind_of("(async function() {})"), Some(NameableKind::AsyncFunction));
        assert_eq!(kind_of("(async function*() {})"), Some(NameableKind::Generator));
        assert_eq!(kind_of("() => 1"), Some(NameableKind::Arrow));
        assert_eq!(kind_of("async () => 1"), Some(NameableKind::Arrow));
        assert_eq!(kind_of("(class {})"), Some(NameableKind::Class));
    }

    #[test]
    fn not_nameable() {
        assert_eq!(kind_of("f"), None);
        assert_eq!(kind_of("f()"), None);
        assert_eq!(kind_of("(0, function() {})"), None);
        assert_eq!(kind_of("cond ? function() {} : 1"), None);
    }

    #[test]
    fn parentheses_are_transparent() {
        let e = expr("(((function() {})))");
        let c = classify(&e).unwrap();
        assert!(matches!(c.expr, Expression::Function(_)));
        assert!(c.is_eligible());
    }

    #[test]
    fn explicit_name_blocks_inference() {
        let e = expr("(function foo() {})");
        let c = classify(&e).unwrap();
        assert_eq!(c.explicit_name, Some("foo"));
        assert!(!c.is_eligible());

        let e = expr("(class Bar {})");
        assert_eq!(classify(&e).unwrap().explicit_name, Some("Bar"));
    }

    #[test]
    fn static_name_member_blocks_inference() {
        for source in [
            "(class { static name() {} })",
            "(class { static get name() { return 1; } })",
            "(class { static name = 1 })",
            "(class { static 'name'() {} })",
            "(class { static ['name']() {} })",
        ] {
            let e = expr(source);
            let c = classify(&e).unwrap();
            assert!(c.has_own_name_member, "{source}");
            assert!(!c.is_eligible(), "{source}");
        }
        for source in [
            "(class { name() {} })",
            "(class { static other() {} })",
            "(class { static [key]() {} })",
        ] {
            let e = expr(source);
            assert!(!classify(&e).unwrap().has_own_name_member, "{source}");
        }
    }
}
