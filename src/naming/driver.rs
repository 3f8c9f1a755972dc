use super::{NameableValue, ParentSyntax, assign, classify, format, resolve};
use crate::ast::Expression;
use tracing::{debug, trace};

/// Called by the host when it evaluates `expr` as the direct child of
/// `parent`. Returns `None` when `expr` is not a nameable construct;
/// otherwise the value's naming state, with the inferred name filled in when
/// inference applies.
pub fn on_construct(expr: &Expression, parent: &ParentSyntax<'_>) -> Option<NameableValue> {
    let classified = classify(expr)?;
    let mut value = NameableValue::from_classified(&classified);
    if !classified.is_eligible() {
        trace!(
            kind = %value.kind,
            explicit = classified.explicit_name.unwrap_or(""),
            own_name_member = classified.has_own_name_member,
            "name inference skipped"
        );
        return Some(value);
    }
    let context = resolve(parent);
    if assign(&mut value, format(&context)) {
        debug!(
            kind = %value.kind,
            context = context.label(),
            name = value.name.as_deref().unwrap_or(""),
            "inferred function name"
        );
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignOp, Pattern, Statement};
    use crate::naming::{NameableKind, PropertyKey, Role};
    use crate::parser::parse;

    fn expr(source: &str) -> Expression {
        match parse(source).unwrap().body.into_iter().next() {
            Some(Statement::Expression(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn name_in(source: &str, parent: ParentSyntax<'_>) -> Option<String> {
        on_construct(&expr(source), &parent).and_then(|v| v.name)
    }

    #[test]
    fn non_nameable_is_ignored() {
        assert!(on_construct(&expr("factory()"), &ParentSyntax::Other).is_none());
        assert!(on_construct(&expr("someFunction"), &ParentSyntax::Other).is_none());
    }

    #[test]
    fn other_context_gives_empty_name() {
        assert_eq!(
            name_in("(function() {})", ParentSyntax::Other).as_deref(),
            Some("")
        );
    }

    #[test]
    fn declarator_through_parens() {
        let target = Pattern::Identifier("x".into());
        let value = on_construct(
            &expr("((() => 1))"),
            &ParentSyntax::VariableDeclarator { target: &target },
        )
        .unwrap();
        assert_eq!(value.kind, NameableKind::Arrow);
        assert_eq!(value.name.as_deref(), Some("x"));
    }

    #[test]
    fn explicit_name_is_kept() {
        let target = Pattern::Identifier("x".into());
        assert_eq!(
            name_in(
                "(function foo() {})",
                ParentSyntax::Assignment {
                    op: AssignOp::Assign,
                    target: &target
                }
            )
            .as_deref(),
            Some("foo")
        );
    }

    #[test]
    fn class_with_static_name_gets_nothing() {
        let key = PropertyKey::Identifier("C".into());
        assert_eq!(
            name_in(
                "(class { static name() {} })",
                ParentSyntax::ClassElement {
                    key: &key,
                    role: Role::Init
                }
            ),
            None
        );
    }

    #[test]
    fn getter_in_class_element() {
        let key = PropertyKey::Symbol(Some("it".into()));
        assert_eq!(
            name_in(
                "(function() {})",
                ParentSyntax::ClassElement {
                    key: &key,
                    role: Role::Get
                }
            )
            .as_deref(),
            Some("get [it]")
        );
    }
}
