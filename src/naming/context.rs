use super::{NamingContext, PropertyKey, Role};
use crate::ast::{self, AssignOp, Pattern};

/// The syntactic parent of a nameable construct, as seen by the host at the
/// point of evaluation. Property and class-element keys arrive already
/// evaluated so a computed key is never run twice.
#[derive(Clone, Copy, Debug)]
pub enum ParentSyntax<'a> {
    VariableDeclarator {
        target: &'a Pattern,
    },
    Assignment {
        op: AssignOp,
        target: &'a Pattern,
    },
    Property {
        property: &'a ast::Property,
        key: &'a PropertyKey,
    },
    ClassElement {
        key: &'a PropertyKey,
        role: Role,
    },
    /// The default of a binding or parameter, `target = value`.
    DefaultValue {
        target: &'a Pattern,
    },
    Other,
}

pub fn resolve(parent: &ParentSyntax<'_>) -> NamingContext {
    match *parent {
        ParentSyntax::VariableDeclarator { target } => match target {
            Pattern::Identifier(name) => NamingContext::VariableDeclarator(name.clone()),
            _ => NamingContext::None,
        },
        ParentSyntax::Assignment { op, target } => match target {
            Pattern::Identifier(name) if op == AssignOp::Assign || op.is_logical() => {
                NamingContext::SimpleAssignmentTarget(name.clone())
            }
            _ => NamingContext::None,
        },
        ParentSyntax::Property { property, key } => {
            if is_proto_setter(property) {
                return NamingContext::None;
            }
            let role = match property.kind {
                ast::PropertyKind::Init => Role::Init,
                ast::PropertyKind::Get => Role::Get,
                ast::PropertyKind::Set => Role::Set,
            };
            NamingContext::PropertyDefinition(key.clone(), role)
        }
        ParentSyntax::ClassElement { key, role } => NamingContext::ClassElement(key.clone(), role),
        ParentSyntax::DefaultValue { target } => match target {
            Pattern::Identifier(name) => NamingContext::DefaultValuePosition(name.clone()),
            _ => NamingContext::None,
        },
        ParentSyntax::Other => NamingContext::None,
    }
}

/// `__proto__: value` written with a plain or string key sets the object's
/// prototype instead of defining a property. Computed, shorthand and method
/// forms define an ordinary `__proto__` property.
pub fn is_proto_setter(property: &ast::Property) -> bool {
    property.kind == ast::PropertyKind::Init
        && !property.computed
        && !property.shorthand
        && !property.method
        && matches!(
            &property.key,
            ast::PropertyKey::Identifier(k) | ast::PropertyKey::String(k) if k == "__proto__"
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Statement};
    use crate::parser::parse;

    fn object_properties(source: &str) -> Vec<ast::Property> {
        let program = parse(source).unwrap();
        match program.body.into_iter().next() {
            Some(Statement::Expression(Expression::Parenthesized(inner))) => match *inner {
                Expression::Object(props) => props,
                other => panic!("expected object literal, got {other:?}"),
            },
            other => panic!("expected parenthesized object, got {other:?}"),
        }
    }

    #[test]
    fn declarator_needs_identifier() {
        let id = Pattern::Identifier("x".into());
        assert_eq!(
            resolve(&ParentSyntax::VariableDeclarator { target: &id }),
            NamingContext::VariableDeclarator("x".into())
        );
        let destructure = Pattern::Array(vec![]);
        assert_eq!(
            resolve(&ParentSyntax::VariableDeclarator {
                target: &destructure
            }),
            NamingContext::None
        );
    }

    #[test]
    fn assignment_forms() {
        let id = Pattern::Identifier("x".into());
        for op in [
            AssignOp::Assign,
            AssignOp::LogicalAndAssign,
            AssignOp::LogicalOrAssign,
            AssignOp::NullishAssign,
        ] {
            assert_eq!(
                resolve(&ParentSyntax::Assignment { op, target: &id }),
                NamingContext::SimpleAssignmentTarget("x".into())
            );
        }
        assert_eq!(
            resolve(&ParentSyntax::Assignment {
                op: AssignOp::AddAssign,
                target: &id
            }),
            NamingContext::None
        );
        let paren = Pattern::Parenthesized(Box::new(id.clone()));
        assert_eq!(
            resolve(&ParentSyntax::Assignment {
                op: AssignOp::Assign,
                target: &paren
            }),
            NamingContext::None
        );
        let member = Pattern::Member(Box::new(Expression::Identifier("o".into())));
        assert_eq!(
            resolve(&ParentSyntax::Assignment {
                op: AssignOp::Assign,
                target: &member
            }),
            NamingContext::None
        );
    }

    #[test]
    fn proto_setter_forms() {
        let props = object_properties(
            "({ __proto__: a, '__proto__': b, ['__proto__']: c, __proto__() {}, x: d })",
        );
        let flags: Vec<bool> = props.iter().map(is_proto_setter).collect();
        assert_eq!(flags, [true, true, false, false, false]);
    }

    #[test]
    fn property_roles() {
        let props = object_properties("({ get a() {}, set a(v) {}, b: 1 })");
        let key = PropertyKey::Identifier("a".into());
        let roles: Vec<NamingContext> = props
            .iter()
            .map(|property| {
                resolve(&ParentSyntax::Property {
                    property,
                    key: &key,
                })
            })
            .collect();
        assert_eq!(
            roles,
            [
                NamingContext::PropertyDefinition(key.clone(), Role::Get),
                NamingContext::PropertyDefinition(key.clone(), Role::Set),
                NamingContext::PropertyDefinition(key.clone(), Role::Init),
            ]
        );
    }

    #[test]
    fn proto_setter_resolves_to_none() {
        let props = object_properties("({ __proto__: function() {} })");
        let key = PropertyKey::Identifier("__proto__".into());
        assert_eq!(
            resolve(&ParentSyntax::Property {
                property: &props[0],
                key: &key
            }),
            NamingContext::None
        );
    }

    #[test]
    fn default_value_needs_identifier() {
        let id = Pattern::Identifier("cb".into());
        assert_eq!(
            resolve(&ParentSyntax::DefaultValue { target: &id }),
            NamingContext::DefaultValuePosition("cb".into())
        );
        let nested = Pattern::Object(vec![]);
        assert_eq!(
            resolve(&ParentSyntax::DefaultValue { target: &nested }),
            NamingContext::None
        );
        assert_eq!(resolve(&ParentSyntax::Other), NamingContext::None);
    }
}
