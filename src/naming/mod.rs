//! Syntactic function-name inference.
//!
//! An anonymous function, arrow, generator, async function or class picks up
//! its `name` from the syntax it is created in: the variable it initializes,
//! the identifier it is assigned to, the property or class element it
//! defines, or the binding whose default it is. Inference runs once, at
//! construction, and never overrides an explicit name.

mod assign;
mod classify;
mod context;
mod driver;
mod format;

pub use assign::{NAME_ATTRIBUTES, NameAttributes, NameableValue, assign};
pub use classify::{Classified, class_defines_static_name, classify, strip_parens};
pub use context::{ParentSyntax, is_proto_setter, resolve};
pub use driver::on_construct;
pub use format::format;

use serde::Serialize;
use std::fmt;

/// The syntactic forms that can receive an inferred name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameableKind {
    Function,
    /// Arrow functions, async ones included.
    Arrow,
    /// Generator functions, async ones included.
    Generator,
    AsyncFunction,
    Class,
}

impl NameableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NameableKind::Function => "function",
            NameableKind::Arrow => "arrow",
            NameableKind::Generator => "generator",
            NameableKind::AsyncFunction => "async-function",
            NameableKind::Class => "class",
        }
    }
}

impl fmt::Display for NameableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property key as it is known once any computed key has been evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyKey {
    Identifier(String),
    String(String),
    Number(f64),
    /// A symbol key, carrying the symbol's description.
    Symbol(Option<String>),
    /// `#name`, stored without the `#`.
    Private(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Init,
    Get,
    Set,
}

/// Where a nameable value was created, reduced to what the name depends on.
#[derive(Clone, Debug, PartialEq)]
pub enum NamingContext {
    VariableDeclarator(String),
    SimpleAssignmentTarget(String),
    PropertyDefinition(PropertyKey, Role),
    ClassElement(PropertyKey, Role),
    DefaultValuePosition(String),
    None,
}

impl NamingContext {
    pub fn label(&self) -> &'static str {
        match self {
            NamingContext::VariableDeclarator(_) => "variable-declarator",
            NamingContext::SimpleAssignmentTarget(_) => "assignment",
            NamingContext::PropertyDefinition(..) => "property",
            NamingContext::ClassElement(..) => "class-element",
            NamingContext::DefaultValuePosition(_) => "default-value",
            NamingContext::None => "none",
        }
    }
}
