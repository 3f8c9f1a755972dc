/// AST node types for the script subset the engine understands.
/// Grouping parentheses are kept as explicit `Parenthesized` nodes so that
/// consumers can tell `a = f` from `(a) = f` and strip them deliberately.
use crate::types::number_ops;

#[derive(Clone, Debug)]
pub struct Program {
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Empty,
    Expression(Expression),
    Block(Vec<Statement>),
    Variable(VariableDeclaration),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Return(Option<Expression>),
    Throw(Expression),
    Try(TryStatement),
    FunctionDeclaration(FunctionDecl),
    ClassDeclaration(ClassDecl),
}

#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    pub kind: VarKind,
    pub declarations: Vec<VariableDeclarator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug)]
pub struct VariableDeclarator {
    pub pattern: Pattern,
    pub init: Option<Expression>,
}

#[derive(Clone, Debug)]
pub enum Pattern {
    Identifier(String),
    /// `(target)` on the left of an assignment; still a valid simple target
    /// but no longer a bare identifier reference.
    Parenthesized(Box<Pattern>),
    Member(Box<Expression>),
    Array(Vec<Option<ArrayPatternElement>>),
    Object(Vec<ObjectPatternProperty>),
    /// `target = default`
    Assign(Box<Pattern>, Box<Expression>),
    Rest(Box<Pattern>),
}

#[derive(Clone, Debug)]
pub enum ArrayPatternElement {
    Pattern(Pattern),
    Rest(Pattern),
}

#[derive(Clone, Debug)]
pub enum ObjectPatternProperty {
    /// `key: target`; shorthand entries with a default (`{ a = 1 }`) are
    /// stored as `KeyValue(a, Assign(a, 1))`.
    KeyValue(PropertyKey, Pattern),
    Shorthand(String),
    Rest(Pattern),
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Option<Expression>>),
    Object(Vec<Property>),
    Function(FunctionExpr),
    ArrowFunction(ArrowFunction),
    Class(ClassExpr),
    Parenthesized(Box<Expression>),
    Unary(UnaryOp, Box<Expression>),
    Typeof(Box<Expression>),
    Void(Box<Expression>),
    Delete(Box<Expression>),
    Update(UpdateOp, bool, Box<Expression>), // op, prefix, argument
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Logical(LogicalOp, Box<Expression>, Box<Expression>),
    Assign(AssignOp, Box<Pattern>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Call(Box<Expression>, Vec<Expression>),
    /// `super(...)` inside a derived class constructor.
    SuperCall(Vec<Expression>),
    New(Box<Expression>, Vec<Expression>),
    Member(Box<Expression>, MemberProperty),
    Sequence(Vec<Expression>),
    Spread(Box<Expression>),
    Yield(Option<Box<Expression>>, bool), // argument, delegate
    Await(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum MemberProperty {
    Dot(String),
    Computed(Box<Expression>),
    Private(String),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    In,
    Instanceof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    LogicalAndAssign,
    LogicalOrAssign,
    NullishAssign,
}

impl AssignOp {
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            AssignOp::LogicalAndAssign | AssignOp::LogicalOrAssign | AssignOp::NullishAssign
        )
    }
}

#[derive(Clone, Debug)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expression,
    pub kind: PropertyKind,
    pub computed: bool,
    pub shorthand: bool,
    /// `key() {}` (including generator/async methods and accessors).
    pub method: bool,
}

#[derive(Clone, Debug)]
pub enum PropertyKey {
    Identifier(String),
    String(String),
    Number(f64),
    Computed(Box<Expression>),
    Private(String),
}

impl PropertyKey {
    /// The property name this key denotes without running any code: plain,
    /// string and numeric keys, and computed keys that are a (possibly
    /// parenthesized) string or number literal.
    pub fn literal_name(&self) -> Option<String> {
        match self {
            PropertyKey::Identifier(s) | PropertyKey::String(s) => Some(s.clone()),
            PropertyKey::Number(n) => Some(number_ops::to_string(*n)),
            PropertyKey::Computed(expr) => match expr.without_parens() {
                Expression::Literal(Literal::String(s)) => Some(s.clone()),
                Expression::Literal(Literal::Number(n)) => Some(number_ops::to_string(*n)),
                _ => None,
            },
            PropertyKey::Private(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub block: Vec<Statement>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Vec<Statement>>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Pattern>,
    pub body: Vec<Statement>,
    pub is_async: bool,
    pub is_generator: bool,
    pub source_text: String,
}

#[derive(Clone, Debug)]
pub struct FunctionExpr {
    pub name: Option<String>,
    pub params: Vec<Pattern>,
    pub body: Vec<Statement>,
    pub is_async: bool,
    pub is_generator: bool,
    pub source_text: String,
}

#[derive(Clone, Debug)]
pub struct ArrowFunction {
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub source_text: String,
}

#[derive(Clone, Debug)]
pub enum ArrowBody {
    Expression(Box<Expression>),
    Block(Vec<Statement>),
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: String,
    pub super_class: Option<Box<Expression>>,
    pub body: Vec<ClassElement>,
    pub source_text: String,
}

#[derive(Clone, Debug)]
pub struct ClassExpr {
    pub name: Option<String>,
    pub super_class: Option<Box<Expression>>,
    pub body: Vec<ClassElement>,
    pub source_text: String,
}

#[derive(Clone, Debug)]
pub enum ClassElement {
    Method(ClassMethod),
    Field(ClassField),
    StaticBlock(Vec<Statement>),
}

impl ClassElement {
    pub fn is_static(&self) -> bool {
        match self {
            ClassElement::Method(m) => m.is_static,
            ClassElement::Field(f) => f.is_static,
            ClassElement::StaticBlock(_) => true,
        }
    }

    pub fn key(&self) -> Option<&PropertyKey> {
        match self {
            ClassElement::Method(m) => Some(&m.key),
            ClassElement::Field(f) => Some(&f.key),
            ClassElement::StaticBlock(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClassMethod {
    pub key: PropertyKey,
    pub kind: ClassMethodKind,
    /// Always an `Expression::Function`.
    pub value: Expression,
    pub is_static: bool,
    pub computed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassMethodKind {
    Method,
    Get,
    Set,
    Constructor,
}

#[derive(Clone, Debug)]
pub struct ClassField {
    pub key: PropertyKey,
    pub value: Option<Expression>,
    pub is_static: bool,
    pub computed: bool,
}

impl Expression {
    /// Peels off any number of grouping parentheses.
    pub fn without_parens(&self) -> &Expression {
        let mut expr = self;
        while let Expression::Parenthesized(inner) = expr {
            expr = inner;
        }
        expr
    }
}

impl Pattern {
    /// The identifier this pattern binds directly, if it is a bare name.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Pattern::Identifier(name) => Some(name),
            _ => None,
        }
    }
}
