//! AST types produced by the template and expression parsers.

/// A parsed template: literal text interleaved with `${...}` markers.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

/// One segment of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text, passed through unchanged.
    Literal(String),
    /// A `${...}` marker.
    Interpolation(Expr),
}

/// An expression inside a marker, or a whole computed source.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A quoted string literal, possibly with embedded `${...}` markers.
    Str(Vec<StrPart>),
    /// A `[...]` list literal.
    List(Vec<Expr>),
    /// A `{key: value, ...}` map literal.
    Map(Vec<(String, Expr)>),
    /// A document reference such as `name`, `.user.name`, or `...company`.
    Reference(Reference),
    /// A pronoun placeholder such as `:subject`.
    Pronoun(String),
    /// A resolver or builtin call.
    Call { name: String, args: Vec<Expr> },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `condition ? then : otherwise`.
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Field access on a computed value, such as `fetchUser().name`.
    Member { object: Box<Expr>, field: String },
    /// Index access, such as `items[0]` or `row["key"]`.
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// One piece of a quoted string literal.
#[derive(Debug, Clone, PartialEq)]
pub enum StrPart {
    Text(String),
    Interpolation(Expr),
}

/// A document reference token.
///
/// `dots` counts the leading dots of the token: zero means parent-then-root
/// lookup, one means a tree walk toward the root, and two or more climb
/// `dots - 1` ancestors before descending.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub dots: usize,
    pub segments: Vec<String>,
}

impl Reference {
    /// The token as written in the source, for error messages.
    pub fn token(&self) -> String {
        let mut token = ".".repeat(self.dots);
        token.push_str(&self.segments.join("."));
        token
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation `!`.
    Not,
    /// Arithmetic negation `-`.
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// The operator as written in the source, for error messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}
