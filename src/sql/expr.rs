//! Expression AST for normalization/checksum SQL fragments.

use crate::dialect::Dialect;

/// A SQL expression. Every variant is handled exhaustively in [`Expr::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference, quoted per-dialect at render time.
    Column(String),
    /// An already-rendered SQL fragment, used as an escape hatch for
    /// backend-specific syntax (`TABLESAMPLE`, modulus hashing, ...).
    Raw(String),
    LitInt(i64),
    LitFloat(f64),
    LitStr(String),
    /// Function call: `name(args...)`.
    Func(String, Vec<Expr>),
    /// `CAST(expr AS ty)`.
    Cast(Box<Expr>, String),
    BinOp(Box<Expr>, BinOp, Box<Expr>),
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    fn as_sql(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Func(name.into(), args)
    }

    pub fn cast(self, ty: impl Into<String>) -> Self {
        Expr::Cast(Box::new(self), ty.into())
    }

    pub fn binop(self, op: BinOp, rhs: Expr) -> Self {
        Expr::BinOp(Box::new(self), op, Box::new(rhs))
    }

    pub fn paren(self) -> Self {
        Expr::Paren(Box::new(self))
    }

    /// Render to a SQL fragment using the given dialect for identifier
    /// quoting. Not a full statement — callers embed the result in a larger
    /// `SELECT`/`WHERE` fragment.
    pub fn render(&self, dialect: &dyn Dialect) -> String {
        match self {
            Expr::Column(name) => dialect.quote_identifier(name),
            Expr::Raw(sql) => sql.clone(),
            Expr::LitInt(i) => i.to_string(),
            Expr::LitFloat(f) => format!("{f}"),
            Expr::LitStr(s) => format!("'{}'", s.replace('\'', "''")),
            Expr::Func(name, args) => format!(
                "{name}({})",
                args.iter()
                    .map(|a| a.render(dialect))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::Cast(inner, ty) => format!("CAST({} AS {ty})", inner.render(dialect)),
            Expr::BinOp(l, op, r) => {
                format!("({} {} {})", l.render(dialect), op.as_sql(), r.render(dialect))
            }
            Expr::Paren(inner) => format!("({})", inner.render(dialect)),
        }
    }
}
