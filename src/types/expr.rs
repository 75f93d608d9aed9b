//! Expressions (spec §3.5).

use std::rc::Rc;
use crate::Symbol;
use super::data_type::DataType;
use super::scope::EntityRef;

/// The widest precedence value a binary operator can have. Exposed as a
/// real constant (rather than inlined into a table) so callers recursing
/// through precedence climbing have a concrete starting bound.
pub const MAX_EXPR_PRECEDENCE: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
  Assign, AddAssign, SubAssign, MulAssign, DivAssign, ModAssign,
  BitAndAssign, BitOrAssign, BitXorAssign, ShlAssign, ShrAssign,
  Or, And,
  BitOr, BitXor, BitAnd,
  Eq, Ne,
  Lt, Le, Gt, Ge,
  Shl, Shr,
  Add, Sub,
  Mul, Div, Mod,
}

impl BinaryOp {
  /// Lower binds looser. Mirrors the C precedence table, scaled so the
  /// loosest operator (assignment) sits well below [`MAX_EXPR_PRECEDENCE`].
  #[must_use]
  pub fn precedence(self) -> u8 {
    use BinaryOp::*;
    match self {
      Assign | AddAssign | SubAssign | MulAssign | DivAssign | ModAssign |
      BitAndAssign | BitOrAssign | BitXorAssign | ShlAssign | ShrAssign => 10,
      Or => 20,
      And => 30,
      BitOr => 40,
      BitXor => 50,
      BitAnd => 60,
      Eq | Ne => 70,
      Lt | Le | Gt | Ge => 80,
      Shl | Shr => 90,
      Add | Sub => 95,
      Mul | Div | Mod => MAX_EXPR_PRECEDENCE,
    }
  }

  #[must_use] pub fn is_assignment(self) -> bool { self.precedence() == 10 }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
  Plus, Neg, BitNot, Not,
  PreIncrement, PreDecrement, PostIncrement, PostDecrement,
  AddressOf, Dereference,
}

/// The resolved target of an identifier expression: `None` until the
/// resolver binds it to a scope entry (spec §3.5/§4.1 Open Question:
/// identifiers outside preprocessor mode that don't resolve raise a
/// diagnostic rather than silently staying `None`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentifierId {
  None,
  EnumVariant(EntityRef),
  Function(EntityRef),
  Label(EntityRef),
  Variable(EntityRef),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
  Bool(bool),
  Char(char),
  Float(f64),
  SignedInt(i64),
  /// Shared so string-literal deduplication (common with identical format
  /// strings) is a refcount bump rather than a copy.
  String(Rc<str>),
  UnsignedInt(u64),
}

#[derive(Clone, Debug)]
pub enum SizeofOperand {
  Expr(Box<Expr>),
  DataType(DataType),
}

#[derive(Clone, Debug)]
pub struct InitializerField {
  pub name: Option<Symbol>,
  pub value: Expr,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
  Alignof(SizeofOperand),
  ArrayAccess { array: Box<Expr>, index: Box<Expr> },
  Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
  Cast { data_type: DataType, expr: Box<Expr> },
  DataType(DataType),
  FunctionCall { callee: Box<Expr>, args: Vec<Expr>, generic_args: Option<Vec<DataType>> },
  FunctionCallBuiltin { builtin_id: u32, args: Vec<Expr> },
  Grouping(Box<Expr>),
  Identifier { name: Symbol, id: IdentifierId },
  Initializer { data_type: Option<DataType>, fields: Vec<InitializerField> },
  Literal(Literal),
  Nullptr,
  Sizeof(SizeofOperand),
  Ternary { cond: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr> },
  Unary { op: UnaryOp, operand: Box<Expr> },
}

/// An expression node. Cheaply shareable like every other typed node in
/// this crate, though in practice expressions are owned by exactly one
/// parent (statement or containing expression) and never aliased.
#[derive(Clone, Debug)]
pub struct Expr {
  inner: Rc<ExprInner>,
}

#[derive(Debug)]
struct ExprInner {
  kind: ExprKind,
  data_type: std::cell::RefCell<Option<DataType>>,
}

impl Expr {
  #[must_use]
  pub fn new(kind: ExprKind) -> Self {
    Self { inner: Rc::new(ExprInner { kind, data_type: std::cell::RefCell::new(None) }) }
  }

  #[must_use] pub fn kind(&self) -> &ExprKind { &self.inner.kind }
  #[must_use] pub fn data_type(&self) -> Option<DataType> { self.inner.data_type.borrow().clone() }
  pub fn set_data_type(&self, ty: DataType) { *self.inner.data_type.borrow_mut() = Some(ty); }
  #[must_use] pub fn strong_count(&self) -> usize { Rc::strong_count(&self.inner) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn precedence_is_monotonic_with_standard_c_ordering() {
    assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
    assert!(BinaryOp::Add.precedence() > BinaryOp::Shl.precedence());
    assert!(BinaryOp::Shl.precedence() > BinaryOp::Lt.precedence());
    assert!(BinaryOp::Lt.precedence() > BinaryOp::Eq.precedence());
    assert!(BinaryOp::Eq.precedence() > BinaryOp::BitAnd.precedence());
    assert!(BinaryOp::And.precedence() > BinaryOp::Assign.precedence());
    assert_eq!(BinaryOp::Mul.precedence(), MAX_EXPR_PRECEDENCE);
  }

  #[test]
  fn assignment_ops_are_flagged() {
    assert!(BinaryOp::AddAssign.is_assignment());
    assert!(!BinaryOp::Add.is_assignment());
  }

  #[test]
  fn identifier_defaults_to_unresolved() {
    let e = Expr::new(ExprKind::Identifier { name: crate::intern("x"), id: IdentifierId::None });
    match e.kind() {
      ExprKind::Identifier { id: IdentifierId::None, .. } => {}
      _ => panic!("expected unresolved identifier"),
    }
  }
}
