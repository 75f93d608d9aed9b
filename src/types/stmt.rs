//! Statements and function bodies (spec §3.5).

use std::rc::Rc;
use crate::Symbol;
use super::decl::Decl;
use super::expr::Expr;
use super::scope::ScopeId;

/// One entry of an ordered body: declarations, expression-statements, and
/// control-flow statements are interleaved in source order (spec §3.5).
#[derive(Clone, Debug)]
pub enum BodyItem {
  Decl(Decl),
  Expr(Expr),
  Stmt(Stmt),
}

#[derive(Clone, Debug)]
pub struct IfBranch {
  pub cond: Expr,
  pub body: Box<Stmt>,
}

#[derive(Clone, Debug)]
pub struct If {
  pub if_branch: IfBranch,
  pub elif_branches: Vec<IfBranch>,
  pub else_branch: Option<Box<Stmt>>,
}

#[derive(Clone, Debug)]
pub struct For {
  pub init: Option<Box<Stmt>>,
  pub cond: Option<Expr>,
  pub step: Option<Expr>,
  pub body: Box<Stmt>,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
  Block { scope_id: ScopeId, items: Vec<BodyItem> },
  Break,
  Case { value: Expr, body: Vec<BodyItem> },
  Continue,
  Default { body: Vec<BodyItem> },
  DoWhile { cond: Expr, body: Box<Stmt> },
  For(For),
  Goto { label: Symbol },
  If(If),
  Return(Option<Expr>),
  Switch { scrutinee: Expr, cases: Vec<Stmt> },
  While { cond: Expr, body: Box<Stmt> },
}

/// A statement node, refcounted like the rest of the typed tree so a
/// labeled statement can be referenced both from its containing body and
/// from the label's scope entry.
#[derive(Clone, Debug)]
pub struct Stmt {
  inner: Rc<StmtKind>,
}

impl Stmt {
  #[must_use] pub fn new(kind: StmtKind) -> Self { Self { inner: Rc::new(kind) } }
  #[must_use] pub fn kind(&self) -> &StmtKind { &self.inner }
  #[must_use] pub fn strong_count(&self) -> usize { Rc::strong_count(&self.inner) }
}

/// A function's body: the scope it introduces, plus its ordered items.
#[derive(Clone, Debug)]
pub struct FunctionBody {
  pub scope_id: ScopeId,
  pub items: Vec<BodyItem>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::expr::{ExprKind, Literal};

  fn lit(n: i64) -> Expr { Expr::new(ExprKind::Literal(Literal::SignedInt(n))) }

  #[test]
  fn if_with_elif_and_else_round_trips() {
    let stmt = Stmt::new(StmtKind::If(If {
      if_branch: IfBranch { cond: lit(1), body: Box::new(Stmt::new(StmtKind::Break)) },
      elif_branches: vec![IfBranch { cond: lit(2), body: Box::new(Stmt::new(StmtKind::Continue)) }],
      else_branch: Some(Box::new(Stmt::new(StmtKind::Return(None)))),
    }));
    match stmt.kind() {
      StmtKind::If(i) => {
        assert_eq!(i.elif_branches.len(), 1);
        assert!(i.else_branch.is_some());
      }
      _ => panic!("expected if"),
    }
  }

  #[test]
  fn switch_holds_case_and_default_arms() {
    let stmt = Stmt::new(StmtKind::Switch {
      scrutinee: lit(0),
      cases: vec![
        Stmt::new(StmtKind::Case { value: lit(1), body: vec![] }),
        Stmt::new(StmtKind::Default { body: vec![] }),
      ],
    });
    match stmt.kind() {
      StmtKind::Switch { cases, .. } => assert_eq!(cases.len(), 2),
      _ => panic!("expected switch"),
    }
  }
}
