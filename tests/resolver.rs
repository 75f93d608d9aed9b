//! Black-box resolver tests (spec §4.3), building small expression/type
//! trees through the public `types` API and folding them through
//! `Resolver` exactly as a parser-to-resolver caller would.

use lilyc_core::resolver::Resolver;
use lilyc_core::types::data_type::{AggregateType, ArraySize, ArrayType, DataType, DataTypeKind};
use lilyc_core::types::{Expr, ExprKind, Field, FieldKind, Fields, Literal};
use lilyc_core::TargetInfo;

fn member(name: &str, ty: DataTypeKind) -> Field {
  Field {
    name: Some(lilyc_core::intern(name)),
    kind: FieldKind::Member { data_type: DataType::new(ty), bit_width: None },
    parent: None, prev: None, next: None,
  }
}

fn lit(l: Literal) -> Expr { Expr::new(ExprKind::Literal(l)) }

#[test]
fn nested_binary_expression_folds_to_a_single_literal() {
  // `2 * (3 + 4) - 1` == 13
  let target = TargetInfo::lp64();
  let resolver = Resolver::without_decls(&target);
  let inner = Expr::new(ExprKind::Binary {
    op: lilyc_core::types::BinaryOp::Add,
    left: Box::new(lit(Literal::SignedInt(3))),
    right: Box::new(lit(Literal::SignedInt(4))),
  });
  let grouped = Expr::new(ExprKind::Grouping(Box::new(inner)));
  let mul = Expr::new(ExprKind::Binary {
    op: lilyc_core::types::BinaryOp::Mul,
    left: Box::new(lit(Literal::SignedInt(2))),
    right: Box::new(grouped),
  });
  let whole = Expr::new(ExprKind::Binary {
    op: lilyc_core::types::BinaryOp::Sub,
    left: Box::new(mul),
    right: Box::new(lit(Literal::SignedInt(1))),
  });
  let folded = resolver.resolve_expr(&whole, false).unwrap();
  assert!(matches!(folded.kind(), ExprKind::Literal(Literal::SignedInt(13))));
}

#[test]
fn sizeof_an_array_of_structs_accounts_for_padding() {
  // struct { i8 a; i32 b; } — size 8, align 4 — times a 3-element array.
  let target = TargetInfo::lp64();
  let resolver = Resolver::without_decls(&target);

  let mut fields = Fields::new();
  let a = fields.add(member("a", DataTypeKind::I8), None).unwrap();
  fields.add(member("b", DataTypeKind::I32), Some(a)).unwrap();
  let fields = std::rc::Rc::new(fields);

  let agg = AggregateType::new(Some(lilyc_core::intern("Pair")), None, Some(fields));
  let struct_ty = DataType::new(DataTypeKind::Struct(Box::new(agg)));

  let array_ty = DataType::new(DataTypeKind::Array(Box::new(ArrayType {
    element: struct_ty,
    name: None,
    size: ArraySize::Sized(3),
  })));

  let size = resolver.resolve_data_type_size(&array_ty).unwrap();
  assert_eq!(size, 24, "3 * sizeof(struct {{ i8; i32 }}) should be 3 * 8");
}

#[test]
fn ternary_with_sizeof_branches_picks_the_live_one() {
  let target = TargetInfo::lp64();
  let resolver = Resolver::without_decls(&target);
  let cond = lit(Literal::Bool(false));
  let then_branch = Expr::new(ExprKind::Sizeof(lilyc_core::types::expr::SizeofOperand::DataType(DataType::new(DataTypeKind::I64))));
  let else_branch = lit(Literal::SignedInt(0));
  let ternary = Expr::new(ExprKind::Ternary {
    cond: Box::new(cond),
    then_branch: Box::new(then_branch),
    else_branch: Box::new(else_branch),
  });
  let folded = resolver.resolve_expr(&ternary, false).unwrap();
  assert!(matches!(folded.kind(), ExprKind::Literal(Literal::SignedInt(0))));
}
