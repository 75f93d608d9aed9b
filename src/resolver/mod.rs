//! The constant-expression resolver (spec §4.3): folds literal-typed
//! expressions and computes aggregate size/alignment.

use crate::diagnostic::{ErrorKind, LilyError, LilyResult};
use crate::types::data_type::{AggregateType, ArraySize, DataType, DataTypeKind};
use crate::types::expr::{BinaryOp, Expr, ExprKind, IdentifierId, Literal, SizeofOperand, UnaryOp};
use crate::types::field::{Field, FieldKind, Fields, FieldsContainer};
use crate::types::scope::EntityRef;
use crate::{Symbol, TargetInfo};

/// The external collaborators the resolver needs but does not own: typedef
/// aliasing, enum variant values, and the builtin/type-info tables (spec
/// §4.3: "a parser handle used to look up named aggregates", §3.2's
/// "process-wide builtin table").
pub trait DeclLookup {
  fn resolve_typedef(&self, name: Symbol) -> Option<DataType> { let _ = name; None }
  fn enum_variant_value(&self, entity: EntityRef) -> Option<i64> { let _ = entity; None }
  fn builtin_size(&self, id: u32) -> Option<u64> { let _ = id; None }
  fn builtin_align(&self, id: u32) -> Option<u64> { let _ = id; None }
  fn type_info_size(&self, id: u32) -> Option<u64> { let _ = id; None }
}

/// A [`DeclLookup`] that never resolves anything, for callers (and tests)
/// with no typedef/enum/builtin context.
pub struct NullDeclLookup;
impl DeclLookup for NullDeclLookup {}

fn err(kind: ErrorKind) -> LilyError {
  LilyError::new(kind, crate::diagnostic::Location::new(crate::intern("<resolver>"), 0, 0, 0))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind { Bool, Char, Float, SInt, UInt }

fn kind_of(lit: &Literal) -> Option<Kind> {
  match lit {
    Literal::Bool(_) => Some(Kind::Bool),
    Literal::Char(_) => Some(Kind::Char),
    Literal::Float(_) => Some(Kind::Float),
    Literal::SignedInt(_) => Some(Kind::SInt),
    Literal::UnsignedInt(_) => Some(Kind::UInt),
    Literal::String(_) => None,
  }
}

/// The promotion table of spec §4.3.1, asymmetric in `SInt`/`UInt`: a
/// signed left operand against an unsigned right operand promotes to
/// `SInt`, but an unsigned left operand against a signed right operand
/// promotes to `UInt` — the operand order matters, unlike ordinary C
/// integer promotion.
fn promote(lhs: Kind, rhs: Kind) -> Kind {
  use Kind::*;
  match (lhs, rhs) {
    (Float, _) | (_, Float) => Float,
    (SInt, UInt) => SInt,
    (UInt, SInt) => UInt,
    (SInt, _) | (_, SInt) => SInt,
    (UInt, _) | (_, UInt) => UInt,
    (Char, _) | (_, Char) => SInt,
    (Bool, Bool) => SInt,
  }
}

fn as_f64(lit: &Literal) -> f64 {
  match *lit {
    Literal::Bool(b) => b as i64 as f64,
    Literal::Char(c) => c as u32 as f64,
    Literal::Float(f) => f,
    Literal::SignedInt(i) => i as f64,
    Literal::UnsignedInt(u) => u as f64,
    Literal::String(_) => 0.0,
  }
}

fn as_i64(lit: &Literal) -> i64 {
  match *lit {
    Literal::Bool(b) => b as i64,
    Literal::Char(c) => c as i64,
    Literal::Float(f) => f as i64,
    Literal::SignedInt(i) => i,
    Literal::UnsignedInt(u) => u as i64,
    Literal::String(_) => 0,
  }
}

fn as_u64(lit: &Literal) -> u64 {
  match *lit {
    Literal::Bool(b) => b as u64,
    Literal::Char(c) => c as u64,
    Literal::Float(f) => f as u64,
    Literal::SignedInt(i) => i as u64,
    Literal::UnsignedInt(u) => u,
    Literal::String(_) => 0,
  }
}

fn is_truthy(lit: &Literal) -> bool {
  match *lit {
    Literal::Bool(b) => b,
    Literal::Char(c) => c != '\0',
    Literal::Float(f) => f != 0.0,
    Literal::SignedInt(i) => i != 0,
    Literal::UnsignedInt(u) => u != 0,
    Literal::String(ref s) => !s.is_empty(),
  }
}

pub struct Resolver<'a, L: DeclLookup = NullDeclLookup> {
  pub target: &'a TargetInfo,
  pub decls: &'a L,
}

impl<'a> Resolver<'a, NullDeclLookup> {
  #[must_use]
  pub fn without_decls(target: &'a TargetInfo) -> Self {
    Self { target, decls: &NullDeclLookup }
  }
}

impl<'a, L: DeclLookup> Resolver<'a, L> {
  #[must_use]
  pub fn new(target: &'a TargetInfo, decls: &'a L) -> Self {
    Self { target, decls }
  }

  /// Fold `expr` to a `Literal` (or pass through `DataType`/`Literal`/
  /// `Nullptr` roots) per spec §4.3.
  pub fn resolve_expr(&self, expr: &Expr, is_at_preprocessor_time: bool) -> LilyResult<Expr> {
    match expr.kind() {
      ExprKind::Literal(_) | ExprKind::Nullptr | ExprKind::DataType(_) => Ok(expr.clone()),
      ExprKind::Grouping(inner) => self.resolve_expr(inner, is_at_preprocessor_time),
      ExprKind::Binary { op, left, right } => self.resolve_binary(*op, left, right, is_at_preprocessor_time),
      ExprKind::Unary { op, operand } => self.resolve_unary(*op, operand, is_at_preprocessor_time),
      ExprKind::Ternary { cond, then_branch, else_branch } => {
        let cond = self.resolve_literal(cond, is_at_preprocessor_time)?;
        if is_truthy(&cond) { self.resolve_expr(then_branch, is_at_preprocessor_time) }
        else { self.resolve_expr(else_branch, is_at_preprocessor_time) }
      }
      ExprKind::Identifier { id, .. } => self.resolve_identifier(id, is_at_preprocessor_time),
      ExprKind::Sizeof(operand) => {
        if is_at_preprocessor_time { return Err(err(ErrorKind::NotResolvable)) }
        Ok(Expr::new(ExprKind::Literal(Literal::UnsignedInt(self.resolve_operand_size(operand)?))))
      }
      ExprKind::Alignof(operand) => {
        if is_at_preprocessor_time { return Err(err(ErrorKind::NotResolvable)) }
        Ok(Expr::new(ExprKind::Literal(Literal::UnsignedInt(self.resolve_operand_alignment(operand)?))))
      }
      ExprKind::Cast { data_type, expr: inner } => self.resolve_cast(data_type, inner, is_at_preprocessor_time),
      ExprKind::ArrayAccess { .. } | ExprKind::FunctionCall { .. } | ExprKind::FunctionCallBuiltin { .. } |
      ExprKind::Initializer { .. } => Err(err(ErrorKind::NotResolvable)),
    }
  }

  fn resolve_identifier(&self, id: &IdentifierId, is_at_preprocessor_time: bool) -> LilyResult<Expr> {
    match id {
      IdentifierId::EnumVariant(entity) => {
        match self.decls.enum_variant_value(*entity) {
          Some(v) => Ok(Expr::new(ExprKind::Literal(Literal::SignedInt(v)))),
          None => Err(err(ErrorKind::NotResolvable)),
        }
      }
      IdentifierId::None if is_at_preprocessor_time =>
        Ok(Expr::new(ExprKind::Literal(Literal::SignedInt(0)))),
      _ => Err(err(ErrorKind::NotResolvable)),
    }
  }

  fn resolve_literal(&self, expr: &Expr, preproc: bool) -> LilyResult<Literal> {
    let resolved = self.resolve_expr(expr, preproc)?;
    match resolved.kind() {
      ExprKind::Literal(lit) => Ok(lit.clone()),
      _ => Err(err(ErrorKind::NotResolvable)),
    }
  }

  fn resolve_binary(&self, op: BinaryOp, left: &Expr, right: &Expr, preproc: bool) -> LilyResult<Expr> {
    // Assignment and compound-assignment are not resolvable; they pass
    // through untouched rather than raising (spec §4.3.1).
    if op.is_assignment() {
      return Ok(Expr::new(ExprKind::Binary { op, left: Box::new(left.clone()), right: Box::new(right.clone()) }));
    }

    if op == BinaryOp::And || op == BinaryOp::Or {
      let lhs = self.resolve_literal(left, preproc)?;
      let short_circuits = if op == BinaryOp::And { !is_truthy(&lhs) } else { is_truthy(&lhs) };
      if short_circuits {
        return Ok(Expr::new(ExprKind::Literal(Literal::Bool(op == BinaryOp::Or))));
      }
      let rhs = self.resolve_literal(right, preproc)?;
      return Ok(Expr::new(ExprKind::Literal(Literal::Bool(is_truthy(&rhs)))));
    }

    let lhs = self.resolve_literal(left, preproc)?;
    let rhs = self.resolve_literal(right, preproc)?;
    if matches!(lhs, Literal::String(_)) || matches!(rhs, Literal::String(_)) {
      return Err(err(ErrorKind::OperationUnsureAtCompileTime));
    }
    let (lk, rk) = (kind_of(&lhs).expect("non-string"), kind_of(&rhs).expect("non-string"));
    let promoted = promote(lk, rk);

    use BinaryOp::*;
    if matches!(op, Eq | Ne | Lt | Le | Gt | Ge) {
      let ordering = if promoted == Kind::Float {
        as_f64(&lhs).partial_cmp(&as_f64(&rhs))
      } else if promoted == Kind::UInt {
        as_u64(&lhs).partial_cmp(&as_u64(&rhs))
      } else {
        as_i64(&lhs).partial_cmp(&as_i64(&rhs))
      };
      let Some(ordering) = ordering else { return Err(err(ErrorKind::NotResolvable)) };
      use std::cmp::Ordering::*;
      let b = match op {
        Eq => ordering == Equal, Ne => ordering != Equal,
        Lt => ordering == Less, Le => ordering != Greater,
        Gt => ordering == Greater, Ge => ordering != Less,
        _ => unreachable!(),
      };
      return Ok(Expr::new(ExprKind::Literal(Literal::Bool(b))));
    }

    if matches!(op, BitAnd | BitOr | BitXor | Shl | Shr | Mod) && promoted == Kind::Float {
      return Err(err(ErrorKind::OperationUnsureAtCompileTime));
    }

    let result = match (op, promoted) {
      (Add, Kind::Float) => Literal::Float(as_f64(&lhs) + as_f64(&rhs)),
      (Sub, Kind::Float) => Literal::Float(as_f64(&lhs) - as_f64(&rhs)),
      (Mul, Kind::Float) => Literal::Float(as_f64(&lhs) * as_f64(&rhs)),
      (Div, Kind::Float) => Literal::Float(as_f64(&lhs) / as_f64(&rhs)),
      (Add, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs).wrapping_add(as_u64(&rhs))),
      (Sub, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs).wrapping_sub(as_u64(&rhs))),
      (Mul, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs).wrapping_mul(as_u64(&rhs))),
      (Div, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs).checked_div(as_u64(&rhs)).ok_or_else(|| err(ErrorKind::NotResolvable))?),
      (Mod, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs).checked_rem(as_u64(&rhs)).ok_or_else(|| err(ErrorKind::NotResolvable))?),
      (BitAnd, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs) & as_u64(&rhs)),
      (BitOr, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs) | as_u64(&rhs)),
      (BitXor, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs) ^ as_u64(&rhs)),
      (Shl, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs).wrapping_shl(as_u64(&rhs) as u32)),
      (Shr, Kind::UInt) => Literal::UnsignedInt(as_u64(&lhs).wrapping_shr(as_u64(&rhs) as u32)),
      (Add, _) => Literal::SignedInt(as_i64(&lhs).wrapping_add(as_i64(&rhs))),
      (Sub, _) => Literal::SignedInt(as_i64(&lhs).wrapping_sub(as_i64(&rhs))),
      (Mul, _) => Literal::SignedInt(as_i64(&lhs).wrapping_mul(as_i64(&rhs))),
      (Div, _) => Literal::SignedInt(as_i64(&lhs).checked_div(as_i64(&rhs)).ok_or_else(|| err(ErrorKind::NotResolvable))?),
      (Mod, _) => Literal::SignedInt(as_i64(&lhs).checked_rem(as_i64(&rhs)).ok_or_else(|| err(ErrorKind::NotResolvable))?),
      (BitAnd, _) => Literal::SignedInt(as_i64(&lhs) & as_i64(&rhs)),
      (BitOr, _) => Literal::SignedInt(as_i64(&lhs) | as_i64(&rhs)),
      (BitXor, _) => Literal::SignedInt(as_i64(&lhs) ^ as_i64(&rhs)),
      (Shl, _) => Literal::SignedInt(as_i64(&lhs).wrapping_shl(as_i64(&rhs) as u32)),
      (Shr, _) => Literal::SignedInt(as_i64(&lhs).wrapping_shr(as_i64(&rhs) as u32)),
      _ => unreachable!("all binary ops covered above"),
    };
    Ok(Expr::new(ExprKind::Literal(result)))
  }

  fn resolve_unary(&self, op: UnaryOp, operand: &Expr, preproc: bool) -> LilyResult<Expr> {
    match op {
      UnaryOp::Plus | UnaryOp::Neg | UnaryOp::BitNot | UnaryOp::Not => {
        let v = self.resolve_literal(operand, preproc)?;
        let kind = kind_of(&v).ok_or_else(|| err(ErrorKind::OperationUnsureAtCompileTime))?;
        let result = match (op, kind) {
          (UnaryOp::Plus, _) => v,
          (UnaryOp::Neg, Kind::Float) => Literal::Float(-as_f64(&v)),
          (UnaryOp::Neg, Kind::UInt) => Literal::SignedInt(-(as_u64(&v) as i64)),
          (UnaryOp::Neg, _) => Literal::SignedInt(-as_i64(&v)),
          (UnaryOp::BitNot, Kind::UInt) => Literal::UnsignedInt(!as_u64(&v)),
          (UnaryOp::BitNot, Kind::Float) => return Err(err(ErrorKind::OperationUnsureAtCompileTime)),
          (UnaryOp::BitNot, _) => Literal::SignedInt(!as_i64(&v)),
          (UnaryOp::Not, _) => Literal::Bool(!is_truthy(&v)),
          _ => unreachable!(),
        };
        Ok(Expr::new(ExprKind::Literal(result)))
      }
      UnaryOp::PreIncrement | UnaryOp::PreDecrement | UnaryOp::PostIncrement |
      UnaryOp::PostDecrement | UnaryOp::AddressOf | UnaryOp::Dereference =>
        Err(err(ErrorKind::NotResolvable)),
    }
  }

  fn resolve_cast(&self, data_type: &DataType, inner: &Expr, preproc: bool) -> LilyResult<Expr> {
    let value = self.resolve_literal(inner, preproc)?;
    if !data_type.is_integer() { return Ok(Expr::new(ExprKind::Literal(value))) }
    let out = if matches!(data_type.kind(), DataTypeKind::U8 | DataTypeKind::U16 | DataTypeKind::U32 |
      DataTypeKind::U64 | DataTypeKind::Usize | DataTypeKind::UnsignedInt | DataTypeKind::UnsignedChar |
      DataTypeKind::UnsignedLongInt | DataTypeKind::UnsignedLongLongInt | DataTypeKind::UnsignedShortInt) {
      Literal::UnsignedInt(as_u64(&value))
    } else {
      Literal::SignedInt(as_i64(&value))
    };
    Ok(Expr::new(ExprKind::Literal(out)))
  }

  fn resolve_operand_size(&self, operand: &SizeofOperand) -> LilyResult<u64> {
    match operand {
      SizeofOperand::DataType(dt) => self.resolve_data_type_size(dt),
      SizeofOperand::Expr(e) => match e.data_type() {
        Some(dt) => self.resolve_data_type_size(&dt),
        None => Err(err(ErrorKind::NotResolvable)),
      }
    }
  }

  fn resolve_operand_alignment(&self, operand: &SizeofOperand) -> LilyResult<u64> {
    match operand {
      SizeofOperand::DataType(dt) => self.resolve_data_type_alignment(dt),
      SizeofOperand::Expr(e) => match e.data_type() {
        Some(dt) => self.resolve_data_type_alignment(&dt),
        None => Err(err(ErrorKind::NotResolvable)),
      }
    }
  }

  /// Spec §4.3.2's `resolve_data_type_size`.
  pub fn resolve_data_type_size(&self, dt: &DataType) -> LilyResult<u64> {
    use DataTypeKind::*;
    Ok(match dt.kind() {
      Bool | Char | SignedChar | UnsignedChar => 1,
      ShortInt | UnsignedShortInt => 2,
      Int | UnsignedInt => u64::from(self.target.int_size),
      LongInt | UnsignedLongInt | LongLongInt | UnsignedLongLongInt => 8,
      Float => 4,
      Double => 8,
      LongDouble => 16,
      I8 | U8 => 1, I16 | U16 => 2, I32 | U32 => 4, I64 | U64 => 8,
      F32 => 4, F64 => 8,
      Isize | Usize => u64::from(self.target.ptr_size()),
      Void => 0,
      Pointer(_) => u64::from(self.target.ptr_size()),
      Any => return Err(err(ErrorKind::CannotResolveSizeOf("any"))),
      Generic(_) => 0,
      Builtin(id) => self.decls.builtin_size(*id).ok_or_else(|| err(ErrorKind::CannotResolveSizeOf("builtin")))?,
      TypeInfo(id) => self.decls.type_info_size(*id).ok_or_else(|| err(ErrorKind::CannotResolveSizeOf("type-info")))?,
      Array(a) => match &a.size {
        ArraySize::Sized(n) => self.resolve_data_type_size(&a.element)? * *n,
        ArraySize::None => return Err(err(ErrorKind::TypeIsIncomplete("array"))),
      },
      Enum(e) => match &e.underlying {
        Some(inner) => self.resolve_data_type_size(inner)?,
        None => u64::from(self.target.int_size),
      },
      Function(_) => u64::from(self.target.ptr_size()),
      Struct(agg) => self.resolve_aggregate_size(agg, false)?,
      Union(agg) => self.resolve_aggregate_size(agg, true)?,
      Typedef(t) => {
        let aliased = self.decls.resolve_typedef(t.name)
          .ok_or_else(|| err(ErrorKind::TypeIsIncomplete("typedef")))?;
        self.resolve_data_type_size(&aliased)?
      }
    })
  }

  /// Spec §4.3.2's `resolve_data_type_alignment`.
  pub fn resolve_data_type_alignment(&self, dt: &DataType) -> LilyResult<u64> {
    use DataTypeKind::*;
    Ok(match dt.kind() {
      Int | UnsignedInt => u64::from(self.target.int_align),
      Isize | Usize | Pointer(_) | Function(_) => u64::from(self.target.ptr_size()),
      Any => return Err(err(ErrorKind::CannotResolveSizeOf("any"))),
      Generic(_) => 0,
      Builtin(id) => self.decls.builtin_align(*id).ok_or_else(|| err(ErrorKind::CannotResolveSizeOf("builtin")))?,
      TypeInfo(id) => self.decls.type_info_size(*id).ok_or_else(|| err(ErrorKind::CannotResolveSizeOf("type-info")))?,
      Array(a) => self.resolve_data_type_alignment(&a.element)?,
      Enum(e) => match &e.underlying {
        Some(inner) => self.resolve_data_type_alignment(inner)?,
        None => u64::from(self.target.int_align),
      },
      Struct(agg) => self.resolve_aggregate_alignment(agg, false)?,
      Union(agg) => self.resolve_aggregate_alignment(agg, true)?,
      Typedef(t) => {
        let aliased = self.decls.resolve_typedef(t.name)
          .ok_or_else(|| err(ErrorKind::TypeIsIncomplete("typedef")))?;
        self.resolve_data_type_alignment(&aliased)?
      }
      _ => self.resolve_data_type_size(dt)?,
    })
  }

  fn resolve_aggregate_size(&self, agg: &AggregateType, is_union: bool) -> LilyResult<u64> {
    let cached = agg.size_info.get();
    if cached.is_resolved() { return Ok(cached.size) }
    let Some(fields) = &agg.fields else { return Err(err(ErrorKind::TypeIsIncomplete(if is_union { "union" } else { "struct" }))) };
    let (size, align) = self.layout_container(&fields.root, fields, is_union)?;
    agg.size_info.set(crate::types::decl::SizeInfo { size, alignment: align });
    Ok(size)
  }

  fn resolve_aggregate_alignment(&self, agg: &AggregateType, is_union: bool) -> LilyResult<u64> {
    let cached = agg.size_info.get();
    if cached.is_resolved() { return Ok(cached.alignment) }
    self.resolve_aggregate_size(agg, is_union)?;
    Ok(agg.size_info.get().alignment)
  }

  /// Lay out one container's immediate fields. For a struct: running offset
  /// padded to each field's alignment, then the total padded to the max
  /// alignment seen. For a union: the maximum member size, and the maximum
  /// alignment (spec §4.3.2).
  fn layout_container(&self, container: &FieldsContainer, fields: &Fields, is_union: bool) -> LilyResult<(u64, u64)> {
    let mut offset: u64 = 0;
    let mut max_align: u64 = 1;
    let mut max_size: u64 = 0;
    for id in container.iter(&fields.arena) {
      let field = fields.get(id);
      let (size, align) = self.layout_field(field, fields)?;
      if align == 0 {
        // Unresolved (generic) field: contributes no size, no padding.
        continue;
      }
      max_align = max_align.max(align);
      if is_union {
        max_size = max_size.max(size);
      } else {
        offset = round_up(offset, align);
        offset += size;
      }
    }
    let total = if is_union { max_size } else { round_up(offset, max_align) };
    Ok((total, max_align))
  }

  fn layout_field(&self, field: &Field, fields: &Fields) -> LilyResult<(u64, u64)> {
    match &field.kind {
      FieldKind::Member { data_type, .. } => {
        Ok((self.resolve_data_type_size(data_type)?, self.resolve_data_type_alignment(data_type)?))
      }
      FieldKind::AnonymousStruct(c) | FieldKind::NamedStruct(c) => self.layout_container(c, fields, false),
      FieldKind::AnonymousUnion(c) | FieldKind::NamedUnion(c) => self.layout_container(c, fields, true),
    }
  }
}

fn round_up(offset: u64, align: u64) -> u64 {
  if align == 0 { return offset }
  offset.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
  use super::*;

  fn int_lit(n: i64) -> Expr { Expr::new(ExprKind::Literal(Literal::SignedInt(n))) }

  fn binary(op: BinaryOp, l: Expr, r: Expr) -> Expr {
    Expr::new(ExprKind::Binary { op, left: Box::new(l), right: Box::new(r) })
  }

  fn lit_of(e: &Expr) -> Literal { match e.kind() { ExprKind::Literal(l) => l.clone(), _ => panic!("not a literal") } }

  #[test]
  fn arithmetic_matches_c_style_promoted_result() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    let sum = binary(BinaryOp::Add, int_lit(2), int_lit(3));
    let resolved = resolver.resolve_expr(&sum, false).unwrap();
    assert_eq!(lit_of(&resolved), Literal::SignedInt(5));
  }

  #[test]
  fn short_circuit_and_skips_right_side() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    // A right side that would error if evaluated (division by zero).
    let poison = binary(BinaryOp::Div, int_lit(1), int_lit(0));
    let expr = binary(BinaryOp::And, int_lit(0), poison);
    let resolved = resolver.resolve_expr(&expr, false).unwrap();
    assert_eq!(lit_of(&resolved), Literal::Bool(false));
  }

  #[test]
  fn ternary_selects_branch_by_condition() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    let t = Expr::new(ExprKind::Ternary {
      cond: Box::new(int_lit(1)), then_branch: Box::new(int_lit(2)), else_branch: Box::new(int_lit(3)),
    });
    assert_eq!(lit_of(&resolver.resolve_expr(&t, false).unwrap()), Literal::SignedInt(2));
    let f = Expr::new(ExprKind::Ternary {
      cond: Box::new(int_lit(0)), then_branch: Box::new(int_lit(2)), else_branch: Box::new(int_lit(3)),
    });
    assert_eq!(lit_of(&resolver.resolve_expr(&f, false).unwrap()), Literal::SignedInt(3));
  }

  #[test]
  fn struct_size_sums_fields_with_padding() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    let mut fields = Fields::new();
    fields.add(Field { name: Some(crate::intern("b")), kind: FieldKind::Member { data_type: DataType::new(DataTypeKind::I8), bit_width: None }, parent: None, prev: None, next: None }, None);
    fields.add(Field { name: Some(crate::intern("a")), kind: FieldKind::Member { data_type: DataType::new(DataTypeKind::I32), bit_width: None }, parent: None, prev: None, next: None }, None);
    let agg = AggregateType::new(None, None, Some(std::rc::Rc::new(fields)));
    let dt = DataType::new(DataTypeKind::Struct(Box::new(agg)));
    assert_eq!(resolver.resolve_data_type_size(&dt).unwrap(), 8);
  }

  #[test]
  fn union_alignment_is_the_widest_member() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    let mut fields = Fields::new();
    fields.add(Field { name: Some(crate::intern("a")), kind: FieldKind::Member { data_type: DataType::new(DataTypeKind::I8), bit_width: None }, parent: None, prev: None, next: None }, None);
    fields.add(Field { name: Some(crate::intern("b")), kind: FieldKind::Member { data_type: DataType::new(DataTypeKind::I64), bit_width: None }, parent: None, prev: None, next: None }, None);
    let agg = AggregateType::new(None, None, Some(std::rc::Rc::new(fields)));
    let dt = DataType::new(DataTypeKind::Union(Box::new(agg)));
    assert_eq!(resolver.resolve_data_type_alignment(&dt).unwrap(), 8);
  }

  #[test]
  fn preprocessor_mode_rejects_sizeof() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    let e = Expr::new(ExprKind::Sizeof(SizeofOperand::DataType(DataType::new(DataTypeKind::I32))));
    assert!(resolver.resolve_expr(&e, true).is_err());
  }

  #[test]
  fn signed_unsigned_promotion_is_asymmetric() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    let uint_lit = |n: u64| Expr::new(ExprKind::Literal(Literal::UnsignedInt(n)));

    let sint_lhs = binary(BinaryOp::Add, int_lit(3), uint_lit(5));
    assert_eq!(lit_of(&resolver.resolve_expr(&sint_lhs, false).unwrap()), Literal::SignedInt(8));

    let uint_lhs = binary(BinaryOp::Add, uint_lit(5), int_lit(3));
    assert_eq!(lit_of(&resolver.resolve_expr(&uint_lhs, false).unwrap()), Literal::UnsignedInt(8));
  }

  #[test]
  fn preprocessor_mode_folds_unresolved_identifier_to_zero() {
    let target = TargetInfo::lp64();
    let resolver = Resolver::without_decls(&target);
    let e = Expr::new(ExprKind::Identifier { name: crate::intern("UNDEFINED"), id: IdentifierId::None });
    assert_eq!(lit_of(&resolver.resolve_expr(&e, true).unwrap()), Literal::SignedInt(0));
  }
}
