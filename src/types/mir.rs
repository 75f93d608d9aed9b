//! The MIR value and type model shared between the resolver's constant
//! folding and the MIR builder (spec §3.6).

use std::rc::Rc;
use crate::{Idx, Symbol};

/// An index into a function's register table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegId(u32);
impl Idx for RegId {
  fn from_usize(n: usize) -> Self { Self(u32::try_from(n).expect("too many registers")) }
  fn into_usize(self) -> usize { self.0 as usize }
}

/// An index into a function's local-variable table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VarId(u32);
impl Idx for VarId {
  fn from_usize(n: usize) -> Self { Self(u32::try_from(n).expect("too many variables")) }
  fn into_usize(self) -> usize { self.0 as usize }
}

/// A MIR data type: fixed-width integers, floats, pointer/reference
/// kinds, arrays, structs, the borrow-tracing marker type, unit, and
/// named opaque types (spec §3.6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MirDt {
  I1, I8, I16, I32, I64,
  U8, U16, U32, U64,
  F32, F64,
  Ptr(Box<MirDt>),
  Ref(Box<MirDt>),
  RefMut(Box<MirDt>),
  Array(Box<MirDt>, u64),
  Struct(Vec<MirDt>),
  Trace,
  Unit,
  /// An opaque type identified only by name, for forward-declared or
  /// external aggregates the builder hasn't expanded.
  Named(Symbol),
}

impl MirDt {
  #[must_use] pub fn ptr(self) -> Self { Self::Ptr(Box::new(self)) }
  #[must_use] pub fn is_integer(&self) -> bool {
    matches!(self, Self::I1 | Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::U8 | Self::U16 | Self::U32 | Self::U64)
  }
}

/// A MIR value. `Var` and `Const` always carry the type of the *pointee*:
/// per spec §3.6 their effective MIR type (what [`MirVal::mir_type`]
/// reports) is always `ptr(inner)`, since both denote a memory location
/// rather than a value in a register.
///
/// `PartialEq` is structural equality on the value's identity (which
/// register, which named global, ...), used by the MIR builder to detect a
/// no-op store (spec §4.4.3: `dest == src` by structural equality).
#[derive(Clone, Debug, PartialEq)]
pub enum MirVal {
  Array(Vec<MirVal>),
  Bytes(Rc<[u8]>),
  Const { name: Symbol, pointee: MirDt },
  Cstr(Rc<str>),
  Exception(Symbol),
  Float(f64, MirDt),
  Int(i64, MirDt),
  List(Vec<MirVal>),
  Nil,
  Param(u32, MirDt),
  Reg(RegId, MirDt),
  Slice(Vec<MirVal>),
  Str(Rc<str>),
  Struct(Vec<MirVal>),
  Trace(Box<MirVal>),
  Tuple(Vec<MirVal>),
  UInt(u64, MirDt),
  Undef(MirDt),
  Unit,
  Var { id: VarId, pointee: MirDt },
}

impl MirVal {
  /// The MIR type of this value, where statically known from the value
  /// itself. `Var`/`Const` always report `ptr(pointee)` (spec §3.6's
  /// invariant); everything else reports the type it carries directly.
  #[must_use]
  pub fn mir_type(&self) -> Option<MirDt> {
    match self {
      Self::Const { pointee, .. } => Some(pointee.clone().ptr()),
      Self::Var { pointee, .. } => Some(pointee.clone().ptr()),
      Self::Float(_, ty) | Self::Int(_, ty) | Self::Param(_, ty) | Self::Reg(_, ty) |
      Self::UInt(_, ty) | Self::Undef(ty) => Some(ty.clone()),
      Self::Unit => Some(MirDt::Unit),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn var_and_const_report_pointer_type() {
    let v = MirVal::Var { id: VarId::from_usize(0), pointee: MirDt::I32 };
    assert_eq!(v.mir_type(), Some(MirDt::I32.ptr()));
    let c = MirVal::Const { name: crate::intern("k"), pointee: MirDt::F64 };
    assert_eq!(c.mir_type(), Some(MirDt::F64.ptr()));
  }

  #[test]
  fn reg_ids_round_trip_through_idx() {
    let id = RegId::from_usize(7);
    assert_eq!(id.into_usize(), 7);
  }
}
