//! Structural type representation (spec §3.2).

use std::cell::Cell;
use std::rc::Rc;
use bitflags::bitflags;
use crate::Symbol;
use super::decl::SizeInfo;
use super::field::Fields;

bitflags! {
  /// Borrow-checker hints carried on a data type (spec §3.2). The borrow
  /// checker itself is out of scope (spec §1); only this metadata is kept.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
  pub struct TypeContext: u8 {
    const HEAP = 1 << 0;
    const NON_NULL = 1 << 1;
    const STACK = 1 << 2;
    const TRACE = 1 << 3;
  }

  /// C-style type qualifiers.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
  pub struct TypeQualifier: u8 {
    const CONST = 1 << 0;
    const VOLATILE = 1 << 1;
    const RESTRICT = 1 << 2;
    const ATOMIC = 1 << 3;
    const NORETURN = 1 << 4;
  }
}

/// A generic (type) parameter: a name that stands for a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenericParam {
  pub name: Symbol,
}

/// An array payload: either a statically known size or none (spec §3.2).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArraySize {
  Sized(u64),
  None,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayType {
  pub element: DataType,
  pub name: Option<Symbol>,
  pub size: ArraySize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumType {
  pub name: Option<Symbol>,
  pub variants: Option<Vec<Symbol>>,
  pub underlying: Option<DataType>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionType {
  pub name: Option<Symbol>,
  pub params: Option<Vec<DataType>>,
  pub return_type: DataType,
  /// The outer "function-of-function" type, for function-pointer spellings
  /// like `int (*f(int))(int)`.
  pub outer: Option<Box<DataType>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateType {
  pub name: Option<Symbol>,
  pub generic_params: Option<Vec<GenericParam>>,
  pub fields: Option<Rc<Fields>>,
  /// Cached layout, filled in on demand by the resolver (spec §4.3.2).
  /// `{0, 0}` means "unresolved".
  pub size_info: Cell<SizeInfo>,
}

impl AggregateType {
  #[must_use]
  pub fn new(name: Option<Symbol>, generic_params: Option<Vec<GenericParam>>, fields: Option<Rc<Fields>>) -> Self {
    Self { name, generic_params, fields, size_info: Cell::new(SizeInfo::default()) }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedefType {
  pub name: Symbol,
  pub generic_params: Option<Vec<GenericParam>>,
}

/// The ~35 primitive/composite kinds a data type can take (spec §3.2).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataTypeKind {
  // --- primitives ---
  Any, Bool, Char, Double, Float, Int, LongDouble, LongInt, LongLongInt,
  ShortInt, SignedChar, UnsignedChar, UnsignedInt, UnsignedLongInt,
  UnsignedLongLongInt, UnsignedShortInt, Void,
  Isize, Usize, I8, I16, I32, I64, U8, U16, U32, U64, F32, F64,
  /// An integer id into a process-wide builtin table (external collaborator).
  Builtin(u32),
  /// An integer id into the builtin `type_info` table.
  TypeInfo(u32),
  // --- composites ---
  Array(Box<ArrayType>),
  Enum(Box<EnumType>),
  Function(Box<FunctionType>),
  Struct(Box<AggregateType>),
  Union(Box<AggregateType>),
  Typedef(Box<TypedefType>),
  Pointer(Box<DataType>),
  Generic(Symbol),
}

/// A data type: kind, borrow-checker context, qualifiers, and a refcount.
/// Equality is structural and ignores the refcount (spec §3.2).
#[derive(Clone, Debug)]
pub struct DataType {
  inner: Rc<DataTypeInner>,
}

#[derive(Debug)]
struct DataTypeInner {
  kind: DataTypeKind,
  context: Cell<TypeContext>,
  qualifier: Cell<TypeQualifier>,
}

impl PartialEq for DataType {
  fn eq(&self, other: &Self) -> bool { self.inner.kind == other.inner.kind }
}
impl Eq for DataType {}

impl DataType {
  #[must_use]
  pub fn new(kind: DataTypeKind) -> Self { Self::with_context(kind, TypeContext::empty()) }

  #[must_use]
  pub fn with_context(kind: DataTypeKind, context: TypeContext) -> Self {
    Self { inner: Rc::new(DataTypeInner { kind, context: Cell::new(context), qualifier: Cell::new(TypeQualifier::empty()) }) }
  }

  #[must_use] pub fn kind(&self) -> &DataTypeKind { &self.inner.kind }
  #[must_use] pub fn context(&self) -> TypeContext { self.inner.context.get() }
  #[must_use] pub fn qualifier(&self) -> TypeQualifier { self.inner.qualifier.get() }
  pub fn set_qualifier(&self, q: TypeQualifier) { self.inner.qualifier.set(q); }

  /// The refcount of this handle (how many places share this node).
  #[must_use] pub fn strong_count(&self) -> usize { Rc::strong_count(&self.inner) }

  /// Wraps `self` in a pointer type with the given borrow-checker context.
  #[must_use]
  pub fn wrap_ptr(&self, context: TypeContext) -> Self {
    Self::with_context(DataTypeKind::Pointer(Box::new(self.clone())), context)
  }

  #[must_use] pub fn is_pointer(&self) -> bool { matches!(self.inner.kind, DataTypeKind::Pointer(_)) }

  #[must_use] pub fn is_integer(&self) -> bool {
    matches!(self.inner.kind,
      DataTypeKind::Int | DataTypeKind::LongInt | DataTypeKind::LongLongInt | DataTypeKind::ShortInt |
      DataTypeKind::SignedChar | DataTypeKind::UnsignedChar | DataTypeKind::UnsignedInt |
      DataTypeKind::UnsignedLongInt | DataTypeKind::UnsignedLongLongInt | DataTypeKind::UnsignedShortInt |
      DataTypeKind::Isize | DataTypeKind::Usize |
      DataTypeKind::I8 | DataTypeKind::I16 | DataTypeKind::I32 | DataTypeKind::I64 |
      DataTypeKind::U8 | DataTypeKind::U16 | DataTypeKind::U32 | DataTypeKind::U64 | DataTypeKind::Char)
  }

  /// Mangle a name by concatenating the base name with the serialized
  /// argument types (spec §3.2's `serialize_name`), used to name `*Gen`
  /// monomorphized declarations.
  #[must_use]
  pub fn serialize_name(base: Symbol, called_generic_params: &[DataType]) -> String {
    let mut out = crate::symbol::resolve(base);
    for ty in called_generic_params {
      out.push('$');
      out.push_str(&ty.serialize());
    }
    out
  }

  /// Substitute every `Generic(name)` leaf reachable from `self` with the
  /// concrete argument `called_generic_params[i]` where `name` matches
  /// `decl_generic_params[i].name` (spec §4.2). Leaves with no matching
  /// name, and types with no generic leaves at all, pass through unchanged.
  #[must_use]
  pub fn subst(&self, decl_generic_params: &[GenericParam], called_generic_params: &[DataType]) -> Self {
    match &self.inner.kind {
      DataTypeKind::Generic(name) => {
        match decl_generic_params.iter().position(|p| p.name == *name) {
          Some(i) if i < called_generic_params.len() => called_generic_params[i].clone(),
          _ => self.clone(),
        }
      }
      DataTypeKind::Pointer(inner) => {
        let substituted = inner.subst(decl_generic_params, called_generic_params);
        if substituted == **inner { self.clone() } else { Self::with_context(DataTypeKind::Pointer(Box::new(substituted)), self.context()) }
      }
      DataTypeKind::Array(a) => {
        let substituted = a.element.subst(decl_generic_params, called_generic_params);
        if substituted == a.element { self.clone() } else {
          Self::with_context(DataTypeKind::Array(Box::new(ArrayType {
            element: substituted, name: a.name, size: a.size.clone(),
          })), self.context())
        }
      }
      _ => self.clone(),
    }
  }

  fn serialize(&self) -> String {
    match &self.inner.kind {
      DataTypeKind::Any => "any".into(),
      DataTypeKind::Bool => "bool".into(),
      DataTypeKind::Char => "char".into(),
      DataTypeKind::Double => "double".into(),
      DataTypeKind::Float => "float".into(),
      DataTypeKind::Int => "int".into(),
      DataTypeKind::LongDouble => "long_double".into(),
      DataTypeKind::LongInt => "long_int".into(),
      DataTypeKind::LongLongInt => "long_long_int".into(),
      DataTypeKind::ShortInt => "short_int".into(),
      DataTypeKind::SignedChar => "signed_char".into(),
      DataTypeKind::UnsignedChar => "unsigned_char".into(),
      DataTypeKind::UnsignedInt => "unsigned_int".into(),
      DataTypeKind::UnsignedLongInt => "unsigned_long_int".into(),
      DataTypeKind::UnsignedLongLongInt => "unsigned_long_long_int".into(),
      DataTypeKind::UnsignedShortInt => "unsigned_short_int".into(),
      DataTypeKind::Void => "void".into(),
      DataTypeKind::Isize => "isize".into(), DataTypeKind::Usize => "usize".into(),
      DataTypeKind::I8 => "i8".into(), DataTypeKind::I16 => "i16".into(),
      DataTypeKind::I32 => "i32".into(), DataTypeKind::I64 => "i64".into(),
      DataTypeKind::U8 => "u8".into(), DataTypeKind::U16 => "u16".into(),
      DataTypeKind::U32 => "u32".into(), DataTypeKind::U64 => "u64".into(),
      DataTypeKind::F32 => "f32".into(), DataTypeKind::F64 => "f64".into(),
      DataTypeKind::Builtin(id) => format!("builtin{id}"),
      DataTypeKind::TypeInfo(id) => format!("type_info{id}"),
      DataTypeKind::Pointer(inner) => format!("Ptr.{}", inner.serialize()),
      DataTypeKind::Generic(name) => crate::symbol::resolve(*name),
      DataTypeKind::Array(a) => format!("Array.{}", a.element.serialize()),
      DataTypeKind::Enum(e) => e.name.map(crate::symbol::resolve).unwrap_or_default(),
      DataTypeKind::Function(f) => f.name.map(crate::symbol::resolve).unwrap_or_default(),
      DataTypeKind::Struct(s) | DataTypeKind::Union(s) =>
        s.name.map(crate::symbol::resolve).unwrap_or_default(),
      DataTypeKind::Typedef(t) => crate::symbol::resolve(t.name),
    }
  }
}
