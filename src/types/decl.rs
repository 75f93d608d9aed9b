//! The declaration model: named entities, storage classes, and
//! monomorphized `*Gen` instances (spec §3.4).

use std::cell::Cell;
use std::rc::Rc;
use bitflags::bitflags;
use crate::Symbol;
use super::data_type::{DataType, GenericParam};
use super::field::Fields;
use super::scope::EntityRef;
use super::stmt::FunctionBody;

bitflags! {
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
  pub struct StorageClass: u16 {
    const AUTO = 1 << 0;
    const CONSTEXPR = 1 << 1;
    const EXTERN = 1 << 2;
    const INLINE = 1 << 3;
    const REGISTER = 1 << 4;
    const STATIC = 1 << 5;
    const THREAD_LOCAL = 1 << 6;
    const TYPEDEF = 1 << 7;
  }
}

/// The size and alignment of an aggregate. `{0, 0}` means "unresolved";
/// the resolver fills this in on demand and caches the result (spec
/// §3.4/§4.3.2).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SizeInfo {
  pub size: u64,
  pub alignment: u64,
}

impl SizeInfo {
  #[must_use] pub fn is_resolved(self) -> bool { self.size != 0 || self.alignment != 0 }
}

#[derive(Clone, Debug)]
pub struct FunctionParam {
  pub name: Option<Symbol>,
  pub data_type: DataType,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
  pub name: Symbol,
  pub variants: Vec<Symbol>,
  pub underlying: Option<DataType>,
  pub size_info: Cell<SizeInfo>,
}

#[derive(Clone, Debug)]
pub struct EnumVariantDecl {
  pub name: Symbol,
  pub parent_enum: EntityRef,
  pub explicit_value: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
  pub name: Symbol,
  pub params: Vec<FunctionParam>,
  pub return_type: DataType,
  pub generic_params: Option<Vec<GenericParam>>,
  pub body: Option<FunctionBody>,
}

/// A monomorphized instance of a generic declaration: a non-owning
/// reference to the generic declaration it was instantiated from, its
/// mangled name, the concrete arguments, and the substituted body.
#[derive(Clone, Debug)]
pub struct GenInstance<T> {
  pub generic: EntityRef,
  pub mangled_name: Symbol,
  pub args: Vec<DataType>,
  pub body: T,
}

#[derive(Clone, Debug)]
pub struct LabelDecl {
  pub name: Symbol,
}

/// The shared shape of a struct/union declaration.
#[derive(Clone, Debug)]
pub struct AggregateDecl {
  pub name: Option<Symbol>,
  pub generic_params: Option<Vec<GenericParam>>,
  pub fields: Option<Rc<Fields>>,
  pub size_info: Cell<SizeInfo>,
}

#[derive(Clone, Debug)]
pub struct TypedefDecl {
  pub name: Symbol,
  pub generic_params: Option<Vec<GenericParam>>,
  pub aliased: DataType,
  pub size_info: Cell<SizeInfo>,
}

#[derive(Clone, Debug)]
pub struct VariableDecl {
  pub name: Symbol,
  pub data_type: DataType,
}

/// A declaration: a tagged union over the eleven-ish entity kinds plus
/// their `*Gen` monomorphized counterparts (spec §3.4).
#[derive(Clone, Debug)]
pub enum DeclKind {
  Enum(Rc<EnumDecl>),
  EnumVariant(Rc<EnumVariantDecl>),
  Function(Rc<FunctionDecl>),
  FunctionGen(Rc<GenInstance<Option<FunctionBody>>>),
  Label(Rc<LabelDecl>),
  Struct(Rc<AggregateDecl>),
  StructGen(Rc<GenInstance<Option<Rc<Fields>>>>),
  Typedef(Rc<TypedefDecl>),
  TypedefGen(Rc<GenInstance<DataType>>),
  Union(Rc<AggregateDecl>),
  UnionGen(Rc<GenInstance<Option<Rc<Fields>>>>),
  Variable(Rc<VariableDecl>),
}

/// A declaration: its kind, storage class, prototype flag. The refcount
/// comes from sharing the `Decl` handle itself (`Decl` is `Clone`, cheaply,
/// like every other refcounted node in this crate).
#[derive(Clone, Debug)]
pub struct Decl {
  inner: Rc<DeclInner>,
}

#[derive(Debug)]
struct DeclInner {
  kind: DeclKind,
  storage_class: StorageClass,
  /// A prototype (forward declaration, no body). Destructors for prototype
  /// declarations skip freeing body-only payloads in the original; in Rust
  /// this falls out of `Option<Body>` being `None`, so there is nothing
  /// extra to do here beyond recording the flag for diagnostics/queries.
  is_prototype: bool,
}

impl Decl {
  #[must_use]
  pub fn new(kind: DeclKind, storage_class: StorageClass, is_prototype: bool) -> Self {
    Self { inner: Rc::new(DeclInner { kind, storage_class, is_prototype }) }
  }

  #[must_use] pub fn kind(&self) -> &DeclKind { &self.inner.kind }
  #[must_use] pub fn storage_class(&self) -> StorageClass { self.inner.storage_class }
  #[must_use] pub fn is_prototype(&self) -> bool { self.inner.is_prototype }
  #[must_use] pub fn strong_count(&self) -> usize { Rc::strong_count(&self.inner) }

  /// The declaration's `SizeInfo` slot, if it is an aggregate kind that has
  /// one (enum, struct, union, typedef and their `*Gen` counterparts don't
  /// carry a separate slot — they forward to the generic's aliased type).
  #[must_use]
  pub fn size_info(&self) -> Option<SizeInfo> {
    match &self.inner.kind {
      DeclKind::Enum(e) => Some(e.size_info.get()),
      DeclKind::Struct(s) | DeclKind::Union(s) => Some(s.size_info.get()),
      DeclKind::Typedef(t) => Some(t.size_info.get()),
      _ => None,
    }
  }

  pub fn set_size_info(&self, info: SizeInfo) {
    match &self.inner.kind {
      DeclKind::Enum(e) => e.size_info.set(info),
      DeclKind::Struct(s) | DeclKind::Union(s) => s.size_info.set(info),
      DeclKind::Typedef(t) => t.size_info.set(info),
      _ => {}
    }
  }

  #[must_use] pub fn name(&self) -> Option<Symbol> {
    match &self.inner.kind {
      DeclKind::Enum(e) => Some(e.name),
      DeclKind::EnumVariant(v) => Some(v.name),
      DeclKind::Function(f) => Some(f.name),
      DeclKind::FunctionGen(g) => Some(g.mangled_name),
      DeclKind::Label(l) => Some(l.name),
      DeclKind::Struct(s) | DeclKind::Union(s) => s.name,
      DeclKind::StructGen(g) | DeclKind::UnionGen(g) => Some(g.mangled_name),
      DeclKind::Typedef(t) => Some(t.name),
      DeclKind::TypedefGen(g) => Some(g.mangled_name),
      DeclKind::Variable(v) => Some(v.name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prototype_declarations_carry_no_body() {
    let decl = Decl::new(DeclKind::Function(Rc::new(FunctionDecl {
      name: crate::intern("f"), params: vec![],
      return_type: DataType::new(super::super::data_type::DataTypeKind::Void),
      generic_params: None, body: None,
    })), StorageClass::EXTERN, true);
    assert!(decl.is_prototype());
  }

  #[test]
  fn size_info_starts_unresolved() {
    let decl = Decl::new(DeclKind::Struct(Rc::new(AggregateDecl {
      name: Some(crate::intern("S")), generic_params: None, fields: None,
      size_info: Cell::new(SizeInfo::default()),
    })), StorageClass::empty(), false);
    assert!(!decl.size_info().unwrap().is_resolved());
    decl.set_size_info(SizeInfo { size: 8, alignment: 4 });
    assert_eq!(decl.size_info().unwrap().size, 8);
  }

  #[test]
  fn sharing_a_decl_increments_refcount() {
    let decl = Decl::new(DeclKind::Label(Rc::new(LabelDecl { name: crate::intern("L") })),
      StorageClass::empty(), false);
    let shared = decl.clone();
    assert_eq!(decl.strong_count(), 2);
    drop(shared);
    assert_eq!(decl.strong_count(), 1);
  }
}
