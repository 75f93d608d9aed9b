//! Struct/union field trees (spec §3.3).
//!
//! The original is a doubly linked list with non-owning `parent`/`prev` and
//! an owning `next`, plus a flat name index. A linked structure with
//! non-owning back-pointers doesn't translate directly into safe Rust
//! (spec §5's own rewrite guidance: "represent field trees as an arena of
//! fields plus `Index`"), so fields live in a per-aggregate [`FieldArena`]
//! and link to each other by [`FieldId`], which is `Copy` and therefore
//! trivially "non-owning" by construction.

use hashbrown::HashMap;
use crate::Symbol;
use crate::types::data_type::{DataType, GenericParam};
use crate::Idx;

/// An index into a [`FieldArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldId(u32);

impl Idx for FieldId {
  fn from_usize(n: usize) -> Self { Self(u32::try_from(n).expect("too many fields")) }
  fn into_usize(self) -> usize { self.0 as usize }
}

/// The kind of a field: an anonymous or named nested aggregate, or a leaf
/// member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
  AnonymousStruct(FieldsContainer),
  AnonymousUnion(FieldsContainer),
  NamedStruct(FieldsContainer),
  NamedUnion(FieldsContainer),
  Member { data_type: DataType, bit_width: Option<u32> },
}

/// A single field in a struct/union tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
  pub name: Option<Symbol>,
  pub kind: FieldKind,
  pub parent: Option<FieldId>,
  pub prev: Option<FieldId>,
  pub next: Option<FieldId>,
}

/// The arena backing every [`Field`] reachable from one top-level
/// struct/union declaration. Fields never move once allocated, so `FieldId`
/// stays valid for the arena's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldArena {
  fields: Vec<Field>,
}

impl FieldArena {
  #[must_use] pub fn new() -> Self { Self::default() }

  pub fn alloc(&mut self, field: Field) -> FieldId {
    let id = FieldId::from_usize(self.fields.len());
    self.fields.push(field);
    id
  }

  #[must_use] pub fn get(&self, id: FieldId) -> &Field { &self.fields[id.into_usize()] }
  pub fn get_mut(&mut self, id: FieldId) -> &mut Field { &mut self.fields[id.into_usize()] }
}

/// A doubly linked list of fields (first/last), plus an insertion-ordered
/// map from name to field for O(1) lookup of immediate named children
/// (spec §3.3: "the flat `FieldsContainer.members` map indexes only named,
/// immediate children").
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldsContainer {
  pub first: Option<FieldId>,
  pub last: Option<FieldId>,
  members: HashMap<Symbol, FieldId>,
}

impl FieldsContainer {
  #[must_use] pub fn new() -> Self { Self::default() }

  /// Append `field` after `prev` (or as the first field if `prev` is
  /// `None`), registering it in the named-members map if it has a name.
  /// Returns `false` if a named field with the same name is already
  /// present (spec §4.2: "reject duplicates by returning false").
  pub fn add(&mut self, arena: &mut FieldArena, mut field: Field, prev: Option<FieldId>) -> Option<FieldId> {
    if let Some(name) = field.name {
      if self.members.contains_key(&name) { return None }
    }
    field.prev = prev;
    field.next = None;
    let id = arena.alloc(field);
    match prev {
      Some(prev_id) => {
        let old_next = arena.get(prev_id).next;
        arena.get_mut(prev_id).next = Some(id);
        if let Some(old_next) = old_next {
          arena.get_mut(old_next).prev = Some(id);
          arena.get_mut(id).next = Some(old_next);
        } else {
          self.last = Some(id);
        }
      }
      None => {
        if let Some(first) = self.first {
          arena.get_mut(first).prev = Some(id);
          arena.get_mut(id).next = Some(first);
        } else {
          self.last = Some(id);
        }
        self.first = Some(id);
      }
    }
    if let Some(name) = arena.get(id).name { self.members.insert(name, id); }
    Some(id)
  }

  /// Iterate the linked structure front to back.
  pub fn iter<'a>(&'a self, arena: &'a FieldArena) -> impl Iterator<Item = FieldId> + 'a {
    std::iter::successors(self.first, move |&id| arena.get(id).next)
  }

  #[must_use] pub fn get_named(&self, name: Symbol) -> Option<FieldId> { self.members.get(&name).copied() }

  /// Walk a dotted path `[n0, n1, ...]` through named substructures,
  /// substituting generic parameters into the final member's data type
  /// (spec §3.3/§4.2). `decl_generic_params` are the enclosing
  /// declaration's own generic parameter names; `called_generic_params` are
  /// the concrete arguments they were instantiated with, in the same order.
  /// Returns the field and, if it is a [`FieldKind::Member`], its
  /// substituted data type (container fields have no data type of their
  /// own to substitute).
  pub fn get_field_from_path(
    &self,
    arena: &FieldArena,
    path: &[Symbol],
    called_generic_params: &[DataType],
    decl_generic_params: &[GenericParam],
  ) -> Option<(FieldId, Option<DataType>)> {
    let (&first, rest) = path.split_first()?;
    let id = self.get_named(first)?;
    if rest.is_empty() {
      let data_type = match &arena.get(id).kind {
        FieldKind::Member { data_type, .. } => Some(data_type.subst(decl_generic_params, called_generic_params)),
        FieldKind::AnonymousStruct(_) | FieldKind::AnonymousUnion(_) |
        FieldKind::NamedStruct(_) | FieldKind::NamedUnion(_) => None,
      };
      return Some((id, data_type));
    }
    match &arena.get(id).kind {
      FieldKind::AnonymousStruct(c) | FieldKind::AnonymousUnion(c) |
      FieldKind::NamedStruct(c) | FieldKind::NamedUnion(c) =>
        c.get_field_from_path(arena, rest, called_generic_params, decl_generic_params),
      FieldKind::Member { .. } => None,
    }
  }

  /// Deep traversal checking for any `Generic` leaf under this container.
  #[must_use]
  pub fn has_generic(&self, arena: &FieldArena) -> bool {
    self.iter(arena).any(|id| match &arena.get(id).kind {
      FieldKind::Member { data_type, .. } => matches!(data_type.kind(), crate::types::data_type::DataTypeKind::Generic(_)),
      FieldKind::AnonymousStruct(c) | FieldKind::AnonymousUnion(c) |
      FieldKind::NamedStruct(c) | FieldKind::NamedUnion(c) => c.has_generic(arena),
    })
  }
}

/// A complete field tree: the arena backing every field reachable from the
/// root container, bundled so a struct/union declaration can share one
/// `Rc<Fields>` between its [`crate::types::data_type::DataType`] and its
/// [`crate::types::decl::Decl`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fields {
  pub arena: FieldArena,
  pub root: FieldsContainer,
}

impl Fields {
  #[must_use] pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, field: Field, prev: Option<FieldId>) -> Option<FieldId> {
    self.root.add(&mut self.arena, field, prev)
  }

  pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ { self.root.iter(&self.arena) }

  #[must_use] pub fn get(&self, id: FieldId) -> &Field { self.arena.get(id) }

  #[must_use]
  pub fn get_field_from_path(
    &self,
    path: &[Symbol],
    called_generic_params: &[DataType],
    decl_generic_params: &[GenericParam],
  ) -> Option<(FieldId, Option<DataType>)> {
    self.root.get_field_from_path(&self.arena, path, called_generic_params, decl_generic_params)
  }

  #[must_use] pub fn has_generic(&self) -> bool { self.root.has_generic(&self.arena) }
}
