//! File identifiers, scope identifiers, and the per-scope name tables
//! (spec §3.1).

use hashbrown::HashMap;
use crate::Symbol;

/// Whether a file is a header (declarations only) or a source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind { Header, Source }

/// A file identifier, tagged with its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId {
  pub kind: FileKind,
  pub id: u32,
}

impl FileId {
  #[must_use] pub fn new(kind: FileKind, id: u32) -> Self { Self { kind, id } }
}

/// A process-unique, monotonically allocated scope identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

/// Allocates fresh [`ScopeId`]s. One instance lives for the whole
/// compilation process.
#[derive(Default)]
pub struct ScopeIdAllocator(u32);

impl ScopeIdAllocator {
  #[must_use] pub fn new() -> Self { Self(0) }

  pub fn alloc(&mut self) -> ScopeId {
    let id = ScopeId(self.0);
    self.0 += 1;
    id
  }
}

/// The eight entity kinds that have their own name table within a [`Scope`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
  Enum, EnumVariant, Function, Label, Struct, Typedef, Union, Variable,
}

/// An ID slot owned by a scope's name table. Borrowed references into this
/// slot (an `EntityRef`) must not outlive the scope (spec §5: "IDs embedded
/// in other structures are non-owning").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityRef {
  pub file: FileId,
  pub entity_id: u32,
  pub decl_id: u32,
}

/// Variable and label IDs additionally carry the scope they were defined
/// in, per spec §3.1's invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScopedEntityRef {
  pub entity: EntityRef,
  pub scope_id: ScopeId,
}

/// The per-variable borrow state the (out-of-scope) `CIStateChecker*`
/// kinds attach to bindings; this crate only carries the metadata slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorrowState {
  #[default]
  Unknown,
  Moved,
  Borrowed,
  MutablyBorrowed,
}

/// A lexical scope: an optional parent, a block flag, and one name table
/// per entity kind plus a borrow-state map for variables.
#[derive(Debug)]
pub struct Scope {
  pub id: ScopeId,
  pub parent: Option<ScopeId>,
  pub is_block: bool,
  enums: HashMap<Symbol, EntityRef>,
  enum_variants: HashMap<Symbol, EntityRef>,
  functions: HashMap<Symbol, EntityRef>,
  labels: HashMap<Symbol, ScopedEntityRef>,
  structs: HashMap<Symbol, EntityRef>,
  typedefs: HashMap<Symbol, EntityRef>,
  unions: HashMap<Symbol, EntityRef>,
  variables: HashMap<Symbol, ScopedEntityRef>,
  borrow_states: HashMap<Symbol, BorrowState>,
}

impl Scope {
  #[must_use]
  pub fn new(id: ScopeId, parent: Option<ScopeId>, is_block: bool) -> Self {
    Self {
      id, parent, is_block,
      enums: HashMap::new(), enum_variants: HashMap::new(), functions: HashMap::new(),
      labels: HashMap::new(), structs: HashMap::new(), typedefs: HashMap::new(),
      unions: HashMap::new(), variables: HashMap::new(), borrow_states: HashMap::new(),
    }
  }

  /// Insert `name` into the table for `kind`. Returns the stored reference,
  /// or `None` if the name was already bound within this scope (spec §3.1:
  /// "within a scope, each (kind, name) is unique").
  pub fn insert(&mut self, kind: EntityKind, name: Symbol, entity: EntityRef) -> Option<EntityRef> {
    let table = self.table_mut(kind);
    if table.contains_key(&name) { return None }
    table.insert(name, entity);
    Some(entity)
  }

  /// Insert a variable, recording the defining scope alongside the ref.
  pub fn insert_variable(&mut self, name: Symbol, entity: EntityRef) -> Option<ScopedEntityRef> {
    if self.variables.contains_key(&name) { return None }
    let scoped = ScopedEntityRef { entity, scope_id: self.id };
    self.variables.insert(name, scoped);
    self.borrow_states.insert(name, BorrowState::Unknown);
    Some(scoped)
  }

  /// Insert a label, recording the defining scope alongside the ref.
  pub fn insert_label(&mut self, name: Symbol, entity: EntityRef) -> Option<ScopedEntityRef> {
    if self.labels.contains_key(&name) { return None }
    let scoped = ScopedEntityRef { entity, scope_id: self.id };
    self.labels.insert(name, scoped);
    Some(scoped)
  }

  /// Local-only lookup; walking to the parent scope is the caller's
  /// responsibility (spec §3.1: "Lookup is local only").
  #[must_use] pub fn lookup(&self, kind: EntityKind, name: Symbol) -> Option<EntityRef> {
    self.table(kind).get(&name).copied()
  }

  #[must_use] pub fn lookup_variable(&self, name: Symbol) -> Option<ScopedEntityRef> {
    self.variables.get(&name).copied()
  }

  #[must_use] pub fn lookup_label(&self, name: Symbol) -> Option<ScopedEntityRef> {
    self.labels.get(&name).copied()
  }

  #[must_use] pub fn borrow_state(&self, name: Symbol) -> Option<BorrowState> {
    self.borrow_states.get(&name).copied()
  }

  pub fn set_borrow_state(&mut self, name: Symbol, state: BorrowState) {
    self.borrow_states.insert(name, state);
  }

  fn table(&self, kind: EntityKind) -> &HashMap<Symbol, EntityRef> {
    match kind {
      EntityKind::Enum => &self.enums,
      EntityKind::EnumVariant => &self.enum_variants,
      EntityKind::Function => &self.functions,
      EntityKind::Struct => &self.structs,
      EntityKind::Typedef => &self.typedefs,
      EntityKind::Union => &self.unions,
      EntityKind::Label | EntityKind::Variable =>
        panic!("labels and variables carry a scope id; use insert_variable/insert_label"),
    }
  }

  fn table_mut(&mut self, kind: EntityKind) -> &mut HashMap<Symbol, EntityRef> {
    match kind {
      EntityKind::Enum => &mut self.enums,
      EntityKind::EnumVariant => &mut self.enum_variants,
      EntityKind::Function => &mut self.functions,
      EntityKind::Struct => &mut self.structs,
      EntityKind::Typedef => &mut self.typedefs,
      EntityKind::Union => &mut self.unions,
      EntityKind::Label | EntityKind::Variable =>
        panic!("labels and variables carry a scope id; use insert_variable/insert_label"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ent(id: u32) -> EntityRef {
    EntityRef { file: FileId::new(FileKind::Source, 0), entity_id: id, decl_id: 0 }
  }

  #[test]
  fn duplicate_name_in_same_kind_is_rejected() {
    let mut alloc = ScopeIdAllocator::new();
    let mut scope = Scope::new(alloc.alloc(), None, false);
    let name = crate::intern("x");
    assert!(scope.insert(EntityKind::Struct, name, ent(0)).is_some());
    assert!(scope.insert(EntityKind::Struct, name, ent(1)).is_none());
  }

  #[test]
  fn same_name_different_kind_is_allowed() {
    let mut alloc = ScopeIdAllocator::new();
    let mut scope = Scope::new(alloc.alloc(), None, false);
    let name = crate::intern("x");
    assert!(scope.insert(EntityKind::Struct, name, ent(0)).is_some());
    assert!(scope.insert(EntityKind::Typedef, name, ent(1)).is_some());
  }

  #[test]
  fn variable_records_defining_scope() {
    let mut alloc = ScopeIdAllocator::new();
    let id = alloc.alloc();
    let mut scope = Scope::new(id, None, true);
    let name = crate::intern("v");
    let v = scope.insert_variable(name, ent(0)).unwrap();
    assert_eq!(v.scope_id, id);
  }

  #[test]
  fn lookup_is_local_only() {
    let mut alloc = ScopeIdAllocator::new();
    let parent_id = alloc.alloc();
    let mut parent = Scope::new(parent_id, None, false);
    let name = crate::intern("x");
    parent.insert(EntityKind::Struct, name, ent(0));
    let child = Scope::new(alloc.alloc(), Some(parent_id), true);
    assert!(child.lookup(EntityKind::Struct, name).is_none());
  }
}
