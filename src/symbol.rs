//! A simple string interner, shared by every phase that needs to compare
//! identifiers cheaply (scanner identifiers, declaration names, mangled
//! names).

use std::cell::RefCell;
use hashbrown::HashMap;

/// An interned string. Equality and hashing are by index, not content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
  #[must_use] pub fn into_usize(self) -> usize { self.0 as usize }
}

#[derive(Default)]
pub struct Interner {
  strings: Vec<Box<str>>,
  map: HashMap<Box<str>, Symbol>,
}

impl Interner {
  #[must_use] pub fn new() -> Self { Self::default() }

  pub fn intern(&mut self, s: &str) -> Symbol {
    if let Some(&sym) = self.map.get(s) { return sym }
    let sym = Symbol(u32::try_from(self.strings.len()).expect("too many interned strings"));
    let boxed: Box<str> = s.into();
    self.strings.push(boxed.clone());
    self.map.insert(boxed, sym);
    sym
  }

  #[must_use] pub fn resolve(&self, sym: Symbol) -> &str { &self.strings[sym.0 as usize] }
}

thread_local! {
  static INTERNER: RefCell<Interner> = RefCell::new(Interner::new());
}

/// Intern a string into the thread-local interner.
pub fn intern(s: &str) -> Symbol { INTERNER.with(|i| i.borrow_mut().intern(s)) }

/// Resolve a symbol back to its string contents.
///
/// # Panics
/// Panics if `sym` was not produced by [`intern`] on this thread.
pub fn resolve(sym: Symbol) -> String { INTERNER.with(|i| i.borrow().resolve(sym).to_owned()) }

impl std::fmt::Display for Symbol {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", resolve(*self))
  }
}

impl std::fmt::Debug for Symbol {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Symbol({:?})", resolve(*self))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn same_string_interns_to_same_symbol() {
    let a = intern("foo");
    let b = intern("foo");
    let c = intern("bar");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(resolve(a), "foo");
  }
}
