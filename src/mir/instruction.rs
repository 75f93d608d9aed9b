//! The MIR instruction set, basic blocks, functions and modules (spec §3.7).
//!
//! The opcode families spec §3.7 lists (~80 total) are grouped here into a
//! handful of enums parametrized by an op kind (`IntBinOp`, `CmpOp`, ...)
//! rather than one flat 80-variant enum, matching `BinaryOp` in the AST
//! layer and `ExprKind`'s own precedent for this crate.

use std::cell::Cell;
use std::rc::Rc;
use crate::types::{MirDt, MirVal, RegId, VarId};
use crate::{Idx, Symbol};

/// An index into a [`Function`]'s block list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

impl Idx for BlockId {
  fn from_usize(n: usize) -> Self { Self(u32::try_from(n).expect("too many blocks")) }
  fn into_usize(self) -> usize { self.0 as usize }
}

/// A late-bound upper block id (spec §3.7/§4.4.2): shared between every
/// scope descending from the point it was taken, so that freeing a scope
/// (`LilyMirRemoveScopeByLimit`) can stamp every block created since with
/// the same limit without threading it through each call explicitly.
#[derive(Clone, Debug, Default)]
pub struct BlockLimit(Rc<Cell<Option<BlockId>>>);

impl BlockLimit {
  #[must_use] pub fn new() -> Self { Self::default() }
  #[must_use] pub fn get(&self) -> Option<BlockId> { self.0.get() }
  pub fn set(&self, id: BlockId) { self.0.set(Some(id)); }

  /// Identity comparison, not value comparison: two limits stamped with the
  /// same block id are still distinct handles (spec §4.4.2: detaching a
  /// scope is keyed by which limit it was created with).
  #[must_use] pub fn is_same_handle(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntBinOp { Add, Sub, Mul, Div, Rem }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloatBinOp { Add, Sub, Mul, Div, Rem }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp { Eq, Ne, Lt, Le, Gt, Ge }

/// One MIR instruction (spec §3.7). Every instruction that produces a value
/// is wrapped in [`Instruction::Reg`] or [`Instruction::Var`] by the builder
/// (spec §4.4.2's `r.`/`.` name managers); bare arithmetic/memory variants
/// below are the right-hand side of those bindings.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
  // --- Memory ---
  Alloc(MirDt),
  Load { src: MirVal, dt: MirDt },
  Store { dest: MirVal, src: MirVal },
  GetPtr(MirVal),
  GetArg(u32),
  GetField { base: MirVal, field: Symbol },
  GetArray { base: MirVal, index: MirVal },
  GetList { base: MirVal, index: u32 },
  GetSlice { base: MirVal, start: MirVal, end: MirVal },
  MakeRef(MirVal),
  MakeOpt(Option<MirVal>),
  RefPtr(MirVal),
  IncTrace(MirVal),
  Drop(MirVal),

  // --- Arithmetic ---
  IArith(IntBinOp, MirVal, MirVal),
  INeg(MirVal),
  FArith(FloatBinOp, MirVal, MirVal),
  FNeg(MirVal),
  Exp(MirVal, MirVal),
  Shl(MirVal, MirVal),
  Shr(MirVal, MirVal),

  // --- Bitwise / logical ---
  BitAnd(MirVal, MirVal),
  BitOr(MirVal, MirVal),
  BitNot(MirVal),
  Xor(MirVal, MirVal),
  Not(MirVal),

  // --- Comparison ---
  ICmp(CmpOp, MirVal, MirVal),
  FCmp(CmpOp, MirVal, MirVal),

  // --- Control ---
  Jmp(BlockId),
  JmpCond { cond: MirVal, then_block: BlockId, else_block: BlockId },
  Ret(Option<MirVal>),
  Switch { val: MirVal, default: BlockId, cases: Vec<(i64, BlockId)> },
  Unreachable,
  Try(MirVal),
  TryPtr(MirVal),
  IsOk(MirVal),
  IsErr(MirVal),
  NonNil(MirVal),

  // --- Structural ---
  Arg(u32),
  /// `%name = <inst>`, a register binding (spec §4.4.2's `r.` name manager).
  Reg { name: RegId, value: Box<Instruction> },
  /// `name = <inst>`, a virtual-variable binding (spec's `.` name manager).
  Var { name: VarId, value: Box<Instruction> },
  Val(MirVal),
  Asm(String),
  Trunc { value: MirVal, to: MirDt },
  BitCast { value: MirVal, to: MirDt },
  Call { callee: Symbol, args: Vec<MirVal> },
  SysCall { name: Symbol, args: Vec<MirVal> },
  BuiltinCall { builtin_id: u32, args: Vec<MirVal> },
  Len(MirVal),
}

impl Instruction {
  /// Whether this instruction terminates its block (spec §4.4.5: `ret`,
  /// `jmp`, `jmpcond`, `unreachable` need no trailing `jmp exit`).
  #[must_use]
  pub fn is_terminator(&self) -> bool {
    matches!(self, Instruction::Ret(_) | Instruction::Jmp(_) | Instruction::JmpCond { .. } | Instruction::Unreachable)
  }
}

/// A basic block: a name, an id, a late-bound upper limit, and an ordered
/// instruction list (spec §3.7).
#[derive(Clone, Debug)]
pub struct Block {
  pub name: Symbol,
  pub id: BlockId,
  pub limit: BlockLimit,
  pub instructions: Vec<Instruction>,
}

impl Block {
  #[must_use]
  pub fn new(name: Symbol, id: BlockId) -> Self {
    Self { name, id, limit: BlockLimit::new(), instructions: Vec::new() }
  }

  pub fn push(&mut self, inst: Instruction) { self.instructions.push(inst); }

  #[must_use] pub fn last(&self) -> Option<&Instruction> { self.instructions.last() }

  #[must_use] pub fn is_terminated(&self) -> bool { self.last().is_some_and(Instruction::is_terminator) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Linkage { Internal, External }

/// Produces unique names by concatenating a fixed prefix with a monotonic
/// counter (spec §4.4.2): `r.` for registers, `bb` for blocks, `.` for
/// compiler-temporary variables.
#[derive(Clone, Debug)]
pub struct NameManager {
  prefix: &'static str,
  next: u32,
}

impl NameManager {
  #[must_use] pub fn new(prefix: &'static str) -> Self { Self { prefix, next: 0 } }

  pub fn fresh(&mut self) -> Symbol {
    let (_, name) = self.fresh_indexed();
    name
  }

  /// Same as [`Self::fresh`], but also returns the raw counter value used,
  /// so a caller can build a matching [`RegId`]/[`VarId`]/[`BlockId`] without
  /// keeping a second counter in lockstep.
  pub fn fresh_indexed(&mut self) -> (u32, Symbol) {
    let n = self.next;
    let name = format!("{}{}", self.prefix, n);
    self.next += 1;
    (n, crate::intern(&name))
  }
}

/// A function: linkage, names, signature, its blocks in insertion order, and
/// the three name managers spec §3.7/§4.4.2 describes. Blocks are indexed by
/// [`BlockId`], which this crate allocates sequentially, so a plain `Vec`
/// doubles as the "insertion-ordered map" the spec calls for.
#[derive(Clone, Debug)]
pub struct Function {
  pub linkage: Linkage,
  pub mangled_name: Symbol,
  pub base_name: Symbol,
  pub args: Vec<MirDt>,
  pub generic_params: Option<Vec<Symbol>>,
  pub return_type: MirDt,
  /// Indexed directly by `BlockId`; a removed block (spec §4.4.4: an `if`
  /// exit that turned out unreachable) leaves a `None` hole rather than
  /// shifting every later id.
  blocks: Vec<Option<Block>>,
  block_stack: Vec<BlockId>,
  pub reg_names: NameManager,
  pub block_names: NameManager,
  pub var_names: NameManager,
}

impl Function {
  #[must_use]
  pub fn new(mangled_name: Symbol, base_name: Symbol, args: Vec<MirDt>, return_type: MirDt, linkage: Linkage) -> Self {
    Self {
      linkage, mangled_name, base_name, args, generic_params: None, return_type,
      blocks: Vec::new(), block_stack: Vec::new(),
      reg_names: NameManager::new("r."), block_names: NameManager::new("bb"), var_names: NameManager::new("."),
    }
  }

  /// Allocate a fresh, empty block and push it as the current insertion
  /// context.
  pub fn new_block(&mut self) -> BlockId {
    let (n, name) = self.block_names.fresh_indexed();
    let id = BlockId::from_usize(n as usize);
    self.blocks.push(Some(Block::new(name, id)));
    self.block_stack.push(id);
    id
  }

  /// Allocate a fresh register name (spec §4.4.2's `r.` manager), without
  /// binding it to any instruction yet.
  pub fn fresh_reg(&mut self) -> RegId {
    let (n, _) = self.reg_names.fresh_indexed();
    RegId::from_usize(n as usize)
  }

  /// Allocate a fresh compiler-temporary variable name (the `.` manager).
  pub fn fresh_var(&mut self) -> VarId {
    let (n, _) = self.var_names.fresh_indexed();
    VarId::from_usize(n as usize)
  }

  /// The block currently receiving instructions (spec §3.7's "block stack").
  #[must_use]
  pub fn current_block_id(&self) -> BlockId {
    *self.block_stack.last().expect("no block on the stack")
  }

  pub fn switch_to(&mut self, id: BlockId) { self.block_stack.push(id); }
  pub fn pop_current_block(&mut self) { self.block_stack.pop(); }

  pub fn push_inst(&mut self, inst: Instruction) {
    let id = self.current_block_id();
    self.block_mut(id).push(inst);
  }

  #[must_use]
  pub fn block(&self, id: BlockId) -> &Block {
    self.blocks[id.into_usize()].as_ref().expect("block was removed")
  }

  pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
    self.blocks[id.into_usize()].as_mut().expect("block was removed")
  }

  pub fn blocks(&self) -> impl Iterator<Item = &Block> { self.blocks.iter().filter_map(Option::as_ref) }

  #[must_use] pub fn block_count(&self) -> usize { self.blocks().count() }

  /// Drop a block entirely, e.g. an `if`'s exit block that turned out
  /// unreachable because every branch returns (spec §4.4.4). Leaves a hole
  /// rather than shifting later blocks, so every previously issued
  /// `BlockId` stays valid.
  pub fn remove_block(&mut self, id: BlockId) {
    self.blocks[id.into_usize()] = None;
  }
}

#[derive(Clone, Debug)]
pub enum TopLevelItem {
  Const { name: Symbol, dt: MirDt, value: MirVal },
  Struct { name: Symbol, fields: Vec<MirDt> },
  Fun(Function),
  FunPrototype { name: Symbol, params: Vec<MirDt>, return_type: MirDt },
}

impl TopLevelItem {
  #[must_use]
  pub fn name(&self) -> Symbol {
    match self {
      TopLevelItem::Const { name, .. } | TopLevelItem::Struct { name, .. } | TopLevelItem::FunPrototype { name, .. } => *name,
      TopLevelItem::Fun(f) => f.mangled_name,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_manager_produces_monotonic_names() {
    let mut mgr = NameManager::new("bb");
    assert_eq!(crate::symbol::resolve(mgr.fresh()), "bb0");
    assert_eq!(crate::symbol::resolve(mgr.fresh()), "bb1");
  }

  #[test]
  fn function_blocks_are_indexed_by_block_id() {
    let mut f = Function::new(crate::intern("f"), crate::intern("f"), vec![], MirDt::Unit, Linkage::Internal);
    let entry = f.new_block();
    f.push_inst(Instruction::Ret(None));
    assert!(f.block(entry).is_terminated());
  }

  #[test]
  fn unterminated_block_reports_not_terminated() {
    let mut f = Function::new(crate::intern("g"), crate::intern("g"), vec![], MirDt::Unit, Linkage::Internal);
    let entry = f.new_block();
    f.push_inst(Instruction::Val(MirVal::Unit));
    assert!(!f.block(entry).is_terminated());
  }
}
