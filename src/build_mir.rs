//! The MIR builder: module/function structure, load-CSE, and structured
//! control-flow lowering (spec §4.4).
//!
//! Condition and body lowering for `if`/`while`/`switch` are supplied as
//! closures rather than walking a concrete HIR/AST node, since lowering
//! full expressions and statements to MIR values is an analysis step this
//! crate's scope stops short of (spec §1: the core pipeline ends at the MIR
//! builder's structural shape, not a complete codegen-ready lowering of
//! every expression form).

use hashbrown::HashMap;
use crate::diagnostic::ErrorKind;
use crate::types::{MirDt, MirVal};
use crate::mir::{BlockId, BlockLimit, Function, Instruction, TopLevelItem};
use crate::{LilyError, LilyResult, Symbol};

/// One entry in a scope's load-CSE table (spec §4.4.3): which source value
/// a register holds, and where it was loaded.
#[derive(Clone, Debug)]
struct LoadRecord {
  value_name: MirVal,
  reg: MirVal,
  #[allow(dead_code)]
  block: BlockId,
}

/// One frame of a function's scope chain (spec §4.4.2). Each scope owns the
/// `BlockLimit` stamped on every block created while it was active, plus its
/// own local load-CSE table — invalidation never crosses a scope boundary
/// upward into the parent (spec §9: "no global cache").
#[derive(Clone, Debug)]
struct Scope {
  limit: BlockLimit,
  loads: Vec<LoadRecord>,
}

/// A function under construction: its finished data plus the transient
/// scope chain that only matters while lowering (spec §3.7 describes the
/// scope chain as part of a function's state; here it lives alongside the
/// function rather than inside its public, post-build data shape).
pub struct FunctionBuilder {
  pub function: Function,
  scopes: Vec<Scope>,
}

impl FunctionBuilder {
  #[must_use]
  pub fn new(function: Function) -> Self {
    Self { function, scopes: vec![Scope { limit: BlockLimit::new(), loads: Vec::new() }] }
  }

  /// Open a child scope, returning its limit so the caller can later detach
  /// it with [`Self::remove_scope_by_limit`].
  pub fn push_scope(&mut self) -> BlockLimit {
    let limit = BlockLimit::new();
    self.scopes.push(Scope { limit: limit.clone(), loads: Vec::new() });
    limit
  }

  /// `LilyMirRemoveScopeByLimit` (spec §4.4.2): detach the scope created
  /// with this exact limit handle.
  pub fn remove_scope_by_limit(&mut self, limit: &BlockLimit) {
    self.scopes.retain(|s| !s.limit.is_same_handle(limit));
  }

  /// `LilyMirBuildLoad` (spec §4.4.3). Searches the scope chain from
  /// innermost to outermost for an existing load of `value_name`; reuses its
  /// register if found, otherwise emits `%rN = load(src, dt)` and records it
  /// in the innermost scope.
  pub fn build_load(&mut self, src: MirVal, dt: MirDt, value_name: MirVal) -> MirVal {
    for scope in self.scopes.iter().rev() {
      if let Some(rec) = scope.loads.iter().find(|r| r.value_name == value_name) {
        return rec.reg.clone();
      }
    }
    let reg = self.function.fresh_reg();
    let block = self.function.current_block_id();
    self.function.push_inst(Instruction::Reg {
      name: reg,
      value: Box::new(Instruction::Load { src, dt: dt.clone() }),
    });
    let reg_val = MirVal::Reg(reg, dt);
    self.scopes.last_mut().expect("at least the root scope").loads.push(
      LoadRecord { value_name, reg: reg_val.clone(), block },
    );
    reg_val
  }

  /// `LilyMirBuildStore` (spec §4.4.3). A no-op store (`dest == src`
  /// structurally) emits nothing; otherwise invalidates any cached load of
  /// `dest` across every scope, then emits the store.
  pub fn build_store(&mut self, dest: MirVal, src: MirVal) {
    if dest == src { return }
    for scope in &mut self.scopes {
      scope.loads.retain(|r| r.value_name != dest);
    }
    self.function.push_inst(Instruction::Store { dest, src });
  }
}

/// `LilyMirAddFinalInstruction` (spec §4.4.5). Idempotent: a block already
/// ending in `ret`/`jmp`/`jmpcond`/`unreachable` is left untouched.
pub fn add_final_instruction(builder: &mut FunctionBuilder, exit: BlockId) -> bool {
  let cur = builder.function.current_block_id();
  if builder.function.block(cur).is_terminated() { return false }
  builder.function.push_inst(Instruction::Jmp(exit));
  true
}

/// A closure that lowers a statement body into the function under
/// construction.
pub type BodyFn = Box<dyn FnMut(&mut FunctionBuilder)>;

/// One `if`/`elif` arm: a condition and a body, each lowering into the
/// function under construction and returning/mutating it in place.
pub struct IfBranch {
  pub cond: Box<dyn FnMut(&mut FunctionBuilder) -> MirVal>,
  pub body: BodyFn,
}

/// Lower an `if` with any number of `elif` arms and an optional `else`
/// (spec §4.4.4). Returns the exit block, or `None` if every arm + else
/// ends in `ret` and the exit was never reachable (property 10).
pub fn build_if(
  builder: &mut FunctionBuilder,
  mut branches: Vec<IfBranch>,
  mut else_body: Option<BodyFn>,
) -> Option<BlockId> {
  assert!(!branches.is_empty(), "an if needs at least one branch");
  let exit = builder.function.new_block();
  builder.function.pop_current_block();

  let mut exit_reached = false;
  let mut next_cond: Option<BlockId> = None;

  for (i, branch) in branches.iter_mut().enumerate() {
    let cond_block = if i == 0 {
      let entry = builder.function.current_block_id();
      if builder.function.block(entry).instructions.is_empty() {
        entry
      } else {
        let cond = builder.function.new_block();
        builder.function.pop_current_block();
        builder.function.switch_to(entry);
        builder.function.push_inst(Instruction::Jmp(cond));
        builder.function.pop_current_block();
        cond
      }
    } else {
      next_cond.expect("elif reuses the previous branch's next block")
    };

    builder.function.switch_to(cond_block);
    let cond_val = (branch.cond)(builder);
    builder.function.pop_current_block();

    let if_bb = builder.function.new_block();
    builder.function.pop_current_block();
    let next_bb = builder.function.new_block();
    builder.function.pop_current_block();

    builder.function.switch_to(cond_block);
    builder.function.push_inst(Instruction::JmpCond { cond: cond_val, then_block: if_bb, else_block: next_bb });
    builder.function.pop_current_block();

    builder.function.switch_to(if_bb);
    (branch.body)(builder);
    exit_reached |= add_final_instruction(builder, exit);
    builder.function.pop_current_block();

    next_cond = Some(next_bb);
  }

  let tail = next_cond.expect("at least one branch was lowered");
  builder.function.switch_to(tail);
  if let Some(else_fn) = &mut else_body {
    else_fn(builder);
  }
  exit_reached |= add_final_instruction(builder, exit);
  builder.function.pop_current_block();

  if exit_reached {
    builder.function.switch_to(exit);
    Some(exit)
  } else {
    builder.function.remove_block(exit);
    None
  }
}

/// Lower a `while` loop (spec §4.4.4). `body` receives `(builder,
/// break_target, continue_target)` so nested `break`/`next` statements can
/// call [`build_break`]/[`build_next`] with the right blocks.
pub fn build_while(
  builder: &mut FunctionBuilder,
  mut cond: impl FnMut(&mut FunctionBuilder) -> MirVal,
  mut body: impl FnMut(&mut FunctionBuilder, BlockId, BlockId),
) -> BlockId {
  let entry = builder.function.current_block_id();
  let cond_block = builder.function.new_block();
  builder.function.pop_current_block();
  builder.function.switch_to(entry);
  builder.function.push_inst(Instruction::Jmp(cond_block));
  builder.function.pop_current_block();

  builder.function.switch_to(cond_block);
  let cond_val = cond(builder);
  builder.function.pop_current_block();

  let body_bb = builder.function.new_block();
  builder.function.pop_current_block();
  let exit = builder.function.new_block();
  builder.function.pop_current_block();

  builder.function.switch_to(cond_block);
  builder.function.push_inst(Instruction::JmpCond { cond: cond_val, then_block: body_bb, else_block: exit });
  builder.function.pop_current_block();

  builder.function.switch_to(body_bb);
  body(builder, exit, cond_block);
  add_final_instruction(builder, cond_block);
  builder.function.pop_current_block();

  builder.function.switch_to(exit);
  exit
}

/// `LilyMirBuildBreak`/`LilyMirBuildNext` (spec §4.4.4): an unconditional
/// jump to the target the enclosing loop lowerer supplied, unless the
/// current block is already terminated (e.g. unreachable code after a
/// `return`).
pub fn build_break(builder: &mut FunctionBuilder, exit_block: BlockId) {
  add_final_instruction(builder, exit_block);
}

pub fn build_next(builder: &mut FunctionBuilder, next_block: BlockId) {
  add_final_instruction(builder, next_block);
}

/// Lower a `switch` over an integer scrutinee (spec §4.4.4). Each case
/// pairs a literal with its body; `else_body` is lowered into the default
/// block. The documented resolution for the reference implementation's
/// incomplete `has_else` branch (spec §9): when an else is present it *is*
/// the default block's body (never a separate case block); when absent,
/// the default block is `unreachable`.
pub fn build_switch(
  builder: &mut FunctionBuilder,
  scrutinee: MirVal,
  mut cases: Vec<(i64, BodyFn)>,
  mut else_body: Option<BodyFn>,
) -> BlockId {
  let dispatch = builder.function.current_block_id();
  let default_block = builder.function.new_block();
  builder.function.pop_current_block();

  let mut case_targets = Vec::with_capacity(cases.len());
  for (lit, _) in &cases {
    let bb = builder.function.new_block();
    builder.function.pop_current_block();
    case_targets.push((*lit, bb));
  }

  builder.function.switch_to(dispatch);
  builder.function.push_inst(Instruction::Switch { val: scrutinee, default: default_block, cases: case_targets.clone() });
  builder.function.pop_current_block();

  let exit = builder.function.new_block();
  builder.function.pop_current_block();

  for ((_, body), (_, bb)) in cases.iter_mut().zip(case_targets.iter()) {
    builder.function.switch_to(*bb);
    body(builder);
    add_final_instruction(builder, exit);
    builder.function.pop_current_block();
  }

  builder.function.switch_to(default_block);
  match &mut else_body {
    Some(else_fn) => {
      else_fn(builder);
      add_final_instruction(builder, exit);
    }
    None => builder.function.push_inst(Instruction::Unreachable),
  }
  builder.function.pop_current_block();

  builder.function.switch_to(exit);
  exit
}

/// Lower a `block`/`unsafe` construct (spec §4.4.4): a child scope and
/// block, tail-jumping to a fresh exit once the body is lowered.
pub fn build_block(builder: &mut FunctionBuilder, mut body: impl FnMut(&mut FunctionBuilder)) -> BlockId {
  let entry = builder.function.current_block_id();
  let limit = builder.push_scope();

  let child = builder.function.new_block();
  builder.function.pop_current_block();
  builder.function.switch_to(entry);
  add_final_instruction(builder, child);
  builder.function.pop_current_block();

  builder.function.switch_to(child);
  body(builder);
  let exit = builder.function.new_block();
  builder.function.pop_current_block();
  add_final_instruction(builder, exit);
  builder.function.pop_current_block();

  builder.remove_scope_by_limit(&limit);
  builder.function.switch_to(exit);
  exit
}

/// A top-level item under construction (spec §4.4.1's `Current` frame).
enum Current {
  Const { name: Symbol, dt: MirDt, value: Option<MirVal> },
  FunPrototype { name: Symbol, params: Vec<MirDt>, return_type: MirDt },
  Struct { name: Symbol, fields: Vec<MirDt> },
  Fun(FunctionBuilder),
}

/// A freshly started top-level construct, as passed to [`Module::begin`].
pub enum NewTopLevel {
  Const { name: Symbol, dt: MirDt },
  FunPrototype { name: Symbol, params: Vec<MirDt>, return_type: MirDt },
  Struct { name: Symbol, fields: Vec<MirDt> },
  Fun(Function),
}

/// A compilation unit's worth of MIR (spec §4.4.1): the committed top-level
/// items plus the stack of in-progress `const`/`fun`/`struct` builds.
#[derive(Default)]
pub struct Module {
  items: Vec<TopLevelItem>,
  index: HashMap<Symbol, usize>,
  stack: Vec<Current>,
}

impl Module {
  #[must_use] pub fn new() -> Self { Self::default() }

  /// `LilyMirAddInst` for a top-level kind: pushes a new `Current` frame.
  pub fn begin(&mut self, item: NewTopLevel) {
    self.stack.push(match item {
      NewTopLevel::Const { name, dt } => Current::Const { name, dt, value: None },
      NewTopLevel::FunPrototype { name, params, return_type } => Current::FunPrototype { name, params, return_type },
      NewTopLevel::Struct { name, fields } => Current::Struct { name, fields },
      NewTopLevel::Fun(f) => Current::Fun(FunctionBuilder::new(f)),
    });
  }

  /// `LilyMirAddInst` for everything else: appends to the innermost block of
  /// the function at the top of the stack. Any other top-of-stack kind
  /// rejects, since only a function body can receive plain instructions.
  pub fn add_inst(&mut self, inst: Instruction) -> LilyResult<()> {
    match self.stack.last_mut() {
      Some(Current::Fun(f)) => {
        f.function.push_inst(inst);
        Ok(())
      }
      _ => Err(fatal("instruction emitted outside a function body")),
    }
  }

  /// Set the value of the `const` currently under construction.
  pub fn set_const_value(&mut self, value: MirVal) -> LilyResult<()> {
    match self.stack.last_mut() {
      Some(Current::Const { value: slot, .. }) => { *slot = Some(value); Ok(()) }
      _ => Err(fatal("const value set outside a const body")),
    }
  }

  /// The function currently under construction, for callers driving
  /// control-flow lowering directly against it.
  pub fn current_function(&mut self) -> LilyResult<&mut FunctionBuilder> {
    match self.stack.last_mut() {
      Some(Current::Fun(f)) => Ok(f),
      _ => Err(fatal("no function is currently under construction")),
    }
  }

  /// `LilyMirPopCurrent`: finish the top-of-stack item and register it by
  /// name in the committed item map.
  pub fn pop_current(&mut self) -> LilyResult<Symbol> {
    let current = self.stack.pop().ok_or_else(|| fatal("no current item to pop"))?;
    let item = match current {
      Current::Const { name, dt, value } => {
        let value = value.ok_or_else(|| fatal("const popped with no value set"))?;
        TopLevelItem::Const { name, dt, value }
      }
      Current::FunPrototype { name, params, return_type } => TopLevelItem::FunPrototype { name, params, return_type },
      Current::Struct { name, fields } => TopLevelItem::Struct { name, fields },
      Current::Fun(f) => TopLevelItem::Fun(f.function),
    };
    let name = item.name();
    match self.index.entry(name) {
      hashbrown::hash_map::Entry::Occupied(_) => return Err(fatal("duplicate top-level name")),
      hashbrown::hash_map::Entry::Vacant(slot) => { slot.insert(self.items.len()); }
    }
    self.items.push(item);
    Ok(name)
  }

  #[must_use] pub fn get(&self, name: Symbol) -> Option<&TopLevelItem> {
    self.index.get(&name).map(|&i| &self.items[i])
  }

  #[must_use] pub fn items(&self) -> &[TopLevelItem] { &self.items }

  /// `LilyMirGetFunNameFromTypes` (spec §4.4.6): scan both the committed
  /// items and the in-progress builder stack for a function whose base name
  /// and `(params, return_type)` match, for overload resolution at lowering
  /// time.
  #[must_use]
  pub fn get_fun_name_from_types(&self, base_name: Symbol, params: &[MirDt], return_type: &MirDt) -> Option<Symbol> {
    let matches = |f: &Function| f.base_name == base_name && f.args == params && &f.return_type == return_type;
    for current in &self.stack {
      if let Current::Fun(fb) = current
        && matches(&fb.function) {
        return Some(fb.function.mangled_name)
      }
    }
    self.items.iter().find_map(|item| match item {
      TopLevelItem::Fun(f) if matches(f) => Some(f.mangled_name),
      _ => None,
    })
  }
}

fn fatal(msg: &'static str) -> LilyError {
  LilyError::new(
    ErrorKind::MirInvariantViolated(msg),
    crate::diagnostic::Location::new(crate::intern("<mir-builder>"), 0, 0, 0),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mir::Linkage;
  use crate::Idx;

  fn new_fn(name: &str) -> FunctionBuilder {
    let sym = crate::intern(name);
    let f = Function::new(sym, sym, vec![MirDt::I32], MirDt::I32, Linkage::Internal);
    let mut fb = FunctionBuilder::new(f);
    fb.function.new_block();
    fb
  }

  /// `fun f(i32 x) i32 = x + 1;` (spec §8's first end-to-end scenario).
  #[test]
  fn straight_line_function_lowers_to_one_block_ending_in_ret() {
    let mut fb = new_fn("f");
    let x = MirVal::Param(0, MirDt::I32);
    let reg = fb.function.fresh_reg();
    fb.function.push_inst(Instruction::Reg {
      name: reg,
      value: Box::new(Instruction::IArith(crate::mir::IntBinOp::Add, x, MirVal::Int(1, MirDt::I32))),
    });
    fb.function.push_inst(Instruction::Ret(Some(MirVal::Reg(reg, MirDt::I32))));
    assert_eq!(fb.function.block_count(), 1);
    assert!(fb.function.block(fb.function.current_block_id()).is_terminated());
  }

  /// `if x > 0 then 1 else -1` (spec §8's second end-to-end scenario):
  /// exactly one `jmpcond` and a three-block CFG (cond/then/else feeding one
  /// exit collapses `next_bb` into the else body here).
  #[test]
  fn if_with_else_produces_three_block_cfg_with_single_jmpcond() {
    let mut fb = new_fn("g");
    let branches = vec![IfBranch {
      cond: Box::new(|b: &mut FunctionBuilder| {
        let x = MirVal::Param(0, MirDt::I32);
        b.function.push_inst(Instruction::ICmp(crate::mir::CmpOp::Gt, x, MirVal::Int(0, MirDt::I32)));
        MirVal::Int(1, MirDt::I1)
      }),
      body: Box::new(|b: &mut FunctionBuilder| b.function.push_inst(Instruction::Ret(Some(MirVal::Int(1, MirDt::I32))))),
    }];
    let else_body: BodyFn =
      Box::new(|b: &mut FunctionBuilder| b.function.push_inst(Instruction::Ret(Some(MirVal::Int(-1, MirDt::I32)))));
    let exit = build_if(&mut fb, branches, Some(else_body));
    // Both arms return, so the exit is never reached and gets freed.
    assert!(exit.is_none());
    let jmpconds = fb.function.blocks().flat_map(|b| &b.instructions)
      .filter(|i| matches!(i, Instruction::JmpCond { .. })).count();
    assert_eq!(jmpconds, 1);
  }

  #[test]
  fn if_with_fallthrough_bodies_keeps_a_shared_exit_block() {
    let mut fb = new_fn("h");
    let branches = vec![IfBranch {
      cond: Box::new(|_: &mut FunctionBuilder| MirVal::Int(1, MirDt::I1)),
      body: Box::new(|_: &mut FunctionBuilder| {}),
    }];
    let exit = build_if(&mut fb, branches, None);
    assert!(exit.is_some());
    let jmps_to_exit = fb.function.blocks().flat_map(|b| &b.instructions)
      .filter(|i| matches!(i, Instruction::Jmp(id) if Some(*id) == exit)).count();
    assert_eq!(jmps_to_exit, 2, "both the then-body and the no-else tail fall through to exit");
  }

  #[test]
  fn load_cse_reuses_register_until_an_intervening_store() {
    let mut fb = new_fn("k");
    let var = MirVal::Var { id: crate::types::VarId::from_usize(0), pointee: MirDt::I32 };
    let first = fb.build_load(var.clone(), MirDt::I32, var.clone());
    let second = fb.build_load(var.clone(), MirDt::I32, var.clone());
    assert_eq!(first, second);

    fb.build_store(var.clone(), MirVal::Int(5, MirDt::I32));
    let third = fb.build_load(var.clone(), MirDt::I32, var.clone());
    assert_ne!(first, third);
  }

  #[test]
  fn store_of_identical_value_is_a_no_op() {
    let mut fb = new_fn("m");
    let var = MirVal::Var { id: crate::types::VarId::from_usize(0), pointee: MirDt::I32 };
    fb.build_store(var.clone(), var.clone());
    assert!(fb.function.block(fb.function.current_block_id()).instructions.is_empty());
  }

  #[test]
  fn add_final_instruction_is_idempotent() {
    let mut fb = new_fn("n");
    let exit = fb.function.new_block();
    fb.function.pop_current_block();
    assert!(add_final_instruction(&mut fb, exit));
    assert!(!add_final_instruction(&mut fb, exit));
    let jmps = fb.function.block(fb.function.current_block_id()).instructions.len();
    assert_eq!(jmps, 1);
  }

  #[test]
  fn while_loop_lowers_break_and_continue_to_exit_and_cond() {
    let mut fb = new_fn("p");
    let exit = build_while(
      &mut fb,
      |_| MirVal::Int(1, MirDt::I1),
      |b, break_target, continue_target| {
        build_break(b, break_target);
        let _ = continue_target;
      },
    );
    assert!(fb.function.block(exit).instructions.is_empty());
  }

  #[test]
  fn switch_without_else_marks_default_unreachable() {
    let mut fb = new_fn("q");
    let scrutinee = MirVal::Param(0, MirDt::I32);
    let cases: Vec<(i64, BodyFn)> = vec![
      (0, Box::new(|_: &mut FunctionBuilder| {})),
      (1, Box::new(|_: &mut FunctionBuilder| {})),
    ];
    build_switch(&mut fb, scrutinee, cases, None);
    let has_unreachable = fb.function.blocks().flat_map(|b| &b.instructions)
      .any(|i| matches!(i, Instruction::Unreachable));
    assert!(has_unreachable);
  }

  #[test]
  fn every_block_in_a_finished_function_is_terminated() {
    let mut fb = new_fn("r");
    let branches = vec![IfBranch {
      cond: Box::new(|_: &mut FunctionBuilder| MirVal::Int(1, MirDt::I1)),
      body: Box::new(|b: &mut FunctionBuilder| b.function.push_inst(Instruction::Ret(None))),
    }];
    build_if(&mut fb, branches, None);
    fb.function.push_inst(Instruction::Ret(None));
    for block in fb.function.blocks() {
      assert!(block.is_terminated(), "block {:?} left unterminated", block.name);
    }
  }

  #[test]
  fn module_rejects_instructions_outside_a_function() {
    let mut module = Module::new();
    module.begin(NewTopLevel::Const { name: crate::intern("K"), dt: MirDt::I32 });
    assert!(module.add_inst(Instruction::Ret(None)).is_err());
  }

  #[test]
  fn module_round_trips_a_function_through_begin_and_pop() {
    let mut module = Module::new();
    let f = Function::new(crate::intern("f"), crate::intern("f"), vec![], MirDt::Unit, Linkage::Internal);
    module.begin(NewTopLevel::Fun(f));
    module.current_function().unwrap().function.new_block();
    module.add_inst(Instruction::Ret(None)).unwrap();
    let name = module.pop_current().unwrap();
    assert!(matches!(module.get(name), Some(TopLevelItem::Fun(_))));
  }

  #[test]
  fn get_fun_name_from_types_matches_signature() {
    let mut module = Module::new();
    let f = Function::new(crate::intern("f$i32"), crate::intern("f"), vec![MirDt::I32], MirDt::I32, Linkage::Internal);
    module.begin(NewTopLevel::Fun(f));
    module.current_function().unwrap().function.new_block();
    let name = module.pop_current().unwrap();
    assert_eq!(name, crate::intern("f$i32"));
    let found = module.get_fun_name_from_types(crate::intern("f"), &[MirDt::I32], &MirDt::I32);
    assert_eq!(found, Some(name));
  }
}
