//! Black-box MIR builder tests (spec §4.4), exercising `Module` and
//! `FunctionBuilder` through their public API the way a lowering pass for
//! an upstream AST/HIR would drive them.

use lilyc_core::build_mir::{build_if, build_while, IfBranch, Module, NewTopLevel};
use lilyc_core::mir::{Function, Instruction, Linkage};
use lilyc_core::types::{MirDt, MirVal};

/// `fun f(i32 x) i32 = if x > 0 then 1 else -1` lowers to a three-block CFG
/// with a single `jmpcond` and both arms tail-jumping to a shared exit
/// (spec §8's second worked scenario).
#[test]
fn if_else_function_lowers_to_three_blocks_with_one_jmpcond() {
  let mut module = Module::new();
  let f = Function::new(
    lilyc_core::intern("f"), lilyc_core::intern("f"),
    vec![MirDt::I32], MirDt::I32, Linkage::External,
  );
  module.begin(NewTopLevel::Fun(f));
  module.current_function().unwrap().function.new_block();

  let branches = vec![IfBranch {
    cond: Box::new(|b: &mut lilyc_core::build_mir::FunctionBuilder| {
      let x = MirVal::Param(0, MirDt::I32);
      b.function.push_inst(Instruction::ICmp(lilyc_core::mir::CmpOp::Gt, x, MirVal::Int(0, MirDt::I32)));
      MirVal::Int(1, MirDt::I1)
    }),
    body: Box::new(|b| b.function.push_inst(Instruction::Ret(Some(MirVal::Int(1, MirDt::I32))))),
  }];
  let else_body: lilyc_core::build_mir::BodyFn =
    Box::new(|b| b.function.push_inst(Instruction::Ret(Some(MirVal::Int(-1, MirDt::I32)))));

  build_if(module.current_function().unwrap(), branches, Some(else_body));

  let name = module.pop_current().unwrap();
  let item = module.get(name).unwrap();
  let lilyc_core::mir::TopLevelItem::Fun(func) = item else { panic!("expected a function") };

  assert_eq!(func.block_count(), 3, "cond/then/else, no exit block since every path returns");
  let jmpconds = func.blocks().flat_map(|b| &b.instructions)
    .filter(|i| matches!(i, Instruction::JmpCond { .. })).count();
  assert_eq!(jmpconds, 1);
  for block in func.blocks() {
    assert!(block.is_terminated());
  }
}

/// A `while` loop's body loads a variable, mutates it and stores it back;
/// the store should invalidate the load-CSE cache so a second load inside
/// the same iteration doesn't reuse a stale register.
#[test]
fn while_loop_body_store_invalidates_cached_load_each_iteration() {
  let mut module = Module::new();
  let f = Function::new(
    lilyc_core::intern("count_up"), lilyc_core::intern("count_up"),
    vec![], MirDt::Unit, Linkage::Internal,
  );
  module.begin(NewTopLevel::Fun(f));
  module.current_function().unwrap().function.new_block();

  let var = MirVal::Var { id: <lilyc_core::types::VarId as lilyc_core::Idx>::from_usize(0), pointee: MirDt::I32 };

  build_while(
    module.current_function().unwrap(),
    {
      let var = var.clone();
      move |b| {
        let loaded = b.build_load(var.clone(), MirDt::I32, var.clone());
        b.function.push_inst(Instruction::ICmp(lilyc_core::mir::CmpOp::Lt, loaded, MirVal::Int(10, MirDt::I32)));
        MirVal::Int(1, MirDt::I1)
      }
    },
    {
      let var = var.clone();
      move |b, _break_target, _continue_target| {
        let loaded = b.build_load(var.clone(), MirDt::I32, var.clone());
        let reg = b.function.fresh_reg();
        b.function.push_inst(Instruction::Reg {
          name: reg,
          value: Box::new(Instruction::IArith(lilyc_core::mir::IntBinOp::Add, loaded.clone(), MirVal::Int(1, MirDt::I32))),
        });
        b.build_store(var.clone(), MirVal::Reg(reg, MirDt::I32));
        let reloaded = b.build_load(var.clone(), MirDt::I32, var.clone());
        assert_ne!(reloaded, loaded, "the store must invalidate the cached load");
      }
    },
  );

  let name = module.pop_current().unwrap();
  assert!(module.get(name).is_some());
}
