//! Symbolic-IR extraction, naming, and prune-and-emit.
//!
//! Shared by `weights`/`graph` (which only need `access_symbol` for ROI
//! sizes and workgroup counts) and `emit` (which also needs the full
//! prune-and-emit pass).

use crate::artifact::schema::{Operand, ScalarSource, SymIr, SymOpCode, ValueName};
use crate::error::{DenoxError, DenoxResult};
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct SymbolicIr {
    var_count: u32,
    ops: Vec<crate::artifact::schema::SymOp>,
    names: HashMap<u32, String>,
}

impl SymbolicIr {
    /// Walks the artifact's value-name table and binds every variable id
    /// (`< var_count`) to its registered name. Non-variable named
    /// intermediates are discarded; unnamed variables are a hard error.
    pub fn build(sym_ir: &SymIr, value_names: &[ValueName]) -> DenoxResult<SymbolicIr> {
        let mut names = HashMap::new();
        for vn in value_names {
            if let Some(sid) = vn.value.symbol_id() {
                if sid < sym_ir.var_count {
                    names.insert(sid, vn.name.clone());
                }
            }
        }
        for sid in 0..sym_ir.var_count {
            if !names.contains_key(&sid) {
                return Err(DenoxError::UnnamedSymbolicVariable { sid });
            }
        }
        Ok(SymbolicIr {
            var_count: sym_ir.var_count,
            ops: sym_ir.ops.clone(),
            names,
        })
    }

    pub fn var_count(&self) -> u32 {
        self.var_count
    }

    pub fn variable_names(&self) -> impl Iterator<Item = (u32, &str)> {
        (0..self.var_count).map(move |sid| (sid, self.names[&sid].as_str()))
    }

    fn is_op_id(&self, sid: u32) -> bool {
        sid >= self.var_count
    }

    /// The emission-time C expression for a scalar source: literal → its
    /// unsigned decimal, symbolic var → its registered name, symbolic op →
    /// `s<sid>`. Marks `sid` in `referenced` for symbolic sources.
    pub fn access_symbol(&self, source: &ScalarSource, referenced: &mut HashSet<u32>) -> String {
        match source {
            ScalarSource::Literal { .. } => source.as_unsigned_literal().unwrap().to_string(),
            ScalarSource::Symbolic { sid } => {
                referenced.insert(*sid);
                self.symbol_name(*sid)
            }
        }
    }

    fn symbol_name(&self, sid: u32) -> String {
        if self.is_op_id(sid) {
            format!("s{sid}")
        } else {
            self.names[&sid].clone()
        }
    }

    fn operand_expr(&self, operand: Operand) -> String {
        match operand {
            Operand::Literal(v) => v.to_string(),
            Operand::Symbol(sid) => self.symbol_name(sid),
        }
    }

    fn lower(&self, opcode: SymOpCode, lhs: &str, rhs: &str) -> String {
        match opcode {
            SymOpCode::Add => format!("{lhs} + {rhs}"),
            SymOpCode::Sub => format!("{lhs} - {rhs}"),
            SymOpCode::Mul => format!("{lhs} * {rhs}"),
            SymOpCode::Div => format!("{lhs} / {rhs}"),
            SymOpCode::Mod => format!("(({lhs}%{rhs})+{rhs})%{rhs}"),
            SymOpCode::Min => format!("{lhs}<{rhs}?{lhs}:{rhs}"),
            SymOpCode::Max => format!("{lhs}<{rhs}?{rhs}:{lhs}"),
        }
    }

    /// Prunes ops with zero refcount to fixpoint, then returns the survivors
    /// in original IR order (already topologically sorted by construction)
    /// as `(sid, rendered C expression)` pairs.
    pub fn emit_live_expressions(&self, referenced: &HashSet<u32>) -> Vec<(u32, String)> {
        let n = self.ops.len();
        let mut refcount = vec![0u32; n];
        for op in &self.ops {
            for operand in [op.lhs, op.rhs] {
                if let Operand::Symbol(sid) = operand {
                    if self.is_op_id(sid) {
                        refcount[(sid - self.var_count) as usize] += 1;
                    }
                }
            }
        }
        for &sid in referenced {
            if self.is_op_id(sid) {
                refcount[(sid - self.var_count) as usize] += 1;
            }
        }

        let mut alive = vec![true; n];
        loop {
            let mut changed = false;
            for i in 0..n {
                if alive[i] && refcount[i] == 0 {
                    alive[i] = false;
                    changed = true;
                    for operand in [self.ops[i].lhs, self.ops[i].rhs] {
                        if let Operand::Symbol(sid) = operand {
                            if self.is_op_id(sid) {
                                let j = (sid - self.var_count) as usize;
                                refcount[j] = refcount[j].saturating_sub(1);
                            }
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let mut out = Vec::new();
        for (i, op) in self.ops.iter().enumerate() {
            if !alive[i] {
                continue;
            }
            let sid = self.var_count + i as u32;
            let lhs = self.operand_expr(op.lhs);
            let rhs = self.operand_expr(op.rhs);
            out.push((sid, self.lower(op.opcode, &lhs, &rhs)));
        }
        out
    }
}
