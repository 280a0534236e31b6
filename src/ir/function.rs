//! Function records.
//!
//! A `FunctionData` is deliberately thin: name and entry block. Everything
//! else the optimizer needs to reason about a function — its blocks, its
//! instructions — is reached by walking from the entry block, exactly as
//! the distilled spec's `function_defined_in` back-reference implies.

use crate::entity::Block;

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: String,
    pub entry: Block,
}

impl FunctionData {
    pub fn new(name: impl Into<String>, entry: Block) -> Self {
        Self {
            name: name.into(),
            entry,
        }
    }
}
