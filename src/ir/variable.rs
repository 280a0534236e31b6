//! Three-address variables.

use super::types::Type;

/// The identity of a three-address variable: either a compiler-generated
/// temporary, numbered uniquely within its function, or a named source
/// variable at a particular SSA generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// A temporary, e.g. `t12`.
    Temp(u32),
    /// A named variable at a specific SSA renaming generation, e.g. `x.3`.
    Named { linked_var: u32, ssa_generation: u32 },
}

/// A three-address variable: an operand or assignee of an [`super::Instruction`].
///
/// Two variables are considered the same *definition site* by
/// [`variables_equal`], not by deriving `PartialEq` over every field —
/// `indirection_level` and `ty` are attributes of a particular occurrence,
/// not part of a variable's identity.
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    pub kind: VarKind,
    pub indirection_level: u8,
    pub ty: Type,
}

impl Variable {
    pub fn new_temp(number: u32, ty: Type) -> Self {
        Self {
            kind: VarKind::Temp(number),
            indirection_level: 0,
            ty,
        }
    }

    pub fn new_named(linked_var: u32, ssa_generation: u32, ty: Type) -> Self {
        Self {
            kind: VarKind::Named {
                linked_var,
                ssa_generation,
            },
            indirection_level: 0,
            ty,
        }
    }

    pub fn with_indirection(mut self, level: u8) -> Self {
        self.indirection_level = level;
        self
    }

    pub fn is_temp(&self) -> bool {
        matches!(self.kind, VarKind::Temp(_))
    }

    /// Does this variable write through a pointer rather than bind a fresh
    /// SSA value directly? Mark seeds on `Assn`/`AssnConst` whose assignee
    /// answers `true` here, since the pointer itself is a *use*, not merely
    /// a definition.
    pub fn writes_through_pointer(&self) -> bool {
        self.indirection_level > 0
    }
}

/// Equality predicate on three-address variables, per the identity rule in
/// the data model: temporaries compare by `temp_var_number`; named variables
/// compare by `linked_var`, and by `ssa_generation` too when `include_ssa` is
/// set. A temporary is never equal to a named variable.
pub fn variables_equal(a: &Variable, b: &Variable, include_ssa: bool) -> bool {
    match (a.kind, b.kind) {
        (VarKind::Temp(x), VarKind::Temp(y)) => x == y,
        (
            VarKind::Named {
                linked_var: lv1,
                ssa_generation: g1,
            },
            VarKind::Named {
                linked_var: lv2,
                ssa_generation: g2,
            },
        ) => lv1 == lv2 && (!include_ssa || g1 == g2),
        _ => false,
    }
}
