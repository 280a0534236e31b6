//! Interned local constants: string, `f32`, `f64`, and 128-bit XMM
//! immediates, emitted once in rodata by the (out-of-scope) emission
//! stage.
//!
//! The optimizer neither creates nor inspects these — it only ever clones
//! an id it finds on an instruction it copies (`Clean`'s `combine`, and the
//! short-circuit rewrite's instruction splitting, both deep-copy
//! instructions verbatim). This module exists so `Cfg` has somewhere to own
//! the interning tables the data model requires it to own, grounded in the
//! same "intern by exact bit pattern, never by `==`" rule the distilled
//! spec calls out in its design notes.

use rustc_hash::FxHashMap;

macro_rules! interned_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);
    };
}

interned_id!(StringConstId);
interned_id!(F32ConstId);
interned_id!(F64ConstId);
interned_id!(Xmm128ConstId);

#[derive(Debug, Default)]
struct Interner<K, V> {
    table: FxHashMap<K, V>,
    next: u32,
}

impl<K: std::hash::Hash + Eq + Clone, V: Copy + From<u32>> Interner<K, V> {
    fn intern(&mut self, key: K) -> V {
        if let Some(id) = self.table.get(&key) {
            return *id;
        }
        let id = V::from(self.next);
        self.next += 1;
        self.table.insert(key, id);
        id
    }
}

impl From<u32> for StringConstId {
    fn from(v: u32) -> Self {
        StringConstId(v)
    }
}
impl From<u32> for F32ConstId {
    fn from(v: u32) -> Self {
        F32ConstId(v)
    }
}
impl From<u32> for F64ConstId {
    fn from(v: u32) -> Self {
        F64ConstId(v)
    }
}
impl From<u32> for Xmm128ConstId {
    fn from(v: u32) -> Self {
        Xmm128ConstId(v)
    }
}

/// Bit-exact key for a 32-bit float: never compare floats with `==` when
/// deduplicating, since `NaN != NaN` and `+0.0 == -0.0` would both corrupt
/// the intern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct F32Bits(u32);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct F64Bits(u64);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Xmm128Bits(u128);

/// Interning tables for string, `f32`, `f64`, and 128-bit XMM local
/// constants, owned by the [`super::Cfg`].
#[derive(Debug, Default)]
pub struct LocalConstants {
    strings: Interner<String, StringConstId>,
    f32s: Interner<F32Bits, F32ConstId>,
    f64s: Interner<F64Bits, F64ConstId>,
    xmm128s: Interner<Xmm128Bits, Xmm128ConstId>,
}

impl LocalConstants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_string(&mut self, s: impl Into<String>) -> StringConstId {
        self.strings.intern(s.into())
    }

    pub fn intern_f32(&mut self, v: f32) -> F32ConstId {
        self.f32s.intern(F32Bits(v.to_bits()))
    }

    pub fn intern_f64(&mut self, v: f64) -> F64ConstId {
        self.f64s.intern(F64Bits(v.to_bits()))
    }

    pub fn intern_xmm128(&mut self, v: u128) -> Xmm128ConstId {
        self.xmm128s.intern(Xmm128Bits(v))
    }
}
