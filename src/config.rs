//! Pipeline configuration.

/// Toggles controlling which optional passes `optimize`/`optimize_checked`
/// run, analogous to the teacher crate's `settings::Flags`.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Run `pass::short_circuit` after the main pipeline. Off by default:
    /// the rewrite trades branch count for instruction count and is only a
    /// win once downstream code emission can fold the resulting chained
    /// jumps, so callers opt in explicitly.
    pub short_circuit: bool,

    /// Run the invariant verifier (`verify` module) around each pass.
    /// Defaults to `cfg!(debug_assertions)`, matching how a compiler
    /// typically runs its IR verifier after every pass in a debug build
    /// and skips it in release for throughput.
    pub verify: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            short_circuit: false,
            verify: cfg!(debug_assertions),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_short_circuit(mut self, enabled: bool) -> Self {
        self.short_circuit = enabled;
        self
    }

    pub fn with_verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }
}
