//! Compile options shared by every phase.

/// Number of diagnostics after which a phase stops early.
pub const DEFAULT_MAX_DIAGNOSTICS: usize = 20;

/// Size in bytes of a pointer, string handle or function pointer.
pub const DEFAULT_POINTER_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub max_diagnostics: usize,
    pub pointer_size: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            max_diagnostics: DEFAULT_MAX_DIAGNOSTICS,
            pointer_size: DEFAULT_POINTER_SIZE,
        }
    }
}

impl CompileOptions {
    pub fn with_max_diagnostics(mut self, max_diagnostics: usize) -> Self {
        // A bound of zero would stop every phase before it starts
        self.max_diagnostics = max_diagnostics.max(1);
        self
    }

    pub fn with_pointer_size(mut self, pointer_size: u32) -> Self {
        self.pointer_size = pointer_size;
        self
    }
}
