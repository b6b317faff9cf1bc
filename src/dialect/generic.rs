use super::{helpers, Dialect, SamplingMethod, ThreadingModel};

/// A reference dialect for tests and [`MemoryDatabase`](crate::database::memory::MemoryDatabase):
/// plain double-quoted identifiers and the trait defaults for everything
/// else. Analogous to the teacher's `Ansi`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl Dialect for Generic {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }
}
