use serde::Serialize;
use std::fmt;

/// Counters for the lifetime of one daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub renders: u64,
    pub unchanged: u64,
    pub fetch_failures: u64,
    pub render_failures: u64,
    pub diagnostics: u64,
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles, {} renders, {} unchanged, {} fetch failures, {} render failures, {} trigger diagnostics",
            self.cycles,
            self.renders,
            self.unchanged,
            self.fetch_failures,
            self.render_failures,
            self.diagnostics
        )
    }
}
