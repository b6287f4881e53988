//! Report output port trait.

use crate::domain::error::EngineError;
use crate::domain::runner::RunResult;

/// Port for writing run output (trade log, equity curve).
pub trait ReportPort {
    fn write(&self, result: &RunResult, output_stem: &str) -> Result<(), EngineError>;

    /// Default implementation: one `write` per result, suffixed by rank.
    fn write_many(&self, results: &[RunResult], output_stem: &str) -> Result<(), EngineError> {
        for (rank, result) in results.iter().enumerate() {
            self.write(result, &format!("{}_{}", output_stem, rank + 1))?;
        }
        Ok(())
    }
}
