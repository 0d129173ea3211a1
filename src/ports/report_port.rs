//! Report generation port trait.

use crate::domain::error::FactorlabError;
use crate::domain::simulation::SimulationResult;
use std::path::Path;

/// Port for persisting simulation output.
pub trait ReportPort {
    fn write(&self, result: &SimulationResult, output_dir: &Path) -> Result<(), FactorlabError>;
}
