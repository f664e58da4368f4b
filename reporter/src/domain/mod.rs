//! Domain logic for KPI drift reporting
//!
//! - `drift` - period resolution and drift event derivation engine
//! - `render` - mapping of reports onto a block-based document

pub mod drift;
pub mod render;

pub use drift::{DriftError, KpiReport};
pub use render::{ReportDocument, render_report};
