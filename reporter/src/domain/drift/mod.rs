//! KPI drift engine
//!
//! Pure, synchronous pipeline from a period key and a commit history to a
//! change report:
//!
//! - `period` - period key classification and cutoff resolution
//! - `window` - selection and ordering of commits after the cutoff
//! - `events` - create/update drift event derivation
//! - `report` - report assembly

mod error;
mod events;
mod period;
mod report;
mod window;

pub use error::DriftError;
pub use events::{DriftEvent, EventType, derive_events};
pub use period::{ResolvedPeriod, classify, last_instant_of, resolve_period};
pub use report::{EmptyReportPolicy, KpiReport, assemble, build_report, build_reports};
pub use window::{WindowedCommit, filter_after};
