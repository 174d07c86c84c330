pub mod confirm;
pub mod diagnostics;
pub mod executor;
pub mod instrument;
pub mod registry;
pub mod save;
pub mod workspace;

pub use confirm::{AutoApprove, AutoDecline, Confirm};
pub use diagnostics::{DiagnosticEntry, DiagnosticsSink, RingDiagnostics, DIAGNOSTICS_CAPACITY};
pub use executor::{error_result, ToolExecutor, ToolRegistry};
pub use instrument::{InstrumentedExecutor, ToolOutcome};
pub use registry::{descriptors, ToolKind};
pub use save::{HttpSaveBackend, SaveBackend, SaveError, SaveRequest};
pub use workspace::{Chart, ChartOptions, Highlight, Layout, Workspace, WorkspaceChange};
