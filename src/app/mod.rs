// Application layer - Controller, export worker and post-export workflow

pub mod container;
pub mod controller;
pub mod export_worker;
pub mod workflow;

// Re-export application types
pub use controller::ExportController;
pub use export_worker::{ExportHandle, ExportJob};
pub use workflow::{PostExportWorkflow, WorkflowStage};
