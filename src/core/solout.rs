//! Return flag of the user output sinks.

/// Return flags for the step and dense output sinks.
///
/// - `Continue`: proceed with integration as normal.
/// - `Interrupt`: stop integration and return control to the caller; the solve
///   ends with [`crate::Status::Interrupted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlag {
    Continue,
    Interrupt,
}
