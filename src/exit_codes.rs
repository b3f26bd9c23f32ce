//! Exit code constants for the sherpa CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state)
//! - 2: Workflow failure (a task in the graph failed)
//! - 3: Host I/O failure (file read/write/edit or shell execution)
//! - 4: Agent invocation failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid state, or unimplemented command.
pub const USER_ERROR: i32 = 1;

/// Workflow failure: an agent task failed and the workflow was marked failed.
pub const WORKFLOW_FAILURE: i32 = 2;

/// Host I/O failure: file or shell operation against the host runtime failed.
pub const HOST_FAILURE: i32 = 3;

/// Agent invocation failure.
pub const AGENT_FAILURE: i32 = 4;
