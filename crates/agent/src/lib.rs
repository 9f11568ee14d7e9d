//! The codeloop agent: plan a task, then execute each step.
//!
//! The agent follows a **Plan → Execute** cycle:
//!
//! 1. **Plan**: one model call turns the task into numbered step lines
//! 2. **Execute**: each step gets a fresh conversation with the executor persona
//! 3. **Act**: a tool call is dispatched through the registry and its
//!    result appended to the conversation
//! 4. **Finish**: a plain text reply completes the step
//!
//! A step that keeps calling tools past its attempt budget is abandoned
//! (`StepOutcome::Exhausted`) and the next step runs.

pub mod executor;
pub mod loop_runner;
pub mod planner;

#[cfg(test)]
mod test_helpers;

pub use executor::{StepExecutor, StepOutcome, StepReport, render_tool_result, truncate_chars};
pub use loop_runner::{AgentLoop, TaskReport};
pub use planner::{Plan, Planner, parse_plan};
