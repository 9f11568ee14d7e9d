//! Renders a finished task report as the user-facing transcript.
//!
//! The transcript is built from the [`TaskReport`] the agent returns, so
//! every plan, step and answer is printed exactly once and in order.
//! Live progress is left to the tracing logs on stderr.

use codeloop_agent::{StepOutcome, TaskReport};

#[derive(Debug, PartialEq)]
pub enum Line {
    Out(String),
    Err(String),
}

/// The transcript lines for a report, in print order.
pub fn transcript(report: &TaskReport) -> Vec<Line> {
    let mut lines = vec![Line::Out(format!("=== PLAN ===\n{}", report.plan_text))];

    for (index, step) in report.steps.iter().enumerate() {
        lines.push(Line::Out(format!("\n>>> Executing: {}", step.step)));
        match &step.outcome {
            StepOutcome::Done { answer } => lines.push(Line::Out(format!("Agent: {answer}"))),
            StepOutcome::Exhausted { attempts } => lines.push(Line::Err(format!(
                "warning: step {} gave up after {attempts} attempts without finishing",
                index + 1
            ))),
        }
    }

    lines.push(Line::Out("\n### Task complete".into()));
    lines
}

pub fn print(lines: &[Line]) {
    for line in lines {
        match line {
            Line::Out(text) => println!("{text}"),
            Line::Err(text) => eprintln!("{text}"),
        }
    }
}
