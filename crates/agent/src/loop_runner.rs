//! Plan-level runner: plan once, then execute every step in order.

use std::sync::Arc;
use chrono::Utc;
use codeloop_config::AppConfig;
use codeloop_core::event::{DomainEvent, EventBus};
use codeloop_core::provider::Provider;
use codeloop_core::tool::ToolRegistry;
use tracing::{info, warn};
use crate::executor::{StepExecutor, StepOutcome, StepReport};
use crate::planner::Planner;

/// The result of running one task.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// The planner's reply, verbatim.
    pub plan_text: String,
    pub steps: Vec<StepReport>,
}

impl TaskReport {
    /// Steps that ran out of attempts.
    pub fn exhausted_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Exhausted { .. }))
    }

    pub fn all_done(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_done())
    }
}

/// Coordinates the planner and the step executor.
///
/// Steps run strictly in sequence against the same project; nothing is
/// rolled back. A model-service error anywhere ends the run.
pub struct AgentLoop {
    planner: Planner,
    executor: StepExecutor,
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    pub fn new(planner: Planner, executor: StepExecutor, event_bus: Arc<EventBus>) -> Self {
        Self {
            planner,
            executor,
            event_bus,
        }
    }

    /// Wire a loop from configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let planner = Planner::new(
            provider.clone(),
            &config.model,
            config.temperature,
            &config.agent.planner_prompt,
        );
        let executor = StepExecutor::new(
            provider,
            tools,
            &config.model,
            &config.agent.executor_prompt,
            event_bus.clone(),
        )
        .with_temperature(config.temperature)
        .with_max_attempts(config.agent.max_attempts)
        .with_result_limit(config.agent.tool_result_limit);

        Self::new(planner, executor, event_bus)
    }

    /// Plan `task` and execute every step.
    pub async fn run(&self, task: &str) -> Result<TaskReport, codeloop_core::Error> {
        info!(task = %task, "Planning task");
        let plan = self.planner.plan(task).await?;

        self.event_bus.publish(DomainEvent::PlanCreated {
            raw: plan.raw.clone(),
            steps: plan.steps.clone(),
            timestamp: Utc::now(),
        });

        if plan.steps.is_empty() {
            warn!("Plan contained no numbered steps");
        }

        let mut steps = Vec::with_capacity(plan.steps.len());
        for (index, step) in plan.steps.iter().enumerate() {
            let report = self.executor.run_step(index, step).await?;
            if let StepOutcome::Exhausted { attempts } = report.outcome {
                warn!(index, attempts, step = %step, "Step abandoned, continuing with the plan");
            }
            steps.push(report);
        }

        info!(steps = steps.len(), "Task complete");
        Ok(TaskReport {
            plan_text: plan.raw,
            steps,
        })
    }
}
