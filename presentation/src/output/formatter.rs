//! Plain-text rendering of a project snapshot.

use colored::Colorize;
use foreman_domain::{Phase, ProjectState};

const RECENT_DISCUSSION: usize = 5;

/// Renders the committed state for the terminal.
pub struct StatusFormatter;

impl StatusFormatter {
    pub fn format(state: &ProjectState) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{} {}  (version {}, updated {})\n",
            "Project".bold(),
            state.project_id,
            state.version,
            state.updated_at
        ));
        out.push_str(&format!("Phase: {}\n", phase_colored(state.phase)));
        if let Some(goal) = &state.goal {
            out.push_str(&format!("Goal: {}\n", goal));
        }

        if let Some(plan_id) = &state.current_plan_id
            && let Some(plan) = state.plans.get(plan_id)
        {
            out.push_str(&format!(
                "\n{} {} ({} milestones, {} features, {} tasks)\n",
                "Plan".bold(),
                plan.id,
                plan.roadmap.len(),
                plan.features.len(),
                plan.tasks.len()
            ));
            for task in &plan.tasks {
                out.push_str(&format!("  [{}] {} ({})\n", task.id, task.title, task.role));
            }
        }

        let open_clarifications: Vec<_> = state
            .clarifications
            .iter()
            .filter(|c| !c.is_answered())
            .collect();
        if !open_clarifications.is_empty() {
            out.push_str(&format!("\n{}\n", "Open questions".bold()));
            for record in open_clarifications {
                for question in &record.questions {
                    out.push_str(&format!("  {} {}\n", record.id.dimmed(), question));
                }
            }
        }

        if !state.approvals.is_empty() {
            out.push_str(&format!("\n{}\n", "Pending approvals".bold().yellow()));
            for approval in &state.approvals {
                let target = approval
                    .plan_id
                    .clone()
                    .unwrap_or_else(|| format!("{} task(s)", approval.task_ids.len()));
                out.push_str(&format!(
                    "  {} {} -> {}\n",
                    approval.id,
                    approval.kind.as_str(),
                    target
                ));
            }
        }

        if let Some(execution) = &state.execution {
            let s = &execution.summary;
            out.push_str(&format!(
                "\n{} {}/{} completed, {} failed, {} in progress\n",
                "Execution".bold(),
                s.completed,
                s.total,
                s.failed,
                s.in_progress
            ));
            for failure in &execution.failures {
                out.push_str(&format!(
                    "  {} {}: {}\n",
                    "failed".red(),
                    failure.task_id,
                    failure.reason
                ));
            }
        }

        let recent: Vec<_> = state
            .discussion
            .iter()
            .rev()
            .take(RECENT_DISCUSSION)
            .collect();
        if !recent.is_empty() {
            out.push_str(&format!("\n{}\n", "Recent discussion".bold()));
            for entry in recent.into_iter().rev() {
                out.push_str(&format!(
                    "  {} [{}] {}\n",
                    entry.timestamp.dimmed(),
                    entry.kind.as_str(),
                    entry.message
                ));
            }
        }

        out
    }
}

fn phase_colored(phase: Phase) -> String {
    let name = phase.display_name();
    match phase {
        Phase::Completed => name.green().to_string(),
        Phase::Error => name.red().to_string(),
        Phase::AwaitingApproval | Phase::AwaitingExecutionApproval | Phase::AwaitingClarification => {
            name.yellow().to_string()
        }
        _ => name.cyan().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_domain::{Intent, transit};

    fn sample_state() -> ProjectState {
        let intent = Intent::CreateProject {
            project_id: "p1".to_string(),
            goal: Some("build X".to_string()),
            context: None,
            settings: None,
        };
        transit(None, &intent, "2026-01-01T00:00:01.000Z")
            .unwrap()
            .state
    }

    #[test]
    fn test_format_shows_phase_and_goal() {
        colored::control::set_override(false);
        let rendered = StatusFormatter::format(&sample_state());
        assert!(rendered.contains("Project p1"));
        assert!(rendered.contains("Phase: Planning"));
        assert!(rendered.contains("Goal: build X"));
    }

    #[test]
    fn test_format_omits_empty_sections() {
        colored::control::set_override(false);
        let rendered = StatusFormatter::format(&sample_state());
        assert!(!rendered.contains("Pending approvals"));
        assert!(!rendered.contains("Open questions"));
        assert!(!rendered.contains("Execution"));
    }
}
