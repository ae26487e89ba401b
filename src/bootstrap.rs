//! Role bootstrapper - assistant launch and instruction injection
//!
//! Two strict phases separated by a settle barrier: launch the assistant
//! in every pane, stage each pane's role instruction without submitting
//! it, wait once for the whole topology, then commit everything inside
//! the same narrow window. The barrier is a fixed delay, not a readiness
//! signal - the assistant gives the orchestrator nothing to wait on.

use std::collections::BTreeSet;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::mux::Multiplexer;
use crate::signal::marker_name;
use crate::topology::{Role, Topology};

/// Outcome of one bootstrap pass
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// Roles whose pane received and committed its instruction
    pub bootstrapped: Vec<Role>,
    /// Roles whose pane dropped out of the sequence
    pub failed: Vec<Role>,
}

impl BootstrapReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The instruction text staged into a role's pane
///
/// Plain natural language naming the role, pointing it at the shared
/// instruction document, and (for workers) at the completion marker to
/// create when done. The orchestrator never parses any of this.
pub fn instruction_for(role: Role, config: &OrchestratorConfig) -> String {
    let doc = config.instructions_path.display();
    match role {
        Role::Coordinator => format!(
            "You are the coordinator. Read {doc} for the task brief. Watch the {} directory \
             for worker completion files and assemble the final result once every worker \
             has reported.",
            config.marker_dir.display()
        ),
        Role::Supervisor => format!(
            "You are the supervisor. Read {doc}, split the task into units for the workers, \
             and review what they produce."
        ),
        Role::Worker(n) => format!(
            "You are worker{n}. Read {doc} and complete the unit assigned to worker{n}. \
             When you finish, create an empty file named {} in the {} directory to signal \
             completion.",
            marker_name(n),
            config.marker_dir.display()
        ),
    }
}

/// Launches the assistant and injects per-role instructions
pub struct RoleBootstrapper<'a, M: Multiplexer> {
    mux: &'a M,
    config: &'a OrchestratorConfig,
}

impl<'a, M: Multiplexer> RoleBootstrapper<'a, M> {
    pub fn new(mux: &'a M, config: &'a OrchestratorConfig) -> Self {
        Self { mux, config }
    }

    /// Run the full bootstrap sequence over the topology
    ///
    /// A pane whose delivery fails is skipped for its remaining steps and
    /// reported; every other pane proceeds. There is no all-or-nothing
    /// guarantee across panes.
    pub async fn bootstrap(&self, topology: &Topology) -> BootstrapReport {
        let mut failed: BTreeSet<Role> = BTreeSet::new();

        // Launch phase: the assistant gives no signal when it is ready
        for (role, pane) in topology.iter() {
            debug!(role = %role, pane = %pane.target, "launching assistant");
            if let Err(e) = self
                .mux
                .send_text(&pane.target, &self.config.assistant_command, true)
                .await
            {
                warn!(role = %role, pane = %pane.target, error = %e, "assistant launch not delivered");
                failed.insert(*role);
            }
        }

        // Instruction phase: staged in the input line, not yet submitted
        for (role, pane) in topology.iter() {
            if failed.contains(role) {
                continue;
            }
            let text = instruction_for(*role, self.config);
            if let Err(e) = self.mux.send_text(&pane.target, &text, false).await {
                warn!(role = %role, pane = %pane.target, error = %e, "instruction not delivered");
                failed.insert(*role);
            }
        }

        // Barrier: one collective settle delay for the whole topology.
        // A heuristic, not a guarantee - a slow assistant can still lose
        // the race.
        info!(settle = ?self.config.settle(), "waiting for assistants to settle");
        sleep(self.config.settle()).await;

        // Commit phase: submit every staged instruction in fixed role order
        for (role, pane) in topology.iter() {
            if failed.contains(role) {
                continue;
            }
            if let Err(e) = self.mux.send_text(&pane.target, "", true).await {
                warn!(role = %role, pane = %pane.target, error = %e, "commit not delivered");
                failed.insert(*role);
            }
        }

        let report = BootstrapReport {
            bootstrapped: topology
                .roles()
                .into_iter()
                .filter(|r| !failed.contains(r))
                .collect(),
            failed: failed.into_iter().collect(),
        };
        info!(
            bootstrapped = report.bootstrapped.len(),
            failed = report.failed.len(),
            "bootstrap finished"
        );
        report
    }
}
