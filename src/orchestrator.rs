//! Main orchestrator - wires cleanup, layout, and bootstrap together

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::bootstrap::{BootstrapReport, RoleBootstrapper};
use crate::cleanup::CleanupStage;
use crate::config::OrchestratorConfig;
use crate::error::CoterieError;
use crate::layout::LayoutBuilder;
use crate::mux::Multiplexer;
use crate::signal::CompletionSignals;

/// Drives one orchestration run: reset, build, bootstrap
///
/// Single-threaded by construction - every gateway call is awaited in
/// sequence. The agent processes themselves run outside this core,
/// scheduled by the operating system.
pub struct Orchestrator<M: Multiplexer> {
    mux: Arc<M>,
    config: OrchestratorConfig,
}

impl<M: Multiplexer> Orchestrator<M> {
    pub fn new(mux: M, config: OrchestratorConfig) -> Self {
        Self {
            mux: Arc::new(mux),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The completion channel external workers write into
    pub fn signals(&self) -> CompletionSignals {
        CompletionSignals::new(self.config.resolved_marker_dir())
    }

    /// Run the full sequence to steady state
    ///
    /// Substrate unavailability and construction failures abort the run;
    /// per-pane bootstrap failures are reported, not fatal.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<BootstrapReport, CoterieError> {
        let version = self
            .mux
            .available()
            .await
            .map_err(|e| CoterieError::SubstrateUnavailable(e.to_string()))?;
        info!(version = %version, "multiplexer available");

        let signals = self.signals();
        CleanupStage::new(&*self.mux)
            .reset(&self.config.topology.session_names(), &signals)
            .await;

        let topology = LayoutBuilder::new(&*self.mux, self.config.resolved_work_dir())
            .build(&self.config.topology)
            .await?;

        let report = RoleBootstrapper::new(&*self.mux, &self.config)
            .bootstrap(&topology)
            .await;
        for role in &report.failed {
            warn!(role = %role, "pane dropped out of bootstrap");
        }

        info!(
            bootstrapped = report.bootstrapped.len(),
            failed = report.failed.len(),
            "steady state reached"
        );
        Ok(report)
    }

    /// Names of sessions currently alive on the substrate
    pub async fn live_sessions(&self) -> Vec<String> {
        match self.mux.list_sessions().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "could not list sessions");
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::mock::MockMux;
    use crate::topology::Role;

    fn test_config(tmp: &tempfile::TempDir) -> OrchestratorConfig {
        OrchestratorConfig {
            settle_secs: 0,
            work_dir: Some(tmp.path().to_path_buf()),
            ..OrchestratorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_reaches_steady_state() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(MockMux::new(), test_config(&tmp));

        let report = orchestrator.run().await.unwrap();

        assert!(report.all_succeeded());
        assert_eq!(report.bootstrapped.len(), 5);
        assert_eq!(
            orchestrator.live_sessions().await,
            vec!["agents", "coordinator"]
        );
    }

    #[tokio::test]
    async fn test_unavailable_substrate_aborts_before_touching_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let mux = MockMux::new();
        mux.fail_available();
        let orchestrator = Orchestrator::new(mux, test_config(&tmp));

        let result = orchestrator.run().await;

        assert!(matches!(
            result,
            Err(CoterieError::SubstrateUnavailable(_))
        ));
        assert!(orchestrator.mux.ops().is_empty());
    }

    #[tokio::test]
    async fn test_two_consecutive_runs_leave_no_residue() {
        let tmp = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(MockMux::new(), test_config(&tmp));

        // Simulate a worker finishing between runs
        orchestrator.signals().mark_complete(2).await.unwrap();

        let first = orchestrator.run().await.unwrap();
        assert!(first.all_succeeded());

        orchestrator.signals().mark_complete(1).await.unwrap();

        // The second run must succeed identically: sessions recreated,
        // stale markers no longer observable
        let second = orchestrator.run().await.unwrap();
        assert!(second.all_succeeded());
        assert_eq!(second.bootstrapped.len(), 5);
        assert!(!orchestrator.signals().is_complete(1).await);
        assert!(!orchestrator.signals().is_complete(2).await);
        assert_eq!(
            orchestrator.live_sessions().await,
            vec!["agents", "coordinator"]
        );
    }

    #[tokio::test]
    async fn test_partial_bootstrap_failure_still_reaches_steady_state() {
        let tmp = tempfile::tempdir().unwrap();
        let mux = MockMux::new();
        // Pane targets are minted deterministically; %0 is the supervisor
        mux.fail_send_to("%0");
        let orchestrator = Orchestrator::new(mux, test_config(&tmp));

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.failed, vec![Role::Supervisor]);
        assert_eq!(report.bootstrapped.len(), 4);
    }

    #[tokio::test]
    async fn test_construction_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let mux = MockMux::new();
        mux.fail_create("coordinator");
        let orchestrator = Orchestrator::new(mux, test_config(&tmp));

        assert!(matches!(
            orchestrator.run().await,
            Err(CoterieError::Topology { .. })
        ));
    }
}
