//! Layout builder - materializes sessions and panes from a descriptor
//!
//! Assumes the cleanup stage already ran: sessions are created fresh and a
//! name collision is a construction failure, not something re-checked here.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::CoterieError;
use crate::mux::{Multiplexer, MuxError, SplitDirection};
use crate::topology::{Pane, SessionSpec, Topology, TopologyDescriptor};

/// Builds the pane topology and dresses each pane for its role
pub struct LayoutBuilder<'a, M: Multiplexer> {
    mux: &'a M,
    work_dir: PathBuf,
}

impl<'a, M: Multiplexer> LayoutBuilder<'a, M> {
    /// `work_dir` is the directory every pane is pointed at, so all
    /// agents observe the same filesystem view.
    pub fn new(mux: &'a M, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            mux,
            work_dir: work_dir.into(),
        }
    }

    /// Materialize every session in the descriptor
    ///
    /// Fails with a topology error if a session or split cannot be
    /// created; cosmetic per-pane dressing failures are logged only.
    pub async fn build(&self, descriptor: &TopologyDescriptor) -> Result<Topology, CoterieError> {
        descriptor.validate()?;

        let mut panes = Vec::new();
        for spec in &descriptor.sessions {
            let targets = self.create_panes(spec).await?;
            debug!(session = %spec.name, panes = targets.len(), "session materialized");

            for (index, (role, target)) in spec.roles.iter().zip(targets).enumerate() {
                let pane = Pane {
                    session: spec.name.clone(),
                    index,
                    role: *role,
                    target,
                };
                self.dress_pane(&pane).await;
                panes.push(pane);
            }
        }

        let topology = Topology::from_panes(panes)?;
        info!(panes = topology.len(), "topology built");
        Ok(topology)
    }

    /// Create a session and split it to the declared pane count
    ///
    /// Returned targets are in pane-index order. The 4-pane split is a
    /// fixed sequence yielding a 2x2 arrangement: index 0 top-left,
    /// 1 bottom-left, 2 top-right, 3 bottom-right.
    async fn create_panes(&self, spec: &SessionSpec) -> Result<Vec<String>, CoterieError> {
        let topo_err = |reason: MuxError| CoterieError::Topology {
            session: spec.name.clone(),
            reason: reason.to_string(),
        };

        let first = self
            .mux
            .create_session(&spec.name, &self.work_dir)
            .await
            .map_err(topo_err)?;

        match spec.roles.len() {
            1 => Ok(vec![first]),
            2 => {
                let right = self
                    .mux
                    .split_pane(&first, SplitDirection::Horizontal)
                    .await
                    .map_err(topo_err)?;
                Ok(vec![first, right])
            }
            4 => {
                let right = self
                    .mux
                    .split_pane(&first, SplitDirection::Horizontal)
                    .await
                    .map_err(topo_err)?;
                let bottom_left = self
                    .mux
                    .split_pane(&first, SplitDirection::Vertical)
                    .await
                    .map_err(topo_err)?;
                let bottom_right = self
                    .mux
                    .split_pane(&right, SplitDirection::Vertical)
                    .await
                    .map_err(topo_err)?;
                Ok(vec![first, bottom_left, right, bottom_right])
            }
            n => Err(CoterieError::Topology {
                session: spec.name.clone(),
                reason: format!("unsupported pane count {n}"),
            }),
        }
    }

    /// Label a pane for its role: title, colored prompt, working
    /// directory, clear screen - in that order, independently per pane
    async fn dress_pane(&self, pane: &Pane) {
        let role = pane.role;
        let prompt = format!(
            r"export PS1='\[{}\][{}]\[\e[0m\] $ '",
            role.prompt_color(),
            role
        );

        let steps = [
            self.mux.set_pane_title(&pane.target, &role.to_string()).await,
            self.mux.send_text(&pane.target, &prompt, true).await,
            self.mux
                .set_working_directory(&pane.target, &self.work_dir)
                .await,
            self.mux.send_text(&pane.target, "clear", true).await,
        ];

        for result in steps {
            if let Err(e) = result {
                warn!(pane = %pane.target, role = %role, error = %e, "pane dressing step failed");
            }
        }
    }
}
