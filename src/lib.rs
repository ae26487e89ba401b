//! # Coterie
//!
//! Role-based terminal agent orchestration - the inner circle.
//!
//! Coterie boots a fixed topology of terminal-multiplexer sessions,
//! launches a long-running assistant process in every pane, and binds
//! each pane to a role so the assistants can cooperate on a shared task
//! through role-specific startup instructions and filesystem completion
//! markers.
//!
//! ```text
//! ┌─────────────────────────────┐    ┌───────────────────┐
//! │       "agents" session      │    │   "coordinator"   │
//! │ ┌────────────┬────────────┐ │    │ ┌───────────────┐ │
//! │ │ supervisor │  worker2   │ │    │ │  coordinator  │ │
//! │ ├────────────┼────────────┤ │    │ └───────────────┘ │
//! │ │  worker1   │  worker3   │ │    └───────────────────┘
//! │ └────────────┴────────────┘ │
//! └─────────────────────────────┘
//!         │ instructions in          ▲ marker files out
//!         ▼                          │
//!       panes               coordination/worker<N>_done
//! ```
//!
//! One run is: cleanup (idempotent teardown of prior sessions and stale
//! markers) → layout (deterministic pane construction, role labelling)
//! → bootstrap (launch assistants, stage instructions, settle barrier,
//! collective commit). After that the orchestrator is done; the agents
//! run on their own and workers report by creating marker files.
//!
//! ## Key Concepts
//!
//! - **Role**: the logical identity (coordinator, supervisor, worker-N)
//!   bound to exactly one pane
//! - **Topology**: the concrete set of sessions, panes, and role
//!   assignments for one run, held as an owned value
//! - **Multiplexer**: the gateway interface over the terminal-multiplexing
//!   substrate (tmux in production, an in-memory mock in tests)
//! - **Completion marker**: a presence/absence file a worker creates when
//!   its unit of work is done

pub mod bootstrap;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod layout;
pub mod mux;
pub mod orchestrator;
pub mod signal;
pub mod topology;

pub use bootstrap::{instruction_for, BootstrapReport, RoleBootstrapper};
pub use cleanup::CleanupStage;
pub use config::OrchestratorConfig;
pub use error::CoterieError;
pub use layout::LayoutBuilder;
pub use mux::{Multiplexer, MuxError, SplitDirection, TmuxGateway};
pub use orchestrator::Orchestrator;
pub use signal::CompletionSignals;
pub use topology::{Pane, Role, SessionSpec, Topology, TopologyDescriptor};
