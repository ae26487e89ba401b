//! Topology description - sessions, panes, and the roles bound to them

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoterieError;

/// The logical identity bound to exactly one pane
///
/// The ordering is the fixed order used whenever panes are visited
/// collectively (bootstrap commits, status output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Collects worker results and assembles the final answer
    Coordinator,
    /// Splits the task into units and reviews worker output
    Supervisor,
    /// One of N parallel workers, identified by index
    Worker(u32),
}

impl Role {
    /// ANSI color used in the pane's shell prompt
    ///
    /// Coordinator and supervisor get colors distinct from the shared
    /// worker color so the management panes stand out at a glance.
    pub fn prompt_color(&self) -> &'static str {
        match self {
            Role::Coordinator => r"\e[1;35m",
            Role::Supervisor => r"\e[1;33m",
            Role::Worker(_) => r"\e[1;36m",
        }
    }

    /// Worker index, if this is a worker role
    pub fn worker_id(&self) -> Option<u32> {
        match self {
            Role::Worker(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => write!(f, "coordinator"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::Worker(n) => write!(f, "worker{n}"),
        }
    }
}

/// One session in the topology: a name and the role at each pane index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSpec {
    /// Session name, unique process-wide
    pub name: String,
    /// Roles in pane-index order
    pub roles: Vec<Role>,
}

/// Static definition of sessions, panes, and role assignments
///
/// Read-only at run time; never derived from runtime state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    /// Sessions to build, in creation order
    pub sessions: Vec<SessionSpec>,
}

impl TopologyDescriptor {
    /// The standard topology: one 4-pane agents session and a
    /// single-pane coordinator session
    pub fn standard() -> Self {
        Self {
            sessions: vec![
                SessionSpec {
                    name: "agents".into(),
                    roles: vec![
                        Role::Supervisor,
                        Role::Worker(1),
                        Role::Worker(2),
                        Role::Worker(3),
                    ],
                },
                SessionSpec {
                    name: "coordinator".into(),
                    roles: vec![Role::Coordinator],
                },
            ],
        }
    }

    /// Names of every session in the descriptor
    pub fn session_names(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.name.clone()).collect()
    }

    /// All declared roles, in descriptor order
    pub fn roles(&self) -> Vec<Role> {
        self.sessions.iter().flat_map(|s| s.roles.clone()).collect()
    }

    /// Worker indices declared in the topology, ascending
    pub fn worker_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .roles()
            .into_iter()
            .filter_map(|r| r.worker_id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Check structural invariants: unique session names, unique roles,
    /// no empty sessions
    pub fn validate(&self) -> Result<(), CoterieError> {
        let mut names = HashSet::new();
        let mut roles = HashSet::new();

        for spec in &self.sessions {
            if !names.insert(spec.name.as_str()) {
                return Err(CoterieError::Config(format!(
                    "duplicate session name '{}'",
                    spec.name
                )));
            }
            if spec.roles.is_empty() {
                return Err(CoterieError::Config(format!(
                    "session '{}' declares no panes",
                    spec.name
                )));
            }
            for role in &spec.roles {
                if !roles.insert(*role) {
                    return Err(CoterieError::Config(format!(
                        "role '{role}' assigned more than once"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for TopologyDescriptor {
    fn default() -> Self {
        Self::standard()
    }
}

/// A single pane materialized by the layout builder
///
/// The target is the substrate-stable pane address captured at creation;
/// index and role never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    /// Owning session name
    pub session: String,
    /// Index within the session, assigned at creation
    pub index: usize,
    /// Role bound to this pane
    pub role: Role,
    /// Substrate address used for all gateway operations
    pub target: String,
}

/// The built topology: an owned role→pane map for one orchestration run
///
/// This value, not the substrate's session-name registry, is the record of
/// what a run owns. Iteration follows the fixed role order.
#[derive(Debug, Default)]
pub struct Topology {
    panes: BTreeMap<Role, Pane>,
}

impl Topology {
    /// Build from materialized panes, enforcing the role↔pane bijection
    pub fn from_panes(panes: Vec<Pane>) -> Result<Self, CoterieError> {
        let mut map = BTreeMap::new();
        for pane in panes {
            let role = pane.role;
            if map.insert(role, pane).is_some() {
                return Err(CoterieError::Config(format!(
                    "role '{role}' mapped to more than one pane"
                )));
            }
        }
        Ok(Self { panes: map })
    }

    /// Pane bound to a role
    pub fn pane(&self, role: Role) -> Option<&Pane> {
        self.panes.get(&role)
    }

    /// Iterate panes in fixed role order
    pub fn iter(&self) -> impl Iterator<Item = (&Role, &Pane)> {
        self.panes.iter()
    }

    /// All roles present, in fixed order
    pub fn roles(&self) -> Vec<Role> {
        self.panes.keys().copied().collect()
    }

    /// Number of panes
    pub fn len(&self) -> usize {
        self.panes.len()
    }

    /// Check if the topology holds no panes
    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pane(role: Role, session: &str, index: usize) -> Pane {
        Pane {
            session: session.into(),
            index,
            role,
            target: format!("%{index}"),
        }
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Coordinator.to_string(), "coordinator");
        assert_eq!(Role::Supervisor.to_string(), "supervisor");
        assert_eq!(Role::Worker(3).to_string(), "worker3");
    }

    #[test]
    fn test_role_order() {
        let mut roles = vec![
            Role::Worker(2),
            Role::Coordinator,
            Role::Worker(1),
            Role::Supervisor,
        ];
        roles.sort();
        assert_eq!(
            roles,
            vec![
                Role::Coordinator,
                Role::Supervisor,
                Role::Worker(1),
                Role::Worker(2),
            ]
        );
    }

    #[test]
    fn test_management_colors_distinct_from_workers() {
        let worker = Role::Worker(1).prompt_color();
        assert_ne!(Role::Coordinator.prompt_color(), worker);
        assert_ne!(Role::Supervisor.prompt_color(), worker);
        assert_eq!(Role::Worker(2).prompt_color(), worker);
    }

    #[test]
    fn test_standard_topology() {
        let descriptor = TopologyDescriptor::standard();
        assert!(descriptor.validate().is_ok());
        assert_eq!(descriptor.session_names(), vec!["agents", "coordinator"]);
        assert_eq!(descriptor.roles().len(), 5);
        assert_eq!(descriptor.worker_ids(), vec![1, 2, 3]);
        assert_eq!(descriptor.sessions[0].roles[0], Role::Supervisor);
    }

    #[test]
    fn test_validate_duplicate_session() {
        let descriptor = TopologyDescriptor {
            sessions: vec![
                SessionSpec {
                    name: "agents".into(),
                    roles: vec![Role::Worker(1)],
                },
                SessionSpec {
                    name: "agents".into(),
                    roles: vec![Role::Worker(2)],
                },
            ],
        };
        assert!(matches!(
            descriptor.validate(),
            Err(CoterieError::Config(_))
        ));
    }

    #[test]
    fn test_validate_duplicate_role() {
        let descriptor = TopologyDescriptor {
            sessions: vec![SessionSpec {
                name: "agents".into(),
                roles: vec![Role::Worker(1), Role::Worker(1)],
            }],
        };
        assert!(matches!(
            descriptor.validate(),
            Err(CoterieError::Config(_))
        ));
    }

    #[test]
    fn test_validate_empty_session() {
        let descriptor = TopologyDescriptor {
            sessions: vec![SessionSpec {
                name: "agents".into(),
                roles: vec![],
            }],
        };
        assert!(matches!(
            descriptor.validate(),
            Err(CoterieError::Config(_))
        ));
    }

    #[test]
    fn test_topology_bijection() {
        let topology = Topology::from_panes(vec![
            pane(Role::Supervisor, "agents", 0),
            pane(Role::Worker(1), "agents", 1),
        ])
        .unwrap();

        assert_eq!(topology.len(), 2);
        assert_eq!(topology.pane(Role::Supervisor).unwrap().index, 0);
        assert!(topology.pane(Role::Coordinator).is_none());
    }

    #[test]
    fn test_topology_rejects_duplicate_role() {
        let result = Topology::from_panes(vec![
            pane(Role::Worker(1), "agents", 0),
            pane(Role::Worker(1), "agents", 1),
        ]);
        assert!(matches!(result, Err(CoterieError::Config(_))));
    }

    #[test]
    fn test_topology_iterates_in_role_order() {
        let topology = Topology::from_panes(vec![
            pane(Role::Worker(2), "agents", 2),
            pane(Role::Coordinator, "coordinator", 0),
            pane(Role::Worker(1), "agents", 1),
            pane(Role::Supervisor, "agents", 0),
        ])
        .unwrap();

        let roles = topology.roles();
        assert_eq!(
            roles,
            vec![
                Role::Coordinator,
                Role::Supervisor,
                Role::Worker(1),
                Role::Worker(2),
            ]
        );
    }
}
