//! Collision detection and precedence resolution
//!
//! Entities of one kind are grouped by name. A group with a single member is
//! effective as-is; a larger group is a collision whose winner is the member
//! with the highest scope precedence. Plugin ties go to the lexically first
//! plugin id, any other same-scope tie to the first path.

use crate::artifacts::ScopedEntity;
use crate::inventory::ScopeArtifacts;
use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Effective (winning) artifacts across every scope.
///
/// Hook rules are additive in the host tool, so every rule stays effective.
pub type EffectiveView = ScopeArtifacts;

/// Report of detected collisions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    /// Skill name collisions
    #[serde(default)]
    pub skills: Vec<Collision>,
    /// Command name collisions
    #[serde(default)]
    pub commands: Vec<Collision>,
    /// Agent name collisions
    #[serde(default)]
    pub agents: Vec<Collision>,
    /// MCP server name collisions
    #[serde(default)]
    pub mcp_servers: Vec<Collision>,
}

/// A single collision (same name in multiple places)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    /// The colliding name
    pub name: String,
    /// Scope of the winner (highest precedence)
    pub winner_scope: Scope,
    /// Path of the winning definition
    pub winner_path: PathBuf,
    /// All occurrences, winner first
    pub occurrences: Vec<CollisionOccurrence>,
}

/// A single occurrence of a colliding name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionOccurrence {
    /// Scope where found
    pub scope: Scope,
    /// Path to the artifact
    pub path: PathBuf,
}

impl CollisionReport {
    /// Check if there are any collisions
    #[must_use]
    pub fn has_collisions(&self) -> bool {
        self.total_count() > 0
    }

    /// Get total number of collisions
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.skills.len() + self.commands.len() + self.agents.len() + self.mcp_servers.len()
    }
}

/// Ordering that puts the winning definition first
fn winner_order<T: ScopedEntity>(a: &T, b: &T) -> Ordering {
    b.scope()
        .precedence()
        .cmp(&a.scope().precedence())
        .then_with(|| a.scope().plugin_id().cmp(&b.scope().plugin_id()))
        .then_with(|| a.path().cmp(b.path()))
}

/// Resolve one entity kind into its effective members and collisions
fn resolve_kind<T: ScopedEntity + Clone>(items: Vec<&T>) -> (Vec<T>, Vec<Collision>) {
    let mut groups: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
    for item in items {
        groups.entry(item.name()).or_default().push(item);
    }

    let mut effective = Vec::with_capacity(groups.len());
    let mut collisions = Vec::new();
    for (name, mut group) in groups {
        group.sort_by(|a, b| winner_order(*a, *b));
        let winner = group[0];
        if group.len() > 1 {
            collisions.push(Collision {
                name: name.to_string(),
                winner_scope: winner.scope().clone(),
                winner_path: winner.path().to_path_buf(),
                occurrences: group
                    .iter()
                    .map(|e| CollisionOccurrence {
                        scope: e.scope().clone(),
                        path: e.path().to_path_buf(),
                    })
                    .collect(),
            });
        }
        effective.push(winner.clone());
    }
    (effective, collisions)
}

/// Resolve every scope's artifacts into the effective view and a collision report
#[must_use]
pub fn resolve(scopes: &[&ScopeArtifacts]) -> (EffectiveView, CollisionReport) {
    let (skills, skill_collisions) =
        resolve_kind(scopes.iter().flat_map(|s| s.skills.iter()).collect());
    let (commands, command_collisions) =
        resolve_kind(scopes.iter().flat_map(|s| s.commands.iter()).collect());
    let (agents, agent_collisions) =
        resolve_kind(scopes.iter().flat_map(|s| s.agents.iter()).collect());
    let (mcp_servers, mcp_collisions) =
        resolve_kind(scopes.iter().flat_map(|s| s.mcp_servers.iter()).collect());

    let mut hooks: Vec<_> = scopes.iter().flat_map(|s| s.hooks.iter().cloned()).collect();
    hooks.sort_by(winner_order);

    let effective = ScopeArtifacts {
        skills,
        commands,
        agents,
        hooks,
        mcp_servers,
    };
    let report = CollisionReport {
        skills: skill_collisions,
        commands: command_collisions,
        agents: agent_collisions,
        mcp_servers: mcp_collisions,
    };
    (effective, report)
}
