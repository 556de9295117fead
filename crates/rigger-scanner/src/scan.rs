//! Main scanner implementation

use crate::collision::resolve;
use crate::error::{ScanError, ScanResult, ScanWarning};
use crate::inventory::{Inventory, ManagedScope, ProjectScope, ScopeArtifacts, UserScope};
use crate::plugins::PluginInventory;
use crate::roots::ScanRoots;
use crate::scope::{managed, project, user};
use crate::types::HostInfo;
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;

/// The main scanner struct.
///
/// Scanning is read-only and keeps no state between calls: every scan
/// builds a fresh [`Inventory`].
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Filesystem roots to read from
    pub roots: ScanRoots,
    /// Whether to include managed scope
    pub include_managed: bool,
}

impl Scanner {
    /// Create a new scanner
    #[must_use]
    pub fn new(roots: ScanRoots) -> Self {
        Self {
            roots,
            include_managed: true,
        }
    }

    /// Enable or disable scanning managed scope
    #[must_use]
    pub fn with_managed(mut self, include: bool) -> Self {
        self.include_managed = include;
        self
    }

    /// Scan one project together with the user, managed, and plugin scopes
    ///
    /// # Errors
    /// Returns an error if the project path does not exist or is not a directory
    pub fn scan(&self, project_path: &Path) -> ScanResult<Inventory> {
        let project_path = project_path.canonicalize().map_err(|e| {
            ScanError::InvalidPath(format!("{}: {e}", project_path.display()))
        })?;
        let mut warnings = Vec::new();
        let project = project::scan_project(&project_path, &self.roots, &mut warnings)?;
        Ok(self.build(Some(project), warnings))
    }

    /// Scan several projects in parallel, one inventory per project, in input order
    pub fn scan_many(&self, project_paths: &[&Path]) -> Vec<ScanResult<Inventory>> {
        project_paths.par_iter().map(|path| self.scan(path)).collect()
    }

    /// Scan user, managed, and user-visible plugin scopes only
    pub fn scan_user_scope(&self) -> Inventory {
        self.build(None, Vec::new())
    }

    fn build(&self, project: Option<ProjectScope>, mut warnings: Vec<ScanWarning>) -> Inventory {
        let user_scope = user::scan_user_scope(&self.roots, &mut warnings);
        let managed_scope = if self.include_managed {
            managed::scan_managed_scope(&self.roots, &mut warnings)
        } else {
            None
        };

        let enabled = enabled_plugins(&user_scope, project.as_ref());
        let plugins = PluginInventory::scan(
            &self.roots,
            project.as_ref().map(|p| p.path.as_path()),
            &enabled,
            &mut warnings,
        );

        let mut scopes: Vec<&ScopeArtifacts> = vec![&user_scope.artifacts];
        if let Some(ManagedScope { artifacts, .. }) = &managed_scope {
            scopes.push(artifacts);
        }
        if let Some(project) = &project {
            scopes.push(&project.artifacts);
            scopes.push(&project.local);
        }
        scopes.extend(plugins.artifacts());
        let (effective, collisions) = resolve(&scopes);

        if collisions.has_collisions() {
            tracing::debug!(count = collisions.total_count(), "name collisions detected");
        }

        Inventory {
            host: HostInfo::for_home(self.roots.home.clone()),
            user_scope,
            managed_scope,
            project,
            plugins,
            effective,
            collisions,
            warnings,
            scanned_at: Utc::now(),
        }
    }
}

/// `enabledPlugins` merged from user, project, then local settings
fn enabled_plugins(user: &UserScope, project: Option<&ProjectScope>) -> BTreeMap<String, bool> {
    let mut enabled = BTreeMap::new();
    let files = std::iter::once(user.settings.as_ref()).chain(
        project
            .into_iter()
            .flat_map(|p| [p.settings.shared.as_ref(), p.settings.local.as_ref()]),
    );
    for settings in files.flatten() {
        enabled.extend(settings.enabled_plugins.iter().map(|(k, v)| (k.clone(), *v)));
    }
    enabled
}
