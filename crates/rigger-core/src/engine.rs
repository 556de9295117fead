//! Async entry point tying scanning, profiles, diff, apply and rollback together
//!
//! [`Engine`] is cheap to clone and safe to share between tasks. Every
//! operation runs its blocking filesystem and SQLite work on the blocking
//! thread pool. Work that touches a project holds that project's lock, and
//! the database mutex is only ever taken after any project lock.

use crate::apply::{self, ApplyMode, ApplyOutcome};
use crate::backup::{self, write_record, BackupRecord};
use crate::config::EngineConfig;
use crate::diff::{generate_plan, DiffPlan, ManagedState, PlanInput};
use crate::error::{EngineError, EngineResult};
use crate::locks::{lock_all, ProjectLocks};
use crate::plugins::{ClaudeCliInstaller, PluginInstaller};
use crate::profile::{
    snapshot, sync, ConvertResult, PluginRef, Profile, ToolRef, ToolStore, ToolType, UpdateResult,
};
use crate::project::{EffectiveTool, Project};
use crate::storage::{BackupStore, Database, ProfileStore, ProfileSummary, ProjectStore};
use crate::util::validate_name;
use chrono::Utc;
use rigger_scanner::{Inventory, ScanResult, Scanner};
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// A project with its profile and effective tool set
#[derive(Debug, Clone, Serialize)]
pub struct ProjectTools {
    pub project: Project,
    pub profile: Option<Profile>,
    pub effective: Vec<EffectiveTool>,
}

/// Result of assigning a profile to a project
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    pub project_id: Uuid,
    pub profile_id: Uuid,
    /// Plugins installed during assignment
    pub plugins_installed: usize,
    /// Plugins that failed to install
    pub plugin_errors: Vec<PluginError>,
    /// Local overrides that shadow a tool of the profile
    pub override_collisions: Vec<ToolRef>,
}

/// A plugin that could not be installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginError {
    pub plugin: String,
    pub message: String,
}

/// The profile engine
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    db: Mutex<Database>,
    config: EngineConfig,
    locks: ProjectLocks,
    installer: Box<dyn PluginInstaller>,
}

/// Everything a plan was computed from, kept for the apply that follows
struct Planned {
    plan: DiffPlan,
    profile: Profile,
    project: Option<Project>,
    previous: ManagedState,
}

impl Engine {
    /// Open the engine on its data directory
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        let db = Database::open(&config.db_path())?;
        Ok(Self::with_installer(config, db, Box::new(ClaudeCliInstaller::new())))
    }

    /// Engine over an explicit database and plugin installer
    #[must_use]
    pub fn with_installer(
        config: EngineConfig,
        db: Database,
        installer: Box<dyn PluginInstaller>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                db: Mutex::new(db),
                config,
                locks: ProjectLocks::new(),
                installer,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    async fn run<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Inner) -> EngineResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| EngineError::Task(e.to_string()))?
    }

    // Scanning

    /// Scan a project with every scope visible to it
    pub async fn scan(&self, project_path: impl Into<PathBuf>) -> EngineResult<Inventory> {
        let path = project_path.into();
        self.run(move |inner| Ok(inner.scanner().scan(&path)?)).await
    }

    /// Scan user, managed and plugin scopes without a project
    pub async fn scan_user(&self) -> EngineResult<Inventory> {
        self.run(|inner| Ok(inner.scanner().scan_user_scope())).await
    }

    /// Scan several projects in parallel; results are in input order
    pub async fn scan_many(&self, paths: Vec<PathBuf>) -> EngineResult<Vec<ScanResult<Inventory>>> {
        self.run(move |inner| {
            let refs: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
            Ok(inner.scanner().scan_many(&refs))
        })
        .await
    }

    // Profiles

    /// Create a profile, optionally capturing the project-scope tools of `source`
    pub async fn create_profile(
        &self,
        name: String,
        source: Option<PathBuf>,
        description: Option<String>,
    ) -> EngineResult<Profile> {
        self.run(move |inner| inner.create_profile(name, source.as_deref(), description))
            .await
    }

    pub async fn get_profile(&self, id: Uuid) -> EngineResult<Profile> {
        self.run(move |inner| inner.with_db(|conn| require_profile(conn, id)))
            .await
    }

    pub async fn list_profiles(&self) -> EngineResult<Vec<ProfileSummary>> {
        self.run(|inner| inner.with_db(|conn| Ok(ProfileStore::new(conn).list()?)))
            .await
    }

    /// Replace a profile's tool and/or plugin references
    pub async fn update_profile(
        &self,
        id: Uuid,
        tool_refs: Option<Vec<ToolRef>>,
        plugin_refs: Option<Vec<PluginRef>>,
    ) -> EngineResult<UpdateResult> {
        self.run(move |inner| {
            inner.update_profile(id, |profile| {
                if let Some(tools) = tool_refs {
                    profile.tool_refs = tools;
                }
                if let Some(plugins) = plugin_refs {
                    profile.plugin_refs = plugins;
                }
                Ok(())
            })
        })
        .await
    }

    /// Delete a profile, turning its tools into local overrides of every
    /// project it was assigned to
    pub async fn delete_profile(&self, id: Uuid) -> EngineResult<ConvertResult> {
        self.run(move |inner| inner.delete_profile(id)).await
    }

    /// Copy tools of one kind from `source` into a profile
    pub async fn import_tool(
        &self,
        profile_id: Uuid,
        tool_type: ToolType,
        source: PathBuf,
    ) -> EngineResult<UpdateResult> {
        self.run(move |inner| {
            let store = inner.profile_store(profile_id);
            inner.update_profile(profile_id, |profile| {
                for tool in snapshot::import_from_path(tool_type, &source, &store)? {
                    profile.upsert_tool(tool);
                }
                Ok(())
            })
        })
        .await
    }

    // Projects

    /// Register a project directory, returning the existing entry if known
    pub async fn register_project(&self, path: impl Into<PathBuf>) -> EngineResult<Project> {
        let path = path.into();
        self.run(move |inner| {
            let path = canonical_project(&path)?;
            inner.with_db(|conn| register(conn, &path))
        })
        .await
    }

    pub async fn get_project(&self, id: Uuid) -> EngineResult<Project> {
        self.run(move |inner| inner.with_db(|conn| require_project(conn, id)))
            .await
    }

    pub async fn list_projects(&self) -> EngineResult<Vec<Project>> {
        self.run(|inner| inner.with_db(|conn| Ok(ProjectStore::new(conn).list()?)))
            .await
    }

    /// A project's profile and effective tools
    pub async fn list_for_project(&self, project_id: Uuid) -> EngineResult<ProjectTools> {
        self.run(move |inner| {
            inner.with_db(|conn| {
                let project = require_project(conn, project_id)?;
                let profile = match project.assigned_profile_id {
                    Some(id) => ProfileStore::new(conn).get(id)?,
                    None => None,
                };
                let effective = sync::effective_tools(profile.as_ref(), &project);
                Ok(ProjectTools {
                    project,
                    profile,
                    effective,
                })
            })
        })
        .await
    }

    /// Assign a profile to a project and install its plugins
    pub async fn assign_profile(
        &self,
        project_id: Uuid,
        profile_id: Uuid,
    ) -> EngineResult<AssignmentResult> {
        self.run(move |inner| inner.assign_profile(project_id, profile_id))
            .await
    }

    /// Clear a project's profile assignment
    pub async fn unassign_profile(&self, project_id: Uuid) -> EngineResult<Project> {
        self.run(move |inner| {
            inner.with_project(project_id, |conn, project| {
                project.assigned_profile_id = None;
                sync::refresh_project(project, None);
                ProjectStore::new(conn).update(project)?;
                tracing::info!(project = %project.name, "unassigned profile");
                Ok(())
            })
        })
        .await
    }

    /// Copy tools of one kind from `source` into a project's local overrides
    pub async fn add_local_override(
        &self,
        project_id: Uuid,
        tool_type: ToolType,
        source: PathBuf,
    ) -> EngineResult<Project> {
        self.run(move |inner| {
            let store = inner.project_store(project_id);
            inner.with_project(project_id, |conn, project| {
                for tool in snapshot::import_from_path(tool_type, &source, &store)? {
                    project.local_overrides.push(tool);
                }
                refresh_with_profile(conn, project)?;
                ProjectStore::new(conn).update(project)?;
                Ok(())
            })
        })
        .await
    }

    /// Drop a local override and its stored content
    pub async fn remove_local_override(
        &self,
        project_id: Uuid,
        tool_type: ToolType,
        name: String,
    ) -> EngineResult<Project> {
        self.run(move |inner| {
            let store = inner.project_store(project_id);
            inner.with_project(project_id, |conn, project| {
                if project.local_overrides.remove(tool_type, &name).is_none() {
                    return Err(EngineError::not_found("local override", format!("{tool_type} {name}")));
                }
                refresh_with_profile(conn, project)?;
                ProjectStore::new(conn).update(project)?;
                store.remove(tool_type, &name)?;
                Ok(())
            })
        })
        .await
    }

    // Diff, apply and rollback

    /// Compute what applying a profile to a project would change
    pub async fn preview_apply(
        &self,
        profile_id: Uuid,
        project_path: impl Into<PathBuf>,
    ) -> EngineResult<DiffPlan> {
        let path = project_path.into();
        self.run(move |inner| {
            let root = canonical_project(&path)?;
            Ok(inner.plan(profile_id, &root)?.plan)
        })
        .await
    }

    /// Apply a profile to a project, backing up everything it touches
    pub async fn apply(
        &self,
        profile_id: Uuid,
        project_path: impl Into<PathBuf>,
        mode: ApplyMode,
    ) -> EngineResult<ApplyOutcome> {
        let path = project_path.into();
        self.run(move |inner| inner.apply(profile_id, &path, mode)).await
    }

    /// Backups of a project, newest first
    pub async fn list_backups(&self, project_id: Uuid) -> EngineResult<Vec<BackupRecord>> {
        self.run(move |inner| {
            inner.with_db(|conn| {
                require_project(conn, project_id)?;
                Ok(BackupStore::new(conn).list_for_project(project_id)?)
            })
        })
        .await
    }

    /// Undo the apply that made a backup; returns the number of files changed
    pub async fn rollback(
        &self,
        backup_id: Uuid,
        project_path: impl Into<PathBuf>,
    ) -> EngineResult<usize> {
        let path = project_path.into();
        self.run(move |inner| inner.rollback(backup_id, &path)).await
    }
}

impl Inner {
    fn scanner(&self) -> Scanner {
        Scanner::new(self.config.roots.clone()).with_managed(self.config.include_managed)
    }

    fn profile_store(&self, id: Uuid) -> ToolStore {
        ToolStore::new(self.config.profile_store_dir(id))
    }

    fn project_store(&self, id: Uuid) -> ToolStore {
        ToolStore::new(self.config.project_store_dir(id))
    }

    fn with_db<T>(&self, f: impl FnOnce(&Connection) -> EngineResult<T>) -> EngineResult<T> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        f(db.connection())
    }

    /// Run `f` on a project while holding its lock
    fn with_project(
        &self,
        project_id: Uuid,
        f: impl FnOnce(&Connection, &mut Project) -> EngineResult<()>,
    ) -> EngineResult<Project> {
        let path = self.with_db(|conn| require_project(conn, project_id))?.path;
        let handle = self.locks.handle(&path);
        let _guard = handle.lock();

        self.with_db(|conn| {
            let mut project = require_project(conn, project_id)?;
            f(conn, &mut project)?;
            Ok(project)
        })
    }

    /// Run `f` while holding the locks of every project assigned to a profile
    fn with_assigned<T>(&self, profile_id: Uuid, f: impl FnOnce() -> EngineResult<T>) -> EngineResult<T> {
        loop {
            let paths = self.assigned_paths(profile_id)?;
            let handles = self.locks.handles(paths.iter().map(PathBuf::as_path));
            let _guards = lock_all(&handles);

            // An assignment may have changed before the locks were taken
            if self.assigned_paths(profile_id)? == paths {
                return f();
            }
        }
    }

    fn assigned_paths(&self, profile_id: Uuid) -> EngineResult<Vec<PathBuf>> {
        self.with_db(|conn| {
            let mut paths: Vec<PathBuf> = ProjectStore::new(conn)
                .list_by_profile(profile_id)?
                .into_iter()
                .map(|p| p.path)
                .collect();
            paths.sort();
            Ok(paths)
        })
    }

    fn create_profile(
        &self,
        name: String,
        source: Option<&Path>,
        description: Option<String>,
    ) -> EngineResult<Profile> {
        validate_name(&name)?;
        let exists = |conn: &Connection| -> EngineResult<()> {
            if ProfileStore::new(conn).get_by_name(&name)?.is_some() {
                return Err(EngineError::AlreadyExists {
                    entity: "profile",
                    name: name.clone(),
                });
            }
            Ok(())
        };
        self.with_db(&exists)?;

        let mut profile = Profile::new(name.clone()).with_description(description);
        let store = self.profile_store(profile.id);
        if let Some(source) = source {
            let inventory = self.scanner().scan(source)?;
            profile.tool_refs = snapshot::snapshot_project(&inventory, &store)?;
        }

        let created = self.with_db(|conn| {
            exists(conn)?;
            ProfileStore::new(conn).create(&profile)?;
            Ok(())
        });
        if let Err(e) = created {
            if let Err(cleanup) = store.destroy() {
                tracing::warn!(error = %cleanup, "failed to remove tool store of unsaved profile");
            }
            return Err(e);
        }

        tracing::info!(profile = %profile.name, tools = profile.tool_refs.len(), "created profile");
        Ok(profile)
    }

    fn update_profile(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut Profile) -> EngineResult<()>,
    ) -> EngineResult<UpdateResult> {
        self.with_assigned(id, || {
            let mut profile = self.with_db(|conn| require_profile(conn, id))?;
            let before = profile.tool_refs.clone();
            change(&mut profile)?;
            for tool in &profile.tool_refs {
                validate_name(&tool.name)?;
            }
            profile.updated_at = Utc::now();

            let affected = self.with_db(|conn| Ok(sync::update_profile(conn, &profile)?))?;

            // Content of tools the profile no longer references
            let store = self.profile_store(id);
            for old in &before {
                if profile.tool(old.tool_type, &old.name).is_none() {
                    store.remove(old.tool_type, &old.name)?;
                }
            }

            tracing::info!(profile = %profile.name, affected, "updated profile");
            Ok(UpdateResult {
                profile,
                affected_project_count: affected,
            })
        })
    }

    fn delete_profile(&self, id: Uuid) -> EngineResult<ConvertResult> {
        self.with_assigned(id, || {
            let (profile, projects) = self.with_db(|conn| {
                let profile = require_profile(conn, id)?;
                let projects = ProjectStore::new(conn).list_by_profile(id)?;
                Ok((profile, projects))
            })?;

            let store = self.profile_store(id);
            for project in &projects {
                sync::copy_profile_content(&profile, &store, project, &self.project_store(project.id))?;
            }

            let result = self.with_db(|conn| Ok(sync::convert_and_delete(conn, &profile)?))?;
            store.destroy()?;

            tracing::info!(
                profile = %profile.name,
                converted = result.converted_project_count,
                "deleted profile"
            );
            Ok(result)
        })
    }

    fn assign_profile(&self, project_id: Uuid, profile_id: Uuid) -> EngineResult<AssignmentResult> {
        // Both must exist before anything changes
        let profile = self.with_db(|conn| {
            require_project(conn, project_id)?;
            require_profile(conn, profile_id)
        })?;

        let project = self.with_project(project_id, |conn, project| {
            let profile = require_profile(conn, profile_id)?;
            project.assigned_profile_id = Some(profile.id);
            sync::refresh_project(project, Some(&profile));
            ProjectStore::new(conn).update(project)?;
            Ok(())
        })?;

        let override_collisions = sync::override_collisions(&profile, &project);
        let (plugins_installed, plugin_errors) = self.install_plugins(&profile, &project.path);

        tracing::info!(
            project = %project.name,
            profile = %profile.name,
            plugins_installed,
            plugin_errors = plugin_errors.len(),
            "assigned profile"
        );
        Ok(AssignmentResult {
            project_id,
            profile_id,
            plugins_installed,
            plugin_errors,
            override_collisions,
        })
    }

    fn install_plugins(&self, profile: &Profile, project_path: &Path) -> (usize, Vec<PluginError>) {
        let wanted: Vec<&PluginRef> = profile.plugin_refs.iter().filter(|p| p.enabled).collect();
        if wanted.is_empty() {
            return (0, Vec::new());
        }

        let inventory = match self.scanner().scan(project_path) {
            Ok(inventory) => Some(inventory),
            Err(e) => {
                tracing::warn!(error = %e, "could not scan project for installed plugins");
                None
            }
        };

        let mut installed = 0;
        let mut errors = Vec::new();
        for plugin in wanted {
            let key = plugin.key();
            if inventory.as_ref().is_some_and(|inv| inv.has_plugin(&key)) {
                continue;
            }
            match self.installer.install(project_path, plugin) {
                Ok(()) => installed += 1,
                Err(message) => errors.push(PluginError {
                    plugin: key,
                    message,
                }),
            }
        }
        (installed, errors)
    }

    fn plan(&self, profile_id: Uuid, root: &Path) -> EngineResult<Planned> {
        let (profile, project, previous, history) = self.with_db(|conn| {
            let profile = require_profile(conn, profile_id)?;
            let project = ProjectStore::new(conn).get_by_path(root)?;
            let backups = BackupStore::new(conn);
            let (previous, history) = match &project {
                Some(project) => (
                    backups.latest_for(project.id, Some(profile_id))?,
                    backups.list_for_project(project.id)?,
                ),
                None => (None, Vec::new()),
            };
            Ok((profile, project, previous, history))
        })?;

        let inventory = self.scanner().scan(root)?;
        let local_store = project.as_ref().map(|p| self.project_store(p.id));
        let local = project
            .as_ref()
            .zip(local_store.as_ref())
            .map(|(p, store)| (&p.local_overrides, store));

        let plan = generate_plan(&PlanInput {
            project_root: root,
            profile: &profile,
            profile_store: &self.profile_store(profile_id),
            local,
            previous: previous.as_ref(),
            history: &history,
            inventory: Some(&inventory),
        })?;

        Ok(Planned {
            plan,
            profile,
            project,
            previous: previous.map(|record| record.managed).unwrap_or_default(),
        })
    }

    fn apply(&self, profile_id: Uuid, path: &Path, mode: ApplyMode) -> EngineResult<ApplyOutcome> {
        let root = canonical_project(path)?;
        let handle = self.locks.handle(&root);
        let _guard = handle.lock();

        let Planned {
            plan,
            profile,
            project,
            previous,
        } = self.plan(profile_id, &root)?;

        let project = match project {
            Some(project) => project,
            None => self.with_db(|conn| register(conn, &root))?,
        };

        let mut record = BackupRecord::new(project.id, Some(profile.id), self.config.backups_dir())
            .with_description(format!("Apply profile '{}'", profile.name));
        let (applied, errors) = apply::execute(&plan, &root, &mut record, &previous);

        if mode == ApplyMode::AllOrNothing && !errors.is_empty() {
            backup::restore(&record, &root)?;
            if let Err(e) = fs::remove_dir_all(&record.backup_dir) {
                tracing::debug!(error = %e, "no backup directory to discard");
            }
            tracing::warn!(
                project = %project.name,
                failed = errors.len(),
                "apply aborted and rolled back"
            );
            return Err(EngineError::ApplyAborted { errors });
        }

        write_record(&record)?;
        self.with_db(|conn| Ok(BackupStore::new(conn).create(&record)?))?;

        tracing::info!(
            project = %project.name,
            profile = %profile.name,
            applied,
            failed = errors.len(),
            backup = %record.id,
            "applied profile"
        );
        Ok(ApplyOutcome {
            backup: record,
            applied,
            errors,
        })
    }

    fn rollback(&self, backup_id: Uuid, path: &Path) -> EngineResult<usize> {
        let root = canonical_project(path)?;
        let handle = self.locks.handle(&root);
        let _guard = handle.lock();

        let record = self.with_db(|conn| {
            let record = BackupStore::new(conn)
                .get(backup_id)?
                .ok_or_else(|| EngineError::not_found("backup", backup_id))?;
            let project = ProjectStore::new(conn).get_by_path(&root)?;
            if project.map(|p| p.id) != Some(record.project_id) {
                return Err(EngineError::InvalidInput(format!(
                    "backup {backup_id} does not belong to {}",
                    root.display()
                )));
            }
            Ok(record)
        })?;

        let restored = backup::restore(&record, &root)?;
        self.with_db(|conn| {
            BackupStore::new(conn).mark_rolled_back(record.id, Utc::now())?;
            Ok(())
        })?;
        Ok(restored)
    }
}

fn require_profile(conn: &Connection, id: Uuid) -> EngineResult<Profile> {
    ProfileStore::new(conn)
        .get(id)?
        .ok_or_else(|| EngineError::not_found("profile", id))
}

fn require_project(conn: &Connection, id: Uuid) -> EngineResult<Project> {
    ProjectStore::new(conn)
        .get(id)?
        .ok_or_else(|| EngineError::not_found("project", id))
}

fn refresh_with_profile(conn: &Connection, project: &mut Project) -> EngineResult<()> {
    let profile = match project.assigned_profile_id {
        Some(id) => Some(require_profile(conn, id)?),
        None => None,
    };
    sync::refresh_project(project, profile.as_ref());
    Ok(())
}

fn register(conn: &Connection, path: &Path) -> EngineResult<Project> {
    let store = ProjectStore::new(conn);
    if let Some(project) = store.get_by_path(path)? {
        return Ok(project);
    }
    let project = Project::new(path.to_path_buf());
    store.create(&project)?;
    tracing::info!(project = %project.name, path = %path.display(), "registered project");
    Ok(project)
}

fn canonical_project(path: &Path) -> EngineResult<PathBuf> {
    let canonical = path.canonicalize().map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if !canonical.is_dir() {
        return Err(EngineError::InvalidInput(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(canonical)
}
