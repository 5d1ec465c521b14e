//! Workspace type definitions
//!
//! A workspace is an identity plus an opaque state container. Providers keep
//! their own state in it, keyed by type; the persistence core only passes
//! references around and never looks inside.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique workspace identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub Uuid);

impl WorkspaceId {
    /// Generate a new random workspace ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WorkspaceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Opaque, mutable workspace handed to providers
pub struct Workspace {
    /// Unique identifier
    id: WorkspaceId,

    /// Human-readable name
    name: String,

    /// Provider-owned state, one slot per type
    state: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Workspace {
    /// Create a workspace with a fresh ID
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(WorkspaceId::new(), name)
    }

    /// Create a workspace with a known ID
    pub fn with_id(id: WorkspaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state: HashMap::new(),
        }
    }

    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Store a state value, returning the previous value of the same type
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.state
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Borrow the state value of type `T`
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.state
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Mutably borrow the state value of type `T`
    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.state
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Get the state value of type `T`, inserting `T::default()` if absent
    pub fn get_or_default<T: Any + Send + Sync + Default>(&mut self) -> &mut T {
        self.state
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()) as Box<dyn Any + Send + Sync>)
            .downcast_mut::<T>()
            .expect("state slot is keyed by its own TypeId")
    }

    /// Remove and return the state value of type `T`
    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.state
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Check if a state value of type `T` is present
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.state.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state_slots", &self.state.len())
            .finish()
    }
}

/// Ordered set of workspaces persisted as one document
#[derive(Debug, Default)]
pub struct Project {
    workspaces: Vec<Workspace>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a workspace, returning its ID
    pub fn add(&mut self, workspace: Workspace) -> WorkspaceId {
        let id = workspace.id();
        self.workspaces.push(workspace);
        id
    }

    /// Remove a workspace by ID
    pub fn remove(&mut self, id: WorkspaceId) -> Option<Workspace> {
        let index = self.workspaces.iter().position(|ws| ws.id == id)?;
        Some(self.workspaces.remove(index))
    }

    /// Workspaces in project order
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn get(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|ws| ws.id == id)
    }

    pub fn get_mut(&mut self, id: WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.iter_mut().find(|ws| ws.id == id)
    }

    /// Find the first workspace with the given name
    pub fn find_by_name(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|ws| ws.name == name)
    }

    /// Get the workspace with `id`, appending a new one if it is not present.
    ///
    /// The workspace name is updated to `name` either way.
    pub fn ensure_workspace(&mut self, id: WorkspaceId, name: &str) -> &mut Workspace {
        let index = match self.workspaces.iter().position(|ws| ws.id == id) {
            Some(index) => index,
            None => {
                self.workspaces.push(Workspace::with_id(id, name));
                self.workspaces.len() - 1
            }
        };

        let workspace = &mut self.workspaces[index];
        if workspace.name != name {
            workspace.set_name(name);
        }
        workspace
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}
