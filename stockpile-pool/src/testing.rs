//! In-memory host used for testing pools.

use std::{fmt, sync::Arc};

use futures::channel::oneshot;
use parking_lot::Mutex;

use crate::{
    factory::{BatchCompletion, PendingBatch, ResourceFactory},
    placement::{Placement, Space},
    poolable::{NestedPoolable, PoolMember, Poolable},
};

/// Path-like scope identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestScope(pub String);

impl TestScope {
    /// Create scope with the given path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Create a child scope.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}/{name}", self.0))
    }
}

/// Scene-graph-like node for testing purposes.
pub struct TestNode {
    /// Node name.
    pub name: String,
    /// Active state.
    pub active: bool,
    /// Parent scope.
    pub parent: Option<TestScope>,
    /// Last placement set in local space.
    pub local: Placement,
    /// Last placement set in world space.
    pub world: Placement,
    /// Whether the last re-parenting kept world transform.
    pub kept_world_transform: Option<bool>,
    /// Scene the node belongs to, used as scope tag.
    pub scene: Option<String>,
    /// Number of pool members clones of this node get.
    pub member_slots: usize,
    /// Nested pool-aware components.
    pub members: Vec<Arc<dyn NestedPoolable<TestNode>>>,
}

impl TestNode {
    /// Create an active node with no members.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            parent: None,
            local: Placement::IDENTITY,
            world: Placement::IDENTITY,
            kept_world_transform: None,
            scene: None,
            member_slots: 0,
            members: Vec::new(),
        }
    }

    /// Set scene tag.
    #[must_use]
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    /// Make clones of this node carry a [`PoolMember`] component.
    #[must_use]
    pub fn with_member(mut self) -> Self {
        self.member_slots += 1;
        self
    }

    /// Attach a nested component, e.g. one belonging to an instance of another pool.
    pub fn attach(&mut self, member: Arc<dyn NestedPoolable<TestNode>>) {
        self.members.push(member);
    }

    /// Clone of this node, as created by a factory.
    fn instantiate(&self, parent: Option<&TestScope>) -> Self {
        let mut node = Self::new(format!("{}(Clone)", self.name));
        node.active = self.active;
        node.parent = parent.cloned();
        node.scene.clone_from(&self.scene);
        for _ in 0..self.member_slots {
            node.members.push(Arc::new(PoolMember::<TestNode>::new()));
        }
        node
    }
}

impl Poolable for TestNode {
    type Scope = TestScope;
    type Tag = String;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn set_parent(&mut self, parent: Option<&Self::Scope>, keep_world_transform: bool) {
        self.parent = parent.cloned();
        self.kept_world_transform = Some(keep_world_transform);
    }

    fn set_placement(&mut self, placement: Placement, space: Space) {
        match space {
            Space::Local => self.local = placement,
            Space::World => self.world = placement,
        }
    }

    fn scope_tag(&self) -> Option<Self::Tag> {
        self.scene.clone()
    }

    fn nested_poolables(&self) -> Vec<Arc<dyn NestedPoolable<Self>>> {
        self.members.clone()
    }
}

impl fmt::Debug for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestNode")
            .field("name", &self.name)
            .field("active", &self.active)
            .field("parent", &self.parent)
            .field("scene", &self.scene)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

/// How [`TestFactory`] answers batch requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// Batches land on first poll.
    #[default]
    Immediate,
    /// Batches land when [`TestFactory::land_next`] is called.
    Manual,
    /// Batches complete without being done.
    Incomplete,
}

/// Factory of [`TestNode`] clones.
#[derive(Default)]
pub struct TestFactory {
    mode: BatchMode,
    /// Containers created so far.
    containers: Mutex<Vec<TestScope>>,
    /// Template active state observed on every clone.
    template_active: Mutex<Vec<bool>>,
    /// Requested batch sizes.
    batches: Mutex<Vec<usize>>,
    /// Manual batches not yet delivered.
    held: Mutex<Vec<(oneshot::Sender<Vec<TestNode>>, Vec<TestNode>)>>,
}

impl TestFactory {
    /// Create factory answering batches as configured.
    #[must_use]
    pub fn new(mode: BatchMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            ..Self::default()
        })
    }

    /// Deliver the oldest held batch. Returns `false` if none was held.
    pub fn land_next(&self) -> bool {
        let mut held = self.held.lock();
        if held.is_empty() {
            return false;
        }
        let (tx, nodes) = held.remove(0);
        tx.send(nodes).is_ok()
    }

    /// Drop the oldest held batch without delivering it.
    pub fn abandon_next(&self) -> bool {
        let mut held = self.held.lock();
        if held.is_empty() {
            return false;
        }
        drop(held.remove(0));
        true
    }

    /// Containers created so far.
    #[must_use]
    pub fn containers(&self) -> Vec<TestScope> {
        self.containers.lock().clone()
    }

    /// Template active state observed on every clone, in order.
    #[must_use]
    pub fn template_active(&self) -> Vec<bool> {
        self.template_active.lock().clone()
    }

    /// Requested batch sizes, in order.
    #[must_use]
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }
}

impl ResourceFactory<TestNode> for TestFactory {
    fn create_container(&self, name: &str, owner: &TestScope) -> TestScope {
        let scope = owner.child(name);
        self.containers.lock().push(scope.clone());
        scope
    }

    fn instantiate(&self, template: &TestNode, parent: Option<&TestScope>) -> TestNode {
        self.template_active.lock().push(template.active);
        template.instantiate(parent)
    }

    fn instantiate_batch(
        &self,
        template: &TestNode,
        count: usize,
        parent: &TestScope,
    ) -> PendingBatch<TestNode> {
        self.batches.lock().push(count);
        match self.mode {
            BatchMode::Incomplete => PendingBatch::from_future(
                count,
                futures::future::ready(BatchCompletion::incomplete(0.9)),
            ),
            mode => {
                let nodes: Vec<_> = (0..count)
                    .map(|_| self.instantiate(template, Some(parent)))
                    .collect();
                if mode == BatchMode::Immediate {
                    return PendingBatch::ready(nodes);
                }
                let (tx, rx) = oneshot::channel();
                self.held.lock().push((tx, nodes));
                PendingBatch::from_receiver(count, rx)
            }
        }
    }
}
