//! Node wiring layer: the trusted mutation surface
//!
//! Registration into a callback group is deliberately not public. A
//! `Node` owns its default group, tracks every group created through it
//! (weakly, so user-held groups die with their owner), and hands out
//! narrow wiring views — `NodeTopics`, `NodeTimers`, `NodeServices`,
//! `NodeWaitables` — that validate group membership before touching the
//! crate-private `add_*` operations. Everything else in the process only
//! ever reads groups.

use std::sync::{Arc, Weak};

use crate::entity::{Client, Publisher, Service, Subscription, Timer, Waitable};
use crate::error::{WiringError, WiringResult};
use crate::group::CallbackGroup;
use crate::mode::GroupMode;
use crate::spinlock::SpinLock;

/// Owner of callback groups and source of wiring views
pub struct Node {
    name: String,
    default_group: Arc<CallbackGroup>,
    /// All groups created for this node, the default group included.
    /// Weak: a user-created group lives only as long as its holder.
    groups: SpinLock<Vec<Weak<CallbackGroup>>>,
}

impl Node {
    /// Create a node with an exclusive, auto-add default group
    pub fn new(name: impl Into<String>) -> Self {
        let default_group = Arc::new(CallbackGroup::new(GroupMode::Exclusive));
        let node = Node {
            name: name.into(),
            default_group: default_group.clone(),
            groups: SpinLock::new(Vec::new()),
        };
        node.groups.lock().push(Arc::downgrade(&default_group));
        node
    }

    /// The node's name, for diagnostics only
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group entities land in when no group is given explicitly
    #[inline]
    pub fn default_group(&self) -> Arc<CallbackGroup> {
        self.default_group.clone()
    }

    /// Create a callback group owned by callers but known to this node
    pub fn create_group(&self, mode: GroupMode) -> Arc<CallbackGroup> {
        self.create_group_with_auto_add(mode, true)
    }

    /// Create a callback group with an explicit auto-add policy
    pub fn create_group_with_auto_add(&self, mode: GroupMode, auto_add: bool) -> Arc<CallbackGroup> {
        let group = Arc::new(CallbackGroup::with_auto_add(mode, auto_add));
        self.groups.lock().push(Arc::downgrade(&group));
        crate::kdebug!(
            "node {}: created {} group (auto_add={})",
            self.name,
            mode,
            auto_add
        );
        group
    }

    /// Check whether a group was created by this node
    ///
    /// Identity check on the allocation, not structural equality.
    pub fn has_group(&self, group: &Arc<CallbackGroup>) -> bool {
        self.groups
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .any(|g| Arc::ptr_eq(&g, group))
    }

    /// Visit every live group of this node
    pub fn for_each_group<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<CallbackGroup>),
    {
        for group in self.groups.lock().iter().filter_map(Weak::upgrade) {
            f(&group);
        }
    }

    /// Live groups an executor should pick up on node attachment
    ///
    /// This is the one consumer of the auto-add policy: groups that
    /// opted out, and groups already claimed by some executor, are
    /// skipped.
    pub fn auto_add_groups(&self) -> Vec<Arc<CallbackGroup>> {
        self.groups
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|g| g.auto_add() && !g.is_claimed())
            .collect()
    }

    /// Wiring view for publishers and subscriptions
    #[inline]
    pub fn topics(&self) -> NodeTopics<'_> {
        NodeTopics { node: self }
    }

    /// Wiring view for timers
    #[inline]
    pub fn timers(&self) -> NodeTimers<'_> {
        NodeTimers { node: self }
    }

    /// Wiring view for services and clients
    #[inline]
    pub fn services(&self) -> NodeServices<'_> {
        NodeServices { node: self }
    }

    /// Wiring view for generic waitables
    #[inline]
    pub fn waitables(&self) -> NodeWaitables<'_> {
        NodeWaitables { node: self }
    }

    fn check_group(&self, group: &Arc<CallbackGroup>) -> WiringResult<()> {
        if self.has_group(group) {
            Ok(())
        } else {
            crate::kwarn!(
                "node {}: rejected registration into a foreign group",
                self.name
            );
            Err(WiringError::ForeignGroup)
        }
    }
}

/// Wiring view that registers topic endpoints into groups
pub struct NodeTopics<'a> {
    node: &'a Node,
}

impl NodeTopics<'_> {
    /// Register a publisher into one of this node's groups
    pub fn register_publisher(
        &self,
        group: &Arc<CallbackGroup>,
        publisher: &Arc<dyn Publisher>,
    ) -> WiringResult<()> {
        self.node.check_group(group)?;
        group.add_publisher(publisher);
        Ok(())
    }

    /// Register a subscription into one of this node's groups
    pub fn register_subscription(
        &self,
        group: &Arc<CallbackGroup>,
        subscription: &Arc<dyn Subscription>,
    ) -> WiringResult<()> {
        self.node.check_group(group)?;
        group.add_subscription(subscription);
        Ok(())
    }
}

/// Wiring view that registers timers into groups
pub struct NodeTimers<'a> {
    node: &'a Node,
}

impl NodeTimers<'_> {
    /// Register a timer into one of this node's groups
    pub fn register_timer(
        &self,
        group: &Arc<CallbackGroup>,
        timer: &Arc<dyn Timer>,
    ) -> WiringResult<()> {
        self.node.check_group(group)?;
        group.add_timer(timer);
        Ok(())
    }
}

/// Wiring view that registers services and clients into groups
pub struct NodeServices<'a> {
    node: &'a Node,
}

impl NodeServices<'_> {
    /// Register a service into one of this node's groups
    pub fn register_service(
        &self,
        group: &Arc<CallbackGroup>,
        service: &Arc<dyn Service>,
    ) -> WiringResult<()> {
        self.node.check_group(group)?;
        group.add_service(service);
        Ok(())
    }

    /// Register a client into one of this node's groups
    pub fn register_client(
        &self,
        group: &Arc<CallbackGroup>,
        client: &Arc<dyn Client>,
    ) -> WiringResult<()> {
        self.node.check_group(group)?;
        group.add_client(client);
        Ok(())
    }
}

/// Wiring view that registers and removes generic waitables
pub struct NodeWaitables<'a> {
    node: &'a Node,
}

impl NodeWaitables<'_> {
    /// Register a waitable into one of this node's groups
    pub fn register_waitable(
        &self,
        group: &Arc<CallbackGroup>,
        waitable: &Arc<dyn Waitable>,
    ) -> WiringResult<()> {
        self.node.check_group(group)?;
        group.add_waitable(waitable);
        Ok(())
    }

    /// Remove a waitable from one of this node's groups
    ///
    /// Removal of a waitable that is not registered is a no-op, mirroring
    /// the group-level contract.
    pub fn remove_waitable(
        &self,
        group: &Arc<CallbackGroup>,
        waitable: &Arc<dyn Waitable>,
    ) -> WiringResult<()> {
        self.node.check_group(group)?;
        group.remove_waitable(waitable);
        Ok(())
    }
}
