//! Identity and auto-naming.
//!
//! Every node and component gets a [`Uuid`] and, when created without a
//! name, an automatic `"<Prefix>-<n>"` name. The counter behind `n` lives in
//! a [`SceneContext`] rather than in a global so that two contexts produce
//! the same names in the same order.

use std::cell::Cell;
use std::rc::Rc;

use uuid::Uuid;

/// Allocates monotonically increasing auto-name numbers.
///
/// Numbers start at 1 and are never reused.
#[derive(Debug)]
struct AutoIdAllocator {
    next_id: Cell<u64>,
}

impl AutoIdAllocator {
    fn new() -> Self {
        Self {
            next_id: Cell::new(1),
        }
    }

    fn allocate(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn count(&self) -> u64 {
        self.next_id.get() - 1
    }
}

/// Construction context passed to [`Node::new`](crate::Node::new) and
/// [`Component::new`](crate::Component::new).
///
/// Cloning is cheap and the clones share one counter.
#[derive(Debug, Clone)]
pub struct SceneContext {
    names: Rc<AutoIdAllocator>,
}

impl SceneContext {
    /// Creates a context whose counter starts at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: Rc::new(AutoIdAllocator::new()),
        }
    }

    /// Returns the next auto-name number.
    pub fn next_auto_id(&self) -> u64 {
        self.names.allocate()
    }

    /// Builds a fresh automatic name such as `"Component-3"`.
    pub fn auto_name(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_auto_id())
    }

    /// Returns `name` unchanged, or an automatic name if it is empty.
    pub fn name_or_auto(&self, name: String, prefix: &str) -> String {
        if name.is_empty() {
            self.auto_name(prefix)
        } else {
            name
        }
    }

    /// Generates a new unique identifier.
    #[must_use]
    pub fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    /// Returns how many auto-name numbers have been handed out.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.names.count()
    }
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_names_are_sequential() {
        let ctx = SceneContext::new();
        assert_eq!(ctx.auto_name("Node"), "Node-1");
        assert_eq!(ctx.auto_name("Component"), "Component-2");
        assert_eq!(ctx.next_auto_id(), 3);
        assert_eq!(ctx.allocated(), 3);
    }

    #[test]
    fn test_clones_share_the_counter() {
        let ctx = SceneContext::new();
        let other = ctx.clone();
        ctx.next_auto_id();
        assert_eq!(other.next_auto_id(), 2);
    }

    #[test]
    fn test_separate_contexts_are_deterministic() {
        let a = SceneContext::new();
        let b = SceneContext::new();
        assert_eq!(a.auto_name("Node"), b.auto_name("Node"));
    }

    #[test]
    fn test_explicit_name_does_not_consume_counter() {
        let ctx = SceneContext::new();
        assert_eq!(ctx.name_or_auto("Player".to_string(), "Node"), "Player");
        assert_eq!(ctx.allocated(), 0);
        assert_eq!(ctx.name_or_auto(String::new(), "Node"), "Node-1");
    }

    #[test]
    fn test_ids_are_unique() {
        let ctx = SceneContext::new();
        assert_ne!(ctx.new_id(), ctx.new_id());
    }
}
