//! Composite children and delegate links.
//!
//! A parent owns its children; a child only keeps a weak back-reference to
//! its delegate. Adding a child makes the parent the child's delegate, and
//! setting a delegate adds the container as the delegate's child, so the two
//! links are always established together.

use std::sync::Arc;

use super::Container;
use crate::error::{DiError, DiResult};

impl Container {
    /// Appends `child` to the composite; it is consulted after every child
    /// added before it.
    ///
    /// Unless `child` already delegates to this container, this container
    /// becomes its delegate.
    ///
    /// ```
    /// use keyed_di::Container;
    ///
    /// let parent = Container::new();
    /// let child = Container::new();
    /// child.set("port", 8080)?;
    ///
    /// parent.add_child(&child)?;
    /// assert_eq!(parent.get("port")?, 8080);
    /// assert!(child.delegate().unwrap().ptr_eq(&parent));
    /// # Ok::<(), keyed_di::DiError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `child` is this container or already contains it
    /// somewhere below, which would make lookups cycle.
    pub fn add_child(&self, child: &Container) -> DiResult<&Self> {
        self.link_child(child, false)
    }

    /// Like [`add_child`](Container::add_child), but `child` is consulted
    /// before every existing child.
    pub fn prepend_child(&self, child: &Container) -> DiResult<&Self> {
        self.link_child(child, true)
    }

    fn link_child(&self, child: &Container, front: bool) -> DiResult<&Self> {
        if self.ptr_eq(child) {
            return Err(DiError::invalid_argument("a container cannot be its own child"));
        }
        if child.reaches(self) {
            return Err(DiError::invalid_argument(
                "child already contains this container; the composite would be cyclic",
            ));
        }

        {
            let mut children = self.inner.children.write();
            let existing = children.iter().position(|c| c.ptr_eq(child));
            match (existing, front) {
                (Some(index), true) => {
                    let moved = children.remove(index);
                    children.insert(0, moved);
                }
                (Some(_), false) => {}
                (None, true) => children.insert(0, child.clone()),
                (None, false) => children.push(child.clone()),
            }
        }
        tracing::debug!(parent = self.uid(), child = child.uid(), front, "child linked");

        let already_delegates = child.delegate().map_or(false, |delegate| delegate.ptr_eq(self));
        if !already_delegates {
            child.set_delegate(self)?;
        }
        Ok(self)
    }

    /// Makes `delegate` resolve this container's definition dependencies.
    ///
    /// This container is added as a child of `delegate` unless it already is
    /// one. Passing the container itself resets it to resolve its own
    /// dependencies.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `delegate` is already below this container in a
    /// composite.
    pub fn set_delegate(&self, delegate: &Container) -> DiResult<&Self> {
        if delegate.ptr_eq(self) {
            *self.inner.delegate.write() = None;
            tracing::debug!(container = self.uid(), "delegate reset to self");
            return Ok(self);
        }
        if !delegate.has_child(self) {
            delegate.add_child(self)?;
        }
        *self.inner.delegate.write() = Some(Arc::downgrade(&delegate.inner));
        tracing::debug!(container = self.uid(), delegate = delegate.uid(), "delegate set");
        Ok(self)
    }

    /// The container resolving this one's definition dependencies, if it is
    /// not the container itself. A delegate that has been dropped no longer
    /// counts.
    pub fn delegate(&self) -> Option<Container> {
        self.inner
            .delegate
            .read()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(|inner| Container { inner })
    }

    /// Direct children, in lookup order.
    pub fn children(&self) -> Vec<Container> {
        self.inner.children.read().clone()
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.read().len()
    }

    /// Whether `child` is a direct child of this container.
    pub fn has_child(&self, child: &Container) -> bool {
        self.inner.children.read().iter().any(|c| c.ptr_eq(child))
    }

    /// Whether `target` is this container or anywhere below it.
    fn reaches(&self, target: &Container) -> bool {
        self.ptr_eq(target) || self.children().iter().any(|child| child.reaches(target))
    }
}
