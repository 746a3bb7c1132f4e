use std::collections::HashMap;
use std::hash::Hash;
use crate::core::{BodyHandle, ConstraintHandle, SpringHandle};
use crate::error::PhysicsError;
use crate::Result;

/// A typed identifier that can be minted from a raw counter value
pub trait Handle: Copy + Eq + Hash + std::fmt::Debug {
    /// Human readable name of the handled resource, used in error messages
    const KIND: &'static str;

    /// Creates the handle from its raw id
    fn from_raw(id: u32) -> Self;

    /// Returns the raw id of the handle
    fn raw(&self) -> u32;
}

impl Handle for BodyHandle {
    const KIND: &'static str = "Body";
    fn from_raw(id: u32) -> Self { BodyHandle(id) }
    fn raw(&self) -> u32 { self.0 }
}

impl Handle for ConstraintHandle {
    const KIND: &'static str = "Constraint";
    fn from_raw(id: u32) -> Self { ConstraintHandle(id) }
    fn raw(&self) -> u32 { self.0 }
}

impl Handle for SpringHandle {
    const KIND: &'static str = "Spring";
    fn from_raw(id: u32) -> Self { SpringHandle(id) }
    fn raw(&self) -> u32 { self.0 }
}

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Clears all items from the storage
    fn clear(&mut self);

    /// Returns all handles in insertion order
    fn handles(&self) -> Vec<H>;

    /// Returns an iterator over all items in insertion order
    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a;

    /// Returns a mutable iterator over all items in insertion order
    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a;
}

/// Insertion-ordered storage addressed by handles.
///
/// Iteration order is the order items were added, which keeps the solver's
/// equation order reproducible. Removal preserves the order of the remaining items.
#[derive(Debug, Clone)]
pub struct HandleStorage<H: Handle, T> {
    items: Vec<T>,
    handles: Vec<H>,
    index: HashMap<H, usize>,
    next_id: u32,
}

/// Storage for physics bodies
pub type BodyStorage<T> = HandleStorage<BodyHandle, T>;

/// Storage for physics constraints
pub type ConstraintStorage<T> = HandleStorage<ConstraintHandle, T>;

/// Storage for springs
pub type SpringStorage<T> = HandleStorage<SpringHandle, T>;

impl<H: Handle, T> Storage<T, H> for HandleStorage<H, T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            handles: Vec::new(),
            index: HashMap::new(),
            next_id: 1, // Start at 1, so 0 can represent invalid handle
        }
    }

    fn add(&mut self, item: T) -> H {
        let handle = H::from_raw(self.next_id);
        self.next_id += 1;
        self.push(handle, item);
        handle
    }

    fn get(&self, handle: H) -> Option<&T> {
        self.index.get(&handle).map(|&i| &self.items[i])
    }

    fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        match self.index.get(&handle) {
            Some(&i) => Some(&mut self.items[i]),
            None => None,
        }
    }

    fn remove(&mut self, handle: H) -> Option<T> {
        let position = self.index.remove(&handle)?;
        let item = self.items.remove(position);
        self.handles.remove(position);

        for (i, h) in self.handles.iter().enumerate().skip(position) {
            self.index.insert(*h, i);
        }

        Some(item)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn clear(&mut self) {
        self.items.clear();
        self.handles.clear();
        self.index.clear();
    }

    fn handles(&self) -> Vec<H> {
        self.handles.clone()
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a where T: 'a {
        self.handles.iter().copied().zip(self.items.iter())
    }

    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a where T: 'a {
        self.handles.iter().copied().zip(self.items.iter_mut())
    }
}

impl<H: Handle, T> HandleStorage<H, T> {
    fn push(&mut self, handle: H, item: T) {
        self.index.insert(handle, self.items.len());
        self.items.push(item);
        self.handles.push(handle);
    }

    /// Inserts an item under an explicit handle, keeping the id counter ahead of it.
    ///
    /// Used when restoring a serialized world so that ids survive the round trip.
    pub fn insert_with_handle(&mut self, handle: H, item: T) -> Result<()> {
        if self.index.contains_key(&handle) {
            return Err(PhysicsError::InvalidParameter(
                format!("{} with handle {:?} already exists", H::KIND, handle)
            ));
        }
        self.next_id = self.next_id.max(handle.raw() + 1);
        self.push(handle, item);
        Ok(())
    }

    /// Gets an item by its handle, returning an error if not found
    pub fn get_checked(&self, handle: H) -> Result<&T> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{} with handle {:?} not found", H::KIND, handle)))
    }

    /// Gets a mutable reference to an item by its handle, returning an error if not found
    pub fn get_checked_mut(&mut self, handle: H) -> Result<&mut T> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("{} with handle {:?} not found", H::KIND, handle)))
    }

    /// Returns the insertion-order index of a handle
    pub fn index_of(&self, handle: H) -> Option<usize> {
        self.index.get(&handle).copied()
    }

    /// Returns the handle stored at an insertion-order index
    pub fn handle_at(&self, index: usize) -> Option<H> {
        self.handles.get(index).copied()
    }

    /// Returns true if the handle refers to a live item
    pub fn contains(&self, handle: H) -> bool {
        self.index.contains_key(&handle)
    }

    /// Returns the items as a slice in insertion order
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Returns the items as a mutable slice in insertion order
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Returns the id the next added item will receive
    pub fn next_id(&self) -> u32 {
        self.next_id
    }
}

impl<T> HandleStorage<BodyHandle, T> {
    /// Gets a body by its handle, returning an error if not found
    pub fn get_body(&self, handle: BodyHandle) -> Result<&T> {
        self.get_checked(handle)
    }

    /// Gets a mutable reference to a body by its handle, returning an error if not found
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        self.get_checked_mut(handle)
    }

    /// Returns mutable references to two distinct bodies at once
    pub fn get_pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Result<(&mut T, &mut T)> {
        let ia = self.index_of(a)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", a)))?;
        let ib = self.index_of(b)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Body with handle {:?} not found", b)))?;
        pair_mut(&mut self.items, ia, ib)
            .ok_or_else(|| PhysicsError::InvalidParameter(format!("Body pair {:?} refers to a single body", a)))
    }
}

impl<T> HandleStorage<ConstraintHandle, T> {
    /// Gets a constraint by its handle, returning an error if not found
    pub fn get_constraint(&self, handle: ConstraintHandle) -> Result<&T> {
        self.get_checked(handle)
    }

    /// Gets a mutable reference to a constraint by its handle, returning an error if not found
    pub fn get_constraint_mut(&mut self, handle: ConstraintHandle) -> Result<&mut T> {
        self.get_checked_mut(handle)
    }
}

impl<H: Handle, T> Default for HandleStorage<H, T> {
    fn default() -> Self {
        <Self as Storage<T, H>>::new()
    }
}

/// Borrows two distinct elements of a slice mutably
pub(crate) fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b || a >= items.len() || b >= items.len() {
        return None;
    }
    if a < b {
        let (left, right) = items.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = items.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}
