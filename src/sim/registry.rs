//! Ordered collection of live bodies with one distinguished driver.

use super::liveness::StationaryTracker;
use crate::physics::BodyHandle;
use crate::scene::{LightId, NodeId};

/// Stable identity of a body for its whole life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

/// Physics and render resources that make up one body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyParts {
    pub handle: BodyHandle,
    pub node: NodeId,
    /// Owned light, released together with the body.
    pub light: Option<LightId>,
    pub radius: f32,
    /// Per-body offset for the cosmetic pulses, in radians.
    pub phase: f32,
}

#[derive(Clone, Debug)]
pub struct ActiveBody {
    pub id: BodyId,
    pub handle: BodyHandle,
    pub node: NodeId,
    pub light: Option<LightId>,
    pub radius: f32,
    pub phase: f32,
    pub tracker: StationaryTracker,
}

impl ActiveBody {
    pub fn parts(&self) -> BodyParts {
        BodyParts {
            handle: self.handle,
            node: self.node,
            light: self.light,
            radius: self.radius,
            phase: self.phase,
        }
    }
}

/// Live bodies in insertion order.
///
/// The driver is tracked by id, so its index is always resolved against
/// the current order and shifts down on its own when an earlier body is
/// removed. The driver can only leave through [`drain`](Self::drain).
#[derive(Debug, Default)]
pub struct BodyRegistry {
    bodies: Vec<ActiveBody>,
    driver: Option<BodyId>,
    next_id: u64,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(&mut self, parts: BodyParts) -> ActiveBody {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        ActiveBody {
            id,
            handle: parts.handle,
            node: parts.node,
            light: parts.light,
            radius: parts.radius,
            phase: parts.phase,
            tracker: StationaryTracker::default(),
        }
    }

    /// Append an ambient body.
    pub fn insert(&mut self, parts: BodyParts) -> BodyId {
        let body = self.wrap(parts);
        let id = body.id;
        self.bodies.push(body);
        id
    }

    /// Append a body and make it the driver.
    ///
    /// A previous driver, if any, becomes an ambient body.
    pub fn insert_driver(&mut self, parts: BodyParts) -> BodyId {
        let id = self.insert(parts);
        if self.driver.replace(id).is_some() {
            tracing::warn!("driver replaced; previous driver is now ambient");
        }
        id
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ActiveBody> {
        self.bodies.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveBody> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActiveBody> {
        self.bodies.iter_mut()
    }

    pub fn driver_id(&self) -> Option<BodyId> {
        self.driver
    }

    pub fn index_of(&self, id: BodyId) -> Option<usize> {
        self.bodies.iter().position(|b| b.id == id)
    }

    /// Current position of the driver.
    pub fn driver_index(&self) -> Option<usize> {
        self.driver.and_then(|id| self.index_of(id))
    }

    pub fn driver(&self) -> Option<&ActiveBody> {
        self.driver_index().map(|i| &self.bodies[i])
    }

    pub fn is_driver(&self, index: usize) -> bool {
        matches!((self.driver, self.bodies.get(index)), (Some(id), Some(b)) if b.id == id)
    }

    pub fn non_driver_count(&self) -> usize {
        self.bodies.len() - usize::from(self.driver_index().is_some())
    }

    /// Index of the `n`-th non-driver body.
    pub fn nth_non_driver(&self, n: usize) -> Option<usize> {
        let driver = self.driver;
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| Some(b.id) != driver)
            .nth(n)
            .map(|(i, _)| i)
    }

    /// Remove the body at `index`, shifting later bodies down.
    ///
    /// Returns `None` for an out-of-range index or the driver.
    pub fn remove_at(&mut self, index: usize) -> Option<ActiveBody> {
        if index >= self.bodies.len() || self.is_driver(index) {
            return None;
        }
        Some(self.bodies.remove(index))
    }

    /// Remove every marked index in one pass.
    ///
    /// Indices refer to the order before the call. They are applied from
    /// the highest down so earlier removals never shift a pending one.
    /// Duplicates and the driver are skipped.
    pub fn remove_marked(&mut self, marked: &mut Vec<usize>) -> Vec<ActiveBody> {
        marked.sort_unstable_by(|a, b| b.cmp(a));
        marked.dedup();
        marked.drain(..).filter_map(|i| self.remove_at(i)).collect()
    }

    /// Take every body out, driver included.
    pub fn drain(&mut self) -> Vec<ActiveBody> {
        self.driver = None;
        std::mem::take(&mut self.bodies)
    }
}
