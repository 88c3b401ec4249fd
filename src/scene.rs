//! Render boundary and the retained scene the GPU renderer draws.
//!
//! The simulation core creates, updates and disposes visuals only through
//! [`RenderBackend`]. [`Scene`] implements it as a plain in-memory scene
//! graph; [`GpuState`](crate::gpu::GpuState) turns a `Scene` into pixels.

use glam::{Quat, Vec3};
use std::collections::BTreeMap;

/// Handle to a sphere mesh node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Handle to a point light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(u64);

/// Position, rotation and scale of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Material of a sphere node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereMaterial {
    pub color: Vec3,
    /// Emissive strength, multiplied with `color`.
    pub emissive: f32,
}

/// A sphere as the renderer sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereNode {
    /// Unscaled radius.
    pub radius: f32,
    pub transform: Transform,
    pub material: SphereMaterial,
}

impl SphereNode {
    /// Radius after scale.
    pub fn visual_radius(&self) -> f32 {
        self.radius * self.transform.scale
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Distance at which the light fades out completely.
    pub range: f32,
}

/// Translucent shell drawn around the cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShellStyle {
    pub radius: f32,
    pub color: Vec3,
    pub opacity: f32,
    /// Extra rim brightness, animated by glow pulses.
    pub glow: f32,
}

/// Operations the simulation core needs from a renderer.
///
/// Disposing an id that is already gone is a no-op, so teardown can race
/// with earlier removals without surfacing errors.
pub trait RenderBackend {
    fn create_sphere(&mut self, radius: f32, material: SphereMaterial, transform: Transform) -> NodeId;
    fn dispose_sphere(&mut self, node: NodeId);
    fn set_transform(&mut self, node: NodeId, transform: Transform);
    fn set_emissive(&mut self, node: NodeId, emissive: f32);

    fn create_light(&mut self, light: PointLight) -> LightId;
    fn dispose_light(&mut self, light: LightId);
    fn set_light(&mut self, light: LightId, position: Vec3, intensity: f32);

    fn set_camera_distance(&mut self, distance: f32);
    fn set_shell_glow(&mut self, glow: f32);
}

/// In-memory scene graph.
///
/// Nodes and lights are kept in id order, which is creation order, so the
/// draw order is stable from frame to frame.
#[derive(Debug)]
pub struct Scene {
    spheres: BTreeMap<NodeId, SphereNode>,
    lights: BTreeMap<LightId, PointLight>,
    next_id: u64,
    pub shell: ShellStyle,
    pub camera_distance: f32,
}

impl Scene {
    pub fn new(shell_radius: f32, camera_distance: f32) -> Self {
        Self {
            spheres: BTreeMap::new(),
            lights: BTreeMap::new(),
            next_id: 0,
            shell: ShellStyle {
                radius: shell_radius,
                color: Vec3::new(0.55, 0.7, 1.0),
                opacity: 0.06,
                glow: 0.0,
            },
            camera_distance,
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn sphere(&self, node: NodeId) -> Option<&SphereNode> {
        self.spheres.get(&node)
    }

    pub fn spheres(&self) -> impl Iterator<Item = (NodeId, &SphereNode)> {
        self.spheres.iter().map(|(id, node)| (*id, node))
    }

    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    pub fn light(&self, light: LightId) -> Option<&PointLight> {
        self.lights.get(&light)
    }

    pub fn lights(&self) -> impl Iterator<Item = &PointLight> {
        self.lights.values()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}

impl RenderBackend for Scene {
    fn create_sphere(&mut self, radius: f32, material: SphereMaterial, transform: Transform) -> NodeId {
        let id = NodeId(self.allocate());
        self.spheres.insert(
            id,
            SphereNode {
                radius,
                transform,
                material,
            },
        );
        id
    }

    fn dispose_sphere(&mut self, node: NodeId) {
        self.spheres.remove(&node);
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(sphere) = self.spheres.get_mut(&node) {
            sphere.transform = transform;
        }
    }

    fn set_emissive(&mut self, node: NodeId, emissive: f32) {
        if let Some(sphere) = self.spheres.get_mut(&node) {
            sphere.material.emissive = emissive;
        }
    }

    fn create_light(&mut self, light: PointLight) -> LightId {
        let id = LightId(self.allocate());
        self.lights.insert(id, light);
        id
    }

    fn dispose_light(&mut self, light: LightId) {
        self.lights.remove(&light);
    }

    fn set_light(&mut self, light: LightId, position: Vec3, intensity: f32) {
        if let Some(l) = self.lights.get_mut(&light) {
            l.position = position;
            l.intensity = intensity;
        }
    }

    fn set_camera_distance(&mut self, distance: f32) {
        self.camera_distance = distance;
    }

    fn set_shell_glow(&mut self, glow: f32) {
        self.shell.glow = glow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> SphereMaterial {
        SphereMaterial {
            color: Vec3::ONE,
            emissive: 0.0,
        }
    }

    #[test]
    fn test_dispose_twice_is_noop() {
        let mut scene = Scene::new(5.0, 14.0);
        let node = scene.create_sphere(0.5, material(), Transform::at(Vec3::ZERO));
        scene.dispose_sphere(node);
        scene.dispose_sphere(node);
        assert_eq!(scene.sphere_count(), 0);

        let light = scene.create_light(PointLight {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 1.0,
            range: 2.0,
        });
        scene.dispose_light(light);
        scene.dispose_light(light);
        scene.set_light(light, Vec3::ONE, 3.0);
        assert_eq!(scene.light_count(), 0);
    }

    #[test]
    fn test_updates_reach_node() {
        let mut scene = Scene::new(5.0, 14.0);
        let node = scene.create_sphere(0.5, material(), Transform::at(Vec3::ZERO).with_scale(0.0));
        scene.set_transform(node, Transform::at(Vec3::X).with_scale(2.0));
        scene.set_emissive(node, 0.7);

        let sphere = scene.sphere(node).unwrap();
        assert_eq!(sphere.transform.position, Vec3::X);
        assert_eq!(sphere.visual_radius(), 1.0);
        assert_eq!(sphere.material.emissive, 0.7);
    }

    #[test]
    fn test_iteration_follows_creation_order() {
        let mut scene = Scene::new(5.0, 14.0);
        let a = scene.create_sphere(0.1, material(), Transform::at(Vec3::X));
        let b = scene.create_sphere(0.2, material(), Transform::at(Vec3::Y));
        let ids: Vec<NodeId> = scene.spheres().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
