//! Small impulse-based sphere simulator.

use super::{BodyDesc, BodyHandle, BodyMode, ContactMaterial, PhysicsBackend};
use glam::{Quat, Vec3};
use std::collections::HashMap;

/// Share of the overlap removed per contact resolution.
const POSITION_CORRECTION: f32 = 0.8;

#[derive(Clone, Debug)]
struct RigidSphere {
    handle: BodyHandle,
    position: Vec3,
    velocity: Vec3,
    rotation: Quat,
    angular_velocity: Vec3,
    /// Accumulated force, cleared every step.
    force: Vec3,
    radius: f32,
    inv_mass: f32,
    inv_inertia: f32,
    linear_damping: f32,
    angular_damping: f32,
    mode: BodyMode,
}

impl RigidSphere {
    fn new(handle: BodyHandle, desc: &BodyDesc) -> Self {
        // Solid sphere: I = 2/5 m r^2
        let inertia = 0.4 * desc.mass * desc.radius * desc.radius;
        Self {
            handle,
            position: desc.position,
            velocity: desc.velocity,
            rotation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            radius: desc.radius,
            inv_mass: 1.0 / desc.mass,
            inv_inertia: 1.0 / inertia,
            linear_damping: desc.linear_damping.clamp(0.0, 1.0),
            angular_damping: desc.angular_damping.clamp(0.0, 1.0),
            mode: desc.mode,
        }
    }

    fn is_dynamic(&self) -> bool {
        self.mode == BodyMode::Dynamic
    }

    fn effective_inv_mass(&self) -> f32 {
        if self.is_dynamic() {
            self.inv_mass
        } else {
            0.0
        }
    }

    fn effective_inv_inertia(&self) -> f32 {
        if self.is_dynamic() {
            self.inv_inertia
        } else {
            0.0
        }
    }
}

/// Sphere-only rigid-body world.
///
/// Semi-implicit Euler integration, frame-rate independent damping, and
/// pairwise contacts with positional correction, restitution and Coulomb
/// friction. Good for a few dozen bodies; contacts are checked all-pairs.
pub struct SphereWorld {
    gravity: Vec3,
    material: ContactMaterial,
    bodies: Vec<RigidSphere>,
    /// Handle -> position in `bodies`.
    index: HashMap<BodyHandle, usize>,
    next_handle: u64,
}

impl SphereWorld {
    pub fn new(gravity: Vec3, material: ContactMaterial) -> Self {
        Self {
            gravity,
            material,
            bodies: Vec::new(),
            index: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    pub fn material(&self) -> ContactMaterial {
        self.material
    }

    /// Current mode of a body.
    pub fn mode(&self, handle: BodyHandle) -> Option<BodyMode> {
        self.get(handle).map(|b| b.mode)
    }

    /// Angular velocity in radians per second.
    pub fn angular_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.get(handle).map(|b| b.angular_velocity)
    }

    fn get(&self, handle: BodyHandle) -> Option<&RigidSphere> {
        self.index.get(&handle).map(|&i| &self.bodies[i])
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidSphere> {
        match self.index.get(&handle) {
            Some(&i) => Some(&mut self.bodies[i]),
            None => None,
        }
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in &mut self.bodies {
            if body.is_dynamic() {
                body.velocity += (gravity + body.force * body.inv_mass) * dt;
                body.velocity *= (1.0 - body.linear_damping).powf(dt);
                body.angular_velocity *= (1.0 - body.angular_damping).powf(dt);
            }
            body.force = Vec3::ZERO;

            body.position += body.velocity * dt;
            if body.angular_velocity.length_squared() > 0.0 {
                let spin = Quat::from_scaled_axis(body.angular_velocity * dt);
                body.rotation = (spin * body.rotation).normalize();
            }
        }
    }

    fn resolve_contacts(&mut self) {
        let material = self.material;
        for i in 0..self.bodies.len() {
            let (head, tail) = self.bodies.split_at_mut(i + 1);
            let a = &mut head[i];
            for b in tail.iter_mut() {
                resolve_pair(a, b, material);
            }
        }
    }
}

impl Default for SphereWorld {
    fn default() -> Self {
        Self::new(Vec3::ZERO, ContactMaterial::default())
    }
}

fn resolve_pair(a: &mut RigidSphere, b: &mut RigidSphere, material: ContactMaterial) {
    let inv_a = a.effective_inv_mass();
    let inv_b = b.effective_inv_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let delta = b.position - a.position;
    let min_dist = a.radius + b.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 { delta / dist } else { Vec3::Y };

    let correction = normal * ((min_dist - dist) * POSITION_CORRECTION / inv_sum);
    a.position -= correction * inv_a;
    b.position += correction * inv_b;

    let closing = (b.velocity - a.velocity).dot(normal);
    if closing >= 0.0 {
        return;
    }

    let j = -(1.0 + material.restitution) * closing / inv_sum;
    let impulse = normal * j;
    a.velocity -= impulse * inv_a;
    b.velocity += impulse * inv_b;

    let relative = b.velocity - a.velocity;
    let tangent_velocity = relative - normal * relative.dot(normal);
    let tangent_speed = tangent_velocity.length();
    if tangent_speed > 1e-6 {
        let tangent = tangent_velocity / tangent_speed;
        let jt = (tangent_speed / inv_sum).min(material.friction * j);
        let friction = tangent * jt;
        a.velocity += friction * inv_a;
        b.velocity -= friction * inv_b;

        a.angular_velocity += (normal * a.radius).cross(friction) * a.effective_inv_inertia();
        b.angular_velocity += (-normal * b.radius).cross(-friction) * b.effective_inv_inertia();
    }
}

impl PhysicsBackend for SphereWorld {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.index.insert(handle, self.bodies.len());
        self.bodies.push(RigidSphere::new(handle, desc));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(i) = self.index.remove(&handle) else {
            return false;
        };
        self.bodies.swap_remove(i);
        if let Some(moved) = self.bodies.get(i) {
            self.index.insert(moved.handle, i);
        }
        true
    }

    fn step(&mut self, dt: f32) {
        self.integrate(dt);
        self.resolve_contacts();
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.get(handle).map(|b| b.position)
    }

    fn rotation(&self, handle: BodyHandle) -> Option<Quat> {
        self.get(handle).map(|b| b.rotation)
    }

    fn velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.get(handle).map(|b| b.velocity)
    }

    fn set_position(&mut self, handle: BodyHandle, position: Vec3) {
        if let Some(body) = self.get_mut(handle) {
            body.position = position;
        }
    }

    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.get_mut(handle) {
            body.velocity = velocity;
        }
    }

    fn set_mode(&mut self, handle: BodyHandle, mode: BodyMode) {
        if let Some(body) = self.get_mut(handle) {
            body.mode = mode;
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3, local_offset: Vec3) {
        if let Some(body) = self.get_mut(handle) {
            if !body.is_dynamic() {
                return;
            }
            body.velocity += impulse * body.inv_mass;
            let arm = body.rotation * local_offset;
            body.angular_velocity += arm.cross(impulse) * body.inv_inertia;
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec3) {
        if let Some(body) = self.get_mut(handle) {
            body.force += force;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> SphereWorld {
        SphereWorld::new(
            Vec3::ZERO,
            ContactMaterial {
                friction: 0.0,
                restitution: 1.0,
            },
        )
    }

    #[test]
    fn test_gravity_accelerates_dynamic_body() {
        let mut world = SphereWorld::new(Vec3::new(0.0, -10.0, 0.0), ContactMaterial::default());
        let h = world.add_body(&BodyDesc::sphere(Vec3::ZERO, 0.5, 1.0));
        world.step(0.1);
        let v = world.velocity(h).unwrap();
        assert!((v.y + 1.0).abs() < 1e-5);
        assert!(world.position(h).unwrap().y < 0.0);
    }

    #[test]
    fn test_force_is_consumed_by_one_step() {
        let mut world = world();
        let h = world.add_body(&BodyDesc::sphere(Vec3::ZERO, 0.5, 2.0));
        world.apply_force(h, Vec3::new(4.0, 0.0, 0.0));
        world.step(0.5);
        assert!((world.velocity(h).unwrap().x - 1.0).abs() < 1e-5);
        world.step(0.5);
        assert!((world.velocity(h).unwrap().x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_damping_slows_body() {
        let mut world = world();
        let h = world.add_body(
            &BodyDesc::sphere(Vec3::ZERO, 0.5, 1.0).with_damping(0.5, 0.5),
        );
        world.set_velocity(h, Vec3::X * 4.0);
        world.step(1.0);
        assert!((world.velocity(h).unwrap().x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_kinematic_ignores_forces_and_impulses() {
        let mut world = SphereWorld::new(Vec3::new(0.0, -10.0, 0.0), ContactMaterial::default());
        let h = world.add_body(
            &BodyDesc::sphere(Vec3::ONE, 0.5, 1.0).with_mode(BodyMode::Kinematic),
        );
        world.apply_force(h, Vec3::X * 100.0);
        world.apply_impulse(h, Vec3::X * 100.0, Vec3::ZERO);
        world.step(0.1);
        assert_eq!(world.velocity(h), Some(Vec3::ZERO));
        assert_eq!(world.position(h), Some(Vec3::ONE));

        world.set_mode(h, BodyMode::Dynamic);
        world.apply_impulse(h, Vec3::X, Vec3::ZERO);
        assert_eq!(world.velocity(h), Some(Vec3::X));
    }

    #[test]
    fn test_head_on_elastic_collision_swaps_velocities() {
        let mut world = world();
        let a = world.add_body(&BodyDesc::sphere(Vec3::new(-0.45, 0.0, 0.0), 0.5, 1.0));
        let b = world.add_body(&BodyDesc::sphere(Vec3::new(0.45, 0.0, 0.0), 0.5, 1.0));
        world.set_velocity(a, Vec3::X);
        world.set_velocity(b, -Vec3::X);
        world.step(0.001);

        let va = world.velocity(a).unwrap();
        let vb = world.velocity(b).unwrap();
        assert!((va.x + 1.0).abs() < 1e-4);
        assert!((vb.x - 1.0).abs() < 1e-4);
        assert!(world.position(b).unwrap().x > world.position(a).unwrap().x);
    }

    #[test]
    fn test_overlap_is_reduced() {
        let mut world = world();
        let a = world.add_body(&BodyDesc::sphere(Vec3::ZERO, 0.5, 1.0));
        let b = world.add_body(&BodyDesc::sphere(Vec3::new(0.5, 0.0, 0.0), 0.5, 1.0));
        world.step(0.0);
        let gap = world.position(b).unwrap().x - world.position(a).unwrap().x;
        assert!(gap > 0.89, "gap {gap}");
    }

    #[test]
    fn test_kinematic_body_pushes_dynamic_one() {
        let mut world = world();
        let k = world.add_body(
            &BodyDesc::sphere(Vec3::ZERO, 0.5, 1.0).with_mode(BodyMode::Kinematic),
        );
        let d = world.add_body(&BodyDesc::sphere(Vec3::new(0.6, 0.0, 0.0), 0.5, 1.0));
        world.step(0.0);
        assert_eq!(world.position(k), Some(Vec3::ZERO));
        assert!(world.position(d).unwrap().x > 0.6);
    }

    #[test]
    fn test_off_center_impulse_spins_body() {
        let mut world = world();
        let h = world.add_body(&BodyDesc::sphere(Vec3::ZERO, 0.5, 1.0));
        world.apply_impulse(h, Vec3::X, Vec3::Y * 0.1);
        let w = world.angular_velocity(h).unwrap();
        assert!(w.z < 0.0);

        let before = world.rotation(h).unwrap();
        world.step(0.1);
        assert_ne!(world.rotation(h).unwrap(), before);
    }

    #[test]
    fn test_remove_keeps_other_handles_valid() {
        let mut world = world();
        let a = world.add_body(&BodyDesc::sphere(Vec3::X, 0.1, 1.0));
        let b = world.add_body(&BodyDesc::sphere(Vec3::Y, 0.1, 1.0));
        let c = world.add_body(&BodyDesc::sphere(Vec3::Z, 0.1, 1.0));

        assert!(world.remove_body(a));
        assert!(!world.remove_body(a));
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.position(b), Some(Vec3::Y));
        assert_eq!(world.position(c), Some(Vec3::Z));
        assert_eq!(world.position(a), None);
    }

    #[test]
    fn test_removed_handle_mutators_are_noops() {
        let mut world = world();
        let h = world.add_body(&BodyDesc::sphere(Vec3::ZERO, 0.1, 1.0));
        world.remove_body(h);
        world.set_position(h, Vec3::ONE);
        world.apply_impulse(h, Vec3::ONE, Vec3::ZERO);
        world.step(0.1);
        assert_eq!(world.body_count(), 0);
    }
}
