//! WGSL source and the GPU-side layouts it reads.

use bytemuck::{Pod, Zeroable};

pub const SHADER_SOURCE: &str = include_str!("shader.wgsl");

/// Point lights the shader reads per frame. Extra scene lights are dropped,
/// dimmest first.
pub const MAX_LIGHTS: usize = 16;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz = position, w = range
    pub position: [f32; 4],
    /// rgb = color, a = intensity
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    /// w = time in seconds
    pub camera_pos: [f32; 4],
    /// xyz = direction toward the light, w = intensity
    pub key_light: [f32; 4],
    pub ambient: [f32; 4],
    /// x = radius, y = glow, z = opacity, w = light count
    pub shell: [f32; 4],
    pub shell_color: [f32; 4],
    pub lights: [GpuLight; MAX_LIGHTS],
}

/// One sphere impostor, fed as a per-instance vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SphereInstance {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub emissive: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(module)
    }

    #[test]
    fn test_shader_validates() {
        let module = validate_wgsl(SHADER_SOURCE).unwrap();
        for entry in ["vs_sphere", "fs_sphere", "vs_shell", "fs_shell"] {
            assert!(
                module.entry_points.iter().any(|e| e.name == entry),
                "missing entry point {entry}"
            );
        }
    }

    #[test]
    fn test_layouts_match_wgsl() {
        // mat4 + 7 vec4 + 16 lights of 2 vec4 each
        assert_eq!(std::mem::size_of::<Uniforms>(), 64 + 7 * 16 + MAX_LIGHTS * 32);
        assert_eq!(std::mem::size_of::<SphereInstance>(), 32);
    }
}
