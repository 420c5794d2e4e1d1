//! Material system for PBR rendering
//!
//! Provides material definitions and centralized management with GPU resource handling.
//! Materials are stored in MaterialManager and meshes reference them by ID.

use std::collections::HashMap;
use std::fmt;
use wgpu::Device;

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    _padding: [f32; 3],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Creates the layout shared by every material bind group
pub fn material_bind_group_layout(device: &Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_fragment(binding_types::uniform())
        .create(device, "Material Bind Group Layout")
}

struct MaterialGpu {
    ubo: MaterialUBO,
    bind_group: wgpu::BindGroup,
}

/// Material definition with PBR properties
///
/// Contains material properties and GPU resources. Materials are stored
/// centrally in MaterialManager and shared between meshes.
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],

    // GPU resources - shared by all meshes using this material
    gpu: Option<MaterialGpu>,
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("base_color", &self.base_color)
            .field("metallic", &self.metallic)
            .field("roughness", &self.roughness)
            .field("emissive", &self.emissive)
            .field("uploaded", &self.gpu.is_some())
            .finish()
    }
}

impl Clone for Material {
    /// Clones the properties only; the copy uploads its own GPU resources.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            emissive: self.emissive,
            gpu: None,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            gpu: None,
        }
    }
}

impl Material {
    /// Creates a new material with basic PBR properties
    ///
    /// # Arguments
    /// * `name` - Unique name for this material
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            emissive: [0.0, 0.0, 0.0],
            gpu: None,
        }
    }

    /// Builder pattern: Set emissive color
    pub fn with_emission(mut self, r: f32, g: f32, b: f32) -> Self {
        self.emissive = [r, g, b];
        self
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            emissive: self.emissive,
            metallic: self.metallic,
            roughness: self.roughness,
            _padding: [0.0; 3],
        }
    }

    /// Updates GPU resources for this material
    ///
    /// Must be called after material properties change to sync with GPU.
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        let uniform = self.uniform();
        match &mut self.gpu {
            Some(gpu) => {
                gpu.ubo.write(queue, uniform);
            }
            None => {
                let ubo = MaterialUBO::new(device, &format!("Material: {}", self.name), uniform);
                let bind_group = BindGroupBuilder::new(layout)
                    .resource(ubo.binding_resource())
                    .create(device, &format!("Material Bind Group: {}", self.name));
                self.gpu = Some(MaterialGpu { ubo, bind_group });
            }
        }
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

/// Manages all materials of the scene
///
/// Centralized storage for all materials. Meshes reference materials by ID
/// rather than storing material data directly, enabling efficient sharing
/// of GPU resources between meshes.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialManager {
    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        let default_material_id = "default".to_string();
        let mut materials = HashMap::new();
        materials.insert(default_material_id.clone(), Material::default());

        Self {
            materials,
            default_material_id,
        }
    }

    /// Adds a material under `id`, replacing any material with that ID
    pub fn insert(&mut self, id: impl Into<MaterialId>, material: Material) {
        self.materials.insert(id.into(), material);
    }

    /// Removes a material; the default material cannot be removed
    pub fn remove(&mut self, id: &str) -> Option<Material> {
        if id == self.default_material_id {
            return None;
        }
        self.materials.remove(id)
    }

    /// Removes every material whose ID starts with `prefix`
    pub fn remove_prefixed(&mut self, prefix: &str) {
        let default_id = self.default_material_id.clone();
        self.materials
            .retain(|id, _| *id == default_id || !id.starts_with(prefix));
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_default_material(&self) -> &Material {
        &self.materials[&self.default_material_id]
    }

    /// Gets material for a mesh with fallback to default
    ///
    /// This is the main method used during rendering to get the appropriate
    /// material, handling cases where the mesh has no material assigned or
    /// the material doesn't exist.
    pub fn get_material_for_object(&self, material_id: Option<&str>) -> &Material {
        material_id
            .and_then(|id| self.get_material(id))
            .unwrap_or_else(|| self.get_default_material())
    }

    /// Lists all material IDs
    pub fn list_materials(&self) -> Vec<&MaterialId> {
        let mut ids: Vec<&MaterialId> = self.materials.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Updates GPU resources for all materials
    ///
    /// Should be called when the GPU context is available or when
    /// materials have been modified.
    pub fn update_all_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue, layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_are_clamped() {
        let material = Material::new("hot", [1.0, 0.0, 0.0, 1.0], 3.0, -1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }

    #[test]
    fn uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<MaterialUniform>() % 16, 0);
        let uniform = Material::default().with_emission(0.1, 0.2, 0.3).uniform();
        assert_eq!(uniform.emissive, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn lookup_falls_back_to_default() {
        let mut manager = MaterialManager::new();
        manager.insert("model:Wood", Material::new("Wood", [0.5; 4], 0.0, 0.5));

        assert_eq!(manager.get_material_for_object(Some("model:Wood")).name, "Wood");
        assert_eq!(manager.get_material_for_object(Some("missing")).name, "Default");
        assert_eq!(manager.get_material_for_object(None).name, "Default");
    }

    #[test]
    fn default_material_survives_removal() {
        let mut manager = MaterialManager::new();
        manager.insert("model:A", Material::default());
        manager.insert("model:B", Material::default());
        manager.insert("override", Material::default());

        manager.remove_prefixed("model:");
        assert!(manager.remove("default").is_none());

        assert_eq!(manager.list_materials(), vec!["default", "override"]);
    }
}
