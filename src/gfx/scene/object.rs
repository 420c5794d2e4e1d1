use cgmath::{Matrix4, SquareMatrix};
use wgpu::{util::DeviceExt, Device};

use super::vertex::Vertex3D;
use crate::{
    assets::model::{MeshData, ModelData},
    gfx::resources::material::{MaterialId, MaterialManager},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Per-object model matrix uniform
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
}

impl From<Matrix4<f32>> for TransformUniform {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self {
            model: matrix.into(),
        }
    }
}

/// Creates the layout of the per-object transform bind group
pub fn transform_bind_group_layout(device: &Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_vertex(binding_types::uniform())
        .create(device, "Transform Bind Group Layout")
}

pub struct Mesh {
    pub name: String,
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
    pub vertex_count: u32,
    pub material_id: Option<MaterialId>,
}

impl Mesh {
    pub fn new(positions: &[f32], normals: &[f32], indices: Vec<u32>) -> Self {
        let vertices: Vec<Vertex3D> = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .map(|(p, n)| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
            })
            .collect();

        Self {
            name: String::new(),
            index_count: indices.len() as u32,
            vertex_count: vertices.len() as u32,
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            material_id: None,
        }
    }

    pub fn from_data(data: &MeshData, material_id: Option<MaterialId>) -> Self {
        let mut mesh = Self::new(&data.positions, &data.normals, data.indices.clone());
        mesh.name = data.name.clone();
        mesh.material_id = material_id;
        mesh
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    fn init_gpu_resources(&mut self, device: &Device) {
        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Vertex Buffer: {}", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Index Buffer: {}", self.name)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

// GPU resources struct to hold the transform uniform and its bind group
pub struct ObjectGpuResources {
    pub transform_buffer: UniformBuffer<TransformUniform>,
    pub transform_bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>, // cgmath 4x4 transformation matrix
    pub gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    /// Create a new Object with identity transformation
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            name: String::new(),
            meshes,
            transform: Matrix4::identity(),
            gpu_resources: None,
        }
    }

    /// Builds an object from loaded model data. `material_ids` maps the
    /// model's material indices to IDs in the material manager.
    pub fn from_model(model: &ModelData, material_ids: &[MaterialId]) -> Self {
        let meshes = model
            .meshes
            .iter()
            .map(|data| {
                let material_id = data.material.and_then(|i| material_ids.get(i)).cloned();
                Mesh::from_data(data, material_id)
            })
            .collect();

        let mut object = Self::new(meshes);
        object.name = model.name.clone();
        object
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu_resources.is_some() && self.meshes.iter().all(Mesh::is_uploaded)
    }

    pub fn init_gpu_resources(&mut self, device: &Device, transform_layout: &BindGroupLayoutWithDesc) {
        for mesh in self.meshes.iter_mut() {
            mesh.init_gpu_resources(device);
        }

        let transform_buffer =
            UniformBuffer::new(device, "Transform", TransformUniform::from(self.transform));
        let transform_bind_group = BindGroupBuilder::new(transform_layout)
            .resource(transform_buffer.binding_resource())
            .create(device, "Transform Bind Group");

        log::debug!(
            "Uploaded '{}': {} meshes, {} vertices",
            self.name,
            self.meshes.len(),
            self.meshes.iter().map(|m| m.vertex_count).sum::<u32>()
        );

        self.gpu_resources = Some(ObjectGpuResources {
            transform_buffer,
            transform_bind_group,
        });
    }

    /// Sync the transformation matrix to the GPU if resources exist
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        let transform = self.transform;
        if let Some(gpu_resources) = &mut self.gpu_resources {
            gpu_resources
                .transform_buffer
                .write(queue, TransformUniform::from(transform));
        }
    }

    /// Get the transform bind group for rendering
    pub fn get_transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }
}

/// Draw helpers on a render pass
///
/// Bind group 1 holds the object transform, bind group 2 the material.
pub trait DrawObject {
    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_object(
        &mut self,
        object: &Object,
        materials: &MaterialManager,
        material_override: Option<&str>,
    );
}

impl DrawObject for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_object(
        &mut self,
        object: &Object,
        materials: &MaterialManager,
        material_override: Option<&str>,
    ) {
        let Some(transform_bind_group) = object.get_transform_bind_group() else {
            return;
        };
        self.set_bind_group(1, transform_bind_group, &[]);

        for mesh in &object.meshes {
            let material_id = material_override.or(mesh.material_id.as_deref());
            let material = materials.get_material_for_object(material_id);
            let Some(material_bind_group) = material.get_bind_group() else {
                continue;
            };
            self.set_bind_group(2, material_bind_group, &[]);
            self.draw_mesh(mesh);
        }
    }
}
