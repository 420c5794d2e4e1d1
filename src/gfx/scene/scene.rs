use std::path::PathBuf;

use cgmath::{InnerSpace, Matrix4, Rad, Vector3};
use wgpu::Device;

use crate::{
    assets::model::{Bounds, ModelData},
    gfx::{
        camera::{camera_utils::CameraManager, ModelRotation},
        resources::{
            global_bindings::LightConfig,
            material::{Material, MaterialId, MaterialManager},
        },
    },
    wgpu_utils::binding_builder::BindGroupLayoutWithDesc,
};

use super::object::Object;

/// Material ID prefix for entries that came with the loaded model
const MODEL_MATERIAL_PREFIX: &str = "model:";
/// Material ID of the user-picked material applied to the whole model
const OVERRIDE_MATERIAL_ID: &str = "override";

/// Bind group layouts objects and materials are uploaded against
pub struct SceneLayouts<'a> {
    pub transform: &'a BindGroupLayoutWithDesc,
    pub material: &'a BindGroupLayoutWithDesc,
}

/// What the UI shows about the loaded model
#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub name: String,
    pub source: PathBuf,
    pub bounds: Bounds,
    pub triangle_count: usize,
    pub vertex_count: usize,
}

/// Scene holding the subject model, its materials, the camera and the light
pub struct Scene {
    pub camera_manager: CameraManager,
    pub model: Option<Object>,
    pub model_summary: Option<ModelSummary>,
    pub model_rotation: ModelRotation,
    pub material_manager: MaterialManager, // Centralized material storage
    /// Name of the picked material while it overrides the model's own
    pub material_override: Option<String>,
    pub light: LightConfig,
    /// Keeps the key light above and to the left of the camera
    pub light_follows_camera: bool,
    pub background: [f32; 4],
    materials_dirty: bool,
}

impl Scene {
    /// Creates a new scene with the given camera manager
    pub fn new(camera_manager: CameraManager, background: [f32; 4]) -> Self {
        Self {
            camera_manager,
            model: None,
            model_summary: None,
            model_rotation: ModelRotation::default(),
            material_manager: MaterialManager::new(), // Initialize with default material
            material_override: None,
            light: LightConfig::default(),
            light_follows_camera: true,
            background,
            materials_dirty: true,
        }
    }

    /// Replaces the subject model and frames the camera on it
    ///
    /// Materials of the previous model are dropped; a picked override
    /// material stays active.
    pub fn set_model(&mut self, model: ModelData) {
        self.material_manager.remove_prefixed(MODEL_MATERIAL_PREFIX);

        let material_ids: Vec<MaterialId> = model
            .materials
            .iter()
            .enumerate()
            .map(|(i, material)| {
                let id = format!("{}{}", MODEL_MATERIAL_PREFIX, i);
                self.material_manager.insert(id.clone(), material.clone());
                id
            })
            .collect();

        let mut object = Object::from_model(&model, &material_ids);
        object.transform = self.model_transform();

        log::info!(
            "Scene model '{}': {} meshes, {} triangles, {} materials",
            model.name,
            object.meshes.len(),
            model.triangle_count(),
            material_ids.len()
        );

        self.model_summary = Some(ModelSummary {
            name: model.name.clone(),
            source: model.source.clone(),
            bounds: model.bounds,
            triangle_count: model.triangle_count(),
            vertex_count: model.vertex_count(),
        });
        self.model = Some(object);
        self.materials_dirty = true;
        self.frame_model();
    }

    pub fn clear_model(&mut self) {
        self.material_manager.remove_prefixed(MODEL_MATERIAL_PREFIX);
        self.model = None;
        self.model_summary = None;
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Applies `material` to every mesh of the model
    pub fn set_material(&mut self, material: Material) {
        log::info!("Material override: {}", material.name);
        self.material_override = Some(material.name.clone());
        self.material_manager.insert(OVERRIDE_MATERIAL_ID, material);
        self.materials_dirty = true;
    }

    /// Goes back to the materials the model was loaded with
    pub fn clear_material_override(&mut self) {
        self.material_manager.remove(OVERRIDE_MATERIAL_ID);
        self.material_override = None;
    }

    /// Material ID the renderer should use instead of the per-mesh ones
    pub fn active_override(&self) -> Option<&str> {
        self.material_override
            .as_ref()
            .map(|_| OVERRIDE_MATERIAL_ID)
    }

    pub fn set_model_rotation(&mut self, yaw: f32, pitch: f32) {
        self.model_rotation.set(yaw, pitch);
        self.sync_model_transform();
    }

    fn sync_model_transform(&mut self) {
        let transform = self.model_transform();
        if let Some(object) = &mut self.model {
            object.transform = transform;
        }
    }

    /// Model yaw about the world up axis, applied after the pitch tilt
    pub fn model_transform(&self) -> Matrix4<f32> {
        Matrix4::from_angle_z(Rad(self.model_rotation.yaw))
            * Matrix4::from_angle_x(Rad(self.model_rotation.pitch))
    }

    /// Points the camera at the model and fits it in view
    pub fn frame_model(&mut self) {
        if let Some(summary) = &self.model_summary {
            let bounds = summary.bounds;
            self.camera_manager
                .camera
                .frame_bounds(bounds.center(), bounds.radius());
        }
    }

    pub fn reset_camera(&mut self) {
        self.camera_manager.camera.reset_to_default();
        self.frame_model();
    }

    /// Updates the scene (camera matrices, model transform)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
        self.sync_model_transform();
    }

    /// Uploads whatever is not on the GPU yet and syncs the model transform
    ///
    /// Must be called after the GPU context is available and before rendering.
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue, layouts: &SceneLayouts) {
        // Mouse drags change `model_rotation` directly
        self.sync_model_transform();
        if let Some(object) = &mut self.model {
            if !object.is_uploaded() {
                object.init_gpu_resources(device, layouts.transform);
            }
            object.update_transform(queue);
        }

        if self.materials_dirty {
            self.material_manager
                .update_all_gpu_resources(device, queue, layouts.material);
            self.materials_dirty = false;
        }
    }

    /// Light for the current camera position
    pub fn light_for_camera(&self) -> LightConfig {
        if !self.light_follows_camera {
            return self.light;
        }

        let camera = &self.camera_manager.camera;
        let forward = camera.forward();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward).normalize();
        let direction = (camera.direction() - right * 0.5 + up * 0.6).normalize();

        LightConfig {
            direction: direction.into(),
            ..self.light
        }
    }

    /// Gets statistics about the scene
    pub fn statistics(&self) -> SceneStatistics {
        let (mesh_count, total_triangles, total_vertices) = match &self.model {
            Some(object) => (
                object.meshes.len(),
                object.meshes.iter().map(|m| m.index_count / 3).sum::<u32>(),
                object.meshes.iter().map(|m| m.vertex_count).sum::<u32>(),
            ),
            None => (0, 0, 0),
        };

        SceneStatistics {
            model_name: self.model_summary.as_ref().map(|s| s.name.clone()),
            mesh_count,
            material_count: self.material_manager.len(),
            total_triangles,
            total_vertices,
            size: self
                .model_summary
                .as_ref()
                .map(|s| s.bounds.extent())
                .unwrap_or(Vector3::new(0.0, 0.0, 0.0)),
        }
    }
}

/// Scene statistics for the UI
#[derive(Debug, Clone)]
pub struct SceneStatistics {
    pub model_name: Option<String>,
    pub mesh_count: usize,
    pub material_count: usize,
    pub total_triangles: u32,
    pub total_vertices: u32,
    pub size: Vector3<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::model::MeshData,
        config::StudioConfig,
    };
    use cgmath::{SquareMatrix, Transform, Point3, Zero};

    fn scene() -> Scene {
        Scene::new(CameraManager::from_config(&StudioConfig::default()), [0.0; 4])
    }

    fn model(materials: Vec<Material>, half_size: f32) -> ModelData {
        let s = half_size;
        ModelData {
            name: "Quad".into(),
            source: "quad.obj".into(),
            meshes: vec![MeshData {
                name: "quad".into(),
                positions: vec![-s, -s, 0.0, s, -s, 0.0, s, s, 0.0, -s, s, 0.0],
                normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
                indices: vec![0, 1, 2, 0, 2, 3],
                material: Some(0),
            }],
            materials,
            bounds: Bounds {
                min: Vector3::new(-s, -s, 0.0),
                max: Vector3::new(s, s, 0.0),
            },
            original_center: Vector3::zero(),
        }
    }

    #[test]
    fn loading_a_model_replaces_its_materials() {
        let mut scene = scene();
        scene.set_model(model(vec![Material::new("Wood", [0.5; 4], 0.0, 0.5)], 10.0));
        assert!(scene.material_manager.get_material("model:0").is_some());

        scene.set_model(model(Vec::new(), 10.0));
        assert!(scene.material_manager.get_material("model:0").is_none());
        assert_eq!(scene.statistics().total_triangles, 2);
        assert_eq!(scene.statistics().mesh_count, 1);
    }

    #[test]
    fn override_survives_model_change() {
        let mut scene = scene();
        scene.set_material(Material::new("Gold", [1.0, 0.8, 0.1, 1.0], 1.0, 0.2));
        scene.set_model(model(Vec::new(), 10.0));

        assert_eq!(scene.active_override(), Some("override"));
        assert_eq!(scene.material_override.as_deref(), Some("Gold"));

        scene.clear_material_override();
        assert_eq!(scene.active_override(), None);
        assert!(scene.material_manager.get_material("override").is_none());
    }

    #[test]
    fn framing_fits_the_model() {
        let mut scene = scene();
        scene.set_model(model(Vec::new(), 100.0));

        let camera = &scene.camera_manager.camera;
        assert_eq!(camera.target, Vector3::zero());
        assert!(camera.distance > 100.0 * 2f32.sqrt());
        assert!(camera.distance <= camera.bounds.max_distance);
    }

    #[test]
    fn model_transform_rotates_about_origin() {
        let mut scene = scene();
        assert_eq!(scene.model_transform(), Matrix4::identity());

        scene.set_model_rotation(std::f32::consts::FRAC_PI_2, 0.0);
        let moved = scene.model_transform().transform_point(Point3::new(1.0, 0.0, 0.0));
        assert!((moved.x).abs() < 1e-6);
        assert!((moved.y - 1.0).abs() < 1e-6);

        // Pitch is clamped like the camera's
        scene.set_model_rotation(0.0, 10.0);
        assert!(scene.model_rotation.pitch <= ModelRotation::PITCH_LIMIT);
    }

    #[test]
    fn rotation_reaches_the_object_without_update() {
        let mut scene = scene();
        scene.set_model(model(Vec::new(), 10.0));
        scene.set_model_rotation(std::f32::consts::FRAC_PI_2, 0.0);

        let object = scene.model.as_ref().unwrap();
        assert_ne!(object.transform, Matrix4::identity());
        assert_eq!(object.transform, scene.model_transform());

        // A model loaded after rotating keeps the rotation
        scene.set_model(model(Vec::new(), 5.0));
        assert_eq!(scene.model.as_ref().unwrap().transform, scene.model_transform());
    }

    #[test]
    fn light_sits_on_the_camera_side() {
        let scene = scene();
        let light: Vector3<f32> = scene.light_for_camera().direction.into();
        assert!((light.magnitude() - 1.0).abs() < 1e-5);
        assert!(light.dot(scene.camera_manager.camera.direction()) > 0.0);
    }

    #[test]
    fn clearing_leaves_empty_statistics() {
        let mut scene = scene();
        scene.set_model(model(Vec::new(), 1.0));
        scene.clear_model();

        let stats = scene.statistics();
        assert!(stats.model_name.is_none());
        assert_eq!(stats.total_vertices, 0);
        assert!(!scene.has_model());
    }
}
