//! OBJ model loading
//!
//! Models are read with `tobj`, converted into the Z-up world, scaled, and
//! recentred so the centre of their bounds sits at the origin. Model
//! rotation then turns the model about its own centre.

use std::path::{Path, PathBuf};

use cgmath::{InnerSpace, Vector3, Zero};

use crate::{
    assets::material::material_from_mtl,
    config::{ImportSettings, UpAxis},
    error::{Result, StudioError},
    gfx::resources::material::Material,
};

/// Axis-aligned bounds of a model in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Bounds {
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut points = positions
            .chunks_exact(3)
            .map(|p| Vector3::new(p[0], p[1], p[2]));
        let first = points.next()?;

        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        });
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Radius of the sphere around `center()` that encloses the box
    pub fn radius(&self) -> f32 {
        self.extent().magnitude() * 0.5
    }

    fn translated(&self, offset: Vector3<f32>) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// CPU side mesh, positions and normals interleaved as xyz triples
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// Index into [`ModelData::materials`]
    pub material: Option<usize>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A loaded model ready to be uploaded to the GPU
#[derive(Debug)]
pub struct ModelData {
    pub name: String,
    pub source: PathBuf,
    pub meshes: Vec<MeshData>,
    /// Materials from the model's own MTL library, if it has one
    pub materials: Vec<Material>,
    /// Bounds after recentring; centred on the origin
    pub bounds: Bounds,
    /// Where the bounds centre was before recentring
    pub original_center: Vector3<f32>,
}

impl ModelData {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(MeshData::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(MeshData::vertex_count).sum()
    }
}

/// Loads an OBJ file and its MTL library
pub fn load_model(path: &Path, import: &ImportSettings) -> Result<ModelData> {
    log::info!("Loading model {}", path.display());

    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| StudioError::ModelLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|err| {
        log::debug!("No MTL library for {}: {}", path.display(), err);
        Vec::new()
    });
    let materials: Vec<Material> = materials
        .iter()
        .enumerate()
        .map(|(i, mtl)| material_from_mtl(mtl, i))
        .collect();

    let mut meshes: Vec<MeshData> = models
        .into_iter()
        .filter(|m| m.mesh.indices.len() >= 3)
        .map(|m| {
            let mesh = m.mesh;
            let positions = convert_positions(&mesh.positions, import);
            let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
                convert_normals(&mesh.normals, import.up_axis)
            } else {
                calculate_smooth_normals(&positions, &mesh.indices)
            };
            MeshData {
                name: m.name,
                positions,
                normals,
                indices: mesh.indices,
                material: mesh.material_id.filter(|id| *id < materials.len()),
            }
        })
        .collect();

    let all_positions: Vec<f32> = meshes
        .iter()
        .flat_map(|m| m.positions.iter().copied())
        .collect();
    let bounds = match Bounds::from_positions(&all_positions) {
        Some(bounds) if !meshes.is_empty() => bounds,
        _ => {
            return Err(StudioError::EmptyModel {
                path: path.to_path_buf(),
            })
        }
    };

    let center = bounds.center();
    for mesh in meshes.iter_mut() {
        for p in mesh.positions.chunks_exact_mut(3) {
            p[0] -= center.x;
            p[1] -= center.y;
            p[2] -= center.z;
        }
    }

    let name = meshes
        .iter()
        .map(|m| m.name.as_str())
        .find(|n| !n.is_empty())
        .map(str::to_owned)
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "model".to_string());

    let model = ModelData {
        name,
        source: path.to_path_buf(),
        meshes,
        materials,
        bounds: bounds.translated(-center),
        original_center: center,
    };

    log::info!(
        "Loaded model '{}': {} meshes, {} triangles, radius {:.2}",
        model.name,
        model.meshes.len(),
        model.triangle_count(),
        model.bounds.radius()
    );

    Ok(model)
}

fn to_world(x: f32, y: f32, z: f32, up_axis: UpAxis) -> [f32; 3] {
    match up_axis {
        // +90 degrees about X keeps handedness: +Y becomes +Z
        UpAxis::Y => [x, -z, y],
        UpAxis::Z => [x, y, z],
    }
}

fn convert_positions(positions: &[f32], import: &ImportSettings) -> Vec<f32> {
    positions
        .chunks_exact(3)
        .flat_map(|p| {
            let [x, y, z] = to_world(p[0], p[1], p[2], import.up_axis);
            [x * import.scale, y * import.scale, z * import.scale]
        })
        .collect()
}

fn convert_normals(normals: &[f32], up_axis: UpAxis) -> Vec<f32> {
    normals
        .chunks_exact(3)
        .flat_map(|n| to_world(n[0], n[1], n[2], up_axis))
        .collect()
}

/// Area weighted vertex normals for meshes that ship without any
pub fn calculate_smooth_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut accumulated = vec![Vector3::<f32>::zero(); vertex_count];
    let vertex = |i: usize| Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]);

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
            continue;
        }

        // Unnormalized cross product weights by triangle area
        let face_normal = (vertex(i1) - vertex(i0)).cross(vertex(i2) - vertex(i0));
        for i in [i0, i1, i2] {
            accumulated[i] += face_normal;
        }
    }

    accumulated
        .into_iter()
        .flat_map(|n| {
            let n = if n.magnitude2() > 0.0 {
                n.normalize()
            } else {
                Vector3::unit_z()
            };
            [n.x, n.y, n.z]
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes `files` into a fresh temporary directory
    pub(crate) fn write_fixture(tag: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "icon_studio_{}_{}_{:?}",
            tag,
            std::process::id(),
            std::thread::current().id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, contents) in files {
            std::fs::write(dir.join(name), contents).unwrap();
        }
        dir
    }

    pub(crate) const CRATE_OBJ: &str = "mtllib crate.mtl
o Crate
v -1.0 0.0 -1.0
v 1.0 0.0 -1.0
v 1.0 4.0 -1.0
v -1.0 4.0 1.0
usemtl Gold
f 1 2 3
f 1 3 4
";

    pub(crate) const CRATE_MTL: &str = "newmtl Wood
Kd 0.6 0.4 0.2
Ns 64
d 1.0
newmtl Gold
Kd 1.0 0.8 0.1
Ns 128
Pm 1.0
";

    fn z_up() -> ImportSettings {
        ImportSettings {
            up_axis: UpAxis::Z,
            scale: 1.0,
        }
    }

    #[test]
    fn loads_obj_with_materials_and_computed_normals() {
        let dir = write_fixture("load", &[("crate.obj", CRATE_OBJ), ("crate.mtl", CRATE_MTL)]);
        let model = load_model(&dir.join("crate.obj"), &z_up()).unwrap();

        assert_eq!(model.name, "Crate");
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(model.materials.len(), 2);

        let mesh = &model.meshes[0];
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(model.materials[mesh.material.unwrap()].name, "Gold");
        for n in mesh.normals.chunks_exact(3) {
            let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((length - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn model_is_recentred_on_its_bounds() {
        let dir = write_fixture("center", &[("crate.obj", CRATE_OBJ), ("crate.mtl", CRATE_MTL)]);
        let model = load_model(&dir.join("crate.obj"), &z_up()).unwrap();

        assert!((model.bounds.center()).magnitude() < 1e-5);
        assert!((model.original_center - Vector3::new(0.0, 2.0, 0.0)).magnitude() < 1e-5);
        assert!((model.bounds.extent() - Vector3::new(2.0, 4.0, 2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn y_up_models_are_turned_z_up() {
        let dir = write_fixture("yup", &[("crate.obj", CRATE_OBJ), ("crate.mtl", CRATE_MTL)]);
        let import = ImportSettings {
            up_axis: UpAxis::Y,
            scale: 10.0,
        };
        let model = load_model(&dir.join("crate.obj"), &import).unwrap();

        // 4 units tall along Y in the file, 40 units tall along Z in the world
        let extent = model.bounds.extent();
        assert!((extent.z - 40.0).abs() < 1e-4);
        assert!((extent.y - 20.0).abs() < 1e-4);
        assert!((extent.x - 20.0).abs() < 1e-4);
    }

    #[test]
    fn missing_mtl_is_tolerated() {
        let dir = write_fixture("nomtl", &[("lonely.obj", CRATE_OBJ)]);
        let model = load_model(&dir.join("lonely.obj"), &z_up()).unwrap();
        assert!(model.materials.is_empty());
        assert_eq!(model.meshes[0].material, None);
    }

    #[test]
    fn empty_model_is_an_error() {
        let dir = write_fixture("empty", &[("empty.obj", "o Nothing\nv 0 0 0\n")]);
        let result = load_model(&dir.join("empty.obj"), &z_up());
        assert!(matches!(result, Err(StudioError::EmptyModel { .. })));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let result = load_model(Path::new("/definitely/not/here.obj"), &z_up());
        assert!(matches!(result, Err(StudioError::ModelLoad { .. })));
    }

    #[test]
    fn smooth_normals_of_flat_quad_point_up() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let indices = [0, 1, 2, 0, 2, 3];
        let normals = calculate_smooth_normals(&positions, &indices);
        for n in normals.chunks_exact(3) {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn bounds_of_points() {
        let bounds = Bounds::from_positions(&[1.0, 2.0, 3.0, -1.0, 0.0, 5.0]).unwrap();
        assert_eq!(bounds.min, Vector3::new(-1.0, 0.0, 3.0));
        assert_eq!(bounds.max, Vector3::new(1.0, 2.0, 5.0));
        assert!((bounds.radius() - 3f32.sqrt()).abs() < 1e-6);
        assert!(Bounds::from_positions(&[]).is_none());
    }
}
