//! MTL material loading

use std::path::Path;

use crate::{
    error::{Result, StudioError},
    gfx::resources::material::Material,
};

/// Converts an MTL entry into a PBR material
///
/// Diffuse becomes the base colour and dissolve its alpha. Roughness comes
/// from the PBR extension `Pr` when present, otherwise from the Phong
/// shininess. `Pm` and `Ke` map to metallic and emissive.
pub fn material_from_mtl(mtl: &tobj::Material, index: usize) -> Material {
    let name = if mtl.name.is_empty() {
        format!("material_{}", index)
    } else {
        mtl.name.clone()
    };

    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    let alpha = mtl.dissolve.unwrap_or(1.0);

    let param = |key: &str| -> Option<f32> { mtl.unknown_param.get(key)?.trim().parse().ok() };

    let roughness = param("Pr")
        .unwrap_or_else(|| 1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0));
    let metallic = param("Pm").unwrap_or(0.0);

    let mut material = Material::new(&name, [diffuse[0], diffuse[1], diffuse[2], alpha], metallic, roughness);

    if let Some(ke) = mtl.unknown_param.get("Ke") {
        let values: Vec<f32> = ke
            .split_whitespace()
            .filter_map(|v| v.parse().ok())
            .collect();
        if let [r, g, b] = values[..] {
            material = material.with_emission(r, g, b);
        }
    }

    material
}

/// Loads one material from an MTL library
///
/// With `name` the matching entry is returned, otherwise the first one.
pub fn load_material(path: &Path, name: Option<&str>) -> Result<Material> {
    let (materials, _) = tobj::load_mtl(path).map_err(|source| StudioError::MaterialLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let selected = match name.filter(|n| !n.is_empty()) {
        Some(name) => materials
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name)
            .ok_or_else(|| StudioError::MaterialNotFound {
                path: path.to_path_buf(),
                name: name.to_string(),
            })?,
        None => materials
            .iter()
            .enumerate()
            .next()
            .ok_or_else(|| StudioError::EmptyMaterialLibrary {
                path: path.to_path_buf(),
            })?,
    };

    let material = material_from_mtl(selected.1, selected.0);
    log::info!(
        "Loaded material '{}' from {}",
        material.name,
        path.display()
    );
    Ok(material)
}

/// Names of all entries in an MTL library, for the material picker
pub fn list_materials(path: &Path) -> Result<Vec<String>> {
    let (materials, _) = tobj::load_mtl(path).map_err(|source| StudioError::MaterialLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(materials.into_iter().map(|m| m.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::model::tests::{write_fixture, CRATE_MTL};

    #[test]
    fn first_material_is_the_default_pick() {
        let dir = write_fixture("mtl_first", &[("crate.mtl", CRATE_MTL)]);
        let material = load_material(&dir.join("crate.mtl"), None).unwrap();

        assert_eq!(material.name, "Wood");
        assert_eq!(material.base_color, [0.6, 0.4, 0.2, 1.0]);
        assert!((material.roughness - 0.5).abs() < 1e-6);
        assert_eq!(material.metallic, 0.0);
    }

    #[test]
    fn named_material_with_pbr_extension() {
        let dir = write_fixture("mtl_named", &[("crate.mtl", CRATE_MTL)]);
        let material = load_material(&dir.join("crate.mtl"), Some("Gold")).unwrap();

        assert_eq!(material.name, "Gold");
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }

    #[test]
    fn unknown_name_is_reported() {
        let dir = write_fixture("mtl_unknown", &[("crate.mtl", CRATE_MTL)]);
        let result = load_material(&dir.join("crate.mtl"), Some("Marble"));
        assert!(matches!(result, Err(StudioError::MaterialNotFound { ref name, .. }) if name == "Marble"));
    }

    #[test]
    fn listing_keeps_file_order() {
        let dir = write_fixture("mtl_list", &[("crate.mtl", CRATE_MTL)]);
        let names = list_materials(&dir.join("crate.mtl")).unwrap();
        assert_eq!(names, vec!["Wood".to_string(), "Gold".to_string()]);
    }

    #[test]
    fn missing_library_is_a_load_error() {
        let result = load_material(Path::new("/nope/none.mtl"), None);
        assert!(matches!(result, Err(StudioError::MaterialLoad { .. })));
    }
}
