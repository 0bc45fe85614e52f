//! End-to-end tree generation: functions, skeleton, mesher and exports

use std::collections::HashMap;

use mtree::functions::{BranchFunction, GrowthFunction, TrunkFunction};
use mtree::mesh::{Mesh, attributes, obj};
use mtree::mesher::{ManifoldMesher, TreeMesher};
use mtree::pivot;
use mtree::presets::TreePreset;
use mtree::property::PropertyWrapper;
use mtree::skeleton::Tree;
use mtree::{Engine, GenerationConfig};

fn reference_tree(seed: i32) -> Tree {
    let mut branches = BranchFunction { seed, ..Default::default() };
    branches.distribution.density = 2.0;
    branches.start_angle = PropertyWrapper::constant(45.0);

    let mut trunk = TrunkFunction {
        seed,
        length: 14.0,
        start_radius: 0.3,
        end_radius: 0.05,
        ..Default::default()
    };
    trunk.add_child(branches);

    let mut tree = Tree::new();
    tree.set_trunk_function(trunk);
    tree.execute_functions().unwrap();
    tree
}

fn edge_face_counts(mesh: &Mesh) -> HashMap<(u32, u32), usize> {
    let mut counts = HashMap::new();
    for polygon in &mesh.polygons {
        let corners: Vec<u32> = if polygon[2] == polygon[3] { polygon[..3].to_vec() } else { polygon.to_vec() };
        for i in 0..corners.len() {
            let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
            *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }
    counts
}

#[test]
fn test_reference_tree_mesh() {
    let tree = reference_tree(42);
    let mesh = ManifoldMesher::new(32, 4).mesh_tree(&tree).unwrap();

    assert!(mesh.vertex_count() > 0);
    assert_eq!(mesh.get_polygons().len() % 4, 0);
    assert!(mesh.indices_valid());
    assert!(mesh.has_float_attribute(attributes::RADIUS));
    assert!(mesh.has_vector3_attribute(attributes::DIRECTION));
    assert_eq!(mesh.get_float_attribute(attributes::RADIUS).unwrap().len(), mesh.vertex_count());
    assert!(mesh.get_vertices().iter().all(|v| v.is_finite()));
    assert!(tree.skeleton().node_count() > 42);
}

#[test]
fn test_reference_tree_phyllotaxis() {
    let n = 8;
    let mesh = ManifoldMesher::new(n, 0).mesh_tree(&reference_tree(42)).unwrap();
    let angles = mesh.get_float_attribute(attributes::PHYLLOTAXIS_ANGLE).unwrap();
    assert_eq!(angles.len(), mesh.vertex_count());
    assert!(angles.iter().all(|&a| (0.0..std::f32::consts::TAU).contains(&a)));
    // Trunk rings come first
    assert!(angles[..n].iter().all(|&a| a.abs() < 1e-5));
    assert!(angles[n..2 * n].iter().all(|&a| (a - 2.399_963).abs() < 1e-4));
    assert!(mesh.has_float_attribute(attributes::SMOOTH_AMOUNT));
}

#[test]
fn test_reference_tree_is_closed_manifold() {
    let mesh = ManifoldMesher::new(8, 2).mesh_tree(&reference_tree(3)).unwrap();
    assert!(edge_face_counts(&mesh).values().all(|&count| count == 2));
}

#[test]
fn test_same_seed_same_vertices() {
    let mesher = ManifoldMesher::default();
    let a = mesher.mesh_tree(&reference_tree(9)).unwrap();
    let b = mesher.mesh_tree(&reference_tree(9)).unwrap();
    let c = mesher.mesh_tree(&reference_tree(10)).unwrap();
    assert_eq!(a.get_vertices(), b.get_vertices());
    assert_ne!(a.get_vertices(), c.get_vertices());
}

#[test]
fn test_grown_tree_meshes() {
    let mut branches = BranchFunction::default();
    branches.add_child(GrowthFunction { iterations: 3, ..Default::default() });
    let mut trunk = TrunkFunction::default();
    trunk.add_child(branches);
    let mut tree = Tree::new();
    tree.set_trunk_function(trunk);
    tree.execute_functions().unwrap();

    let mesh = ManifoldMesher::default().mesh_tree(&tree).unwrap();
    assert!(mesh.indices_valid());
    assert!(edge_face_counts(&mesh).values().all(|&count| count == 2));
}

#[test]
fn test_presets_build_different_trees() {
    let mesher = ManifoldMesher::default();
    let height = |preset: TreePreset| {
        let mut tree = preset.build_tree(42);
        tree.execute_functions().unwrap();
        mesher.mesh_tree(&tree).unwrap().bounding_box().unwrap().size().z
    };
    assert!(height(TreePreset::pine()) > height(TreePreset::oak()));
}

#[test]
fn test_pivot_painter_from_tree_mesh() {
    let mesh = ManifoldMesher::default().mesh_tree(&reference_tree(42)).unwrap();
    let colors = pivot::pack_unity_vertex_colors(&mesh).unwrap();
    assert_eq!(colors.len(), mesh.vertex_count());
    assert!(colors.iter().all(|c| c.iter().all(|v| (0.0..=1.0).contains(v))));

    let pivots = pivot::create_pivot_index_pixels(&mesh, 64).unwrap();
    // Trunk pivot sits at the origin with depth 0
    assert_eq!(pivots.pixel(0, 0), Some([0.0, 0.0, 0.0, 0.0]));
    let extents = pivot::create_xvector_extent_pixels(&mesh, 64).unwrap();
    let trunk = extents.pixel(0, 0).unwrap();
    assert!(trunk[2] > 0.9);
}

#[test]
fn test_obj_export() {
    let mesh = Engine::new(GenerationConfig { preset: "WILLOW".to_string(), ..Default::default() })
        .generate_tree()
        .unwrap();
    let mut out = Vec::new();
    obj::write_obj(&mut out, &mesh).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), mesh.vertex_count());
    assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), mesh.polygon_count());
}

#[test]
fn test_config_file_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    let config = GenerationConfig {
        seed: 5,
        preset: "PINE".to_string(),
        radial_resolution: 5,
        ..Default::default()
    };
    config.save(&path).unwrap();

    let loaded = GenerationConfig::load(&path).unwrap();
    let a = Engine::new(loaded).generate_tree().unwrap();
    let b = Engine::new(config).generate_tree().unwrap();
    assert_eq!(a.get_vertices(), b.get_vertices());
}
