use criterion::{criterion_group, criterion_main, Criterion, black_box};

use mtree::functions::{BranchFunction, TrunkFunction};
use mtree::leaf::{LeafShapeGenerator, get_leaf_preset};
use mtree::mesher::{ManifoldMesher, TreeMesher};
use mtree::presets::TreePreset;
use mtree::skeleton::Tree;

fn reference_tree() -> Tree {
    let mut branches = BranchFunction::default();
    branches.distribution.density = 2.0;
    let mut trunk = TrunkFunction { length: 14.0, ..Default::default() };
    trunk.add_child(branches);
    let mut tree = Tree::new();
    tree.set_trunk_function(trunk);
    tree
}

fn bench_execute_functions(c: &mut Criterion) {
    c.bench_function("execute_functions", |b| {
        let mut tree = reference_tree();
        b.iter(|| tree.execute_functions());
    });
}

fn bench_mesh_tree(c: &mut Criterion) {
    let mut tree = reference_tree();
    if tree.execute_functions().is_err() {
        return;
    }

    let mesher = ManifoldMesher::new(32, 4);
    c.bench_function("mesh_tree_32_4", |b| {
        b.iter(|| mesher.mesh_tree(black_box(&tree)));
    });
}

fn bench_preset_tree(c: &mut Criterion) {
    let preset = TreePreset::oak();
    let mesher = ManifoldMesher::default();
    c.bench_function("oak_preset_end_to_end", |b| {
        b.iter(|| {
            let mut tree = preset.build_tree(black_box(42));
            tree.execute_functions().ok();
            mesher.mesh_tree(&tree)
        });
    });
}

fn bench_leaf(c: &mut Criterion) {
    let mut plain = LeafShapeGenerator::default();
    if let Some(preset) = get_leaf_preset("Maple") {
        preset.apply(&mut plain);
    }
    plain.enable_venation = false;
    let mut veined = plain.clone();
    veined.enable_venation = true;

    c.bench_function("leaf_maple", |b| {
        b.iter(|| black_box(&plain).generate());
    });
    c.bench_function("leaf_maple_venation", |b| {
        b.iter(|| black_box(&veined).generate());
    });
}

criterion_group!(
    benches,
    bench_execute_functions,
    bench_mesh_tree,
    bench_preset_tree,
    bench_leaf,
);
criterion_main!(benches);
