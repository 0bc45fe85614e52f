//! Tree mesh generation utility
//!
//! Builds a tree from a preset, meshes it and writes a Wavefront OBJ file.
//!
//! Usage:
//!     generate_tree [OPTIONS] <OUTPUT.obj>
//!
//! Options:
//!     -p, --preset <NAME>     Tree preset: oak, pine, willow or random (default: oak)
//!     --seed <SEED>           Seed for every shape function (default: 42)
//!     --radial <N>            Vertices per branch ring (default: 8)
//!     --smooth <N>            Smoothing passes (default: 2)
//!     --growth <N>            Growth iterations, 0 to disable (default: 0)
//!     --leaf <NAME>           Also write a leaf mesh next to the tree
//!     --config <FILE>         Load settings from a JSON file first
//!     --save-config <FILE>    Save the final settings as JSON
//!     -h, --help              Show this help message

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use mtree::core::logging;
use mtree::mesh::{Mesh, obj};
use mtree::{Engine, GenerationConfig};

fn print_help() {
    eprintln!("generate_tree - Tree mesh generation utility");
    eprintln!();
    eprintln!("Usage: generate_tree [OPTIONS] <OUTPUT.obj>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -p, --preset <NAME>     Tree preset: oak, pine, willow or random (default: oak)");
    eprintln!("    --seed <SEED>           Seed for every shape function (default: 42)");
    eprintln!("    --radial <N>            Vertices per branch ring (default: 8)");
    eprintln!("    --smooth <N>            Smoothing passes (default: 2)");
    eprintln!("    --growth <N>            Growth iterations, 0 to disable (default: 0)");
    eprintln!("    --leaf <NAME>           Also write a leaf mesh: oak, maple, birch, willow, pine");
    eprintln!("    --config <FILE>         Load settings from a JSON file first");
    eprintln!("    --save-config <FILE>    Save the final settings as JSON");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    generate_tree -p pine --seed 7 --radial 12 pine.obj");
    eprintln!("    generate_tree --config tree.json --leaf maple tree.obj");
}

#[derive(Debug)]
struct Args {
    output: PathBuf,
    config: GenerationConfig,
    save_config: Option<PathBuf>,
}

fn next_value<'a>(args: &'a [String], i: &mut usize, option: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", option))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        return Err("Missing output file".to_string());
    }

    // The config file is the base layer, command line options override it
    let mut config = GenerationConfig::default();
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        let path = args.get(pos + 1).ok_or("Missing value for --config")?;
        config = GenerationConfig::load(Path::new(path))
            .map_err(|e| format!("Cannot load config {}: {}", path, e))?;
    }

    let mut output: Option<PathBuf> = None;
    let mut save_config: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-p" | "--preset" => {
                config.preset = next_value(&args, &mut i, "--preset")?.to_uppercase();
            }
            "--seed" => {
                let value = next_value(&args, &mut i, "--seed")?;
                config.seed = value.parse().map_err(|_| format!("Invalid seed: {}", value))?;
            }
            "--radial" => {
                let value = next_value(&args, &mut i, "--radial")?;
                config.radial_resolution = value.parse().map_err(|_| format!("Invalid radial resolution: {}", value))?;
            }
            "--smooth" => {
                let value = next_value(&args, &mut i, "--smooth")?;
                config.smooth_iterations = value.parse().map_err(|_| format!("Invalid smooth iterations: {}", value))?;
            }
            "--growth" => {
                let value = next_value(&args, &mut i, "--growth")?;
                config.growth_iterations = value.parse().map_err(|_| format!("Invalid growth iterations: {}", value))?;
            }
            "--leaf" => {
                config.leaf_preset = Some(next_value(&args, &mut i, "--leaf")?.to_string());
            }
            "--config" => {
                next_value(&args, &mut i, "--config")?;
            }
            "--save-config" => {
                save_config = Some(PathBuf::from(next_value(&args, &mut i, "--save-config")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            path => {
                if output.is_some() {
                    return Err("Multiple output files specified".to_string());
                }
                output = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    let output = output.ok_or("Missing output file")?;

    Ok(Args { output, config, save_config })
}

fn write_mesh(mesh: &Mesh, path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    obj::write_obj(&mut writer, mesh)?;
    writer.flush()
}

fn run(args: Args) -> mtree::core::types::Result<()> {
    if let Some(path) = &args.save_config {
        args.config.save(path)?;
        log::info!("Saved settings to {}", path.display());
    }

    let engine = Engine::new(args.config);
    let config = engine.config();
    log::info!(
        "Generating {} tree (seed {}, radial {}, smooth {}, growth {})",
        config.preset,
        config.seed,
        config.radial_resolution,
        config.smooth_iterations,
        config.growth_iterations
    );

    let start = Instant::now();
    let tree = engine.build_tree(&config.preset)?;
    let mesh = engine.mesh_tree(&tree)?;
    log::info!(
        "  {} nodes, {} vertices, {} polygons in {:.2}s",
        tree.skeleton().node_count(),
        mesh.vertex_count(),
        mesh.polygon_count(),
        start.elapsed().as_secs_f64()
    );
    write_mesh(&mesh, &args.output)?;
    log::info!("  Wrote {}", args.output.display());

    if let Some(leaf_preset) = &config.leaf_preset {
        let leaf = engine.generate_leaf(leaf_preset)?;
        let leaf_path = args.output.with_extension("leaf.obj");
        write_mesh(&leaf, &leaf_path)?;
        log::info!(
            "  {} leaf: {} vertices, wrote {}",
            leaf_preset,
            leaf.vertex_count(),
            leaf_path.display()
        );
    }
    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        log::error!("Generation failed: {}", e);
        std::process::exit(1);
    }
}
