//! uvlab CLI - unwrap meshes and render UV layouts from the command line.
//!
//! Usage: uvlab <COMMAND> [OPTIONS] <INPUT>
//!
//! Run `uvlab --help` for available commands.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use uvlab::io;
use uvlab::render::{draw_uv_layout, RasterCanvas, UvStyle};
use uvlab::session::{ConsoleNotifier, SessionConfig};
use uvlab::unwrap::{AtlasOptions, Readiness, UnwrapMethod};
use uvlab::viewer::NullView;

#[derive(Parser)]
#[command(name = "uvlab")]
#[command(author, version, about = "UV unwrapping CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Generate UVs, save the UV layout image, and export OBJ
    Unwrap {
        /// Input mesh file
        input: PathBuf,

        /// Unwrapping method
        #[arg(short, long, value_enum, default_value = "atlas")]
        method: Method,

        /// Side length of the UV layout image in pixels
        #[arg(long, default_value = "512")]
        uv_size: u32,

        /// Directory for model_uv.obj and uv_layout.png
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Gap between atlas charts (fraction of the atlas side)
        #[arg(short, long, default_value = "0.01")]
        padding: f64,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Draw the UVs already stored in a mesh file
    RenderUv {
        /// Input mesh file with texture coordinates
        input: PathBuf,

        /// Side length of the image in pixels
        #[arg(long, default_value = "512")]
        uv_size: u32,

        /// Output PNG file
        #[arg(short, long, default_value = "uv_layout.png")]
        out: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Planar charts packed into the unit square
    Atlas,
    /// Cylindrical projection around the Y axis
    Cylindrical,
}

impl From<Method> for UnwrapMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Atlas => UnwrapMethod::Atlas,
            Method::Cylindrical => UnwrapMethod::Cylindrical,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Unwrap {
            input,
            method,
            uv_size,
            out_dir,
            padding,
            sequential,
        } => {
            let options = AtlasOptions::default()
                .with_padding(padding)
                .with_parallel(!sequential);
            options.validate()?;
            let config = SessionConfig::default()
                .with_uv_size(uv_size)
                .with_export_dir(out_dir)
                .with_method(method.into())
                .with_atlas(options);
            cmd_unwrap(&input, &config)?;
        }

        Commands::RenderUv { input, uv_size, out } => {
            cmd_render_uv(&input, uv_size, &out)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    if let Some(name) = mesh.name() {
        println!("Name: {}", name);
    }
    println!("Vertices: {}", mesh.num_vertices());
    println!("Triangles: {}", mesh.num_triangles());
    println!("Indexed: {}", if mesh.is_indexed() { "yes" } else { "no" });
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    match mesh.uvs() {
        Some(uvs) => {
            let (mut lo, mut hi) = ([f64::MAX; 2], [f64::MIN; 2]);
            for uv in uvs {
                lo = [lo[0].min(uv.x), lo[1].min(uv.y)];
                hi = [hi[0].max(uv.x), hi[1].max(uv.y)];
            }
            println!(
                "UVs: {} (range [{:.3}, {:.3}] to [{:.3}, {:.3}])",
                uvs.len(),
                lo[0],
                lo[1],
                hi[0],
                hi[1]
            );
        }
        None => println!("UVs: none"),
    }

    Ok(())
}

fn cmd_unwrap(input: &Path, config: &SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = config.build(NullView::new(), ConsoleNotifier)?;
    let mode = if config.atlas.parallel { "parallel" } else { "sequential" };

    session.load_path(input)?;
    if let Some(mesh) = session.mesh() {
        println!(
            "Loaded: {} vertices, {} triangles",
            mesh.num_vertices(),
            mesh.num_triangles()
        );
    }

    if session.wait_for_unwrapper() == Readiness::Failed {
        return Err("UV unwrapper failed to load".into());
    }

    println!("Unwrapping ({:?}, {})...", config.method, mode);
    let start = Instant::now();
    let drawn = session.generate_uv()?;
    let elapsed = start.elapsed();

    if let Some(mesh) = session.mesh() {
        println!(
            "Result: {} vertices, {} triangles ({:.2?})",
            mesh.num_vertices(),
            drawn,
            elapsed
        );
    }

    let layout = session.save_uv_layout()?;
    println!("Saved: {}", layout.display());
    let exported = session.export()?;
    println!("Saved: {}", exported.display());

    Ok(())
}

fn cmd_render_uv(
    input: &Path,
    uv_size: u32,
    out: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    let uvs = mesh
        .uvs()
        .ok_or_else(|| format!("{} has no texture coordinates", input.display()))?;

    let indices: Vec<u32> = match mesh.indices() {
        Some(indices) => indices.to_vec(),
        None => (0..mesh.num_vertices() as u32).collect(),
    };

    let mut canvas = RasterCanvas::new(uv_size, uv_size)?;
    let drawn = draw_uv_layout(&mut canvas, uvs, &indices, &UvStyle::default());
    canvas.save(out)?;
    println!("Drew {} triangles", drawn);
    println!("Saved: {}", out.display());

    Ok(())
}
