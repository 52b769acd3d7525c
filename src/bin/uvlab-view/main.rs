//! Preview window for uvlab.
//!
//! Usage: uvlab-view [mesh_file] [--out-dir <dir>] [--uv-size <px>] [--method <atlas|cylindrical>]
//!
//! Controls:
//! - Drop a file on the window: Load it (OBJ, glTF/GLB, STL)
//! - U: Generate UVs and save the UV layout as uv_layout.png
//! - E: Export the mesh as model_uv.obj
//! - Escape: Quit

mod mesh_gpu;
mod renderer;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use mesh_gpu::GpuMesh;
use renderer::Renderer;

use uvlab::mesh::Mesh;
use uvlab::render::RasterCanvas;
use uvlab::session::{ConsoleNotifier, Session, SessionConfig};
use uvlab::unwrap::{Readiness, UnwrapMethod};
use uvlab::viewer::{Fit, SceneCamera, SceneView, ShadedVertex, Turntable};

/// Side length of the preview window in logical pixels.
const WINDOW_SIZE: u32 = 400;

#[derive(Parser)]
#[command(name = "uvlab-view")]
#[command(author, version, about = "Preview a mesh and unwrap its UVs", long_about = None)]
struct Args {
    /// Mesh file to open at startup
    input: Option<PathBuf>,

    /// Directory for model_uv.obj and uv_layout.png
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Side length of the UV layout image in pixels
    #[arg(long, default_value = "512")]
    uv_size: u32,

    /// Unwrapping method
    #[arg(short, long, value_enum, default_value = "atlas")]
    method: Method,
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

/// Mesh data waiting to be uploaded on the next frame.
#[derive(Default)]
struct Scene {
    pending: Option<(Vec<ShadedVertex>, Fit)>,
}

impl SceneView for Scene {
    fn show(&mut self, mesh: &Mesh) {
        self.pending = Some((ShadedVertex::from_mesh(mesh), Fit::of(mesh)));
    }
}

type ViewSession = Session<Scene, RasterCanvas, ConsoleNotifier>;

/// Application state.
struct App {
    /// Load, unwrap, and export state.
    session: ViewSession,
    /// File to open once the window exists.
    initial: Option<PathBuf>,
    /// The window (created after resume).
    window: Option<Arc<Window>>,
    /// The renderer (created after window).
    renderer: Option<Renderer>,
    /// The GPU mesh (created once a mesh is shown).
    gpu_mesh: Option<GpuMesh>,
    /// Fixed camera.
    camera: SceneCamera,
    /// Model spin.
    turntable: Turntable,
    /// Last reported unwrapper state.
    readiness: Readiness,
}

impl App {
    fn new(session: ViewSession, initial: Option<PathBuf>) -> Self {
        Self {
            session,
            initial,
            window: None,
            renderer: None,
            gpu_mesh: None,
            camera: SceneCamera::default(),
            turntable: Turntable::default(),
            readiness: Readiness::Loading,
        }
    }

    fn unwrap_uvs(&mut self) {
        if self.session.generate_uv().is_ok() {
            if let Ok(path) = self.session.save_uv_layout() {
                log::info!("UV layout saved to {}", path.display());
            }
        }
    }

    fn export(&mut self) {
        if let Ok(path) = self.session.export() {
            log::info!("Exported {}", path.display());
        }
    }

    fn update_title(&mut self) {
        let readiness = self.session.poll_unwrapper();
        if readiness == self.readiness {
            return;
        }
        self.readiness = readiness;

        if let Some(window) = &self.window {
            let state = match readiness {
                Readiness::Loading => "unwrapper loading",
                Readiness::Ready => "press U to unwrap",
                Readiness::Failed => "unwrapper unavailable",
            };
            window.set_title(&format!("uvlab - {}", state));
        }
    }

    fn upload_pending(&mut self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        if let Some((vertices, fit)) = self.session.viewer_mut().pending.take() {
            self.gpu_mesh = GpuMesh::new(renderer.device(), &vertices, &fit);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.update_title();
        self.upload_pending();
        self.turntable.advance();

        let Some(renderer) = &mut self.renderer else {
            return;
        };

        let view_proj = self.camera.view_projection_matrix();
        let model = match &self.gpu_mesh {
            Some(mesh) => self.turntable.model_matrix(mesh.fit),
            None => self.turntable.model_matrix(uvlab::viewer::camera::IDENTITY),
        };

        match renderer.render(self.gpu_mesh.as_ref(), view_proj, model) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("uvlab - unwrapper loading")
            .with_inner_size(LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE))
            .with_resizable(false);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        }

        if let Some(path) = self.initial.take() {
            log::info!("Loading mesh from: {}", path.display());
            // Failures are reported through the notifier.
            let _ = self.session.load_path(&path);
        }

        log::info!("Controls: drop a file to load, U unwrap, E export, Escape quit");
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::DroppedFile(path) => {
                let _ = self.session.load_path(&path);
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    Key::Character(ref c) => match c.as_str() {
                        "u" | "U" => self.unwrap_uvs(),
                        "e" | "E" => self.export(),
                        _ => {}
                    },
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig::default()
        .with_uv_size(args.uv_size)
        .with_export_dir(args.out_dir)
        .with_method(args.method.into());

    let session = config.build(Scene::default(), ConsoleNotifier)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(session, args.input);
    event_loop.run_app(&mut app)?;

    Ok(())
}
