//! The load, unwrap, preview, export workflow.
//!
//! A [`Session`] owns the one mesh being worked on together with everything
//! that acts on it: the 3D view, the unwrapper, the UV canvas, and the
//! channel for user-facing messages. Every action either completes or stops
//! with a [`Notice`] and leaves the session unchanged.
//!
//! ```
//! use uvlab::render::RasterCanvas;
//! use uvlab::session::{Notice, Session};
//! use uvlab::unwrap::{ChartAtlas, UnwrapperLoader};
//! use uvlab::viewer::NullView;
//!
//! let mut session = Session::new(
//!     NullView::new(),
//!     RasterCanvas::new(512, 512).unwrap(),
//!     Vec::<Notice>::new(),
//!     UnwrapperLoader::ready(ChartAtlas::default()),
//! );
//!
//! let obj = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
//! session.load_file("triangle.obj", obj).unwrap();
//! assert_eq!(session.generate_uv().unwrap(), 1);
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::io::{self, obj, Format};
use crate::mesh::Mesh;
use crate::render::{draw_uv_layout, Canvas, RasterCanvas, UvStyle};
use crate::unwrap::{AtlasOptions, Readiness, UnwrapMethod, UnwrapperLoader};
use crate::viewer::SceneView;

/// File name used for exported meshes.
pub const EXPORT_FILE_NAME: &str = "model_uv.obj";

/// File name used when saving the UV layout image.
pub const UV_LAYOUT_FILE_NAME: &str = "uv_layout.png";

/// A message for the user explaining why an action did not happen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The file extension is not one of the supported formats.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An action needs a mesh and none is loaded.
    #[error("Load a model first!")]
    NoMeshLoaded,

    /// The unwrapper is still loading, or failed to load.
    #[error("UV unwrapper is not ready yet!")]
    UnwrapperNotReady,

    /// The file could not be read or parsed.
    #[error("Could not load model: {0}")]
    LoadFailed(String),

    /// The unwrapper rejected the mesh.
    #[error("UV unwrap failed: {0}")]
    UnwrapFailed(String),

    /// Writing an output file failed.
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

/// Receives notices as they happen.
pub trait Notifier {
    /// Deliver one notice.
    fn notify(&mut self, notice: &Notice);
}

/// Prints notices to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notice: &Notice) {
        eprintln!("{}", notice);
    }
}

/// Collects notices, newest last.
impl Notifier for Vec<Notice> {
    fn notify(&mut self, notice: &Notice) {
        self.push(notice.clone());
    }
}

/// Settings for building a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Side length of the square UV canvas in pixels.
    pub uv_size: u32,
    /// Directory that exports are written to.
    pub export_dir: PathBuf,
    /// Unwrapping backend.
    pub method: UnwrapMethod,
    /// Options for the chart atlas backend.
    pub atlas: AtlasOptions,
    /// Stroke style for the UV layout.
    pub style: UvStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            uv_size: 512,
            export_dir: PathBuf::from("."),
            method: UnwrapMethod::default(),
            atlas: AtlasOptions::default(),
            style: UvStyle::default(),
        }
    }
}

impl SessionConfig {
    /// Set the UV canvas size.
    pub fn with_uv_size(mut self, uv_size: u32) -> Self {
        self.uv_size = uv_size;
        self
    }

    /// Set the export directory.
    pub fn with_export_dir<P: Into<PathBuf>>(mut self, export_dir: P) -> Self {
        self.export_dir = export_dir.into();
        self
    }

    /// Set the unwrapping backend.
    pub fn with_method(mut self, method: UnwrapMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the chart atlas options.
    pub fn with_atlas(mut self, atlas: AtlasOptions) -> Self {
        self.atlas = atlas;
        self
    }

    /// Start loading the configured unwrapper in the background.
    pub fn spawn_unwrapper(&self) -> UnwrapperLoader {
        let (method, atlas) = (self.method, self.atlas);
        UnwrapperLoader::spawn(move || method.build(atlas))
    }

    /// Build a session drawing on a raster canvas of the configured size.
    ///
    /// Fails when the canvas cannot be created, e.g. for a zero `uv_size`.
    pub fn build<V: SceneView, N: Notifier>(
        &self,
        viewer: V,
        notifier: N,
    ) -> crate::error::Result<Session<V, RasterCanvas, N>> {
        let canvas = RasterCanvas::new(self.uv_size, self.uv_size)?;
        Ok(Session::new(viewer, canvas, notifier, self.spawn_unwrapper())
            .with_style(self.style)
            .with_export_dir(&self.export_dir))
    }
}

/// One user's working state: at most one mesh plus the tools acting on it.
pub struct Session<V: SceneView, C: Canvas, N: Notifier> {
    viewer: V,
    mesh: Option<Mesh>,
    unwrapper: UnwrapperLoader,
    canvas: C,
    notifier: N,
    style: UvStyle,
    export_dir: PathBuf,
}

impl<V: SceneView, C: Canvas, N: Notifier> Session<V, C, N> {
    /// Create a session with no mesh, exporting to the current directory.
    pub fn new(viewer: V, canvas: C, notifier: N, unwrapper: UnwrapperLoader) -> Self {
        Self {
            viewer,
            mesh: None,
            unwrapper,
            canvas,
            notifier,
            style: UvStyle::default(),
            export_dir: PathBuf::from("."),
        }
    }

    /// Set the UV stroke style.
    pub fn with_style(mut self, style: UvStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the directory exports are written to.
    pub fn with_export_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.export_dir = dir.as_ref().to_path_buf();
        self
    }

    /// The current mesh, if any.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// The 3D view.
    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    /// Mutable access to the 3D view, for per-frame updates.
    pub fn viewer_mut(&mut self) -> &mut V {
        &mut self.viewer
    }

    /// The UV canvas.
    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// The notice sink.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// The export directory.
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Check whether the background unwrapper load has finished.
    pub fn poll_unwrapper(&mut self) -> Readiness {
        self.unwrapper.poll()
    }

    /// Block until the unwrapper has loaded or failed.
    pub fn wait_for_unwrapper(&mut self) -> Readiness {
        self.unwrapper.wait()
    }

    /// Load a mesh from file contents, replacing the current one.
    ///
    /// The format comes from the text after the last `.` in `file_name`.
    pub fn load_file(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), Notice> {
        let outcome = self.try_load(file_name, bytes);
        self.report(outcome)
    }

    /// Read a file from disk and load it.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Notice> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match std::fs::read(path) {
            Ok(bytes) => self.load_file(&file_name, &bytes),
            Err(e) => {
                let notice = Notice::LoadFailed(format!("{}: {}", path.display(), e));
                self.report(Err(notice))
            }
        }
    }

    /// Unwrap the current mesh, show it, and draw its UV layout.
    ///
    /// The mesh is expanded to one vertex per triangle corner before
    /// unwrapping, and replaced by the unwrapped result. Returns the number
    /// of UV triangles drawn.
    pub fn generate_uv(&mut self) -> Result<usize, Notice> {
        let outcome = self.try_generate_uv();
        self.report(outcome)
    }

    /// Write the current mesh as OBJ to [`EXPORT_FILE_NAME`] in the export
    /// directory.
    pub fn export(&mut self) -> Result<PathBuf, Notice> {
        let outcome = self.try_export();
        self.report(outcome)
    }

    fn try_load(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), Notice> {
        let extension = io::extension_of(file_name);
        let format = Format::from_extension(&extension)
            .ok_or_else(|| Notice::UnsupportedFormat(extension.clone()))?;

        let mesh =
            io::load_bytes(bytes, format).map_err(|e| Notice::LoadFailed(e.to_string()))?;
        log::info!(
            "Loaded {}: {} vertices, {} triangles",
            file_name,
            mesh.num_vertices(),
            mesh.num_triangles()
        );

        self.viewer.show(&mesh);
        self.mesh = Some(mesh);
        Ok(())
    }

    fn try_generate_uv(&mut self) -> Result<usize, Notice> {
        let mesh = self.mesh.as_ref().ok_or(Notice::NoMeshLoaded)?;
        self.unwrapper.poll();
        let unwrapper = self.unwrapper.get().ok_or(Notice::UnwrapperNotReady)?;

        let flat = mesh.to_non_indexed();
        let indices: Vec<u32> = (0..flat.num_vertices() as u32).collect();
        log::info!(
            "Unwrapping {} triangles with {}",
            flat.num_triangles(),
            unwrapper.name()
        );

        let result = unwrapper
            .generate(flat.positions(), &indices)
            .map_err(|e| Notice::UnwrapFailed(e.to_string()))?;
        let unwrapped = flat
            .apply_unwrap(&result)
            .map_err(|e| Notice::UnwrapFailed(e.to_string()))?;
        log::info!(
            "Unwrapped: {} UV vertices, {} triangles",
            result.len(),
            result.num_triangles()
        );

        self.viewer.show(&unwrapped);
        let drawn = draw_uv_layout(&mut self.canvas, result.uvs(), result.indices(), &self.style);
        self.mesh = Some(unwrapped);
        Ok(drawn)
    }

    fn try_export(&self) -> Result<PathBuf, Notice> {
        let mesh = self.mesh.as_ref().ok_or(Notice::NoMeshLoaded)?;
        let path = self.export_dir.join(EXPORT_FILE_NAME);
        obj::save(mesh, &path).map_err(|e| Notice::ExportFailed(e.to_string()))?;
        log::info!("Exported {}", path.display());
        Ok(path)
    }

    fn report<T>(&mut self, outcome: Result<T, Notice>) -> Result<T, Notice> {
        if let Err(notice) = &outcome {
            log::warn!("{}", notice);
            self.notifier.notify(notice);
        }
        outcome
    }
}

impl<V: SceneView, N: Notifier> Session<V, RasterCanvas, N> {
    /// Save the UV canvas as [`UV_LAYOUT_FILE_NAME`] in the export directory.
    pub fn save_uv_layout(&mut self) -> Result<PathBuf, Notice> {
        let path = self.export_dir.join(UV_LAYOUT_FILE_NAME);
        let outcome = self
            .canvas
            .save(&path)
            .map(|()| path)
            .map_err(|e| Notice::ExportFailed(e.to_string()));
        self.report(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::unwrap::{ChartAtlas, CylindricalProjection, Unwrapper};
    use crate::viewer::NullView;

    /// Canvas that counts calls instead of drawing.
    #[derive(Default)]
    struct CountingCanvas {
        clears: usize,
        strokes: usize,
    }

    impl Canvas for CountingCanvas {
        fn size(&self) -> (u32, u32) {
            (256, 256)
        }
        fn clear(&mut self) {
            self.clears += 1;
        }
        fn begin_path(&mut self) {}
        fn move_to(&mut self, _x: f64, _y: f64) {}
        fn line_to(&mut self, _x: f64, _y: f64) {}
        fn close_path(&mut self) {}
        fn stroke(&mut self, _style: &UvStyle) {
            self.strokes += 1;
        }
    }

    const CUBE: &str = "\
o Cube
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 1 3 2
f 1 4 3
f 5 6 7
f 5 7 8
f 1 2 6
f 1 6 5
f 4 8 7
f 4 7 3
f 1 5 8
f 1 8 4
f 2 3 7
f 2 7 6
";

    type TestSession = Session<NullView, CountingCanvas, Vec<Notice>>;

    fn session(unwrapper: UnwrapperLoader) -> TestSession {
        Session::new(
            NullView::new(),
            CountingCanvas::default(),
            Vec::new(),
            unwrapper,
        )
    }

    #[test]
    fn test_unwrap_without_mesh() {
        let mut s = session(UnwrapperLoader::ready(ChartAtlas::default()));

        assert_eq!(s.generate_uv(), Err(Notice::NoMeshLoaded));
        assert_eq!(s.notifier(), &vec![Notice::NoMeshLoaded]);
        assert_eq!(s.canvas().clears, 0);
        assert_eq!(s.canvas().strokes, 0);
        assert_eq!(Notice::NoMeshLoaded.to_string(), "Load a model first!");
    }

    #[test]
    fn test_unwrap_before_unwrapper_is_ready() {
        let (_release, gate) = crossbeam_channel::bounded::<()>(1);
        let loader = UnwrapperLoader::spawn(move || {
            gate.recv()
                .map_err(|_| Error::UnwrapperUnavailable("gate closed".into()))?;
            Ok(Box::new(ChartAtlas::default()) as Box<dyn Unwrapper>)
        });
        let mut s = session(loader);
        s.load_file("cube.obj", CUBE.as_bytes()).unwrap();

        assert_eq!(s.generate_uv(), Err(Notice::UnwrapperNotReady));
        assert_eq!(s.canvas().clears, 0);
        assert_eq!(s.canvas().strokes, 0);
        assert!(!s.mesh().unwrap().has_uvs());
        assert_eq!(
            Notice::UnwrapperNotReady.to_string(),
            "UV unwrapper is not ready yet!"
        );
    }

    #[test]
    fn test_failed_unwrapper_is_never_ready() {
        let loader =
            UnwrapperLoader::spawn(|| Err(Error::UnwrapperUnavailable("missing".into())));
        let mut s = session(loader);
        assert_eq!(s.wait_for_unwrapper(), Readiness::Failed);

        s.load_file("cube.obj", CUBE.as_bytes()).unwrap();
        assert_eq!(s.generate_uv(), Err(Notice::UnwrapperNotReady));
    }

    #[test]
    fn test_unsupported_format() {
        let mut s = session(UnwrapperLoader::ready(ChartAtlas::default()));

        let err = s.load_file("model.3DS", b"whatever").unwrap_err();
        assert_eq!(err, Notice::UnsupportedFormat("3ds".to_string()));
        assert_eq!(err.to_string(), "Unsupported format: 3ds");
        assert!(s.mesh().is_none());
        assert_eq!(s.viewer().shown(), 0);
    }

    #[test]
    fn test_bad_file_keeps_previous_mesh() {
        let mut s = session(UnwrapperLoader::ready(ChartAtlas::default()));
        s.load_file("cube.obj", CUBE.as_bytes()).unwrap();

        let err = s.load_file("broken.stl", b"nope").unwrap_err();
        assert!(matches!(err, Notice::LoadFailed(_)));
        assert_eq!(s.mesh().unwrap().name(), Some("Cube"));
        assert_eq!(s.notifier().len(), 1);
    }

    #[test]
    fn test_export_without_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(UnwrapperLoader::ready(ChartAtlas::default()))
            .with_export_dir(dir.path());

        assert_eq!(s.export(), Err(Notice::NoMeshLoaded));
        assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_load_unwrap_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(UnwrapperLoader::ready(ChartAtlas::default()))
            .with_export_dir(dir.path());

        s.load_file("Cube.OBJ", CUBE.as_bytes()).unwrap();
        assert_eq!(s.viewer().shown(), 1);

        let drawn = s.generate_uv().unwrap();
        assert_eq!(drawn, 12);
        assert_eq!(s.canvas().clears, 1);
        assert_eq!(s.canvas().strokes, 12);
        assert_eq!(s.viewer().shown(), 2);

        let mesh = s.mesh().unwrap();
        assert!(mesh.has_uvs());
        assert_eq!(mesh.num_triangles(), 12);
        assert!(mesh
            .uvs()
            .unwrap()
            .iter()
            .all(|uv| (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)));

        let path = s.export().unwrap();
        assert_eq!(path, dir.path().join(EXPORT_FILE_NAME));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Generated by uvlab"));
        assert!(text.contains("o Cube\n"));
        assert!(text.lines().any(|l| l.starts_with("vt ")));

        let reloaded = io::load(&path).unwrap();
        assert!(reloaded.has_uvs());
        assert_eq!(reloaded.num_triangles(), 12);
        assert!(s.notifier().is_empty());
    }

    #[test]
    fn test_unwrap_twice() {
        let mut s = session(UnwrapperLoader::ready(CylindricalProjection));
        s.load_file("cube.obj", CUBE.as_bytes()).unwrap();

        assert_eq!(s.generate_uv(), Ok(12));
        assert_eq!(s.generate_uv(), Ok(12));
        assert_eq!(s.canvas().clears, 2);
    }

    #[test]
    fn test_config_session_saves_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::default()
            .with_uv_size(64)
            .with_export_dir(dir.path())
            .with_method(UnwrapMethod::Cylindrical);
        let mut s = config.build(NullView::new(), Vec::new()).unwrap();

        assert_eq!(s.wait_for_unwrapper(), Readiness::Ready);
        assert_eq!(s.canvas().size(), (64, 64));

        s.load_file("cube.obj", CUBE.as_bytes()).unwrap();
        s.generate_uv().unwrap();
        let path = s.save_uv_layout().unwrap();

        assert_eq!(path, dir.path().join(UV_LAYOUT_FILE_NAME));
        assert!(path.exists());
    }

    #[test]
    fn test_zero_uv_size_fails_to_build() {
        let config = SessionConfig::default().with_uv_size(0);
        assert!(config.build(NullView::new(), Vec::new()).is_err());
    }

    #[test]
    fn test_malformed_fbx_is_a_load_notice() {
        let mut s = session(UnwrapperLoader::ready(ChartAtlas::default()));
        let err = s.load_file("model.fbx", b"Kaydara FBX Binary  \0").unwrap_err();
        assert!(matches!(err, Notice::LoadFailed(_)));
        assert!(s.mesh().is_none());
    }

    #[test]
    fn test_load_path_missing_file() {
        let mut s = session(UnwrapperLoader::ready(ChartAtlas::default()));
        let err = s.load_path("/definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, Notice::LoadFailed(_)));
    }
}
