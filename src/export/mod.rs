//! Icon export: PNG encoding, file output and the clipboard
//!
//! An export renders the scene offscreen, encodes the result as PNG and
//! writes it to disk and/or puts it on the clipboard as base64 text.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, RgbaImage};

use crate::{
    config::OutputSettings,
    error::{Result, StudioError},
    gfx::{
        rendering::{IconRenderer, IconRequest, RenderEngine},
        scene::Scene,
    },
};

/// What an export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// File written, if the export went to disk
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Size of the encoded PNG
    pub bytes: usize,
    /// Whether the base64 PNG ended up on the clipboard
    pub clipboard: bool,
}

impl ExportReport {
    /// One line summary for the status bar
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(path) = &self.path {
            parts.push(format!("saved {}", path.display()));
        }
        if self.clipboard {
            parts.push("copied to clipboard".to_string());
        }
        if parts.is_empty() {
            parts.push("rendered".to_string());
        }
        format!(
            "{}x{} icon ({} bytes) {}",
            self.width,
            self.height,
            self.bytes,
            parts.join(", ")
        )
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// The path a PNG for `path` is written to: `.png` is appended when the
/// path has no extension
pub fn png_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("png")
    }
}

/// Writes encoded PNG bytes, creating parent directories as needed
///
/// Returns the path actually written.
pub fn write_png(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(StudioError::Config("output path is empty".to_string()));
    }
    let path = png_path(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StudioError::io(parent, e))?;
    }
    std::fs::write(&path, bytes).map_err(|e| StudioError::io(&path, e))?;

    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Access to the system clipboard
///
/// The handle is opened on first use and kept, since on some platforms the
/// copied text is only served while the handle is alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: String) -> Result<()> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let result = clipboard.set_text(text);
        self.inner = Some(clipboard);
        Ok(result?)
    }
}

/// Puts `text` on the clipboard
pub fn copy_to_clipboard(clipboard: &mut SystemClipboard, text: String) -> Result<()> {
    let len = text.len();
    clipboard.set_text(text)?;
    log::info!("Copied {} characters to the clipboard", len);
    Ok(())
}

/// Where an icon goes after rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub path: Option<PathBuf>,
    pub clipboard: bool,
}

impl ExportTarget {
    pub fn file(output: &OutputSettings) -> Self {
        Self {
            path: Some(output.path.clone()),
            clipboard: output.copy_to_clipboard,
        }
    }

    pub fn clipboard_only() -> Self {
        Self {
            path: None,
            clipboard: true,
        }
    }
}

/// Encodes a rendered icon and delivers it to `target`
///
/// A failed file write fails the export. A failed clipboard update after a
/// successful write is logged and reported in the result; when the
/// clipboard is the only target it fails the export.
pub fn deliver_icon(
    image: &RgbaImage,
    target: &ExportTarget,
    clipboard: &mut SystemClipboard,
) -> Result<ExportReport> {
    let bytes = encode_png(image)?;

    let path = target
        .path
        .as_deref()
        .map(|path| write_png(path, &bytes))
        .transpose()?;

    let copied = if target.clipboard {
        match copy_to_clipboard(clipboard, to_base64(&bytes)) {
            Ok(()) => true,
            Err(err) if path.is_some() => {
                log::warn!("Icon saved but clipboard update failed: {}", err);
                false
            }
            Err(err) => return Err(err),
        }
    } else {
        false
    };

    Ok(ExportReport {
        path,
        width: image.width(),
        height: image.height(),
        bytes: bytes.len(),
        clipboard: copied,
    })
}

/// Renders the scene as an icon and delivers it
pub fn export_icon(
    engine: &mut RenderEngine,
    renderer: &mut IconRenderer,
    scene: &mut Scene,
    output: &OutputSettings,
    target: &ExportTarget,
    clipboard: &mut SystemClipboard,
) -> Result<ExportReport> {
    let request = IconRequest::from(output);
    let image = renderer.render(engine, scene, &request)?;
    let report = deliver_icon(&image, target, clipboard)?;
    log::info!("Export finished: {}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("icon_studio_export_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn png_keeps_dimensions_and_alpha() {
        let mut image = RgbaImage::from_pixel(5, 3, Rgba([0, 0, 0, 0]));
        image.put_pixel(2, 1, Rgba([255, 128, 0, 200]));

        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (5, 3));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([255, 128, 0, 200]));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn extension_is_added_only_when_missing() {
        assert_eq!(png_path(Path::new("out/sword")), PathBuf::from("out/sword.png"));
        assert_eq!(png_path(Path::new("out/sword.png")), PathBuf::from("out/sword.png"));
        assert_eq!(png_path(Path::new("out/sword.PNG")), PathBuf::from("out/sword.PNG"));
    }

    #[test]
    fn write_creates_directories() {
        let dir = temp_dir("nested");
        let written = write_png(&dir.join("a/b/icon"), b"data").unwrap();

        assert_eq!(written, dir.join("a/b/icon.png"));
        assert_eq!(std::fs::read(&written).unwrap(), b"data");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(write_png(Path::new(""), b"x"), Err(StudioError::Config(_))));
    }

    #[test]
    fn base64_of_known_input() {
        assert_eq!(to_base64(b""), "");
        assert_eq!(to_base64(b"f"), "Zg==");
        assert_eq!(to_base64(b"foobar"), "Zm9vYmFy");
    }

    #[test]
    fn file_only_delivery() {
        let dir = temp_dir("deliver");
        let image = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]));
        let target = ExportTarget {
            path: Some(dir.join("icon")),
            clipboard: false,
        };

        let report = deliver_icon(&image, &target, &mut SystemClipboard::new()).unwrap();

        assert_eq!(report.path, Some(dir.join("icon.png")));
        assert_eq!((report.width, report.height), (4, 2));
        assert!(!report.clipboard);
        assert_eq!(
            std::fs::metadata(dir.join("icon.png")).unwrap().len() as usize,
            report.bytes
        );
        assert!(report.summary().contains("4x2"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn headless_export_writes_the_rendered_icon() {
        use crate::{
            assets::model::{
                load_model,
                tests::{write_fixture, CRATE_MTL, CRATE_OBJ},
            },
            config::StudioConfig,
            gfx::camera::CameraManager,
        };

        let Ok(mut engine) = pollster::block_on(RenderEngine::new_headless()) else {
            // No GPU adapter
            return;
        };

        let dir = write_fixture("export_icon", &[("crate.obj", CRATE_OBJ), ("crate.mtl", CRATE_MTL)]);
        let config = StudioConfig::default();
        let model = load_model(&dir.join("crate.obj"), &config.import).unwrap();
        let mut scene = Scene::new(CameraManager::from_config(&config), [0.0; 4]);
        scene.set_model(model);

        let output = OutputSettings {
            width: 48,
            height: 32,
            path: dir.join("out/icon"),
            copy_to_clipboard: false,
            ..OutputSettings::default()
        };
        let mut renderer = IconRenderer::new(&engine);
        let report = export_icon(
            &mut engine,
            &mut renderer,
            &mut scene,
            &output,
            &ExportTarget::file(&output),
            &mut SystemClipboard::new(),
        )
        .unwrap();

        assert_eq!(report.path, Some(dir.join("out/icon.png")));
        assert!(!report.clipboard);

        let written = image::load_from_memory(&std::fs::read(dir.join("out/icon.png")).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(written.dimensions(), (48, 32));
        assert_eq!(written.get_pixel(0, 0)[3], 0);
        assert!(written.pixels().any(|p| p[3] > 0));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn target_from_output_settings() {
        let output = OutputSettings::default();
        let target = ExportTarget::file(&output);
        assert_eq!(target.path, Some(PathBuf::from("icon.png")));
        assert!(target.clipboard);
        assert!(ExportTarget::clipboard_only().path.is_none());
    }
}
