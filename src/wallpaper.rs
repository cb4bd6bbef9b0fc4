//! Background images: discovery, staging and handing the result to the desktop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::ImageReader;
use tracing::{debug, info, warn};

use crate::error::ResourceError;

/// File extensions picked up by [`discover`], compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Base name of the staged copy inside the temp directory.
const STAGED_STEM: &str = "wallpaper";

/// A background image and its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallpaper {
    path: PathBuf,
    width: u32,
    height: u32,
}

impl Wallpaper {
    /// Read the dimensions of the image at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Wallpaper, ResourceError> {
        let path = path.into();
        let reader = ImageReader::open(&path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| ResourceError::io(&path, source))?;
        let (width, height) =
            reader
                .into_dimensions()
                .map_err(|source| ResourceError::OpenImage {
                    path: path.clone(),
                    source,
                })?;
        Ok(Wallpaper {
            path,
            width,
            height,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// List the images of `dir`, sorted by path. A missing directory holds no
/// wallpapers; unreadable images are skipped.
pub fn discover(dir: &Path) -> Result<Vec<Wallpaper>, ResourceError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(ResourceError::io(dir, source)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|source| ResourceError::io(dir, source))?.path();
        if path.is_file() && is_supported(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut wallpapers = Vec::new();
    for path in paths {
        match Wallpaper::open(&path) {
            Ok(wallpaper) => wallpapers.push(wallpaper),
            Err(err) => warn!(%err, "skipping unreadable wallpaper"),
        }
    }
    debug!(dir = %dir.display(), found = wallpapers.len(), "discovered wallpapers");
    Ok(wallpapers)
}

/// Empty `temp_dir` of regular files and copy the wallpaper into it,
/// returning the path of the copy.
pub fn stage(wallpaper: &Wallpaper, temp_dir: &Path) -> Result<PathBuf, ResourceError> {
    fs::create_dir_all(temp_dir).map_err(|source| ResourceError::io(temp_dir, source))?;

    let entries = fs::read_dir(temp_dir).map_err(|source| ResourceError::io(temp_dir, source))?;
    for entry in entries {
        let path = entry
            .map_err(|source| ResourceError::io(temp_dir, source))?
            .path();
        if path.is_file() {
            fs::remove_file(&path).map_err(|source| ResourceError::io(&path, source))?;
        }
    }

    let extension = match wallpaper.path().extension() {
        Some(ext) => Some(ext.to_string_lossy().into_owned()),
        None => guessed_extension(wallpaper.path()),
    };
    let name = match extension {
        Some(ext) => format!("{}.{}", STAGED_STEM, ext),
        None => STAGED_STEM.to_string(),
    };
    let destination = temp_dir.join(name);
    fs::copy(wallpaper.path(), &destination)
        .map_err(|source| ResourceError::io(wallpaper.path(), source))?;
    check_dimensions(wallpaper, &destination);
    debug!(from = %wallpaper.path().display(), to = %destination.display(), "staged wallpaper");
    Ok(destination)
}

/// Extension matching the content of an image file that has none.
fn guessed_extension(path: &Path) -> Option<String> {
    let format = ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .format()?;
    format.extensions_str().first().map(|ext| ext.to_string())
}

/// Warn when the staged copy no longer has the size recorded at discovery.
/// Rendering uses the size of the file as it is now.
fn check_dimensions(wallpaper: &Wallpaper, staged: &Path) -> Option<(u32, u32)> {
    let actual = image::image_dimensions(staged).ok()?;
    if actual != (wallpaper.width, wallpaper.height) {
        warn!(
            path = %wallpaper.path.display(),
            expected_width = wallpaper.width,
            expected_height = wallpaper.height,
            actual_width = actual.0,
            actual_height = actual.1,
            "wallpaper dimensions changed since discovery"
        );
        return Some(actual);
    }
    None
}

/// Set `image` as the desktop background.
pub fn apply(image: &Path) -> Result<(), ResourceError> {
    let image = image
        .canonicalize()
        .map_err(|source| ResourceError::io(image, source))?;
    for mut command in background_commands(&image) {
        run(&mut command)?;
    }
    info!(path = %image.display(), "desktop background updated");
    Ok(())
}

fn run(command: &mut Command) -> Result<(), ResourceError> {
    let describe = format!("{:?}", command);
    let output = command.output().map_err(|err| ResourceError::Apply {
        command: describe.clone(),
        detail: err.to_string(),
    })?;
    if !output.status.success() {
        return Err(ResourceError::Apply {
            command: describe,
            detail: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn background_commands(image: &Path) -> Vec<Command> {
    // SPI_SETDESKWALLPAPER with SPIF_UPDATEINIFILE | SPIF_SENDCHANGE
    let script = format!(
        "Add-Type -Name Desktop -Namespace Todowall -MemberDefinition \
         '[DllImport(\"user32.dll\", CharSet = CharSet.Unicode)] \
         public static extern int SystemParametersInfo(int a, int b, string c, int d);'; \
         if ([Todowall.Desktop]::SystemParametersInfo(0x0014, 0, '{}', 3) -eq 0) {{ exit 1 }}",
        image
            .display()
            .to_string()
            .trim_start_matches(r"\\?\")
            .replace('\'', "''")
    );
    let mut command = Command::new("powershell");
    command.args(&["-NoProfile", "-NonInteractive", "-Command", script.as_str()]);
    vec![command]
}

#[cfg(target_os = "macos")]
fn background_commands(image: &Path) -> Vec<Command> {
    let script = format!(
        "tell application \"System Events\" to tell every desktop to set picture to \"{}\"",
        image.display().to_string().replace('"', "\\\"")
    );
    let mut command = Command::new("osascript");
    command.arg("-e").arg(&script);
    vec![command]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn background_commands(image: &Path) -> Vec<Command> {
    let uri = format!("file://{}", image.display());
    ["picture-uri", "picture-uri-dark"]
        .iter()
        .map(|key| {
            let mut command = Command::new("gsettings");
            command
                .arg("set")
                .arg("org.gnome.desktop.background")
                .arg(key)
                .arg(&uri);
            command
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_extensions_ignore_case() {
        assert!(is_supported(Path::new("a/b/Beach.JPG")));
        assert!(is_supported(Path::new("x.jpeg")));
        assert!(is_supported(Path::new("x.Png")));
        assert!(is_supported(Path::new("x.gif")));
        assert!(!is_supported(Path::new("x.bmp")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn missing_directory_has_no_wallpapers() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn reports_changed_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grown.png");
        image::RgbImage::new(4, 4).save(&path).unwrap();
        let wallpaper = Wallpaper::open(&path).unwrap();
        assert_eq!(check_dimensions(&wallpaper, &path), None);

        image::RgbImage::new(6, 3).save(&path).unwrap();
        assert_eq!(check_dimensions(&wallpaper, &path), Some((6, 3)));
    }

    #[test]
    fn applying_a_missing_file_fails_before_running_anything() {
        let dir = tempfile::tempdir().unwrap();
        let err = apply(&dir.path().join("ghost.png")).unwrap_err();
        assert!(matches!(err, ResourceError::Io { .. }));
    }
}
