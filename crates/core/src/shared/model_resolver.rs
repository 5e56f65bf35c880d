use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read model from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("model {0} is not cached and no download URL is configured")]
    NotFound(String),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Where to look for one model file.
#[derive(Debug, Default, Clone)]
pub struct ModelSource<'a> {
    pub name: &'a str,
    pub explicit_path: Option<&'a Path>,
    pub url: Option<&'a str>,
    pub bundled_dir: Option<&'a Path>,
}

/// Resolve a model file, checking local locations before downloading.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory
/// 4. Download from the configured URL into the cache
pub fn resolve(
    source: &ModelSource<'_>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = source.explicit_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ModelResolveError::Missing(path.to_path_buf()));
    }

    let cache_dir = model_cache_dir()?;
    resolve_in(source, &cache_dir, progress)
}

fn resolve_in(
    source: &ModelSource<'_>,
    cache_dir: &Path,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(source.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = source.bundled_dir {
        let bundled_path = dir.join(source.name);
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
    }

    let url = source
        .url
        .ok_or_else(|| ModelResolveError::NotFound(source.name.to_string()))?;
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {url}", source.name);
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/facegate/models/`
/// - Linux: `$XDG_CACHE_HOME/facegate/models/` or `~/.cache/facegate/models/`
/// - Windows: `%LOCALAPPDATA%/facegate/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    // Clean up .part file on any error
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> ModelResolveError {
    let path = path.to_path_buf();
    move |source| ModelResolveError::Write { path, source }
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;
    copy_body(&mut response, url, &mut file, temp_path, total, progress.as_ref())?;
    file.flush().map_err(write_err(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_err(dest))?;
    Ok(())
}

/// Streams a response body into `file`, reporting progress per chunk.
/// Failures on the network side name the URL; failures on disk name `path`.
fn copy_body(
    body: &mut impl Read,
    url: &str,
    file: &mut impl Write,
    path: &Path,
    total: u64,
    progress: Option<&ProgressFn>,
) -> Result<u64, ModelResolveError> {
    let mut downloaded: u64 = 0;
    let mut buf = vec![0u8; 256 * 1024];
    loop {
        let n = body.read(&mut buf).map_err(|source| ModelResolveError::Read {
            url: url.to_string(),
            source,
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err(path))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source<'a>(name: &'a str) -> ModelSource<'a> {
        ModelSource {
            name,
            ..ModelSource::default()
        }
    }

    #[test]
    fn test_explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("detector.onnx");
        fs::write(&path, b"model").unwrap();

        let src = ModelSource {
            explicit_path: Some(&path),
            ..source("detector.onnx")
        };
        assert_eq!(resolve(&src, None).unwrap(), path);
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.onnx");
        let src = ModelSource {
            explicit_path: Some(&path),
            ..source("missing.onnx")
        };
        assert!(matches!(
            resolve(&src, None),
            Err(ModelResolveError::Missing(_))
        ));
    }

    #[test]
    fn test_cached_file_is_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mesh.onnx"), b"cached").unwrap();

        let resolved = resolve_in(&source("mesh.onnx"), tmp.path(), None).unwrap();
        assert_eq!(resolved, tmp.path().join("mesh.onnx"));
    }

    #[test]
    fn test_bundled_file_is_found() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join("mesh.onnx"), b"bundled").unwrap();

        let src = ModelSource {
            bundled_dir: Some(&bundled),
            ..source("mesh.onnx")
        };
        let resolved = resolve_in(&src, &cache, None).unwrap();
        assert_eq!(resolved, bundled.join("mesh.onnx"));
    }

    #[test]
    fn test_no_url_and_no_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_in(&source("absent.onnx"), tmp.path(), None);
        assert!(matches!(result, Err(ModelResolveError::NotFound(_))));
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }

    struct BrokenBody {
        sent: bool,
    }

    impl Read for BrokenBody {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                ));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"onnx");
            Ok(4)
        }
    }

    #[test]
    fn test_interrupted_body_names_url() {
        let mut sink = Vec::new();
        let result = copy_body(
            &mut BrokenBody { sent: false },
            "https://models.example.com/face.onnx",
            &mut sink,
            Path::new("/tmp/face.part"),
            8,
            None,
        );
        match result {
            Err(ModelResolveError::Read { url, .. }) => {
                assert_eq!(url, "https://models.example.com/face.onnx");
            }
            other => panic!("expected read error, got {other:?}"),
        }
        assert_eq!(sink, b"onnx");
    }

    #[test]
    fn test_body_copied_with_progress() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = std::sync::Arc::clone(&seen);
        let progress: ProgressFn = Box::new(move |done, total| {
            record.lock().unwrap().push((done, total));
        });
        let mut sink = Vec::new();
        let copied = copy_body(
            &mut &b"model-bytes"[..],
            "https://models.example.com/face.onnx",
            &mut sink,
            Path::new("/tmp/face.part"),
            11,
            Some(&progress),
        )
        .unwrap();
        assert_eq!(copied, 11);
        assert_eq!(sink, b"model-bytes");
        assert_eq!(*seen.lock().unwrap(), vec![(11, 11)]);
    }
}
