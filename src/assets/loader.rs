use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::assets::types::VisualAsset;
use crate::error::{AssetError, Result};
use crate::raster::Raster;

/// Decodes still images from disk into shareable assets
pub struct AssetLoader;

impl AssetLoader {
    /// Check if a path has a supported still-image extension
    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        matches!(extension.as_deref(), Some("png" | "jpg" | "jpeg" | "bmp"))
    }

    /// Decode a single image file
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Arc<VisualAsset>> {
        let path = path.as_ref();
        let raster = Raster::open(path)?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("image")
            .to_string();

        let mut asset = VisualAsset::image(name, raster);
        if let Some(inner) = Arc::get_mut(&mut asset) {
            inner.path = Some(path.to_path_buf());
        }
        Ok(asset)
    }

    /// Decode every supported image in `dir`, in sequence order.
    ///
    /// Files named like `01_intro.png` sort by their numeric prefix first and
    /// then by name. Files that fail to decode are skipped with a warning.
    pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<Vec<Arc<VisualAsset>>> {
        let dir = dir.as_ref();
        info!("Loading images from {:?}", dir);

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_supported(path))
            .collect();
        paths.sort_by_key(|path| sequence_key(path));

        let loaded: Vec<(PathBuf, Result<Arc<VisualAsset>>)> = paths
            .into_par_iter()
            .map(|path| {
                let asset = Self::load_image(&path);
                (path, asset)
            })
            .collect();

        let mut assets = Vec::with_capacity(loaded.len());
        for (path, asset) in loaded {
            match asset {
                Ok(asset) => {
                    debug!("Loaded {} ({:?})", asset.name, asset.dimensions());
                    assets.push(asset);
                }
                Err(e) => warn!("Skipping {:?}: {}", path, e),
            }
        }

        if assets.is_empty() {
            return Err(AssetError::NoImagesFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        info!("Loaded {} images", assets.len());
        Ok(assets)
    }
}

/// Sort key: numeric prefix before the first underscore (if any), then file name
fn sequence_key(path: &Path) -> (u64, String) {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let number = stem
        .split_once('_')
        .and_then(|(prefix, _)| prefix.parse().ok())
        .unwrap_or(u64::MAX);

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    (number, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_png(dir: &Path, name: &str, value: u8) {
        let raster = Raster::new_filled(3, 2, [value, value, value, 255]).unwrap();
        raster.save_png(dir.join(name)).unwrap();
    }

    #[test]
    fn test_supported_extensions() {
        assert!(AssetLoader::is_supported("a.PNG"));
        assert!(AssetLoader::is_supported("b.jpeg"));
        assert!(!AssetLoader::is_supported("c.mp4"));
        assert!(!AssetLoader::is_supported("noext"));
    }

    #[test]
    fn test_directory_order_follows_numeric_prefix() {
        let dir = tempdir().unwrap();
        write_png(dir.path(), "10_outro.png", 30);
        write_png(dir.path(), "2_middle.png", 20);
        write_png(dir.path(), "01_intro.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let assets = AssetLoader::load_directory(dir.path()).unwrap();
        let names: Vec<&str> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["01_intro", "2_middle", "10_outro"]);
        assert_eq!(assets[0].dimensions(), Some((3, 2)));
        assert!(assets[0].path.is_some());
    }

    #[test]
    fn test_corrupt_files_are_skipped() {
        let dir = tempdir().unwrap();
        write_png(dir.path(), "01_good.png", 10);
        std::fs::write(dir.path().join("02_bad.png"), b"not a png").unwrap();

        let assets = AssetLoader::load_directory(dir.path()).unwrap();
        assert_eq!(assets.len(), 1);
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempdir().unwrap();
        assert!(AssetLoader::load_directory(dir.path()).is_err());
    }
}
