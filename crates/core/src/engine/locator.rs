//! Auxiliary asset resolution for engine instances.

use std::path::PathBuf;
use std::sync::Arc;

use super::config::AssetsConfig;
use super::traits::PathResolver;

/// Resolves the paths an engine asks for when it loads its auxiliary assets.
///
/// Worker scripts and the binary payload are matched by suffix and redirected
/// to their configured locations. Any other path is returned unchanged.
#[derive(Debug, Clone)]
pub struct AssetLocator {
    worker_suffix: String,
    binary_suffix: String,
    worker_path: Option<PathBuf>,
    binary_path: Option<PathBuf>,
}

impl AssetLocator {
    /// Creates a locator from configuration.
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            worker_suffix: config.worker_suffix.clone(),
            binary_suffix: config.binary_suffix.clone(),
            worker_path: config.worker_path.clone(),
            binary_path: config.binary_path.clone(),
        }
    }

    /// Resolves a requested asset path.
    pub fn locate(&self, path: &str) -> String {
        if path.ends_with(&self.worker_suffix) {
            if let Some(ref target) = self.worker_path {
                return target.to_string_lossy().to_string();
            }
        }
        if path.ends_with(&self.binary_suffix) {
            if let Some(ref target) = self.binary_path {
                return target.to_string_lossy().to_string();
            }
        }
        path.to_string()
    }

    /// Wraps this locator as a hook suitable for [`EngineHooks`](super::EngineHooks).
    pub fn into_resolver(self) -> PathResolver {
        Arc::new(move |path| self.locate(path))
    }
}

impl Default for AssetLocator {
    fn default() -> Self {
        Self::new(&AssetsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> AssetLocator {
        AssetLocator::new(&AssetsConfig {
            worker_path: Some(PathBuf::from("/engine/ffmpeg.core.worker.js")),
            binary_path: Some(PathBuf::from("/engine/ffmpeg.core.wasm")),
            ..Default::default()
        })
    }

    #[test]
    fn test_worker_suffix_redirected() {
        assert_eq!(
            locator().locate("ffmpeg-core.worker.js"),
            "/engine/ffmpeg.core.worker.js"
        );
    }

    #[test]
    fn test_binary_suffix_redirected() {
        assert_eq!(
            locator().locate("https://cdn.example/ffmpeg-core.wasm"),
            "/engine/ffmpeg.core.wasm"
        );
    }

    #[test]
    fn test_other_paths_pass_through() {
        assert_eq!(locator().locate("ffmpeg-core.js"), "ffmpeg-core.js");
        assert_eq!(locator().locate("ffmpeg"), "ffmpeg");
    }

    #[test]
    fn test_unset_targets_pass_through() {
        let locator = AssetLocator::default();
        assert_eq!(locator.locate("core.wasm"), "core.wasm");
        assert_eq!(locator.locate("core.worker.js"), "core.worker.js");
    }

    #[test]
    fn test_into_resolver() {
        let resolve = locator().into_resolver();
        assert_eq!(resolve("x.wasm"), "/engine/ffmpeg.core.wasm");
    }
}
