use log::{debug, info};
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    rc::{Rc, Weak},
};

// --- Asset Kinds & Errors ---

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Font,
    Sound,
}

impl AssetKind {
    const fn dir(self) -> &'static str {
        match self {
            Self::Texture => "textures",
            Self::Font => "fonts",
            Self::Sound => "sounds",
        }
    }
}

#[derive(Debug)]
pub enum AssetError {
    EmptyKey(AssetKind),
    NotFound { kind: AssetKind, path: PathBuf },
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey(kind) => write!(f, "empty {kind:?} key"),
            Self::NotFound { kind, path } => write!(f, "{kind:?} not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// --- Sources ---

/// Where asset bytes come from. Decoding is the renderer's business; the
/// source only has to say whether the asset exists and how large it is.
pub trait AssetSource {
    fn locate(&self, kind: AssetKind, path: &str) -> Result<u64, AssetError>;
}

/// Assets laid out as `<root>/{textures,fonts,sounds}/<path>`.
#[derive(Debug, Clone)]
pub struct DiskSource {
    root: PathBuf,
}

impl DiskSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl AssetSource for DiskSource {
    fn locate(&self, kind: AssetKind, path: &str) -> Result<u64, AssetError> {
        let full = self.root.join(kind.dir()).join(path);
        match fs::metadata(&full) {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(AssetError::NotFound { kind, path: full }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AssetError::NotFound { kind, path: full })
            }
            Err(source) => Err(AssetError::Io { path: full, source }),
        }
    }
}

/// In-memory manifest, used by tests and the headless runner when no asset
/// directory is present.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    entries: FxHashSet<(AssetKind, String)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: AssetKind, path: &str) -> Self {
        self.entries.insert((kind, path.to_string()));
        self
    }
}

impl AssetSource for MemorySource {
    fn locate(&self, kind: AssetKind, path: &str) -> Result<u64, AssetError> {
        if self.entries.contains(&(kind, path.to_string())) {
            Ok(path.len() as u64)
        } else {
            Err(AssetError::NotFound {
                kind,
                path: PathBuf::from(path),
            })
        }
    }
}

// --- Handles ---

#[derive(Debug)]
struct Resource {
    kind: AssetKind,
    key: String,
    font_size: Option<f32>,
}

/// Reference-counted asset handle. Cloning adds a reference; dropping (or
/// `remove_reference`) removes one. The resource is freed with its last handle.
#[derive(Clone, Debug)]
pub struct Handle(Rc<Resource>);

impl Handle {
    pub fn kind(&self) -> AssetKind {
        self.0.kind
    }

    pub fn key(&self) -> &str {
        &self.0.key
    }

    pub fn same_resource(&self, other: &Handle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn remove_reference(self) {
        drop(self);
    }

    /// Approximate text extent in pixels for a font handle; zero for others.
    pub fn measure(&self, text: &str) -> [f32; 2] {
        match self.0.font_size {
            Some(size) => [text.chars().count() as f32 * size * 0.55, size],
            None => [0.0, 0.0],
        }
    }
}

// --- Asset Manager ---

pub fn font_key(name: &str, size: f32) -> String {
    format!("{name}@{size}")
}

pub struct AssetManager {
    source: Box<dyn AssetSource>,
    cache: FxHashMap<(AssetKind, String), Weak<Resource>>,
}

impl AssetManager {
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self {
            source,
            cache: FxHashMap::default(),
        }
    }

    pub fn load_texture(&mut self, path: &str) -> Result<Handle, AssetError> {
        self.load(AssetKind::Texture, path, path.to_string(), None)
    }

    pub fn load_font(&mut self, name: &str, size: f32) -> Result<Handle, AssetError> {
        self.load(AssetKind::Font, name, font_key(name, size), Some(size))
    }

    pub fn load_sound(&mut self, path: &str) -> Result<Handle, AssetError> {
        self.load(AssetKind::Sound, path, path.to_string(), None)
    }

    fn load(
        &mut self,
        kind: AssetKind,
        path: &str,
        key: String,
        font_size: Option<f32>,
    ) -> Result<Handle, AssetError> {
        if path.trim().is_empty() {
            return Err(AssetError::EmptyKey(kind));
        }
        let cache_key = (kind, key);
        if let Some(live) = self.cache.get(&cache_key).and_then(Weak::upgrade) {
            debug!("Reusing resident {kind:?} '{}'", cache_key.1);
            return Ok(Handle(live));
        }
        let bytes = self.source.locate(kind, path)?;
        let resource = Rc::new(Resource {
            kind,
            key: cache_key.1.clone(),
            font_size,
        });
        info!("Loaded {kind:?} '{}' ({bytes} bytes)", cache_key.1);
        self.cache.insert(cache_key, Rc::downgrade(&resource));
        Ok(Handle(resource))
    }

    /// Outstanding handles for a resource (0 once every holder released it).
    pub fn live_references(&self, kind: AssetKind, key: &str) -> usize {
        self.cache
            .get(&(kind, key.to_string()))
            .map_or(0, Weak::strong_count)
    }

    /// Number of resources that still have at least one handle.
    pub fn resident_count(&self) -> usize {
        self.cache.values().filter(|w| w.strong_count() > 0).count()
    }

    /// Drops cache slots whose resource has been released.
    pub fn purge_released(&mut self) -> usize {
        let before = self.cache.len();
        self.cache.retain(|_, w| w.strong_count() > 0);
        before - self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AssetManager {
        AssetManager::new(Box::new(
            MemorySource::new()
                .with(AssetKind::Texture, "logo.png")
                .with(AssetKind::Font, "miso")
                .with(AssetKind::Sound, "start.ogg"),
        ))
    }

    #[test]
    fn repeated_loads_share_one_resource() {
        let mut assets = manager();
        let a = assets.load_texture("logo.png").expect("logo");
        let b = assets.load_texture("logo.png").expect("logo again");
        assert!(a.same_resource(&b));
        assert_eq!(assets.live_references(AssetKind::Texture, "logo.png"), 2);

        a.remove_reference();
        assert_eq!(assets.live_references(AssetKind::Texture, "logo.png"), 1);
        drop(b);
        assert_eq!(assets.live_references(AssetKind::Texture, "logo.png"), 0);
        assert_eq!(assets.resident_count(), 0);
        assert_eq!(assets.purge_released(), 1);
    }

    #[test]
    fn missing_assets_are_errors_not_handles() {
        let mut assets = manager();
        assert!(matches!(
            assets.load_texture("missing.png"),
            Err(AssetError::NotFound { kind: AssetKind::Texture, .. })
        ));
        assert!(matches!(assets.load_sound("  "), Err(AssetError::EmptyKey(AssetKind::Sound))));
        assert_eq!(assets.resident_count(), 0);
    }

    #[test]
    fn fonts_are_keyed_by_size_and_measure_text() {
        let mut assets = manager();
        let small = assets.load_font("miso", 16.0).expect("miso 16");
        let large = assets.load_font("miso", 32.0).expect("miso 32");
        assert!(!small.same_resource(&large));
        assert_eq!(assets.live_references(AssetKind::Font, &font_key("miso", 16.0)), 1);
        let [w, h] = large.measure("abcd");
        assert!(w > 0.0 && h == 32.0);
        let tex = assets.load_texture("logo.png").expect("logo");
        assert_eq!(tex.measure("abcd"), [0.0, 0.0]);
    }

    #[test]
    fn disk_source_reports_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("sounds")).expect("mkdir");
        fs::write(dir.path().join("sounds").join("tick.ogg"), b"OggS").expect("write");
        let source = DiskSource::new(dir.path());
        assert_eq!(source.locate(AssetKind::Sound, "tick.ogg").expect("tick"), 4);
        assert!(matches!(
            source.locate(AssetKind::Sound, "nope.ogg"),
            Err(AssetError::NotFound { .. })
        ));
        // A directory is not a loadable asset.
        assert!(source.locate(AssetKind::Texture, "").is_err());
    }
}
