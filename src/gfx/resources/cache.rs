//! Name-keyed resource cache
//!
//! Textures, models, cube maps and fonts are loaded at most once per distinct
//! name for the lifetime of the cache. A second request for the same name returns
//! the handle produced by the first, whether that load succeeded or not: failures
//! are logged once and cached as a null handle, which callers treat as "feature
//! disabled".
//!
//! Decoding is delegated to a [`ResourceLoader`] so the cache can be exercised
//! without touching the filesystem. [`DiskLoader`] is the real implementation.
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::gfx::rendering::RecordingBackend;
//! use trellis::gfx::resources::{DiskLoader, ResourceCache};
//!
//! let mut backend = RecordingBackend::new();
//! let mut cache = ResourceCache::new(DiskLoader::new("assets"));
//! let skin = cache.resolve_texture("skin.png", &mut backend);
//! assert_eq!(skin, cache.resolve_texture("skin.png", &mut backend));
//! ```

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use fontdue::{Font, FontSettings};
use log::{debug, warn};

use crate::error::ResourceError;
use crate::gfx::rendering::backend::{
    CubemapHandle, ImageData, MeshData, ModelHandle, RenderBackend, TextureHandle,
};

/// Source of decoded resource data
pub trait ResourceLoader {
    fn load_image(&mut self, name: &str) -> Result<ImageData, ResourceError>;
    fn load_model(&mut self, name: &str) -> Result<MeshData, ResourceError>;
    fn load_font(&mut self, name: &str) -> Result<Font, ResourceError>;
}

/// Loads resources from files below a root directory
#[derive(Debug, Clone)]
pub struct DiskLoader {
    root: PathBuf,
}

impl DiskLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ResourceLoader for DiskLoader {
    fn load_image(&mut self, name: &str) -> Result<ImageData, ResourceError> {
        let image = image::open(self.path(name))
            .map_err(|source| ResourceError::Image {
                path: name.to_owned(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(ImageData {
            width,
            height,
            pixels: image.into_raw(),
        })
    }

    fn load_model(&mut self, name: &str) -> Result<MeshData, ResourceError> {
        let (models, _materials) = tobj::load_obj(
            self.path(name),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| ResourceError::Model {
            path: name.to_owned(),
            source,
        })?;

        let mut data = MeshData::default();
        for model in models {
            let mesh = model.mesh;
            let base = data.vertex_count() as u32;
            data.positions.extend_from_slice(&mesh.positions);
            data.normals.extend_from_slice(&mesh.normals);
            data.tex_coords.extend_from_slice(&mesh.texcoords);
            data.indices.extend(mesh.indices.iter().map(|i| i + base));
        }

        if data.indices.is_empty() {
            return Err(ResourceError::Empty {
                path: name.to_owned(),
            });
        }
        Ok(data)
    }

    fn load_font(&mut self, name: &str) -> Result<Font, ResourceError> {
        let bytes = std::fs::read(self.path(name)).map_err(|source| ResourceError::Io {
            path: name.to_owned(),
            source,
        })?;
        Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| ResourceError::Font {
            path: name.to_owned(),
            reason: reason.to_owned(),
        })
    }
}

/// Deduplicating store of loaded resources, keyed by name
pub struct ResourceCache {
    loader: Box<dyn ResourceLoader>,
    textures: HashMap<String, TextureHandle>,
    models: HashMap<String, ModelHandle>,
    cubemaps: HashMap<[String; 6], CubemapHandle>,
    fonts: HashMap<String, Option<Rc<Font>>>,
}

impl ResourceCache {
    pub fn new(loader: impl ResourceLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            textures: HashMap::new(),
            models: HashMap::new(),
            cubemaps: HashMap::new(),
            fonts: HashMap::new(),
        }
    }

    /// Returns the texture registered under `name`, loading it on first use
    pub fn resolve_texture(&mut self, name: &str, backend: &mut dyn RenderBackend) -> TextureHandle {
        if name.is_empty() {
            return TextureHandle::NULL;
        }
        if let Some(handle) = self.textures.get(name) {
            return *handle;
        }

        let handle = match self.loader.load_image(name) {
            Ok(image) => backend.create_texture(image.width, image.height, &image.pixels),
            Err(err) => {
                warn!("Texture '{}' unavailable: {}", name, err);
                TextureHandle::NULL
            }
        };
        debug!("Cached texture '{}' as {:?}", name, handle);
        self.textures.insert(name.to_owned(), handle);
        handle
    }

    pub fn register_texture(&mut self, name: &str, handle: TextureHandle) {
        self.textures.insert(name.to_owned(), handle);
    }

    /// Name a non-null texture was registered under
    pub fn texture_name(&self, handle: TextureHandle) -> Option<&str> {
        if handle.is_null() {
            return None;
        }
        self.textures
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(name, _)| name.as_str())
    }

    /// Returns the model registered under `name`, loading it on first use
    pub fn resolve_model(&mut self, name: &str, backend: &mut dyn RenderBackend) -> ModelHandle {
        if name.is_empty() {
            return ModelHandle::NULL;
        }
        if let Some(handle) = self.models.get(name) {
            return *handle;
        }

        let handle = match self.loader.load_model(name) {
            Ok(mesh) => backend.create_model(&mesh),
            Err(err) => {
                warn!("Model '{}' unavailable: {}", name, err);
                ModelHandle::NULL
            }
        };
        debug!("Cached model '{}' as {:?}", name, handle);
        self.models.insert(name.to_owned(), handle);
        handle
    }

    pub fn register_model(&mut self, name: &str, handle: ModelHandle) {
        self.models.insert(name.to_owned(), handle);
    }

    pub fn model_name(&self, handle: ModelHandle) -> Option<&str> {
        if handle.is_null() {
            return None;
        }
        self.models
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(name, _)| name.as_str())
    }

    /// Returns the cube map built from these six faces, loading it on first use
    ///
    /// A missing face makes the whole cube map null.
    pub fn resolve_cubemap(
        &mut self,
        faces: &[String; 6],
        backend: &mut dyn RenderBackend,
    ) -> CubemapHandle {
        if faces.iter().any(|face| face.is_empty()) {
            return CubemapHandle::NULL;
        }
        if let Some(handle) = self.cubemaps.get(faces) {
            return *handle;
        }

        let mut images = Vec::with_capacity(6);
        for face in faces {
            match self.loader.load_image(face) {
                Ok(image) => images.push(image),
                Err(err) => {
                    warn!("Cube map face '{}' unavailable: {}", face, err);
                    break;
                }
            }
        }

        let handle = match <[ImageData; 6]>::try_from(images) {
            Ok(images) => backend.create_cubemap(&images),
            Err(_) => CubemapHandle::NULL,
        };
        self.cubemaps.insert(faces.clone(), handle);
        handle
    }

    pub fn register_cubemap(&mut self, faces: [String; 6], handle: CubemapHandle) {
        self.cubemaps.insert(faces, handle);
    }

    /// Face names a non-null cube map was built from
    pub fn cubemap_faces(&self, handle: CubemapHandle) -> Option<&[String; 6]> {
        if handle.is_null() {
            return None;
        }
        self.cubemaps
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(faces, _)| faces)
    }

    /// Returns the font at `path`, parsing it on first use
    pub fn resolve_font(&mut self, path: &str) -> Option<Rc<Font>> {
        if path.is_empty() {
            return None;
        }
        if let Some(font) = self.fonts.get(path) {
            return font.clone();
        }

        let font = match self.loader.load_font(path) {
            Ok(font) => Some(Rc::new(font)),
            Err(err) => {
                warn!("Font '{}' unavailable: {}", path, err);
                None
            }
        };
        self.fonts.insert(path.to_owned(), font.clone());
        font
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn cubemap_count(&self) -> usize {
        self.cubemaps.len()
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("textures", &self.textures)
            .field("models", &self.models)
            .field("cubemaps", &self.cubemaps)
            .field("fonts", &self.fonts.keys().collect::<Vec<_>>())
            .finish()
    }
}
