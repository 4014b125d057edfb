//! Reader session: owns the font registry and the layout engine from
//! startup to shutdown.

use serde::{Deserialize, Serialize};

use crate::display_list::Surface;
use crate::error::FontError;
use crate::font_registry::{FaceSpec, FontRegistry, RegistryOptions};
use crate::page::{LayoutEngine, LayoutOptions};
use crate::rasterizer::{FaceLoader, FontdueLoader};

/// Startup configuration, loadable from JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub registry: RegistryOptions,
    pub layout: LayoutOptions,
    /// Default faces, loaded in order; the first `registry.sticky_entries`
    /// of them survive non-destructive font clears.
    pub faces: Vec<FaceSpec>,
}

/// Explicitly owned layout state for one reader.
#[derive(Debug)]
pub struct ReaderSession<L: FaceLoader = FontdueLoader> {
    config: SessionConfig,
    engine: LayoutEngine<L>,
}

impl<L> ReaderSession<L>
where
    L: FaceLoader + Default,
{
    /// Load the configured faces and build the engine.
    pub fn init(config: SessionConfig) -> Result<Self, FontError> {
        Self::init_with_loader(L::default(), config)
    }
}

impl<L> ReaderSession<L>
where
    L: FaceLoader,
{
    pub fn init_with_loader(loader: L, config: SessionConfig) -> Result<Self, FontError> {
        let mut fonts = FontRegistry::with_loader(loader, config.registry);
        fonts.setup(&config.faces)?;
        if config.faces.len() < config.registry.sticky_entries {
            log::warn!(
                "{} default faces configured, {} expected to be sticky",
                config.faces.len(),
                config.registry.sticky_entries
            );
        }
        let engine = LayoutEngine::new(fonts, config.layout);
        log::debug!("reader session started with {} faces", config.faces.len());
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> &LayoutEngine<L> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LayoutEngine<L> {
        &mut self.engine
    }

    /// Match glyph rendering to the panel `surface` drives.
    pub fn attach_surface<S>(&mut self, surface: &S)
    where
        S: Surface + ?Sized,
    {
        self.engine.set_pixel_depth(surface.pixel_depth());
    }

    /// Drop book faces loaded since startup, keeping the sticky defaults.
    pub fn close_book(&mut self) {
        self.engine.fonts_mut().clear(false);
    }

    /// Release every face and return the loader.
    pub fn shutdown(self) -> L {
        let fonts = self.engine.into_fonts();
        log::debug!("reader session shutdown, releasing {} faces", fonts.len());
        fonts.into_loader()
    }
}
