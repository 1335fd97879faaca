use log::{debug, warn};
use rusttype::{Font, Scale};

pub(crate) struct FontConfig {
    pub font: Font<'static>,
    pub scale: Scale,
}

/// The dashboard's font, loaded once at start-up. Text is skipped when the
/// configured font file cannot be read.
#[derive(Clone)]
pub struct Fonts {
    font: Option<Font<'static>>,
}

impl Fonts {
    pub fn load(path: &str) -> Self {
        if path.is_empty() {
            return Self::none();
        }
        let font = std::fs::read(path)
            .ok()
            .and_then(Font::try_from_vec);
        match font {
            Some(_) => debug!("Loaded font {}", path),
            None => warn!("Could not load font {}; text will not be drawn", path),
        }
        Self { font }
    }

    pub fn none() -> Self {
        Self { font: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.font.is_some()
    }

    pub(crate) fn title(&self) -> Option<FontConfig> {
        self.sized(22.0)
    }

    pub(crate) fn regular(&self) -> Option<FontConfig> {
        self.sized(18.0)
    }

    pub(crate) fn small(&self) -> Option<FontConfig> {
        self.sized(14.0)
    }

    fn sized(&self, scale: f32) -> Option<FontConfig> {
        self.font.clone().map(|font| FontConfig {
            font,
            scale: Scale::uniform(scale),
        })
    }
}
