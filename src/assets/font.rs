use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use sha2::Digest as _;
use usvg::fontdb;

use crate::foundation::error::{ReelError, ReelResult};

/// Families tried in order when no explicit font is configured.
const FALLBACK_FAMILIES: &[&str] = &[
    "Inter",
    "Roboto",
    "Segoe UI",
    "Helvetica Neue",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
];

/// Where caption text gets its typeface from.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSource {
    /// Bold sans-serif face discovered from the system font directories.
    #[default]
    System,
    /// A specific TTF/OTF/TTC file.
    File(PathBuf),
}

/// Raw font bytes plus the face index inside them.
#[derive(Clone, Debug)]
pub struct CaptionFont {
    /// Human-readable family name, for diagnostics.
    pub family: String,
    /// Raw TTF/OTF/TTC bytes.
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection file.
    pub index: u32,
}

impl CaptionFont {
    /// Load the font named by `source`.
    pub fn resolve(source: &FontSource) -> ReelResult<Self> {
        match source {
            FontSource::File(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read font '{}'", path.display()))?;
                let family = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "custom".to_string());
                Self::from_bytes(family, bytes)
            }
            FontSource::System => Self::from_system(),
        }
    }

    /// Wrap font file bytes, using the first face.
    pub fn from_bytes(family: impl Into<String>, bytes: Vec<u8>) -> ReelResult<Self> {
        if bytes.is_empty() {
            return Err(ReelError::validation("font file is empty"));
        }
        Ok(Self {
            family: family.into(),
            bytes: Arc::new(bytes),
            index: 0,
        })
    }

    /// Pick a bold sans-serif face from the system font directories.
    #[tracing::instrument]
    pub fn from_system() -> ReelResult<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system font database");

        let id = pick_face(&db).ok_or_else(|| {
            ReelError::validation(
                "no usable system font found; pass an explicit font file with --font",
            )
        })?;

        let family = db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_else(|| "unknown".to_string());
        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| {
                ReelError::validation(format!("failed to load font data for '{family}'"))
            })?;

        tracing::info!(%family, index, "resolved caption font");
        Ok(Self {
            family,
            bytes: Arc::new(bytes),
            index,
        })
    }

    /// Lowercase hex SHA-256 of the font bytes.
    pub fn sha256_hex(&self) -> String {
        let digest = sha2::Sha256::digest(self.bytes.as_slice());
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

fn pick_face(db: &fontdb::Database) -> Option<fontdb::ID> {
    let bold = |family| {
        db.query(&fontdb::Query {
            families: &[family],
            weight: fontdb::Weight::BOLD,
            ..fontdb::Query::default()
        })
    };

    bold(fontdb::Family::SansSerif)
        .or_else(|| {
            FALLBACK_FAMILIES
                .iter()
                .find_map(|name| bold(fontdb::Family::Name(*name)))
        })
        .or_else(|| db.faces().next().map(|f| f.id))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/font.rs"]
mod tests;
