//! The smile service: inspiration in, picture on disk out.
//!
//! [`SmileService`] owns the database, the tag catalog and the image
//! provider. The web layer and the CLI both go through it, so a picture
//! generated from the terminal lands in the same place, with the same
//! prompt log line, as one generated from the browser.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::config::Layout;
use crate::imagegen::{fit_image, GenerateError, ImageProvider, FRAME_HEIGHT, FRAME_WIDTH};
use crate::inspiration::{build_prompt, generate_inspiration, Catalog, InspirationError};
use crate::storage::{Database, Generation, Selections};

/// Rating that earns a picture a place in the album.
pub const ALBUM_RATING: u8 = 5;

/// Errors that can occur while producing a picture.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The images API (or decoding its answer) failed.
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// No tags could be chosen.
    #[error(transparent)]
    Inspiration(#[from] InspirationError),

    /// Anything else: file writes, database, task joins.
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

/// Creates the directory layout and opens the seeded database.
pub fn init_layout(layout: &Layout, catalog: &Catalog) -> Result<Database> {
    for dir in [layout.generated_dir(), layout.album_dir()] {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let db = Database::open(&layout.db_path())?;
    let inserted = db.seed_items(catalog.items())?;
    if inserted > 0 {
        tracing::info!("Seeded {} new inspiration tags", inserted);
    }
    Ok(db)
}

/// Shared application service.
pub struct SmileService {
    layout: Layout,
    catalog: Catalog,
    db: Mutex<Database>,
    provider: Arc<dyn ImageProvider>,
}

impl SmileService {
    /// Opens the service with the built-in catalog.
    pub fn open(layout: Layout, provider: Arc<dyn ImageProvider>) -> Result<Self> {
        Self::with_catalog(layout, Catalog::builtin(), provider)
    }

    pub fn with_catalog(
        layout: Layout,
        catalog: Catalog,
        provider: Arc<dyn ImageProvider>,
    ) -> Result<Self> {
        let db = init_layout(&layout, &catalog)?;
        Ok(Self {
            layout,
            catalog,
            db: Mutex::new(db),
            provider,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("Database lock poisoned"))
    }

    /// Runs `f` with the database locked.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db = self.db()?;
        f(&db)
    }

    /// Picks fresh tags for every category.
    pub fn inspire(&self) -> Result<Selections, ServiceError> {
        let db = self.db()?;
        let mut rng = rand::thread_rng();
        Ok(generate_inspiration(&db, &self.catalog, &mut rng)?)
    }

    /// Generates a new picture and writes it under `static/generated/`.
    pub async fn generate(&self) -> Result<Generation, ServiceError> {
        let selections = self.inspire()?;
        let prompt = build_prompt(&selections);

        if let Err(e) = self.append_prompt_log(&prompt) {
            tracing::warn!("Failed to append to prompt log: {:#}", e);
        }

        tracing::info!(model = self.provider.model(), ?selections, "Generating image");

        let raw = self.provider.generate(&prompt).await.inspect_err(|e| {
            tracing::warn!("Image generation failed: {}", e);
        })?;

        let fitted = tokio::task::spawn_blocking(move || fit_image(&raw, FRAME_WIDTH, FRAME_HEIGHT))
            .await
            .map_err(|e| anyhow!("Image processing task failed: {e}"))??;

        let filename = format!("smile_{}.png", Uuid::new_v4().simple());
        let path = self.layout.generated_dir().join(&filename);
        tokio::fs::write(&path, &fitted)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let image_path = format!("generated/{filename}");
        tracing::info!("Saved generated image to {}", image_path);

        Ok(Generation {
            selections,
            prompt,
            image_path,
        })
    }

    /// Appends one line to `prompt_log.txt`.
    pub fn append_prompt_log(&self, prompt: &str) -> Result<()> {
        let path = self.layout.prompt_log_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let flattened = prompt.replace(['\r', '\n'], " ");
        writeln!(
            file,
            "{}\t{}\t{}",
            Utc::now().to_rfc3339(),
            self.provider.model(),
            flattened
        )?;
        Ok(())
    }

    /// Records a rating for a generation.
    ///
    /// A top rating also copies the picture into the album; the returned
    /// path is that copy, if one was made.
    pub fn rate(&self, rating: u8, generation: &Generation) -> Result<Option<String>> {
        self.db()?.record_rating(rating, &generation.selections)?;
        tracing::info!(rating, image = %generation.image_path, "Recorded rating");

        if rating == ALBUM_RATING {
            return self.save_to_album(&generation.image_path);
        }
        Ok(None)
    }

    /// Copies `static/<image_path>` into the album.
    ///
    /// Empty, missing or escaping paths are a no-op.
    pub fn save_to_album(&self, image_path: &str) -> Result<Option<String>> {
        let Some(source) = self.resolve_static(image_path) else {
            return Ok(None);
        };
        if !source.is_file() {
            tracing::debug!("Album source {} does not exist", source.display());
            return Ok(None);
        }

        let filename = format!("album_{}.png", Uuid::new_v4().simple());
        let destination = self.layout.album_dir().join(&filename);
        fs::copy(&source, &destination).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                destination.display()
            )
        })?;

        let saved = format!("album_images/{filename}");
        tracing::info!("Saved {} to album as {}", image_path, saved);
        Ok(Some(saved))
    }

    /// Album images, relative to `static/`, sorted by file name.
    pub fn list_album(&self) -> Result<Vec<String>> {
        let dir = self.layout.album_dir();
        let pattern = format!(
            "{}/*.png",
            glob::Pattern::escape(&dir.to_string_lossy())
        );

        let mut names: Vec<String> = glob::glob(&pattern)
            .context("Invalid album glob pattern")?
            .filter_map(|entry| entry.ok())
            .filter_map(|path| {
                path.file_name()
                    .map(|n| format!("album_images/{}", n.to_string_lossy()))
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Joins a `static/`-relative path, refusing anything that climbs out.
    fn resolve_static(&self, relative: &str) -> Option<PathBuf> {
        if relative.trim().is_empty() {
            return None;
        }
        let rel = Path::new(relative);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.layout.static_dir().join(rel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Category;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    struct FixedProvider(Result<Vec<u8>, u16>);

    #[async_trait]
    impl ImageProvider for FixedProvider {
        async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, GenerateError> {
            match &self.0 {
                Ok(bytes) => Ok(bytes.clone()),
                Err(status) => Err(GenerateError::HttpError {
                    status: *status,
                    body: "nope".to_string(),
                }),
            }
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn tiny_png() -> Vec<u8> {
        let img = RgbImage::from_pixel(16, 16, Rgb([10, 120, 240]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn service(provider: FixedProvider) -> (SmileService, tempfile::TempDir) {
        let dir = tempdir().expect("Failed to create temp directory");
        let svc = SmileService::open(Layout::new(dir.path()), Arc::new(provider))
            .expect("Failed to open service");
        (svc, dir)
    }

    #[test]
    fn test_open_creates_layout() {
        let (svc, _dir) = service(FixedProvider(Ok(tiny_png())));
        assert!(svc.layout().generated_dir().is_dir());
        assert!(svc.layout().album_dir().is_dir());
        assert!(svc.layout().db_path().is_file());
        let items = svc.with_db(|db| db.item_count()).unwrap();
        assert_eq!(items as usize, Catalog::builtin().len());
    }

    #[tokio::test]
    async fn test_generate_writes_fitted_png_and_logs_prompt() {
        let (svc, _dir) = service(FixedProvider(Ok(tiny_png())));

        let generation = svc.generate().await.expect("Generation should succeed");

        assert!(generation.selections.is_complete());
        assert!(generation.image_path.starts_with("generated/smile_"));
        let written = svc.layout().static_dir().join(&generation.image_path);
        let img = image::open(&written).expect("Generated file should be an image");
        assert_eq!((img.width(), img.height()), (FRAME_WIDTH, FRAME_HEIGHT));

        let log = fs::read_to_string(svc.layout().prompt_log_path()).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("\tfixed\t"));
        assert!(log.contains(&generation.prompt));
    }

    #[tokio::test]
    async fn test_failed_generation_still_logs_prompt() {
        let (svc, _dir) = service(FixedProvider(Err(500)));

        match svc.generate().await {
            Err(ServiceError::Generate(GenerateError::HttpError { status: 500, .. })) => {}
            other => panic!("Expected HttpError, got: {other:?}"),
        }

        let log = fs::read_to_string(svc.layout().prompt_log_path()).unwrap();
        assert_eq!(log.lines().count(), 1);
        let generated = fs::read_dir(svc.layout().generated_dir()).unwrap().count();
        assert_eq!(generated, 0, "Nothing should be written on failure");
    }

    #[tokio::test]
    async fn test_top_rating_saves_to_album() {
        let (svc, _dir) = service(FixedProvider(Ok(tiny_png())));
        let generation = svc.generate().await.unwrap();

        assert_eq!(svc.rate(4, &generation).unwrap(), None);
        assert!(svc.list_album().unwrap().is_empty());

        let saved = svc.rate(5, &generation).unwrap().expect("Album copy expected");
        assert_eq!(svc.list_album().unwrap(), vec![saved.clone()]);
        assert!(svc.layout().static_dir().join(&saved).is_file());

        let actor = generation.selections.get(Category::Actors).unwrap();
        let score = svc
            .with_db(|db| db.item_scores(Category::Actors))
            .unwrap()
            .into_iter()
            .find(|s| s.name == actor)
            .unwrap();
        assert_eq!(score.total_score, 9);
        assert_eq!(score.rating_count, 2);
    }

    #[test]
    fn test_save_to_album_ignores_bad_paths() {
        let (svc, _dir) = service(FixedProvider(Ok(tiny_png())));

        assert_eq!(svc.save_to_album("").unwrap(), None);
        assert_eq!(svc.save_to_album("generated/missing.png").unwrap(), None);
        assert_eq!(svc.save_to_album("../smiles.db").unwrap(), None);
        assert_eq!(svc.save_to_album("/etc/passwd").unwrap(), None);
        assert!(svc.list_album().unwrap().is_empty());
    }
}
