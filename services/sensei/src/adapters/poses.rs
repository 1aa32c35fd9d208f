//! services/sensei/src/adapters/poses.rs
//!
//! A filesystem implementation of the `PoseCatalog` port. Each emotion is a
//! directory of `.png` files under the media root; `attentive` is the fallback.

use code_sensei_core::{
    domain::{Emotion, Pose},
    ports::{PortError, PortResult, PoseCatalog},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

pub struct FsPoseCatalog {
    root: PathBuf,
    rng: Mutex<StdRng>,
}

impl FsPoseCatalog {
    /// Creates a catalog rooted at `root`. A `seed` makes selection deterministic.
    pub fn new(root: PathBuf, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            root,
            rng: Mutex::new(rng),
        }
    }

    /// Lists the image files for an emotion, sorted so a seeded RNG is reproducible.
    fn images(&self, emotion: Emotion) -> Vec<String> {
        let dir = self.root.join(emotion.as_str());
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read pose directory {}: {}", dir.display(), e);
                return Vec::new();
            }
        };
        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".png"))
            .collect();
        files.sort();
        files
    }
}

impl PoseCatalog for FsPoseCatalog {
    fn pick(&self, emotion: Emotion) -> PortResult<Pose> {
        let mut effective = emotion;
        let mut files = self.images(emotion);
        if files.is_empty() && emotion != Emotion::Attentive {
            effective = Emotion::Attentive;
            files = self.images(Emotion::Attentive);
        }
        if files.is_empty() {
            return Err(PortError::NotFound(format!(
                "no pose images for '{}' or the '{}' fallback under {}",
                emotion,
                Emotion::Attentive,
                self.root.display()
            )));
        }

        let index = self
            .rng
            .lock()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .gen_range(0..files.len());
        Ok(Pose {
            effective,
            file_name: files.swap_remove(index),
        })
    }
}
