//! Texture resolution for offline validation

use std::path::PathBuf;

use cadence_core::{ResourceProvider, TextureId};

/// Resolves texture references against a directory.
///
/// Without a directory every non-empty reference resolves, so definitions
/// can be checked for structure alone.
#[derive(Debug, Default)]
pub struct TextureDir {
    root: Option<PathBuf>,
    loaded: Vec<String>,
}

impl TextureDir {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            loaded: Vec::new(),
        }
    }
}

impl ResourceProvider for TextureDir {
    fn load_texture(&mut self, reference: &str) -> Option<TextureId> {
        if reference.is_empty() {
            return None;
        }
        if let Some(root) = &self.root
            && !root.join(reference).is_file()
        {
            return None;
        }

        if let Some(idx) = self.loaded.iter().position(|r| r == reference) {
            return Some(TextureId(idx as u64 + 1));
        }
        self.loaded.push(reference.to_string());
        Some(TextureId(self.loaded.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_root_everything_resolves() {
        let mut textures = TextureDir::new(None);
        assert_eq!(textures.load_texture("arrow.png"), Some(TextureId(1)));
        assert_eq!(textures.load_texture("circle.png"), Some(TextureId(2)));
        assert_eq!(textures.load_texture("arrow.png"), Some(TextureId(1)));
        assert_eq!(textures.load_texture(""), None);
    }

    #[test]
    fn with_root_missing_files_fail() {
        let mut textures = TextureDir::new(Some(PathBuf::from("/definitely/not/here")));
        assert_eq!(textures.load_texture("arrow.png"), None);
    }
}
