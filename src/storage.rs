//! Markdown archive for extracted recipes.

use std::path::{Path, PathBuf};

use log::info;
use tokio::fs;
use uuid::Uuid;

use crate::error::ExtractError;
use crate::model::Recipe;
use crate::render::render_markdown;

const MAX_SLUG_CHARS: usize = 80;
const MAX_NAME_ATTEMPTS: usize = 5;

/// Make a recipe title filesystem-safe but still readable: drop reserved
/// characters, collapse whitespace, cap the length.
pub fn sanitize_filename(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !"<>:\"/\\|?*".contains(*c))
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect()
}

/// Write the recipe's markdown rendition into `dir`.
///
/// The file is named after the title; when that name is taken, a short
/// random suffix is appended, with a bounded number of attempts.
pub async fn save_recipe(recipe: &Recipe, dir: &Path) -> Result<PathBuf, ExtractError> {
    fs::create_dir_all(dir).await?;

    let base = sanitize_filename(&recipe.title);
    let base = if base.is_empty() {
        "recipe".to_string()
    } else {
        base
    };

    let mut path = dir.join(format!("{base}.md"));
    let mut attempts = 0;
    while fs::try_exists(&path).await? {
        attempts += 1;
        if attempts > MAX_NAME_ATTEMPTS {
            return Err(ExtractError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("no free file name for '{base}' after {MAX_NAME_ATTEMPTS} attempts"),
            )));
        }
        let id = Uuid::new_v4().simple().to_string();
        path = dir.join(format!("{base}-{}.md", &id[..8]));
    }

    fs::write(&path, render_markdown(recipe)).await?;
    info!("recipe archived at {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe(title: &str) -> Recipe {
        Recipe {
            title: title.to_string(),
            ingredients: vec!["1 egg".to_string()],
            instructions: vec!["Fry it".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_sanitize_removes_reserved_characters() {
        assert_eq!(sanitize_filename("Fish & Chips"), "Fish & Chips");
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "abcdefghij");
        assert_eq!(sanitize_filename("  spaced   out \t title "), "spaced out title");
        assert_eq!(sanitize_filename("Crème brûlée"), "Crème brûlée");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "x".repeat(120);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_SLUG_CHARS);
    }

    #[tokio::test]
    async fn test_save_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_recipe(&sample_recipe("Shakshuka"), dir.path())
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap().to_str(), Some("Shakshuka.md"));
        let content = fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("## Ingredients"));
        assert!(content.contains("- 1 egg"));
    }

    #[tokio::test]
    async fn test_collision_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let first = save_recipe(&sample_recipe("Toast"), dir.path()).await.unwrap();
        let second = save_recipe(&sample_recipe("Toast"), dir.path()).await.unwrap();

        assert_ne!(first, second);
        let name = second.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Toast-"));
        assert!(name.ends_with(".md"));
        assert!(fs::try_exists(&second).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_title_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_recipe(&sample_recipe("***"), dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap().to_str(), Some("recipe.md"));
    }
}
