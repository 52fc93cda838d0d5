//! Structural validation of extracted recipes.
//!
//! Every pipeline path runs its result through [`validate_recipe`] before
//! returning it, regardless of which source produced the recipe.

use log::warn;

use crate::error::ExtractError;
use crate::model::{Recipe, UNKNOWN_TITLE};

/// Fraction of ingredient lines that may lack a leading quantity before
/// the recipe draws a warning.
const MISSING_QUANTITY_THRESHOLD: f64 = 0.7;

/// Reject structurally unusable recipes and log advisory warnings for
/// the rest.
///
/// A recipe without ingredients or without instructions is not a recipe;
/// everything else (odd titles, unquantified ingredients) passes with a
/// warning so the user still gets their extraction.
pub fn validate_recipe(recipe: &Recipe) -> Result<(), ExtractError> {
    if recipe.ingredients.is_empty() {
        return Err(ExtractError::IncompleteRecipe(
            "no ingredients found".to_string(),
        ));
    }
    if recipe.instructions.is_empty() {
        return Err(ExtractError::IncompleteRecipe(
            "no instructions found".to_string(),
        ));
    }

    for warning in quality_warnings(recipe) {
        warn!("{warning}");
    }

    Ok(())
}

/// Advisory quality findings. Never fails, never logs.
pub fn quality_warnings(recipe: &Recipe) -> Vec<String> {
    let mut warnings = Vec::new();

    if recipe.title.trim().is_empty() || recipe.title == UNKNOWN_TITLE {
        warnings.push("recipe has no usable title".to_string());
    }

    // Group headers are labels, not ingredients, so they stay out of the
    // quantity statistics.
    let lines: Vec<&str> = recipe.ingredient_lines().collect();
    if !lines.is_empty() {
        let without_quantity = lines
            .iter()
            .filter(|line| !line.trim().starts_with(|c: char| c.is_ascii_digit()))
            .count();
        if without_quantity as f64 > MISSING_QUANTITY_THRESHOLD * lines.len() as f64 {
            warnings.push(format!(
                "{without_quantity} of {} ingredient lines have no leading quantity",
                lines.len()
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_recipe() -> Recipe {
        Recipe {
            title: "Pancakes".to_string(),
            ingredients: vec!["200g flour".to_string(), "2 eggs".to_string()],
            instructions: vec!["Mix".to_string(), "Fry".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_recipe_passes() {
        assert!(validate_recipe(&minimal_recipe()).is_ok());
    }

    #[test]
    fn test_missing_ingredients_rejected() {
        let mut recipe = minimal_recipe();
        recipe.ingredients.clear();
        let err = validate_recipe(&recipe).unwrap_err();
        assert!(matches!(err, ExtractError::IncompleteRecipe(_)));
        assert!(!err.is_soft());
    }

    #[test]
    fn test_missing_instructions_rejected() {
        let mut recipe = minimal_recipe();
        recipe.instructions.clear();
        assert!(matches!(
            validate_recipe(&recipe),
            Err(ExtractError::IncompleteRecipe(_))
        ));
    }

    #[test]
    fn test_placeholder_title_warns() {
        let mut recipe = minimal_recipe();
        recipe.title = UNKNOWN_TITLE.to_string();
        let warnings = quality_warnings(&recipe);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("title"));
        // still passes validation
        assert!(validate_recipe(&recipe).is_ok());
    }

    #[test]
    fn test_unquantified_ingredients_warn() {
        let mut recipe = minimal_recipe();
        recipe.ingredients = vec![
            "flour".to_string(),
            "salt".to_string(),
            "pepper".to_string(),
            "1 egg".to_string(),
        ];
        let warnings = quality_warnings(&recipe);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("3 of 4"));
    }

    #[test]
    fn test_group_headers_excluded_from_quantity_stats() {
        let mut recipe = minimal_recipe();
        recipe.ingredients = vec![
            "## For the sauce".to_string(),
            "## For the dough".to_string(),
            "200g tomatoes".to_string(),
        ];
        assert!(quality_warnings(&recipe).is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut recipe = minimal_recipe();
        // 7 of 10 without quantity is exactly the threshold, not over it
        recipe.ingredients = (0..10)
            .map(|i| {
                if i < 3 {
                    format!("{i} pinch of salt")
                } else {
                    "salt".to_string()
                }
            })
            .collect();
        assert!(quality_warnings(&recipe).is_empty());
    }
}
