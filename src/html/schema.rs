//! schema.org Recipe extraction from embedded JSON-LD.
//!
//! Many recipe sites ship perfectly structured data; when they do, this path
//! is far more accurate than model extraction and costs nothing.

use html_escape::decode_html_entities;
use log::{debug, info};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::model::Recipe;

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?").unwrap());

/// Scan all `application/ld+json` script blocks for a schema.org Recipe and
/// convert the first complete candidate.
///
/// Returns `None` when no block yields a recipe with both ingredients and
/// instructions; the caller then falls back to model extraction. Malformed
/// blocks are skipped, never fatal.
pub fn extract_schema_recipe(html: &str, url: &str) -> Option<Recipe> {
    let selector = Selector::parse("script[type='application/ld+json']").unwrap();
    let document = Html::parse_document(html);

    for (index, script) in document.select(&selector).enumerate() {
        let json: Value = match serde_json::from_str(&script.inner_html()) {
            Ok(v) => v,
            Err(e) => {
                debug!("skipping JSON-LD block {index}: {e}");
                continue;
            }
        };

        for candidate in candidates(&json) {
            if let Some(recipe) = parse_candidate(candidate, url) {
                info!("schema recipe found: {}", recipe.title);
                return Some(recipe);
            }
        }
    }

    None
}

/// The positions a recipe object can occupy in a JSON-LD document: the value
/// itself, an element of a top-level array, or an `@graph` member.
fn candidates(json: &Value) -> Vec<&Value> {
    match json {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph").and_then(Value::as_array) {
            Some(graph) => graph.iter().collect(),
            None => vec![json],
        },
        _ => Vec::new(),
    }
}

/// `@type` may be a single string or a list of types.
fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Recipe",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Recipe")),
        _ => false,
    }
}

fn parse_candidate(value: &Value, url: &str) -> Option<Recipe> {
    if !is_recipe_type(value) {
        return None;
    }

    let parsed: JsonLdRecipe = match serde_json::from_value(value.clone()) {
        Ok(p) => p,
        Err(e) => {
            debug!("recipe-typed block failed to deserialize: {e}");
            return None;
        }
    };

    let title = decode_html_symbols(parsed.name.as_deref().unwrap_or("").trim());
    if title.is_empty() {
        return None;
    }

    let ingredients: Vec<String> = match parsed.recipe_ingredient {
        Some(Ingredients::Many(items)) => items
            .iter()
            .map(|i| decode_html_symbols(i.trim()))
            .filter(|i| !i.is_empty())
            .collect(),
        Some(Ingredients::One(text)) => split_lines(&text),
        None => Vec::new(),
    };

    let instructions: Vec<String> = match parsed.recipe_instructions {
        Some(Instructions::Text(text)) => split_lines(&text),
        Some(Instructions::Entries(entries)) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                InstructionEntry::Text(s) => Some(s),
                // Step objects carry their content in `text`; section
                // containers without one contribute nothing
                InstructionEntry::Step(step) => step.text,
            })
            .map(|s| decode_html_symbols(s.trim()))
            .filter(|s| !s.is_empty())
            .collect(),
        None => Vec::new(),
    };

    // A block without both lists is not usable on its own; let scanning
    // continue so the model fallback gets a chance
    if ingredients.is_empty() || instructions.is_empty() {
        debug!("schema candidate '{title}' incomplete, skipping");
        return None;
    }

    let servings = parsed.recipe_yield.map(|y| y.into_text());

    let mut tags = Vec::new();
    if let Some(category) = parsed.recipe_category {
        tags.extend(category.into_vec());
    }
    if let Some(cuisine) = parsed.recipe_cuisine {
        tags.extend(cuisine.into_vec());
    }
    match parsed.keywords {
        Some(Keywords::One(kw)) => tags.extend(
            kw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from),
        ),
        Some(Keywords::Many(kw)) => tags.extend(kw),
        None => {}
    }

    let creator = parsed.author.and_then(|author| match author {
        Author::Name(name) => Some(name),
        Author::Object(obj) => obj.name,
        Author::Many(objs) => objs.into_iter().find_map(|o| o.name),
    });

    Some(Recipe {
        title,
        servings,
        prep_time: parsed.prep_time.as_deref().and_then(humanize_iso_duration),
        cook_time: parsed.cook_time.as_deref().and_then(humanize_iso_duration),
        total_time: parsed.total_time.as_deref().and_then(humanize_iso_duration),
        difficulty: None,
        tags,
        ingredients,
        instructions,
        equipment: Vec::new(),
        notes: Vec::new(),
        source_url: Some(url.to_string()),
        source_platform: Some("web".to_string()),
        creator: creator.map(|c| decode_html_symbols(c.trim())),
    })
}

/// Decompose an ISO 8601 duration into the compact human form used
/// throughout the recipe fields: "1h 30min", "2h", "45 min".
///
/// Anything without an hour or minute component (including non-ISO input)
/// maps to `None`.
pub(crate) fn humanize_iso_duration(iso: &str) -> Option<String> {
    let caps = DURATION_RE.captures(iso)?;
    let hours: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
    let mins: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);

    match (hours, mins) {
        (0, 0) => None,
        (h, 0) => Some(format!("{h}h")),
        (0, m) => Some(format!("{m} min")),
        (h, m) => Some(format!("{h}h {m}min")),
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| decode_html_symbols(line.trim()))
        .filter(|line| !line.is_empty())
        .collect()
}

fn decode_html_symbols(text: &str) -> String {
    // for some reason need to decode twice to get the correct string
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    name: Option<String>,
    #[serde(rename = "recipeIngredient")]
    recipe_ingredient: Option<Ingredients>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<Instructions>,
    #[serde(rename = "recipeYield")]
    recipe_yield: Option<RecipeYield>,
    #[serde(rename = "prepTime")]
    prep_time: Option<String>,
    #[serde(rename = "cookTime")]
    cook_time: Option<String>,
    #[serde(rename = "totalTime")]
    total_time: Option<String>,
    #[serde(rename = "recipeCategory")]
    recipe_category: Option<StringOrList>,
    #[serde(rename = "recipeCuisine")]
    recipe_cuisine: Option<StringOrList>,
    keywords: Option<Keywords>,
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Ingredients {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Instructions {
    Text(String),
    Entries(Vec<InstructionEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionEntry {
    Text(String),
    Step(StepObject),
}

#[derive(Debug, Deserialize)]
struct StepObject {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeYield {
    Text(String),
    Number(serde_json::Number),
    List(Vec<RecipeYield>),
}

impl RecipeYield {
    fn into_text(self) -> String {
        match self {
            RecipeYield::Text(s) => s,
            RecipeYield::Number(n) => n.to_string(),
            RecipeYield::List(items) => items
                .into_iter()
                .next()
                .map(RecipeYield::into_text)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(s) => vec![s],
            StringOrList::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Keywords {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Author {
    Name(String),
    Object(AuthorObject),
    Many(Vec<AuthorObject>),
}

#[derive(Debug, Deserialize)]
struct AuthorObject {
    name: Option<String>,
}
