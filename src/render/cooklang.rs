//! Cooklang (`.cook`) rendering.
//!
//! Covers the Cooklang features the format needs: YAML frontmatter,
//! `@ingredient{amount%unit}(prep)` markup, `#cookware{}`, `~{time%unit}`
//! timers, `== Section ==` grouping and `>` notes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::Recipe;

const MAX_TAGS: usize = 10;
/// Ingredient lines longer than this are truncated instead of parsed.
const MAX_INGREDIENT_CHARS: usize = 200;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d+(?:\s*-\s*\d+)?)\s*(Minuten?|Min\.?|minutes?|min\.?|Stunden?|Std\.?|hours?|hrs?\.?|Sekunden?|Sek\.?|seconds?|sec\.?|secs?\.?)\b",
    )
    .unwrap()
});

static PREP_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)gehackt|geschnitten|gewürfelt|gerieben|gepresst|gehobelt|zerkleinert|püriert|gestampft|mariniert|eingeweicht|aufgetaut|zimmerwarm|kalt|warm|weich|hart|frisch|getrocknet|chopped|diced|minced|sliced|grated|pressed|crushed|softened|melted|room temperature|cold|fresh|dried",
    )
    .unwrap()
});

// Amount span is length-capped so a degenerate line cannot blow up parsing
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d[\d.,/\s-]{0,20})\s*([a-zA-ZäöüÄÖÜß]{1,15})?\s+(.+)$").unwrap()
});

static PAREN_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(([^)]+)\)\s*$").unwrap());
static COMMA_HINT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([^,]+)$").unwrap());
static NAME_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.,/\s-]+\s*[a-zA-ZäöüÄÖÜß]*\s+(.+)$").unwrap());

/// Render a recipe as Cooklang source.
pub fn render_cooklang(recipe: &Recipe) -> String {
    let mut lines = Vec::new();

    let mut frontmatter = Vec::new();
    let fields = [
        ("source", recipe.source_url.as_ref()),
        ("author", recipe.creator.as_ref()),
        ("servings", recipe.servings.as_ref()),
        ("prep time", recipe.prep_time.as_ref()),
        ("cook time", recipe.cook_time.as_ref()),
        ("time required", recipe.total_time.as_ref()),
        ("difficulty", recipe.difficulty.as_ref()),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            frontmatter.push(format!("{key}: {}", yaml_escape(value)));
        }
    }
    if !recipe.tags.is_empty() {
        frontmatter.push("tags:".to_string());
        frontmatter.extend(
            recipe
                .tags
                .iter()
                .take(MAX_TAGS)
                .map(|tag| format!("  - {}", yaml_escape(tag))),
        );
    }
    if !frontmatter.is_empty() {
        lines.push("---".to_string());
        lines.extend(frontmatter);
        lines.push("---".to_string());
        lines.push(String::new());
    }

    if !recipe.ingredients.is_empty() {
        lines.push("== Ingredients ==".to_string());
        lines.push(String::new());
        for ingredient in &recipe.ingredients {
            if Recipe::is_group_header(ingredient) {
                lines.push(format!("== {} ==", Recipe::group_header_text(ingredient)));
                lines.push(String::new());
            } else {
                lines.push(format!("- {}", convert_ingredient(ingredient)));
            }
        }
        lines.push(String::new());
    }

    if !recipe.instructions.is_empty() {
        lines.push("== Instructions ==".to_string());
        lines.push(String::new());
        let names = ingredient_names(&recipe.ingredients);
        for step in &recipe.instructions {
            let step = mark_timers(step);
            let step = mark_items(step, &recipe.equipment, '#');
            let step = mark_items(step, &names, '@');
            lines.push(step);
            lines.push(String::new());
        }
    }

    if !recipe.notes.is_empty() {
        lines.extend(recipe.notes.iter().map(|note| format!("> {note}")));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Quote a value whenever it contains anything YAML could interpret.
fn yaml_escape(value: &str) -> String {
    if value.is_empty() {
        return "\"\"".to_string();
    }
    const SPECIAL: &str = ":{}[]&*#?|-<>=!%@`\"'\n\r\t";
    if value.chars().any(|c| SPECIAL.contains(c)) {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Convert time expressions to `~{amount%unit}` timers.
///
/// "5 Minuten" becomes "~{5%Minuten}", "1 - 2 hours" becomes "~{1-2%hours}".
fn mark_timers(text: &str) -> String {
    TIME_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("~{{{}%{}}}", caps[1].replace(' ', ""), &caps[2])
        })
        .into_owned()
}

/// Letters that can continue an ingredient or cookware name. Matching only
/// inside these boundaries keeps "Ei" from marking the middle of "Eier".
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || "äöüÄÖÜßéèêëàâáãåæçñ".contains(c)
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// First case-insensitive, word-bounded occurrence of `needle` in `text`
/// that lies outside every span in `exclude`, as a byte span.
fn find_word_span(text: &str, needle: &str, exclude: &[(usize, usize)]) -> Option<(usize, usize)> {
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() {
        return None;
    }

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    'candidates: for (pos, &(start, _)) in chars.iter().enumerate() {
        if pos > 0 && is_name_char(chars[pos - 1].1) {
            continue;
        }
        let mut end = start;
        for (offset, &needle_char) in needle_chars.iter().enumerate() {
            match chars.get(pos + offset) {
                Some(&(byte, c)) if chars_eq_ci(c, needle_char) => end = byte + c.len_utf8(),
                _ => continue 'candidates,
            }
        }
        if let Some(&(_, after)) = chars.get(pos + needle_chars.len()) {
            if is_name_char(after) {
                continue;
            }
        }
        if exclude.iter().any(|&(m_start, m_end)| start < m_end && end > m_start) {
            continue;
        }
        return Some((start, end));
    }
    None
}

/// Mark the first unmarked occurrence of each item with `prefix` and `{}`.
///
/// Longest names go first so "red onion" wins over "onion", and spans that
/// were already marked are off limits for the shorter names.
fn mark_items(text: String, items: &[String], prefix: char) -> String {
    let mut text = text;
    let mut marked_spans: Vec<(usize, usize)> = Vec::new();

    let mut names: Vec<&str> = items
        .iter()
        .map(String::as_str)
        .filter(|name| name.chars().count() >= 2)
        .collect();
    names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    let mut seen = HashSet::new();
    for name in names {
        let name_lower = name.to_lowercase();
        if !seen.insert(name_lower.clone()) {
            continue;
        }
        if text.to_lowercase().contains(&format!("{prefix}{name_lower}")) {
            continue;
        }
        if let Some((start, end)) = find_word_span(&text, name, &marked_spans) {
            let markup = format!("{prefix}{}{{}}", &text[start..end]);
            let grown_by = markup.len() - (end - start);
            text.replace_range(start..end, &markup);

            for span in &mut marked_spans {
                if span.0 >= start {
                    span.0 += grown_by;
                    span.1 += grown_by;
                }
            }
            marked_spans.push((start, start + markup.len()));
        }
    }
    text
}

/// Ingredient names with amounts, units and prep hints stripped, for
/// matching inside instruction steps.
fn ingredient_names(ingredients: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    for ingredient in ingredients {
        if Recipe::is_group_header(ingredient) {
            continue;
        }
        let clean = match ingredient.find(|c| c == ',' || c == '(') {
            Some(i) => ingredient[..i].trim_end(),
            None => ingredient.as_str(),
        };
        let name = NAME_TAIL_RE
            .captures(clean)
            .and_then(|caps| caps.get(1))
            .map_or(clean, |m| m.as_str())
            .trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    names
}

/// Convert one ingredient line to `@name{amount%unit}(prep)` markup.
///
/// "200g Mehl" becomes "@Mehl{200%g}", "1 Zwiebel, fein gehackt" becomes
/// "@Zwiebel{1}(fein gehackt)", a bare "Salz" becomes "@Salz{}".
fn convert_ingredient(ingredient: &str) -> String {
    let ingredient = ingredient.trim();
    if ingredient.chars().count() > MAX_INGREDIENT_CHARS {
        let head: String = ingredient.chars().take(50).collect();
        return format!("@{head}...{{}}");
    }

    let (hint, clean) = split_prep_hint(ingredient);

    let converted = match AMOUNT_RE.captures(clean) {
        Some(caps) => {
            // German decimal commas become dots so amounts stay parseable
            let amount = caps[1].trim().replace(',', ".");
            let name = caps[3].trim();
            match caps.get(2) {
                Some(unit) => format!("@{name}{{{amount}%{}}}", unit.as_str()),
                None => format!("@{name}{{{amount}}}"),
            }
        }
        None => format!("@{clean}{{}}"),
    };

    match hint {
        Some(hint) => format!("{converted}({hint})"),
        None => converted,
    }
}

/// Split a trailing preparation hint off an ingredient line.
///
/// "(gesiebt)" always counts; ", fein gehackt" only when the tail looks
/// like a preparation instruction rather than part of the name.
fn split_prep_hint(ingredient: &str) -> (Option<String>, &str) {
    if let Some(caps) = PAREN_HINT_RE.captures(ingredient) {
        let hint = caps[1].trim().to_string();
        let clean = ingredient[..caps.get(0).unwrap().start()].trim_end();
        return (Some(hint), clean);
    }

    if let Some(caps) = COMMA_HINT_RE.captures(ingredient) {
        let hint = caps[1].trim();
        if PREP_WORDS_RE.is_match(hint) {
            let clean = ingredient[..caps.get(0).unwrap().start()].trim_end();
            return (Some(hint.to_string()), clean);
        }
    }

    (None, ingredient)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_conversion() {
        assert_eq!(convert_ingredient("200g Mehl"), "@Mehl{200%g}");
        assert_eq!(convert_ingredient("2 EL Öl"), "@Öl{2%EL}");
        assert_eq!(convert_ingredient("1/2 TL Salz"), "@Salz{1/2%TL}");
        assert_eq!(convert_ingredient("200-250g Butter"), "@Butter{200-250%g}");
        assert_eq!(convert_ingredient("Salz"), "@Salz{}");
    }

    #[test]
    fn test_decimal_comma_becomes_dot() {
        assert_eq!(convert_ingredient("1,5 kg Kartoffeln"), "@Kartoffeln{1.5%kg}");
    }

    #[test]
    fn test_prep_hints() {
        assert_eq!(
            convert_ingredient("1 Zwiebel, fein gehackt"),
            "@Zwiebel{1}(fein gehackt)"
        );
        assert_eq!(convert_ingredient("200g Mehl (gesiebt)"), "@Mehl{200%g}(gesiebt)");
        // a comma tail that is not a prep instruction stays in the name
        assert_eq!(convert_ingredient("Salz, Pfeffer"), "@Salz, Pfeffer{}");
    }

    #[test]
    fn test_overlong_line_is_truncated() {
        let long = "a".repeat(260);
        let converted = convert_ingredient(&long);
        assert!(converted.starts_with('@'));
        assert!(converted.ends_with("...{}"));
        assert_eq!(converted.chars().count(), 1 + 50 + 5);
    }

    #[test]
    fn test_timer_markup() {
        assert_eq!(mark_timers("5 Minuten kochen"), "~{5%Minuten} kochen");
        assert_eq!(mark_timers("simmer for 1 - 2 hours"), "simmer for ~{1-2%hours}");
        assert_eq!(mark_timers("bake 30 min at 180C"), "bake ~{30%min} at 180C");
        assert_eq!(mark_timers("no times here"), "no times here");
    }

    #[test]
    fn test_item_marking_respects_word_boundaries() {
        let names = vec!["Ei".to_string()];
        // "Eier" must not be marked in the middle
        assert_eq!(
            mark_items("Eier verquirlen".to_string(), &names, '@'),
            "Eier verquirlen"
        );
        assert_eq!(
            mark_items("Das Ei trennen".to_string(), &names, '@'),
            "Das @Ei{} trennen"
        );
    }

    #[test]
    fn test_item_marking_is_case_insensitive_and_keeps_casing() {
        let names = vec!["mehl".to_string()];
        assert_eq!(
            mark_items("Mehl unterheben".to_string(), &names, '@'),
            "@Mehl{} unterheben"
        );
    }

    #[test]
    fn test_already_marked_items_are_skipped() {
        let names = vec!["Mehl".to_string()];
        assert_eq!(
            mark_items("@Mehl{} und noch mehr Mehl".to_string(), &names, '@'),
            "@Mehl{} und noch mehr Mehl"
        );
    }

    #[test]
    fn test_longer_names_win() {
        let names = vec!["Zwiebel".to_string(), "rote Zwiebel".to_string()];
        let marked = mark_items("Die rote Zwiebel anbraten".to_string(), &names, '@');
        // no second mark inside the already marked span
        assert_eq!(marked, "Die @rote Zwiebel{} anbraten");

        let names = vec!["egg".to_string(), "egg yolk".to_string()];
        let marked = mark_items(
            "Separate the egg yolk from the egg white.".to_string(),
            &names,
            '@',
        );
        assert_eq!(marked, "Separate the @egg yolk{} from the egg white.");
    }

    #[test]
    fn test_ingredient_name_extraction() {
        let ingredients = vec![
            "## Teig".to_string(),
            "200g Mehl".to_string(),
            "1 Zwiebel, fein gehackt".to_string(),
            "Salz".to_string(),
        ];
        assert_eq!(ingredient_names(&ingredients), vec!["Mehl", "Zwiebel", "Salz"]);
    }

    #[test]
    fn test_yaml_escaping() {
        assert_eq!(yaml_escape("easy"), "easy");
        assert_eq!(yaml_escape("30 min"), "30 min");
        assert_eq!(yaml_escape(""), "\"\"");
        assert_eq!(yaml_escape("a: b"), "\"a: b\"");
        assert_eq!(yaml_escape("gemini-style"), "\"gemini-style\"");
        assert_eq!(yaml_escape("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_full_document_layout() {
        let recipe = Recipe {
            title: "Flammkuchen".to_string(),
            servings: Some("2 servings".to_string()),
            prep_time: Some("20 min".to_string()),
            difficulty: Some("easy".to_string()),
            tags: vec!["flammkuchen".to_string()],
            ingredients: vec![
                "## Teig".to_string(),
                "200g Mehl".to_string(),
                "Salz".to_string(),
            ],
            instructions: vec!["Mehl mit Salz mischen und 10 Minuten ruhen lassen.".to_string()],
            notes: vec!["Sehr dünn ausrollen.".to_string()],
            source_url: Some("https://example.com/f".to_string()),
            creator: Some("ChefMax".to_string()),
            ..Default::default()
        };
        let output = render_cooklang(&recipe);

        let frontmatter_end = output.match_indices("---").count();
        assert!(frontmatter_end >= 2);
        assert!(output.contains("source: \"https://example.com/f\""));
        assert!(output.contains("author: ChefMax"));
        assert!(output.contains("prep time: 20 min"));
        assert!(output.contains("tags:\n  - flammkuchen"));
        // source before author before servings
        let source = output.find("source:").unwrap();
        let author = output.find("author:").unwrap();
        let servings = output.find("servings:").unwrap();
        assert!(source < author && author < servings);

        assert!(output.contains("== Ingredients =="));
        assert!(output.contains("== Teig =="));
        assert!(output.contains("- @Mehl{200%g}"));
        assert!(output.contains("- @Salz{}"));

        assert!(output.contains("== Instructions =="));
        assert!(output.contains("@Mehl{} mit @Salz{} mischen und ~{10%Minuten} ruhen lassen."));

        assert!(output.contains("> Sehr dünn ausrollen."));
    }

    #[test]
    fn test_equipment_marked_as_cookware() {
        let recipe = Recipe {
            title: "Test".to_string(),
            ingredients: vec!["200g Mehl".to_string()],
            instructions: vec!["Mehl in die Schüssel geben.".to_string()],
            equipment: vec!["Schüssel".to_string()],
            ..Default::default()
        };
        let output = render_cooklang(&recipe);
        assert!(output.contains("@Mehl{} in die #Schüssel{} geben."));
    }

    #[test]
    fn test_tag_cap_in_frontmatter() {
        let recipe = Recipe {
            title: "Test".to_string(),
            tags: (0..15).map(|i| format!("tag{i}")).collect(),
            ingredients: vec!["1 egg".to_string()],
            instructions: vec!["Fry.".to_string()],
            ..Default::default()
        };
        let output = render_cooklang(&recipe);
        assert!(output.contains("  - tag9"));
        assert!(!output.contains("  - tag10"));
    }
}
