//! Mapping recipe pages to records via CSS-class selectors.
//!
//! A [`SiteProfile`] is data: it names, per field, the tag and class of the
//! element carrying that field. Profiles compile into a [`RecipeExtractor`]
//! once per batch, so selector syntax errors surface before any request.

use chrono::Local;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ingestion::types::ExtractError;
use crate::recipe::RecipeRecord;

/// Phrase replacements applied to the servings text. Matching happens on the
/// lowercased text, so `Serves 4 - 6` comes out as `4-6`.
const SERVINGS_REPLACEMENTS: &[(&str, &str)] = &[("serves", ""), (" - ", "-")];

/// Phrase replacements applied to the cook time text (`Cooks In 25 minutes`
/// comes out as `25 minutes`).
const COOK_TIME_REPLACEMENTS: &[(&str, &str)] = &[("cooks in", "")];

/// An element matcher: tag name plus one or more CSS classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub tag: String,
    pub class: String,
}

impl FieldSelector {
    pub fn new(tag: &str, class: &str) -> Self {
        Self {
            tag: tag.to_string(),
            class: class.to_string(),
        }
    }

    fn compile(&self, field: &'static str) -> Result<Selector, ExtractError> {
        let mut css = self.tag.clone();
        for class in self.class.split_whitespace() {
            css.push('.');
            css.push_str(class);
        }
        parse_selector(&css, field)
    }
}

/// Field-to-selector mapping for one recipe site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: FieldSelector,
    pub ingredients: FieldSelector,
    pub directions: FieldSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<FieldSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<FieldSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<FieldSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<FieldSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional: Option<FieldSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<FieldSelector>,
}

impl SiteProfile {
    /// Built-in profile for jamieoliver.com recipe pages.
    pub fn jamie_oliver() -> Self {
        Self {
            name: FieldSelector::new("h1", "hidden-xs"),
            ingredients: FieldSelector::new("ul", "ingred-list"),
            directions: FieldSelector::new("div", "method-p"),
            photo: Some(FieldSelector::new("div", "hero-wrapper")),
            cook_time: Some(FieldSelector::new("div", "recipe-detail time")),
            servings: Some(FieldSelector::new("div", "recipe-detail serves")),
            notes: Some(FieldSelector::new("div", "recipe-intro")),
            nutritional: Some(FieldSelector::new("ul", "nutrition-list")),
            categories: Some(FieldSelector::new("div", "tags-list")),
        }
    }

    pub fn compile(&self) -> Result<RecipeExtractor, ExtractError> {
        Ok(RecipeExtractor {
            name: self.name.compile("name")?,
            ingredients: self.ingredients.compile("ingredients")?,
            directions: self.directions.compile("directions")?,
            photo: compile_opt(&self.photo, "photo")?,
            cook_time: compile_opt(&self.cook_time, "cook_time")?,
            servings: compile_opt(&self.servings, "servings")?,
            notes: compile_opt(&self.notes, "notes")?,
            nutritional: compile_opt(&self.nutritional, "nutritional")?,
            categories: compile_opt(&self.categories, "categories")?,
            img: parse_selector("img", "photo")?,
            anchor: parse_selector("a", "categories")?,
            item: parse_selector("li", "list")?,
        })
    }
}

fn compile_opt(
    selector: &Option<FieldSelector>,
    field: &'static str,
) -> Result<Option<Selector>, ExtractError> {
    selector.as_ref().map(|s| s.compile(field)).transpose()
}

fn parse_selector(css: &str, field: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|err| ExtractError::Selector {
        field,
        message: err.to_string(),
    })
}

/// Compiled selectors for one site, ready to run against page HTML.
#[derive(Debug)]
pub struct RecipeExtractor {
    name: Selector,
    ingredients: Selector,
    directions: Selector,
    photo: Option<Selector>,
    cook_time: Option<Selector>,
    servings: Option<Selector>,
    notes: Option<Selector>,
    nutritional: Option<Selector>,
    categories: Option<Selector>,
    img: Selector,
    anchor: Selector,
    item: Selector,
}

impl RecipeExtractor {
    /// Map a fetched page to a recipe record. The name field is required;
    /// everything else degrades to empty (and is omitted on serialization).
    pub fn extract(
        &self,
        html: &str,
        source: &str,
        page_url: &Url,
    ) -> Result<RecipeRecord, ExtractError> {
        let document = Html::parse_document(html);

        let name = self
            .first_text(&document, &self.name)
            .ok_or(ExtractError::MissingField { field: "name" })?;

        let mut record = RecipeRecord {
            name,
            source: source.to_string(),
            source_url: page_url.to_string(),
            created: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            ..RecipeRecord::default()
        };

        if let Some(text) = self.optional_text(&document, &self.servings) {
            record.servings = strip_phrases(&text, SERVINGS_REPLACEMENTS);
        }
        if let Some(text) = self.optional_text(&document, &self.cook_time) {
            record.cook_time = strip_phrases(&text, COOK_TIME_REPLACEMENTS);
        }
        if let Some(text) = self.optional_text(&document, &self.notes) {
            record.notes = strip_curly_quotes(&text);
        }

        record.categories = self.category_list(&document);
        record.ingredients = self.list_items(&document, &self.ingredients).join("\n");
        record.directions = self
            .list_items(&document, &self.directions)
            .iter()
            .map(|step| format!("{step}\n\n"))
            .collect();
        if let Some(nutritional) = &self.nutritional {
            record.nutritional_info = self.list_items(&document, nutritional).join("\n");
        }
        record.image_url = self.image_url(&document, page_url);

        Ok(record)
    }

    fn first_text(&self, document: &Html, selector: &Selector) -> Option<String> {
        document
            .select(selector)
            .next()
            .map(|element| text_content(&element))
            .filter(|text| !text.is_empty())
    }

    fn optional_text(&self, document: &Html, selector: &Option<Selector>) -> Option<String> {
        selector
            .as_ref()
            .and_then(|s| self.first_text(document, s))
    }

    fn list_items(&self, document: &Html, container: &Selector) -> Vec<String> {
        document
            .select(container)
            .next()
            .map(|element| {
                element
                    .select(&self.item)
                    .map(|li| collapse_whitespace(&text_content(&li)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn category_list(&self, document: &Html) -> Vec<String> {
        let Some(selector) = &self.categories else {
            return Vec::new();
        };
        document
            .select(selector)
            .next()
            .map(|element| {
                element
                    .select(&self.anchor)
                    .map(|anchor| title_case(&text_content(&anchor)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn image_url(&self, document: &Html, page_url: &Url) -> Option<String> {
        let photo = self.photo.as_ref()?;
        let container = document.select(photo).next()?;
        let src = container.select(&self.img).next()?.value().attr("src")?;
        page_url.join(src).ok().map(|resolved| resolved.to_string())
    }
}

fn text_content(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_phrases(text: &str, replacements: &[(&str, &str)]) -> String {
    let mut value = text.to_lowercase();
    for (from, to) in replacements {
        value = value.replace(from, to);
    }
    value.trim().to_string()
}

fn strip_curly_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "").trim().to_string()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
