pub mod schema;
pub mod text;

pub use schema::extract_schema_recipe;
pub use text::extract_page_text;
