//! Tantivy index schema for street-name suggestions.
//!
//! The schema carries the street display name twice: once through the
//! standard analyzer for phrase and fuzzy matching, and once through an
//! edge-n-gram analyzer so that partially typed queries match as exact
//! terms (search-as-you-type).

use tantivy::Index;
use tantivy::schema::{
    self, Field, NumericOptions, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};
use tantivy::tokenizer::{
    AsciiFoldingFilter, LowerCaser, NgramTokenizer, SimpleTokenizer, TextAnalyzer,
};

/// Name of the edge-n-gram analyzer registered on the index.
pub const EDGE_NGRAM_TOKENIZER: &str = "edge_ngram";

/// Shortest indexed name prefix, in characters.
const MIN_GRAM: usize = 2;

/// Longest indexed name prefix, in characters. Queries longer than
/// this fall through to the phrase and fuzzy clauses.
const MAX_GRAM: usize = 15;

/// Names of all fields in the suggestion schema.
pub struct FieldNames;

impl FieldNames {
    /// Stable segment id (upsert key, exact match).
    pub const ID: &'static str = "id";
    /// Street display name, standard analysis.
    pub const NAME: &'static str = "nombre_cal";
    /// Street display name, edge-n-gram analysis (not stored).
    pub const NAME_PREFIX: &'static str = "nombre_cal_prefix";
    /// Block/segment code, exact match.
    pub const CODE: &'static str = "numero_cal";
    /// Centroid latitude (WGS84).
    pub const LAT: &'static str = "lat";
    /// Centroid longitude (WGS84).
    pub const LON: &'static str = "lon";
}

/// All resolved field handles for efficient document construction.
#[derive(Debug, Clone)]
pub struct SuggestFields {
    /// Segment id.
    pub id: Field,
    /// Street name, standard analysis.
    pub name: Field,
    /// Street name, edge-n-gram analysis.
    pub name_prefix: Field,
    /// Block/segment code.
    pub code: Field,
    /// Latitude.
    pub lat: Field,
    /// Longitude.
    pub lon: Field,
}

impl SuggestFields {
    /// Resolves field handles from a schema.
    ///
    /// # Panics
    ///
    /// Panics if the schema does not contain the expected fields
    /// (should only happen if the schema was not built by
    /// [`build_schema`]).
    #[must_use]
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            id: schema
                .get_field(FieldNames::ID)
                .expect("schema missing id field"),
            name: schema
                .get_field(FieldNames::NAME)
                .expect("schema missing name field"),
            name_prefix: schema
                .get_field(FieldNames::NAME_PREFIX)
                .expect("schema missing name prefix field"),
            code: schema
                .get_field(FieldNames::CODE)
                .expect("schema missing code field"),
            lat: schema
                .get_field(FieldNames::LAT)
                .expect("schema missing lat field"),
            lon: schema
                .get_field(FieldNames::LON)
                .expect("schema missing lon field"),
        }
    }
}

/// Builds the Tantivy schema for the suggestion index.
///
/// Fields:
/// - `id` — STRING (exact match + stored): upsert key
/// - `nombre_cal` — TEXT (tokenized + stored): street display name
/// - `nombre_cal_prefix` — TEXT (edge-n-gram, not stored): prefix search
/// - `numero_cal` — STRING (exact match + stored): block code
/// - `lat` / `lon` — f64 (stored + fast): centroid
#[must_use]
pub fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    let name_indexing = TextFieldIndexing::default()
        .set_tokenizer("default")
        .set_index_option(schema::IndexRecordOption::WithFreqsAndPositions);
    let name_options = TextOptions::default()
        .set_indexing_options(name_indexing)
        .set_stored();

    let prefix_indexing = TextFieldIndexing::default()
        .set_tokenizer(EDGE_NGRAM_TOKENIZER)
        .set_index_option(schema::IndexRecordOption::Basic);
    let prefix_options = TextOptions::default().set_indexing_options(prefix_indexing);

    builder.add_text_field(FieldNames::ID, STRING | STORED);
    builder.add_text_field(FieldNames::NAME, name_options);
    builder.add_text_field(FieldNames::NAME_PREFIX, prefix_options);
    builder.add_text_field(FieldNames::CODE, STRING | STORED);

    let f64_options = NumericOptions::default().set_stored().set_fast();
    builder.add_f64_field(FieldNames::LAT, f64_options.clone());
    builder.add_f64_field(FieldNames::LON, f64_options);

    builder.build()
}

/// Registers the analyzers the suggestion index relies on.
///
/// Both analyzers lowercase and ASCII-fold (diacritic-insensitive
/// matching); the edge-n-gram analyzer additionally emits every name
/// prefix between [`MIN_GRAM`] and [`MAX_GRAM`] characters so typed
/// prefixes resolve as exact terms.
///
/// # Panics
///
/// Panics if the n-gram bounds are invalid (compile-time constants, so
/// only on programmer error).
pub fn register_tokenizers(index: &Index) {
    index.tokenizers().register(
        "default",
        TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(AsciiFoldingFilter)
            .build(),
    );

    index.tokenizers().register(
        EDGE_NGRAM_TOKENIZER,
        TextAnalyzer::builder(
            NgramTokenizer::prefix_only(MIN_GRAM, MAX_GRAM).expect("valid n-gram bounds"),
        )
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_expected_fields() {
        let schema = build_schema();
        assert!(schema.get_field(FieldNames::ID).is_ok());
        assert!(schema.get_field(FieldNames::NAME).is_ok());
        assert!(schema.get_field(FieldNames::NAME_PREFIX).is_ok());
        assert!(schema.get_field(FieldNames::CODE).is_ok());
        assert!(schema.get_field(FieldNames::LAT).is_ok());
        assert!(schema.get_field(FieldNames::LON).is_ok());
    }

    #[test]
    fn fields_resolve_from_schema() {
        let schema = build_schema();
        let fields = SuggestFields::from_schema(&schema);
        assert_ne!(fields.name, fields.name_prefix);
        assert_ne!(fields.lat, fields.lon);
    }

    #[test]
    fn edge_ngram_analyzer_emits_prefixes() {
        use tantivy::tokenizer::TokenStream as _;

        let index = Index::create_in_ram(build_schema());
        register_tokenizers(&index);

        let mut analyzer = index
            .tokenizers()
            .get(EDGE_NGRAM_TOKENIZER)
            .expect("registered");
        let mut stream = analyzer.token_stream("Belgrano");
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        assert!(tokens.contains(&"be".to_string()));
        assert!(tokens.contains(&"belgr".to_string()));
        assert!(tokens.contains(&"belgrano".to_string()));
    }
}
