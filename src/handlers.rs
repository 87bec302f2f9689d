use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::dice::{DiceOutput, DiceRoll};
use crate::dictionaries::Dictionaries;
use crate::error::{RandomError, Result};
use crate::generators::{self, UuidVersion};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dictionaries: Arc<Dictionaries>,
}

impl AppState {
    pub fn new(dictionaries: Dictionaries) -> Self {
        Self {
            dictionaries: Arc::new(dictionaries),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IntQuery {
    #[serde(default)]
    pub min: i64,
    #[serde(default = "default_int_max")]
    pub max: i64,
}

#[derive(Debug, Deserialize)]
pub struct FloatQuery {
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_float_max")]
    pub max: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WordQuery {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 1000, message = "Invalid count, must be between 1 and 1000"))]
    pub count: usize,
    #[serde(default = "default_separator")]
    pub separator: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DiceQuery {
    #[serde(default = "default_dice_input")]
    #[validate(length(min = 1, max = 100, message = "Invalid input, must be between 1 and 100 characters"))]
    pub input: String,
    #[serde(default = "default_dice_output")]
    pub output: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NanoidQuery {
    #[serde(default = "default_nanoid_size")]
    #[validate(range(min = 1, max = 200, message = "Invalid size, must be between 1 and 200"))]
    pub size: i64,
}

#[derive(Debug, Deserialize)]
pub struct UuidQuery {
    #[serde(default = "default_uuid_version")]
    pub version: String,
}

fn default_int_max() -> i64 {
    100
}

fn default_float_max() -> f64 {
    1.0
}

fn default_category() -> String {
    "words".to_string()
}

fn default_count() -> usize {
    1
}

fn default_separator() -> String {
    " ".to_string()
}

fn default_dice_input() -> String {
    "1d6".to_string()
}

fn default_dice_output() -> String {
    "sum".to_string()
}

fn default_nanoid_size() -> i64 {
    generators::DEFAULT_NANOID_SIZE as i64
}

fn default_uuid_version() -> String {
    "4".to_string()
}

/// Unwrap query parameters, turning deserialization failures into a 400
fn parse_query<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| RandomError::InvalidQuery(rejection.body_text()))
}

/// Random integer in `[min, max)`
pub async fn random_int(
    query: std::result::Result<Query<IntQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let params = parse_query(query)?;
    let value = generators::random_int(&mut rand::thread_rng(), params.min, params.max)?;
    Ok(value.to_string())
}

/// Random float in `[min, max)`
pub async fn random_float(
    query: std::result::Result<Query<FloatQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let params = parse_query(query)?;
    let value = generators::random_float(&mut rand::thread_rng(), params.min, params.max)?;
    Ok(value.to_string())
}

/// Words from one of the dictionaries
pub async fn random_word(
    State(state): State<AppState>,
    query: std::result::Result<Query<WordQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let params = parse_query(query)?;
    params.validate()?;

    let words = state
        .dictionaries
        .get(&params.category)
        .ok_or_else(|| RandomError::UnknownCategory {
            valid: state.dictionaries.categories().to_vec(),
        })?;

    Ok(generators::random_words(
        &mut rand::thread_rng(),
        words,
        params.count,
        &params.separator,
    ))
}

/// Roll dice described in dice notation
pub async fn random_dice(
    query: std::result::Result<Query<DiceQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let params = parse_query(query)?;
    params.validate()?;

    let roll: DiceRoll = params.input.parse()?;
    let output: DiceOutput = params.output.parse()?;

    let outcome = roll.roll(&mut rand::thread_rng());
    tracing::debug!(input = %params.input, total = outcome.total, "Rolled dice");

    Ok(output.render(&outcome))
}

/// Time-sortable ULID
pub async fn random_ulid() -> impl IntoResponse {
    generators::ulid()
}

/// NanoID of the requested size
pub async fn random_nanoid(
    query: std::result::Result<Query<NanoidQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let params = parse_query(query)?;
    params.validate()?;

    let size = usize::try_from(params.size).map_err(|_| RandomError::InvalidSize)?;
    generators::nanoid(size)
}

/// UUID of version 4 or 7
pub async fn random_uuid(
    query: std::result::Result<Query<UuidQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let params = parse_query(query)?;
    let version: UuidVersion = params.version.parse()?;
    Ok(generators::uuid(version))
}
