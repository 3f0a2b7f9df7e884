//! HTTP handler functions for the callejero API.

use actix_web::{HttpResponse, web};
use callejero_geocoder::GeocodeError;
use callejero_server_models::{
    ApiGeocodePoint, ApiHealth, ApiIndexedSuggestion, ApiIntersectionPoint, ApiSuggestion,
    ApiSuggestionList, GeocodeQueryParams, HealthStatus, IntersectionQueryParams,
    SuggestQueryParams,
};

use crate::AppState;

/// Maximum accepted length of a street query string.
const MAX_QUERY_LEN: usize = 100;

/// Bounds on the suggestion limit parameter.
const MAX_LIMIT: usize = 50;

/// `GET /health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let db = !state.catalog.is_empty();
    let es = state
        .suggest
        .as_ref()
        .is_some_and(|index| index.refresh().is_ok());

    HttpResponse::Ok().json(ApiHealth {
        status: HealthStatus::from_probes(db, es),
        db,
        es,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /sugerencias`
///
/// Street-name suggestions in the legacy response shape, served by the
/// name matcher over the catalog snapshot. An absent or empty query is
/// valid and matches everything.
pub async fn sugerencias(
    state: web::Data<AppState>,
    params: web::Query<SuggestQueryParams>,
) -> HttpResponse {
    let qstr = params.qstr.as_deref().unwrap_or("");
    if qstr.chars().count() > MAX_QUERY_LEN {
        return bad_request("qstr too long");
    }
    let limit = params.limit.unwrap_or(20).clamp(1, MAX_LIMIT);

    let items: Vec<ApiSuggestion> =
        callejero_matcher::resolve(state.catalog.segments(), qstr, limit)
            .into_iter()
            .map(|candidate| ApiSuggestion {
                numero_cal: candidate.segment.segment_code.clone(),
                nombre_cal: candidate.segment.name.clone(),
                score: candidate.score,
            })
            .collect();

    HttpResponse::Ok().json(ApiSuggestionList::from(items))
}

/// `GET /sugerencias_es2`
///
/// Street-name suggestions in the search-index response shape. The
/// query string is mandatory here.
pub async fn sugerencias_es2(
    state: web::Data<AppState>,
    params: web::Query<SuggestQueryParams>,
) -> HttpResponse {
    let Some(qstr) = params.qstr.as_deref().filter(|q| !q.is_empty()) else {
        return bad_request("qstr is required");
    };
    if qstr.chars().count() > MAX_QUERY_LEN {
        return bad_request("qstr too long");
    }
    let limit = params.limit.unwrap_or(10).clamp(1, MAX_LIMIT);

    let Some(index) = state.suggest.as_deref() else {
        return index_unavailable();
    };

    match index.suggest(qstr, limit).await {
        Ok(hits) => {
            let items: Vec<ApiIndexedSuggestion> =
                hits.into_iter().map(ApiIndexedSuggestion::from).collect();
            HttpResponse::Ok().json(ApiSuggestionList::from(items))
        }
        Err(e) => suggest_failure(&e),
    }
}

/// `GET /geocode_direccion`
///
/// Interpolates a house number along the matched street segment. The
/// street may be identified by name (`calle`, optionally restricted by
/// `numero_cal`) or by code alone (`numero_cal` without `calle`).
pub async fn geocode_direccion(
    state: web::Data<AppState>,
    params: web::Query<GeocodeQueryParams>,
) -> HttpResponse {
    let calle = params.calle.as_deref().filter(|c| !c.is_empty());
    let numero_cal = params.numero_cal.as_deref().filter(|c| !c.is_empty());
    let fallback = params.fallback.unwrap_or(false);

    let outcome = match (calle, numero_cal) {
        (Some(calle), _) => {
            if calle.chars().count() > MAX_QUERY_LEN {
                return bad_request("calle too long");
            }
            callejero_geocoder::geocode(
                state.catalog.segments(),
                calle,
                params.altura,
                numero_cal,
                fallback,
            )
        }
        (None, Some(code)) => callejero_geocoder::geocode_by_code(
            state.catalog.segments(),
            code,
            params.altura,
            fallback,
        ),
        (None, None) => return bad_request("calle or numero_cal is required"),
    };

    match outcome {
        Ok(result) => HttpResponse::Ok().json(ApiGeocodePoint::from(result)),
        Err(e) => geocode_failure(&e),
    }
}

/// `GET /geocode_interseccion`
///
/// Resolves the meeting point of two streets, 404 when they do not
/// cross.
pub async fn geocode_interseccion(
    state: web::Data<AppState>,
    params: web::Query<IntersectionQueryParams>,
) -> HttpResponse {
    for calle in [&params.calle1, &params.calle2] {
        if calle.is_empty() {
            return bad_request("calle1 and calle2 are required");
        }
        if calle.chars().count() > MAX_QUERY_LEN {
            return bad_request("street query too long");
        }
    }

    match callejero_geocoder::intersect(state.catalog.segments(), &params.calle1, &params.calle2) {
        Ok(result) => HttpResponse::Ok().json(ApiIntersectionPoint::from(result)),
        Err(e) => geocode_failure(&e),
    }
}

fn geocode_failure(e: &GeocodeError) -> HttpResponse {
    match e {
        GeocodeError::InvalidInput(_) => bad_request(&e.to_string()),
        GeocodeError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
            "error": e.to_string()
        })),
    }
}

/// Suggestion index failures are dependent-service errors, surfaced as
/// 502 rather than 500.
fn suggest_failure(e: &callejero_suggest::SuggestError) -> HttpResponse {
    log::error!("Suggestion query failed: {e}");
    HttpResponse::BadGateway().json(serde_json::json!({
        "error": "suggestion index unavailable"
    }))
}

fn index_unavailable() -> HttpResponse {
    HttpResponse::BadGateway().json(serde_json::json!({
        "error": "suggestion index unavailable"
    }))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": message
    }))
}
