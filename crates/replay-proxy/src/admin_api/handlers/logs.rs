//! Log and mock lifecycle handlers.

use crate::admin_api::types::*;
use crate::lifecycle::{LifecycleError, LifecycleService};
use crate::store::Collection;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;

fn lifecycle_error(e: &LifecycleError) -> Response<Full<Bytes>> {
    error_response(e.status(), &e.to_string())
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response<Full<Bytes>>> {
    serde_json::from_slice(body).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON body: {e}"))
    })
}

/// GET /api/logs/files?latest=<filename>
pub fn handle_list_logs(service: &LifecycleService, query: Option<&str>) -> Response<Full<Bytes>> {
    let latest = query_param(query, "latest");
    match service.list_logs(latest.as_deref()) {
        Ok(names) => json_response(
            StatusCode::OK,
            &FilesResponse {
                files: names.into_iter().map(|n| n.to_string()).collect(),
            },
        ),
        Err(e) => lifecycle_error(&e),
    }
}

/// GET /api/mocks/files
pub fn handle_list_mocks(service: &LifecycleService) -> Response<Full<Bytes>> {
    match service.list_mocks() {
        Ok(names) => json_response(
            StatusCode::OK,
            &FilesResponse {
                files: names.into_iter().map(|n| n.to_string()).collect(),
            },
        ),
        Err(e) => lifecycle_error(&e),
    }
}

/// GET /logs/<filename> and GET /mocks/<filename>
pub fn handle_fetch(
    service: &LifecycleService,
    collection: Collection,
    segment: &str,
) -> Response<Full<Bytes>> {
    let Some(name) = decode_segment(segment) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid file name encoding");
    };
    match service.fetch(collection, &name) {
        Ok(contents) => raw_json_response(StatusCode::OK, contents),
        Err(e) => lifecycle_error(&e),
    }
}

/// POST /api/logs/is_mocked
pub fn handle_is_mocked(service: &LifecycleService, body: &[u8]) -> Response<Full<Bytes>> {
    let request: IsMockedRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let Some(url) = request.full_url else {
        return error_response(StatusCode::BAD_REQUEST, "Missing full-url");
    };
    json_response(
        StatusCode::OK,
        &IsMockedResponse {
            mocked: service.is_mocked(&url),
        },
    )
}

/// POST /api/logs/delete_all
pub fn handle_delete_all(service: &LifecycleService) -> Response<Full<Bytes>> {
    match service.delete_all_logs() {
        Ok(summary) => json_response(StatusCode::OK, &summary),
        Err(e) => lifecycle_error(&e),
    }
}

/// POST /api/logs/move_to_mocked and POST /api/logs/move_to_logs
pub fn handle_move(service: &LifecycleService, to: Collection, body: &[u8]) -> Response<Full<Bytes>> {
    let request: MoveRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let Some(file_name) = request.file_name.filter(|name| !name.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing fileName");
    };

    let result = match to {
        Collection::Mock => service.promote(&file_name),
        Collection::Log => service.demote(&file_name),
    };
    match result {
        Ok(name) => json_response(
            StatusCode::OK,
            &MoveResponse {
                success: true,
                moved: name.to_string(),
            },
        ),
        Err(e) => lifecycle_error(&e),
    }
}
