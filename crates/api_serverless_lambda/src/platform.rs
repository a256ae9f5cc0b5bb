//! Conversion between `lambda_http` requests/responses and the byte-bodied
//! HTTP types the adapter serves.

use api_serverless_core::{
    replace_uri_path, Adapter, AdapterConfig, AdapterError, Application, HttpRequest, HttpResponse,
};
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::request::RequestContext;
use lambda_http::{Body, Request, RequestExt as _, Response};

/// Runs one platform request through `adapter` and returns the platform
/// response.
pub async fn handle_request<A: Application + ?Sized>(
    adapter: &Adapter<A>,
    request: Request,
) -> Result<Response<Body>, AdapterError> {
    let request = into_app_request(request)?;
    let response = adapter.handle(request).await?;
    Ok(into_platform_response(response, adapter.config()))
}

/// API Gateway v1 and ALB deliver the path already percent-decoded, so it is
/// re-encoded segment by segment from the raw event path. HTTP API (v2)
/// delivers `rawPath` verbatim and is left alone.
pub fn into_app_request(request: Request) -> Result<HttpRequest, AdapterError> {
    let decoded_path = match request.request_context_ref() {
        Some(RequestContext::ApiGatewayV1(_) | RequestContext::Alb(_)) => {
            Some(request.raw_http_path().to_string())
        }
        _ => None,
    };

    let (parts, body) = request.into_parts();
    let body: &[u8] = body.as_ref();
    let request = http::Request::from_parts(parts, body.to_vec());

    match decoded_path {
        Some(path) if !path.is_empty() => replace_uri_path(request, &encode_path(&path)),
        _ => Ok(request),
    }
}

/// Text content types go back as a plain string, everything else as binary
/// (base64 on the wire). Headers pass through untouched, including values
/// that are not visible ASCII.
pub fn into_platform_response(response: HttpResponse, config: &AdapterConfig) -> Response<Body> {
    let (parts, bytes) = response.into_parts();
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let body = if bytes.is_empty() {
        Body::Empty
    } else if config.is_text_content_type(content_type.as_deref()) {
        match String::from_utf8(bytes) {
            Ok(text) => Body::Text(text),
            Err(error) => Body::Binary(error.into_bytes()),
        }
    } else {
        Body::Binary(bytes)
    };

    Response::from_parts(parts, body)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
