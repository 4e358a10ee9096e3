use crate::{errors::AppError, services::AdminServices};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

/// `GET /uploads/{file}` — stream a stored upload.
pub async fn get_upload(
    State(services): State<AdminServices>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let (file, content_type) = services.uploads.open(&name).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    Ok(response)
}
