//! Request handlers
//!
//! Thin translation between HTTP and the storage/auth core. Filesystem work
//! runs on the blocking pool; the principal is read from the session cookie
//! here and passed on explicitly.

use axum::body::{Body, Bytes};
use axum::extract::{Form, Multipart, Path, Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::SignedCookieJar;
use log::info;
use serde::Deserialize;
use std::io;
use tokio_util::io::ReaderStream;

use crate::auth::{authenticate, authorize};
use crate::error::{StorageError, WebError};
use crate::server::AppState;
use crate::storage::{list_directory, prepare_download, remove_path, upload_file};
use crate::web::{render, session};

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "uploadedFile";

async fn blocking<T, F>(work: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StorageError::Io(io::Error::other(e)))?
}

pub async fn home() -> Redirect {
    Redirect::to("/browse/")
}

pub async fn browse_root(state: State<AppState>, jar: SignedCookieJar) -> Response {
    browse_path(state, jar, String::new()).await
}

pub async fn browse(
    state: State<AppState>,
    jar: SignedCookieJar,
    Path(raw): Path<String>,
) -> Response {
    browse_path(state, jar, raw).await
}

/// A trailing `/` (or nothing) asks for a listing; anything else is a
/// static download.
async fn browse_path(State(state): State<AppState>, jar: SignedCookieJar, raw: String) -> Response {
    let result = if raw.is_empty() || raw.ends_with('/') {
        list_page(state, jar, raw).await
    } else {
        download(state, raw).await
    };
    result.unwrap_or_else(IntoResponse::into_response)
}

async fn list_page(
    state: AppState,
    jar: SignedCookieJar,
    raw: String,
) -> Result<Response, StorageError> {
    let principal = session::current_principal(&jar);
    let (dir, entries) = blocking(move || {
        let dir = state.root().resolve_existing(&raw)?;
        let entries = list_directory(state.root(), &dir)?;
        Ok((dir, entries))
    })
    .await?;

    Ok(Html(render::browse_page(dir.relative(), &entries, principal.as_ref())).into_response())
}

async fn download(state: AppState, raw: String) -> Result<Response, StorageError> {
    let (relative, target) = blocking(move || {
        let target = state.root().resolve_existing(&raw)?;
        let relative = target.relative().clone();
        if target.path().is_dir() {
            return Ok((relative, None));
        }
        Ok((relative, Some(prepare_download(&target)?)))
    })
    .await?;

    let Some(target) = target else {
        return Ok(Redirect::to(&render::browse_href(&relative)).into_response());
    };

    let file = tokio::fs::File::open(&target.file_path)
        .await
        .map_err(|e| StorageError::from_io(e, &relative.to_string()))?;
    let mime = mime_guess::from_path(&target.file_path).first_or_octet_stream();

    let mut response = (
        [
            (header::CONTENT_TYPE, mime.essence_str().to_string()),
            (header::CONTENT_LENGTH, target.size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response();
    if let Some(modified) = target.modified_at
        && let Ok(value) = HeaderValue::from_str(&render::http_date(modified))
    {
        response.headers_mut().insert(header::LAST_MODIFIED, value);
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    incorrect: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

pub async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(render::login_page(query.incorrect.is_some()))
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match authenticate(&form.username, &form.password, state.credentials()) {
        Ok(principal) => (session::start(jar, &principal), Redirect::to("/browse/")).into_response(),
        Err(_) => Redirect::to("/login?incorrect=true").into_response(),
    }
}

pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    if let Some(principal) = session::current_principal(&jar) {
        info!("User {principal} logged out");
    }
    (session::end(jar), Redirect::to("/browse/"))
}

pub async fn upload_form_root(
    state: State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    upload_form_at(state, jar, String::new()).await
}

pub async fn upload_form(
    state: State<AppState>,
    jar: SignedCookieJar,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    upload_form_at(state, jar, raw).await
}

async fn upload_form_at(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    raw: String,
) -> Result<Response, WebError> {
    let principal = session::current_principal(&jar);
    authorize(principal.as_ref())?;

    let dir = blocking(move || {
        let dir = state.root().resolve_existing(&raw)?;
        if !dir.path().is_dir() {
            return Err(StorageError::NotADirectory(dir.relative().to_string()));
        }
        Ok(dir)
    })
    .await?;

    Ok(Html(render::upload_page(dir.relative())).into_response())
}

pub async fn upload_root(
    state: State<AppState>,
    jar: SignedCookieJar,
    multipart: Multipart,
) -> Result<Response, WebError> {
    upload_into(state, jar, String::new(), multipart).await
}

pub async fn upload(
    state: State<AppState>,
    jar: SignedCookieJar,
    Path(raw): Path<String>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    upload_into(state, jar, raw, multipart).await
}

async fn upload_into(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    raw: String,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let principal = session::current_principal(&jar);
    let principal = authorize(principal.as_ref())?.clone();

    let (filename, data) = read_upload_field(&mut multipart).await?;
    if data.len() > state.max_upload_bytes() {
        return Err(WebError::PayloadTooLarge {
            limit: state.max_upload_bytes(),
        });
    }

    let size = data.len();
    let stored = blocking(move || {
        let dir = state.root().resolve_existing(&raw)?;
        upload_file(state.root(), &dir, &filename, &data)
    })
    .await?;

    info!("User {principal} uploaded /{} ({size} bytes)", stored.relative());

    let dir = stored.relative().parent().unwrap_or_default();
    Ok(Redirect::to(&render::browse_href(&dir)).into_response())
}

async fn read_upload_field(multipart: &mut Multipart) -> Result<(String, Bytes), WebError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or(WebError::BadRequest("upload has no file name"))?;
        let data = field.bytes().await?;
        return Ok((filename, data));
    }
    Err(WebError::BadRequest("missing uploadedFile field"))
}

pub async fn remove_root(state: State<AppState>, jar: SignedCookieJar) -> Result<Response, WebError> {
    remove_at(state, jar, String::new()).await
}

pub async fn remove(
    state: State<AppState>,
    jar: SignedCookieJar,
    Path(raw): Path<String>,
) -> Result<Response, WebError> {
    remove_at(state, jar, raw).await
}

async fn remove_at(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    raw: String,
) -> Result<Response, WebError> {
    let principal = session::current_principal(&jar);
    let principal = authorize(principal.as_ref())?.clone();

    let relative = blocking(move || {
        let target = state.root().resolve_for_removal(&raw)?;
        remove_path(state.root(), &target)?;
        Ok(target.relative().clone())
    })
    .await?;

    info!("User {principal} removed /{relative}");

    let parent = relative.parent().unwrap_or_default();
    Ok(Redirect::to(&render::browse_href(&parent)).into_response())
}
