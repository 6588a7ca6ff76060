use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use atelier::codeblock::{extract, ExtractedCode};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Current code block of the session's latest model message.
pub async fn get_code(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ExtractedCode>> {
    let code = latest_code(&state, session_id).await?;
    Ok(Json(code))
}

/// The raw document body, for copy-to-clipboard.
pub async fn get_code_raw(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Response> {
    let code = latest_code(&state, session_id).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        code.code,
    )
        .into_response())
}

/// The document as an `index.html` attachment.
pub async fn download_code(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Response> {
    let code = latest_code(&state, session_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"index.html\"",
            ),
        ],
        code.code,
    )
        .into_response())
}

/// Host page running the document in a sandboxed iframe.
///
/// Scripts may run inside the frame; top-level navigation stays blocked
/// because the sandbox grants no `allow-top-navigation`.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Html<String>> {
    let code = latest_code(&state, session_id).await?;
    Ok(Html(preview_page(&code.code)))
}

async fn latest_code(state: &AppState, session_id: Uuid) -> ApiResult<ExtractedCode> {
    let session = state
        .store
        .get(session_id)
        .await
        .ok_or(ApiError::SessionNotFound(session_id))?;

    session
        .last_model_message()
        .and_then(|message| extract(&message.text))
        .ok_or(ApiError::NoCode(session_id))
}

fn preview_page(document: &str) -> String {
    let srcdoc = html_escape::encode_safe(document);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Atelier Preview</title>
<style>
  html, body {{ margin: 0; height: 100%; background: #131314; }}
  iframe {{ border: none; width: 100%; height: 100%; background: #fff; }}
</style>
</head>
<body>
<iframe title="Preview" sandbox="allow-scripts allow-modals allow-forms allow-popups" srcdoc="{}"></iframe>
</body>
</html>
"#,
        srcdoc
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_page_escapes_the_document() {
        let page = preview_page("<script>\"quotes\" & <tags></script>");

        assert!(page.contains("sandbox=\"allow-scripts allow-modals allow-forms allow-popups\""));
        // the document must not break out of the srcdoc attribute
        assert!(!page.contains("srcdoc=\"<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("&quot;quotes&quot;"));
    }

    #[test]
    fn preview_page_keeps_top_level_navigation_sandboxed() {
        let page = preview_page("<p>hi</p>");
        assert!(!page.contains("allow-top-navigation"));
        assert!(!page.contains("allow-same-origin"));
    }
}
