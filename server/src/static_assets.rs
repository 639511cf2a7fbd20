use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::IntoResponse,
};
use include_dir::{include_dir, Dir};
use mime_guess::from_path;

// The static directory ships inside the binary
static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

// Serve static files from the embedded directory
pub async fn serve_static_file(Path(path): Path<String>) -> impl IntoResponse {
    if let Some(file) = STATIC_DIR.get_file(&path) {
        let contents = file.contents().to_vec();

        let mime_type = from_path(&path).first_or_octet_stream().to_string();

        (
            [
                (header::CONTENT_TYPE, mime_type),
                (header::CACHE_CONTROL, "public, max-age=31536000".to_string()),
            ],
            contents,
        )
            .into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// URL for an embedded asset, relative to the site root
pub fn asset_url(path: &str) -> String {
    format!("/static/{}", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_url() {
        assert_eq!(asset_url("site.css"), "/static/site.css");
    }

    #[test]
    fn test_embedded_assets_present() {
        assert!(STATIC_DIR.get_file("site.css").is_some());
        assert!(STATIC_DIR.get_file("favicon.svg").is_some());
    }
}
