//! Static file fallback for unmatched routes.
//!
//! URL paths map into a configured root directory; only normal path
//! components are accepted, so `..` traversal can never escape the root.
//! The extension table is fixed: a file whose extension it does not know is
//! served as a 500, a missing file as an empty 404, exactly like any other
//! read failure.

use crate::http::{ContentType, HttpRequest, HttpResponse};
use http::StatusCode;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub struct StaticFiles {
    base_dir: PathBuf,
    index_path: String,
}

impl StaticFiles {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, index_path: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            index_path: index_path.into(),
        }
    }

    /// Map a URL path under the root, refusing anything but plain
    /// components.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut mapped = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => mapped.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(mapped)
    }

    /// Serve the file the request's path maps to; `/` serves the
    /// configured index.
    #[must_use]
    pub fn respond(&self, request: &HttpRequest) -> HttpResponse {
        let url_path = if request.path == "/" {
            self.index_path.as_str()
        } else {
            request.path.as_str()
        };

        let Some(path) = self.map_path(url_path) else {
            warn!(url = %url_path, "refused non-normal static path");
            return HttpResponse::empty_status(request, StatusCode::NOT_FOUND);
        };
        if !path.is_file() {
            debug!(path = %path.display(), "static file not found");
            return HttpResponse::empty_status(request, StatusCode::NOT_FOUND);
        }

        let content_type = path
            .extension()
            .and_then(|s| s.to_str())
            .and_then(ContentType::from_extension);
        let Some(content_type) = content_type else {
            warn!(path = %path.display(), "no content type for extension");
            return HttpResponse::empty_status(request, StatusCode::INTERNAL_SERVER_ERROR);
        };

        match fs::read(&path) {
            Ok(bytes) => HttpResponse::new(content_type, &request.version, StatusCode::OK, bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "static file read failed");
                HttpResponse::empty_status(request, StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
