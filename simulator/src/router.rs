use crate::error::SimulatorError;
use crate::manifest::{INIT_NAME, MANIFEST_PATH, MEDIA_SUFFIX};
use hyper::{Method, Uri};

/// What a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Manifest,
    Init,
    Segment(u64),
    NotFound,
}

/// Method and target of an HTTP/1.1 request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
}

impl RequestLine {
    /// Splits `GET /init.mp4 HTTP/1.1`. `None` when the method is missing; a
    /// missing target is kept empty so the method is still checked.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let method = parts.next()?;
        let target = parts.next().unwrap_or_default();
        Some(Self {
            method: method.to_string(),
            target: target.to_string(),
        })
    }
}

/// Classifies a request. Only `GET` is served; the query string is ignored.
pub fn route(method: &Method, target: &str) -> Result<Route, SimulatorError> {
    if method != Method::GET {
        return Err(SimulatorError::UnsupportedMethod(method.to_string()));
    }

    let path = match target.parse::<Uri>() {
        Ok(uri) => uri.path().to_string(),
        Err(_) => return Ok(Route::NotFound),
    };

    Ok(route_path(&path))
}

/// Routes a parsed request line; unparsable lines are treated as unknown paths.
pub fn route_request_line(line: Option<&RequestLine>) -> Result<Route, SimulatorError> {
    let Some(line) = line else {
        return Ok(Route::NotFound);
    };

    let method = Method::from_bytes(line.method.as_bytes())
        .map_err(|_| SimulatorError::UnsupportedMethod(line.method.clone()))?;
    route(&method, &line.target)
}

fn route_path(path: &str) -> Route {
    if path == MANIFEST_PATH {
        return Route::Manifest;
    }

    match path.strip_prefix('/') {
        Some(name) if name == INIT_NAME => Route::Init,
        Some(name) => match name.strip_suffix(MEDIA_SUFFIX) {
            Some(number) => parse_segment_number(number)
                .map(Route::Segment)
                .unwrap_or(Route::NotFound),
            None => Route::NotFound,
        },
        None => Route::NotFound,
    }
}

fn parse_segment_number(number: &str) -> Option<u64> {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    number.parse().ok()
}
