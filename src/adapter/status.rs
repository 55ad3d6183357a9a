//! Response kind to HTTP status lookup

use super::ResponseKind;
use hyper::StatusCode;
use std::collections::HashMap;

/// Lookup from [`ResponseKind`] to status code, built once per listener
#[derive(Debug, Clone)]
pub struct StatusMap {
    codes: HashMap<ResponseKind, StatusCode>,
}

impl StatusMap {
    /// Override the status for one kind
    #[must_use]
    pub fn with(mut self, kind: ResponseKind, status: StatusCode) -> Self {
        self.codes.insert(kind, status);
        self
    }

    /// Status for a kind; unknown kinds map to the generic error status
    pub fn get(&self, kind: ResponseKind) -> StatusCode {
        self.codes
            .get(&kind)
            .copied()
            .unwrap_or_else(|| self.generic_error())
    }

    pub fn generic_error(&self) -> StatusCode {
        self.codes
            .get(&ResponseKind::Error)
            .copied()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn ok(&self) -> StatusCode {
        self.get(ResponseKind::Ok)
    }

    pub fn empty(&self) -> StatusCode {
        self.get(ResponseKind::Empty)
    }
}

impl Default for StatusMap {
    fn default() -> Self {
        let codes = ResponseKind::ALL
            .into_iter()
            .map(|kind| {
                let status = match kind {
                    ResponseKind::Ok => StatusCode::OK,
                    ResponseKind::Created => StatusCode::CREATED,
                    ResponseKind::Empty => StatusCode::NO_CONTENT,
                    ResponseKind::BadRequest => StatusCode::BAD_REQUEST,
                    ResponseKind::Unauthorized => StatusCode::UNAUTHORIZED,
                    ResponseKind::Forbidden => StatusCode::FORBIDDEN,
                    ResponseKind::NotFound => StatusCode::NOT_FOUND,
                    ResponseKind::Method => StatusCode::METHOD_NOT_ALLOWED,
                    ResponseKind::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
                    ResponseKind::Conflict => StatusCode::CONFLICT,
                    ResponseKind::Unsupported => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    ResponseKind::Error => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (kind, status)
            })
            .collect();
        Self { codes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let map = StatusMap::default();
        assert_eq!(map.get(ResponseKind::Ok), StatusCode::OK);
        assert_eq!(map.get(ResponseKind::Empty), StatusCode::NO_CONTENT);
        assert_eq!(map.get(ResponseKind::NotAcceptable), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            map.get(ResponseKind::Unsupported),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(map.generic_error(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_override() {
        let map = StatusMap::default().with(ResponseKind::Created, StatusCode::ACCEPTED);
        assert_eq!(map.get(ResponseKind::Created), StatusCode::ACCEPTED);
        assert_eq!(map.ok(), StatusCode::OK);
    }
}
