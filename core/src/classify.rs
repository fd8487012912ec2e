//! Success/failure classification of completed responses.

use crate::error::PlugError;
use crate::http::HttpResponse;

/// 2xx and 304 are successes; 304 means the cached copy is still valid.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status) || status == 304
}

/// Pass a successful response through, or turn it into `PlugError::HttpStatus`.
pub fn check_status(response: HttpResponse) -> Result<HttpResponse, PlugError> {
    if is_success(response.status) {
        return Ok(response);
    }
    Err(PlugError::HttpStatus {
        status: response.status,
        response: Box::new(response),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: format!("status {status}"),
        }
    }

    #[test]
    fn success_boundary() {
        for status in [200, 201, 204, 299, 304] {
            assert!(check_status(response(status)).is_ok(), "{status} should pass");
        }
    }

    #[test]
    fn failure_boundary_keeps_status_and_response() {
        for status in [199, 300, 301, 400, 404, 500] {
            let err = check_status(response(status)).unwrap_err();
            assert_eq!(err.status(), Some(status));
            assert_eq!(err.response().unwrap().body, format!("status {status}"));
        }
    }
}
