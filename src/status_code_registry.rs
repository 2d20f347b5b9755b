use strum_macros::{Display, EnumIter, FromRepr};

// https://www.iana.org/assignments/http-status-codes/http-status-codes.xhtml
//
// Only the statuses the router, the file server and the transport produce.

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, EnumIter, FromRepr)]
#[repr(u16)]
pub enum ReasonPhrase {
    // Success
    #[strum(to_string = "OK")]
    OK = 200,
    #[strum(to_string = "Created")]
    Created = 201,
    #[strum(to_string = "No Content")]
    NoContent = 204,
    // Redirection
    #[strum(to_string = "Moved Permanently")]
    MovedPermanently = 301,
    #[strum(to_string = "Found")]
    Found = 302,
    #[strum(to_string = "Not Modified")]
    NotModified = 304,
    // Client Error
    #[strum(to_string = "Bad Request")]
    BadRequest = 400,
    #[strum(to_string = "Unauthorized")]
    Unauthorized = 401,
    #[strum(to_string = "Forbidden")]
    Forbidden = 403,
    #[strum(to_string = "Not Found")]
    NotFound = 404,
    #[strum(to_string = "Method Not Allowed")]
    MethodNotAllowed = 405,
    #[strum(to_string = "Request Timeout")]
    RequestTimeout = 408,
    #[strum(to_string = "Content Too Large")]
    ContentTooLarge = 413,
    // Server Error
    #[strum(to_string = "Internal Server Error")]
    InternalServerError = 500,
    #[strum(to_string = "Not Implemented")]
    NotImplemented = 501,
    #[strum(to_string = "Service Unavailable")]
    ServiceUnavailable = 503,
}

pub fn get_reason_phrase(status_code: u16) -> Option<ReasonPhrase> {
    ReasonPhrase::from_repr(status_code)
}

pub fn get_status_code(reason_phrase: ReasonPhrase) -> u16 {
    reason_phrase as u16
}
