//! `webwire`: the restricted HTTP/1.1 subset spoken by burrowd.
//!
//! One request is a `<method> <path> <version>\r\n` line followed by zero or
//! more header lines (read and discarded) and a blank line. Responses are a
//! status line, `Content-Length`, `Content-Type`, a blank line, and exactly
//! that many body bytes. The method is recorded but never drives dispatch:
//! every path routes as if it were a GET.

pub mod request;
pub mod response;
pub mod route;

pub use request::{read_request, Request};
pub use response::{write_response, Response};
pub use route::{match_route, Route};
