/// Dispatch target for one request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dwarves,
    Feed,
    Locations,
    Stats,
    Favicon,
    EntityAvatar(u32),
    Entity(u32),
    Location(u32),
    /// `/` and everything unmatched, including the empty path a short
    /// request line degrades to.
    Greeting,
}

/// Match a path against the ordered route table: exact fixed paths first,
/// then id-parameterized prefixes. The avatar sub-route is tried before the
/// bare entity route since both share a prefix. First match wins; no match
/// falls through to [`Route::Greeting`].
pub fn match_route(path: &str) -> Route {
    match path {
        "/dwarves" => return Route::Dwarves,
        "/feed" => return Route::Feed,
        "/locations" => return Route::Locations,
        "/stats" => return Route::Stats,
        "/favicon.ico" => return Route::Favicon,
        _ => {}
    }

    if let Some(rest) = path.strip_prefix("/entities/") {
        if let Some(id) = rest.strip_suffix("/avatar.svg").and_then(parse_id) {
            return Route::EntityAvatar(id);
        }
        if let Some(id) = parse_id(rest) {
            return Route::Entity(id);
        }
    }
    if let Some(id) = path.strip_prefix("/locations/").and_then(parse_id) {
        return Route::Location(id);
    }

    Route::Greeting
}

fn parse_id(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
