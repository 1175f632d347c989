//! Request classification: resource extraction and operation typing.
//!
//! These are pure functions with no failure modes. A path that cannot be
//! classified falls back to the default resource name rather than erroring.

/// Resource name used when no meaningful segment remains.
pub const DEFAULT_RESOURCE: &str = "items";

/// Path segments discarded during resource extraction.
const PREFIX_TOKENS: [&str; 4] = ["api", "v1", "v2", "v3"];

/// Kind of REST operation implied by method and path shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    List,
    GetOne,
    Create,
    Update,
    Delete,
    Unknown,
}

/// Extract the resource noun from a path.
///
/// `/api/v1/users/123` -> `users`, `/orders` -> `orders`, `/` -> `items`.
pub fn extract_resource(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .filter(|s| !PREFIX_TOKENS.contains(s) && !looks_like_id(s))
        .next_back()
        .unwrap_or(DEFAULT_RESOURCE)
        .to_string()
}

/// True when the path addresses a collection rather than a single item.
pub fn is_collection(path: &str) -> bool {
    match path.trim_matches('/').split('/').next_back() {
        Some(last) if !last.is_empty() => !looks_like_id(last),
        _ => true,
    }
}

/// Heuristic for identifier-like path segments: purely numeric, a UUID-like
/// hex-grouped prefix, or an underscored short id such as `usr_abcde1`.
pub fn looks_like_id(segment: &str) -> bool {
    if segment.is_empty() {
        return false;
    }
    if segment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if is_uuid_like(segment) {
        return true;
    }
    segment.contains('_') && segment.len() > 5 && segment.chars().any(|c| c.is_ascii_digit())
}

/// UUID-like prefix: eight hex digits followed by a dash group.
fn is_uuid_like(segment: &str) -> bool {
    let mut groups = segment.split('-');
    match (groups.next(), groups.next()) {
        (Some(first), Some(_)) => {
            first.len() == 8 && first.chars().all(|c| c.is_ascii_hexdigit())
        }
        _ => false,
    }
}

/// Map method plus collection flag to an operation kind.
pub fn operation_type(method: &str, collection: bool) -> OperationType {
    match (method.to_uppercase().as_str(), collection) {
        ("GET", true) => OperationType::List,
        ("GET", false) => OperationType::GetOne,
        ("POST", _) => OperationType::Create,
        ("PUT", _) | ("PATCH", _) => OperationType::Update,
        ("DELETE", _) => OperationType::Delete,
        _ => OperationType::Unknown,
    }
}

/// Trailing path segment, used as the item id for single-resource requests.
pub fn trailing_segment(path: &str) -> Option<&str> {
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
}
