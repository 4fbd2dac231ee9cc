/// Parses a token as a 64-bit integer that must be non-negative, e.g. a node
/// id or a shape dimension.
pub fn parse_non_negative(text: &str) -> Result<usize, String> {
    let n: i64 = text
        .trim()
        .parse()
        .map_err(|_| format!("Invalid integer: '{}'", text))?;
    usize::try_from(n).map_err(|_| format!("Expected a non-negative integer, got {}", n))
}
