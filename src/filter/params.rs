use super::error::FilterError;

/// Parse a comma-separated id list such as `tags=1,4,9`.
///
/// A missing or blank parameter means "no filter" and yields `None`.
/// Tokens are trimmed; any token that is not an integer (including an empty
/// one from a doubled comma) fails the whole parameter.
pub fn parse_id_list(param: &str, raw: Option<&str>) -> Result<Option<Vec<i64>>, FilterError> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    raw.split(',')
        .map(|token| {
            token.trim().parse::<i64>().map_err(|_| FilterError::InvalidIdList {
                param: param.to_string(),
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse an integer-style boolean flag such as `assigned_only=1`.
pub fn parse_flag(param: &str, raw: Option<&str>) -> Result<bool, FilterError> {
    let value = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(false),
    };

    if let Ok(n) = value.parse::<i64>() {
        return Ok(n != 0);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FilterError::InvalidFlag {
            param: param.to_string(),
            value: value.to_string(),
        }),
    }
}
