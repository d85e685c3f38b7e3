use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{PatternError, RangeKind, RangeToken};

static RANGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[A-Z0-9-]+\]").expect("range token regex is valid"));

/// Locate and classify the first range token in `template`.
///
/// Returns `Ok(None)` when the template has no bracketed token at all.
pub fn find_range_token(template: &str) -> Result<Option<RangeToken>, PatternError> {
    let Some(m) = RANGE_TOKEN.find(template) else {
        return Ok(None);
    };

    let inner = &m.as_str()[1..m.as_str().len() - 1];
    let (lo, hi) = inner.split_once('-').ok_or_else(|| PatternError::MalformedRange {
        token: m.as_str().to_string(),
        reason: "expected [lo-hi]".to_string(),
    })?;

    Ok(Some(RangeToken {
        span: m.range(),
        kind: RangeKind::classify(lo, hi)?,
    }))
}

/// Expand a channel template into concrete channel names.
///
/// Without a range token the template is returned as the only name. With one,
/// each value of the range replaces the token's span, in ascending order.
/// Only the first token is expanded.
pub fn expand(template: &str) -> Result<Vec<String>, PatternError> {
    let Some(token) = find_range_token(template)? else {
        return Ok(vec![template.to_string()]);
    };

    let prefix = &template[..token.span.start];
    let suffix = &template[token.span.end..];

    Ok(token
        .kind
        .values()
        .map(|value| format!("{}{}{}", prefix, value, suffix))
        .collect())
}
