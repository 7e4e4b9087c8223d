use jiff::SpanRelativeTo;

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    // Bare numbers are milliseconds, matching CAMPUS_PREFETCH_DELAY_MS.
    if let Ok(millis) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_millis(millis.abs()));
    }

    Err(String::from("Invalid duration"))
}

/// Parses a `key=value` list filter.
pub fn parse_filter(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("Invalid filter `{input}`, expected key=value"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Invalid filter `{input}`, key is empty"));
    }

    Ok((key.to_string(), value.trim().to_string()))
}
