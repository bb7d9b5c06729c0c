/// Collapse runs of whitespace and trim. Display form for agent names.
pub fn normalize_display(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, accent-insensitive comparison key.
pub fn normalize_key(value: &str) -> String {
    normalize_display(value)
        .chars()
        .flat_map(fold_char)
        .collect()
}

/// True when both names are non-empty and equal under the comparison key.
pub fn same_agent_name(a: &str, b: &str) -> bool {
    let ak = normalize_key(a);
    let bk = normalize_key(b);
    !ak.is_empty() && !bk.is_empty() && ak == bk
}

fn fold_char(c: char) -> Option<char> {
    let lower = c.to_lowercase().next()?;
    Some(match lower {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    })
}
