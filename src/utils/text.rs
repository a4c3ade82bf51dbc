/// Lower-cases and drops everything that isn't alphanumeric, e.g. "Got to-office! " becomes
/// "gottooffice".
pub fn normalize_str(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Two texts are similar if one contains the other once normalized. Note that short texts are
/// similar to a lot of things, "a" is similar to "abacus".
pub fn is_similar(a: &str, b: &str) -> bool {
    let a = normalize_str(a);
    let b = normalize_str(b);
    a.contains(&b) || b.contains(&a)
}
