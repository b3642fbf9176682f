/// Strict positional comparison. Empty slots never match; no partial credit.
pub fn grade(placed: &[Option<String>], expected: &[String]) -> bool {
    placed.len() == expected.len()
        && placed
            .iter()
            .zip(expected)
            .all(|(slot, want)| slot.as_deref() == Some(want.as_str()))
}

/// Per-blank verdicts, used by the results screen.
pub fn slot_matches(placed: &[Option<String>], expected: &[String]) -> Vec<bool> {
    expected
        .iter()
        .enumerate()
        .map(|(index, want)| {
            placed
                .get(index)
                .and_then(|slot| slot.as_deref())
                .is_some_and(|word| word == want)
        })
        .collect()
}
