//! Edit-distance text matching used by the donor search stage.
//!
//! The distance is classic Levenshtein over a full dynamic-programming table;
//! the filter keeps an item when the query is a substring of one of its
//! searchable fields or within the edit-distance threshold of one.

/// Minimum number of single-character insertions, deletions, or substitutions
/// needed to turn `a` into `b`.
///
/// Comparison is case-sensitive; callers lower-case both sides first.
pub fn distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let mut matrix = vec![vec![0usize; a_chars.len() + 1]; b_chars.len() + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=a_chars.len() {
        matrix[0][j] = j;
    }

    for i in 1..=b_chars.len() {
        for j in 1..=a_chars.len() {
            if b_chars[i - 1] == a_chars[j - 1] {
                matrix[i][j] = matrix[i - 1][j - 1];
            } else {
                let substitution = matrix[i - 1][j - 1] + 1;
                let insertion = matrix[i][j - 1] + 1;
                let deletion = matrix[i - 1][j] + 1;
                matrix[i][j] = substitution.min(insertion).min(deletion);
            }
        }
    }

    matrix[b_chars.len()][a_chars.len()]
}

/// Record with the two fields the fuzzy filter inspects.
pub trait FuzzyTarget {
    fn name(&self) -> &str;
    fn location(&self) -> &str;
}

/// Keep the items whose name or location matches `query`, preserving input
/// order. An item matches when the lower-cased query is a substring of the
/// lower-cased field, or when the field is within `threshold` edits of the
/// query. An empty query keeps everything.
pub fn fuzzy_filter<T: FuzzyTarget>(query: &str, items: Vec<T>, threshold: usize) -> Vec<T> {
    if query.is_empty() {
        return items;
    }

    let lower_query = query.to_lowercase();

    items
        .into_iter()
        .filter(|item| {
            let name = item.name().to_lowercase();
            let location = item.location().to_lowercase();

            name.contains(&lower_query)
                || location.contains(&lower_query)
                || distance(&lower_query, &name) <= threshold
                || distance(&lower_query, &location) <= threshold
        })
        .collect()
}
