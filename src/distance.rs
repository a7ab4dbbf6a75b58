// ==============================================================================
// Edit Distance
// ==============================================================================
//
// Levenshtein distance with unit costs for insertion, deletion and
// substitution (no transposition), counted over Unicode scalar values.
// Canonical texts are whole files, so the quadratic running time is accepted
// and only the memory is kept linear: two row buffers sized by the shorter
// text, with rows walking the longer one.

/// Compute the Levenshtein edit distance between two texts.
///
/// Symmetric, zero exactly when the texts are equal, and equal to the
/// length of the other text when either is empty.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    // Columns follow the shorter text.
    let (short, long) = if a.len() > b.len() { (b, a) } else { (a, b) };
    if short.is_empty() {
        return long.len();
    }

    let mut prev_row: Vec<usize> = (0..=short.len()).collect();
    let mut curr_row = vec![0; short.len() + 1];

    for (i, cl) in long.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, cs) in short.iter().enumerate() {
            let cost = usize::from(cl != cs);
            curr_row[j + 1] = (prev_row[j] + cost) // substitution
                .min(prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1); // insertion
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[short.len()]
}
