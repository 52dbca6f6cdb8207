//! Edit-distance similarity in [0, 1].

/// Levenshtein distance over chars, unit cost for insert/delete/substitute.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            curr[j] = if a[i - 1] == b[j - 1] {
                prev[j - 1]
            } else {
                1 + prev[j - 1].min(prev[j]).min(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `(max_len - distance) / max_len`, or 0 when either side is empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 || b_len == 0 {
        return 0.0;
    }
    let longer = a_len.max(b_len) as f64;
    (longer - levenshtein_distance(a, b) as f64) / longer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn distance_counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("café", "cafe"), 1);
        assert_eq!(levenshtein_distance("ตั้งค่า", "ตั้งค่า"), 0);
    }

    #[test]
    fn reflexive_and_empty() {
        for s in ["a", "avatar", "Avatar Performance Rank", "…"] {
            assert_eq!(similarity(s, s), 1.0);
            assert_eq!(similarity("", s), 0.0);
            assert_eq!(similarity(s, ""), 0.0);
        }
        assert_eq!(similarity("", ""), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [("avatar", "avatars"), ("rank", "ranking"), ("abc", "xyz"), ("menu", "")];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn maximally_distant_is_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("avatar", "avatars") - 6.0 / 7.0).abs() < 1e-12);
    }
}
