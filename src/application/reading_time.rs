/// Average silent reading speed used for estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Whole minutes needed to read `body`, never less than one.
pub fn estimate(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn empty_body_reads_in_one_minute() {
        assert_eq!(estimate(""), 1);
        assert_eq!(estimate("  \n\t "), 1);
    }

    #[test]
    fn rounds_up_to_whole_minutes() {
        assert_eq!(estimate(&words(200)), 1);
        assert_eq!(estimate(&words(201)), 2);
        assert_eq!(estimate(&words(400)), 2);
        assert_eq!(estimate(&words(401)), 3);
    }
}
