use std::sync::LazyLock;

use regex::Regex;

static NON_ALPHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-zA-Z\s]").expect("non-alphabetic pattern is valid")
});

/// Lowercases, blanks out everything that is not an ASCII letter or whitespace,
/// and collapses runs of whitespace. Total: empty in, empty out.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let letters_only = NON_ALPHA.replace_all(&lowered, " ");
    letters_only.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_digits_and_punctuation() {
        assert_eq!(
            normalize("  Deep-Learning for 3D   Imaging!\n(2024)"),
            "deep learning for d imaging"
        );
    }

    #[test]
    fn missing_text_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("1234 -- !!"), "");
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(normalize("Café Résumé"), "caf r sum");
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let samples = [
            "Robotics & Control Systems, Ph.D.",
            "\tquantum   OPTICS\r\n",
            "already normalized text",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }
}
