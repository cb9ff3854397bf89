// Statistical stage of the gibberish classifier — catches text that passes
// the rule stage but is still implausible as natural language: abnormally
// long "words", a majority of vowel-free tokens, or a character-frequency
// distribution outside the range natural text falls into.

const MIN_TOKENS_FOR_VOWELLESS_CHECK: usize = 3;
const VOWELLESS_TOKEN_RATIO_THRESHOLD: f64 = 0.70;
const ENTROPY_MIN: f64 = 2.0;
const ENTROPY_MAX: f64 = 4.8;

pub fn check(text: &str, mean_token_length_threshold: f64) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let mean_len = tokens.iter().map(|t| t.chars().count()).sum::<usize>() as f64 / tokens.len() as f64;
    if mean_len >= mean_token_length_threshold {
        return Some(format!("mean token length {mean_len:.1} >= threshold"));
    }

    if tokens.len() >= MIN_TOKENS_FOR_VOWELLESS_CHECK {
        let vowelless = tokens.iter().filter(|t| !has_vowel(t)).count();
        let ratio = vowelless as f64 / tokens.len() as f64;
        if ratio > VOWELLESS_TOKEN_RATIO_THRESHOLD {
            return Some(format!("{:.0}% of tokens have no vowels", ratio * 100.0));
        }
    }

    let letters: Vec<char> = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.len() >= 20 {
        let entropy = shannon_entropy(&letters);
        if !(ENTROPY_MIN..=ENTROPY_MAX).contains(&entropy) {
            return Some(format!("character entropy {entropy:.2} outside plausible range"));
        }
    }

    None
}

fn has_vowel(token: &str) -> bool {
    token
        .to_lowercase()
        .chars()
        .any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
}

fn shannon_entropy(letters: &[char]) -> f64 {
    let mut counts = [0u32; 26];
    for &c in letters {
        let idx = (c as u8).saturating_sub(b'a') as usize;
        if idx < 26 {
            counts[idx] += 1;
        }
    }
    let total = letters.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_prose_passes() {
        assert!(check(
            "This was a genuinely thoughtful and well-argued post about public policy.",
            20.0
        )
        .is_none());
    }

    #[test]
    fn extremely_long_tokens_are_flagged() {
        assert!(check(
            "xkjqzmwvbnfghplrtdcxkjqzmwvbnfghplrtdc asdkjfh",
            20.0
        )
        .is_some());
    }

    #[test]
    fn mostly_vowelless_tokens_are_flagged() {
        assert!(check("xkj bcd fgh mnp qrst", 20.0).is_some());
    }

    #[test]
    fn single_word_skips_checks() {
        assert!(check("hello", 20.0).is_none());
    }
}
