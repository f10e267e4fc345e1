use std::sync::LazyLock;

use regex::Regex;

use super::rules::ValidationRules;
use crate::models::PiiCategory;

/// Structural check for one category.
pub type Validator = fn(&str, &ValidationRules) -> bool;

// Classes are spelled out in ASCII: `regex` is Unicode-aware, so `\d`, `\s`
// and `(?i)` would let fullwidth digits, NBSP and the Kelvin sign through.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern")
});

// Optional country code, then exactly 10 digits in 3-3-4 groups.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+[0-9]{1,2} )?(?:\([0-9]{3}\)|[0-9]{3})[ .-][0-9]{3}[ .-][0-9]{4}$")
        .expect("phone pattern")
});

static SSN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{3})[- ]?([0-9]{2})[- ]?([0-9]{4})$").expect("ssn pattern")
});

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\p{L}[\p{L}'’-]*(?: \p{L}[\p{L}'’-]*)*$").expect("name pattern")
});

/// The validator table. An exhaustive match, so adding a category without
/// a validator fails to compile.
pub fn validator_for(category: PiiCategory) -> Validator {
    match category {
        PiiCategory::Email => is_valid_email,
        PiiCategory::Phone => is_valid_phone,
        PiiCategory::SocialSecurity => is_valid_ssn,
        PiiCategory::CreditCard => is_valid_credit_card,
        PiiCategory::Name => is_valid_name,
    }
}

/// Decide whether `value` is structurally plausible for `category`.
///
/// An empty (or whitespace-only) value means "nothing found" and is rejected
/// before any category pattern runs.
pub fn validate(value: &str, category: PiiCategory, rules: &ValidationRules) -> bool {
    if value.trim().is_empty() {
        return false;
    }
    validator_for(category)(value, rules)
}

pub fn is_valid_email(value: &str, _rules: &ValidationRules) -> bool {
    EMAIL_PATTERN.is_match(value)
}

pub fn is_valid_phone(value: &str, _rules: &ValidationRules) -> bool {
    PHONE_PATTERN.is_match(value)
}

pub fn is_valid_ssn(value: &str, rules: &ValidationRules) -> bool {
    let Some(caps) = SSN_PATTERN.captures(value) else {
        return false;
    };
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    match (field(1), field(2), field(3)) {
        (Some(area), Some(group), Some(serial)) => rules.ssn.allows(area, group, serial),
        _ => false,
    }
}

/// Separators are stripped before matching; the caller keeps the original
/// string.
pub fn is_valid_credit_card(value: &str, rules: &ValidationRules) -> bool {
    let digits = card_digits(value);
    rules.issuer_for(&digits).is_some()
}

pub fn is_valid_name(value: &str, _rules: &ValidationRules) -> bool {
    NAME_PATTERN.is_match(value)
}

fn card_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(category: PiiCategory, value: &str) -> bool {
        validate(value, category, &ValidationRules::default())
    }

    #[test]
    fn empty_value_rejected_for_every_category() {
        for category in PiiCategory::ALL {
            assert!(!check(*category, ""), "{category}");
            assert!(!check(*category, "   "), "{category}");
        }
    }

    #[test]
    fn every_category_has_a_validator_that_accepts_something() {
        let samples = [
            (PiiCategory::Email, "user@example.com"),
            (PiiCategory::Phone, "123-456-7890"),
            (PiiCategory::SocialSecurity, "123-45-6789"),
            (PiiCategory::CreditCard, "4111 1111 1111 1111"),
            (PiiCategory::Name, "Jane"),
        ];
        for category in PiiCategory::ALL {
            let (_, sample) = samples.iter().find(|(c, _)| c == category).unwrap();
            assert!(check(*category, sample), "{category} rejected {sample}");
        }
    }

    // ── EMAIL ───────────────────────────────────────────

    #[test]
    fn email_accepts_plain_address() {
        assert!(check(PiiCategory::Email, "user@example.com"));
        assert!(check(PiiCategory::Email, "first.last-name_2@mail.example.co.uk"));
    }

    #[test]
    fn email_is_case_insensitive() {
        assert!(check(PiiCategory::Email, "John.Doe@Example.COM"));
    }

    #[test]
    fn email_rejects_malformed() {
        assert!(!check(PiiCategory::Email, "user@"));
        assert!(!check(PiiCategory::Email, "not-an-email"));
        assert!(!check(PiiCategory::Email, "user@example.c"));
        assert!(!check(PiiCategory::Email, "user name@example.com"));
        assert!(!check(PiiCategory::Email, "user@example.com extra"));
    }

    #[test]
    fn email_rejects_letters_outside_ascii() {
        // U+212A KELVIN SIGN case-folds to `k`.
        assert!(!check(PiiCategory::Email, "user@example.\u{212A}\u{212A}"));
        assert!(!check(PiiCategory::Email, "us\u{212A}r@example.com"));
    }

    // ── PHONE ───────────────────────────────────────────

    #[test]
    fn phone_accepts_common_formats() {
        assert!(check(PiiCategory::Phone, "(123) 456-7890"));
        assert!(check(PiiCategory::Phone, "123-456-7890"));
        assert!(check(PiiCategory::Phone, "+1 123-456-7890"));
        assert!(check(PiiCategory::Phone, "123.456.7890"));
        assert!(check(PiiCategory::Phone, "+44 123 456 7890"));
    }

    #[test]
    fn phone_rejects_short_or_unbalanced() {
        assert!(!check(PiiCategory::Phone, "12345"));
        assert!(!check(PiiCategory::Phone, "123-456-789"));
        assert!(!check(PiiCategory::Phone, "(123 456-7890"));
        assert!(!check(PiiCategory::Phone, "+123 123-456-7890"));
        assert!(!check(PiiCategory::Phone, "call 123-456-7890"));
    }

    #[test]
    fn phone_rejects_non_ascii_digits_and_spaces() {
        assert!(!check(PiiCategory::Phone, "١٢٣-٤٥٦-٧٨٩٠"));
        assert!(!check(PiiCategory::Phone, "１２３-４５６-７８９０"));
        assert!(!check(PiiCategory::Phone, "123\u{A0}456\u{A0}7890"));
        assert!(!check(PiiCategory::Phone, "123\t456\t7890"));
        assert!(!check(PiiCategory::Phone, "+1\u{A0}123-456-7890"));
    }

    // ── SOCIAL_SECURITY ─────────────────────────────────

    #[test]
    fn ssn_accepts_grouped_and_ungrouped() {
        assert!(check(PiiCategory::SocialSecurity, "123-45-6789"));
        assert!(check(PiiCategory::SocialSecurity, "123 45 6789"));
        assert!(check(PiiCategory::SocialSecurity, "123456789"));
    }

    #[test]
    fn ssn_rejects_unassigned_blocks() {
        assert!(!check(PiiCategory::SocialSecurity, "000-45-6789"));
        assert!(!check(PiiCategory::SocialSecurity, "666-45-6789"));
        assert!(!check(PiiCategory::SocialSecurity, "900-45-6789"));
        assert!(!check(PiiCategory::SocialSecurity, "987-65-4321"));
        assert!(!check(PiiCategory::SocialSecurity, "123-00-6789"));
        assert!(!check(PiiCategory::SocialSecurity, "123-45-0000"));
    }

    #[test]
    fn ssn_rejects_wrong_shape() {
        assert!(!check(PiiCategory::SocialSecurity, "bad-ssn"));
        assert!(!check(PiiCategory::SocialSecurity, "XXX-XX-1234"));
        assert!(!check(PiiCategory::SocialSecurity, "1234-5-6789"));
        assert!(!check(PiiCategory::SocialSecurity, "12-345-6789"));
        assert!(!check(PiiCategory::SocialSecurity, "１２３-４５-６７８９"));
    }

    #[test]
    fn ssn_uses_rule_table() {
        let mut rules = ValidationRules::default();
        rules.ssn.excluded_areas.clear();
        assert!(validate("900-45-6789", PiiCategory::SocialSecurity, &rules));
    }

    // ── CREDIT_CARD ─────────────────────────────────────

    #[test]
    fn card_separators_are_normalized() {
        assert!(check(PiiCategory::CreditCard, "4111 1111 1111 1111"));
        assert!(check(PiiCategory::CreditCard, "4111-1111-1111-1111"));
        assert!(check(PiiCategory::CreditCard, "4111111111111111"));
    }

    #[test]
    fn card_accepts_other_issuers() {
        assert!(check(PiiCategory::CreditCard, "5500 0000 0000 0004"));
        assert!(check(PiiCategory::CreditCard, "3782 822463 10005"));
        assert!(check(PiiCategory::CreditCard, "6011 1111 1111 1117"));
        assert!(check(PiiCategory::CreditCard, "3056 930902 5904"));
    }

    #[test]
    fn card_rejects_unknown_patterns() {
        assert!(!check(PiiCategory::CreditCard, "1234 5678 9012 3456"));
        assert!(!check(PiiCategory::CreditCard, "**** **** **** 1234"));
        assert!(!check(PiiCategory::CreditCard, "4111"));
    }

    // ── NAME ────────────────────────────────────────────

    #[test]
    fn name_accepts_tokens_and_full_names() {
        assert!(check(PiiCategory::Name, "Jane"));
        assert!(check(PiiCategory::Name, "O'Brien"));
        assert!(check(PiiCategory::Name, "Jane O'Brien"));
        assert!(check(PiiCategory::Name, "Mary-Kate Smith-Jones"));
        assert!(check(PiiCategory::Name, "José Álvarez"));
    }

    #[test]
    fn name_rejects_numbers_and_punctuation() {
        assert!(!check(PiiCategory::Name, "12345"));
        assert!(!check(PiiCategory::Name, "Jane2"));
        assert!(!check(PiiCategory::Name, "Jane  Doe"));
        assert!(!check(PiiCategory::Name, "'Jane"));
        assert!(!check(PiiCategory::Name, "Jane, Doe"));
        assert!(!check(PiiCategory::Name, "Dr. Jane"));
    }
}
