use super::*;

fn rejection(text: &str) -> Option<Rejection> {
    validate(text).rejection
}

#[test]
fn test_too_short() {
    let result = validate("short");
    assert!(!result.valid);
    assert_eq!(result.errors, vec!["Please write at least 30 characters"]);
    assert_eq!(result.rejection, Some(Rejection::TooShort));
}

#[test]
fn test_length_is_measured_after_trim() {
    let padded = format!("{:^60}", "checking one thing");
    assert_eq!(rejection(&padded), Some(Rejection::TooShort));
}

#[test]
fn test_single_character_run() {
    let result = validate(&"a".repeat(32));
    assert!(!result.valid);
    assert_eq!(result.errors, vec!["Avoid repeating the same character"]);
}

#[test]
fn test_run_inside_otherwise_fine_text() {
    assert_eq!(
        rejection("I reallyyyy need to look at the team calendar now"),
        Some(Rejection::RepeatedCharacter)
    );
}

#[test]
fn test_line_breaks_end_a_run() {
    let result = validate("Checking the bus timetable\r\r\r\rfor the trip home tonight");
    assert!(result.valid, "{:?}", result.errors);
    assert!(
        validate("Checking the bus timetable\u{2028}\u{2028}\u{2028}\u{2028}for the trip home").valid
    );
}

#[test]
fn test_dominant_character() {
    assert_eq!(
        rejection("aba aca ada aea afa aga aha aia aja"),
        Some(Rejection::RepeatedCharacter)
    );
}

#[test]
fn test_repeated_short_word_is_invalid() {
    // 29 characters, caught by the length stage.
    assert!(!validate("asdf asdf asdf asdf asdf asdf").valid);
    assert_eq!(
        rejection("asdf asdf asdf asdf asdf asdf asdf"),
        Some(Rejection::RepeatedWords)
    );
}

#[test]
fn test_repeated_keyboard_run_is_mash() {
    let result = validate("qwertqwertqwertqwertqwertqwert");
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec!["That looks like keyboard mashing, not a real reason"]
    );
}

#[test]
fn test_row_mash_with_real_words() {
    assert_eq!(
        rejection("zxcvbnm asdfghjkl qwertyuiop just because"),
        Some(Rejection::KeyboardMash)
    );
}

#[test]
fn test_order_numbers_are_not_mash() {
    let result = validate("Tracking order 123456789 and 1234567 for mom");
    assert!(result.valid, "{:?}", result.errors);
    assert!(validate("Need to pay invoice 234567890 before the office closes").valid);
}

#[test]
fn test_long_digit_run_alone_is_still_mash() {
    assert_eq!(
        rejection("1234567890 1234567890 1234567890"),
        Some(Rejection::KeyboardMash)
    );
}

#[test]
fn test_single_incidental_run_is_tolerated() {
    assert!(validate("asdfg hello there my friend what is up today").valid);
}

#[test]
fn test_genuine_sentence_is_valid() {
    let result = validate("I need to check the event schedule for my team meeting tomorrow");
    assert!(result.valid, "{:?}", result.errors);
    assert!(result.errors.is_empty());
    assert!(validate("Looking up the recipe my friend shared for dinner tonight").valid);
}

#[test]
fn test_non_latin_text_is_valid() {
    assert!(validate("我今天需要在这个网站上查找关于下周项目会议的重要资料和联系人信息").valid);
    assert!(validate("Мне нужно проверить расписание встреч на следующую неделю").valid);
}

#[test]
fn test_bare_link() {
    let result = validate("https://example.com/some/really/long/path/here");
    assert_eq!(
        result.errors,
        vec!["Please explain in your own words, not just a link"]
    );
}

#[test]
fn test_link_with_explanation_is_valid() {
    assert!(validate("Need the meeting notes from https://docs.example.com/notes for today").valid);
}

#[test]
fn test_repeated_content_word() {
    assert_eq!(
        rejection("please please please please let me read this article now"),
        Some(Rejection::RepeatedWords)
    );
}

#[test]
fn test_consonant_soup() {
    let result = validate("xkcdz bcdfg plmnt qrstv hjklm npqrs");
    assert_eq!(result.errors, vec!["Your reason should contain real words"]);
}

#[test]
fn test_stopword_loop_is_low_diversity() {
    let result = validate("the the the the and and and and it it");
    assert_eq!(result.errors, vec!["Please write a more varied explanation"]);
}

#[test]
fn test_deterministic() {
    for text in [
        "short",
        "qwertqwertqwertqwertqwertqwert",
        "I need to check the event schedule for my team meeting tomorrow",
    ] {
        assert_eq!(validate(text), validate(text));
    }
}

#[test]
fn test_custom_thresholds() {
    let validator = ReasonValidator::new(ValidatorConfig {
        min_chars: 10,
        ..ValidatorConfig::default()
    })
    .unwrap();
    assert!(validator.validate("reply to my boss").valid);
    assert_eq!(
        validator.validate("short").errors,
        vec!["Please write at least 10 characters"]
    );
}

#[test]
fn test_invalid_thresholds_rejected() {
    let err = ReasonValidator::new(ValidatorConfig {
        max_char_share: 0.0,
        ..ValidatorConfig::default()
    })
    .unwrap_err();
    assert_eq!(err.field, "max_char_share");
}
