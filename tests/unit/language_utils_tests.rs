/*!
 * Tests for language code utilities
 */

use chapterflow::language_utils::{
    get_language_name, is_auto, language_codes_match, normalize_code, validate_language_code,
    validate_source_language,
};

#[test]
fn test_validateLanguageCode_withIsoCodes_shouldAccept() {
    assert!(validate_language_code("en").is_ok());
    assert!(validate_language_code("fra").is_ok());
    assert!(validate_language_code("ger").is_ok());
    assert!(validate_language_code("zz").is_err());
    assert!(validate_language_code("english").is_err());
}

#[test]
fn test_validateSourceLanguage_withAuto_shouldAccept() {
    assert!(validate_source_language("auto").is_ok());
    assert!(validate_source_language("AUTO").is_ok());
    assert!(validate_language_code("auto").is_err());
}

#[test]
fn test_normalizeCode_shouldPreferTwoLetterCodes() {
    assert_eq!(normalize_code("fre").unwrap(), "fr");
    assert_eq!(normalize_code("deu").unwrap(), "de");
    assert_eq!(normalize_code(" EN ").unwrap(), "en");
    assert_eq!(normalize_code("auto").unwrap(), "auto");
}

#[test]
fn test_languageCodesMatch_acrossCodeForms_shouldMatch() {
    assert!(language_codes_match("fr", "fra"));
    assert!(language_codes_match("fr", "fre"));
    assert!(!language_codes_match("fr", "de"));
    assert!(!language_codes_match("auto", "auto"));
}

#[test]
fn test_isAuto_shouldTrimAndIgnoreCase() {
    assert!(is_auto(" Auto "));
    assert!(!is_auto("en"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert!(get_language_name("xx").is_err());
}
