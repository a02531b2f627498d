/*!
 * Tests for chunk splitting
 */

use chapterflow::app_config::SplitterConfig;
use chapterflow::translation::splitter::{ChunkSplitter, SENTENCE_DELIMITER};

use crate::common::small_splitter;

#[test]
fn test_split_shouldReassembleToInput() {
    let splitter = small_splitter();
    let text = "First sentence here. Second one. A third, slightly longer sentence. End.";

    let chunks = splitter.split(text);

    assert!(chunks.len() > 1);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_split_shouldKeepDelimiterWithSentence() {
    let splitter = small_splitter();
    let chunks = splitter.split("Short one. Another short. Last");

    for chunk in &chunks[..chunks.len() - 1] {
        assert!(chunk.ends_with(SENTENCE_DELIMITER), "chunk {:?} lost its delimiter", chunk);
    }
}

#[test]
fn test_split_withTextUnderSoftLimit_shouldYieldOneChunk() {
    let splitter = ChunkSplitter::default();
    let text = "A short chapter. Only two sentences.";
    assert_eq!(splitter.split(text), vec![text.to_string()]);
}

#[test]
fn test_split_withoutDelimiters_shouldRespectHardLimit() {
    let splitter = small_splitter();
    let text = "x".repeat(95);

    let chunks = splitter.split(&text);

    assert!(chunks.iter().all(|c| c.chars().count() <= splitter.hard_limit()));
    assert_eq!(chunks.len(), 10);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn test_split_withMultibyteText_shouldCountChars() {
    let splitter = ChunkSplitter::new(&SplitterConfig {
        soft_limit: 4,
        hard_limit: 6,
        slice_size: 3,
    });
    let text = "日本語のテキストです";

    let chunks = splitter.split(text);

    assert_eq!(chunks, vec!["日本語", "のテキ", "ストで", "す"]);
}

#[test]
fn test_split_withWhitespaceOnly_shouldYieldNothing() {
    assert!(small_splitter().split("  \n  ").is_empty());
}

#[test]
fn test_split_shouldBeDeterministic() {
    let splitter = small_splitter();
    let text = "One. Two. Three. Four. Five. Six. Seven. Eight.";
    assert_eq!(splitter.split(text), splitter.split(text));
}

#[test]
fn test_checkHardLimit_withOversizedChunk_shouldReportLength() {
    let splitter = small_splitter();
    let overflow = splitter.check_hard_limit(&"y".repeat(41)).unwrap_err();
    assert_eq!(overflow.length, 41);
    assert_eq!(overflow.limit, 40);
    assert!(splitter.check_hard_limit(&"y".repeat(40)).is_ok());
}
