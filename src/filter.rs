use crate::model::DirEntry;

/// Entries whose name contains `text`, ignoring case, in their original order.
/// An empty `text` keeps everything.
pub fn apply_filter(entries: &[DirEntry], text: &str) -> Vec<DirEntry> {
    if text.is_empty() {
        return entries.to_vec();
    }

    let needle = text.to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixture() -> Vec<DirEntry> {
        vec![
            DirEntry::directory("/music/Rock"),
            DirEntry::track("/music/A.mp3"),
            DirEntry::track("/music/z.mp3"),
        ]
    }

    #[test]
    fn empty_text_keeps_entries_in_order() {
        assert_eq!(apply_filter(&fixture(), ""), fixture());
    }

    #[test]
    fn matches_substring_ignoring_case() {
        let filtered = apply_filter(&fixture(), "a");
        assert_eq!(filtered, vec![DirEntry::track("/music/A.mp3")]);
    }

    #[test]
    fn directories_participate_in_matching() {
        let filtered = apply_filter(&fixture(), "ROC");
        assert_eq!(filtered, vec![DirEntry::directory("/music/Rock")]);
    }

    #[test]
    fn only_the_name_is_matched_not_the_parent_path() {
        assert!(apply_filter(&fixture(), "music").is_empty());
    }

    proptest! {
        #[test]
        fn filtering_is_idempotent(
            names in proptest::collection::vec("[a-zA-Z ]{1,8}", 0..20),
            text in "[a-zA-Z]{0,3}",
        ) {
            let entries: Vec<DirEntry> = names
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    if idx % 3 == 0 {
                        DirEntry::directory(format!("/root/{name}"))
                    } else {
                        DirEntry::track(format!("/root/{name}.mp3"))
                    }
                })
                .collect();

            let once = apply_filter(&entries, &text);
            let twice = apply_filter(&once, &text);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.len() <= entries.len());
        }
    }
}
