use buildnis_fs::NormalizedPath;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalization_is_idempotent(s in "[a-z./\\\\]{0,40}") {
        let once = NormalizedPath::new(&s);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once.as_str(), twice.as_str());
        prop_assert!(!once.as_str().contains('\\'));
    }

    #[test]
    fn absolute_paths_never_escape_root(segments in proptest::collection::vec("(\\.\\.|[a-z]{1,4})", 0..8)) {
        let raw = format!("/{}", segments.join("/"));
        let path = NormalizedPath::new(&raw);
        prop_assert!(path.is_absolute());
        prop_assert!(!path.as_str().contains(".."));
    }
}
