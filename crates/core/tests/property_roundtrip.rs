use proptest::prelude::*;
use urlcompare_core::{render_line, strip_extension, tokenize, Convention, PathGranularity};

fn convention() -> impl Strategy<Value = Convention> {
    prop::sample::select(Convention::ALL.to_vec())
}

proptest! {
    #[test]
    fn rendered_fields_tokenize_back(
        fields in prop::collection::vec("[a-zA-Z0-9 /.;,\t|\"?#=_-]{0,16}", 1..8),
        separator in prop::sample::select(vec![';', ',', '\t', '|']),
    ) {
        let line = render_line(&fields, separator);
        prop_assert_eq!(tokenize(&line, separator).unwrap(), fields);
    }

    #[test]
    fn hard_is_soft_without_extension(
        c in convention(),
        url in "[a-zA-Z0-9:/._?#=-]{0,40}",
    ) {
        let soft = c.normalize(&url, PathGranularity::WithExtension);
        let hard = c.normalize(&url, PathGranularity::WithoutExtension);
        prop_assert_eq!(strip_extension(&soft), hard.as_str());
        prop_assert_eq!(c.hard_normalize(&url), hard);
    }

    #[test]
    fn canonical_paths_are_lowercase(
        c in convention(),
        url in "[a-zA-Z0-9:/._?#=-]{0,40}",
    ) {
        let soft = c.soft_normalize(&url);
        prop_assert_eq!(soft.to_lowercase(), soft);
    }
}
