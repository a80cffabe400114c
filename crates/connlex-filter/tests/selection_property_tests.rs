use connlex_filter::{matches, FacetGroup, FacetNode, FilterModes, Selection, Taxon, SENSE_FACETS};
use connlex_lexicon::Entry;
use proptest::prelude::*;

/// Dotted paths of every leaf below `prefix`.
fn leaf_paths(prefix: &str, taxa: &[Taxon], out: &mut Vec<String>) {
    for taxon in taxa {
        match taxon {
            Taxon::Leaf(name) => out.push(format!("{prefix}.{name}")),
            Taxon::Group(name, children) => leaf_paths(&format!("{prefix}.{name}"), children, out),
        }
    }
}

/// Dotted paths of every interior group, with their leaves.
fn group_paths(prefix: &str, taxa: &[Taxon], out: &mut Vec<(String, Vec<String>)>) {
    for taxon in taxa {
        if let Taxon::Group(name, children) = taxon {
            let path = format!("{prefix}.{name}");
            let mut leaves = Vec::new();
            leaf_paths(&path, children, &mut leaves);
            out.push((path.clone(), leaves));
            group_paths(&path, children, out);
        }
    }
}

fn sense_leaves() -> Vec<String> {
    let mut out = Vec::new();
    leaf_paths("sense", SENSE_FACETS, &mut out);
    out
}

fn sense_groups() -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    group_paths("sense", SENSE_FACETS, &mut out);
    out
}

fn find_group<'s>(root: &'s FacetGroup, path: &str) -> &'s FacetGroup {
    path.split('.')
        .skip(1)
        .fold(root, |group, name| group.group(name).expect("group exists"))
}

/// Every interior flag equals "all leaves set"; the root flag is all-or-none.
fn assert_consistent(group: &FacetGroup, root: bool) -> Result<(), TestCaseError> {
    let expected = if root {
        group.every_leaf_set() || !group.any_leaf_set()
    } else {
        group.every_leaf_set()
    };
    prop_assert_eq!(group.all, expected, "group {}", group.name());
    for child in group.children() {
        if let FacetNode::Group(inner) = child {
            assert_consistent(inner, false)?;
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn all_flags_stay_synchronized(flags in proptest::collection::vec(any::<bool>(), 30)) {
        let leaves = sense_leaves();
        prop_assert_eq!(leaves.len(), flags.len());

        let mut selection = Selection::default();
        for (path, on) in leaves.iter().zip(&flags) {
            selection.toggle(path, *on).unwrap();
            assert_consistent(&selection.sense, true)?;
        }
    }

    #[test]
    fn subtree_all_reflects_its_leaves(
        group_index in 0usize..14,
        cleared in any::<prop::sample::Index>(),
        background in proptest::collection::vec(any::<bool>(), 30),
    ) {
        let groups = sense_groups();
        prop_assert_eq!(groups.len(), 14);
        let (group_path, group_leaves) = &groups[group_index];

        let mut selection = Selection::default();
        for (path, on) in sense_leaves().iter().zip(&background) {
            selection.toggle(path, *on).unwrap();
        }

        for leaf in group_leaves {
            selection.toggle(leaf, true).unwrap();
        }
        prop_assert!(find_group(&selection.sense, group_path).all);

        let leaf = cleared.get(group_leaves);
        selection.toggle(leaf, false).unwrap();
        prop_assert!(!find_group(&selection.sense, group_path).all);
    }
}

#[test]
fn headword_substring_depends_on_word_mode() {
    let entry = Entry {
        word: "obwohl".into(),
        ..Entry::default()
    };

    let word_mode = Selection::default().with_text("wohl", FilterModes::default());
    assert!(matches(&entry, &word_mode));

    let mut no_modes = Selection::default().with_text("wohl", FilterModes::NONE);
    assert!(!matches(&entry, &no_modes));
    no_modes.toggle("pos.all", true).unwrap();
    no_modes.toggle("sense.all", true).unwrap();
    assert!(!matches(&entry, &no_modes));
}
