//! Canonical POS and sense taxonomies.
//!
//! Both are fixed at build time; the selection tree is instantiated from
//! them and the sense predicate descends them segment by segment.

/// A taxonomy member: a selectable leaf, or a named group of members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Taxon {
    Leaf(&'static str),
    Group(&'static str, &'static [Taxon]),
}

impl Taxon {
    pub const fn name(&self) -> &'static str {
        match self {
            Taxon::Leaf(name) | Taxon::Group(name, _) => *name,
        }
    }
}

use Taxon::{Group, Leaf};

/// Catch-all facet for tags and sense segments outside the taxonomy.
pub const OTHER: &str = "other";
pub const BELIEF: &str = "belief";
pub const SPEECH_ACT: &str = "speechact";

pub const POS_FACETS: &[Taxon] = &[
    Leaf("cco"),
    Leaf("csu"),
    Leaf("adv"),
    Leaf("prep"),
    Leaf(OTHER),
];

pub const SENSE_FACETS: &[Taxon] = &[
    Group(
        "expansion",
        &[
            Leaf("conjunction"),
            Leaf("disjunction"),
            Leaf("equivalence"),
            Leaf("instantiation"),
            Group("level_of_detail", &[Leaf("arg1_as_detail"), Leaf("arg2_as_detail")]),
            Group("substitution", &[Leaf("arg1_as_subst"), Leaf("arg2_as_subst")]),
            Group("exception", &[Leaf("arg1_as_excpt"), Leaf("arg2_as_excpt")]),
            Group("manner", &[Leaf("arg1_as_manner"), Leaf("arg2_as_manner")]),
        ],
    ),
    Group(
        "comparison",
        &[
            Leaf("contrast"),
            Leaf("similarity"),
            Group("concession", &[Leaf("arg1_as_denier"), Leaf("arg2_as_denier")]),
        ],
    ),
    Group(
        "contingency",
        &[
            Group("cause", &[Leaf("reason"), Leaf("result")]),
            Group("condition", &[Leaf("arg1_as_cond"), Leaf("arg2_as_cond")]),
            Group(
                "negative_condition",
                &[Leaf("arg1_as_negcond"), Leaf("arg2_as_negcond")],
            ),
            Group("purpose", &[Leaf("arg1_as_goal"), Leaf("arg2_as_goal")]),
        ],
    ),
    Group(
        "temporal",
        &[
            Leaf("synchronous"),
            Group("asynchronous", &[Leaf("precedence"), Leaf("succession")]),
        ],
    ),
    Leaf(BELIEF),
    Leaf(SPEECH_ACT),
    Leaf(OTHER),
];

/// Number of leaves in a taxonomy, recursively.
pub fn leaf_count(taxa: &[Taxon]) -> usize {
    taxa.iter()
        .map(|taxon| match taxon {
            Leaf(_) => 1,
            Group(_, children) => leaf_count(children),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_sizes() {
        assert_eq!(leaf_count(POS_FACETS), 5);
        assert_eq!(leaf_count(SENSE_FACETS), 30);
    }

    #[test]
    fn names_are_unique_among_siblings() {
        fn check(taxa: &[Taxon]) {
            let mut names: Vec<_> = taxa.iter().map(Taxon::name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), taxa.len());
            for taxon in taxa {
                if let Group(_, children) = taxon {
                    check(children);
                }
            }
        }
        check(POS_FACETS);
        check(SENSE_FACETS);
    }
}
