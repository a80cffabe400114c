//! Lexicon normalization.
//!
//! Turns a freshly converted lexicon into the shape the filter and the
//! result views expect:
//!
//! 1. every entry is stamped with its lexicon id and the lexicon metadata
//!    (name, color, language, tagsets);
//! 2. synonym/example items without text are dropped at every level and
//!    `hasSynonyms` is derived;
//! 3. each syn's POS tag is remapped onto the canonical POS set; a tag that
//!    maps to several targets fans the syn out into one deep copy per target;
//! 4. each sem's competing relation systems are folded onto one relation
//!    list, sense names are canonicalized and remapped onto the canonical
//!    sense taxonomy (fanning out single-relation sems the same way);
//! 5. sems of one syn that end up with the same sense set are merged.
//!
//! A lexicon is normalized at most once: the `isProcessed` marker is set on
//! the first run and honored on every later one.

use tracing::{debug, info, warn};

use crate::metadata::LexiconMetadata;
use crate::model::{Cat, Entry, Lexicon, Sem, Syn};
use crate::tagmap::{TagMap, TagMapSet, TagTarget};

/// Fixed spelling fixes applied to sense names before lookup.
const SENSE_RENAMES: [(&str, &str); 2] = [
    ("Specification", "Level-of-detail"),
    ("-as-consequent", "-as-cond"),
];

pub fn canonical_sense_name(sense: &str) -> String {
    SENSE_RENAMES
        .iter()
        .fold(sense.to_string(), |name, (from, to)| name.replacen(from, to, 1))
}

/// Lexicon-level values copied onto every entry.
struct EntryStamp<'a> {
    lex_id: &'a str,
    lex_name: &'a str,
    color: &'a str,
    language: Option<&'a str>,
    pos_tagset: Option<&'a str>,
    sense_tagset: Option<&'a str>,
}

impl EntryStamp<'_> {
    fn apply(&self, entry: &mut Entry) {
        entry.lex_id = self.lex_id.to_string();
        entry.lex_name = self.lex_name.to_string();
        entry.color = self.color.to_string();
        entry.language = self.language.map(str::to_string);
        entry.pos_tagset = self.pos_tagset.map(str::to_string);
        entry.sense_tagset = self.sense_tagset.map(str::to_string);
    }
}

pub struct LexiconNormalizer<'m> {
    syn_maps: &'m TagMapSet,
    sense_maps: &'m TagMapSet,
}

impl<'m> LexiconNormalizer<'m> {
    pub fn new(syn_maps: &'m TagMapSet, sense_maps: &'m TagMapSet) -> Self {
        Self {
            syn_maps,
            sense_maps,
        }
    }

    /// Normalize `lexicon` in place. Returns `false` if it was already
    /// normalized and nothing changed.
    pub fn normalize(
        &self,
        lexicon: &mut Lexicon,
        lex_id: &str,
        metadata: &mut LexiconMetadata,
    ) -> bool {
        if lexicon.is_processed {
            debug!(lex_id, "lexicon already normalized");
            return false;
        }

        let color = metadata.color().to_string();
        let parse_info = &metadata.parse_info;
        let pos_map = resolve(self.syn_maps, parse_info.pos_tagset.as_deref(), "POS", lex_id);
        let sense_map = resolve(
            self.sense_maps,
            parse_info.sense_tagset.as_deref(),
            "sense",
            lex_id,
        );

        let stamp = EntryStamp {
            lex_id,
            lex_name: &metadata.lexicon_name,
            color: &color,
            language: metadata.language_english.as_deref(),
            pos_tagset: parse_info.pos_tagset.as_deref(),
            sense_tagset: parse_info.sense_tagset.as_deref(),
        };

        let mut syns_before = 0;
        let mut syns_after = 0;
        for entry in &mut lexicon.entry {
            syns_before += entry.syn.len();
            normalize_entry(entry, &stamp, pos_map, sense_map);
            syns_after += entry.syn.len();
        }
        lexicon.is_processed = true;

        info!(
            lex_id,
            entries = lexicon.entry.len(),
            syns_before,
            syns_after,
            "normalized lexicon"
        );
        true
    }
}

/// The table for a configured tagset. No tagset disables remapping for that
/// axis; a tagset missing from the map file does too, with a warning.
fn resolve<'m>(
    maps: &'m TagMapSet,
    tagset: Option<&str>,
    axis: &'static str,
    lex_id: &str,
) -> Option<&'m TagMap> {
    let tagset = tagset?;
    let map = maps.get(tagset);
    if map.is_none() {
        warn!(lex_id, axis, tagset, "no tag map for tagset, tags pass through");
    }
    map
}

fn normalize_entry(
    entry: &mut Entry,
    stamp: &EntryStamp<'_>,
    pos_map: Option<&TagMap>,
    sense_map: Option<&TagMap>,
) {
    stamp.apply(entry);
    entry.drop_empty_text_items();
    entry.has_synonyms = entry.any_synonyms();

    let syns = std::mem::take(&mut entry.syn);
    entry.syn = syns
        .into_iter()
        .flat_map(|syn| remap_syn(syn, pos_map))
        .map(|mut syn| {
            let sems = std::mem::take(&mut syn.sem);
            syn.sem = normalize_sems(sems, sense_map);
            syn
        })
        .collect();
}

// ============================================================================
// POS
// ============================================================================

fn remap_syn(mut syn: Syn, map: Option<&TagMap>) -> Vec<Syn> {
    let Some(map) = map else {
        return vec![syn];
    };
    let Some(tag) = syn.tag() else {
        return vec![syn];
    };
    let targets: Vec<String> = match map.lookup(tag) {
        Some(target) => target.as_slice().to_vec(),
        None => return vec![syn],
    };
    let Some((first, rest)) = targets.split_first() else {
        return vec![syn];
    };

    let cat = syn.cat.get_or_insert_with(Cat::default);
    cat.orig = cat.t.replace(first.clone());

    let copies: Vec<Syn> = rest.iter().map(|target| syn.fan_out(target)).collect();
    std::iter::once(syn).chain(copies).collect()
}

// ============================================================================
// Senses
// ============================================================================

fn normalize_sems(sems: Vec<Sem>, map: Option<&TagMap>) -> Vec<Sem> {
    let mut result: Vec<Sem> = Vec::with_capacity(sems.len());
    for mut sem in sems {
        if !sem.has_relation() {
            continue;
        }
        sem.collapse_relations();
        for relation in &mut sem.pdtb3_relation {
            if let Some(sense) = relation.sense.as_mut() {
                *sense = canonical_sense_name(sense);
            }
        }
        for variant in remap_sem(sem, map) {
            merge_into(&mut result, variant);
        }
    }
    result
}

fn remap_sem(mut sem: Sem, map: Option<&TagMap>) -> Vec<Sem> {
    let Some(map) = map else {
        return vec![sem];
    };

    // Compound annotation: first target per relation, no fan-out.
    if sem.pdtb3_relation.len() > 1 {
        for relation in &mut sem.pdtb3_relation {
            let mapped = relation
                .sense
                .as_deref()
                .and_then(|sense| map.lookup(sense))
                .and_then(TagTarget::first)
                .map(str::to_string);
            if let Some(mapped) = mapped {
                relation.sense_orig = relation.sense.replace(mapped);
            }
        }
        return vec![sem];
    }

    let targets: Vec<String> = match sem
        .pdtb3_relation
        .first()
        .and_then(|relation| relation.sense.as_deref())
        .and_then(|sense| map.lookup(sense))
    {
        Some(target) => target.as_slice().to_vec(),
        None => return vec![sem],
    };
    let Some((first, rest)) = targets.split_first() else {
        return vec![sem];
    };

    if let Some(relation) = sem.pdtb3_relation.first_mut() {
        relation.sense_orig = relation.sense.replace(first.clone());
    }
    let copies: Vec<Sem> = rest.iter().map(|target| retarget(&sem, target)).collect();
    std::iter::once(sem).chain(copies).collect()
}

/// Deep copy of a single-relation sem pointing at another target sense.
fn retarget(sem: &Sem, target: &str) -> Sem {
    let mut copy = sem.clone();
    if let Some(relation) = copy.pdtb3_relation.first_mut() {
        relation.sense = Some(target.to_string());
    }
    copy
}

fn merge_into(result: &mut Vec<Sem>, sem: Sem) {
    let position = {
        let senses = sem.sense_set();
        result.iter().position(|existing| existing.sense_set() == senses)
    };
    match position {
        Some(index) => result[index].absorb(sem),
        None => result.push(sem),
    }
}
