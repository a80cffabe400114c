use connlex_lexicon::{parse_tag_maps, Lexicon, LexiconMetadata, LexiconNormalizer, TagMapSet};
use connlex_xml::{convert_document, ConvertOptions};

const DIMLEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dimlex>
  <entry id="k1" word="obwohl">
    <orths><orth type="cont"><part type="single">obwohl</part></orth></orths>
    <synonyms><synonym/></synonyms>
    <syn>
      <cat>konnadv</cat>
      <sem>
        <pdtb3_relation sense="Comparison:Concession:Arg2-as-denier"/>
        <example>Obwohl es regnet, gehen wir.</example>
      </sem>
    </syn>
  </entry>
  <entry id="k2" word="falls">
    <syn>
      <cat>subj</cat>
      <sem>
        <sdrt_relation sense="condition"/>
        <example>Falls es regnet, bleiben wir.</example>
      </sem>
      <sem>
        <sdrt_relation sense="alternation"/>
        <example>Falls es regnet, bleiben wir.</example>
        <example>Falls nicht, gehen wir.</example>
      </sem>
      <sem>
        <example>Ohne Relation.</example>
      </sem>
    </syn>
  </entry>
  <entry id="k3" word="zumal">
    <synonyms><synonym>da</synonym></synonyms>
    <syn>
      <cat>SUBJ</cat>
      <sem>
        <pdtb3_relation sense="Expansion:Specification:Arg2-as-detail"/>
        <pdtb3_relation sense="Contingency:Cause:Reason"/>
      </sem>
    </syn>
  </entry>
</dimlex>"#;

fn syn_maps() -> TagMapSet {
    parse_tag_maps(
        br#"{ "dimlex": { "konnadv": ["adv", "cco"], "subj": "csu" } }"#,
    )
    .unwrap()
}

fn sense_maps() -> TagMapSet {
    parse_tag_maps(
        br#"{
            "dimlex-senses": {
                "condition": "Contingency:Condition:Arg2-as-cond",
                "alternation": ["Contingency:Condition:Arg2-as-cond", "Expansion:Disjunction"],
                "expansion:level-of-detail:arg2-as-detail": ["Expansion:Level-of-detail:Arg2-as-detail", "Expansion:Instantiation"]
            }
        }"#,
    )
    .unwrap()
}

fn metadata() -> LexiconMetadata {
    LexiconMetadata::new("DiMLex").with_tagsets(Some("dimlex"), Some("dimlex-senses"))
}

fn load() -> Lexicon {
    let value = convert_document(DIMLEX, &ConvertOptions::lexicon()).unwrap();
    serde_json::from_value(serde_json::to_value(&value).unwrap()).unwrap()
}

fn normalized() -> Lexicon {
    let (syn_maps, sense_maps) = (syn_maps(), sense_maps());
    let mut lexicon = load();
    let mut meta = metadata();
    assert!(LexiconNormalizer::new(&syn_maps, &sense_maps).normalize(&mut lexicon, "dimlex", &mut meta));
    lexicon
}

#[test]
fn entries_are_stamped_with_lexicon_metadata() {
    let lexicon = normalized();
    let entry = &lexicon.entry[0];
    assert_eq!(entry.lex_id, "dimlex");
    assert_eq!(entry.lex_name, "DiMLex");
    assert_eq!(entry.color.len(), 6);
    assert_eq!(entry.pos_tagset.as_deref(), Some("dimlex"));
    assert!(entry.synonyms.synonym.is_empty(), "empty synonym item dropped");
    assert!(!entry.has_synonyms);
    assert!(lexicon.entry[2].has_synonyms);
}

#[test]
fn normalizing_twice_is_a_no_op() {
    let (syn_maps, sense_maps) = (syn_maps(), sense_maps());
    let normalizer = LexiconNormalizer::new(&syn_maps, &sense_maps);
    let mut meta = metadata();

    let mut lexicon = load();
    normalizer.normalize(&mut lexicon, "dimlex", &mut meta);
    let once = serde_json::to_string(&lexicon).unwrap();

    assert!(!normalizer.normalize(&mut lexicon, "dimlex", &mut meta));
    assert_eq!(serde_json::to_string(&lexicon).unwrap(), once);

    // The marker survives the JSON artifact, too.
    let mut reloaded: Lexicon = serde_json::from_str(&once).unwrap();
    assert!(!normalizer.normalize(&mut reloaded, "dimlex", &mut meta));
    assert_eq!(serde_json::to_string(&reloaded).unwrap(), once);
}

#[test]
fn multi_target_pos_tag_duplicates_the_syn() {
    let lexicon = normalized();
    let syns = &lexicon.entry[0].syn;
    assert_eq!(syns.len(), 2);
    assert_eq!(syns[0].tag(), Some("adv"));
    assert_eq!(syns[1].tag(), Some("cco"));
    for syn in syns {
        assert_eq!(syn.cat.as_ref().and_then(|c| c.orig.as_deref()), Some("konnadv"));
    }
    assert_eq!(syns[0].sem, syns[1].sem);
    assert_eq!(
        syns[0].sem[0].pdtb3_relation[0].sense.as_deref(),
        Some("Comparison:Concession:Arg2-as-denier")
    );
}

#[test]
fn pos_lookup_is_case_insensitive() {
    let lexicon = normalized();
    let syn = &lexicon.entry[2].syn[0];
    assert_eq!(syn.tag(), Some("csu"));
    assert_eq!(syn.cat.as_ref().and_then(|c| c.orig.as_deref()), Some("SUBJ"));
}

#[test]
fn sems_with_identical_sense_sets_are_merged() {
    let lexicon = normalized();
    let sems = &lexicon.entry[1].syn[0].sem;
    assert_eq!(sems.len(), 2, "relation-less sem dropped, condition variants merged");

    let condition = &sems[0];
    let relation = &condition.pdtb3_relation[0];
    assert_eq!(relation.sense.as_deref(), Some("Contingency:Condition:Arg2-as-cond"));
    assert_eq!(relation.sense_orig.as_deref(), Some("condition, alternation"));
    let examples: Vec<_> = condition.example.iter().filter_map(|e| e.t.as_deref()).collect();
    assert_eq!(
        examples,
        vec!["Falls es regnet, bleiben wir.", "Falls nicht, gehen wir."]
    );
    assert!(condition.sdrt_relation.is_empty());

    assert_eq!(
        sems[1].pdtb3_relation[0].sense.as_deref(),
        Some("Expansion:Disjunction")
    );
}

#[test]
fn compound_sems_take_the_first_target_without_fan_out() {
    let lexicon = normalized();
    let sems = &lexicon.entry[2].syn[0].sem;
    assert_eq!(sems.len(), 1);
    let relations = &sems[0].pdtb3_relation;
    assert_eq!(
        relations[0].sense.as_deref(),
        Some("Expansion:Level-of-detail:Arg2-as-detail")
    );
    assert_eq!(
        relations[0].sense_orig.as_deref(),
        Some("Expansion:Level-of-detail:Arg2-as-detail")
    );
    assert_eq!(relations[1].sense.as_deref(), Some("Contingency:Cause:Reason"));
    assert!(relations[1].sense_orig.is_none());
}

#[test]
fn missing_tagsets_leave_tags_untouched() {
    let (syn_maps, sense_maps) = (syn_maps(), sense_maps());
    let mut lexicon = load();
    let mut meta = LexiconMetadata::fallback("dimlex");
    LexiconNormalizer::new(&syn_maps, &sense_maps).normalize(&mut lexicon, "dimlex", &mut meta);

    assert_eq!(lexicon.entry[0].syn.len(), 1);
    assert_eq!(lexicon.entry[0].syn[0].tag(), Some("konnadv"));
    assert_eq!(lexicon.entry[1].syn[0].sem.len(), 2);
    assert_eq!(lexicon.entry[0].lex_name, "dimlex");
}
