use parsetree::app::{self, default_grammar, parse_with_steps};
use parsetree::grammar::generator::RandomSentences;
use parsetree::grammar::grammar::Grammar;
use parsetree::parser::descent::DescentParser;
use parsetree::parser::parser::{replay, Parser, Step, StepAction};
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

mod util;

use util::shape;

fn outline(steps: &[Step]) -> Vec<(usize, Option<usize>, &str)> {
    steps
        .iter()
        .map(|s| (s.node_id, s.parent_id, s.description.as_str()))
        .collect()
}

#[test]
fn single_terminal() {
    let result = parse_with_steps("F -> number", "2");
    assert!(result.success);
    assert_eq!(
        outline(&result.steps),
        vec![
            (1, None, "Expand non-terminal <F>"),
            (2, Some(1), "Match terminal '2'"),
        ]
    );
    assert!(result.steps.iter().all(|s| s.action == StepAction::Add));
}

#[test]
fn default_grammar_single_number() {
    let result = parse_with_steps(default_grammar(), "2");
    assert_eq!(
        outline(&result.steps),
        vec![
            (1, None, "Expand non-terminal <E>"),
            (2, Some(1), "Expand non-terminal <T>"),
            (3, Some(2), "Expand non-terminal <F>"),
            (4, Some(3), "Match terminal '2'"),
            (5, Some(2), "Expand non-terminal <T'>"),
            (6, Some(5), "Match epsilon (empty string)"),
            (7, Some(1), "Expand non-terminal <E'>"),
            (8, Some(7), "Match epsilon (empty string)"),
        ]
    );
}

#[test]
fn failed_alternatives_leave_no_steps() {
    let result = parse_with_steps("S -> A x | A y\nA -> a", "a y");
    assert_eq!(
        outline(&result.steps),
        vec![
            (1, None, "Expand non-terminal <S>"),
            (4, Some(1), "Expand non-terminal <A>"),
            (5, Some(4), "Match terminal 'a'"),
            (6, Some(1), "Match terminal 'y'"),
        ]
    );
}

#[test]
fn failed_parse_has_no_steps() {
    let result = parse_with_steps(default_grammar(), "3 +");
    assert!(!result.success);
    assert!(result.steps.is_empty());
}

#[test]
fn replay_rebuilds_the_tree() {
    let result = parse_with_steps(default_grammar(), "(1 + 2) * 3");
    assert_eq!(replay(&result.steps), result.tree);
}

#[test]
fn replay_of_a_prefix_is_a_partial_tree() {
    let result = parse_with_steps(default_grammar(), "2");
    let partial = replay(&result.steps[..4]).unwrap();
    assert_eq!(
        shape(&partial),
        make_node!(
            "E",
            vec![make_node!("T", vec![make_node!("F", vec![leaf!("2")])])]
        )
    );
    let root = replay(&result.steps[..1]).unwrap();
    assert_eq!(root.label, "E");
    assert!(root.children.is_empty());
}

#[test]
fn replay_rejects_broken_logs() {
    assert_eq!(replay(&[]), None);

    let result = parse_with_steps("F -> number", "2");
    // The terminal alone points at a parent nobody created.
    assert_eq!(replay(&result.steps[1..]), None);

    let mut renamed = result.steps.clone();
    renamed[1].description = "Something else".to_string();
    assert_eq!(replay(&renamed), None);
}

#[test]
fn step_serializes_for_renderers() {
    let result = parse_with_steps("F -> number", "2");
    let json = serde_json::to_value(&result.steps).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"action": "add", "description": "Expand non-terminal <F>", "nodeId": 1, "parentId": null},
            {"action": "add", "description": "Match terminal '2'", "nodeId": 2, "parentId": 1},
        ])
    );
}

#[test]
fn steps_are_off_by_default() {
    assert!(app::parse(default_grammar(), "1 + 2").steps.is_empty());
}

proptest! {
    #[test]
    fn random_sentences_replay_and_repeat(seed in any::<u64>()) {
        let grammar = Grammar::compile(default_grammar());
        let mut sentences = RandomSentences::with_rng(&grammar, 1, 10, StdRng::seed_from_u64(seed));
        let input = sentences.next().unwrap().join(" ");

        let parser = DescentParser::new(&grammar);
        let result = parser.parse(&input, true);
        prop_assert!(result.success, "{}: {:?}", input, result.error);

        let ids: Vec<_> = result.steps.iter().map(|s| s.node_id).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(replay(&result.steps), result.tree.clone());
        prop_assert_eq!(parser.parse(&input, true), result);
    }
}
