use super::*;
use toolrank_core::CompanyMention;

fn mention(tool: &str, context: &str, sentiment: f64, relevance: f64) -> ToolMention {
    ToolMention {
        tool: tool.to_owned(),
        context: context.to_owned(),
        sentiment,
        relevance,
    }
}

fn analysis(importance: f64, mentions: Vec<ToolMention>) -> AnalysisResult {
    AnalysisResult {
        title: "t".to_owned(),
        summary: "s".to_owned(),
        rewritten_excerpt: None,
        source: None,
        url: None,
        published_date: None,
        category: None,
        tags: Vec::new(),
        tool_mentions: mentions,
        company_mentions: Vec::new(),
        overall_sentiment: 0.0,
        importance_score: importance,
        key_insights: Vec::new(),
        ranking_impacts: None,
    }
}

fn ranking(name: &str, rank: i32, score: f64) -> ToolRanking {
    ToolRanking {
        tool_id: format!("id-{rank}"),
        tool_name: name.to_owned(),
        rank,
        score,
    }
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn worked_example() {
    let a = analysis(
        8.0,
        vec![mention("Cursor", "mentioned in a roundup", 0.8, 0.9)],
    );
    let changes = calculate_changes(&a, &[ranking("Cursor", 4, 0.855)]);

    assert_eq!(changes.len(), 1);
    let c = &changes[0];
    assert!(approx(c.score_change, 1.944), "points = {}", c.score_change);
    assert_eq!(c.rank_change, -1);
    assert_eq!(c.predicted_rank, 3);
    assert!(approx(c.current_score, 85.5));
    assert!(approx(c.predicted_score, 87.444));
    assert_eq!(c.tool_id, "id-4");
    assert!(approx(c.metrics.sentiment.new, 0.8));
}

#[test]
fn large_funding_adds_four() {
    let m = mention("Cursor", "closes $450m funding round", 0.5, 1.0);
    // base 1.5 + 4.0
    assert!(approx(impact_points(&m, 10.0), 5.5));
}

#[test]
fn billion_funding_is_top_tier() {
    let m = mention("Cursor", "funding of $2b", 0.5, 1.0);
    assert!(approx(impact_points(&m, 10.0), 5.5));
}

#[test]
fn moderate_funding_only_for_positive_sentiment() {
    let positive = mention("Devin", "funding $75m", 0.5, 1.0);
    assert!(approx(impact_points(&positive, 10.0), 3.0));

    let negative = mention("Devin", "funding $75m", -0.5, 1.0);
    assert!(approx(impact_points(&negative, 10.0), -1.5));
}

#[test]
fn funding_without_amount_adds_nothing() {
    let m = mention("Devin", "new funding expected", 0.5, 1.0);
    assert!(approx(impact_points(&m, 10.0), 1.5));
}

#[test]
fn rules_stack_and_clamp() {
    // 1.5 base + 2 launch + 1.5 partnership + 2.5 breakthrough + 4 funding = 11.5
    let m = mention(
        "Cursor",
        "launch, partnership, breakthrough and $500m funding",
        0.5,
        1.0,
    );
    assert!(approx(impact_points(&m, 10.0), 10.0));
}

#[test]
fn negative_rules_apply_to_negative_sentiment() {
    // -1.5 base - 3 breach - 5 shutdown = -9.5
    let m = mention("Tabnine", "breach led to shutdown", -0.5, 1.0);
    assert!(approx(impact_points(&m, 10.0), -9.5));

    // Same words with positive sentiment are ignored.
    let p = mention("Tabnine", "breach led to shutdown", 0.5, 1.0);
    assert!(approx(impact_points(&p, 10.0), 1.5));
}

#[test]
fn small_points_do_not_move_rank() {
    let a = analysis(0.0, vec![mention("Zed", "aside", 0.2, 0.5)]);
    // 0.5 × 3 × 0.2 × 0.5 = 0.15
    let changes = calculate_changes(&a, &[ranking("Zed", 10, 50.0)]);
    assert_eq!(changes[0].rank_change, 0);
    assert_eq!(changes[0].predicted_rank, 10);
    assert!(approx(changes[0].current_score, 50.0), "0-100 scores normalize");
}

#[test]
fn negative_points_move_rank_down() {
    let a = analysis(10.0, vec![mention("Aider", "lawsuit filed", -1.0, 1.0)]);
    // -3 base - 2 lawsuit = -5 → +3 (round 2.5 away from zero)
    let changes = calculate_changes(&a, &[ranking("Aider", 7, 0.4)]);
    assert_eq!(changes[0].rank_change, 3);
    assert_eq!(changes[0].predicted_rank, 10);
    assert!(approx(changes[0].predicted_score, 35.0));
}

#[test]
fn predicted_rank_never_below_one() {
    let a = analysis(10.0, vec![mention("Cursor", "revolutionary launch", 1.0, 1.0)]);
    let changes = calculate_changes(&a, &[ranking("Cursor", 1, 0.99)]);
    assert_eq!(changes[0].predicted_rank, 1);
    assert!(approx(changes[0].predicted_score, 100.0), "score capped at 1");
}

#[test]
fn unranked_mentions_are_skipped() {
    let a = analysis(8.0, vec![mention("Acme Synthesizer", "launch", 0.9, 0.9)]);
    assert!(calculate_changes(&a, &[ranking("Cursor", 1, 0.9)]).is_empty());
}

#[test]
fn raw_alias_mentions_resolve_through_normalizer() {
    let a = analysis(8.0, vec![mention("copilot", "aside", 0.8, 0.9)]);
    let changes = calculate_changes(&a, &[ranking("GitHub Copilot", 2, 0.9)]);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].tool_name, "GitHub Copilot");
}

#[test]
fn new_entities_are_detected_once() {
    let mut a = analysis(
        5.0,
        vec![
            mention("Cursor", "x", 0.1, 0.1),
            mention("Acme Agent", "an autonomous devin rival", 0.1, 0.1),
            mention("Acme Agent", "again", 0.1, 0.1),
            mention("PixelForge", "image tool", 0.1, 0.1),
        ],
    );
    a.company_mentions = vec![
        CompanyMention {
            company: "Anysphere".to_owned(),
            context: "makes Cursor".to_owned(),
            tools: None,
        },
        CompanyMention {
            company: "Acme Corp".to_owned(),
            context: "new".to_owned(),
            tools: Some(vec!["Acme Agent".to_owned()]),
        },
    ];
    let known_tools = [KnownTool {
        id: "1".to_owned(),
        name: "Cursor".to_owned(),
    }];
    let known_companies = [KnownCompany {
        id: "2".to_owned(),
        name: "Anysphere".to_owned(),
    }];

    let found = identify_new_entities(&a, &known_tools, &known_companies);
    let names: Vec<_> = found.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Acme Agent", "PixelForge"]);
    assert_eq!(found.tools[0].category, "autonomous-agent");
    assert_eq!(found.tools[1].category, "other");
    assert_eq!(found.companies.len(), 1);
    assert_eq!(found.companies[0].name, "Acme Corp");
}

#[test]
fn category_inference_order() {
    assert_eq!(infer_category("Copilot Labs", ""), "code-assistant");
    assert_eq!(infer_category("Foo", "built on llama"), "llm");
    assert_eq!(infer_category("ChatGPT Pro", ""), "llm", "gpt matches llm first");
    assert_eq!(infer_category("Bar", "nothing relevant"), "other");
}

#[test]
fn summary_averages() {
    let a = analysis(
        8.0,
        vec![
            mention("Cursor", "roundup", 0.8, 0.9),
            mention("Zed", "aside", 0.2, 0.5),
        ],
    );
    let changes = calculate_changes(&a, &[ranking("Cursor", 4, 0.855), ranking("Zed", 9, 0.5)]);
    let summary = summarize(&changes, &NewEntities::default());
    assert_eq!(summary.total_tools_affected, 2);
    assert!(approx(summary.average_rank_change, -0.5));

    let empty = summarize(&[], &NewEntities::default());
    assert!(approx(empty.average_score_change, 0.0));
}
