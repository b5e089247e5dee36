use std::sync::Arc;

use mdpage::TableModel;
use mdpage_render::{
    DrawCommand, LayoutConfig, LayoutEngine, LinkRegistry, PageKey, PageSide, RenderPage,
    ResolvedTextStyle, TextMeasurer,
};

const CHAR_PX: f32 = 6.0;

/// Monospace measurer: every char is `CHAR_PX` wide regardless of style.
struct MonoMeasurer;

impl TextMeasurer for MonoMeasurer {
    fn measure_text_px(&self, text: &str, _style: &ResolvedTextStyle) -> f32 {
        text.chars().count() as f32 * CHAR_PX
    }
}

fn build_engine(width: u32, height: u32) -> LayoutEngine {
    LayoutEngine::new(LayoutConfig::for_display(width, height))
        .with_text_measurer(Arc::new(MonoMeasurer))
}

/// Deterministic word soup.
fn sample_words(seed: u64, count: usize) -> Vec<String> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let len = 1 + ((state >> 33) % 12) as usize;
            let ch = (b'a' + ((state >> 20) % 26) as u8) as char;
            ch.to_string().repeat(len)
        })
        .collect()
}

/// Classic greedy wrap on single-space separated words.
fn reference_line_count(words: &[String], max_width: f32) -> usize {
    let mut lines = 0usize;
    let mut current = String::new();
    for word in words {
        if current.is_empty() {
            current = word.clone();
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if candidate.chars().count() as f32 * CHAR_PX > max_width {
            lines += 1;
            current = word.clone();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines += 1;
    }
    lines
}

fn baselines(page: &RenderPage) -> Vec<i32> {
    let mut out: Vec<i32> = page.text_commands().map(|t| t.baseline_y).collect();
    out.dedup();
    out
}

#[test]
fn layout_is_idempotent() {
    let engine = build_engine(256, 350);
    let md = "# Title\n\nSome **bold** and [a link](https://x.test)\n\n- item\n---\n| A | B |\n| --- | --- |\n| 1 | 2 |\n![pic](/p.png)";
    let first = engine.layout_markdown(md, None);
    let second = engine.layout_markdown(md, None);
    assert_eq!(first, second);
    assert!(!first.links.is_empty());
}

#[test]
fn wrap_matches_reference_greedy_wrapper() {
    let engine = build_engine(256, 2000);
    let content = engine.config().content_width();
    for seed in 1..20u64 {
        let words = sample_words(seed, 10 + (seed as usize * 3));
        let paragraph = words.join(" ");
        let page = engine.layout_markdown(&paragraph, None);
        assert_eq!(
            baselines(&page).len(),
            reference_line_count(&words, content),
            "seed {}: {}",
            seed,
            paragraph
        );
    }
}

#[test]
fn overlong_word_renders_on_its_own_line() {
    let engine = build_engine(120, 350);
    let md = format!("ab {} cd", "x".repeat(60));
    let page = engine.layout_markdown(&md, None);
    let lines = baselines(&page);
    assert_eq!(lines.len(), 3);
    let long = page
        .text_commands()
        .find(|t| t.text.len() == 60)
        .expect("long word");
    assert_eq!(long.x, 20);
}

#[test]
fn table_columns_fit_content_width() {
    let engine = build_engine(256, 350);
    let content = engine.config().content_width();
    let gap = engine.config().table.column_gap;
    let rows = [
        "| a much longer heading cell | second column | third column here |",
        "| --- | :---: | ---: |",
        "| lots of body text that will not fit | x | y |",
    ];
    let model = TableModel::parse(&rows);
    assert!(model.has_header);
    let widths = engine.table_column_widths(&model, content);
    assert_eq!(widths.len(), 3);
    let total: f32 = widths.iter().sum::<f32>() + gap * 2.0;
    assert!(total <= content + 1.0, "total {} > {}", total, content);
}

#[test]
fn header_detection_bolds_first_row_only() {
    let engine = build_engine(256, 350);
    let page = engine.layout_markdown("| A | B |\n| --- | --- |\n| 1 | 2 |", None);
    let weights: Vec<(String, bool)> = page
        .text_commands()
        .map(|t| (t.text.clone(), t.style.is_bold()))
        .collect();
    assert_eq!(
        weights,
        vec![
            ("A".to_string(), true),
            ("B".to_string(), true),
            ("1".to_string(), false),
            ("2".to_string(), false),
        ]
    );
}

#[test]
fn table_without_separator_has_no_header() {
    let engine = build_engine(256, 350);
    let page = engine.layout_markdown("| A | B |\n| 1 | 2 |", None);
    assert!(page.text_commands().all(|t| !t.style.is_bold()));
}

#[test]
fn link_rects_round_trip_through_registry() {
    let engine = build_engine(256, 350);
    let page = engine.layout_markdown("Read [the guide](https://guide.test) now", None);
    // One rect per run of the label, including the space.
    assert_eq!(page.links.len(), 3);
    let registry = LinkRegistry::new();
    let key = PageKey::new(3, PageSide::Back);
    registry.record_links(key, page.width, page.height, page.links.clone());

    let w = page.width as f32;
    let h = page.height as f32;
    for rect in &page.links {
        let (cx, cy) = rect.center();
        assert_eq!(
            registry.lookup(key, cx / w, 1.0 - cy / h).as_deref(),
            Some("https://guide.test")
        );
    }
    let first = &page.links[0];
    let (_, cy) = first.center();
    assert_eq!(registry.lookup(key, (first.x - 1.0) / w, 1.0 - cy / h), None);
    let last = &page.links[2];
    assert_eq!(
        registry.lookup(key, (last.x + last.w + 1.0) / w, 1.0 - cy / h),
        None
    );
}

#[test]
fn odd_bold_marker_stays_bold_to_line_end() {
    let engine = build_engine(256, 350);
    let page = engine.layout_markdown("a **b c", None);
    let styles: Vec<(String, bool)> = page
        .text_commands()
        .map(|t| (t.text.clone(), t.style.is_bold()))
        .collect();
    assert_eq!(styles[0], ("a".to_string(), false));
    assert!(styles[2..].iter().all(|(_, bold)| *bold));
}

#[test]
fn cjk_without_spaces_stays_one_run() {
    let engine = build_engine(120, 350);
    let text = "吾輩は猫である。名前はまだ無い。どこで生れたかとんと見当がつかぬ。";
    let page = engine.layout_markdown(text, None);
    let runs: Vec<&str> = page.text_commands().map(|t| t.text.as_str()).collect();
    assert_eq!(runs, vec![text]);
}

#[test]
fn cursor_never_moves_up() {
    let engine = build_engine(256, 350);
    let md = "# A\n\n## B\n- c\n---\nd\n| e |\n![f](/g.png)\n[broken](\n";
    let page = engine.layout_markdown(md, None);
    let mut last = i32::MIN;
    for cmd in &page.commands {
        if let DrawCommand::Text(text) = cmd {
            assert!(text.baseline_y >= last);
            last = text.baseline_y;
        }
    }
    assert!(page.cursor_y >= engine.config().margin_top);
}
