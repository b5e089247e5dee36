use std::alloc::{GlobalAlloc, Layout, System};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use mdpage::{parse_inline, scan_blocks, BookContent, PageSide};
use mdpage_embedded_graphics::{Canvas, MarkdownRenderOptions, MarkdownRenderer, PageTextureManager};

const DISPLAY_WIDTH: u32 = 256;
const DISPLAY_HEIGHT: u32 = 350;

struct TrackingAllocator;

static CURRENT_ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL_ALLOCATOR: TrackingAllocator = TrackingAllocator;

fn current_alloc_bytes() -> usize {
    CURRENT_ALLOC_BYTES.load(Ordering::Relaxed)
}

fn peak_alloc_bytes() -> usize {
    PEAK_ALLOC_BYTES.load(Ordering::Relaxed)
}

fn reset_peak_alloc_bytes() {
    PEAK_ALLOC_BYTES.store(current_alloc_bytes(), Ordering::Relaxed);
}

fn add_current_alloc_bytes(delta: usize) {
    let current = CURRENT_ALLOC_BYTES.fetch_add(delta, Ordering::Relaxed) + delta;
    PEAK_ALLOC_BYTES.fetch_max(current, Ordering::Relaxed);
}

fn sub_current_alloc_bytes(delta: usize) {
    let _ = CURRENT_ALLOC_BYTES.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(delta))
    });
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            add_current_alloc_bytes(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        sub_current_alloc_bytes(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            add_current_alloc_bytes(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                add_current_alloc_bytes(new_size - layout.size());
            } else {
                sub_current_alloc_bytes(layout.size() - new_size);
            }
        }
        new_ptr
    }
}

#[derive(Clone, Debug)]
struct CaseResult {
    fixture: String,
    case: String,
    iterations: usize,
    min_ns: u128,
    median_ns: u128,
    mean_ns: u128,
    max_ns: u128,
    median_peak_heap_bytes: usize,
    max_peak_heap_bytes: usize,
}

fn percentile<T: Copy>(sorted: &[T], percentile: f64) -> T {
    let idx = ((sorted.len().saturating_sub(1) as f64) * percentile).round() as usize;
    sorted[idx]
}

fn run_case<F>(
    fixture: &str,
    case: &str,
    warmup_iters: usize,
    measure_iters: usize,
    mut op: F,
) -> CaseResult
where
    F: FnMut() -> usize,
{
    for _ in 0..warmup_iters {
        black_box(op());
    }

    let mut time_samples = Vec::with_capacity(measure_iters);
    let mut mem_samples = Vec::with_capacity(measure_iters);
    for _ in 0..measure_iters {
        let baseline_alloc = current_alloc_bytes();
        reset_peak_alloc_bytes();
        let start = Instant::now();
        black_box(op());
        time_samples.push(start.elapsed().as_nanos());
        mem_samples.push(peak_alloc_bytes().saturating_sub(baseline_alloc));
    }

    time_samples.sort_unstable();
    mem_samples.sort_unstable();
    let time_sum: u128 = time_samples.iter().copied().sum();

    CaseResult {
        fixture: fixture.to_string(),
        case: case.to_string(),
        iterations: measure_iters,
        min_ns: time_samples[0],
        median_ns: percentile(&time_samples, 0.5),
        mean_ns: time_sum / time_samples.len() as u128,
        max_ns: time_samples[time_samples.len() - 1],
        median_peak_heap_bytes: percentile(&mem_samples, 0.5),
        max_peak_heap_bytes: mem_samples[mem_samples.len() - 1],
    }
}

fn prose_page() -> String {
    let sentence = "The **quick** brown fox jumps over the ~~lazy~~ dog near the ++river++ bank. ";
    format!("# Chapter One\n\n{}\n\n{}", sentence.repeat(6), sentence.repeat(4))
}

fn mixed_page() -> String {
    [
        "# Field Notes",
        "## Setup",
        "- install the [toolkit](https://tools.test)",
        "- read the **manual** first",
        "---",
        "| Name | Role | Notes |",
        "| --- | :---: | ---: |",
        "| Ada | lead | keeps the schedule |",
        "| Lin | review | owns the checklist |",
        "![diagram](/images/diagram.png)",
        "Closing words with a [link](https://end.test).",
    ]
    .join("\n")
}

fn main() {
    let quick = std::env::args().any(|arg| arg == "--quick");
    let warmup_iters = if quick { 1 } else { 3 };
    let measure_iters = if quick { 5 } else { 30 };

    println!("# mdpage benchmark");
    println!(
        "# mode={} warmup_iters={} measure_iters={}",
        if quick { "quick" } else { "full" },
        warmup_iters,
        measure_iters
    );
    println!(
        "fixture,case,iterations,min_ns,median_ns,mean_ns,max_ns,median_peak_heap_bytes,max_peak_heap_bytes"
    );

    let fixtures = [("prose", prose_page()), ("mixed", mixed_page())];
    let renderer = MarkdownRenderer::default();
    let mut results = Vec::new();
    for (fixture, markdown) in &fixtures {
        results.push(run_case(fixture, "parse_inline", warmup_iters, measure_iters, || {
            markdown.lines().map(|line| parse_inline(line).len()).sum()
        }));

        results.push(run_case(fixture, "scan_blocks", warmup_iters, measure_iters, || {
            scan_blocks(markdown).len()
        }));

        results.push(run_case(fixture, "layout_page", warmup_iters, measure_iters, || {
            renderer
                .layout(markdown, DISPLAY_WIDTH, DISPLAY_HEIGHT, None)
                .commands
                .len()
        }));

        results.push(run_case(fixture, "render_canvas", warmup_iters, measure_iters, || {
            let mut canvas = Canvas::new(DISPLAY_WIDTH, DISPLAY_HEIGHT);
            let mut links = Vec::new();
            let options = MarkdownRenderOptions {
                images: None,
                link_rects: Some(&mut links),
            };
            match renderer.render(&mut canvas, markdown, DISPLAY_WIDTH, DISPLAY_HEIGHT, options) {
                Ok(()) => links.len(),
                Err(never) => match never {},
            }
        }));

        results.push(run_case(fixture, "page_texture", warmup_iters, measure_iters, || {
            let content = BookContent::new(vec![markdown.clone(), markdown.clone()]);
            let mut manager = PageTextureManager::new(content);
            let front = manager.page_texture(0, PageSide::Front);
            let back = manager.page_texture(0, PageSide::Back);
            (front.fingerprint() ^ back.fingerprint()) as usize
        }));
    }

    for result in &results {
        println!(
            "{},{},{},{},{},{},{},{},{}",
            result.fixture,
            result.case,
            result.iterations,
            result.min_ns,
            result.median_ns,
            result.mean_ns,
            result.max_ns,
            result.median_peak_heap_bytes,
            result.max_peak_heap_bytes
        );
    }
}
