/// Sample pages in the CMS markdown dialect, from plain prose to every block
/// kind on one page.
pub const SAMPLE_PAGES: &[(&str, &str)] = &[
    (
        "prose",
        "# Chapter One\n\nIt was a **bright** cold day in April, and the clocks were striking thirteen. \
         Winston slipped quickly through the glass doors, though not quickly enough to keep out the dust.",
    ),
    (
        "lists",
        "## Packing list\n- lantern\n- rope and ~~hooks~~ carabiners\n- the ++map++\n---\nLeave before dawn.",
    ),
    (
        "table",
        "| Day | Distance | Camp |\n| --- | :---: | ---: |\n| 1 | 12 km | river |\n| 2 | 18 km | ridge |",
    ),
    (
        "mixed",
        "# Notes\n![map](/images/map.png)\nSee [the index](https://index.test) and [errata](https://errata.test).\n\n- one\n- two",
    ),
];

pub fn sample_book_json() -> String {
    let pages: Vec<&str> = SAMPLE_PAGES.iter().map(|(_, md)| *md).collect();
    serde_json::to_string(&pages).unwrap_or_else(|e| panic!("encode pages: {}", e))
}
