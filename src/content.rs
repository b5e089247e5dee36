//! Book content ingestion: markdown pages and sheet/side mapping.
//!
//! Content arrives either as a plain JSON array of markdown strings or as a
//! CMS list envelope. CMS records are classified into known shapes before
//! any page is assembled; a record matching no shape is an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::ContentError;

/// Which face of a physical sheet a page texture belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSide {
    Front,
    Back,
}

impl PageSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

/// One CMS record after shape classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentRecord {
    /// Record pinned to a 1-based page number.
    Numbered { num: u32, body: String },
    /// Record ordered by `order`, rendered as `# title` plus body.
    Titled {
        title: Option<String>,
        /// `body`, else `content`.
        body: Option<String>,
        /// `content`, else `body`; the whole page when the record lands in a
        /// numbered batch.
        content: Option<String>,
        order: i64,
    },
}

impl ContentRecord {
    /// Classify one raw record. `index` is used for error reporting.
    pub fn classify(index: usize, raw: &Value) -> Result<Self, ContentError> {
        let Some(obj) = raw.as_object() else {
            return Err(ContentError::UnrecognizedRecord { index });
        };
        let body = string_field(obj, "content").or_else(|| string_field(obj, "body"));

        if let Some(num) = obj.get("num").filter(|v| !v.is_null()) {
            let num = parse_page_number(num)
                .ok_or_else(|| ContentError::InvalidPageNumber {
                    index,
                    value: num.to_string(),
                })?;
            return Ok(Self::Numbered {
                num,
                body: body.unwrap_or_default(),
            });
        }

        let title = string_field(obj, "title");
        if title.is_none() && body.is_none() {
            return Err(ContentError::UnrecognizedRecord { index });
        }
        let content = body;
        let body = string_field(obj, "body").or_else(|| string_field(obj, "content"));
        let order = obj.get("order").and_then(Value::as_i64).unwrap_or(0);
        Ok(Self::Titled {
            title,
            body,
            content,
            order,
        })
    }

    fn titled_markdown(title: Option<&str>, body: Option<&str>) -> String {
        let parts: Vec<String> = [
            title.filter(|t| !t.is_empty()).map(|t| format!("# {}", t)),
            body.filter(|b| !b.is_empty()).map(str::to_string),
        ]
        .into_iter()
        .flatten()
        .collect();
        parts.join("\n\n")
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn parse_page_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Ordered markdown pages of a book.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookContent {
    pages: Vec<String>,
}

impl BookContent {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// Decode a page array or a CMS envelope.
    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<Self, ContentError> {
        if let Value::Array(items) = value {
            if items.iter().all(Value::is_string) {
                return Ok(Self::new(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                ));
            }
            return Self::from_records(items);
        }
        let Some(obj) = value.as_object() else {
            return Err(ContentError::UnrecognizedEnvelope);
        };
        let list = obj
            .get("contents")
            .and_then(Value::as_array)
            .or_else(|| obj.get("items").and_then(Value::as_array))
            .ok_or(ContentError::UnrecognizedEnvelope)?;
        Self::from_records(list)
    }

    /// Assemble pages from raw CMS records.
    pub fn from_records(raw: &[Value]) -> Result<Self, ContentError> {
        let records = raw
            .iter()
            .enumerate()
            .map(|(index, item)| ContentRecord::classify(index, item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::assemble(records))
    }

    fn assemble(records: Vec<ContentRecord>) -> Self {
        let any_numbered = records
            .iter()
            .any(|r| matches!(r, ContentRecord::Numbered { .. }));
        if any_numbered {
            return Self::assemble_numbered(records);
        }

        let mut titled: Vec<(i64, String)> = records
            .into_iter()
            .filter_map(|r| match r {
                ContentRecord::Titled {
                    title, body, order, ..
                } => Some((
                    order,
                    ContentRecord::titled_markdown(title.as_deref(), body.as_deref()),
                )),
                ContentRecord::Numbered { .. } => None,
            })
            .collect();
        titled.sort_by_key(|(order, _)| *order);
        Self::new(titled.into_iter().map(|(_, md)| md).collect())
    }

    fn assemble_numbered(records: Vec<ContentRecord>) -> Self {
        let max_num = records
            .iter()
            .filter_map(|r| match r {
                ContentRecord::Numbered { num, .. } => Some(*num as usize),
                ContentRecord::Titled { .. } => None,
            })
            .max()
            .unwrap_or(0);
        let mut pages = vec![String::new(); max_num];
        // Page 0 sorts ahead of records without a number.
        let mut unpinned = Vec::new();
        let mut unnumbered = Vec::new();

        let mut numbered: Vec<(u32, String)> = Vec::new();
        for record in records {
            match record {
                ContentRecord::Numbered { num, body } if num >= 1 => numbered.push((num, body)),
                ContentRecord::Numbered { body, .. } => unpinned.push(body),
                ContentRecord::Titled { content, .. } => {
                    unnumbered.push(content.unwrap_or_default())
                }
            }
        }
        numbered.sort_by_key(|(num, _)| *num);
        for (num, body) in numbered {
            if let Some(slot) = pages.get_mut(num as usize - 1) {
                *slot = body;
            }
        }
        pages.extend(unpinned);
        pages.extend(unnumbered);
        Self::new(pages)
    }

    /// Read and decode `path`, returning `fallback` on any failure.
    pub fn load_or(path: impl AsRef<Path>, fallback: BookContent) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path)
            .map_err(ContentError::from)
            .and_then(|json| Self::from_json_str(&json))
        {
            Ok(content) => content,
            Err(err) => {
                log::warn!(
                    "content load from {} failed, using bundled fallback: {}",
                    path.display(),
                    err
                );
                fallback
            }
        }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Physical sheets needed to hold every page (two faces per sheet).
    pub fn sheet_count(&self) -> usize {
        self.pages.len().div_ceil(2)
    }

    /// Content index shown on `side` of sheet `sheet_index`.
    ///
    /// Sheets are stacked so the last sheet index holds the first pages.
    pub fn content_index(&self, sheet_index: usize, side: PageSide) -> Option<usize> {
        let logical = self.sheet_count().checked_sub(1)?.checked_sub(sheet_index)?;
        Some(match side {
            PageSide::Front => logical * 2,
            PageSide::Back => logical * 2 + 1,
        })
    }

    /// Markdown for a content index; missing pages are empty.
    pub fn page_markdown(&self, content_index: usize) -> &str {
        self.pages
            .get(content_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn to_json_pretty(&self) -> Result<String, ContentError> {
        Ok(serde_json::to_string_pretty(&self.pages)?)
    }
}
