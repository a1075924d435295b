//! Transaction extraction from exported statement pages
//!
//! A statement export is a list of `section.cc-table-entry` blocks. Each block
//! holds labelled cells (`div[data-header=...]`) for the transaction date,
//! merchant name and amount:
//!
//! ```html
//! <section class="cc-table-entry">
//!   <div role="cell" data-header="תאריך העסקה"><span class="ts-num">28/02/25</span></div>
//!   <div role="cell" data-header="שם בית העסק"><span>Merchant Name</span></div>
//!   <div role="cell" data-header="סכום העסקה">
//!     <app-common-number><div class="ts-num sm"><span class="ng-star-inserted">39.46</span></div></app-common-number>
//!   </div>
//! </section>
//! ```
//!
//! Cells are located by label, not by position. Extraction never fails as a
//! whole: every block yields either a [`RawEntry`] or an [`EntrySkip`].

use std::sync::OnceLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// Cell label for the transaction date
pub const DATE_HEADER: &str = "תאריך העסקה";
/// Cell label for the merchant name
pub const MERCHANT_HEADER: &str = "שם בית העסק";
/// Cell label for the transaction amount
pub const AMOUNT_HEADER: &str = "סכום העסקה";

/// The three fields of a transaction block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Merchant,
    Amount,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Merchant => "merchant",
            Self::Amount => "amount",
        }
    }

    /// Label carried in the cell's `data-header` attribute
    pub fn header(&self) -> &'static str {
        match self {
            Self::Date => DATE_HEADER,
            Self::Merchant => MERCHANT_HEADER,
            Self::Amount => AMOUNT_HEADER,
        }
    }

    fn cell_selector(&self) -> &'static Selector {
        static DATE: OnceLock<Selector> = OnceLock::new();
        static MERCHANT: OnceLock<Selector> = OnceLock::new();
        static AMOUNT: OnceLock<Selector> = OnceLock::new();

        let lock = match self {
            Self::Date => &DATE,
            Self::Merchant => &MERCHANT,
            Self::Amount => &AMOUNT,
        };
        lock.get_or_init(|| {
            Selector::parse(&format!(r#"div[data-header="{}"]"#, self.header()))
                .expect("invalid cell selector")
        })
    }

    fn value_selector(&self) -> &'static Selector {
        match self {
            Self::Date | Self::Merchant => span_selector(),
            Self::Amount => amount_span_selector(),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw text fields of one transaction block, in document form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub date: String,
    pub merchant: String,
    pub amount: String,
}

/// Why a transaction block produced no entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A field cell or its value is absent or empty
    MissingField(Field),
    /// The block's sub-structure could not be read
    Malformed(String),
}

/// A transaction block that was skipped, with its position in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySkip {
    pub index: usize,
    pub reason: SkipReason,
}

pub type EntryResult = std::result::Result<RawEntry, EntrySkip>;

fn entry_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("section.cc-table-entry").expect("invalid entry selector"))
}

fn span_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("span").expect("invalid span selector"))
}

fn amount_span_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("span.ng-star-inserted").expect("invalid amount selector"))
}

/// Extract every transaction block from a statement page, in document order
pub fn extract_entries(html: &str) -> Vec<EntryResult> {
    let doc = Html::parse_document(html);
    let results: Vec<EntryResult> = doc
        .select(entry_selector())
        .enumerate()
        .map(|(index, block)| {
            extract_block(block).map_err(|reason| {
                match &reason {
                    SkipReason::MissingField(field) => {
                        debug!(index, %field, "Skipping entry with missing field");
                    }
                    SkipReason::Malformed(detail) => {
                        warn!(index, detail = %detail, "Error parsing an entry");
                    }
                }
                EntrySkip { index, reason }
            })
        })
        .collect();

    debug!(
        blocks = results.len(),
        entries = results.iter().filter(|r| r.is_ok()).count(),
        "Extracted statement entries"
    );
    results
}

fn extract_block(block: ElementRef<'_>) -> std::result::Result<RawEntry, SkipReason> {
    Ok(RawEntry {
        date: field_text(block, Field::Date)?,
        merchant: field_text(block, Field::Merchant)?,
        amount: field_text(block, Field::Amount)?,
    })
}

fn field_text(block: ElementRef<'_>, field: Field) -> std::result::Result<String, SkipReason> {
    let cell = block
        .select(field.cell_selector())
        .next()
        .ok_or(SkipReason::MissingField(field))?;

    let value = match cell.select(field.value_selector()).next() {
        Some(value) => value,
        // An amount cell without its value span counts as an absent amount
        None if field == Field::Amount => return Err(SkipReason::MissingField(field)),
        None => {
            return Err(SkipReason::Malformed(format!(
                "{} cell has no value element",
                field
            )))
        }
    };

    let text = value.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        return Err(SkipReason::MissingField(field));
    }
    Ok(text.to_string())
}
