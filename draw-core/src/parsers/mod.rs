//! Parser table (spec.md section 4.2, 6.1): one pure-function variant
//! per `ParserId`, dispatched by the poller. Each accepts a response
//! body and returns either a parsed draw or `None` ("no record"); a
//! `None` return is not an error, it's the normal "nothing new yet"
//! outcome the poller silently drops.

pub mod keno;
pub mod normalize;
pub mod tabular;
pub mod universal;

use draw_config::ParserId;

use crate::error::Result;

/// The shape a parser hands back to the poller, before stateful
/// validation (time parsing, non-regression) and structural validation
/// (grammar, sum consistency) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDraw {
    pub issue: String,
    pub open_time_raw: String,
    pub open_nums_raw: String,
    pub sum: Option<u8>,
}

pub fn parse(parser_id: ParserId, body: &[u8]) -> Result<Option<ParsedDraw>> {
    match parser_id {
        ParserId::TabularSumFeed => tabular::parse(body),
        ParserId::KenoReductionFeed => keno::parse(body),
        ParserId::Universal => universal::parse(body),
    }
}
