//! Domain types shared by every instrument.
//!
//! - [`InstrumentTerms`]: the immutable contractual terms
//! - [`ValuationState`]: settlement date and quote, kept consistent by construction
//! - [`ValuationRequest`]: per-call inputs for the valuation methods

mod request;
mod state;
mod terms;

pub use request::ValuationRequest;
pub use state::{QuoteSource, ValuationState};
pub use terms::InstrumentTerms;
