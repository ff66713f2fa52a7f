//! HTML fragment parsing capability.
//!
//! The morph stage does not parse HTML itself: it asks a [`FragmentParser`]
//! for the element tree. The default implementation sits on the `tl` crate and
//! is compiled in with the `tl` feature. Without it, [`default_parser`] yields
//! an [`UnavailableParser`] whose probe fails, and the morph stage degrades to
//! an identity transform.

use std::sync::atomic::{AtomicU8, Ordering};

#[cfg(feature = "tl")]
use super::element::build_elements;
use super::element::Element;
use super::error::MorphError;

/// Parses a template into its top-level elements.
pub trait FragmentParser: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Check once, before first use, that the parser can run at all.
    fn probe(&self) -> Result<(), MorphError>;

    /// Parse `template` into top-level elements (children nested inside).
    /// Text and comment nodes are dropped.
    fn parse(&self, template: &str) -> Result<Vec<Element>, MorphError>;
}

/// The parser compiled into this build.
pub fn default_parser() -> Box<dyn FragmentParser> {
    #[cfg(feature = "tl")]
    {
        Box::new(TlParser)
    }
    #[cfg(not(feature = "tl"))]
    {
        Box::new(UnavailableParser::new("built without the `tl` feature"))
    }
}

// ============================================================================
// tl
// ============================================================================

/// Fragment parser backed by `tl`.
///
/// `tl` locates the start tags. Element extents are then read from the
/// template itself, since `tl` cuts an element short at the first end tag it
/// cannot pair (`</DIV>`, `<?r ... ?>` in the body, implicitly closed `<li>`).
/// Attributes are read back from the start tag text so they keep source order.
#[cfg(feature = "tl")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TlParser;

#[cfg(feature = "tl")]
impl TlParser {
    /// Push the start offset of every tag under `handle`, whatever `tl` nested
    /// it in.
    fn collect_starts(handle: tl::NodeHandle, parser: &tl::Parser, starts: &mut Vec<usize>) {
        let Some(tl::Node::Tag(tag)) = handle.get(parser) else {
            return;
        };

        starts.push(tag.boundaries(parser).0);
        for child in tag.children().top().iter() {
            Self::collect_starts(*child, parser, starts);
        }
    }
}

#[cfg(feature = "tl")]
impl FragmentParser for TlParser {
    fn name(&self) -> &'static str {
        "tl"
    }

    fn probe(&self) -> Result<(), MorphError> {
        Ok(())
    }

    fn parse(&self, template: &str) -> Result<Vec<Element>, MorphError> {
        let dom = tl::parse(template, tl::ParserOptions::default()).map_err(|err| {
            MorphError::Parse {
                parser: self.name(),
                reason: format!("{err:?}"),
            }
        })?;

        let parser = dom.parser();
        let mut starts = Vec::new();
        for handle in dom.children() {
            Self::collect_starts(*handle, parser, &mut starts);
        }
        Ok(build_elements(template, &starts))
    }
}

// ============================================================================
// Unavailable
// ============================================================================

/// A parser that is never available.
#[derive(Debug, Clone)]
pub struct UnavailableParser {
    reason: String,
}

impl UnavailableParser {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl FragmentParser for UnavailableParser {
    fn name(&self) -> &'static str {
        "tl"
    }

    fn probe(&self) -> Result<(), MorphError> {
        Err(MorphError::ParserUnavailable {
            parser: self.name(),
            reason: self.reason.clone(),
        })
    }

    fn parse(&self, _template: &str) -> Result<Vec<Element>, MorphError> {
        self.probe().map(|()| Vec::new())
    }
}

// ============================================================================
// Availability
// ============================================================================

/// Whether the parser capability can be used.
///
/// Moves from `Unknown` to one of the other two states at most once and
/// never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Availability {
    Unknown = 0,
    Available = 1,
    Unavailable = 2,
}

impl Availability {
    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Available,
            2 => Self::Unavailable,
            _ => Self::Unknown,
        }
    }
}

/// Atomic holder for [`Availability`].
#[derive(Debug)]
pub(crate) struct AvailabilityCell(AtomicU8);

impl AvailabilityCell {
    pub(crate) const fn new(initial: Availability) -> Self {
        Self(AtomicU8::new(initial as u8))
    }

    pub(crate) fn get(&self) -> Availability {
        Availability::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Settle an `Unknown` state. Returns the state that won, together with
    /// `true` if this call performed the transition.
    pub(crate) fn settle(&self, state: Availability) -> (Availability, bool) {
        match self.0.compare_exchange(
            Availability::Unknown as u8,
            state as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => (state, true),
            Err(current) => (Availability::from_u8(current), false),
        }
    }
}
