use std::fmt;

/// Identity of one link instance. A rejoin gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Negotiation round of a link, bumped on every (re)negotiation.
/// Results tagged with an older generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPhase {
    /// Viewer known, no media yet. No adapter exists.
    Pending,
    /// A local description for this generation is being produced.
    Negotiating(Generation),
    /// Host side: the offer went out, waiting for the answer.
    OfferSent(Generation),
    /// Viewer side: the answer went out.
    AnswerSent(Generation),
    Connected(Generation),
    /// Terminal. Nothing more is processed for this link.
    Closed,
}

impl LinkPhase {
    pub fn generation(self) -> Option<Generation> {
        match self {
            LinkPhase::Negotiating(g)
            | LinkPhase::OfferSent(g)
            | LinkPhase::AnswerSent(g)
            | LinkPhase::Connected(g) => Some(g),
            LinkPhase::Pending | LinkPhase::Closed => None,
        }
    }

    /// True once an adapter exists and the link is not closed.
    pub fn is_active(self) -> bool {
        self.generation().is_some()
    }

    pub fn is_closed(self) -> bool {
        self == LinkPhase::Closed
    }
}

impl fmt::Display for LinkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkPhase::Pending => f.write_str("pending"),
            LinkPhase::Negotiating(g) => write!(f, "negotiating({g})"),
            LinkPhase::OfferSent(g) => write!(f, "offer-sent({g})"),
            LinkPhase::AnswerSent(g) => write!(f, "answer-sent({g})"),
            LinkPhase::Connected(g) => write!(f, "connected({g})"),
            LinkPhase::Closed => f.write_str("closed"),
        }
    }
}
